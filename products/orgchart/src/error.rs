use thiserror::Error;

pub type HierarchyResult<T> = Result<T, HierarchyError>;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum HierarchyError {
    #[error("employee {id} is malformed: {reason}")]
    MalformedInput { id: i32, reason: String },
    #[error("manager references form a cycle through employees {ids:?}")]
    CycleDetected { ids: Vec<i32> },
}

impl HierarchyError {
    pub(crate) fn malformed(id: i32, reason: impl Into<String>) -> Self {
        Self::MalformedInput {
            id,
            reason: reason.into(),
        }
    }

    pub(crate) fn cycle(ids: impl IntoIterator<Item = i32>) -> Self {
        let mut ids: Vec<i32> = ids.into_iter().collect();
        ids.sort_unstable();
        ids.dedup();
        Self::CycleDetected { ids }
    }
}
