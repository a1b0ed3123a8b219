use serde::{Deserialize, Serialize};

use crate::error::{HierarchyError, HierarchyResult};

/// One flat employee entry as held by the record store.
///
/// The wire names (`name`, `manager_id`) follow the remote employee feed.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct EmployeeRecord {
    pub id: i32,
    #[serde(rename = "name")]
    pub full_name: String,
    pub title: String,
    #[serde(default)]
    pub manager_id: Option<i32>,
}

impl EmployeeRecord {
    pub fn new(
        id: i32,
        full_name: impl Into<String>,
        title: impl Into<String>,
        manager_id: Option<i32>,
    ) -> Self {
        Self {
            id,
            full_name: full_name.into(),
            title: title.into(),
            manager_id,
        }
    }

    pub(crate) fn validate(&self) -> HierarchyResult<()> {
        if self.full_name.trim().is_empty() {
            return Err(HierarchyError::malformed(self.id, "full name has no words"));
        }
        Ok(())
    }
}

/// A record plus its direct reports, as served by `GET /org-chart`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct OrgNode {
    pub full_name: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reports: Vec<OrgNode>,
}

impl OrgNode {
    /// Number of nodes in this subtree, including `self`.
    pub fn node_count(&self) -> usize {
        1 + self.reports.iter().map(OrgNode::node_count).sum::<usize>()
    }
}
