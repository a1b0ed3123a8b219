//! In-memory collaborators for service and router tests.

use std::{
    sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use orgchart::EmployeeRecord;
use platform_db::{DbErr, DbError, DbResult, EmployeeStore};
use platform_source::{EmployeeSource, SourceError, SourceResult, StatusCode};

pub fn sample_records() -> Vec<EmployeeRecord> {
    vec![
        EmployeeRecord::new(1, "Ada Lovelace", "CEO", None),
        EmployeeRecord::new(2, "Bob Zephyr", "VP", Some(1)),
        EmployeeRecord::new(3, "Cy Young", "VP", Some(1)),
    ]
}

#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<Vec<EmployeeRecord>>,
    offline: bool,
}

impl MemoryStore {
    pub fn with_records(records: Vec<EmployeeRecord>) -> Self {
        Self {
            records: Mutex::new(records),
            offline: false,
        }
    }

    /// Every call fails as if the database were unreachable.
    pub fn failing() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    fn check(&self) -> DbResult<()> {
        if self.offline {
            return Err(DbError::Database(DbErr::Custom("store offline".into())));
        }
        Ok(())
    }

    pub fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn is_empty(&self) -> DbResult<bool> {
        self.check()?;
        Ok(self.records.lock().unwrap().is_empty())
    }

    async fn load_all(&self) -> DbResult<Vec<EmployeeRecord>> {
        self.check()?;
        let mut records = self.records.lock().unwrap().clone();
        records.sort_by_key(|r| r.id);
        Ok(records)
    }

    async fn replace_all(&self, incoming: &[EmployeeRecord]) -> DbResult<usize> {
        self.check()?;
        let mut records = self.records.lock().unwrap();
        for record in incoming {
            records.retain(|existing| existing.id != record.id);
            records.push(record.clone());
        }
        Ok(incoming.len())
    }
}

pub struct StaticSource {
    records: Option<Vec<EmployeeRecord>>,
    calls: AtomicUsize,
}

impl StaticSource {
    pub fn new(records: Vec<EmployeeRecord>) -> Self {
        Self {
            records: Some(records),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            records: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmployeeSource for StaticSource {
    async fn fetch(&self) -> SourceResult<Vec<EmployeeRecord>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // Widen the window in which concurrent callers see an empty store.
        tokio::time::sleep(Duration::from_millis(20)).await;
        self.records
            .clone()
            .ok_or(SourceError::Status(StatusCode::BAD_GATEWAY))
    }
}
