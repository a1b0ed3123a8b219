use std::sync::Arc;

use orgchart::{HierarchyError, OrgNode, build_hierarchy};
use platform_db::{DbError, EmployeeStore};
use platform_source::{EmployeeSource, SourceError};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{info, instrument};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("employee store failed: {0}")]
    Store(#[from] DbError),
    #[error("employee acquisition failed: {0}")]
    Source(#[from] SourceError),
    #[error(transparent)]
    Hierarchy(#[from] HierarchyError),
}

/// Glue between the record store, the upstream feed and the hierarchy
/// builder. One instance is shared by every request.
pub struct OrgChartService {
    store: Arc<dyn EmployeeStore>,
    source: Arc<dyn EmployeeSource>,
    // Serialises populate-on-empty so concurrent first requests fetch once.
    populate: Mutex<()>,
}

impl OrgChartService {
    pub fn new(store: Arc<dyn EmployeeStore>, source: Arc<dyn EmployeeSource>) -> Self {
        Self {
            store,
            source,
            populate: Mutex::new(()),
        }
    }

    pub fn store(&self) -> &dyn EmployeeStore {
        self.store.as_ref()
    }

    /// Fill an empty store from the feed. Returns whether this call did it.
    pub async fn ensure_populated(&self) -> Result<bool, ServiceError> {
        if !self.store.is_empty().await? {
            return Ok(false);
        }
        let _guard = self.populate.lock().await;
        if !self.store.is_empty().await? {
            return Ok(false);
        }
        let records = self.source.fetch().await?;
        let stored = self.store.replace_all(&records).await?;
        info!(count = stored, "populated empty employee store from feed");
        Ok(true)
    }

    #[instrument(name = "org_chart.build", skip_all)]
    pub async fn org_chart(&self) -> Result<Vec<OrgNode>, ServiceError> {
        self.ensure_populated().await?;
        let records = self.store.load_all().await?;
        Ok(build_hierarchy(&records)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{MemoryStore, StaticSource, sample_records};

    #[tokio::test]
    async fn empty_store_is_populated_once_under_concurrency() {
        let store = Arc::new(MemoryStore::default());
        let source = Arc::new(StaticSource::new(sample_records()));
        let service = Arc::new(OrgChartService::new(store.clone(), source.clone()));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let service = service.clone();
                tokio::spawn(async move { service.org_chart().await })
            })
            .collect();
        for handle in handles {
            let chart = handle.await.unwrap().unwrap();
            assert_eq!(chart.len(), 1);
        }
        assert_eq!(source.calls(), 1);
        assert_eq!(store.count(), 3);
    }

    #[tokio::test]
    async fn populated_store_skips_the_feed() {
        let store = Arc::new(MemoryStore::with_records(sample_records()));
        let source = Arc::new(StaticSource::new(Vec::new()));
        let service = OrgChartService::new(store, source.clone());

        assert!(!service.ensure_populated().await.unwrap());
        let chart = service.org_chart().await.unwrap();
        assert_eq!(chart[0].full_name, "Ada Lovelace");
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn feed_failure_is_a_source_error() {
        let store = Arc::new(MemoryStore::default());
        let service = OrgChartService::new(store.clone(), Arc::new(StaticSource::failing()));

        assert!(matches!(
            service.org_chart().await,
            Err(ServiceError::Source(_))
        ));
        assert_eq!(store.count(), 0);
    }

    #[tokio::test]
    async fn store_failure_is_a_store_error() {
        let source = Arc::new(StaticSource::new(sample_records()));
        let service = OrgChartService::new(Arc::new(MemoryStore::failing()), source.clone());
        assert!(matches!(
            service.org_chart().await,
            Err(ServiceError::Store(_))
        ));
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn cyclic_data_is_a_hierarchy_error() {
        let store = Arc::new(MemoryStore::with_records(vec![
            orgchart::EmployeeRecord::new(1, "Kim Loop", "Director", Some(2)),
            orgchart::EmployeeRecord::new(2, "Lee Loop", "Director", Some(1)),
        ]));
        let service = OrgChartService::new(store, Arc::new(StaticSource::new(Vec::new())));
        assert!(matches!(
            service.org_chart().await,
            Err(ServiceError::Hierarchy(HierarchyError::CycleDetected { .. }))
        ));
    }
}
