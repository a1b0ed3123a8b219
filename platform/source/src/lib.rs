//! Acquisition of the employee list from its upstream feed.

use std::time::Duration;

use async_trait::async_trait;
use orgchart::EmployeeRecord;
use reqwest::Client;
use thiserror::Error;
use tracing::{info, instrument};

pub use reqwest::StatusCode;

/// Public gist the employee list is seeded from unless overridden.
pub const DEFAULT_SOURCE_URL: &str = "https://gist.githubusercontent.com/chancock09/6d2a5a4436dcd488b8287f3e3e4fc73d/raw/fa47d64c6d5fc860fabd3033a1a4e3c59336324e/employees.json";

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("employee feed request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("employee feed answered {0}")]
    Status(StatusCode),
    #[error("employee feed payload is not a list of employees: {0}")]
    Decode(#[from] serde_json::Error),
}

pub type SourceResult<T> = Result<T, SourceError>;

#[async_trait]
pub trait EmployeeSource: Send + Sync {
    async fn fetch(&self) -> SourceResult<Vec<EmployeeRecord>>;
}

#[derive(Clone, Debug)]
pub struct SourceConfig {
    pub url: String,
    pub timeout: Duration,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_SOURCE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// Fetches the feed over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpEmployeeSource {
    client: Client,
    url: String,
}

impl HttpEmployeeSource {
    pub fn new(config: SourceConfig) -> SourceResult<Self> {
        let client = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            url: config.url,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl EmployeeSource for HttpEmployeeSource {
    #[instrument(name = "source.fetch", skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> SourceResult<Vec<EmployeeRecord>> {
        let response = self.client.get(&self.url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }
        let body = response.bytes().await?;
        let records = parse_employees(&body)?;
        info!(count = records.len(), "fetched employee feed");
        Ok(records)
    }
}

/// Decode a feed payload: a JSON array of `{id, name, title, manager_id}`.
pub fn parse_employees(body: &[u8]) -> SourceResult<Vec<EmployeeRecord>> {
    Ok(serde_json::from_slice(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_feed_payload() {
        let body = br#"[
            {"id": 1, "name": "Ada Lovelace", "title": "CEO", "manager_id": null},
            {"id": 2, "name": "Bob Zephyr", "title": "VP", "manager_id": 1}
        ]"#;
        let records = parse_employees(body).unwrap();
        assert_eq!(
            records,
            vec![
                EmployeeRecord::new(1, "Ada Lovelace", "CEO", None),
                EmployeeRecord::new(2, "Bob Zephyr", "VP", Some(1)),
            ]
        );
    }

    #[test]
    fn rejects_records_without_id() {
        let body = br#"[{"name": "Ada Lovelace", "title": "CEO"}]"#;
        assert!(matches!(
            parse_employees(body),
            Err(SourceError::Decode(_))
        ));
    }

    #[test]
    fn rejects_non_array_payload() {
        assert!(matches!(
            parse_employees(br#"{"error": "gone"}"#),
            Err(SourceError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn unreachable_feed_is_a_request_error() {
        let source = HttpEmployeeSource::new(SourceConfig {
            url: "http://127.0.0.1:9/employees.json".into(),
            timeout: Duration::from_millis(500),
        })
        .unwrap();
        assert!(matches!(source.fetch().await, Err(SourceError::Request(_))));
    }
}
