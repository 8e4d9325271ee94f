use futures::future::LocalBoxFuture;
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error! status: {status}")]
    Status { status: u16 },
    #[error("network error: {0}")]
    Network(String),
    #[error("malformed dataset: {0}")]
    Decode(String),
}

/// Remote origin of the raw, loosely-typed records.
pub trait DataSource {
    fn fetch_records(&self) -> LocalBoxFuture<'_, Result<Vec<Value>, FetchError>>;
}
