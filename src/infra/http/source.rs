use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use reqwest::Client;
use serde_json::Value;

use crate::config::TableConfig;
use crate::usecase::ports::source::{DataSource, FetchError};

/// Fetches the whole dataset with a single GET; the body must be a JSON array.
pub struct HttpSource {
    client: Client,
    url: String,
}

impl HttpSource {
    pub fn new(config: &TableConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .context("failed to create HTTP client")?;

        Ok(Self {
            client,
            url: config.data_url.clone(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn fetch(&self) -> Result<Vec<Value>, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|err| FetchError::Network(err.to_string()))?;
        let records = parse_records(&body)?;
        tracing::debug!(url = %self.url, records = records.len(), "dataset downloaded");
        Ok(records)
    }
}

impl DataSource for HttpSource {
    fn fetch_records(&self) -> LocalBoxFuture<'_, Result<Vec<Value>, FetchError>> {
        self.fetch().boxed_local()
    }
}

pub fn parse_records(body: &[u8]) -> Result<Vec<Value>, FetchError> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Array(records)) => Ok(records),
        Ok(other) => Err(FetchError::Decode(format!(
            "expected a JSON array, got {}",
            json_kind(&other)
        ))),
        Err(err) => Err(FetchError::Decode(err.to_string())),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
