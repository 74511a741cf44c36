use std::time::Duration;

use anyhow::{Result, bail};
use async_trait::async_trait;

use super::{PersistenceSink, RecordUpdate};
use crate::error::AnalysisError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder().timeout(timeout).build()?)
}

/// PostgREST风格的写回：`PATCH {base}/{table}?id=eq.{record_id}`
pub struct RestRecordSink {
    http: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl RestRecordSink {
    pub fn new(base_url: &str, table: &str, api_key: &str) -> Result<Self> {
        let base_url = base_url.trim_end_matches('/');
        if base_url.is_empty() || table.is_empty() {
            bail!("REST persistence needs both a base url and a table name");
        }
        Ok(Self {
            http: http_client(DEFAULT_TIMEOUT)?,
            endpoint: format!("{}/{}", base_url, table),
            api_key: api_key.to_string(),
        })
    }

    /// 指定单次写回请求的超时时间
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = http_client(timeout)?;
        Ok(self)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl PersistenceSink for RestRecordSink {
    async fn update(&self, record_id: &str, update: &RecordUpdate) -> Result<(), AnalysisError> {
        let mut request = self
            .http
            .patch(&self.endpoint)
            .query(&[("id", format!("eq.{}", record_id))])
            .header("Prefer", "return=minimal")
            .json(update);
        if !self.api_key.is_empty() {
            request = request
                .header("apikey", &self.api_key)
                .bearer_auth(&self.api_key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| AnalysisError::PersistenceWrite(format!("{}: {}", self.endpoint, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::PersistenceWrite(format!(
                "{}: HTTP {} {}",
                self.endpoint, status, body
            )));
        }
        Ok(())
    }
}
