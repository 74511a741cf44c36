//! 写回存储 - 把分析结果更新到已有记录的 transcript/tags/metadata 字段

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::{PersistenceConfig, PersistenceKind};
use crate::error::AnalysisError;
use crate::types::analysis::{AnalysisMetadata, AnalysisResult};

mod file_sink;
mod rest_sink;

pub use file_sink::FileRecordSink;
pub use rest_sink::RestRecordSink;

/// 写回记录的字段
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordUpdate {
    #[serde(rename = "transcript")]
    pub transcript_or_description: Option<String>,
    #[serde(rename = "tags")]
    pub taxonomy_codes: Vec<String>,
    pub metadata: AnalysisMetadata,
}

impl From<&AnalysisResult> for RecordUpdate {
    fn from(result: &AnalysisResult) -> Self {
        Self {
            transcript_or_description: result.transcription_or_description.clone(),
            taxonomy_codes: result.taxonomy_codes.clone(),
            metadata: result.metadata.clone(),
        }
    }
}

/// 写回目标
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn update(&self, record_id: &str, update: &RecordUpdate) -> Result<(), AnalysisError>;
}

/// 未配置写回时使用
pub struct NoopSink;

#[async_trait]
impl PersistenceSink for NoopSink {
    async fn update(&self, _record_id: &str, _update: &RecordUpdate) -> Result<(), AnalysisError> {
        Ok(())
    }
}

/// 根据配置创建写回目标
pub fn build_sink(config: &PersistenceConfig) -> Result<Arc<dyn PersistenceSink>> {
    match config.kind {
        PersistenceKind::None => Ok(Arc::new(NoopSink)),
        PersistenceKind::File => Ok(Arc::new(FileRecordSink::new(config.records_dir.clone()))),
        PersistenceKind::Rest => Ok(Arc::new(
            RestRecordSink::new(
                &config.rest_base_url,
                &config.rest_table,
                &config.rest_api_key,
            )?
            .with_timeout(Duration::from_secs(config.timeout_seconds))?,
        )),
    }
}
