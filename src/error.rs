//! 分析流水线的错误类型
//!
//! 每个阶段的错误都会被包装成 [`PipelineError`]，携带阶段名称和原始原因；
//! 底层网络、解码、序列化库的错误只以消息形式保留，不直接暴露给调用方。

use std::fmt::{Display, Formatter};

use serde::Serialize;
use thiserror::Error;

/// 结构化结果提取失败
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    /// 模型输出中找不到 `{...}` 片段
    #[error("no structured payload found in model output")]
    NoStructuredPayloadFound,

    /// 找到了片段但无法解析为对应的结构
    #[error("structured payload could not be parsed: {0}")]
    PayloadParse(String),
}

/// 单个阶段产生的错误
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AnalysisError {
    #[error("malformed media: {0}")]
    MalformedMedia(String),

    #[error("media fetch failed: {0}")]
    MediaFetch(String),

    #[error("model unavailable: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("persistence write failed: {0}")]
    PersistenceWrite(String),
}

impl AnalysisError {
    /// 对外暴露的错误类别名称
    pub fn kind(&self) -> &'static str {
        match self {
            AnalysisError::MalformedMedia(_) => "MalformedMediaError",
            AnalysisError::MediaFetch(_) => "MediaFetchError",
            AnalysisError::ModelUnavailable(_) => "ModelUnavailableError",
            AnalysisError::Extraction(ExtractionError::NoStructuredPayloadFound) => {
                "NoStructuredPayloadFound"
            }
            AnalysisError::Extraction(ExtractionError::PayloadParse(_)) => "PayloadParseError",
            AnalysisError::PersistenceWrite(_) => "PersistenceWriteError",
        }
    }
}

/// 流水线状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineStage {
    Idle,
    Loading,
    Prompting,
    Invoking,
    Extracting,
    Resolving,
    Assembling,
    Persisting,
    Done,
    Failed,
}

impl Display for PipelineStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            PipelineStage::Idle => "idle",
            PipelineStage::Loading => "loading",
            PipelineStage::Prompting => "prompting",
            PipelineStage::Invoking => "invoking",
            PipelineStage::Extracting => "extracting",
            PipelineStage::Resolving => "resolving",
            PipelineStage::Assembling => "assembling",
            PipelineStage::Persisting => "persisting",
            PipelineStage::Done => "done",
            PipelineStage::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// 返回给调用方的唯一错误类型
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: PipelineStage,
    #[source]
    pub source: AnalysisError,
}

impl PipelineError {
    pub fn new(stage: PipelineStage, source: AnalysisError) -> Self {
        Self { stage, source }
    }

    pub fn kind(&self) -> &'static str {
        self.source.kind()
    }

    /// 供CLI输出的JSON形式
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "stage": self.stage,
            "kind": self.kind(),
            "message": self.source.to_string(),
        })
    }
}
