pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod i18n;
pub mod llm;
pub mod media;
pub mod persistence;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use analyzer::{AnalysisRequest, MediaAnalyzer, launch};
pub use config::Config;
pub use error::{AnalysisError, PipelineError, PipelineStage};
pub use types::analysis::AnalysisResult;
