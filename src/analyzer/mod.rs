//! 课堂媒体分析：Prompt构建、模型输出解析、学生匹配、结果组装与流水线编排

pub mod assembler;
pub mod extractor;
pub mod normalizer;
pub mod pipeline;
pub mod prompt_builder;
pub mod resolver;
pub mod workflow;

pub use pipeline::{AnalysisRequest, AnalysisRun, Clock, FixedClock, MediaAnalyzer, SystemClock};
pub use workflow::{AnalysisJob, JobOutcome, launch};
