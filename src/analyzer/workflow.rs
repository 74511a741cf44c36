use std::time::{Duration, Instant};

use anyhow::Result;
use serde_json::{Value, json};
use tracing::info;

use crate::analyzer::pipeline::{AnalysisRequest, AnalysisRun, MediaAnalyzer};
use crate::config::Config;
use crate::error::PipelineError;
use crate::utils::threads::do_parallel_with_limit;

/// 批量任务中的一项，label 用于输出时标识媒体来源
pub struct AnalysisJob {
    pub label: String,
    pub request: AnalysisRequest,
}

impl AnalysisJob {
    pub fn new(label: impl Into<String>, request: AnalysisRequest) -> Self {
        Self {
            label: label.into(),
            request,
        }
    }
}

/// 单个任务的执行结果
pub struct JobOutcome {
    pub label: String,
    pub elapsed: Duration,
    pub outcome: Result<AnalysisRun, PipelineError>,
}

impl JobOutcome {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn to_json(&self) -> Value {
        let elapsed_ms = self.elapsed.as_millis() as u64;
        match &self.outcome {
            Ok(run) => json!({
                "media": self.label,
                "status": "ok",
                "run_id": run.run_id.to_string(),
                "elapsed_ms": elapsed_ms,
                "trace": run.trace,
                "result": run.result,
                "persistence_error": run.persistence_error.as_ref().map(|e| json!({
                    "kind": e.kind(),
                    "message": e.to_string(),
                })),
            }),
            Err(e) => json!({
                "media": self.label,
                "status": "failed",
                "elapsed_ms": elapsed_ms,
                "error": e.to_json(),
            }),
        }
    }
}

/// 按并发上限执行一批任务，输出顺序与输入一致；单个任务失败不影响其他任务
pub async fn run_jobs(
    analyzer: &MediaAnalyzer,
    jobs: Vec<AnalysisJob>,
    max_parallels: usize,
) -> Vec<JobOutcome> {
    let futures: Vec<_> = jobs
        .into_iter()
        .map(|job| async move {
            let started = Instant::now();
            let outcome = analyzer.run(&job.request).await;
            JobOutcome {
                label: job.label,
                elapsed: started.elapsed(),
                outcome,
            }
        })
        .collect();

    do_parallel_with_limit(futures, max_parallels).await
}

/// 启动批量分析
pub async fn launch(config: &Config, jobs: Vec<AnalysisJob>) -> Result<Vec<JobOutcome>> {
    let analyzer = MediaAnalyzer::from_config(config)?;
    let total = jobs.len();
    let started = Instant::now();

    let outcomes = run_jobs(&analyzer, jobs, config.max_parallels).await;

    let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
    info!(
        total,
        succeeded,
        failed = total - succeeded,
        elapsed_secs = started.elapsed().as_secs_f64(),
        "batch finished"
    );
    Ok(outcomes)
}
