//! 分析流水线
//!
//! Idle → Loading → Prompting → Invoking → Extracting → Resolving(仅音频/视频)
//! → Assembling → Persisting(有record_id时) → Done；任一阶段失败直接进入 Failed。
//! 任何阶段都不自动重试。写回失败只记录日志，不影响已得到的分析结果。

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use chrono::{DateTime, Utc};
use tracing::{Instrument, debug, error, info, info_span, warn};
use uuid::Uuid;

use crate::analyzer::assembler::assemble;
use crate::analyzer::extractor::extract;
use crate::analyzer::prompt_builder::PromptBuilder;
use crate::analyzer::resolver::resolve;
use crate::config::Config;
use crate::error::{AnalysisError, PipelineError, PipelineStage};
use crate::llm::{LLMClient, ModelInvoker};
use crate::media::MediaLoader;
use crate::persistence::{NoopSink, PersistenceSink, RecordUpdate, build_sink};
use crate::types::analysis::AnalysisResult;
use crate::types::media::{MediaKind, MediaReference};
use crate::types::roster::StudentRef;

/// 时间来源，由调用方提供
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// 固定时间，用于测试和重放
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// 一次分析请求
#[derive(Clone)]
pub struct AnalysisRequest {
    pub media_reference: MediaReference,
    pub media_kind: MediaKind,
    pub roster: Vec<StudentRef>,
    /// 存在时分析完成后写回该记录
    pub record_id: Option<String>,
    pub clock: Arc<dyn Clock>,
}

impl AnalysisRequest {
    pub fn new(media_reference: MediaReference, media_kind: MediaKind) -> Self {
        Self {
            media_reference,
            media_kind,
            roster: vec![],
            record_id: None,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_roster(mut self, roster: Vec<StudentRef>) -> Self {
        self.roster = roster;
        self
    }

    pub fn with_record_id(mut self, record_id: impl Into<String>) -> Self {
        self.record_id = Some(record_id.into());
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// 一次成功的分析，附带经过的阶段和写回结果
#[derive(Debug, Clone)]
pub struct AnalysisRun {
    pub run_id: Uuid,
    pub result: AnalysisResult,
    pub trace: Vec<PipelineStage>,
    /// 写回失败时的错误；分析本身仍视为成功
    pub persistence_error: Option<AnalysisError>,
}

/// 记录状态迁移，失败时携带当前阶段生成错误
struct StageTracker {
    current: PipelineStage,
    trace: Vec<PipelineStage>,
}

impl StageTracker {
    fn new() -> Self {
        Self {
            current: PipelineStage::Idle,
            trace: vec![PipelineStage::Idle],
        }
    }

    fn enter(&mut self, stage: PipelineStage) {
        info!(from = %self.current, to = %stage, "stage transition");
        self.current = stage;
        self.trace.push(stage);
    }

    fn fail(&self, source: AnalysisError) -> PipelineError {
        debug!(from = %self.current, to = %PipelineStage::Failed, "stage transition");
        error!(stage = %self.current, kind = source.kind(), error = %source, "analysis failed");
        PipelineError::new(self.current, source)
    }
}

/// 媒体分析器：组合加载、Prompt构建、模型调用、解析、匹配与写回
#[derive(Clone)]
pub struct MediaAnalyzer {
    loader: MediaLoader,
    invoker: Arc<dyn ModelInvoker>,
    sink: Arc<dyn PersistenceSink>,
    prompt_builder: PromptBuilder,
    model_timeout: Option<Duration>,
    persistence_timeout: Option<Duration>,
}

impl MediaAnalyzer {
    pub fn new(
        loader: MediaLoader,
        invoker: Arc<dyn ModelInvoker>,
        prompt_builder: PromptBuilder,
    ) -> Self {
        Self {
            loader,
            invoker,
            sink: Arc::new(NoopSink),
            prompt_builder,
            model_timeout: None,
            persistence_timeout: None,
        }
    }

    /// 按配置组装全部依赖
    pub fn from_config(config: &Config) -> Result<Self> {
        let loader = MediaLoader::new(&config.media)?;
        let invoker = Arc::new(LLMClient::new(config.llm.clone())?);
        let sink = build_sink(&config.persistence)?;
        let prompt_builder = PromptBuilder::new(config.taxonomy.clone(), config.target_language);

        Ok(Self::new(loader, invoker, prompt_builder)
            .with_sink(sink)
            .with_model_timeout(Duration::from_secs(config.llm.timeout_seconds))
            .with_persistence_timeout(Duration::from_secs(config.persistence.timeout_seconds)))
    }

    pub fn with_sink(mut self, sink: Arc<dyn PersistenceSink>) -> Self {
        self.sink = sink;
        self
    }

    /// 模型调用的超时上限
    pub fn with_model_timeout(mut self, timeout: Duration) -> Self {
        self.model_timeout = Some(timeout);
        self
    }

    /// 写回的超时上限，超时视为写回失败
    pub fn with_persistence_timeout(mut self, timeout: Duration) -> Self {
        self.persistence_timeout = Some(timeout);
        self
    }

    /// 执行分析，只返回结果
    pub async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult, PipelineError> {
        self.run(request).await.map(|run| run.result)
    }

    /// 执行分析，返回结果及运行轨迹
    pub async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisRun, PipelineError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("analysis", %run_id, kind = %request.media_kind);
        self.run_stages(run_id, request).instrument(span).await
    }

    async fn run_stages(
        &self,
        run_id: Uuid,
        request: &AnalysisRequest,
    ) -> Result<AnalysisRun, PipelineError> {
        let kind = request.media_kind;
        let mut tracker = StageTracker::new();
        info!(media = %request.media_reference.describe(), roster = request.roster.len(), "analysis started");

        tracker.enter(PipelineStage::Loading);
        let media = self
            .loader
            .load(&request.media_reference)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.enter(PipelineStage::Prompting);
        let prompt = self.prompt_builder.build(kind, &request.roster);
        debug!(prompt_chars = prompt.instruction_text.len(), "prompt built");

        tracker.enter(PipelineStage::Invoking);
        let raw_text = self
            .invoke_model(&prompt.instruction_text, &media.bytes, &media.content_type)
            .await
            .map_err(|e| tracker.fail(e))?;

        tracker.enter(PipelineStage::Extracting);
        let payload = extract(&raw_text, kind).map_err(|e| tracker.fail(e.into()))?;

        let resolved_ids = if kind.resolves_participants() {
            tracker.enter(PipelineStage::Resolving);
            let ids = resolve(payload.detected_names(), &request.roster);
            debug!(detected = payload.detected_names().len(), resolved = ids.len(), "participants resolved");
            ids
        } else {
            vec![]
        };

        tracker.enter(PipelineStage::Assembling);
        let result = assemble(
            &payload,
            resolved_ids,
            self.prompt_builder.taxonomy(),
            request.clock.now(),
        );

        let mut persistence_error = None;
        if let Some(record_id) = &request.record_id {
            tracker.enter(PipelineStage::Persisting);
            if let Err(e) = self.write_back(record_id, &RecordUpdate::from(&result)).await {
                warn!(record_id = %record_id, error = %e, "write-back failed, keeping analysis result");
                persistence_error = Some(e);
            }
        }

        tracker.enter(PipelineStage::Done);
        info!(
            taxonomy_codes = ?result.taxonomy_codes,
            students = result.resolved_student_ids.len(),
            confidence = result.metadata.confidence,
            "analysis finished"
        );

        Ok(AnalysisRun {
            run_id,
            result,
            trace: tracker.trace,
            persistence_error,
        })
    }

    async fn write_back(&self, record_id: &str, update: &RecordUpdate) -> Result<(), AnalysisError> {
        let write = self.sink.update(record_id, update);
        match self.persistence_timeout {
            Some(limit) => tokio::time::timeout(limit, write).await.unwrap_or_else(|_| {
                Err(AnalysisError::PersistenceWrite(format!(
                    "no response within {:.1}s",
                    limit.as_secs_f64()
                )))
            }),
            None => write.await,
        }
    }

    async fn invoke_model(
        &self,
        instruction_text: &str,
        media_bytes: &[u8],
        content_type: &str,
    ) -> Result<String, AnalysisError> {
        let invocation = self.invoker.invoke(instruction_text, media_bytes, content_type);
        let outcome = match self.model_timeout {
            Some(limit) => match tokio::time::timeout(limit, invocation).await {
                Ok(outcome) => outcome,
                Err(_) => Err(anyhow!("no response within {:.1}s", limit.as_secs_f64())),
            },
            None => invocation.await,
        };

        let text = outcome.map_err(|e| AnalysisError::ModelUnavailable(format!("{:#}", e)))?;
        if text.trim().is_empty() {
            return Err(AnalysisError::ModelUnavailable(
                "model returned empty output".to_string(),
            ));
        }
        Ok(text)
    }
}
