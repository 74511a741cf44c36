use crate::analyzer::{AnalysisJob, AnalysisRequest};
use crate::config::{Config, DEFAULT_CONFIG_FILE, LLMProvider, PersistenceKind};
use crate::i18n::TargetLanguage;
use crate::types::media::MediaKind;
use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use tracing::warn;

pub mod inputs;

/// ClassMedia-RS - 课堂媒体（音频、图片、视频）的AI分析工具
#[derive(Parser, Debug)]
#[command(name = "classmedia-rs")]
#[command(
    about = "Analyzes classroom audio, images and video with a multimodal model, tagging learning fields and matching the children mentioned against a class roster."
)]
#[command(version)]
pub struct Args {
    /// 媒体输入：本地文件、http(s)地址或data URL，可重复
    #[arg(short, long = "media", required = true)]
    pub media: Vec<String>,

    /// 媒体类型 (audio, image, video)，不指定时自动推断
    #[arg(short, long)]
    pub kind: Option<String>,

    /// 班级名单JSON文件
    #[arg(short, long)]
    pub roster: Option<PathBuf>,

    /// 分析完成后写回的记录ID，只能配合单个媒体使用
    #[arg(long)]
    pub record_id: Option<String>,

    /// 配置文件路径
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 是否启用详细日志
    #[arg(short, long)]
    pub verbose: bool,

    /// LLM Provider (gemini, openai)
    #[arg(long)]
    pub llm_provider: Option<String>,

    /// LLM API KEY
    #[arg(long)]
    pub llm_api_key: Option<String>,

    /// LLM API基地址
    #[arg(long)]
    pub llm_api_base_url: Option<String>,

    /// 多模态模型名称
    #[arg(long)]
    pub model: Option<String>,

    /// 温度参数
    #[arg(long)]
    pub temperature: Option<f64>,

    /// 最大tokens数
    #[arg(long)]
    pub max_tokens: Option<u32>,

    /// 模型调用超时（秒）
    #[arg(long)]
    pub timeout_seconds: Option<u64>,

    /// 目标语言 (pt, en, es)
    #[arg(long)]
    pub target_language: Option<String>,

    /// 最大并发数
    #[arg(long)]
    pub max_parallels: Option<usize>,

    /// 写回方式 (none, file, rest)
    #[arg(long)]
    pub persistence: Option<String>,

    /// 文件写回时的记录目录
    #[arg(long)]
    pub records_dir: Option<PathBuf>,
}

impl Args {
    /// 加载配置文件并用CLI参数覆盖
    pub fn to_config(&self) -> Result<Config> {
        let mut config = if let Some(config_path) = &self.config {
            Config::from_file(config_path)?
        } else {
            let default_config_path = Config::default_path();
            if default_config_path.exists() {
                Config::from_file(&default_config_path)?
            } else {
                Config::default()
            }
        };

        // 覆盖LLM配置
        if let Some(provider_str) = &self.llm_provider {
            if let Ok(provider) = provider_str.parse::<LLMProvider>() {
                config.llm.provider = provider;
            } else {
                warn!("Unknown llm provider {}, keeping {}", provider_str, config.llm.provider);
            }
        }
        if let Some(llm_api_base_url) = &self.llm_api_base_url {
            config.llm.api_base_url = llm_api_base_url.clone();
        }
        if let Some(llm_api_key) = &self.llm_api_key {
            config.llm.api_key = llm_api_key.clone();
        }
        if let Some(model) = &self.model {
            config.llm.model = model.clone();
        }
        if let Some(max_tokens) = self.max_tokens {
            config.llm.max_tokens = max_tokens;
        }
        if let Some(temperature) = self.temperature {
            config.llm.temperature = temperature;
        }
        if let Some(timeout_seconds) = self.timeout_seconds {
            config.llm.timeout_seconds = timeout_seconds;
        }
        if let Some(max_parallels) = self.max_parallels {
            config.max_parallels = max_parallels;
        }

        // 目标语言配置
        if let Some(target_language_str) = &self.target_language {
            if let Ok(target_language) = target_language_str.parse::<TargetLanguage>() {
                config.target_language = target_language;
            } else {
                warn!(
                    "Unknown target language {}, keeping {}",
                    target_language_str,
                    config.target_language.display_name()
                );
            }
        }

        // 写回配置
        if let Some(persistence_str) = &self.persistence {
            config.persistence.kind = persistence_str
                .parse::<PersistenceKind>()
                .map_err(anyhow::Error::msg)?;
        }
        if let Some(records_dir) = &self.records_dir {
            config.persistence.records_dir = records_dir.clone();
            if self.persistence.is_none() && config.persistence.kind == PersistenceKind::None {
                config.persistence.kind = PersistenceKind::File;
            }
        }

        config.verbose = self.verbose;
        config
            .validate()
            .with_context(|| format!("Invalid configuration (see {})", DEFAULT_CONFIG_FILE))?;
        Ok(config)
    }

    /// 把媒体输入、名单和记录ID组装成分析任务
    pub fn build_jobs(&self) -> Result<Vec<AnalysisJob>> {
        if self.record_id.is_some() && self.media.len() > 1 {
            bail!("--record-id can only be used with a single --media input");
        }

        let kind_override = self
            .kind
            .as_deref()
            .map(str::parse::<MediaKind>)
            .transpose()
            .map_err(anyhow::Error::msg)?;
        let roster = match &self.roster {
            Some(path) => inputs::read_roster(path)?,
            None => vec![],
        };

        self.media
            .iter()
            .map(|input| {
                let media = inputs::parse_media_input(input, kind_override)?;
                let mut request =
                    AnalysisRequest::new(media.reference, media.kind).with_roster(roster.clone());
                if let Some(record_id) = &self.record_id {
                    request = request.with_record_id(record_id.clone());
                }
                Ok(AnalysisJob::new(input.clone(), request))
            })
            .collect()
    }
}
