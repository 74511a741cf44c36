use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::i18n::TargetLanguage;
use crate::types::taxonomy::Taxonomy;

/// 默认配置文件名
pub const DEFAULT_CONFIG_FILE: &str = "classmedia.toml";

/// LLM Provider类型
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum LLMProvider {
    #[serde(rename = "gemini")]
    #[default]
    Gemini,
    #[serde(rename = "openai")]
    OpenAI,
}

impl std::fmt::Display for LLMProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LLMProvider::Gemini => write!(f, "gemini"),
            LLMProvider::OpenAI => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for LLMProvider {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "gemini" => Ok(LLMProvider::Gemini),
            "openai" => Ok(LLMProvider::OpenAI),
            _ => Err(format!("Unknown provider: {}", s)),
        }
    }
}

/// 写回存储的方式
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistenceKind {
    #[default]
    None,
    File,
    Rest,
}

impl std::str::FromStr for PersistenceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "none" => Ok(PersistenceKind::None),
            "file" => Ok(PersistenceKind::File),
            "rest" => Ok(PersistenceKind::Rest),
            _ => Err(format!("Unknown persistence kind: {}", s)),
        }
    }
}

/// 应用程序配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct Config {
    /// 模型回复语言
    pub target_language: TargetLanguage,

    /// 分类体系，可在配置文件中替换或扩充
    pub taxonomy: Taxonomy,

    /// 批量分析时的最大并发数
    pub max_parallels: usize,

    /// LLM模型配置
    pub llm: LLMConfig,

    /// 媒体加载配置
    pub media: MediaConfig,

    /// 写回配置
    pub persistence: PersistenceConfig,

    /// 是否启用详细日志
    pub verbose: bool,
}

/// LLM模型配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct LLMConfig {
    /// LLM Provider类型
    pub provider: LLMProvider,

    /// LLM API KEY
    pub api_key: String,

    /// LLM API基地址
    pub api_base_url: String,

    /// 支持多模态输入的模型
    pub model: String,

    /// 最大输出tokens
    pub max_tokens: u32,

    /// 温度
    pub temperature: f64,

    /// 单次调用的超时时间（秒）
    pub timeout_seconds: u64,
}

/// 媒体加载配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MediaConfig {
    /// 远端下载超时（秒）
    pub fetch_timeout_seconds: u64,

    /// 单个媒体的最大字节数
    pub max_media_bytes: usize,
}

/// 写回配置
#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct PersistenceConfig {
    pub kind: PersistenceKind,

    /// file模式下记录所在目录
    pub records_dir: PathBuf,

    /// rest模式下的服务地址，如 `https://xyz.supabase.co/rest/v1`
    pub rest_base_url: String,

    /// rest模式下的表名
    pub rest_table: String,

    pub rest_api_key: String,

    /// 单次写回的超时时间（秒）
    pub timeout_seconds: u64,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let mut file =
            File::open(path).context(format!("Failed to open config file: {:?}", path))?;
        let mut content = String::new();
        file.read_to_string(&mut content)
            .context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置中无法通过类型表达的约束
    pub fn validate(&self) -> Result<()> {
        if self.taxonomy.is_empty() {
            anyhow::bail!("taxonomy must contain at least one field");
        }
        let mut seen = std::collections::HashSet::new();
        for field in &self.taxonomy.fields {
            if field.code.trim().is_empty() {
                anyhow::bail!("taxonomy field with empty code (label: {})", field.label);
            }
            if !seen.insert(field.code.to_uppercase()) {
                anyhow::bail!("duplicated taxonomy code: {}", field.code);
            }
        }
        if self.persistence.kind == PersistenceKind::Rest
            && (self.persistence.rest_base_url.is_empty() || self.persistence.rest_table.is_empty())
        {
            anyhow::bail!("persistence.kind = \"rest\" requires rest_base_url and rest_table");
        }
        Ok(())
    }

    /// 默认配置文件路径（当前目录下的 classmedia.toml）
    pub fn default_path() -> PathBuf {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(DEFAULT_CONFIG_FILE)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_language: TargetLanguage::default(),
            taxonomy: Taxonomy::default(),
            max_parallels: 3,
            llm: LLMConfig::default(),
            media: MediaConfig::default(),
            persistence: PersistenceConfig::default(),
            verbose: false,
        }
    }
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            provider: LLMProvider::default(),
            api_key: std::env::var("CLASSMEDIA_LLM_API_KEY").unwrap_or_default(),
            api_base_url: String::from("https://generativelanguage.googleapis.com/v1beta"),
            model: String::from("gemini-2.0-flash"),
            max_tokens: 8192,
            temperature: 0.2,
            timeout_seconds: 120,
        }
    }
}

impl Default for MediaConfig {
    fn default() -> Self {
        Self {
            fetch_timeout_seconds: 30,
            max_media_bytes: 25 * 1024 * 1024, // 25MB
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            kind: PersistenceKind::default(),
            records_dir: PathBuf::from("./records"),
            rest_base_url: String::new(),
            rest_table: String::from("records"),
            rest_api_key: std::env::var("CLASSMEDIA_STORE_API_KEY").unwrap_or_default(),
            timeout_seconds: 30,
        }
    }
}

// Include tests
#[cfg(test)]
mod tests;
