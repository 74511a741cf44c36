//! LLM客户端 - 提供统一的多模态模型调用接口

use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::config::LLMConfig;
use crate::llm::ModelInvoker;

mod providers;

use providers::ProviderClient;

/// LLM客户端 - 按配置选择Provider
#[derive(Clone)]
pub struct LLMClient {
    config: LLMConfig,
    client: ProviderClient,
}

impl LLMClient {
    /// 创建新的LLM客户端
    pub fn new(config: LLMConfig) -> Result<Self> {
        let client = ProviderClient::new(&config)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &LLMConfig {
        &self.config
    }
}

#[async_trait]
impl ModelInvoker for LLMClient {
    async fn invoke(
        &self,
        instruction_text: &str,
        media_bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        debug!(
            provider = %self.config.provider,
            model = %self.config.model,
            prompt_chars = instruction_text.len(),
            media_bytes = media_bytes.len(),
            "invoking model"
        );
        self.client
            .generate(&self.config, instruction_text, media_bytes, content_type)
            .await
    }
}
