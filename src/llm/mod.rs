//! 生成式模型边界
//!
//! 核心流程只依赖 [`ModelInvoker`]：给定指令文本和媒体，返回模型的原始文本。

use anyhow::Result;
use async_trait::async_trait;

pub mod client;

pub use client::LLMClient;

/// 模型调用者
#[async_trait]
pub trait ModelInvoker: Send + Sync {
    /// 发送指令和媒体，返回模型的原始文本输出
    async fn invoke(
        &self,
        instruction_text: &str,
        media_bytes: &[u8],
        content_type: &str,
    ) -> Result<String>;
}
