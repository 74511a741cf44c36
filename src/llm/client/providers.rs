//! LLM Provider支持模块

use std::time::Duration;

use anyhow::{Context, Result, anyhow, bail};
use base64::Engine;
use base64::engine::general_purpose;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::config::{LLMConfig, LLMProvider};

/// 统一的Provider客户端枚举
#[derive(Clone)]
pub enum ProviderClient {
    Gemini(GeminiClient),
    OpenAI(OpenAIClient),
}

impl ProviderClient {
    /// 根据配置创建相应的provider客户端
    pub fn new(config: &LLMConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .context("Failed to build HTTP client for LLM provider")?;
        let base_url = config.api_base_url.trim_end_matches('/').to_string();

        match config.provider {
            LLMProvider::Gemini => Ok(ProviderClient::Gemini(GeminiClient {
                http,
                base_url,
                api_key: config.api_key.clone(),
            })),
            LLMProvider::OpenAI => Ok(ProviderClient::OpenAI(OpenAIClient {
                http,
                base_url,
                api_key: config.api_key.clone(),
            })),
        }
    }

    /// 执行一次多模态生成，返回拼接后的文本
    pub async fn generate(
        &self,
        config: &LLMConfig,
        instruction_text: &str,
        media_bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        match self {
            ProviderClient::Gemini(client) => {
                client
                    .generate(config, instruction_text, media_bytes, content_type)
                    .await
            }
            ProviderClient::OpenAI(client) => {
                client
                    .generate(config, instruction_text, media_bytes, content_type)
                    .await
            }
        }
    }
}

/// Gemini `generateContent` REST 客户端
#[derive(Clone)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f64,
    max_output_tokens: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<Content>,
    #[serde(default)]
    finish_reason: Option<String>,
}

impl GeminiClient {
    async fn generate(
        &self,
        config: &LLMConfig,
        instruction_text: &str,
        media_bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part {
                        text: Some(instruction_text.to_string()),
                        inline_data: None,
                    },
                    Part {
                        text: None,
                        inline_data: Some(InlineData {
                            mime_type: content_type.to_string(),
                            data: general_purpose::STANDARD.encode(media_bytes),
                        }),
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: config.temperature,
                max_output_tokens: config.max_tokens,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, config.model);
        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .context("Gemini request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("Gemini returned HTTP {}: {}", status, truncate(&body, 512));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .context("Failed to decode Gemini response")?;
        gemini_text(parsed)
    }
}

fn gemini_text(response: GenerateContentResponse) -> Result<String> {
    let candidate = response
        .candidates
        .into_iter()
        .next()
        .ok_or_else(|| anyhow!("Gemini response has no candidates"))?;

    let text: String = candidate
        .content
        .map(|content| {
            content
                .parts
                .into_iter()
                .filter_map(|part| part.text)
                .collect::<Vec<_>>()
                .join("")
        })
        .unwrap_or_default();

    if text.trim().is_empty() {
        bail!(
            "Gemini candidate has no text (finish reason: {})",
            candidate.finish_reason.as_deref().unwrap_or("unknown")
        );
    }
    Ok(text)
}

/// OpenAI兼容的 `chat/completions` 客户端
#[derive(Clone)]
pub struct OpenAIClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAIClient {
    async fn generate(
        &self,
        config: &LLMConfig,
        instruction_text: &str,
        media_bytes: &[u8],
        content_type: &str,
    ) -> Result<String> {
        let media_part = openai_media_part(media_bytes, content_type)?;
        let body = json!({
            "model": config.model,
            "temperature": config.temperature,
            "max_tokens": config.max_tokens,
            "messages": [{
                "role": "user",
                "content": [
                    { "type": "text", "text": instruction_text },
                    media_part,
                ],
            }],
        });

        let url = format!("{}/chat/completions", self.base_url);
        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .context("OpenAI request failed")?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            bail!("OpenAI returned HTTP {}: {}", status, truncate(&body, 512));
        }

        let parsed: ChatCompletionResponse = response
            .json()
            .await
            .context("Failed to decode OpenAI response")?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| anyhow!("OpenAI response has no message content"))
    }
}

/// 图片以data URL形式发送，音频以 input_audio 发送；视频不被该接口接受
fn openai_media_part(media_bytes: &[u8], content_type: &str) -> Result<serde_json::Value> {
    let data = general_purpose::STANDARD.encode(media_bytes);
    if content_type.starts_with("image/") {
        return Ok(json!({
            "type": "image_url",
            "image_url": { "url": format!("data:{};base64,{}", content_type, data) },
        }));
    }
    if content_type.starts_with("audio/") {
        let format = match content_type {
            "audio/mpeg" | "audio/mp3" => "mp3",
            "audio/wav" | "audio/x-wav" | "audio/wave" => "wav",
            other => bail!("OpenAI input_audio does not accept {}", other),
        };
        return Ok(json!({
            "type": "input_audio",
            "input_audio": { "data": data, "format": format },
        }));
    }
    bail!("OpenAI chat completions do not accept {} media", content_type)
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() > max_chars {
        let truncated: String = text.chars().take(max_chars).collect();
        format!("{}...", truncated)
    } else {
        text.to_string()
    }
}
