//! 媒体加载器 - 把媒体引用解析为 (字节, Content-Type)

use std::time::Duration;

use anyhow::Result;
use base64::Engine;
use base64::engine::general_purpose;
use tracing::debug;

use crate::config::MediaConfig;
use crate::error::AnalysisError;
use crate::types::media::{DEFAULT_CONTENT_TYPE, LoadedMedia, MediaReference};

/// 媒体加载器，远端下载复用同一个HTTP客户端
#[derive(Clone)]
pub struct MediaLoader {
    http: reqwest::Client,
    max_media_bytes: usize,
}

impl MediaLoader {
    pub fn new(config: &MediaConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.fetch_timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            max_media_bytes: config.max_media_bytes,
        })
    }

    /// 解析媒体引用；只有Remote会产生一次网络请求
    pub async fn load(&self, reference: &MediaReference) -> Result<LoadedMedia, AnalysisError> {
        match reference {
            MediaReference::Embedded {
                base64_payload,
                declared_content_type,
            } => {
                let media = decode_embedded(base64_payload, declared_content_type)?;
                if media.bytes.len() > self.max_media_bytes {
                    return Err(AnalysisError::MalformedMedia(format!(
                        "embedded media has {} bytes, limit is {}",
                        media.bytes.len(),
                        self.max_media_bytes
                    )));
                }
                Ok(media)
            }
            MediaReference::Remote { locator } => self.fetch_remote(locator).await,
        }
    }

    async fn fetch_remote(&self, locator: &str) -> Result<LoadedMedia, AnalysisError> {
        debug!(locator, "fetching remote media");

        let mut response = self
            .http
            .get(locator)
            .send()
            .await
            .map_err(|e| AnalysisError::MediaFetch(format!("{}: {}", locator, e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AnalysisError::MediaFetch(format!(
                "{}: HTTP {}",
                locator, status
            )));
        }

        if let Some(length) = response.content_length()
            && length as usize > self.max_media_bytes
        {
            return Err(AnalysisError::MediaFetch(format!(
                "{}: {} bytes exceeds limit of {}",
                locator, length, self.max_media_bytes
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(essence)
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

        // 没有Content-Length时边读边检查上限，不把超限的响应整体读入内存
        let mut bytes: Vec<u8> = Vec::new();
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| AnalysisError::MediaFetch(format!("{}: {}", locator, e)))?
        {
            if bytes.len() + chunk.len() > self.max_media_bytes {
                return Err(AnalysisError::MediaFetch(format!(
                    "{}: body exceeds limit of {} bytes",
                    locator, self.max_media_bytes
                )));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!(locator, content_type = %content_type, size = bytes.len(), "remote media loaded");
        Ok(LoadedMedia {
            bytes,
            content_type,
        })
    }
}

/// 去掉 `; charset=...` 之类的参数
fn essence(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase()
}

/// 解码内嵌媒体。支持 `data:<mime>;base64,<payload>` 形式，
/// 声明的Content-Type优先，其次是data URL中的类型。
pub fn decode_embedded(
    base64_payload: &str,
    declared_content_type: &str,
) -> Result<LoadedMedia, AnalysisError> {
    let trimmed = base64_payload.trim();
    let (payload, data_url_type) = match trimmed.strip_prefix("data:") {
        Some(rest) => {
            let (header, payload) = rest.split_once(',').ok_or_else(|| {
                AnalysisError::MalformedMedia("data URL without ',' separator".to_string())
            })?;
            let mut parts = header.split(';');
            let mime = parts.next().unwrap_or_default().trim().to_string();
            if !parts.any(|part| part.trim().eq_ignore_ascii_case("base64")) {
                return Err(AnalysisError::MalformedMedia(
                    "data URL is not base64 encoded".to_string(),
                ));
            }
            (payload, Some(mime))
        }
        None => (trimmed, None),
    };

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.is_empty() {
        return Err(AnalysisError::MalformedMedia("empty media payload".to_string()));
    }

    let bytes = general_purpose::STANDARD
        .decode(compact.as_bytes())
        .or_else(|_| general_purpose::URL_SAFE.decode(compact.as_bytes()))
        .map_err(|e| AnalysisError::MalformedMedia(format!("invalid base64 payload: {}", e)))?;

    let content_type = [Some(declared_content_type.to_string()), data_url_type]
        .into_iter()
        .flatten()
        .map(|value| essence(&value))
        .find(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());

    Ok(LoadedMedia {
        bytes,
        content_type,
    })
}

/// 把原始字节编码为内嵌引用使用的base64
pub fn encode_base64(bytes: &[u8]) -> String {
    general_purpose::STANDARD.encode(bytes)
}
