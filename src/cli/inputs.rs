use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};

use crate::media::encode_base64;
use crate::types::media::{DEFAULT_CONTENT_TYPE, MediaKind, MediaReference};
use crate::types::roster::StudentRef;

/// 命令行给出的一个媒体输入，解析成引用和类型
#[derive(Debug, Clone, PartialEq)]
pub struct MediaInput {
    pub reference: MediaReference,
    pub kind: MediaKind,
}

/// 读取JSON格式的名单：`[{"id": "...", "name": "..."}]`
pub fn read_roster(path: &Path) -> Result<Vec<StudentRef>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read roster file {:?}", path))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid roster file {:?}", path))
}

/// 解析媒体输入：http(s)地址作为远端引用，`data:` URL 和本地文件作为内嵌数据
pub fn parse_media_input(input: &str, kind_override: Option<MediaKind>) -> Result<MediaInput> {
    let input = input.trim();
    if input.is_empty() {
        bail!("Empty media input");
    }

    if input.starts_with("http://") || input.starts_with("https://") {
        let kind = kind_override
            .or_else(|| extension_of(strip_query(input)).and_then(MediaKind::from_extension))
            .ok_or_else(|| anyhow!("Cannot infer media kind of {}, pass --kind", input))?;
        return Ok(MediaInput {
            reference: MediaReference::remote(input),
            kind,
        });
    }

    if let Some(rest) = input.strip_prefix("data:") {
        let mime = rest.split([';', ',']).next().unwrap_or_default();
        let kind = kind_override
            .or_else(|| MediaKind::from_content_type(mime))
            .ok_or_else(|| anyhow!("Cannot infer media kind of data URL ({}), pass --kind", mime))?;
        return Ok(MediaInput {
            reference: MediaReference::embedded(input, ""),
            kind,
        });
    }

    read_local_media(Path::new(input), kind_override)
}

/// 读取本地文件，按内容嗅探类型，嗅探失败时退回扩展名
fn read_local_media(path: &Path, kind_override: Option<MediaKind>) -> Result<MediaInput> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read media file {:?}", path))?;
    let sniffed = infer::get(&bytes).map(|t| t.mime_type().to_string());

    let kind = kind_override
        .or_else(|| sniffed.as_deref().and_then(MediaKind::from_content_type))
        .or_else(|| {
            path.extension()
                .and_then(|e| e.to_str())
                .and_then(MediaKind::from_extension)
        })
        .ok_or_else(|| anyhow!("Cannot infer media kind of {:?}, pass --kind", path))?;

    let content_type = sniffed.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string());
    Ok(MediaInput {
        reference: MediaReference::embedded(encode_base64(&bytes), content_type),
        kind,
    })
}

fn strip_query(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}

fn extension_of(path: &str) -> Option<&str> {
    let file_name = path.rsplit('/').next()?;
    let (_, extension) = file_name.rsplit_once('.')?;
    (!extension.is_empty()).then_some(extension)
}
