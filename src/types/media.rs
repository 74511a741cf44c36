use std::fmt::{Display, Formatter};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// 远端未声明类型时使用的默认Content-Type
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// 媒体引用：内嵌的base64数据，或远端地址，二者必居其一
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MediaReference {
    Embedded {
        /// base64编码的媒体内容，也接受 `data:<mime>;base64,` 前缀
        base64_payload: String,
        /// 调用方声明的Content-Type
        declared_content_type: String,
    },
    Remote {
        /// 可以直接GET的地址
        locator: String,
    },
}

impl MediaReference {
    pub fn embedded(base64_payload: impl Into<String>, declared_content_type: impl Into<String>) -> Self {
        MediaReference::Embedded {
            base64_payload: base64_payload.into(),
            declared_content_type: declared_content_type.into(),
        }
    }

    pub fn remote(locator: impl Into<String>) -> Self {
        MediaReference::Remote {
            locator: locator.into(),
        }
    }

    /// 用于日志的简短描述，不输出payload本身
    pub fn describe(&self) -> String {
        match self {
            MediaReference::Embedded {
                base64_payload,
                declared_content_type,
            } => format!(
                "embedded({}, {} chars)",
                declared_content_type,
                base64_payload.len()
            ),
            MediaReference::Remote { locator } => format!("remote({})", locator),
        }
    }
}

/// 媒体类型，决定使用哪一套Prompt和输出结构
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Audio,
    Image,
    Video,
}

impl MediaKind {
    /// 只有音频和视频会检测人名并进入学生匹配阶段
    pub fn resolves_participants(&self) -> bool {
        matches!(self, MediaKind::Audio | MediaKind::Video)
    }

    /// 根据MIME大类推断媒体类型
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let family = content_type.split('/').next()?.trim().to_lowercase();
        match family.as_str() {
            "audio" => Some(MediaKind::Audio),
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            _ => None,
        }
    }

    /// 根据文件扩展名推断媒体类型
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.to_lowercase().as_str() {
            "mp3" | "wav" | "m4a" | "aac" | "ogg" | "oga" | "opus" | "flac" => {
                Some(MediaKind::Audio)
            }
            "jpg" | "jpeg" | "png" | "gif" | "webp" | "heic" | "heif" | "bmp" => {
                Some(MediaKind::Image)
            }
            "mp4" | "mov" | "m4v" | "webm" | "avi" | "mkv" | "3gp" => Some(MediaKind::Video),
            _ => None,
        }
    }
}

impl Display for MediaKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            MediaKind::Audio => write!(f, "audio"),
            MediaKind::Image => write!(f, "image"),
            MediaKind::Video => write!(f, "video"),
        }
    }
}

impl std::str::FromStr for MediaKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "audio" | "áudio" => Ok(MediaKind::Audio),
            "image" | "imagem" | "photo" | "foto" => Ok(MediaKind::Image),
            "video" | "vídeo" => Ok(MediaKind::Video),
            _ => Err(format!("Unknown media kind: {}", s)),
        }
    }
}

/// 加载完成的媒体
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedMedia {
    pub bytes: Vec<u8>,
    pub content_type: String,
}
