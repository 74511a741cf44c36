use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::types::media::MediaKind;

/// 模型未给出置信度时采用的默认值
pub const DEFAULT_CONFIDENCE: f64 = 0.8;

fn default_confidence() -> f64 {
    DEFAULT_CONFIDENCE
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<Option<String>>),
}

/// 列表字段：缺失或null时为空，单个字符串视为一个元素
fn string_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let items = match Option::<OneOrMany>::deserialize(deserializer)? {
        None => vec![],
        Some(OneOrMany::One(item)) => vec![item],
        Some(OneOrMany::Many(items)) => items.into_iter().flatten().collect(),
    };
    Ok(items
        .into_iter()
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect())
}

fn nullable_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// 人数：接受整数、整数值的浮点数和数字字符串，其余（负数、小数、文字）视为缺失
fn lenient_count<'de, D>(deserializer: D) -> Result<Option<u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let count = match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Number(number)) => number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|value| *value >= 0.0 && value.fract() == 0.0)
                .map(|value| value as u64)
        }),
        Some(Value::String(text)) => text.trim().parse::<u64>().ok(),
        _ => None,
    };
    Ok(count.and_then(|value| u32::try_from(value).ok()))
}

/// 置信度：null时取默认值，其余收敛到 [0,1]
fn confidence<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<f64>::deserialize(deserializer)? {
        Some(value) if value.is_finite() => value.clamp(0.0, 1.0),
        _ => DEFAULT_CONFIDENCE,
    })
}

/// Resultado da análise de um áudio de sala de aula.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AudioPayload {
    /// Transcrição integral do que é dito no áudio.
    #[serde(default, alias = "transcricao", alias = "transcription", deserialize_with = "nullable_string")]
    pub transcript: String,
    /// Códigos dos campos de experiência aplicáveis, apenas os listados na instrução.
    #[serde(rename = "tags_bncc", default, alias = "taxonomy_codes", deserialize_with = "string_list")]
    pub taxonomy_codes: Vec<String>,
    /// Nomes de crianças mencionadas ou que falam, como aparecem no áudio.
    #[serde(default, alias = "nomes_detectados", deserialize_with = "string_list")]
    pub detected_names: Vec<String>,
    #[serde(default, alias = "atividades", deserialize_with = "string_list")]
    pub detected_activities: Vec<String>,
    #[serde(default, alias = "emocoes", deserialize_with = "string_list")]
    pub detected_emotions: Vec<String>,
    /// Confiança da análise, de 0.0 a 1.0.
    #[serde(default = "default_confidence", alias = "confianca", deserialize_with = "confidence")]
    pub confidence: f64,
}

/// Resultado da análise de uma foto de sala de aula.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ImagePayload {
    /// Descrição objetiva da cena.
    #[serde(default, alias = "descricao", deserialize_with = "nullable_string")]
    pub description: String,
    #[serde(rename = "tags_bncc", default, alias = "taxonomy_codes", deserialize_with = "string_list")]
    pub taxonomy_codes: Vec<String>,
    #[serde(default, alias = "atividades", deserialize_with = "string_list")]
    pub detected_activities: Vec<String>,
    /// Número de pessoas visíveis.
    #[serde(default, alias = "pessoas", deserialize_with = "lenient_count")]
    pub people_count: Option<u32>,
    #[serde(default = "default_confidence", alias = "confianca", deserialize_with = "confidence")]
    pub confidence: f64,
}

/// Resultado da análise de um vídeo: descrição da cena e transcrição opcional do áudio.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct VideoPayload {
    #[serde(default, alias = "descricao", deserialize_with = "nullable_string")]
    pub description: String,
    /// Transcrição da fala; vazio se não houver fala.
    #[serde(default, alias = "transcricao", alias = "transcription", deserialize_with = "nullable_string")]
    pub transcript: String,
    #[serde(rename = "tags_bncc", default, alias = "taxonomy_codes", deserialize_with = "string_list")]
    pub taxonomy_codes: Vec<String>,
    #[serde(default, alias = "nomes_detectados", deserialize_with = "string_list")]
    pub detected_names: Vec<String>,
    #[serde(default, alias = "atividades", deserialize_with = "string_list")]
    pub detected_activities: Vec<String>,
    #[serde(default, alias = "emocoes", deserialize_with = "string_list")]
    pub detected_emotions: Vec<String>,
    #[serde(default, alias = "pessoas", deserialize_with = "lenient_count")]
    pub people_count: Option<u32>,
    #[serde(default = "default_confidence", alias = "confianca", deserialize_with = "confidence")]
    pub confidence: f64,
}

/// 按媒体类型区分的解析结果
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ExtractedPayload {
    Audio(AudioPayload),
    Image(ImagePayload),
    Video(VideoPayload),
}

impl ExtractedPayload {
    pub fn kind(&self) -> MediaKind {
        match self {
            ExtractedPayload::Audio(_) => MediaKind::Audio,
            ExtractedPayload::Image(_) => MediaKind::Image,
            ExtractedPayload::Video(_) => MediaKind::Video,
        }
    }

    /// 音频取转写，图片取描述，视频优先描述、没有时退回转写
    pub fn transcription_or_description(&self) -> &str {
        match self {
            ExtractedPayload::Audio(p) => &p.transcript,
            ExtractedPayload::Image(p) => &p.description,
            ExtractedPayload::Video(p) if !p.description.trim().is_empty() => &p.description,
            ExtractedPayload::Video(p) => &p.transcript,
        }
    }

    pub fn taxonomy_codes(&self) -> &[String] {
        match self {
            ExtractedPayload::Audio(p) => &p.taxonomy_codes,
            ExtractedPayload::Image(p) => &p.taxonomy_codes,
            ExtractedPayload::Video(p) => &p.taxonomy_codes,
        }
    }

    pub fn detected_names(&self) -> &[String] {
        match self {
            ExtractedPayload::Audio(p) => &p.detected_names,
            ExtractedPayload::Image(_) => &[],
            ExtractedPayload::Video(p) => &p.detected_names,
        }
    }

    pub fn activities(&self) -> &[String] {
        match self {
            ExtractedPayload::Audio(p) => &p.detected_activities,
            ExtractedPayload::Image(p) => &p.detected_activities,
            ExtractedPayload::Video(p) => &p.detected_activities,
        }
    }

    pub fn emotions(&self) -> &[String] {
        match self {
            ExtractedPayload::Audio(p) => &p.detected_emotions,
            ExtractedPayload::Image(_) => &[],
            ExtractedPayload::Video(p) => &p.detected_emotions,
        }
    }

    pub fn confidence(&self) -> f64 {
        match self {
            ExtractedPayload::Audio(p) => p.confidence,
            ExtractedPayload::Image(p) => p.confidence,
            ExtractedPayload::Video(p) => p.confidence,
        }
    }

    pub fn people_count(&self) -> Option<u32> {
        match self {
            ExtractedPayload::Audio(_) => None,
            ExtractedPayload::Image(p) => p.people_count,
            ExtractedPayload::Video(p) => p.people_count,
        }
    }

    /// 视频在有描述时额外保留的音轨转写
    pub fn audio_transcript(&self) -> Option<&str> {
        match self {
            ExtractedPayload::Video(p)
                if !p.description.trim().is_empty() && !p.transcript.trim().is_empty() =>
            {
                Some(&p.transcript)
            }
            _ => None,
        }
    }
}

/// 分析结果的附加信息
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisMetadata {
    pub confidence: f64,
    pub activities: Vec<String>,
    pub emotions: Vec<String>,
    pub detected_names: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub people_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_transcript: Option<String>,
    pub taxonomy_version: String,
    pub processed_at_utc: DateTime<Utc>,
}

/// 流水线的最终输出
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    pub transcription_or_description: Option<String>,
    /// 规范为分类体系中的代码，去重并保持首次出现顺序；不在分类体系中的代码被移除
    pub taxonomy_codes: Vec<String>,
    /// 只包含输入名单中的标识
    pub resolved_student_ids: Vec<String>,
    pub metadata: AnalysisMetadata,
}
