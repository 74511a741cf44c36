//! 从模型的自由文本回复中提取结构化结果
//!
//! 模型被要求只输出JSON，但实际回复常带有前后说明或markdown代码块，
//! 因此取第一个 `{` 到最后一个 `}` 之间的片段再按媒体类型解析。

use serde::de::DeserializeOwned;

use crate::error::ExtractionError;
use crate::types::analysis::{AudioPayload, ExtractedPayload, ImagePayload, VideoPayload};
use crate::types::media::MediaKind;

/// 定位第一个 `{` 与最后一个 `}` 之间的片段（含两端）
pub fn locate_payload(raw_text: &str) -> Option<&str> {
    let start = raw_text.find('{')?;
    let end = raw_text.rfind('}')?;
    (end > start).then(|| &raw_text[start..=end])
}

/// 提取并解析结构化结果；字段级缺省在结构体的反序列化中完成
pub fn extract(raw_text: &str, kind: MediaKind) -> Result<ExtractedPayload, ExtractionError> {
    let span = locate_payload(raw_text).ok_or(ExtractionError::NoStructuredPayloadFound)?;

    match kind {
        MediaKind::Audio => parse::<AudioPayload>(span).map(ExtractedPayload::Audio),
        MediaKind::Image => parse::<ImagePayload>(span).map(ExtractedPayload::Image),
        MediaKind::Video => parse::<VideoPayload>(span).map(ExtractedPayload::Video),
    }
}

fn parse<T: DeserializeOwned>(span: &str) -> Result<T, ExtractionError> {
    serde_json::from_str(span).map_err(|e| ExtractionError::PayloadParse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::analysis::DEFAULT_CONFIDENCE;

    #[test]
    fn test_extract_tolerates_surrounding_prose() {
        let raw = "Here you go: {\"description\":\"kids painting\",\"tags_bncc\":[\"EI-TS\"],\"confidence\":0.9} Thanks!";
        let payload = extract(raw, MediaKind::Image).unwrap();

        assert_eq!(payload.transcription_or_description(), "kids painting");
        assert_eq!(payload.taxonomy_codes(), ["EI-TS".to_string()]);
        assert_eq!(payload.confidence(), 0.9);
    }

    #[test]
    fn test_extract_from_markdown_code_block() {
        let raw = "```json\n{\n  \"transcript\": \"Bom dia, Lia!\",\n  \"tags_bncc\": [\"EI-EF\"],\n  \"detected_names\": [\"Lia\"]\n}\n```";
        let payload = extract(raw, MediaKind::Audio).unwrap();

        assert_eq!(payload.transcription_or_description(), "Bom dia, Lia!");
        assert_eq!(payload.detected_names(), ["Lia".to_string()]);
        assert_eq!(payload.confidence(), DEFAULT_CONFIDENCE);
        assert!(payload.emotions().is_empty());
    }

    #[test]
    fn test_extract_without_braces_fails() {
        assert_eq!(
            extract("Desculpe, não consegui analisar.", MediaKind::Audio),
            Err(ExtractionError::NoStructuredPayloadFound)
        );
        assert_eq!(
            extract("} reversed {", MediaKind::Image),
            Err(ExtractionError::NoStructuredPayloadFound)
        );
    }

    #[test]
    fn test_extract_malformed_span_fails_with_parse_error() {
        let result = extract("{\"description\": \"unterminated}", MediaKind::Image);
        assert!(matches!(result, Err(ExtractionError::PayloadParse(_))));

        let wrong_type = extract("{\"confidence\": \"high\"}", MediaKind::Audio);
        assert!(matches!(wrong_type, Err(ExtractionError::PayloadParse(_))));
    }

    #[test]
    fn test_nested_objects_keep_outer_span() {
        let raw = "ok {\"description\":\"roda\",\"extra\":{\"a\":1}} fim";
        assert_eq!(
            locate_payload(raw),
            Some("{\"description\":\"roda\",\"extra\":{\"a\":1}}")
        );
        assert!(extract(raw, MediaKind::Image).is_ok());
    }

    #[test]
    fn test_video_payload_has_names_and_description() {
        let raw = r#"{"description":"Roda de música","transcript":"vamos cantar","detected_names":["Pedro"],"people_count":6}"#;
        let payload = extract(raw, MediaKind::Video).unwrap();

        assert_eq!(payload.kind(), MediaKind::Video);
        assert_eq!(payload.transcription_or_description(), "Roda de música");
        assert_eq!(payload.audio_transcript(), Some("vamos cantar"));
        assert_eq!(payload.people_count(), Some(6));
    }

    #[test]
    fn test_people_count_tolerates_odd_values() {
        let count = |value: &str| {
            let raw = format!(r#"{{"description":"x","people_count":{}}}"#, value);
            extract(&raw, MediaKind::Image).unwrap().people_count()
        };

        assert_eq!(count("6.0"), Some(6));
        assert_eq!(count("\"6\""), Some(6));
        assert_eq!(count("\"muitas\""), None);
        assert_eq!(count("-1"), None);
        assert_eq!(count("2.5"), None);
        assert_eq!(count("null"), None);
        assert_eq!(count("[3]"), None);

        let video = extract(r#"{"description":"x","pessoas":"12"}"#, MediaKind::Video).unwrap();
        assert_eq!(video.people_count(), Some(12));
    }
}
