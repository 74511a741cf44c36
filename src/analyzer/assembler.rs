use chrono::{DateTime, Utc};
use tracing::debug;

use crate::types::analysis::{AnalysisMetadata, AnalysisResult, ExtractedPayload};
use crate::types::taxonomy::Taxonomy;

/// 合并解析结果、匹配到的学生和处理时间，生成最终结果
///
/// 分类代码统一为大写后按首次出现顺序去重，不在分类体系中的代码被丢弃；
/// 时间由调用方传入，便于测试。
pub fn assemble(
    payload: &ExtractedPayload,
    resolved_ids: Vec<String>,
    taxonomy: &Taxonomy,
    now: DateTime<Utc>,
) -> AnalysisResult {
    let mut taxonomy_codes: Vec<String> = Vec::new();
    for raw_code in payload.taxonomy_codes() {
        let code = match taxonomy.lookup(raw_code) {
            Some(field) => field.code.clone(),
            None => {
                debug!(code = %raw_code, taxonomy = %taxonomy.version, "unknown taxonomy code dropped");
                continue;
            }
        };
        if !taxonomy_codes.contains(&code) {
            taxonomy_codes.push(code);
        }
    }

    let text = payload.transcription_or_description().trim();
    let transcription_or_description = (!text.is_empty()).then(|| text.to_string());

    AnalysisResult {
        transcription_or_description,
        taxonomy_codes,
        resolved_student_ids: resolved_ids,
        metadata: AnalysisMetadata {
            confidence: payload.confidence(),
            activities: payload.activities().to_vec(),
            emotions: payload.emotions().to_vec(),
            detected_names: payload.detected_names().to_vec(),
            people_count: payload.people_count(),
            audio_transcript: payload.audio_transcript().map(str::to_string),
            taxonomy_version: taxonomy.version.clone(),
            processed_at_utc: now,
        },
    }
}
