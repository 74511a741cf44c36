use std::path::PathBuf;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio::fs;

use super::{PersistenceSink, RecordUpdate};
use crate::error::AnalysisError;

/// 以目录中的JSON文件作为记录存储，每个记录一个 `<record_id>.json`
pub struct FileRecordSink {
    records_dir: PathBuf,
}

impl FileRecordSink {
    pub fn new(records_dir: PathBuf) -> Self {
        Self { records_dir }
    }

    fn record_path(&self, record_id: &str) -> Result<PathBuf, AnalysisError> {
        let valid = !record_id.is_empty()
            && record_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AnalysisError::PersistenceWrite(format!(
                "invalid record id: {:?}",
                record_id
            )));
        }
        Ok(self.records_dir.join(format!("{}.json", record_id)))
    }
}

#[async_trait]
impl PersistenceSink for FileRecordSink {
    /// 已有记录的其他字段保留，只覆盖 transcript/tags/metadata
    async fn update(&self, record_id: &str, update: &RecordUpdate) -> Result<(), AnalysisError> {
        let path = self.record_path(record_id)?;
        let write_error =
            |e: &dyn std::fmt::Display| AnalysisError::PersistenceWrite(format!("{:?}: {}", path, e));

        let mut record = match fs::read_to_string(&path).await {
            Ok(content) => match serde_json::from_str::<Value>(&content) {
                Ok(Value::Object(map)) => map,
                Ok(_) => return Err(write_error(&"existing record is not a JSON object")),
                Err(e) => return Err(write_error(&e)),
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(e) => return Err(write_error(&e)),
        };

        let fields = serde_json::to_value(update).map_err(|e| write_error(&e))?;
        if let Value::Object(fields) = fields {
            record.extend(fields);
        }
        record.insert("id".to_string(), Value::String(record_id.to_string()));

        fs::create_dir_all(&self.records_dir)
            .await
            .map_err(|e| write_error(&e))?;
        let content = serde_json::to_string_pretty(&Value::Object(record))
            .map_err(|e| write_error(&e))?;
        // 先写临时文件再改名，中途失败不会破坏已有记录
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .await
            .map_err(|e| write_error(&e))?;
        if let Err(e) = fs::rename(&tmp_path, &path).await {
            let _ = fs::remove_file(&tmp_path).await;
            return Err(write_error(&e));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::analysis::AnalysisMetadata;
    use chrono::Utc;
    use tempfile::TempDir;

    fn update() -> RecordUpdate {
        RecordUpdate {
            transcript_or_description: Some("Pintura com guache".to_string()),
            taxonomy_codes: vec!["EI-TS".to_string()],
            metadata: AnalysisMetadata {
                confidence: 0.9,
                activities: vec!["pintura".to_string()],
                emotions: vec![],
                detected_names: vec![],
                people_count: Some(4),
                audio_transcript: None,
                taxonomy_version: "bncc-ei-2018".to_string(),
                processed_at_utc: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn test_update_creates_record() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileRecordSink::new(temp_dir.path().join("records"));

        sink.update("rec-1", &update()).await.unwrap();

        let content = std::fs::read_to_string(temp_dir.path().join("records/rec-1.json")).unwrap();
        let json: Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json["id"], "rec-1");
        assert_eq!(json["transcript"], "Pintura com guache");
        assert_eq!(json["tags"][0], "EI-TS");
        assert_eq!(json["metadata"]["people_count"], 4);
    }

    #[tokio::test]
    async fn test_update_keeps_other_fields() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rec_2.json");
        std::fs::write(&path, r#"{"id":"rec_2","child":"Lia","tags":["old"]}"#).unwrap();

        let sink = FileRecordSink::new(temp_dir.path().to_path_buf());
        sink.update("rec_2", &update()).await.unwrap();

        let json: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["child"], "Lia");
        assert_eq!(json["tags"], serde_json::json!(["EI-TS"]));
    }

    #[tokio::test]
    async fn test_rejects_path_like_ids() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileRecordSink::new(temp_dir.path().to_path_buf());

        for id in ["", "../escape", "a/b", "x.json"] {
            let err = sink.update(id, &update()).await.unwrap_err();
            assert_eq!(err.kind(), "PersistenceWriteError");
        }
    }

    #[tokio::test]
    async fn test_non_object_record_fails() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("r.json"), "[1,2]").unwrap();

        let sink = FileRecordSink::new(temp_dir.path().to_path_buf());
        assert!(sink.update("r", &update()).await.is_err());
    }

    #[tokio::test]
    async fn test_update_leaves_no_temporary_file() {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileRecordSink::new(temp_dir.path().to_path_buf());

        sink.update("rec-3", &update()).await.unwrap();
        sink.update("rec-3", &update()).await.unwrap();

        let names: Vec<String> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["rec-3.json"]);
    }

    #[tokio::test]
    async fn test_failed_write_keeps_existing_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rec-4.json");
        let original = r#"{"id":"rec-4","child":"Lia"}"#;
        std::fs::write(&path, original).unwrap();
        // 临时文件位置被目录占用，写入必然失败
        std::fs::create_dir(temp_dir.path().join("rec-4.json.tmp")).unwrap();

        let sink = FileRecordSink::new(temp_dir.path().to_path_buf());
        let err = sink.update("rec-4", &update()).await.unwrap_err();
        assert_eq!(err.kind(), "PersistenceWriteError");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
    }
}
