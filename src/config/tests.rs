#[cfg(test)]
mod tests {
    use crate::config::{
        Config, LLMConfig, LLMProvider, MediaConfig, PersistenceConfig, PersistenceKind,
    };
    use crate::i18n::TargetLanguage;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();

        assert_eq!(config.target_language, TargetLanguage::Portuguese);
        assert_eq!(config.taxonomy.fields.len(), 5);
        assert_eq!(config.max_parallels, 3);
        assert!(!config.verbose);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_llm_provider_default() {
        let provider = LLMProvider::default();
        assert_eq!(provider, LLMProvider::Gemini);
    }

    #[test]
    fn test_llm_provider_from_str() {
        assert_eq!("gemini".parse::<LLMProvider>().unwrap(), LLMProvider::Gemini);
        assert_eq!("OpenAI".parse::<LLMProvider>().unwrap(), LLMProvider::OpenAI);
        assert!("invalid".parse::<LLMProvider>().is_err());
    }

    #[test]
    fn test_llm_provider_display() {
        assert_eq!(LLMProvider::Gemini.to_string(), "gemini");
        assert_eq!(LLMProvider::OpenAI.to_string(), "openai");
    }

    #[test]
    fn test_llm_config_default() {
        let config = LLMConfig::default();

        assert_eq!(config.provider, LLMProvider::Gemini);
        // api_key may be empty if env var is not set
        assert!(!config.api_base_url.is_empty());
        assert!(!config.model.is_empty());
        assert_eq!(config.max_tokens, 8192);
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.timeout_seconds, 120);
    }

    #[test]
    fn test_media_config_default() {
        let config = MediaConfig::default();

        assert_eq!(config.fetch_timeout_seconds, 30);
        assert_eq!(config.max_media_bytes, 25 * 1024 * 1024);
    }

    #[test]
    fn test_persistence_config_default() {
        let config = PersistenceConfig::default();

        assert_eq!(config.kind, PersistenceKind::None);
        assert_eq!(config.records_dir, PathBuf::from("./records"));
        assert_eq!(config.rest_table, "records");
        assert_eq!(config.timeout_seconds, 30);
    }

    #[test]
    fn test_from_file_partial_config_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("classmedia.toml");

        let content = r#"
target_language = "en"
max_parallels = 5

[llm]
provider = "openai"
model = "gpt-4o-mini"
api_base_url = "https://api.openai.com/v1"

[persistence]
kind = "file"
records_dir = "/tmp/records"
"#;
        std::fs::write(&config_path, content).unwrap();

        let config = Config::from_file(&config_path).unwrap();

        assert_eq!(config.target_language, TargetLanguage::English);
        assert_eq!(config.max_parallels, 5);
        assert_eq!(config.llm.provider, LLMProvider::OpenAI);
        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.timeout_seconds, 120);
        assert_eq!(config.persistence.kind, PersistenceKind::File);
        assert_eq!(config.persistence.records_dir, PathBuf::from("/tmp/records"));
        assert_eq!(config.taxonomy.fields.len(), 5);
    }

    #[test]
    fn test_from_file_custom_taxonomy() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("classmedia.toml");

        let content = r#"
[taxonomy]
version = "escola-2025"

[[taxonomy.fields]]
code = "EI-EO"
label = "O eu, o outro e o nós"

[[taxonomy.fields]]
code = "EI-MUS"
label = "Musicalização"
"#;
        std::fs::write(&config_path, content).unwrap();

        let config = Config::from_file(&config_path).unwrap();

        assert_eq!(config.taxonomy.version, "escola-2025");
        assert_eq!(config.taxonomy.codes(), vec!["EI-EO", "EI-MUS"]);
    }

    #[test]
    fn test_from_file_rejects_duplicated_taxonomy_codes() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("classmedia.toml");

        let content = r#"
[taxonomy]
version = "x"

[[taxonomy.fields]]
code = "EI-EO"
label = "a"

[[taxonomy.fields]]
code = "ei-eo"
label = "b"
"#;
        std::fs::write(&config_path, content).unwrap();

        assert!(Config::from_file(&config_path).is_err());
    }

    #[test]
    fn test_rest_persistence_requires_base_url() {
        let mut config = Config::default();
        config.persistence.kind = PersistenceKind::Rest;
        assert!(config.validate().is_err());

        config.persistence.rest_base_url = "https://store.example.com/rest/v1".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_file_missing() {
        let result = Config::from_file(&PathBuf::from("/nonexistent/classmedia.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_persistence_kind_from_str() {
        assert_eq!("file".parse::<PersistenceKind>().unwrap(), PersistenceKind::File);
        assert_eq!("REST".parse::<PersistenceKind>().unwrap(), PersistenceKind::Rest);
        assert!("db".parse::<PersistenceKind>().is_err());
    }
}
