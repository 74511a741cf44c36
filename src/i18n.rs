use serde::{Deserialize, Serialize};

/// 模型回复使用的语言
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Default)]
pub enum TargetLanguage {
    #[serde(rename = "pt")]
    #[default]
    Portuguese,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "es")]
    Spanish,
}

impl std::fmt::Display for TargetLanguage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetLanguage::Portuguese => write!(f, "pt"),
            TargetLanguage::English => write!(f, "en"),
            TargetLanguage::Spanish => write!(f, "es"),
        }
    }
}

impl std::str::FromStr for TargetLanguage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pt" | "pt-br" | "portuguese" | "português" => Ok(TargetLanguage::Portuguese),
            "en" | "english" | "inglês" => Ok(TargetLanguage::English),
            "es" | "spanish" | "español" | "espanhol" => Ok(TargetLanguage::Spanish),
            _ => Err(format!("Unknown target language: {}", s)),
        }
    }
}

impl TargetLanguage {
    pub fn display_name(&self) -> &'static str {
        match self {
            TargetLanguage::Portuguese => "Português",
            TargetLanguage::English => "English",
            TargetLanguage::Spanish => "Español",
        }
    }

    /// 追加在指令末尾的语言要求，只约束自由文本字段，不影响JSON字段名
    pub fn prompt_instruction(&self) -> &'static str {
        match self {
            TargetLanguage::Portuguese => {
                "Escreva todos os textos livres (transcrição, descrição, atividades, emoções) em português do Brasil. Não traduza os nomes dos campos JSON."
            }
            TargetLanguage::English => {
                "Write every free-text value (transcript, description, activities, emotions) in English. Do not translate the JSON field names."
            }
            TargetLanguage::Spanish => {
                "Escribe todos los textos libres (transcripción, descripción, actividades, emociones) en español. No traduzcas los nombres de los campos JSON."
            }
        }
    }
}
