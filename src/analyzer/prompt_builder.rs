use schemars::{JsonSchema, schema_for};

use crate::i18n::TargetLanguage;
use crate::types::analysis::{AudioPayload, ImagePayload, VideoPayload};
use crate::types::media::MediaKind;
use crate::types::roster::StudentRef;
use crate::types::taxonomy::Taxonomy;

/// 发给模型的指令及其声明的输出结构
#[derive(Debug, Clone, PartialEq)]
pub struct PromptSpec {
    pub instruction_text: String,
    /// 输出结构的JSON Schema
    pub output_schema_description: String,
}

/// 按媒体类型构建指令，分类体系和回复语言由外部注入
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    taxonomy: Taxonomy,
    language: TargetLanguage,
}

impl Default for PromptBuilder {
    fn default() -> Self {
        Self::new(Taxonomy::default(), TargetLanguage::default())
    }
}

impl PromptBuilder {
    pub fn new(taxonomy: Taxonomy, language: TargetLanguage) -> Self {
        Self { taxonomy, language }
    }

    pub fn taxonomy(&self) -> &Taxonomy {
        &self.taxonomy
    }

    /// 相同的 (kind, roster) 总是得到相同的指令，名单顺序保持原样
    pub fn build(&self, kind: MediaKind, roster: &[StudentRef]) -> PromptSpec {
        let taxonomy_section = self.format_taxonomy();
        let roster_section = Self::format_roster(roster);
        let output_schema_description = Self::output_schema(kind);
        let language_instruction = self.language.prompt_instruction();

        let instruction_text = match kind {
            MediaKind::Audio => format!(
                include_str!("prompts/audio_instruction.tpl"),
                taxonomy_section, roster_section, output_schema_description, language_instruction
            ),
            MediaKind::Image => format!(
                include_str!("prompts/image_instruction.tpl"),
                taxonomy_section, roster_section, output_schema_description, language_instruction
            ),
            MediaKind::Video => format!(
                include_str!("prompts/video_instruction.tpl"),
                taxonomy_section, roster_section, output_schema_description, language_instruction
            ),
        };

        PromptSpec {
            instruction_text,
            output_schema_description,
        }
    }

    /// 各媒体类型输出结构的JSON Schema，与解析所用的结构体同源
    pub fn output_schema(kind: MediaKind) -> String {
        match kind {
            MediaKind::Audio => schema_text::<AudioPayload>(),
            MediaKind::Image => schema_text::<ImagePayload>(),
            MediaKind::Video => schema_text::<VideoPayload>(),
        }
    }

    fn format_taxonomy(&self) -> String {
        self.taxonomy
            .fields
            .iter()
            .map(|field| format!("- {}: {}", field.code, field.label))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn format_roster(roster: &[StudentRef]) -> String {
        let names: Vec<&str> = roster
            .iter()
            .map(|student| student.display_name.trim())
            .filter(|name| !name.is_empty())
            .collect();
        if names.is_empty() {
            return String::new();
        }

        let mut section = String::from(
            "## Alunos da turma\nUse esta lista como referência para reconhecer os nomes citados:\n",
        );
        for name in names {
            section.push_str(&format!("- {}\n", name));
        }
        section.push('\n');
        section
    }
}

fn schema_text<T: JsonSchema>() -> String {
    serde_json::to_string_pretty(&schema_for!(T)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::taxonomy::TaxonomyField;

    fn roster() -> Vec<StudentRef> {
        vec![
            StudentRef::new("s1", "Ana Beatriz Silva"),
            StudentRef::new("s2", "Pedro Costa"),
        ]
    }

    #[test]
    fn test_every_kind_lists_taxonomy_and_demands_json_only() {
        let builder = PromptBuilder::default();
        for kind in [MediaKind::Audio, MediaKind::Image, MediaKind::Video] {
            let spec = builder.build(kind, &[]);
            for code in ["EI-EO", "EI-CG", "EI-TS", "EI-EF", "EI-ET"] {
                assert!(spec.instruction_text.contains(code), "{} missing {}", kind, code);
            }
            assert!(spec.instruction_text.contains("Responda APENAS com um único objeto JSON"));
            assert!(spec.instruction_text.contains(&spec.output_schema_description));
            assert!(!spec.instruction_text.contains("Alunos da turma"));
        }
    }

    #[test]
    fn test_kind_specific_instructions() {
        let builder = PromptBuilder::default();
        assert!(builder.build(MediaKind::Audio, &[]).instruction_text.contains("Transcreva"));
        assert!(
            builder
                .build(MediaKind::Image, &[])
                .instruction_text
                .contains("quantas pessoas")
        );
        let video = builder.build(MediaKind::Video, &[]).instruction_text;
        assert!(video.contains("Se houver fala"));
    }

    #[test]
    fn test_roster_names_embedded_in_given_order() {
        let spec = PromptBuilder::default().build(MediaKind::Audio, &roster());
        let ana = spec.instruction_text.find("- Ana Beatriz Silva").unwrap();
        let pedro = spec.instruction_text.find("- Pedro Costa").unwrap();
        assert!(ana < pedro);
        assert!(!spec.instruction_text.contains("s1"));
    }

    #[test]
    fn test_build_is_deterministic() {
        let builder = PromptBuilder::default();
        assert_eq!(
            builder.build(MediaKind::Video, &roster()),
            builder.build(MediaKind::Video, &roster())
        );

        let mut reversed = roster();
        reversed.reverse();
        assert_ne!(
            builder.build(MediaKind::Video, &roster()).instruction_text,
            builder.build(MediaKind::Video, &reversed).instruction_text
        );
    }

    #[test]
    fn test_schema_uses_wire_field_names() {
        let audio = PromptBuilder::output_schema(MediaKind::Audio);
        assert!(audio.contains("\"tags_bncc\""));
        assert!(audio.contains("\"transcript\""));
        assert!(audio.contains("\"detected_names\""));

        let image = PromptBuilder::output_schema(MediaKind::Image);
        assert!(image.contains("\"description\""));
        assert!(image.contains("\"people_count\""));
        assert!(!image.contains("\"detected_names\""));
    }

    #[test]
    fn test_injected_taxonomy_replaces_default() {
        let taxonomy = Taxonomy::new(
            "custom",
            vec![TaxonomyField::new("MUS", "Musicalização")],
        );
        let spec = PromptBuilder::new(taxonomy, TargetLanguage::English).build(MediaKind::Image, &[]);
        assert!(spec.instruction_text.contains("- MUS: Musicalização"));
        assert!(!spec.instruction_text.contains("EI-EO"));
        assert!(spec.instruction_text.contains("in English"));
    }
}
