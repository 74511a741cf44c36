use serde::{Deserialize, Serialize};

/// 分类体系中的一个领域
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaxonomyField {
    /// 固定的短代码，如 `EI-EO`
    pub code: String,
    pub label: String,
}

impl TaxonomyField {
    pub fn new(code: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            label: label.into(),
        }
    }
}

/// BNCC 幼儿教育的五个经验领域（Campos de Experiência）
pub const BNCC_EARLY_CHILDHOOD: [(&str, &str); 5] = [
    ("EI-EO", "O eu, o outro e o nós"),
    ("EI-CG", "Corpo, gestos e movimentos"),
    ("EI-TS", "Traços, sons, cores e formas"),
    ("EI-EF", "Escuta, fala, pensamento e imaginação"),
    ("EI-ET", "Espaços, tempos, quantidades, relações e transformações"),
];

pub const BNCC_TAXONOMY_VERSION: &str = "bncc-ei-2018";

/// 可注入、带版本的分类体系
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Taxonomy {
    pub version: String,
    pub fields: Vec<TaxonomyField>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::bncc_early_childhood()
    }
}

impl Taxonomy {
    pub fn new(version: impl Into<String>, fields: Vec<TaxonomyField>) -> Self {
        Self {
            version: version.into(),
            fields,
        }
    }

    /// 内置的BNCC幼儿教育分类
    pub fn bncc_early_childhood() -> Self {
        Self {
            version: BNCC_TAXONOMY_VERSION.to_string(),
            fields: BNCC_EARLY_CHILDHOOD
                .iter()
                .map(|(code, label)| TaxonomyField::new(*code, *label))
                .collect(),
        }
    }

    pub fn lookup(&self, code: &str) -> Option<&TaxonomyField> {
        let code = code.trim();
        self.fields
            .iter()
            .find(|field| field.code.eq_ignore_ascii_case(code))
    }

    pub fn contains(&self, code: &str) -> bool {
        self.lookup(code).is_some()
    }

    pub fn codes(&self) -> Vec<&str> {
        self.fields.iter().map(|field| field.code.as_str()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}
