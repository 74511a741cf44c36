use serde::{Deserialize, Serialize};

/// 班级名单中的一名学生，由调用方按请求提供
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StudentRef {
    /// 学生记录的标识，对本系统不透明
    pub id: String,
    /// 展示用的完整姓名
    #[serde(alias = "name", alias = "nome")]
    pub display_name: String,
}

impl StudentRef {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
        }
    }

    /// 第一个空白分隔的词，即名字
    pub fn first_name(&self) -> &str {
        self.display_name.split_whitespace().next().unwrap_or_default()
    }
}
