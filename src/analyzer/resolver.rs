//! 把模型检测到的人名匹配到名单中的学生
//!
//! 匹配规则（名单顺序扫描，第一个满足的条目胜出，不做打分）：
//! 1. 检测名 == 名字
//! 2. 全名包含检测名
//! 3. 检测名包含名字
//!
//! 两名学生同名时总是取名单中靠前的一位，这是已知的精度取舍。

use tracing::debug;

use crate::analyzer::normalizer::normalize;
use crate::types::roster::StudentRef;

/// 预先规范化的名单条目
struct NormalizedStudent<'a> {
    id: &'a str,
    first_name: String,
    full_name: String,
}

impl<'a> NormalizedStudent<'a> {
    fn new(student: &'a StudentRef) -> Self {
        Self {
            id: &student.id,
            first_name: normalize(student.first_name()),
            full_name: normalize(&student.display_name),
        }
    }

    fn matches(&self, detected: &str) -> bool {
        detected == self.first_name
            || self.full_name.contains(detected)
            || detected.contains(&self.first_name)
    }
}

/// 返回去重后的学生标识，顺序与检测名的匹配顺序一致，且全部来自名单
pub fn resolve(detected_names: &[String], roster: &[StudentRef]) -> Vec<String> {
    if detected_names.is_empty() || roster.is_empty() {
        return vec![];
    }

    // 空名字会被任何字符串包含，这样的条目不参与匹配
    let candidates: Vec<NormalizedStudent> = roster
        .iter()
        .map(NormalizedStudent::new)
        .filter(|student| !student.first_name.is_empty())
        .collect();

    let mut resolved: Vec<String> = Vec::new();
    for name in detected_names {
        let detected = normalize(name);
        if detected.is_empty() {
            continue;
        }

        match candidates.iter().find(|student| student.matches(&detected)) {
            Some(student) => {
                debug!(detected = %name, student_id = student.id, "name resolved");
                if !resolved.iter().any(|id| id == student.id) {
                    resolved.push(student.id.to_string());
                }
            }
            None => debug!(detected = %name, "name not found in roster"),
        }
    }

    resolved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn roster() -> Vec<StudentRef> {
        vec![
            StudentRef::new("s1", "Ana Beatriz Silva"),
            StudentRef::new("s2", "Pedro Costa"),
        ]
    }

    #[test]
    fn test_first_name_and_substring_rules() {
        assert_eq!(
            resolve(&names(&["Ana", "Pedro Henrique"]), &roster()),
            names(&["s1", "s2"])
        );
    }

    #[test]
    fn test_unknown_name_is_dropped() {
        let roster = vec![StudentRef::new("s1", "João")];
        assert!(resolve(&names(&["Maria"]), &roster).is_empty());
    }

    #[test]
    fn test_empty_inputs() {
        assert!(resolve(&[], &roster()).is_empty());
        assert!(resolve(&names(&["Ana"]), &[]).is_empty());
    }

    #[test]
    fn test_duplicates_collapse_to_one_id() {
        assert_eq!(
            resolve(&names(&["Ana", "ana beatriz", "ANA", "Silva"]), &roster()),
            names(&["s1"])
        );
    }

    #[test]
    fn test_result_order_follows_detected_names() {
        assert_eq!(
            resolve(&names(&["Pedro", "Ana"]), &roster()),
            names(&["s2", "s1"])
        );
    }

    #[test]
    fn test_accents_and_case_ignored() {
        let roster = vec![StudentRef::new("j", "João Miguel")];
        assert_eq!(resolve(&names(&["JOAO"]), &roster), names(&["j"]));
        assert_eq!(resolve(&names(&["  joão  "]), &roster), names(&["j"]));
    }

    #[test]
    fn test_first_roster_entry_wins_on_ties() {
        let roster = vec![
            StudentRef::new("a1", "Lucas Souza"),
            StudentRef::new("a2", "Lucas Almeida"),
        ];
        assert_eq!(resolve(&names(&["Lucas Almeida"]), &roster), names(&["a1"]));
    }

    #[test]
    fn test_full_name_contains_partial_detected_name() {
        let roster = vec![StudentRef::new("s9", "Maria Clara Dias")];
        assert_eq!(resolve(&names(&["Clara"]), &roster), names(&["s9"]));
    }

    #[test]
    fn test_blank_names_never_match() {
        let roster = vec![StudentRef::new("blank", "   "), StudentRef::new("s1", "Ana")];
        assert_eq!(resolve(&names(&["", "  ", "Ana"]), &roster), names(&["s1"]));
        assert!(resolve(&names(&["Zé"]), &roster).is_empty());
    }

    #[test]
    fn test_result_is_subset_of_roster_ids() {
        let roster = roster();
        let detected = names(&["Ana", "Bia", "Pedro", "Costa", "Xavier", "a"]);
        let ids: Vec<&str> = roster.iter().map(|s| s.id.as_str()).collect();
        for id in resolve(&detected, &roster) {
            assert!(ids.contains(&id.as_str()));
        }
    }
}
