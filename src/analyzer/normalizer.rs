use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// 姓名规范化：小写 -> NFD分解 -> 去掉组合附加符号 -> 去掉首尾空白并合并内部连续空白
///
/// 纯函数，不会失败；对自身输出再次调用结果不变。
pub fn normalize(name: &str) -> String {
    let folded: String = name
        .to_lowercase()
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .collect();
    folded.split_whitespace().collect::<Vec<_>>().join(" ")
}
