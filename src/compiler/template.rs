//! 字段模板：字面量与分组引用的有序片段
//! 编译期解析并校验，运行期只做拼接

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// `$N` 分组占位符（N 为单个数字，`$0` 为整体匹配）
static PLACEHOLDER_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"\$([0-9])").unwrap());

/// 模板片段
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Fragment {
    Literal(String),
    Group(usize),
}

/// 编译后的字段模板
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldTemplate {
    /// 显式模板：未参与匹配的分组替换为空串
    Format(Vec<Fragment>),
    /// 位置默认：直接取第 N 个分组，未参与或为空时字段缺失
    Positional(usize),
}

impl FieldTemplate {
    /// 解析显式模板
    pub fn parse(template: &str) -> Self {
        let mut fragments = Vec::new();
        let mut last = 0;

        for caps in PLACEHOLDER_REGEX.captures_iter(template) {
            let (Some(whole), Some(digit)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            if whole.start() > last {
                fragments.push(Fragment::Literal(template[last..whole.start()].to_string()));
            }
            // 单个 ASCII 数字，必然可解析
            let group = usize::from(digit.as_str().as_bytes()[0] - b'0');
            fragments.push(Fragment::Group(group));
            last = whole.end();
        }

        if last < template.len() {
            fragments.push(Fragment::Literal(template[last..].to_string()));
        }

        FieldTemplate::Format(fragments)
    }

    /// 模板引用的最大分组序号
    pub fn max_group(&self) -> Option<usize> {
        match self {
            FieldTemplate::Format(fragments) => fragments
                .iter()
                .filter_map(|fragment| match fragment {
                    Fragment::Group(group) => Some(*group),
                    Fragment::Literal(_) => None,
                })
                .max(),
            FieldTemplate::Positional(group) => Some(*group),
        }
    }

    /// 不含任何分组引用（硬编码覆盖值）
    pub fn is_literal(&self) -> bool {
        self.max_group().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_mixed_template() {
        let template = FieldTemplate::parse("Mobile $1 ($2)");
        assert_eq!(
            template,
            FieldTemplate::Format(vec![
                Fragment::Literal("Mobile ".to_string()),
                Fragment::Group(1),
                Fragment::Literal(" (".to_string()),
                Fragment::Group(2),
                Fragment::Literal(")".to_string()),
            ])
        );
        assert_eq!(template.max_group(), Some(2));
        assert!(!template.is_literal());
    }

    #[test]
    fn test_parse_literal_and_bare_dollar() {
        let template = FieldTemplate::parse("Cost $ five");
        assert_eq!(
            template,
            FieldTemplate::Format(vec![Fragment::Literal("Cost $ five".to_string())])
        );
        assert!(template.is_literal());
    }

    #[test]
    fn test_parse_adjacent_placeholders() {
        // `$12` 是分组 1 后跟字面量 "2"
        let template = FieldTemplate::parse("$0$12");
        assert_eq!(
            template,
            FieldTemplate::Format(vec![
                Fragment::Group(0),
                Fragment::Group(1),
                Fragment::Literal("2".to_string()),
            ])
        );
    }

    #[test]
    fn test_parse_non_ascii_digit_is_literal() {
        // 仅 ASCII 数字构成占位符
        let template = FieldTemplate::parse("v$\u{0663}");
        assert_eq!(
            template,
            FieldTemplate::Format(vec![Fragment::Literal("v$\u{0663}".to_string())])
        );
        assert!(template.is_literal());
    }

    #[test]
    fn test_parse_empty_template() {
        let template = FieldTemplate::parse("");
        assert_eq!(template, FieldTemplate::Format(Vec::new()));
        assert_eq!(template.max_group(), None);
    }
}
