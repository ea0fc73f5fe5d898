//! 字段解析工具
//! 将命中规则的模板与捕获分组组合为最终字段值

use std::collections::BTreeMap;
use regex::Captures;

use crate::compiler::{CompiledRule, FieldTemplate, Fragment};
use crate::rule::model::Field;

/// 字段 -> 解析值；缺失即字段不存在（区别于存在的空串）
pub type ResolvedFields = BTreeMap<Field, String>;

/// 字段解析工具
pub struct FieldResolver;

impl FieldResolver {
    /// 解析命中规则的全部字段
    ///
    /// # 参数
    /// - `rule`: 命中的编译后规则（模板已在编译期校验）
    /// - `captures`: 该规则的捕获结果，0 号为整体匹配
    ///
    /// # 返回值
    /// 仅包含有值的字段。编译期已拒绝悬空引用，因此解析不会失败。
    pub fn resolve(rule: &CompiledRule, captures: &Captures<'_>) -> ResolvedFields {
        rule.templates()
            .iter()
            .filter_map(|(field, template)| {
                Self::resolve_template(template, captures).map(|value| (*field, value))
            })
            .collect()
    }

    /// 解析单个模板
    pub fn resolve_template(template: &FieldTemplate, captures: &Captures<'_>) -> Option<String> {
        match template {
            FieldTemplate::Format(fragments) => {
                let mut value = String::new();
                for fragment in fragments {
                    match fragment {
                        Fragment::Literal(text) => value.push_str(text),
                        // 分组未参与匹配时替换为空串
                        Fragment::Group(group) => {
                            value.push_str(captures.get(*group).map_or("", |m| m.as_str()))
                        }
                    }
                }
                Some(value)
            }
            FieldTemplate::Positional(group) => captures
                .get(*group)
                .map(|m| m.as_str())
                .filter(|text| !text.is_empty())
                .map(str::to_string),
        }
    }
}

// 单元测试
#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileOptions, RuleCompiler};
    use crate::rule::model::{Domain, RuleRecord};
    use regex::Regex;

    #[test]
    fn test_resolve_group_placeholders() {
        let regex = Regex::new(r"Chrome/(\d+)\.(\d+)").unwrap();
        let captures = regex.captures("Mozilla/5.0 Chrome/90.5").unwrap();

        let major = FieldTemplate::parse("$1");
        let version = FieldTemplate::parse("v$1-$2");
        assert_eq!(FieldResolver::resolve_template(&major, &captures), Some("90".to_string()));
        assert_eq!(FieldResolver::resolve_template(&version, &captures), Some("v90-5".to_string()));
    }

    #[test]
    fn test_resolve_whole_match_placeholder() {
        let regex = Regex::new(r"Nexus \d+").unwrap();
        let captures = regex.captures("Android; Nexus 5 Build").unwrap();
        let template = FieldTemplate::parse("[$0]");
        assert_eq!(
            FieldResolver::resolve_template(&template, &captures),
            Some("[Nexus 5]".to_string())
        );
    }

    #[test]
    fn test_resolve_non_participating_group_is_empty() {
        // 可选分组未参与匹配：显式模板得到空串而不是缺失
        let regex = Regex::new(r"Mobile(?: (\w+))?").unwrap();
        let captures = regex.captures("Mobile").unwrap();
        let template = FieldTemplate::parse("Mobile $1");
        assert_eq!(
            FieldResolver::resolve_template(&template, &captures),
            Some("Mobile ".to_string())
        );
    }

    #[test]
    fn test_resolve_literal_ignores_captures() {
        let regex = Regex::new(r"(Googlebot)/(\d+)").unwrap();
        let captures = regex.captures("Googlebot/2.1").unwrap();
        let template = FieldTemplate::parse("Spider");
        assert_eq!(FieldResolver::resolve_template(&template, &captures), Some("Spider".to_string()));
    }

    #[test]
    fn test_resolve_positional_default_absent_when_empty() {
        let regex = Regex::new(r"(Opera)(?:/(\d*))?").unwrap();

        let captures = regex.captures("Opera").unwrap();
        assert_eq!(FieldResolver::resolve_template(&FieldTemplate::Positional(2), &captures), None);

        let captures = regex.captures("Opera/").unwrap();
        assert_eq!(FieldResolver::resolve_template(&FieldTemplate::Positional(2), &captures), None);

        let captures = regex.captures("Opera/12").unwrap();
        assert_eq!(
            FieldResolver::resolve_template(&FieldTemplate::Positional(2), &captures),
            Some("12".to_string())
        );
    }

    #[test]
    fn test_resolve_rule_skips_fields_without_template() {
        let records = vec![
            RuleRecord::new(r"Chrome/(\d+)\.(\d+)")
                .with_template(Field::Family, "Chrome")
                .with_template(Field::Major, "$1")
                .with_template(Field::Minor, "$2"),
        ];
        let compiled =
            RuleCompiler::compile_domain(Domain::UserAgent, &records, &CompileOptions::default())
                .unwrap();
        let rule = &compiled[0];
        let captures = rule.regex.captures("Mozilla/5.0 Chrome/90.5").unwrap();

        let fields = FieldResolver::resolve(rule, &captures);
        assert_eq!(fields.get(&Field::Family).map(String::as_str), Some("Chrome"));
        assert_eq!(fields.get(&Field::Major).map(String::as_str), Some("90"));
        assert_eq!(fields.get(&Field::Minor).map(String::as_str), Some("5"));
        assert!(!fields.contains_key(&Field::Patch));
    }
}
