//! 规则匹配器：按声明顺序扫描，首个命中即返回
use regex::Captures;

use crate::compiler::CompiledRule;
use crate::macros::uap_trace;

/// 单次命中结果（仅在一次解析调用内存活）
#[derive(Debug)]
pub struct MatchResult<'r, 'h> {
    pub rule: &'r CompiledRule,
    pub captures: Captures<'h>,
}

impl<'r, 'h> MatchResult<'r, 'h> {
    /// 第 N 个捕获分组（0 为整体匹配），未参与匹配时为 None
    pub fn group(&self, index: usize) -> Option<&'h str> {
        self.captures.get(index).map(|m| m.as_str())
    }
}

/// 规则匹配器
pub struct Matcher;

impl Matcher {
    /// 在有序规则列表中查找首个命中的规则
    ///
    /// 返回 None 表示该域无规则命中（不是错误）。后续规则不再尝试。
    pub fn first_match<'r, 'h>(rules: &'r [CompiledRule], input: &'h str) -> Option<MatchResult<'r, 'h>> {
        for rule in rules {
            // 先做廉价的 is_match，命中后才分配捕获结果
            if !rule.regex.is_match(input) {
                continue;
            }
            let Some(captures) = rule.regex.captures(input) else {
                continue;
            };

            uap_trace!("规则命中：序号={}，规则={}", rule.index(), rule.describe());
            return Some(MatchResult { rule, captures });
        }

        None
    }
}
