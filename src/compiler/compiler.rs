//! 规则编译器核心
//! 将声明式规则编译为有序的正则规则列表，模板引用在此一次性校验

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::time::Instant;
use regex::{Regex, RegexBuilder};

use super::pattern::{CompiledRule, PreparedRule, RuleSet, RuleSetArtifact};
use super::template::FieldTemplate;
use crate::error::{UapResult, UaParserError};
use crate::macros::uap_debug;
use crate::rule::model::{Domain, RuleDatabase, RuleRecord};

/// 编译选项
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct CompileOptions {
    /// 模板缺省时按 uap-core 约定取位置分组
    pub positional_defaults: bool,
    /// 单条正则编译后的体积上限（字节），None 使用 regex 默认值
    pub size_limit: Option<usize>,
}

impl CompileOptions {
    /// uap-core 规则库语义（启用位置默认）
    pub fn uap_core() -> Self {
        Self {
            positional_defaults: true,
            size_limit: None,
        }
    }

    /// 选项指纹，参与编译产物缓存校验
    pub fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// 规则编译器
pub struct RuleCompiler;

impl RuleCompiler {
    /// 编译完整规则库，任一域失败则整体失败
    pub fn compile(rule_db: &RuleDatabase, options: &CompileOptions) -> UapResult<RuleSet> {
        let start = Instant::now();
        let mut stats = CompileStats::default();

        let device = Self::compile_domain_with_stats(
            Domain::Device,
            &rule_db.records(Domain::Device)?,
            options,
            &mut stats,
        )?;
        let os = Self::compile_domain_with_stats(
            Domain::Os,
            &rule_db.records(Domain::Os)?,
            options,
            &mut stats,
        )?;
        let user_agent = Self::compile_domain_with_stats(
            Domain::UserAgent,
            &rule_db.records(Domain::UserAgent)?,
            options,
            &mut stats,
        )?;

        uap_debug!("✅ 规则编译完成，总耗时{:?}", start.elapsed());
        uap_debug!(
            "📊 编译统计：设备规则{}条、系统规则{}条、浏览器规则{}条、显式模板{}个、位置默认{}个",
            stats.device_count,
            stats.os_count,
            stats.user_agent_count,
            stats.explicit_templates,
            stats.positional_templates
        );

        Ok(RuleSet {
            device,
            os,
            user_agent,
            source_hash: None,
        })
    }

    /// 编译单个域的规则列表，输出顺序与声明顺序一致
    pub fn compile_domain(
        domain: Domain,
        records: &[RuleRecord],
        options: &CompileOptions,
    ) -> UapResult<Vec<CompiledRule>> {
        Self::compile_domain_with_stats(domain, records, options, &mut CompileStats::default())
    }

    /// 从编译产物重建规则集：仅重建正则，不再解析模板
    pub fn from_artifact(artifact: RuleSetArtifact, options: &CompileOptions) -> UapResult<RuleSet> {
        let start = Instant::now();
        let RuleSetArtifact {
            source_hash,
            device,
            os,
            user_agent,
            ..
        } = artifact;

        let rule_set = RuleSet {
            device: Self::rebuild_domain(Domain::Device, device, options)?,
            os: Self::rebuild_domain(Domain::Os, os, options)?,
            user_agent: Self::rebuild_domain(Domain::UserAgent, user_agent, options)?,
            source_hash: Some(source_hash),
        };

        uap_debug!("✅ 编译产物重建完成，规则{}条，耗时{:?}", rule_set.len(), start.elapsed());
        Ok(rule_set)
    }

    fn compile_domain_with_stats(
        domain: Domain,
        records: &[RuleRecord],
        options: &CompileOptions,
        stats: &mut CompileStats,
    ) -> UapResult<Vec<CompiledRule>> {
        let mut compiled = Vec::with_capacity(records.len());

        for (index, record) in records.iter().enumerate() {
            let regex = Self::build_regex(
                domain,
                index,
                &record.pattern,
                record.case_insensitive,
                options,
            )?;
            let prepared = Self::prepare_rule(domain, index, record, &regex, options, stats)?;
            compiled.push(CompiledRule { regex, prepared });
        }

        stats.add_rules(domain, compiled.len());
        Ok(compiled)
    }

    fn rebuild_domain(
        domain: Domain,
        prepared_rules: Vec<PreparedRule>,
        options: &CompileOptions,
    ) -> UapResult<Vec<CompiledRule>> {
        prepared_rules
            .into_iter()
            .map(|prepared| {
                let regex = Self::build_regex(
                    domain,
                    prepared.index,
                    &prepared.pattern,
                    prepared.case_insensitive,
                    options,
                )?;
                // 产物与正则分组数不一致说明缓存已损坏
                if regex.captures_len() - 1 != prepared.group_count {
                    return Err(UaParserError::RuleCacheError(format!(
                        "{} rule #{}: cached group count {} does not match pattern",
                        domain, prepared.index, prepared.group_count
                    )));
                }
                for (field, template) in &prepared.templates {
                    if !domain.supports(*field) {
                        return Err(UaParserError::RuleCacheError(format!(
                            "{} rule #{}: cached field `{}` is not produced by this domain",
                            domain, prepared.index, field
                        )));
                    }
                    if let Some(group) = template.max_group().filter(|group| *group > prepared.group_count) {
                        return Err(UaParserError::RuleCacheError(format!(
                            "{} rule #{}: cached template for `{}` references group ${} of {}",
                            domain, prepared.index, field, group, prepared.group_count
                        )));
                    }
                }
                Ok(CompiledRule { regex, prepared })
            })
            .collect()
    }

    /// 校验模板并生成 PreparedRule
    fn prepare_rule(
        domain: Domain,
        index: usize,
        record: &RuleRecord,
        regex: &Regex,
        options: &CompileOptions,
        stats: &mut CompileStats,
    ) -> UapResult<PreparedRule> {
        if let Some(field) = record.templates.keys().find(|field| !domain.supports(**field)) {
            return Err(UaParserError::RuleParseError(format!(
                "{} rule #{}: field `{}` is not produced by this domain",
                domain, index, field
            )));
        }

        let group_count = regex.captures_len() - 1;
        let mut templates = Vec::new();

        for &field in domain.fields() {
            if let Some(raw) = record.template(field) {
                let template = FieldTemplate::parse(raw);
                if let Some(group) = template.max_group().filter(|group| *group > group_count) {
                    return Err(UaParserError::TemplateReference {
                        domain,
                        index,
                        field,
                        group,
                        available: group_count,
                    });
                }
                stats.explicit_templates += 1;
                templates.push((field, template));
            } else if options.positional_defaults {
                if let Some(group) = domain.positional_group(field).filter(|group| *group <= group_count) {
                    stats.positional_templates += 1;
                    templates.push((field, FieldTemplate::Positional(group)));
                }
            }
        }

        Ok(PreparedRule {
            index,
            pattern: record.pattern.clone(),
            case_insensitive: record.case_insensitive,
            group_count,
            templates,
        })
    }

    /// 编译单个正则
    fn build_regex(
        domain: Domain,
        index: usize,
        pattern: &str,
        case_insensitive: bool,
        options: &CompileOptions,
    ) -> UapResult<Regex> {
        let mut builder = RegexBuilder::new(pattern);
        builder.case_insensitive(case_insensitive);
        if let Some(size_limit) = options.size_limit {
            builder.size_limit(size_limit);
        }

        builder.build().map_err(|source| UaParserError::PatternSyntax {
            domain,
            index,
            pattern: pattern.to_string(),
            source,
        })
    }
}

/// 编译统计信息
#[derive(Debug, Clone, Default)]
struct CompileStats {
    device_count: usize,
    os_count: usize,
    user_agent_count: usize,
    explicit_templates: usize,
    positional_templates: usize,
}

impl CompileStats {
    fn add_rules(&mut self, domain: Domain, count: usize) {
        match domain {
            Domain::Device => self.device_count += count,
            Domain::Os => self.os_count += count,
            Domain::UserAgent => self.user_agent_count += count,
        }
    }
}
