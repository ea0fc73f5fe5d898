//! 解析器门面：三个检测域独立匹配，组装最终结果
use std::sync::Arc;

use super::matcher::Matcher;
use crate::compiler::{CompileOptions, RuleCompiler, RuleSet};
use crate::config::ParserConfig;
use crate::error::{UapResult, UaParserError};
use crate::rule::RuleLoader;
use crate::rule::model::{
    Device, Domain, FALLBACK_FAMILY, Field, IdentityRecord, OperatingSystem, RuleDatabase,
    UserAgent,
};
use crate::utils::{FieldResolver, ResolvedFields};

/// User-Agent 解析器
///
/// 持有只读规则集，可在多线程间共享（`Clone` 仅增加引用计数）。
#[derive(Debug, Clone)]
pub struct Classifier {
    rule_set: Arc<RuleSet>,
}

impl Classifier {
    pub fn new(rule_set: Arc<RuleSet>) -> Self {
        Self { rule_set }
    }

    pub fn from_rule_set(rule_set: RuleSet) -> Self {
        Self::new(Arc::new(rule_set))
    }

    /// 从 YAML 规则库构建
    pub fn from_yaml_str(source: &str, options: &CompileOptions) -> UapResult<Self> {
        let rule_db = RuleDatabase::from_yaml_str(source)?;
        Ok(Self::from_rule_set(RuleCompiler::compile(&rule_db, options)?))
    }

    /// 从 JSON 规则库构建
    pub fn from_json_str(source: &str, options: &CompileOptions) -> UapResult<Self> {
        let rule_db = RuleDatabase::from_json_str(source)?;
        Ok(Self::from_rule_set(RuleCompiler::compile(&rule_db, options)?))
    }

    /// 按配置加载（支持编译产物缓存）
    pub async fn from_config(config: &ParserConfig) -> UapResult<Self> {
        Ok(Self::from_rule_set(RuleLoader::load(config).await?))
    }

    pub fn rule_set(&self) -> &Arc<RuleSet> {
        &self.rule_set
    }

    /// 完整解析，任何字符串输入都返回三个域齐全的结果
    pub fn classify(&self, user_agent: &str) -> IdentityRecord {
        IdentityRecord {
            string: user_agent.to_string(),
            user_agent: self.parse_user_agent(user_agent),
            os: self.parse_os(user_agent),
            device: self.parse_device(user_agent),
        }
    }

    /// 原始字节输入，非 UTF-8 在匹配前拒绝
    pub fn try_classify_bytes(&self, user_agent: &[u8]) -> UapResult<IdentityRecord> {
        let user_agent = std::str::from_utf8(user_agent).map_err(|e| {
            UaParserError::InvalidInput(format!("user agent is not valid UTF-8: {}", e))
        })?;
        Ok(self.classify(user_agent))
    }

    /// 仅解析浏览器
    pub fn parse_user_agent(&self, user_agent: &str) -> UserAgent {
        let Some(mut fields) = self.resolve_domain(Domain::UserAgent, user_agent) else {
            return UserAgent::default();
        };
        UserAgent {
            family: take_family(&mut fields),
            major: fields.remove(&Field::Major),
            minor: fields.remove(&Field::Minor),
            patch: fields.remove(&Field::Patch),
        }
    }

    /// 仅解析操作系统
    pub fn parse_os(&self, user_agent: &str) -> OperatingSystem {
        let Some(mut fields) = self.resolve_domain(Domain::Os, user_agent) else {
            return OperatingSystem::default();
        };
        OperatingSystem {
            family: take_family(&mut fields),
            major: fields.remove(&Field::Major),
            minor: fields.remove(&Field::Minor),
            patch: fields.remove(&Field::Patch),
            patch_minor: fields.remove(&Field::PatchMinor),
        }
    }

    /// 仅解析设备
    pub fn parse_device(&self, user_agent: &str) -> Device {
        let Some(mut fields) = self.resolve_domain(Domain::Device, user_agent) else {
            return Device::default();
        };
        Device {
            family: take_family(&mut fields),
            brand: fields.remove(&Field::Brand),
            model: fields.remove(&Field::Model),
        }
    }

    /// 单个域：首个命中规则的字段，无命中返回 None
    fn resolve_domain(&self, domain: Domain, user_agent: &str) -> Option<ResolvedFields> {
        let hit = Matcher::first_match(self.rule_set.rules(domain), user_agent)?;
        Some(FieldResolver::resolve(hit.rule, &hit.captures))
    }
}

// 命中规则未产出家族时使用兜底值
fn take_family(fields: &mut ResolvedFields) -> String {
    fields
        .remove(&Field::Family)
        .unwrap_or_else(|| FALLBACK_FAMILY.to_string())
}
