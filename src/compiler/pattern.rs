//! 编译后规则模型
//! PreparedRule 为可序列化的校验结果，CompiledRule 在其上挂载正则

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::template::FieldTemplate;
use crate::rule::model::{Domain, Field};

/// 编译产物格式版本，结构变化时递增以作废旧缓存
pub const ARTIFACT_FORMAT_VERSION: u32 = 1;

/// 已校验的规则（不含正则对象）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparedRule {
    /// 规则在所属域中的声明位置
    pub index: usize,
    pub pattern: String,
    pub case_insensitive: bool,
    /// 捕获分组数量（不含整体匹配 0 号分组）
    pub group_count: usize,
    /// 按字段顺序排列的模板，无模板且无默认的字段不出现
    pub templates: Vec<(Field, FieldTemplate)>,
}

/// 编译后的单条规则
#[derive(Debug, Clone)]
pub struct CompiledRule {
    pub regex: Regex,
    pub prepared: PreparedRule,
}

impl CompiledRule {
    #[inline]
    pub fn index(&self) -> usize {
        self.prepared.index
    }

    #[inline]
    pub fn templates(&self) -> &[(Field, FieldTemplate)] {
        &self.prepared.templates
    }

    pub fn template(&self, field: Field) -> Option<&FieldTemplate> {
        self.prepared
            .templates
            .iter()
            .find(|(f, _)| *f == field)
            .map(|(_, template)| template)
    }

    /// 规则描述（日志输出）
    pub fn describe(&self) -> &str {
        self.regex.as_str()
    }
}

/// 三个有序规则列表，构建后只读
#[derive(Debug, Clone, Default)]
pub struct RuleSet {
    pub(crate) device: Vec<CompiledRule>,
    pub(crate) os: Vec<CompiledRule>,
    pub(crate) user_agent: Vec<CompiledRule>,
    pub(crate) source_hash: Option<u64>,
}

impl RuleSet {
    /// 某个域的规则（声明顺序）
    #[inline]
    pub fn rules(&self, domain: Domain) -> &[CompiledRule] {
        match domain {
            Domain::Device => &self.device,
            Domain::Os => &self.os,
            Domain::UserAgent => &self.user_agent,
        }
    }

    pub fn len(&self) -> usize {
        self.device.len() + self.os.len() + self.user_agent.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 源规则库哈希（版本标识）
    pub fn source_hash(&self) -> Option<u64> {
        self.source_hash
    }

    pub fn with_source_hash(mut self, source_hash: u64) -> Self {
        self.source_hash = Some(source_hash);
        self
    }

    /// 导出可持久化的编译产物
    pub fn to_artifact(&self, source_hash: u64, options_fingerprint: u64) -> RuleSetArtifact {
        let prepared = |rules: &[CompiledRule]| -> Vec<PreparedRule> {
            rules.iter().map(|rule| rule.prepared.clone()).collect()
        };

        RuleSetArtifact {
            format_version: ARTIFACT_FORMAT_VERSION,
            source_hash,
            options_fingerprint,
            device: prepared(&self.device),
            os: prepared(&self.os),
            user_agent: prepared(&self.user_agent),
        }
    }
}

/// 编译产物缓存结构（MessagePack 持久化）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSetArtifact {
    pub format_version: u32,
    pub source_hash: u64,
    pub options_fingerprint: u64,
    pub device: Vec<PreparedRule>,
    pub os: Vec<PreparedRule>,
    pub user_agent: Vec<PreparedRule>,
}

impl RuleSetArtifact {
    /// 产物是否对应当前源规则库与编译选项
    pub fn is_valid_for(&self, source_hash: u64, options_fingerprint: u64) -> bool {
        self.format_version == ARTIFACT_FORMAT_VERSION
            && self.source_hash == source_hash
            && self.options_fingerprint == options_fingerprint
    }

    pub fn rules(&self, domain: Domain) -> &[PreparedRule] {
        match domain {
            Domain::Device => &self.device,
            Domain::Os => &self.os,
            Domain::UserAgent => &self.user_agent,
        }
    }
}
