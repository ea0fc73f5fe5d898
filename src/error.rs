//! 全局错误类型定义

use thiserror::Error;
use regex::Error as RegexError;
use serde_json::Error as SerdeJsonError;
use serde_yaml::Error as SerdeYamlError;
use std::io::Error as IoError;

use crate::rule::model::{Domain, Field};

#[derive(Error, Debug)]
pub enum UaParserError {
    // 编译相关错误
    /// 规则正则语法错误（整个域的规则集构建失败）
    #[error("Pattern syntax error in {domain} rule #{index} `{pattern}`: {source}")]
    PatternSyntax {
        domain: Domain,
        index: usize,
        pattern: String,
        #[source]
        source: RegexError,
    },
    /// 模板引用了正则中不存在的捕获分组
    #[error("Template reference error in {domain} rule #{index}: field `{field}` references group ${group}, but the pattern only has {available} group(s)")]
    TemplateReference {
        domain: Domain,
        index: usize,
        field: Field,
        group: usize,
        available: usize,
    },

    // 规则相关错误
    #[error("Rule parse failed: {0}")]
    RuleParseError(String),
    #[error("Rule load failed: {0}")]
    RuleLoadError(String),
    #[error("Rule cache operation failed: {0}")]
    RuleCacheError(String),

    // 检测相关错误
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    // 序列化/反序列化错误
    #[error("JSON parse failed: {0}")]
    JsonError(#[from] SerdeJsonError),
    #[error("YAML parse failed: {0}")]
    YamlError(#[from] SerdeYamlError),

    // 基础错误
    #[error("IO operation failed: {0}")]
    IoError(#[from] IoError),
}

impl UaParserError {
    /// 是否为编译期错误（正则语法 / 模板引用）
    pub fn is_compile_error(&self) -> bool {
        matches!(
            self,
            UaParserError::PatternSyntax { .. } | UaParserError::TemplateReference { .. }
        )
    }
}

// 全局Result类型
pub type UapResult<T> = Result<T, UaParserError>;
