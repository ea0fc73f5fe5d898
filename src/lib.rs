//! rsuaparser - 基于 uap-core 规则库的 User-Agent 解析引擎
//!
//! 规则库（设备 / 操作系统 / 浏览器三个有序列表）编译为只读的 [`RuleSet`]，
//! 每个域按声明顺序匹配，首个命中的规则通过字段模板产出结果。
//!
//! ```no_run
//! use rsuaparser::{Classifier, CompileOptions};
//!
//! let rules = std::fs::read_to_string("regexes.yaml")?;
//! let classifier = Classifier::from_yaml_str(&rules, &CompileOptions::uap_core())?;
//! let record = classifier.classify("Mozilla/5.0 (Windows NT 10.0; Win64; x64) Chrome/120.0.0.0");
//! println!("{} / {} / {}", record.user_agent, record.os, record.device);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod macros;

// 导出全局错误类型
pub use self::error::{UaParserError, UapResult};

// 导出配置模块
pub use self::config::{ConfigManager, CustomConfigBuilder, ParserConfig};

// 导出规则模块核心接口
pub use self::rule::{
    Device, Domain, Field, IdentityRecord, OperatingSystem, RuleCacheManager, RuleDatabase,
    RuleFormat, RuleLoader, RuleRecord, UserAgent, FALLBACK_FAMILY,
};

// 导出编译模块核心接口
pub use self::compiler::{
    CompileOptions, CompiledRule, FieldTemplate, Fragment, RuleCompiler, RuleSet, RuleSetArtifact,
};

// 导出工具模块核心接口
pub use self::utils::{FieldResolver, ResolvedFields};

// 导出检测模块核心接口
pub use self::detector::{Classifier, ClassifierHandle, MatchResult, Matcher};

// 声明所有子模块
pub mod config;
pub mod error;
pub mod rule;
pub mod utils;
pub mod compiler;
pub mod detector;
