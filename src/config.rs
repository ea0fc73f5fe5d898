//! 全局配置管理,存储所有可配置项

use std::path::PathBuf;

use crate::compiler::CompileOptions;
use crate::rule::model::RuleFormat;

/// 全局配置
#[derive(Debug, Clone)]
pub struct ParserConfig {
    // 规则库文件路径（uap-core regexes.yaml 或等价 JSON）
    pub rules_path: PathBuf,
    // 规则库编码，None 时按扩展名推断
    pub format: Option<RuleFormat>,
    // 编译产物缓存路径，None 时不缓存
    pub cache_path: Option<PathBuf>,
    // 模板缺省时是否按 uap-core 约定取位置分组
    pub positional_defaults: bool,
    // 单条正则编译体积上限（字节）
    pub size_limit: Option<usize>,
    // 是否启用详细日志
    pub verbose: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            rules_path: PathBuf::from("regexes.yaml"),
            format: None,
            cache_path: None,
            positional_defaults: true,
            size_limit: None,
            verbose: false,
        }
    }
}

impl ParserConfig {
    /// 编译选项
    pub fn compile_options(&self) -> CompileOptions {
        CompileOptions {
            positional_defaults: self.positional_defaults,
            size_limit: self.size_limit,
        }
    }

    /// 实际使用的规则库编码
    pub fn rule_format(&self) -> RuleFormat {
        self.format
            .unwrap_or_else(|| RuleFormat::from_path(&self.rules_path))
    }
}

/// 配置管理器
pub struct ConfigManager;

impl ConfigManager {
    /// 获取默认配置
    pub fn get_default() -> ParserConfig {
        ParserConfig::default()
    }

    /// 自定义配置
    pub fn custom() -> CustomConfigBuilder {
        CustomConfigBuilder::new()
    }
}

/// 配置构建器（便于自定义配置）
#[derive(Debug, Clone, Default)]
pub struct CustomConfigBuilder {
    config: ParserConfig,
}

impl CustomConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: ParserConfig::default(),
        }
    }

    pub fn rules_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.rules_path = path.into();
        self
    }

    pub fn format(mut self, format: RuleFormat) -> Self {
        self.config.format = Some(format);
        self
    }

    pub fn cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.cache_path = Some(path.into());
        self
    }

    pub fn positional_defaults(mut self, enabled: bool) -> Self {
        self.config.positional_defaults = enabled;
        self
    }

    pub fn size_limit(mut self, bytes: usize) -> Self {
        self.config.size_limit = Some(bytes);
        self
    }

    pub fn verbose(mut self, verbose: bool) -> Self {
        self.config.verbose = verbose;
        self
    }

    pub fn build(self) -> ParserConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let config = ConfigManager::custom()
            .rules_path("rules/regexes.json")
            .cache_path("/tmp/uap.mp")
            .positional_defaults(false)
            .size_limit(1 << 20)
            .build();

        assert_eq!(config.rule_format(), RuleFormat::Json);
        assert_eq!(config.cache_path, Some(PathBuf::from("/tmp/uap.mp")));
        assert_eq!(
            config.compile_options(),
            CompileOptions {
                positional_defaults: false,
                size_limit: Some(1 << 20),
            }
        );
    }

    #[test]
    fn test_default_targets_uap_core() {
        let config = ConfigManager::get_default();
        assert_eq!(config.rule_format(), RuleFormat::Yaml);
        assert_eq!(config.compile_options(), CompileOptions::uap_core());
        assert!(config.cache_path.is_none());
    }
}
