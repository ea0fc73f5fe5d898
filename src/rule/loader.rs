//! 规则加载管理器
//! 负责读取规则库文件、命中编译产物缓存或重新编译

use std::path::Path;

use super::cache::RuleCacheManager;
use super::model::{Domain, RuleDatabase, RuleFormat};
use crate::compiler::{CompileOptions, RuleCompiler, RuleSet};
use crate::config::ParserConfig;
use crate::error::{UapResult, UaParserError};
use crate::macros::{uap_debug, uap_info, uap_warn};

/// 规则加载管理器
pub struct RuleLoader;

impl RuleLoader {
    /// 加载规则集（优先编译产物缓存，缓存失效则解析源文件重新编译）
    pub async fn load(config: &ParserConfig) -> UapResult<RuleSet> {
        let source = Self::read_source(&config.rules_path).await?;
        Self::load_from_bytes(&source, config).await
    }

    /// 从内存中的规则库内容加载，缓存策略与 `load` 一致
    pub async fn load_from_bytes(source: &[u8], config: &ParserConfig) -> UapResult<RuleSet> {
        let options = config.compile_options();
        let source_hash = RuleCacheManager::source_hash(source);
        let fingerprint = options.fingerprint();

        // 1. 优先加载本地编译产物
        if let Some(cache_path) = &config.cache_path {
            match RuleCacheManager::load_from_cache(cache_path).await {
                Ok(artifact) if artifact.is_valid_for(source_hash, fingerprint) => {
                    match RuleCompiler::from_artifact(artifact, &options) {
                        Ok(rule_set) => {
                            uap_debug!("从本地缓存加载规则集成功：{}", cache_path.display());
                            return Ok(rule_set);
                        }
                        Err(e) => {
                            uap_warn!("本地缓存重建失败，将重新编译：{}", e);
                        }
                    }
                }
                Ok(_) => {
                    uap_debug!("本地缓存与当前规则库或编译选项不一致，将重新编译");
                }
                Err(e) => {
                    uap_debug!("本地缓存不存在或损坏，将重新编译：{}", e);
                }
            }
        }

        // 2. 解析并编译源规则库
        let rule_set = Self::compile_source(source, config.rule_format(), &options)?;

        // 3. 写回缓存（失败不影响加载）
        if let Some(cache_path) = &config.cache_path {
            let artifact = rule_set.to_artifact(source_hash, fingerprint);
            if let Err(e) = RuleCacheManager::save_to_cache(cache_path, &artifact).await {
                uap_warn!("编译产物缓存到本地失败：{}", e);
            } else {
                uap_debug!("编译产物已缓存到本地：{}", cache_path.display());
            }
        }

        if config.verbose {
            uap_info!(
                "规则集加载完成：设备规则{}条，系统规则{}条，浏览器规则{}条",
                rule_set.rules(Domain::Device).len(),
                rule_set.rules(Domain::Os).len(),
                rule_set.rules(Domain::UserAgent).len()
            );
        }

        Ok(rule_set)
    }

    /// 同步加载（不使用缓存）
    pub fn load_blocking(config: &ParserConfig) -> UapResult<RuleSet> {
        let source = std::fs::read(&config.rules_path).map_err(|e| {
            UaParserError::RuleLoadError(format!("{}: {}", config.rules_path.display(), e))
        })?;
        Self::compile_source(&source, config.rule_format(), &config.compile_options())
    }

    /// 解析并编译内存中的规则库
    pub fn compile_source(
        source: &[u8],
        format: RuleFormat,
        options: &CompileOptions,
    ) -> UapResult<RuleSet> {
        let rule_db = RuleDatabase::from_slice(source, format)?;
        uap_debug!(
            "规则库解析成功，设备规则{}条，系统规则{}条，浏览器规则{}条",
            rule_db.device_parsers.len(),
            rule_db.os_parsers.len(),
            rule_db.user_agent_parsers.len()
        );

        let rule_set = RuleCompiler::compile(&rule_db, options)?;
        Ok(rule_set.with_source_hash(RuleCacheManager::source_hash(source)))
    }

    async fn read_source(path: &Path) -> UapResult<Vec<u8>> {
        tokio::fs::read(path)
            .await
            .map_err(|e| UaParserError::RuleLoadError(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigManager;
    use crate::rule::model::{Domain, Field};
    use std::path::PathBuf;

    const RULES: &str = r#"
user_agent_parsers:
  - regex: '(Firefox)/(\d+)\.(\d+)'
"#;

    fn temp_path(name: &str, ext: &str) -> PathBuf {
        std::env::temp_dir().join(format!("rsuaparser-loader-{}-{}.{}", name, std::process::id(), ext))
    }

    #[tokio::test]
    async fn test_load_missing_file() {
        let config = ConfigManager::custom()
            .rules_path(temp_path("missing", "yaml"))
            .build();
        let err = RuleLoader::load(&config).await.unwrap_err();
        assert!(matches!(err, UaParserError::RuleLoadError(_)));
    }

    #[tokio::test]
    async fn test_load_writes_and_uses_cache() {
        let rules_path = temp_path("rules", "yaml");
        let cache_path = temp_path("rules", "mp");
        tokio::fs::write(&rules_path, RULES).await.unwrap();

        let config = ConfigManager::custom()
            .rules_path(&rules_path)
            .cache_path(&cache_path)
            .build();
        let first = RuleLoader::load(&config).await.unwrap();
        assert!(cache_path.exists());
        assert_eq!(first.rules(Domain::UserAgent).len(), 1);

        // 用另一份规则的产物伪装成当前规则库的缓存，验证命中缓存时不重新编译
        let options = config.compile_options();
        let source_hash = RuleCacheManager::source_hash(RULES.as_bytes());
        assert_eq!(first.source_hash(), Some(source_hash));
        let other = RuleLoader::compile_source(
            b"user_agent_parsers:\n  - regex: '(Opera)'\n  - regex: '(Lynx)'\n",
            RuleFormat::Yaml,
            &options,
        )
        .unwrap();
        RuleCacheManager::save_to_cache(&cache_path, &other.to_artifact(source_hash, options.fingerprint()))
            .await
            .unwrap();

        let cached = RuleLoader::load(&config).await.unwrap();
        assert_eq!(cached.rules(Domain::UserAgent).len(), 2);

        // 编译选项变化使缓存失效
        let strict = ConfigManager::custom()
            .rules_path(&rules_path)
            .cache_path(&cache_path)
            .positional_defaults(false)
            .build();
        let recompiled = RuleLoader::load(&strict).await.unwrap();
        let rules = recompiled.rules(Domain::UserAgent);
        assert_eq!(rules.len(), 1);
        assert!(rules[0].template(Field::Family).is_none());

        RuleCacheManager::clear_cache(&cache_path).await.unwrap();
        tokio::fs::remove_file(&rules_path).await.unwrap();
    }

    #[test]
    fn test_load_blocking_json() {
        let rules_path = temp_path("blocking", "json");
        std::fs::write(
            &rules_path,
            r#"{"os_parsers": [{"regex": "(Linux)", "os_replacement": "Linux"}]}"#,
        )
        .unwrap();

        let config = ConfigManager::custom().rules_path(&rules_path).build();
        let rule_set = RuleLoader::load_blocking(&config).unwrap();
        assert_eq!(rule_set.rules(Domain::Os).len(), 1);
        assert!(rule_set.source_hash().is_some());

        std::fs::remove_file(&rules_path).unwrap();
    }

    #[test]
    fn test_invalid_document_is_parse_error() {
        let err = RuleLoader::compile_source(
            b"user_agent_parsers: {not: [a list",
            RuleFormat::Yaml,
            &CompileOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, UaParserError::YamlError(_)));
    }
}
