//! 规则缓存管理
//! 仅处理编译产物的本地序列化（MessagePack）和反序列化

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::path::Path;
use rmp_serde::{Serializer, from_slice};
use serde::Serialize;

use crate::compiler::RuleSetArtifact;
use crate::error::{UapResult, UaParserError};
use crate::macros::uap_debug;

/// 规则缓存管理器
pub struct RuleCacheManager;

impl RuleCacheManager {
    /// 源规则库内容哈希（缓存键）
    pub fn source_hash(source: &[u8]) -> u64 {
        let mut hasher = DefaultHasher::new();
        source.hash(&mut hasher);
        hasher.finish()
    }

    /// 从本地缓存加载编译产物
    pub async fn load_from_cache(cache_path: &Path) -> UapResult<RuleSetArtifact> {
        let cache_data = tokio::fs::read(cache_path).await?;

        // MessagePack反序列化
        let artifact: RuleSetArtifact = from_slice(&cache_data)
            .map_err(|e| UaParserError::RuleCacheError(format!("deserialize failed: {}", e)))?;

        uap_debug!(
            "缓存文件反序列化成功，设备规则{}条，系统规则{}条，浏览器规则{}条",
            artifact.device.len(),
            artifact.os.len(),
            artifact.user_agent.len()
        );

        Ok(artifact)
    }

    /// 将编译产物缓存到本地
    pub async fn save_to_cache(cache_path: &Path, artifact: &RuleSetArtifact) -> UapResult<()> {
        let mut cache_data = Vec::new();

        // MessagePack序列化
        artifact
            .serialize(&mut Serializer::new(&mut cache_data))
            .map_err(|e| UaParserError::RuleCacheError(format!("serialize failed: {}", e)))?;

        uap_debug!("编译产物序列化成功，序列化后数据大小：{} 字节", cache_data.len());

        if let Some(parent) = cache_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(cache_path, cache_data).await?;
        Ok(())
    }

    /// 清除本地缓存
    pub async fn clear_cache(cache_path: &Path) -> UapResult<()> {
        if tokio::fs::try_exists(cache_path).await? {
            tokio::fs::remove_file(cache_path).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileOptions, RuleCompiler};
    use crate::rule::model::RuleDatabase;

    fn temp_cache_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("rsuaparser-{}-{}.mp", name, std::process::id()))
    }

    #[test]
    fn test_source_hash_changes_with_content() {
        let a = RuleCacheManager::source_hash(b"user_agent_parsers: []");
        let b = RuleCacheManager::source_hash(b"user_agent_parsers: [] ");
        assert_eq!(a, RuleCacheManager::source_hash(b"user_agent_parsers: []"));
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn test_save_load_clear() {
        let db = RuleDatabase::from_yaml_str(
            "os_parsers:\n  - regex: '(Windows) NT (\\d+)\\.(\\d+)'\n",
        )
        .unwrap();
        let options = CompileOptions::uap_core();
        let artifact = RuleCompiler::compile(&db, &options)
            .unwrap()
            .to_artifact(7, options.fingerprint());

        let path = temp_cache_path("save-load");
        RuleCacheManager::save_to_cache(&path, &artifact).await.unwrap();

        let loaded = RuleCacheManager::load_from_cache(&path).await.unwrap();
        assert_eq!(loaded, artifact);

        RuleCacheManager::clear_cache(&path).await.unwrap();
        assert!(!path.exists());
        // 重复清除不报错
        RuleCacheManager::clear_cache(&path).await.unwrap();
    }

    #[tokio::test]
    async fn test_corrupted_cache_is_error() {
        let path = temp_cache_path("corrupted");
        tokio::fs::write(&path, b"not msgpack").await.unwrap();

        let err = RuleCacheManager::load_from_cache(&path).await.unwrap_err();
        assert!(matches!(err, UaParserError::RuleCacheError(_)));

        RuleCacheManager::clear_cache(&path).await.unwrap();
    }
}
