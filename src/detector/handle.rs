//! 可热替换的解析器句柄
//! 新规则集编译成功后整体发布，进行中的解析调用始终看到同一份规则集

use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};
use arc_swap::ArcSwap;

use super::classifier::Classifier;
use crate::compiler::RuleSet;
use crate::config::ParserConfig;
use crate::error::UapResult;
use crate::macros::{uap_debug, uap_warn};
use crate::rule::RuleLoader;
use crate::rule::model::IdentityRecord;

/// 解析器句柄（无锁读取，原子替换）
#[derive(Debug)]
pub struct ClassifierHandle {
    current: ArcSwap<Classifier>,
    version: AtomicU64,
    // 串行化写入：发布与版本递增成对完成
    writer: Mutex<()>,
}

impl ClassifierHandle {
    pub fn new(classifier: Classifier) -> Self {
        Self {
            current: ArcSwap::from_pointee(classifier),
            version: AtomicU64::new(1),
            writer: Mutex::new(()),
        }
    }

    /// 按配置加载初始规则集
    pub async fn from_config(config: &ParserConfig) -> UapResult<Self> {
        Ok(Self::new(Classifier::from_config(config).await?))
    }

    /// 当前规则集版本（每次替换递增）
    #[inline(always)]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// 当前解析器快照
    pub fn current(&self) -> Arc<Classifier> {
        self.current.load_full()
    }

    /// 使用当前快照解析
    pub fn classify(&self, user_agent: &str) -> IdentityRecord {
        self.current.load().classify(user_agent)
    }

    /// 原子替换规则集
    ///
    /// 并发替换按加锁顺序生效，返回的版本号对应本次发布的规则集。
    pub fn swap(&self, rule_set: RuleSet) -> u64 {
        let classifier = Arc::new(Classifier::from_rule_set(rule_set));
        let _guard = self.writer.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        self.current.store(classifier);
        let version = self.version.fetch_add(1, Ordering::AcqRel) + 1;
        uap_debug!("规则集已替换，当前版本：{}", version);
        version
    }

    /// 重新加载规则库；编译失败时保留旧规则集并返回错误
    pub async fn reload(&self, config: &ParserConfig) -> UapResult<u64> {
        match RuleLoader::load(config).await {
            Ok(rule_set) => Ok(self.swap(rule_set)),
            Err(e) => {
                uap_warn!("规则库重新加载失败，继续使用版本{}：{}", self.version(), e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::{CompileOptions, RuleCompiler};
    use crate::config::ConfigManager;
    use crate::rule::model::RuleDatabase;

    fn rule_set(yaml: &str) -> RuleSet {
        let db = RuleDatabase::from_yaml_str(yaml).unwrap();
        RuleCompiler::compile(&db, &CompileOptions::uap_core()).unwrap()
    }

    #[test]
    fn test_swap_publishes_new_rules() {
        let handle = ClassifierHandle::new(Classifier::from_rule_set(rule_set(
            "user_agent_parsers:\n  - regex: '(Chrome)/(\\d+)'\n",
        )));
        let before = handle.current();
        assert_eq!(handle.classify("Chrome/90").user_agent.family, "Chrome");
        assert_eq!(handle.version(), 1);

        let version = handle.swap(rule_set(
            "user_agent_parsers:\n  - regex: 'Chrome/(\\d+)'\n    family_replacement: 'Chromium'\n",
        ));
        assert_eq!(version, 2);
        assert_eq!(handle.classify("Chrome/90").user_agent.family, "Chromium");

        // 替换前取得的快照不受影响
        assert_eq!(before.parse_user_agent("Chrome/90").family, "Chrome");
    }

    #[test]
    fn test_concurrent_swaps_report_published_version() {
        let handle = Arc::new(ClassifierHandle::new(Classifier::from_rule_set(RuleSet::default())));

        let writers: Vec<_> = (0..8)
            .map(|i| {
                let handle = Arc::clone(&handle);
                std::thread::spawn(move || {
                    let yaml = format!(
                        "user_agent_parsers:\n  - regex: 'Chrome'\n    family_replacement: 'Build{}'\n",
                        i
                    );
                    (handle.swap(rule_set(&yaml)), format!("Build{}", i))
                })
            })
            .collect();

        let mut published: Vec<(u64, String)> =
            writers.into_iter().map(|writer| writer.join().unwrap()).collect();
        published.sort();

        let versions: Vec<u64> = published.iter().map(|(version, _)| *version).collect();
        assert_eq!(versions, (2..=9).collect::<Vec<u64>>());
        assert_eq!(handle.version(), 9);

        // 最大版本号对应当前生效的规则集
        let (_, latest) = published.last().unwrap();
        assert_eq!(&handle.classify("Chrome").user_agent.family, latest);
    }

    #[tokio::test]
    async fn test_failed_reload_keeps_old_rules() {
        let rules_path = std::env::temp_dir().join(format!(
            "rsuaparser-handle-{}.yaml",
            std::process::id()
        ));
        tokio::fs::write(&rules_path, "os_parsers:\n  - regex: '(Linux) (\\d+)'\n    os_v1_replacement: '$3'\n")
            .await
            .unwrap();

        let handle = ClassifierHandle::new(Classifier::from_rule_set(rule_set(
            "os_parsers:\n  - regex: '(Linux)'\n",
        )));
        let config = ConfigManager::custom().rules_path(&rules_path).build();

        let err = handle.reload(&config).await.unwrap_err();
        assert!(err.is_compile_error());
        assert_eq!(handle.version(), 1);
        assert_eq!(handle.classify("Linux 5").os.family, "Linux");

        tokio::fs::write(&rules_path, "os_parsers:\n  - regex: '(Linux) (\\d+)'\n    os_replacement: 'GNU/Linux'\n")
            .await
            .unwrap();
        assert_eq!(handle.reload(&config).await.unwrap(), 2);
        let os = handle.classify("Linux 5").os;
        assert_eq!(os.family, "GNU/Linux");
        assert_eq!(os.major.as_deref(), Some("5"));

        tokio::fs::remove_file(&rules_path).await.unwrap();
    }
}
