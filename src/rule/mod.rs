//! 规则模块：负责规则库的数据模型、加载与编译产物缓存
pub mod model;
pub mod cache;
pub mod loader;

// 导出核心接口
pub use self::model::{
    Device, DeviceRuleDef, Domain, Field, IdentityRecord, OperatingSystem, OsRuleDef, RuleDatabase,
    RuleFormat, RuleRecord, UserAgent, UserAgentRuleDef, FALLBACK_FAMILY,
};
pub use self::loader::RuleLoader;
pub use self::cache::RuleCacheManager;
