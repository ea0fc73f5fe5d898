//! 检测模块：规则匹配与解析器门面
pub mod matcher;
pub mod classifier;
pub mod handle;

// 导出核心接口
pub use self::matcher::{MatchResult, Matcher};
pub use self::classifier::Classifier;
pub use self::handle::ClassifierHandle;
