//! 编译模块：将声明式规则编译为有序、只读的规则集
pub mod template;
pub mod pattern;
pub mod compiler;

pub use self::template::{FieldTemplate, Fragment};
pub use self::pattern::{CompiledRule, PreparedRule, RuleSet, RuleSetArtifact, ARTIFACT_FORMAT_VERSION};
pub use self::compiler::{CompileOptions, RuleCompiler};
