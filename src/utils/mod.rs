//! 通用工具模块
pub mod field_resolver;

pub use self::field_resolver::{FieldResolver, ResolvedFields};
