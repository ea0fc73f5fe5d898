//! 规则数据模型定义
//! 仅存储规则数据与解析结果，无匹配逻辑，支持序列化/反序列化

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use serde::{Deserialize, Serialize};

use crate::error::{UapResult, UaParserError};

/// 未命中任何规则时的家族兜底值
pub const FALLBACK_FAMILY: &str = "Other";

/// 检测域：设备 / 操作系统 / 浏览器，三者相互独立
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Device,
    Os,
    UserAgent,
}

impl Domain {
    /// 全部检测域（声明顺序）
    pub const ALL: [Domain; 3] = [Domain::Device, Domain::Os, Domain::UserAgent];

    /// 该域可产出的字段
    pub fn fields(self) -> &'static [Field] {
        match self {
            Domain::UserAgent => &[Field::Family, Field::Major, Field::Minor, Field::Patch],
            Domain::Os => &[
                Field::Family,
                Field::Major,
                Field::Minor,
                Field::Patch,
                Field::PatchMinor,
            ],
            Domain::Device => &[Field::Family, Field::Brand, Field::Model],
        }
    }

    /// 字段是否属于该域
    pub fn supports(self, field: Field) -> bool {
        self.fields().contains(&field)
    }

    /// uap-core 约定：模板缺省时字段取第几个捕获分组
    pub fn positional_group(self, field: Field) -> Option<usize> {
        match (self, field) {
            (Domain::UserAgent | Domain::Os, Field::Family) => Some(1),
            (Domain::UserAgent | Domain::Os, Field::Major) => Some(2),
            (Domain::UserAgent | Domain::Os, Field::Minor) => Some(3),
            (Domain::UserAgent | Domain::Os, Field::Patch) => Some(4),
            (Domain::Os, Field::PatchMinor) => Some(5),
            (Domain::Device, Field::Family) => Some(1),
            (Domain::Device, Field::Model) => Some(1),
            _ => None,
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Domain::Device => write!(f, "device"),
            Domain::Os => write!(f, "os"),
            Domain::UserAgent => write!(f, "user_agent"),
        }
    }
}

/// 输出字段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Family,
    Major,
    Minor,
    Patch,
    PatchMinor,
    Brand,
    Model,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Field::Family => "family",
            Field::Major => "major",
            Field::Minor => "minor",
            Field::Patch => "patch",
            Field::PatchMinor => "patch_minor",
            Field::Brand => "brand",
            Field::Model => "model",
        };
        f.write_str(name)
    }
}

/// 单条声明式规则（源形态）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleRecord {
    pub pattern: String,
    #[serde(default)]
    pub case_insensitive: bool,
    /// 字段 -> 模板，缺失即该字段无模板
    #[serde(default)]
    pub templates: BTreeMap<Field, String>,
}

impl RuleRecord {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    pub fn case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    pub fn with_template(mut self, field: Field, template: impl Into<String>) -> Self {
        self.templates.insert(field, template.into());
        self
    }

    pub fn template(&self, field: Field) -> Option<&str> {
        self.templates.get(&field).map(String::as_str)
    }
}

/// 规则库文件编码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleFormat {
    Yaml,
    Json,
}

impl RuleFormat {
    /// 按扩展名推断编码，未知扩展名按 YAML 处理（uap-core 原生格式）
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => RuleFormat::Json,
            _ => RuleFormat::Yaml,
        }
    }
}

/// 浏览器规则（uap-core `user_agent_parsers` 条目）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgentRuleDef {
    pub regex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v1_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v2_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub v3_replacement: Option<String>,
}

/// 操作系统规则（uap-core `os_parsers` 条目）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsRuleDef {
    pub regex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_v1_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_v2_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_v3_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub os_v4_replacement: Option<String>,
}

/// 设备规则（uap-core `device_parsers` 条目）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRuleDef {
    pub regex: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand_replacement: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_replacement: Option<String>,
}

/// 完整规则库（三个有序规则列表，顺序即优先级）
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleDatabase {
    #[serde(default)]
    pub user_agent_parsers: Vec<UserAgentRuleDef>,
    #[serde(default)]
    pub os_parsers: Vec<OsRuleDef>,
    #[serde(default)]
    pub device_parsers: Vec<DeviceRuleDef>,
}

impl RuleDatabase {
    pub fn from_yaml_str(source: &str) -> UapResult<Self> {
        Ok(serde_yaml::from_str(source)?)
    }

    pub fn from_json_str(source: &str) -> UapResult<Self> {
        Ok(serde_json::from_str(source)?)
    }

    pub fn from_slice(bytes: &[u8], format: RuleFormat) -> UapResult<Self> {
        match format {
            RuleFormat::Yaml => Ok(serde_yaml::from_slice(bytes)?),
            RuleFormat::Json => Ok(serde_json::from_slice(bytes)?),
        }
    }

    /// 某个域的规则条数
    pub fn len(&self, domain: Domain) -> usize {
        match domain {
            Domain::UserAgent => self.user_agent_parsers.len(),
            Domain::Os => self.os_parsers.len(),
            Domain::Device => self.device_parsers.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        Domain::ALL.iter().all(|domain| self.len(*domain) == 0)
    }

    /// 转换为统一的 RuleRecord 列表，保持声明顺序
    pub fn records(&self, domain: Domain) -> UapResult<Vec<RuleRecord>> {
        match domain {
            Domain::UserAgent => self
                .user_agent_parsers
                .iter()
                .enumerate()
                .map(|(index, def)| -> UapResult<RuleRecord> {
                    let record = RuleRecord::new(&def.regex)
                        .case_insensitive(parse_regex_flag(domain, index, def.regex_flag.as_deref())?);
                    Ok(with_templates(record, [
                        (Field::Family, &def.family_replacement),
                        (Field::Major, &def.v1_replacement),
                        (Field::Minor, &def.v2_replacement),
                        (Field::Patch, &def.v3_replacement),
                    ]))
                })
                .collect(),
            Domain::Os => self
                .os_parsers
                .iter()
                .enumerate()
                .map(|(index, def)| -> UapResult<RuleRecord> {
                    let record = RuleRecord::new(&def.regex)
                        .case_insensitive(parse_regex_flag(domain, index, def.regex_flag.as_deref())?);
                    Ok(with_templates(record, [
                        (Field::Family, &def.os_replacement),
                        (Field::Major, &def.os_v1_replacement),
                        (Field::Minor, &def.os_v2_replacement),
                        (Field::Patch, &def.os_v3_replacement),
                        (Field::PatchMinor, &def.os_v4_replacement),
                    ]))
                })
                .collect(),
            Domain::Device => self
                .device_parsers
                .iter()
                .enumerate()
                .map(|(index, def)| -> UapResult<RuleRecord> {
                    let record = RuleRecord::new(&def.regex)
                        .case_insensitive(parse_regex_flag(domain, index, def.regex_flag.as_deref())?);
                    Ok(with_templates(record, [
                        (Field::Family, &def.device_replacement),
                        (Field::Brand, &def.brand_replacement),
                        (Field::Model, &def.model_replacement),
                    ]))
                })
                .collect(),
        }
    }
}

fn with_templates<const N: usize>(
    mut record: RuleRecord,
    templates: [(Field, &Option<String>); N],
) -> RuleRecord {
    for (field, template) in templates {
        if let Some(template) = template {
            record.templates.insert(field, template.clone());
        }
    }
    record
}

/// uap-core 仅定义了 `i` 标志
fn parse_regex_flag(domain: Domain, index: usize, flag: Option<&str>) -> UapResult<bool> {
    match flag {
        None => Ok(false),
        Some("i") => Ok(true),
        Some(other) => Err(UaParserError::RuleParseError(format!(
            "{} rule #{}: unsupported regex_flag `{}`",
            domain, index, other
        ))),
    }
}

/// 浏览器解析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAgent {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
}

impl Default for UserAgent {
    fn default() -> Self {
        Self {
            family: FALLBACK_FAMILY.to_string(),
            major: None,
            minor: None,
            patch: None,
        }
    }
}

impl fmt::Display for UserAgent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pretty(f, &self.family, &[&self.major, &self.minor, &self.patch])
    }
}

/// 操作系统解析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperatingSystem {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub major: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub patch_minor: Option<String>,
}

impl Default for OperatingSystem {
    fn default() -> Self {
        Self {
            family: FALLBACK_FAMILY.to_string(),
            major: None,
            minor: None,
            patch: None,
            patch_minor: None,
        }
    }
}

impl fmt::Display for OperatingSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_pretty(
            f,
            &self.family,
            &[&self.major, &self.minor, &self.patch, &self.patch_minor],
        )
    }
}

/// 设备解析结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Device {
    pub family: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

impl Default for Device {
    fn default() -> Self {
        Self {
            family: FALLBACK_FAMILY.to_string(),
            brand: None,
            model: None,
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.brand, &self.model) {
            (Some(brand), Some(model)) if !brand.is_empty() && !model.is_empty() => {
                write!(f, "{} ({} {})", self.family, brand, model)
            }
            _ => write!(f, "{}", self.family),
        }
    }
}

/// 完整解析结果，三个域始终齐全
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    pub string: String,
    pub user_agent: UserAgent,
    pub os: OperatingSystem,
    pub device: Device,
}

// ======== "family major.minor.patch"，遇到第一个缺失版本段即停止 ========
fn write_pretty(
    f: &mut fmt::Formatter<'_>,
    family: &str,
    versions: &[&Option<String>],
) -> fmt::Result {
    f.write_str(family)?;
    let mut first = true;
    for version in versions {
        let Some(v) = version.as_deref().filter(|v| !v.is_empty()) else {
            break;
        };
        f.write_str(if first { " " } else { "." })?;
        f.write_str(v)?;
        first = false;
    }
    Ok(())
}
