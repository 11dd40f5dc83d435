//! 诊断数据结构
//!
//! # 设计原则
//!
//! - `Diagnostic` 的 `message` 和 `help` 在创建时已渲染完成
//! - **只允许通过 `DiagnosticBuilder` 创建诊断**，所有错误码必须在注册表中注册
//!
//! # 创建方式
//!
//! ```ignore
//! ErrorCodeDefinition::resource_leaked("TypedArray")
//!     .at(location)
//!     .build();
//! ```

use crate::util::span::SourceLocation;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// 诊断严重级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// 获取严重级别对应的数字值
    pub fn as_u8(&self) -> u8 {
        match self {
            Severity::Error => 4,
            Severity::Warning => 3,
            Severity::Info => 2,
            Severity::Hint => 1,
        }
    }

    /// 检查是否为错误级别
    pub fn is_error(&self) -> bool {
        matches!(self, Severity::Error)
    }
}

impl FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "error" => Ok(Severity::Error),
            "warning" | "warn" => Ok(Severity::Warning),
            "info" => Ok(Severity::Info),
            "hint" => Ok(Severity::Hint),
            other => Err(format!("unknown severity `{}`", other)),
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Info => write!(f, "info"),
            Severity::Hint => write!(f, "hint"),
        }
    }
}

/// 诊断信息（message 已渲染完成）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// 严重级别
    pub severity: Severity,
    /// 错误码
    pub code: String,
    /// 完整消息
    pub message: String,
    /// 帮助信息
    pub help: String,
    /// 位置信息
    pub location: Option<SourceLocation>,
    /// 资源种类名
    #[serde(default)]
    pub resource: Option<String>,
}

impl Diagnostic {
    /// `pub(crate)`: 仅由 `DiagnosticBuilder::build()` 调用
    pub(crate) fn new(
        severity: Severity,
        code: String,
        message: String,
        help: String,
        location: Option<SourceLocation>,
    ) -> Self {
        Self {
            severity,
            code,
            message,
            help,
            location,
            resource: None,
        }
    }

    /// 排序键：位置、错误码、消息
    pub fn sort_key(&self) -> (Option<&SourceLocation>, &str, &str) {
        (self.location.as_ref(), &self.code, &self.message)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}
