//! 错误码注册表
//!
//! 提供所有诊断错误码与检查项元数据的集中定义

pub mod r0xxx;
pub mod r9xxx;

pub use r0xxx::*;
pub use r9xxx::*;

pub mod builder;
pub use builder::DiagnosticBuilder;

use crate::util::diagnostic::Severity;
use once_cell::sync::Lazy;
use serde::Serialize;

/// 错误类别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorCategory {
    Performance, // R0xxx: 资源回收
    Internal,    // R9xxx: 内部错误
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        match self {
            ErrorCategory::Performance => write!(f, "Performance"),
            ErrorCategory::Internal => write!(f, "Internal"),
        }
    }
}

/// 错误码定义
#[derive(Debug, Clone, Copy)]
pub struct ErrorCodeDefinition {
    /// 错误码，如 "R0001"
    pub code: &'static str,
    /// 错误类别
    pub category: ErrorCategory,
    /// 消息模板，支持 {param} 占位符
    pub message_template: &'static str,
    /// 帮助模板
    pub help_template: &'static str,
}

/// 检查项元数据
#[derive(Debug, Clone, Copy, Serialize)]
pub struct IssueDefinition {
    pub id: &'static str,
    pub summary: &'static str,
    pub explanation: &'static str,
    pub category: ErrorCategory,
    /// 1-10，越大越重要
    pub priority: u8,
    pub default_severity: Severity,
}

/// 完整的错误码注册表
static ERROR_CODES: Lazy<Vec<ErrorCodeDefinition>> = Lazy::new(|| {
    let mut codes: Vec<ErrorCodeDefinition> = Vec::new();

    // R0xxx: 资源回收
    codes.extend_from_slice(r0xxx::R0XXX);
    // R9xxx: 内部错误
    codes.extend_from_slice(r9xxx::R9XXX);

    codes
});

impl ErrorCodeDefinition {
    /// 根据代码查找错误码定义
    pub fn find(code: &str) -> Option<&'static Self> {
        ERROR_CODES.iter().find(|c| c.code == code)
    }

    /// 获取所有错误码
    pub fn all() -> &'static [Self] {
        &ERROR_CODES
    }

    /// 按类别获取错误码
    pub fn by_category(category: ErrorCategory) -> impl Iterator<Item = &'static Self> {
        ERROR_CODES.iter().filter(move |c| c.category == category)
    }

    /// 创建 DiagnosticBuilder
    pub fn builder(&self) -> DiagnosticBuilder {
        DiagnosticBuilder::new(self.code, self.message_template, self.help_template)
    }
}
