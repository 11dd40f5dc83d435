//! 错误码定义
//!
//! R0xxx: 池化资源回收

use super::{DiagnosticBuilder, ErrorCategory, ErrorCodeDefinition, IssueDefinition};
use crate::util::diagnostic::Severity;

/// R0xxx 错误码列表
pub static R0XXX: &[ErrorCodeDefinition] = &[
    ErrorCodeDefinition {
        code: "R0001",
        category: ErrorCategory::Performance,
        message_template: "This {kind} should be recycled after use with #recycle()",
        help_template: "call `recycle()` on the {kind} once it is no longer used",
    },
    ErrorCodeDefinition {
        code: "R0002",
        category: ErrorCategory::Performance,
        message_template: "This {kind} has already been recycled",
        help_template: "the {kind} was returned to its pool earlier on this path; do not use it afterwards",
    },
];

/// 回收检查项
pub static RECYCLE_ISSUE: IssueDefinition = IssueDefinition {
    id: "Recycle",
    summary: "Looks for missing recycle() calls on resources",
    explanation: "Many resources, such as TypedArrays, VelocityTrackers, etc., should be \
                  recycled (with a `recycle()` call) after use. This lint check looks for \
                  missing `recycle()` calls.",
    category: ErrorCategory::Performance,
    priority: 7,
    default_severity: Severity::Warning,
};

// R0xxx 快捷方法
impl ErrorCodeDefinition {
    /// R0001 资源未回收
    pub fn resource_leaked(kind: &str) -> DiagnosticBuilder {
        Self::r0xxx(0).builder().param("kind", kind).resource(kind)
    }

    /// R0002 资源重复回收
    pub fn already_recycled(kind: &str) -> DiagnosticBuilder {
        Self::r0xxx(1).builder().param("kind", kind).resource(kind)
    }

    fn r0xxx(index: usize) -> &'static ErrorCodeDefinition {
        &R0XXX[index]
    }
}
