//! 错误码定义
//!
//! R9xxx: 内部错误码

use super::{ErrorCategory, ErrorCodeDefinition};

/// R9xxx 错误码列表
pub static R9XXX: &[ErrorCodeDefinition] = &[ErrorCodeDefinition {
    code: "R9001",
    category: ErrorCategory::Internal,
    message_template: "Internal diagnostic error: {message}",
    help_template: "Please report this issue",
}];
