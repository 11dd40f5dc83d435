//! 统一诊断系统
//!
//! # 模块结构
//!
//! - [`error`] - 诊断数据结构 (Diagnostic, Severity)
//! - [`codes`] - 错误码注册表与构建器
//! - [`sink`] - 并发诊断收集器
//! - [`emitter`] - 文本 / JSON 渲染
//!
//! # 示例
//!
//! ```
//! use recycle_lint::util::diagnostic::{codes::ErrorCodeDefinition, TextEmitter};
//!
//! let diagnostic = ErrorCodeDefinition::resource_leaked("Parcel").build();
//! let output = TextEmitter::new().render(&diagnostic);
//! assert!(output.contains("R0001"));
//! ```

pub mod codes;
pub mod emitter;
pub mod error;
pub mod sink;

// 重新导出
pub use codes::{DiagnosticBuilder, ErrorCodeDefinition, IssueDefinition, RECYCLE_ISSUE};
pub use emitter::{EmitterConfig, JsonEmitter, TextEmitter};
pub use error::{Diagnostic, Severity};
pub use sink::{sort_diagnostics, DiagnosticSink};
