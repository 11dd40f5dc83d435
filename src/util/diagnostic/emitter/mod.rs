//! 诊断输出模块

pub mod json;
pub mod text;

pub use json::{JsonDiagnostic, JsonEmitter, JsonReport};
pub use text::{DiagnosticEmitter, EmitterConfig, TextEmitter};
