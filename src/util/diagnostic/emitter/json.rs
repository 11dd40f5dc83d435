//! JSON 诊断渲染器
//!
//! 每条诊断展开为扁平对象，便于脚本与 CI 消费

use crate::util::diagnostic::codes::RECYCLE_ISSUE;
use crate::util::diagnostic::{Diagnostic, Severity};
use serde::{Deserialize, Serialize};
use serde_json::to_string_pretty;

/// JSON 诊断结构
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JsonDiagnostic {
    pub issue: String,
    pub code: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub help: String,
    pub resource: Option<String>,
    pub file: Option<String>,
    pub class: Option<String>,
    pub method: Option<String>,
    pub instruction: Option<usize>,
    pub line: Option<u32>,
}

/// JSON 报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonReport {
    pub tool: String,
    pub version: String,
    pub diagnostics: Vec<JsonDiagnostic>,
}

/// JSON 诊断渲染器
#[derive(Debug, Clone)]
pub struct JsonEmitter;

impl JsonEmitter {
    /// 渲染诊断为 JSON 字符串
    pub fn render(diagnostic: &Diagnostic) -> String {
        to_string_pretty(&Self::to_json_diagnostic(diagnostic)).unwrap_or_else(|_| "{}".to_string())
    }

    /// 渲染完整报告
    pub fn render_all(diagnostics: &[Diagnostic]) -> String {
        let report = JsonReport {
            tool: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            diagnostics: diagnostics.iter().map(Self::to_json_diagnostic).collect(),
        };
        to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
    }

    fn to_json_diagnostic(diagnostic: &Diagnostic) -> JsonDiagnostic {
        let location = diagnostic.location.as_ref();
        JsonDiagnostic {
            issue: RECYCLE_ISSUE.id.to_string(),
            code: diagnostic.code.clone(),
            severity: diagnostic.severity,
            message: diagnostic.message.clone(),
            help: diagnostic.help.clone(),
            resource: diagnostic.resource.clone(),
            file: location.and_then(|l| l.file.clone()),
            class: location.map(|l| l.class.clone()),
            method: location.map(|l| l.method.clone()),
            instruction: location.map(|l| l.instruction),
            line: location.and_then(|l| l.line),
        }
    }
}
