//! 通用诊断构建器
//!
//! 支持模板参数化的错误消息构建器

use crate::util::diagnostic::{Diagnostic, Severity};
use crate::util::span::SourceLocation;

/// 诊断构建器（支持模板参数）
#[derive(Debug, Clone)]
pub struct DiagnosticBuilder {
    code: &'static str,
    message_template: &'static str,
    help_template: &'static str,
    params: Vec<(&'static str, String)>,
    location: Option<SourceLocation>,
    resource: Option<String>,
    severity: Severity,
}

impl DiagnosticBuilder {
    /// 创建新的诊断构建器
    pub fn new(
        code: &'static str,
        message_template: &'static str,
        help_template: &'static str,
    ) -> Self {
        Self {
            code,
            message_template,
            help_template,
            params: Vec::new(),
            location: None,
            resource: None,
            severity: Severity::Warning,
        }
    }

    /// 添加模板参数
    pub fn param(
        mut self,
        key: &'static str,
        value: impl Into<String>,
    ) -> Self {
        self.params.push((key, value.into()));
        self
    }

    /// 设置位置
    #[inline]
    pub fn at(
        mut self,
        location: SourceLocation,
    ) -> Self {
        self.location = Some(location);
        self
    }

    #[inline]
    pub fn resource(
        mut self,
        name: impl Into<String>,
    ) -> Self {
        self.resource = Some(name.into());
        self
    }

    #[inline]
    pub fn severity(
        mut self,
        severity: Severity,
    ) -> Self {
        self.severity = severity;
        self
    }

    /// 模板中未提供的参数
    fn missing_params(&self) -> Vec<String> {
        let mut missing = Vec::new();
        let mut rest = self.message_template;
        while let Some(open) = rest.find('{') {
            let after = &rest[open + 1..];
            let Some(close) = after.find('}') else {
                break;
            };
            let key = &after[..close];
            if !key.is_empty() && !self.params.iter().any(|(k, _)| *k == key) {
                missing.push(key.to_string());
            }
            rest = &after[close + 1..];
        }
        missing
    }

    fn render(
        &self,
        template: &str,
    ) -> String {
        let mut out = template.to_string();
        for (key, value) in &self.params {
            out = out.replace(&format!("{{{}}}", key), value);
        }
        out
    }

    /// 构建 Diagnostic
    ///
    /// 缺少模板参数时回落为 R9001，不中断进程。
    pub fn build(&self) -> Diagnostic {
        let missing = self.missing_params();
        if !missing.is_empty() {
            let message = format!(
                "missing template parameter(s) for '{}': {:?}",
                self.code, missing
            );
            return Diagnostic::new(
                Severity::Error,
                "R9001".to_string(),
                format!("Internal diagnostic error: {}", message),
                "Please report this issue".to_string(),
                self.location.clone(),
            );
        }

        let mut diagnostic = Diagnostic::new(
            self.severity,
            self.code.to_string(),
            self.render(self.message_template),
            self.render(self.help_template),
            self.location.clone(),
        );
        diagnostic.resource = self.resource.clone();
        diagnostic
    }
}
