//! 诊断文本渲染器

use crate::util::diagnostic::{Diagnostic, Severity};
use owo_colors::OwoColorize;

/// 渲染器配置
#[derive(Debug, Clone)]
pub struct EmitterConfig {
    /// 是否启用颜色输出
    pub use_colors: bool,
    /// 是否显示帮助信息
    pub show_help: bool,
    /// 是否显示方法内位置（类、方法、指令下标）
    pub show_instruction: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            use_colors: true,
            show_help: true,
            show_instruction: true,
        }
    }
}

/// 诊断渲染器 trait
pub trait DiagnosticEmitter {
    fn emit(
        &self,
        diagnostic: &Diagnostic,
    ) -> String;
}

/// 文本诊断渲染器
#[derive(Debug, Clone, Default)]
pub struct TextEmitter {
    config: EmitterConfig,
}

impl TextEmitter {
    /// 创建新的文本渲染器
    pub fn new() -> Self {
        Self::default()
    }

    /// 使用自定义配置创建渲染器
    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    /// 渲染单个诊断
    pub fn render(
        &self,
        diagnostic: &Diagnostic,
    ) -> String {
        let mut output = self.render_header(diagnostic);
        output.push_str(&self.render_location(diagnostic));

        if self.config.show_help && !diagnostic.help.is_empty() {
            output.push_str(&format!("  {} {}\n", self.paint("= help:", Style::Bold), diagnostic.help));
        }

        output
    }

    /// 渲染多个诊断，末尾附加统计
    pub fn render_all(
        &self,
        diagnostics: &[Diagnostic],
    ) -> String {
        let mut output = String::new();
        for diagnostic in diagnostics {
            output.push_str(&self.render(diagnostic));
            output.push('\n');
        }
        output.push_str(&self.render_summary(diagnostics));
        output
    }

    /// 统计行，如 `2 warnings, 1 error`
    pub fn render_summary(
        &self,
        diagnostics: &[Diagnostic],
    ) -> String {
        if diagnostics.is_empty() {
            return format!("{}\n", self.paint("no issues found", Style::Bold));
        }

        let mut parts = Vec::new();
        for severity in [Severity::Error, Severity::Warning, Severity::Info, Severity::Hint] {
            let count = diagnostics.iter().filter(|d| d.severity == severity).count();
            if count > 0 {
                let plural = if count == 1 { "" } else { "s" };
                parts.push(format!("{} {}{}", count, severity, plural));
            }
        }
        format!("{}\n", self.paint(&parts.join(", "), Style::Bold))
    }

    fn render_header(
        &self,
        diagnostic: &Diagnostic,
    ) -> String {
        let severity = diagnostic.severity.to_string();
        format!(
            "{}{}: {}\n",
            self.paint(&severity, Style::Severity(diagnostic.severity)),
            self.paint(&format!("[{}]", diagnostic.code), Style::Bold),
            diagnostic.message
        )
    }

    fn render_location(
        &self,
        diagnostic: &Diagnostic,
    ) -> String {
        let Some(location) = &diagnostic.location else {
            return String::new();
        };

        let arrow = self.paint("-->", Style::Accent);
        if self.config.show_instruction {
            format!(
                "  {} {} in {}.{} at #{}\n",
                arrow,
                location.origin(),
                location.class,
                location.method,
                location.instruction
            )
        } else {
            format!("  {} {}\n", arrow, location.origin())
        }
    }

    fn paint(
        &self,
        text: &str,
        style: Style,
    ) -> String {
        if !self.config.use_colors {
            return text.to_string();
        }

        match style {
            Style::Severity(Severity::Error) => text.red().bold().to_string(),
            Style::Severity(Severity::Warning) => text.yellow().bold().to_string(),
            Style::Severity(Severity::Info) => text.blue().bold().to_string(),
            Style::Severity(Severity::Hint) => text.cyan().bold().to_string(),
            Style::Bold => text.bold().to_string(),
            Style::Accent => text.blue().to_string(),
        }
    }
}

impl DiagnosticEmitter for TextEmitter {
    fn emit(
        &self,
        diagnostic: &Diagnostic,
    ) -> String {
        self.render(diagnostic)
    }
}

#[derive(Debug, Clone, Copy)]
enum Style {
    Severity(Severity),
    Bold,
    Accent,
}
