//! 诊断收集器
//!
//! 多个分析任务可并发提交，输出前按位置排序，保证并行与串行结果一致。

use super::Diagnostic;
use parking_lot::Mutex;

/// 线程安全的诊断收集器
#[derive(Debug, Default)]
pub struct DiagnosticSink {
    diagnostics: Mutex<Vec<Diagnostic>>,
}

impl DiagnosticSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn submit(
        &self,
        diagnostic: Diagnostic,
    ) {
        self.diagnostics.lock().push(diagnostic);
    }

    pub fn extend(
        &self,
        diagnostics: impl IntoIterator<Item = Diagnostic>,
    ) {
        self.diagnostics.lock().extend(diagnostics);
    }

    pub fn len(&self) -> usize {
        self.diagnostics.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.lock().is_empty()
    }

    /// 当前内容的有序副本
    pub fn snapshot(&self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.lock().clone();
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }

    pub fn into_sorted(self) -> Vec<Diagnostic> {
        let mut diagnostics = self.diagnostics.into_inner();
        sort_diagnostics(&mut diagnostics);
        diagnostics
    }
}

/// 按位置、错误码、消息排序
pub fn sort_diagnostics(diagnostics: &mut [Diagnostic]) {
    diagnostics.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
}
