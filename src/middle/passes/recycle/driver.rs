//! 单元驱动
//!
//! 最小宿主：对一个编译单元运行两遍扫描，并响应重扫请求。

use super::coordinator::{CategoryFlags, CheckOptions, RecycleChecker};
use super::resource::ResourceTable;
use crate::middle::core::ir::ClassUnit;
use crate::util::diagnostic::{Diagnostic, DiagnosticSink};
use indexmap::IndexMap;
use rayon::prelude::*;
use tracing::info;

/// 单元检查报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitReport {
    pub unit: String,
    /// 按位置排序
    pub diagnostics: Vec<Diagnostic>,
    /// 是否执行了第二遍
    pub rescanned: bool,
    pub flags: IndexMap<String, CategoryFlags>,
    /// 分析中止的获取点数
    pub aborted: usize,
}

/// 单元驱动
#[derive(Debug, Clone)]
pub struct UnitDriver {
    table: ResourceTable,
    options: CheckOptions,
}

impl Default for UnitDriver {
    fn default() -> Self {
        Self::new(ResourceTable::builtin().clone(), CheckOptions::default())
    }
}

impl UnitDriver {
    pub fn new(
        table: ResourceTable,
        options: CheckOptions,
    ) -> Self {
        Self { table, options }
    }

    pub fn table(&self) -> &ResourceTable {
        &self.table
    }

    pub fn options(&self) -> CheckOptions {
        self.options
    }

    /// 检查单个单元
    pub fn run(
        &self,
        unit: &ClassUnit,
    ) -> UnitReport {
        let mut checker = RecycleChecker::new(&self.table, self.options);

        checker.before_unit();
        checker.scan(unit);
        let mut rescanned = false;
        if checker.after_unit() && self.options.rescan && checker.begin_rescan() {
            checker.scan(unit);
            checker.after_unit();
            rescanned = true;
        }

        let (diagnostics, context) = checker.finish();
        info!(
            "{}: {} diagnostics{}",
            unit.name,
            diagnostics.len(),
            if rescanned { " (rescanned)" } else { "" }
        );

        UnitReport {
            unit: unit.name.clone(),
            diagnostics,
            rescanned,
            flags: context.flags,
            aborted: context.aborted,
        }
    }

    /// 检查多个单元，报告顺序与输入一致
    pub fn run_all(
        &self,
        units: &[ClassUnit],
    ) -> Vec<UnitReport> {
        if self.options.parallel {
            units.par_iter().map(|unit| self.run(unit)).collect()
        } else {
            units.iter().map(|unit| self.run(unit)).collect()
        }
    }

    /// 检查多个单元并汇总排序后的诊断
    pub fn check_units(
        &self,
        units: &[ClassUnit],
    ) -> Vec<Diagnostic> {
        let sink = DiagnosticSink::new();
        let submit = |unit: &ClassUnit| sink.extend(self.run(unit).diagnostics);
        if self.options.parallel {
            units.par_iter().for_each(submit);
        } else {
            units.iter().for_each(submit);
        }
        sink.into_sorted()
    }
}
