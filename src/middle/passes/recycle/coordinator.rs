//! 阶段协调器
//!
//! 每个编译单元两遍扫描：
//!
//! - 第一遍（精确）：记录各资源种类的获取 / 回收标志，并对需要数据流检查的
//!   获取点运行方法内分析。
//! - 门控：仍有「获取但未回收、也未被精确检查处理」的种类时，向宿主请求
//!   重扫一次。
//! - 第二遍（粗粒度）：对仍可疑种类的每个获取点报告泄漏，跳过第一遍已处理的位置。
//!
//! 标志保存在每个单元独立的 [`UnitContext`] 中，不存在进程级状态。

use super::error::FindingKind;
use super::resource::{CallRole, KindId, ResourceTable};
use super::verdict::{check_method_flow, Verdict};
use crate::middle::core::ir::{ClassUnit, InstrIndex, Method};
use crate::util::diagnostic::{Diagnostic, DiagnosticSink, Severity};
use crate::util::span::SourceLocation;
use indexmap::IndexMap;
use rayon::prelude::*;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{debug, warn};

/// 方法下标与指令下标
pub type SiteId = (usize, InstrIndex);

/// 单个资源种类的单元级标志
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CategoryFlags {
    /// 见到过获取调用
    pub obtained: bool,
    /// 见到过回收调用
    pub released: bool,
    /// 精确检查已给出结论
    pub handled: bool,
}

impl CategoryFlags {
    #[inline]
    pub fn looks_leaky(&self) -> bool {
        self.obtained && !self.released && !self.handled
    }
}

/// 协调器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Initial,
    Scanning,
    MaybeRescan,
    Rescanning,
    Done,
}

/// 单元级上下文，单元结束后丢弃
#[derive(Debug, Clone, Default)]
pub struct UnitContext {
    /// 按资源表顺序
    pub flags: IndexMap<String, CategoryFlags>,
    /// 第一遍已有结论（含分析中止）的获取点
    pub settled: HashSet<SiteId>,
    /// 已报告的位置与发现类型
    pub reported: HashSet<(SiteId, FindingKind)>,
    pub rescan_requested: bool,
    /// 分析中止的获取点数
    pub aborted: usize,
}

impl UnitContext {
    fn new(table: &ResourceTable) -> Self {
        Self {
            flags: table
                .kinds()
                .iter()
                .map(|k| (k.name.clone(), CategoryFlags::default()))
                .collect(),
            ..Self::default()
        }
    }

    fn flags_mut(
        &mut self,
        id: KindId,
    ) -> Option<&mut CategoryFlags> {
        self.flags.get_index_mut(id).map(|(_, flags)| flags)
    }

    fn flags_of(
        &self,
        id: KindId,
    ) -> CategoryFlags {
        self.flags
            .get_index(id)
            .map(|(_, flags)| *flags)
            .unwrap_or_default()
    }
}

/// 检查选项
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// 并行运行精确检查
    pub parallel: bool,
    /// 允许第二遍
    pub rescan: bool,
    pub severity: Severity,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            parallel: true,
            rescan: true,
            severity: Severity::Warning,
        }
    }
}

/// 待运行的精确检查
#[derive(Debug, Clone, Copy)]
struct FlowJob {
    method: usize,
    at: InstrIndex,
    kind: KindId,
}

/// 精确检查结果，`None` 表示分析中止
#[derive(Debug, Clone)]
struct FlowOutcome {
    job: FlowJob,
    verdict: Option<Verdict>,
    double_releases: Vec<InstrIndex>,
}

/// 回收检查器
#[derive(Debug)]
pub struct RecycleChecker<'t> {
    table: &'t ResourceTable,
    options: CheckOptions,
    phase: Phase,
    context: UnitContext,
    sink: DiagnosticSink,
}

impl<'t> RecycleChecker<'t> {
    pub fn new(
        table: &'t ResourceTable,
        options: CheckOptions,
    ) -> Self {
        Self {
            table,
            options,
            phase: Phase::Initial,
            context: UnitContext::new(table),
            sink: DiagnosticSink::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn context(&self) -> &UnitContext {
        &self.context
    }

    /// 开始新单元：重置上下文
    pub fn before_unit(&mut self) {
        self.context = UnitContext::new(self.table);
        self.phase = Phase::Scanning;
    }

    /// 按当前阶段扫描单元
    pub fn scan(
        &mut self,
        unit: &ClassUnit,
    ) {
        match self.phase {
            Phase::Scanning => self.precise_pass(unit),
            Phase::Rescanning => self.coarse_pass(unit),
            phase => warn!("scan of {} ignored in phase {:?}", unit.name, phase),
        }
    }

    /// 结束一遍扫描；第一遍结束时返回是否请求重扫（每单元至多一次）
    pub fn after_unit(&mut self) -> bool {
        match self.phase {
            Phase::Scanning => {
                self.phase = Phase::MaybeRescan;
                let leaky: Vec<_> = self
                    .context
                    .flags
                    .iter()
                    .filter(|(_, flags)| flags.looks_leaky())
                    .map(|(name, _)| name.as_str())
                    .collect();
                if leaky.is_empty() || self.context.rescan_requested {
                    self.phase = Phase::Done;
                    return false;
                }
                debug!("requesting rescan for {:?}", leaky);
                self.context.rescan_requested = true;
                true
            }
            Phase::Rescanning | Phase::MaybeRescan => {
                self.phase = Phase::Done;
                false
            }
            Phase::Initial | Phase::Done => false,
        }
    }

    /// 宿主接受重扫请求
    pub fn begin_rescan(&mut self) -> bool {
        if self.phase == Phase::MaybeRescan && self.context.rescan_requested {
            self.phase = Phase::Rescanning;
            true
        } else {
            false
        }
    }

    /// 取出排序后的诊断
    pub fn finish(self) -> (Vec<Diagnostic>, UnitContext) {
        (self.sink.into_sorted(), self.context)
    }

    fn precise_pass(
        &mut self,
        unit: &ClassUnit,
    ) {
        let mut jobs = Vec::new();
        for (index, method) in unit.methods.iter().enumerate() {
            for (at, call) in method.calls() {
                match self.table.classify(call) {
                    Some(CallRole::Release(id)) => {
                        if let Some(flags) = self.context.flags_mut(id) {
                            flags.released = true;
                        }
                    }
                    Some(CallRole::Obtain(id)) => {
                        if let Some(flags) = self.context.flags_mut(id) {
                            flags.obtained = true;
                        }
                        if self.table.kind(id).is_some_and(|k| k.flow_checked) {
                            jobs.push(FlowJob {
                                method: index,
                                at,
                                kind: id,
                            });
                        }
                    }
                    None => {}
                }
            }
        }

        let run = |job: &FlowJob| self.run_job(unit, *job);
        let outcomes: Vec<FlowOutcome> = if self.options.parallel {
            jobs.par_iter().map(run).collect()
        } else {
            jobs.iter().map(run).collect()
        };

        for outcome in outcomes {
            self.record(unit, outcome);
        }
    }

    fn run_job(
        &self,
        unit: &ClassUnit,
        job: FlowJob,
    ) -> FlowOutcome {
        let method = &unit.methods[job.method];
        let Some(kind) = self.table.kind(job.kind) else {
            return FlowOutcome {
                job,
                verdict: None,
                double_releases: Vec::new(),
            };
        };

        match check_method_flow(method, job.at, kind) {
            Ok(report) => FlowOutcome {
                job,
                verdict: Some(report.verdict),
                double_releases: report.double_releases,
            },
            Err(e) => {
                warn!(
                    "skipping {} obtained in {}.{}{} at {}: {}",
                    kind.name, unit.name, method.name, method.desc, job.at, e
                );
                FlowOutcome {
                    job,
                    verdict: None,
                    double_releases: Vec::new(),
                }
            }
        }
    }

    fn record(
        &mut self,
        unit: &ClassUnit,
        outcome: FlowOutcome,
    ) {
        let FlowJob { method, at, kind } = outcome.job;
        let site = (method, at);
        self.context.settled.insert(site);

        for release_at in outcome.double_releases {
            self.report(unit, (method, release_at), kind, FindingKind::AlreadyRecycled);
        }

        match outcome.verdict {
            Some(Verdict::Leaked) => {
                self.report(unit, site, kind, FindingKind::Leaked);
                self.mark_handled(kind);
            }
            Some(Verdict::Recycled) | Some(Verdict::Escaped) => self.mark_handled(kind),
            None => self.context.aborted += 1,
        }
    }

    fn mark_handled(
        &mut self,
        kind: KindId,
    ) {
        if let Some(flags) = self.context.flags_mut(kind) {
            flags.handled = true;
        }
    }

    fn coarse_pass(
        &mut self,
        unit: &ClassUnit,
    ) {
        for (index, method) in unit.methods.iter().enumerate() {
            for (at, call) in method.calls() {
                match self.table.classify(call) {
                    Some(CallRole::Release(id)) => {
                        if let Some(flags) = self.context.flags_mut(id) {
                            flags.released = true;
                        }
                    }
                    Some(CallRole::Obtain(id)) => {
                        let site = (index, at);
                        if self.context.flags_of(id).looks_leaky() && !self.context.settled.contains(&site) {
                            self.report(unit, site, id, FindingKind::Leaked);
                        }
                    }
                    None => {}
                }
            }
        }
    }

    fn report(
        &mut self,
        unit: &ClassUnit,
        site: SiteId,
        kind: KindId,
        finding: FindingKind,
    ) {
        if !self.context.reported.insert((site, finding)) {
            return;
        }
        let Some(resource) = self.table.kind(kind) else {
            return;
        };

        let (method_index, at) = site;
        let location = unit
            .methods
            .get(method_index)
            .map(|method| site_location(unit, method, at));

        let mut builder = finding
            .builder(resource.simple_name())
            .resource(resource.name.as_str())
            .severity(self.options.severity);
        if let Some(location) = location {
            builder = builder.at(location);
        }
        self.sink.submit(builder.build());
    }
}

/// 指令在单元中的位置
pub fn site_location(
    unit: &ClassUnit,
    method: &Method,
    at: InstrIndex,
) -> SourceLocation {
    SourceLocation::new(&unit.name, format!("{}{}", method.name, method.desc), at)
        .with_file(unit.source_file.clone())
        .with_line(method.line_at(at))
}
