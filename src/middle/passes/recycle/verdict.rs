//! 泄漏判定
//!
//! 在收敛后的分析结果上给出结论：已回收、泄漏或逃逸。

use super::lattice::Ownership;
use super::resource::ResourceKind;
use super::tracker::RecycleTracker;
use crate::middle::core::ir::{InstrIndex, Method};
use crate::middle::passes::flow::{FlowAnalyzer, FlowResult, FrameTable};
use tracing::debug;

/// 单个获取点的结论
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verdict {
    /// 至少一条路径回收了实例
    Recycled,
    /// 既未回收也未逃逸
    Leaked,
    /// 实例流出方法，交由他处负责
    Escaped,
}

impl Verdict {
    /// 判定依据：逃逸优先于回收
    pub fn decide(tracker: &RecycleTracker<'_>) -> Self {
        if tracker.is_escaped() {
            Verdict::Escaped
        } else if tracker.is_recycled() {
            Verdict::Recycled
        } else {
            Verdict::Leaked
        }
    }
}

/// 数据流检查报告
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowReport {
    pub verdict: Verdict,
    /// 使用已回收实例的调用位置（升序，每条指令至多一次）
    pub double_releases: Vec<InstrIndex>,
    pub frames: FrameTable<Ownership>,
    pub steps: usize,
}

/// 对一个获取点运行方法内数据流检查
///
/// 分析中止时返回错误，调用方不应据此产生诊断。
pub fn check_method_flow(
    method: &Method,
    obtain_at: InstrIndex,
    kind: &ResourceKind,
) -> FlowResult<FlowReport> {
    let tracker = RecycleTracker::new(kind, obtain_at);
    let analysis = FlowAnalyzer::new(tracker).analyze(method)?;

    let verdict = Verdict::decide(&analysis.interpreter);
    let double_releases: Vec<_> = analysis.interpreter.double_releases().collect();

    debug!(
        "{} obtained at {}#{}: {:?} after {} steps ({} double releases)",
        kind.name,
        method.name,
        obtain_at,
        verdict,
        analysis.steps,
        double_releases.len()
    );

    Ok(FlowReport {
        verdict,
        double_releases,
        frames: analysis.frames,
        steps: analysis.steps,
    })
}
