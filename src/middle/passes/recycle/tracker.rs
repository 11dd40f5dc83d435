//! 所有权转移函数
//!
//! 追踪单个获取点产生的实例，记录它是否被回收、是否逃逸出方法，
//! 以及哪些调用使用了已回收的实例。

use super::lattice::Ownership;
use super::resource::ResourceKind;
use crate::middle::core::ir::{CallSite, InstrIndex, Instruction, InvokeKind};
use crate::middle::passes::flow::{Frame, Interpreter};
use std::collections::BTreeSet;

/// 单实例追踪解释器
#[derive(Debug, Clone)]
pub struct RecycleTracker<'a> {
    kind: &'a ResourceKind,
    obtain_at: InstrIndex,
    recycled: bool,
    /// 实例逃逸的位置
    escapes: BTreeSet<InstrIndex>,
    /// 使用已回收实例的调用位置
    double_releases: BTreeSet<InstrIndex>,
}

impl<'a> RecycleTracker<'a> {
    pub fn new(
        kind: &'a ResourceKind,
        obtain_at: InstrIndex,
    ) -> Self {
        Self {
            kind,
            obtain_at,
            recycled: false,
            escapes: BTreeSet::new(),
            double_releases: BTreeSet::new(),
        }
    }

    pub fn kind(&self) -> &ResourceKind {
        self.kind
    }

    pub fn obtain_at(&self) -> InstrIndex {
        self.obtain_at
    }

    /// 是否在某条路径上观察到回收
    pub fn is_recycled(&self) -> bool {
        self.recycled
    }

    /// 是否流出方法（返回、写入堆、传给其他方法）
    pub fn is_escaped(&self) -> bool {
        !self.escapes.is_empty()
    }

    pub fn escapes(&self) -> impl Iterator<Item = InstrIndex> + '_ {
        self.escapes.iter().copied()
    }

    pub fn double_releases(&self) -> impl Iterator<Item = InstrIndex> + '_ {
        self.double_releases.iter().copied()
    }

    fn is_recycle_call(
        &self,
        call: &CallSite,
    ) -> bool {
        call.kind.is_dynamic() && self.kind.is_release(call)
    }
}

impl Interpreter for RecycleTracker<'_> {
    type Value = Ownership;

    fn new_value(&self) -> Ownership {
        Ownership::Unknown
    }

    fn fresh(
        &mut self,
        _at: InstrIndex,
        _instr: &Instruction,
    ) -> Ownership {
        Ownership::Unknown
    }

    fn store_heap(
        &mut self,
        at: InstrIndex,
        _instr: &Instruction,
        value: &Ownership,
    ) {
        if value.is_instance() {
            self.escapes.insert(at);
        }
    }

    fn call(
        &mut self,
        at: InstrIndex,
        call: &CallSite,
        args: &[Ownership],
        frame: &mut Frame<Ownership>,
    ) -> Ownership {
        if at == self.obtain_at {
            return Ownership::Tracked;
        }

        if self.is_recycle_call(call) && args == [Ownership::Tracked] {
            self.recycled = true;
            for value in frame.values_mut() {
                if *value == Ownership::Tracked {
                    *value = Ownership::Released;
                }
            }
            return Ownership::Released;
        }

        // 静态调用没有接收者；对实例本身调用方法不算逃逸
        let start = usize::from(call.kind != InvokeKind::Static);
        for (i, arg) in args.iter().enumerate() {
            match arg {
                Ownership::Tracked if i >= start => {
                    // 白名单调用直接结束，其余参数不再检查
                    if self.kind.preserves_identity(call) {
                        return Ownership::Unknown;
                    }
                    self.escapes.insert(at);
                }
                Ownership::Released => {
                    self.double_releases.insert(at);
                }
                _ => {}
            }
        }

        Ownership::Unknown
    }

    fn ret(
        &mut self,
        at: InstrIndex,
        value: &Ownership,
    ) {
        if value.is_instance() {
            self.escapes.insert(at);
        }
    }
}
