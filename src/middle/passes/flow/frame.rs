//! 抽象帧
//!
//! 一条指令执行前的抽象状态：局部槽与操作数栈上的格值。

use super::error::FrameError;
use smallvec::SmallVec;
use std::fmt::Debug;

/// 有限高度的半格
///
/// `merge` 必须满足交换律、结合律、幂等律，且结果不低于任一输入。
pub trait Lattice: Clone + PartialEq + Debug {
    fn merge(
        &self,
        other: &Self,
    ) -> Self;
}

/// 抽象帧
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame<V> {
    locals: Vec<V>,
    stack: Vec<V>,
    max_stack: Option<usize>,
}

impl<V: Lattice> Frame<V> {
    /// 创建帧，所有局部槽初始化为 `init`
    pub fn new(
        max_locals: usize,
        max_stack: Option<usize>,
        init: V,
    ) -> Self {
        Self {
            locals: vec![init; max_locals],
            stack: Vec::new(),
            max_stack,
        }
    }

    pub fn locals(&self) -> &[V] {
        &self.locals
    }

    pub fn stack(&self) -> &[V] {
        &self.stack
    }

    #[inline]
    pub fn stack_height(&self) -> usize {
        self.stack.len()
    }

    pub fn local(
        &self,
        slot: usize,
    ) -> Result<&V, FrameError> {
        self.locals.get(slot).ok_or(FrameError::LocalOutOfRange {
            slot,
            max_locals: self.locals.len(),
        })
    }

    pub fn set_local(
        &mut self,
        slot: usize,
        value: V,
    ) -> Result<(), FrameError> {
        let max_locals = self.locals.len();
        let entry = self
            .locals
            .get_mut(slot)
            .ok_or(FrameError::LocalOutOfRange { slot, max_locals })?;
        *entry = value;
        Ok(())
    }

    pub fn push(
        &mut self,
        value: V,
    ) -> Result<(), FrameError> {
        if let Some(max) = self.max_stack {
            if self.stack.len() >= max {
                return Err(FrameError::StackOverflow { max });
            }
        }
        self.stack.push(value);
        Ok(())
    }

    pub fn pop(&mut self) -> Result<V, FrameError> {
        self.stack.pop().ok_or(FrameError::StackUnderflow)
    }

    /// 弹出 `n` 个值，按入栈顺序返回
    pub fn pop_n(
        &mut self,
        n: usize,
    ) -> Result<SmallVec<[V; 4]>, FrameError> {
        if self.stack.len() < n {
            return Err(FrameError::StackUnderflow);
        }
        let at = self.stack.len() - n;
        Ok(self.stack.drain(at..).collect())
    }

    pub fn peek(&self) -> Result<&V, FrameError> {
        self.stack.last().ok_or(FrameError::StackUnderflow)
    }

    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }

    /// 所有局部槽与栈条目
    pub fn values_mut(&mut self) -> impl Iterator<Item = &mut V> {
        self.locals.iter_mut().chain(self.stack.iter_mut())
    }

    /// 逐槽合并 `other`，返回本帧是否发生变化
    pub fn merge_from(
        &mut self,
        other: &Frame<V>,
    ) -> Result<bool, FrameError> {
        if self.stack.len() != other.stack.len() {
            return Err(FrameError::HeightMismatch {
                left: self.stack.len(),
                right: other.stack.len(),
            });
        }

        let mut changed = false;
        let pairs = self
            .locals
            .iter_mut()
            .zip(other.locals.iter())
            .chain(self.stack.iter_mut().zip(other.stack.iter()));
        for (mine, theirs) in pairs {
            let merged = mine.merge(theirs);
            if merged != *mine {
                *mine = merged;
                changed = true;
            }
        }
        Ok(changed)
    }
}
