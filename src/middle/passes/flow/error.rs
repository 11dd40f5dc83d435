//! 数据流分析错误类型

use crate::middle::core::ir::InstrIndex;
use thiserror::Error;

/// 帧操作错误
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// 操作数栈下溢
    #[error("operand stack underflow")]
    StackUnderflow,

    /// 超出声明的最大栈深度
    #[error("operand stack overflow (max {max})")]
    StackOverflow { max: usize },

    /// 局部槽越界
    #[error("local slot {slot} out of range (max_locals {max_locals})")]
    LocalOutOfRange { slot: usize, max_locals: usize },

    /// 汇合点栈高度不一致
    #[error("inconsistent stack height at join ({left} vs {right})")]
    HeightMismatch { left: usize, right: usize },
}

/// 分析中止原因
///
/// 中止只意味着漏报，调用方记录后跳过该位置。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FlowError {
    /// 方法没有指令
    #[error("method has no instructions")]
    EmptyMethod,

    /// 帧操作失败
    #[error("at instruction {at}: {source}")]
    Frame {
        at: InstrIndex,
        #[source]
        source: FrameError,
    },

    /// 跳转目标越界
    #[error("branch at {at} targets {target}, outside the method")]
    BranchOutOfRange { at: InstrIndex, target: InstrIndex },

    /// 声明的局部槽数或栈深度超出上限
    #[error("declared frame size out of range (max_locals {max_locals}, max_stack {max_stack:?}, limit {limit})")]
    FrameTooLarge {
        max_locals: usize,
        max_stack: Option<usize>,
        limit: usize,
    },

    /// 执行越过最后一条指令
    #[error("execution falls off the end after instruction {at}")]
    FallOffEnd { at: InstrIndex },

    /// 异常处理区间非法
    #[error("malformed exception handler {start}..{end} -> {handler}")]
    MalformedHandler {
        start: InstrIndex,
        end: InstrIndex,
        handler: InstrIndex,
    },

    /// 调用描述符无法解析
    #[error("malformed descriptor `{desc}` at instruction {at}")]
    MalformedDescriptor { at: InstrIndex, desc: String },
}

impl FlowError {
    pub(crate) fn frame(
        at: InstrIndex,
        source: FrameError,
    ) -> Self {
        FlowError::Frame { at, source }
    }
}

/// 数据流分析结果
pub type FlowResult<T> = Result<T, FlowError>;
