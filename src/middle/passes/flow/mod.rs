//! 不动点数据流分析器
//!
//! 对单个方法做经典工作表迭代：取出指令、复制其入口帧、经解释器执行、
//! 将结果合并进所有后继（含异常处理器入口），帧发生变化则重新入队，
//! 直到工作表为空。
//!
//! 分析器本身不了解任何资源语义，转移函数全部由 [`Interpreter`] 提供。

pub mod error;
pub mod frame;

pub use error::{FlowError, FlowResult, FrameError};
pub use frame::{Frame, Lattice};

use crate::middle::core::ir::{CallSite, InstrIndex, Instruction, Method};
use std::collections::VecDeque;
use tracing::trace;

/// 转移函数表
///
/// 栈与局部槽的搬运由分析器完成，解释器只决定新值从何而来、
/// 以及值流出方法（写入堆、返回）时的效果。
pub trait Interpreter {
    type Value: Lattice;

    /// 入口局部槽与异常对象的初始值
    fn new_value(&self) -> Self::Value;

    /// 常量、分配、读字段、读数组、算术等产生的新值
    fn fresh(
        &mut self,
        at: InstrIndex,
        instr: &Instruction,
    ) -> Self::Value;

    /// 值被写入字段或数组
    fn store_heap(
        &mut self,
        at: InstrIndex,
        instr: &Instruction,
        value: &Self::Value,
    );

    /// 方法调用；`args` 按入栈顺序排列（接收者在前），`frame` 已弹出参数。
    ///
    /// 返回值仅在调用有返回值时入栈。
    fn call(
        &mut self,
        at: InstrIndex,
        call: &CallSite,
        args: &[Self::Value],
        frame: &mut Frame<Self::Value>,
    ) -> Self::Value;

    /// 值作为方法返回值流出
    fn ret(
        &mut self,
        at: InstrIndex,
        value: &Self::Value,
    );
}

/// 每条指令执行前的帧，`None` 表示不可达
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTable<V>(Vec<Option<Frame<V>>>);

impl<V> FrameTable<V> {
    pub fn get(
        &self,
        index: InstrIndex,
    ) -> Option<&Frame<V>> {
        self.0.get(index).and_then(Option::as_ref)
    }

    pub fn is_reachable(
        &self,
        index: InstrIndex,
    ) -> bool {
        self.get(index).is_some()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (InstrIndex, Option<&Frame<V>>)> {
        self.0.iter().enumerate().map(|(i, f)| (i, f.as_ref()))
    }
}

/// 分析结果
#[derive(Debug)]
pub struct FlowAnalysis<I: Interpreter> {
    pub frames: FrameTable<I::Value>,
    /// 解释器在分析过程中记录的信息
    pub interpreter: I,
    /// 工作表出队次数
    pub steps: usize,
}

/// 不动点分析器
#[derive(Debug)]
pub struct FlowAnalyzer<I: Interpreter> {
    interpreter: I,
}

impl<I: Interpreter> FlowAnalyzer<I> {
    pub fn new(interpreter: I) -> Self {
        Self { interpreter }
    }

    /// 分析方法直到收敛
    pub fn analyze(
        mut self,
        method: &Method,
    ) -> FlowResult<FlowAnalysis<I>> {
        let len = method.instructions.len();
        if len == 0 {
            return Err(FlowError::EmptyMethod);
        }
        validate(method)?;

        let mut frames: Vec<Option<Frame<I::Value>>> = vec![None; len];
        let mut queued = vec![false; len];
        let mut worklist = VecDeque::new();

        frames[0] = Some(Frame::new(
            method.max_locals,
            method.max_stack,
            self.interpreter.new_value(),
        ));
        worklist.push_back(0);
        queued[0] = true;

        let mut steps = 0;
        while let Some(index) = worklist.pop_front() {
            queued[index] = false;
            steps += 1;

            let Some(before) = frames[index].clone() else {
                continue;
            };
            let instr = &method.instructions[index];

            // 异常边：处理器入口接收执行前的局部槽，栈上只有异常对象
            for handler in method.handlers_covering(index) {
                let mut entry = before.clone();
                entry.clear_stack();
                entry
                    .push(self.interpreter.new_value())
                    .map_err(|e| FlowError::frame(handler.handler, e))?;
                propagate(
                    &mut frames,
                    &mut queued,
                    &mut worklist,
                    handler.handler,
                    entry,
                )?;
            }

            let mut after = before;
            execute(&mut self.interpreter, index, instr, &mut after)?;

            for succ in method.successors(index) {
                if succ >= len {
                    return Err(FlowError::FallOffEnd { at: index });
                }
                propagate(
                    &mut frames,
                    &mut queued,
                    &mut worklist,
                    succ,
                    after.clone(),
                )?;
            }

            trace!(
                "flow step {} at {} ({:?}), {} queued",
                steps,
                index,
                instr,
                worklist.len()
            );
        }

        Ok(FlowAnalysis {
            frames: FrameTable(frames),
            interpreter: self.interpreter,
            steps,
        })
    }
}

/// 局部槽数与栈深度的上限，同 JVM 的 u2 字段
pub const MAX_FRAME_SLOTS: usize = u16::MAX as usize;

/// 检查帧大小、跳转目标与异常处理区间
fn validate(method: &Method) -> FlowResult<()> {
    let len = method.instructions.len();

    if method.max_locals > MAX_FRAME_SLOTS
        || method.max_stack.is_some_and(|max| max > MAX_FRAME_SLOTS)
    {
        return Err(FlowError::FrameTooLarge {
            max_locals: method.max_locals,
            max_stack: method.max_stack,
            limit: MAX_FRAME_SLOTS,
        });
    }

    for (at, instr) in method.instructions.iter().enumerate() {
        let check = |target: InstrIndex| {
            if target >= len {
                Err(FlowError::BranchOutOfRange { at, target })
            } else {
                Ok(())
            }
        };
        match instr {
            Instruction::Goto(target)
            | Instruction::If { target }
            | Instruction::IfCmp { target } => check(*target)?,
            Instruction::Switch { targets, default } => {
                check(*default)?;
                for target in targets {
                    check(*target)?;
                }
            }
            _ => {}
        }
    }

    for h in &method.handlers {
        if h.start >= h.end || h.end > len || h.handler >= len {
            return Err(FlowError::MalformedHandler {
                start: h.start,
                end: h.end,
                handler: h.handler,
            });
        }
    }

    Ok(())
}

/// 将帧合并进目标位置，变化时入队
fn propagate<V: Lattice>(
    frames: &mut [Option<Frame<V>>],
    queued: &mut [bool],
    worklist: &mut VecDeque<InstrIndex>,
    target: InstrIndex,
    frame: Frame<V>,
) -> FlowResult<()> {
    let changed = if let Some(existing) = frames[target].as_mut() {
        existing
            .merge_from(&frame)
            .map_err(|e| FlowError::frame(target, e))?
    } else {
        frames[target] = Some(frame);
        true
    };

    if changed && !queued[target] {
        queued[target] = true;
        worklist.push_back(target);
    }
    Ok(())
}

/// 执行单条指令
fn execute<I: Interpreter>(
    interp: &mut I,
    at: InstrIndex,
    instr: &Instruction,
    frame: &mut Frame<I::Value>,
) -> FlowResult<()> {
    let err = |e| FlowError::frame(at, e);

    match instr {
        Instruction::Nop | Instruction::Goto(_) | Instruction::Return => {}
        Instruction::Const(_) | Instruction::New(_) => {
            let value = interp.fresh(at, instr);
            frame.push(value).map_err(err)?;
        }
        Instruction::Load(slot) => {
            let value = frame.local(*slot).map_err(err)?.clone();
            frame.push(value).map_err(err)?;
        }
        Instruction::Store(slot) => {
            let value = frame.pop().map_err(err)?;
            frame.set_local(*slot, value).map_err(err)?;
        }
        Instruction::Dup => {
            let value = frame.peek().map_err(err)?.clone();
            frame.push(value).map_err(err)?;
        }
        Instruction::Pop | Instruction::If { .. } | Instruction::Switch { .. } | Instruction::Throw => {
            frame.pop().map_err(err)?;
        }
        Instruction::IfCmp { .. } => {
            frame.pop_n(2).map_err(err)?;
        }
        Instruction::Swap => {
            let top = frame.pop().map_err(err)?;
            let below = frame.pop().map_err(err)?;
            frame.push(top).map_err(err)?;
            frame.push(below).map_err(err)?;
        }
        Instruction::CheckCast(_) => {
            frame.peek().map_err(err)?;
        }
        Instruction::GetField { is_static, .. } => {
            if !is_static {
                frame.pop().map_err(err)?;
            }
            let value = interp.fresh(at, instr);
            frame.push(value).map_err(err)?;
        }
        Instruction::PutField { is_static, .. } => {
            let value = frame.pop().map_err(err)?;
            if !is_static {
                frame.pop().map_err(err)?;
            }
            interp.store_heap(at, instr, &value);
        }
        Instruction::ArrayLoad | Instruction::Binary(_) => {
            frame.pop_n(2).map_err(err)?;
            let value = interp.fresh(at, instr);
            frame.push(value).map_err(err)?;
        }
        Instruction::ArrayStore => {
            let value = frame.pop().map_err(err)?;
            frame.pop_n(2).map_err(err)?;
            interp.store_heap(at, instr, &value);
        }
        Instruction::Unary(_) => {
            frame.pop().map_err(err)?;
            let value = interp.fresh(at, instr);
            frame.push(value).map_err(err)?;
        }
        Instruction::Invoke(call) => {
            let count = call.arg_count().ok_or_else(|| FlowError::MalformedDescriptor {
                at,
                desc: call.desc.clone(),
            })?;
            let args = frame.pop_n(count).map_err(err)?;
            let result = interp.call(at, call, &args, frame);
            if call.returns_value() {
                frame.push(result).map_err(err)?;
            }
        }
        Instruction::ReturnValue => {
            let value = frame.pop().map_err(err)?;
            interp.ret(at, &value);
        }
    }

    Ok(())
}
