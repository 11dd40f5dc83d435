//! Method builder
//!
//! 以标签方式组装方法体，跳转目标在 `build` 时统一回填。

use super::ir::{
    BinaryOp, CallSite, ConstValue, ExceptionHandler, FieldRef, InstrIndex, Instruction,
    InvokeKind, Method, UnaryOp,
};
use std::collections::HashMap;

/// 跳转标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Label(usize);

/// 待回填的跳转位置
#[derive(Debug, Clone)]
enum Patch {
    Goto(InstrIndex, Label),
    If(InstrIndex, Label),
    IfCmp(InstrIndex, Label),
    Switch(InstrIndex, Vec<Label>, Label),
}

/// 未声明处理器区间
#[derive(Debug, Clone)]
struct PendingHandler {
    start: Label,
    end: Label,
    handler: Label,
    catch_type: Option<String>,
}

/// 方法构建器
///
/// 未绑定的标签回填为 `usize::MAX`，由分析器报告越界。
#[derive(Debug, Clone)]
pub struct MethodBuilder {
    name: String,
    desc: String,
    is_static: bool,
    max_locals: usize,
    max_stack: Option<usize>,
    instructions: Vec<Instruction>,
    lines: Vec<Option<u32>>,
    current_line: Option<u32>,
    next_label: usize,
    bound: HashMap<Label, InstrIndex>,
    patches: Vec<Patch>,
    handlers: Vec<PendingHandler>,
}

impl MethodBuilder {
    pub fn new(
        name: impl Into<String>,
        desc: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            desc: desc.into(),
            is_static: false,
            max_locals: 1,
            max_stack: None,
            instructions: Vec::new(),
            lines: Vec::new(),
            current_line: None,
            next_label: 0,
            bound: HashMap::new(),
            patches: Vec::new(),
            handlers: Vec::new(),
        }
    }

    pub fn static_method(mut self) -> Self {
        self.is_static = true;
        self
    }

    pub fn locals(
        mut self,
        max_locals: usize,
    ) -> Self {
        self.max_locals = max_locals;
        self
    }

    pub fn max_stack(
        mut self,
        max_stack: usize,
    ) -> Self {
        self.max_stack = Some(max_stack);
        self
    }

    /// 后续指令的源码行号
    pub fn line(
        mut self,
        line: u32,
    ) -> Self {
        self.current_line = Some(line);
        self
    }

    /// 下一条指令的索引
    pub fn position(&self) -> InstrIndex {
        self.instructions.len()
    }

    pub fn new_label(&mut self) -> Label {
        let label = Label(self.next_label);
        self.next_label += 1;
        label
    }

    /// 将标签绑定到下一条指令
    pub fn mark(
        mut self,
        label: Label,
    ) -> Self {
        self.bound.insert(label, self.instructions.len());
        self
    }

    pub fn instr(
        mut self,
        instr: Instruction,
    ) -> Self {
        self.instructions.push(instr);
        self.lines.push(self.current_line);
        self
    }

    pub fn nop(self) -> Self {
        self.instr(Instruction::Nop)
    }

    pub fn const_null(self) -> Self {
        self.instr(Instruction::Const(ConstValue::Null))
    }

    pub fn const_int(
        self,
        value: i64,
    ) -> Self {
        self.instr(Instruction::Const(ConstValue::Int(value)))
    }

    pub fn const_str(
        self,
        value: impl Into<String>,
    ) -> Self {
        self.instr(Instruction::Const(ConstValue::String(value.into())))
    }

    pub fn load(
        self,
        slot: usize,
    ) -> Self {
        self.instr(Instruction::Load(slot))
    }

    pub fn store(
        self,
        slot: usize,
    ) -> Self {
        self.instr(Instruction::Store(slot))
    }

    pub fn dup(self) -> Self {
        self.instr(Instruction::Dup)
    }

    pub fn pop(self) -> Self {
        self.instr(Instruction::Pop)
    }

    pub fn swap(self) -> Self {
        self.instr(Instruction::Swap)
    }

    pub fn new_object(
        self,
        ty: impl Into<String>,
    ) -> Self {
        self.instr(Instruction::New(ty.into()))
    }

    pub fn check_cast(
        self,
        ty: impl Into<String>,
    ) -> Self {
        self.instr(Instruction::CheckCast(ty.into()))
    }

    pub fn get_field(
        self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Self {
        self.instr(Instruction::GetField {
            field: FieldRef::new(owner, name, desc),
            is_static: false,
        })
    }

    pub fn get_static(
        self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Self {
        self.instr(Instruction::GetField {
            field: FieldRef::new(owner, name, desc),
            is_static: true,
        })
    }

    pub fn put_field(
        self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Self {
        self.instr(Instruction::PutField {
            field: FieldRef::new(owner, name, desc),
            is_static: false,
        })
    }

    pub fn put_static(
        self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Self {
        self.instr(Instruction::PutField {
            field: FieldRef::new(owner, name, desc),
            is_static: true,
        })
    }

    pub fn array_load(self) -> Self {
        self.instr(Instruction::ArrayLoad)
    }

    pub fn array_store(self) -> Self {
        self.instr(Instruction::ArrayStore)
    }

    pub fn unary(
        self,
        op: UnaryOp,
    ) -> Self {
        self.instr(Instruction::Unary(op))
    }

    pub fn binary(
        self,
        op: BinaryOp,
    ) -> Self {
        self.instr(Instruction::Binary(op))
    }

    pub fn invoke(
        self,
        kind: InvokeKind,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Self {
        self.instr(Instruction::Invoke(CallSite::new(kind, owner, name, desc)))
    }

    pub fn invoke_static(
        self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Self {
        self.invoke(InvokeKind::Static, owner, name, desc)
    }

    pub fn invoke_virtual(
        self,
        owner: &str,
        name: &str,
        desc: &str,
    ) -> Self {
        self.invoke(InvokeKind::Virtual, owner, name, desc)
    }

    pub fn goto(
        mut self,
        label: Label,
    ) -> Self {
        self.patches.push(Patch::Goto(self.instructions.len(), label));
        self.instr(Instruction::Goto(usize::MAX))
    }

    /// 单操作数条件跳转（判空 / 判零）
    pub fn if_zero(
        mut self,
        label: Label,
    ) -> Self {
        self.patches.push(Patch::If(self.instructions.len(), label));
        self.instr(Instruction::If { target: usize::MAX })
    }

    /// 双操作数比较跳转
    pub fn if_cmp(
        mut self,
        label: Label,
    ) -> Self {
        self.patches.push(Patch::IfCmp(self.instructions.len(), label));
        self.instr(Instruction::IfCmp { target: usize::MAX })
    }

    pub fn switch(
        mut self,
        targets: &[Label],
        default: Label,
    ) -> Self {
        self.patches.push(Patch::Switch(
            self.instructions.len(),
            targets.to_vec(),
            default,
        ));
        self.instr(Instruction::Switch {
            targets: vec![usize::MAX; targets.len()],
            default: usize::MAX,
        })
    }

    pub fn ret(self) -> Self {
        self.instr(Instruction::Return)
    }

    pub fn ret_value(self) -> Self {
        self.instr(Instruction::ReturnValue)
    }

    pub fn throw(self) -> Self {
        self.instr(Instruction::Throw)
    }

    /// 声明异常处理区间 `[start, end)`，跳转到 `handler`
    pub fn try_catch(
        mut self,
        start: Label,
        end: Label,
        handler: Label,
        catch_type: Option<&str>,
    ) -> Self {
        self.handlers.push(PendingHandler {
            start,
            end,
            handler,
            catch_type: catch_type.map(str::to_string),
        });
        self
    }

    fn resolve(
        &self,
        label: Label,
    ) -> InstrIndex {
        self.bound.get(&label).copied().unwrap_or(usize::MAX)
    }

    /// 回填跳转并生成方法
    pub fn build(mut self) -> Method {
        let patches = std::mem::take(&mut self.patches);
        for patch in patches {
            match patch {
                Patch::Goto(at, label) => {
                    self.instructions[at] = Instruction::Goto(self.resolve(label));
                }
                Patch::If(at, label) => {
                    self.instructions[at] = Instruction::If {
                        target: self.resolve(label),
                    };
                }
                Patch::IfCmp(at, label) => {
                    self.instructions[at] = Instruction::IfCmp {
                        target: self.resolve(label),
                    };
                }
                Patch::Switch(at, targets, default) => {
                    self.instructions[at] = Instruction::Switch {
                        targets: targets.iter().map(|l| self.resolve(*l)).collect(),
                        default: self.resolve(default),
                    };
                }
            }
        }

        let handlers = self
            .handlers
            .iter()
            .map(|h| ExceptionHandler {
                start: self.resolve(h.start),
                end: self.resolve(h.end),
                handler: self.resolve(h.handler),
                catch_type: h.catch_type.clone(),
            })
            .collect();

        Method {
            name: self.name,
            desc: self.desc,
            is_static: self.is_static,
            max_locals: self.max_locals,
            max_stack: self.max_stack,
            instructions: self.instructions,
            handlers,
            lines: self.lines,
        }
    }
}
