//! Instruction graph for compiled method bodies
//!
//! A stack-machine view of one class file: every method is an ordered list of
//! [`Instruction`]s plus a local-slot count and an exception handler table.
//! Control flow is implicit in the instructions (fall-through, jumps, switch
//! targets) and in the handler ranges.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};
use std::fmt;

/// Index of an instruction inside its method
pub type InstrIndex = usize;

/// How a call is dispatched
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvokeKind {
    Static,
    Virtual,
    Special,
    Interface,
}

impl InvokeKind {
    /// Whether the call pops a receiver in addition to its declared parameters
    #[inline]
    pub fn has_receiver(&self) -> bool {
        !matches!(self, InvokeKind::Static)
    }

    /// Virtual and interface calls go through dynamic dispatch
    #[inline]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, InvokeKind::Virtual | InvokeKind::Interface)
    }
}

/// Callee identity of an invoke instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CallSite {
    pub kind: InvokeKind,
    /// Internal name of the owner type, e.g. `android/os/Parcel`
    pub owner: String,
    pub name: String,
    /// Method descriptor, e.g. `()Landroid/os/Parcel;`
    pub desc: String,
}

impl CallSite {
    pub fn new(
        kind: InvokeKind,
        owner: impl Into<String>,
        name: impl Into<String>,
        desc: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            owner: owner.into(),
            name: name.into(),
            desc: desc.into(),
        }
    }

    /// Number of declared parameters, `None` if the descriptor is malformed
    pub fn param_count(&self) -> Option<usize> {
        descriptor_param_count(&self.desc)
    }

    /// Number of stack values the call pops (parameters plus receiver)
    pub fn arg_count(&self) -> Option<usize> {
        let receiver = usize::from(self.kind.has_receiver());
        self.param_count().map(|n| n + receiver)
    }

    /// Whether the call pushes a result
    pub fn returns_value(&self) -> bool {
        !self.desc.ends_with(")V")
    }
}

impl fmt::Display for CallSite {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        write!(f, "{}.{}{}", self.owner, self.name, self.desc)
    }
}

/// Counts the parameters of a method descriptor such as `(I[JLjava/lang/String;)V`.
///
/// Every parameter occupies one operand-stack value in this model, wide
/// primitives included.
pub fn descriptor_param_count(desc: &str) -> Option<usize> {
    let params = desc.strip_prefix('(')?;
    let close = params.find(')')?;
    let mut chars = params[..close].chars();
    let mut count = 0;

    while let Some(c) = chars.next() {
        let mut c = c;
        while c == '[' {
            c = chars.next()?;
        }
        match c {
            'B' | 'C' | 'D' | 'F' | 'I' | 'J' | 'S' | 'Z' => {}
            'L' => {
                // 读到 ';' 为止
                if !chars.by_ref().any(|c| c == ';') {
                    return None;
                }
            }
            _ => return None,
        }
        count += 1;
    }

    Some(count)
}

/// Field reference used by field loads and stores
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldRef {
    pub owner: String,
    pub name: String,
    pub desc: String,
}

impl FieldRef {
    pub fn new(
        owner: impl Into<String>,
        name: impl Into<String>,
        desc: impl Into<String>,
    ) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            desc: desc.into(),
        }
    }
}

/// Constant pushed by [`Instruction::Const`]
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConstValue {
    Null,
    Int(i64),
    String(String),
    Class(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryOp {
    Neg,
    Convert,
    ArrayLength,
    InstanceOf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    Cmp,
}

/// Instruction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Instruction {
    Nop,
    Const(ConstValue),
    /// Push the value of a local slot
    Load(usize),
    /// Pop into a local slot
    Store(usize),
    Dup,
    Pop,
    Swap,
    /// Allocate an object of the named type
    New(String),
    CheckCast(String),
    GetField {
        field: FieldRef,
        #[serde(default)]
        is_static: bool,
    },
    PutField {
        field: FieldRef,
        #[serde(default)]
        is_static: bool,
    },
    /// `array, index -> value`
    ArrayLoad,
    /// `array, index, value ->`
    ArrayStore,
    Unary(UnaryOp),
    Binary(BinaryOp),
    Invoke(CallSite),
    Goto(InstrIndex),
    /// Conditional jump on one operand (null / zero tests)
    If {
        target: InstrIndex,
    },
    /// Conditional jump comparing two operands
    IfCmp {
        target: InstrIndex,
    },
    Switch {
        targets: Vec<InstrIndex>,
        default: InstrIndex,
    },
    Return,
    ReturnValue,
    Throw,
}

impl Instruction {
    /// Whether execution can continue with the next instruction
    pub fn falls_through(&self) -> bool {
        !matches!(
            self,
            Instruction::Goto(_)
                | Instruction::Switch { .. }
                | Instruction::Return
                | Instruction::ReturnValue
                | Instruction::Throw
        )
    }

    /// Call site, if this is an invoke instruction
    pub fn as_call(&self) -> Option<&CallSite> {
        match self {
            Instruction::Invoke(call) => Some(call),
            _ => None,
        }
    }
}

/// Exception handler entry: instructions in `start..end` may transfer to `handler`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExceptionHandler {
    pub start: InstrIndex,
    pub end: InstrIndex,
    pub handler: InstrIndex,
    /// Caught type, `None` for catch-all (`finally`)
    #[serde(default)]
    pub catch_type: Option<String>,
}

impl ExceptionHandler {
    #[inline]
    pub fn covers(
        &self,
        index: InstrIndex,
    ) -> bool {
        self.start <= index && index < self.end
    }
}

/// Method body
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Method {
    pub name: String,
    pub desc: String,
    #[serde(default)]
    pub is_static: bool,
    /// Declared number of local slots (receiver and parameters included)
    pub max_locals: usize,
    /// Declared operand-stack limit, unchecked when absent
    #[serde(default)]
    pub max_stack: Option<usize>,
    pub instructions: Vec<Instruction>,
    #[serde(default)]
    pub handlers: Vec<ExceptionHandler>,
    /// Source line per instruction (may be shorter than `instructions`)
    #[serde(default)]
    pub lines: Vec<Option<u32>>,
}

impl Method {
    /// Source line of an instruction, if recorded
    pub fn line_at(
        &self,
        index: InstrIndex,
    ) -> Option<u32> {
        self.lines.get(index).copied().flatten()
    }

    /// Iterate over every call instruction with its index
    pub fn calls(&self) -> impl Iterator<Item = (InstrIndex, &CallSite)> {
        self.instructions
            .iter()
            .enumerate()
            .filter_map(|(index, instr)| instr.as_call().map(|call| (index, call)))
    }

    /// Normal-flow successors of an instruction.
    ///
    /// Indices are not range-checked; a fall-through successor may equal
    /// `instructions.len()`.
    pub fn successors(
        &self,
        index: InstrIndex,
    ) -> SmallVec<[InstrIndex; 2]> {
        let Some(instr) = self.instructions.get(index) else {
            return SmallVec::new();
        };
        match instr {
            Instruction::Goto(target) => smallvec![*target],
            Instruction::If { target } | Instruction::IfCmp { target } => {
                smallvec![index + 1, *target]
            }
            Instruction::Switch { targets, default } => {
                let mut succs: SmallVec<[InstrIndex; 2]> = smallvec![*default];
                for target in targets {
                    if !succs.contains(target) {
                        succs.push(*target);
                    }
                }
                succs
            }
            Instruction::Return | Instruction::ReturnValue | Instruction::Throw => SmallVec::new(),
            _ => smallvec![index + 1],
        }
    }

    /// Handlers whose protected range covers the instruction
    pub fn handlers_covering(
        &self,
        index: InstrIndex,
    ) -> impl Iterator<Item = &ExceptionHandler> {
        self.handlers.iter().filter(move |h| h.covers(index))
    }
}

/// One compilation unit (a class file)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassUnit {
    /// Internal class name, e.g. `com/example/TouchView`
    pub name: String,
    #[serde(default)]
    pub source_file: Option<String>,
    #[serde(default)]
    pub methods: Vec<Method>,
}

impl ClassUnit {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_file: None,
            methods: Vec::new(),
        }
    }

    pub fn with_source_file(
        mut self,
        source_file: impl Into<String>,
    ) -> Self {
        self.source_file = Some(source_file.into());
        self
    }

    pub fn with_method(
        mut self,
        method: Method,
    ) -> Self {
        self.methods.push(method);
        self
    }
}
