//! 分析阶段
//!
//! 包含中间层的各个分析阶段。

pub mod flow;
pub mod recycle;
