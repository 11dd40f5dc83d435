//! 核心中间表示
//!
//! 已编译方法体的指令图、构建器与加载器。其余 middle 层模块都依赖于此。

pub mod builder;
pub mod ir;
pub mod loader;

pub use builder::{Label, MethodBuilder};
pub use ir::*;
pub use loader::{collect_unit_paths, load_unit, LoadError};
