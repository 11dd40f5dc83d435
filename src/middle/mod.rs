//! Instruction graph and analysis passes
//!
//! `core` holds the compiled-method model; `passes` holds the generic
//! data-flow analyzer and the recycle check built on it.

pub mod core;
pub mod passes;

pub use self::core::{ClassUnit, Instruction, Method};
