//! 池化资源回收检查
//!
//! 从对象池获取的资源句柄（TypedArray、MotionEvent、Parcel 等）必须在不可达前
//! 调用 `recycle()` 归还。检查分为：
//!
//! - [`lattice`] - 所有权格 `Unknown < Tracked < Released`
//! - [`tracker`] - 转移函数（[`Interpreter`](crate::middle::passes::flow::Interpreter) 实现）
//! - [`verdict`] - 泄漏 / 逃逸判定
//! - [`resource`] - 资源种类表
//! - [`coordinator`] - 两遍扫描的阶段协调器
//! - [`driver`] - 单元驱动

pub mod coordinator;
pub mod driver;
pub mod error;
pub mod lattice;
pub mod resource;
pub mod tracker;
pub mod verdict;

pub use coordinator::{CategoryFlags, CheckOptions, Phase, RecycleChecker, UnitContext};
pub use driver::{UnitDriver, UnitReport};
pub use error::FindingKind;
pub use lattice::Ownership;
pub use resource::{CallPattern, CallRole, KindId, ReleaseCall, ResourceKind, ResourceTable};
pub use tracker::RecycleTracker;
pub use verdict::{check_method_flow, FlowReport, Verdict};
