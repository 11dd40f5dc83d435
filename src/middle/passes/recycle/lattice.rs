//! 所有权格
//!
//! `Unknown < Tracked < Released`，汇合时取较高者。

use crate::middle::passes::flow::Lattice;
use std::fmt;

/// 被追踪实例在某个槽中的状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum Ownership {
    /// 与被追踪实例无关
    #[default]
    Unknown,
    /// 持有未回收的实例
    Tracked,
    /// 持有已回收的实例
    Released,
}

impl Ownership {
    /// 是否指向被追踪实例（无论是否已回收）
    #[inline]
    pub fn is_instance(&self) -> bool {
        !matches!(self, Ownership::Unknown)
    }
}

impl Lattice for Ownership {
    fn merge(
        &self,
        other: &Self,
    ) -> Self {
        (*self).max(*other)
    }
}

impl fmt::Display for Ownership {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        let name = match self {
            Ownership::Unknown => "unknown",
            Ownership::Tracked => "tracked",
            Ownership::Released => "released",
        };
        write!(f, "{}", name)
    }
}
