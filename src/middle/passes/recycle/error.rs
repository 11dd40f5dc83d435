//! 回收检查发现类型

use crate::util::diagnostic::{DiagnosticBuilder, ErrorCodeDefinition};
use std::fmt;

/// 发现类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FindingKind {
    /// 实例既未回收也未逃逸 (R0001)
    Leaked,
    /// 回收后仍被使用 (R0002)
    AlreadyRecycled,
}

impl FindingKind {
    pub fn code(&self) -> &'static str {
        match self {
            FindingKind::Leaked => "R0001",
            FindingKind::AlreadyRecycled => "R0002",
        }
    }

    /// 以资源简单类名填充消息模板
    pub fn builder(
        &self,
        resource: &str,
    ) -> DiagnosticBuilder {
        match self {
            FindingKind::Leaked => ErrorCodeDefinition::resource_leaked(resource),
            FindingKind::AlreadyRecycled => ErrorCodeDefinition::already_recycled(resource),
        }
    }
}

impl fmt::Display for FindingKind {
    fn fmt(
        &self,
        f: &mut fmt::Formatter<'_>,
    ) -> fmt::Result {
        match self {
            FindingKind::Leaked => write!(f, "leaked"),
            FindingKind::AlreadyRecycled => write!(f, "already recycled"),
        }
    }
}
