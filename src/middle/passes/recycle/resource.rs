//! 资源种类表
//!
//! 描述哪些调用获取池化资源、哪些调用将其归还，以及哪些静态调用
//! 接收实例后不视为逃逸。

use crate::middle::core::ir::{CallSite, InvokeKind};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

/// 资源种类在表中的下标
pub type KindId = usize;

const RECYCLE: &str = "recycle";
const RECYCLE_DESC: &str = "()V";

const TYPED_ARRAY_CLS: &str = "android/content/res/TypedArray";
const VELOCITY_TRACKER_CLS: &str = "android/view/VelocityTracker";
const MESSAGE_CLS: &str = "android/os/Message";
const MOTION_EVENT_CLS: &str = "android/view/MotionEvent";
const PARCEL_CLS: &str = "android/os/Parcel";
const CONTEXT_CLS: &str = "android/content/Context";
const RESOURCES_CLS: &str = "android/content/res/Resources";
const HANDLER_CLS: &str = "android/os/Handler";

const TYPED_ARRAY_SIG: &str = "Landroid/content/res/TypedArray;";
const MESSAGE_SIG: &str = "Landroid/os/Message;";

/// 调用匹配模式
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallPattern {
    pub owner: String,
    pub name: String,
    /// 描述符后缀，`None` 表示不限
    #[serde(default)]
    pub desc_suffix: Option<String>,
}

impl CallPattern {
    pub fn new(
        owner: &str,
        name: &str,
        desc_suffix: Option<&str>,
    ) -> Self {
        Self {
            owner: owner.to_string(),
            name: name.to_string(),
            desc_suffix: desc_suffix.map(str::to_string),
        }
    }

    pub fn matches(
        &self,
        call: &CallSite,
    ) -> bool {
        call.owner == self.owner
            && call.name == self.name
            && self
                .desc_suffix
                .as_deref()
                .is_none_or(|suffix| call.desc.ends_with(suffix))
    }
}

fn default_release_name() -> String {
    RECYCLE.to_string()
}

fn default_release_desc() -> String {
    RECYCLE_DESC.to_string()
}

fn default_true() -> bool {
    true
}

/// 归还调用（方法名与描述符，所有者取种类的 owner）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseCall {
    #[serde(default = "default_release_name")]
    pub name: String,
    #[serde(default = "default_release_desc")]
    pub desc: String,
}

impl Default for ReleaseCall {
    fn default() -> Self {
        Self {
            name: default_release_name(),
            desc: default_release_desc(),
        }
    }
}

/// 资源种类
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKind {
    /// 展示名，如 `TypedArray`
    pub name: String,
    /// 归还调用所在类型
    pub owner: String,
    pub obtain: Vec<CallPattern>,
    #[serde(default)]
    pub release: ReleaseCall,
    /// 是否做方法内数据流检查；否则只参与粗粒度检查
    #[serde(default = "default_true")]
    pub flow_checked: bool,
    /// 接收实例而不视为逃逸的静态调用
    #[serde(default)]
    pub preserving: Vec<CallPattern>,
}

impl ResourceKind {
    /// owner 的简单类名
    pub fn simple_name(&self) -> &str {
        self.owner.rsplit('/').next().unwrap_or(&self.owner)
    }

    pub fn is_obtain(
        &self,
        call: &CallSite,
    ) -> bool {
        self.obtain.iter().any(|p| p.matches(call))
    }

    /// 名称、描述符、所有者均匹配归还调用（不检查分派方式）
    pub fn is_release(
        &self,
        call: &CallSite,
    ) -> bool {
        call.owner == self.owner && call.name == self.release.name && call.desc == self.release.desc
    }

    pub fn preserves_identity(
        &self,
        call: &CallSite,
    ) -> bool {
        call.kind == InvokeKind::Static && self.preserving.iter().any(|p| p.matches(call))
    }
}

/// 调用在资源表中的角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallRole {
    Obtain(KindId),
    Release(KindId),
}

/// 资源种类表
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceTable {
    kinds: Vec<ResourceKind>,
}

static BUILTIN: Lazy<ResourceTable> = Lazy::new(|| {
    let kind = |name: &str, owner: &str, obtain: Vec<CallPattern>, flow_checked: bool| ResourceKind {
        name: name.to_string(),
        owner: owner.to_string(),
        obtain,
        release: ReleaseCall::default(),
        flow_checked,
        preserving: Vec::new(),
    };

    let typed_array = kind(
        "TypedArray",
        TYPED_ARRAY_CLS,
        [CONTEXT_CLS, RESOURCES_CLS]
            .iter()
            .flat_map(|owner| {
                ["obtainStyledAttributes", "obtainAttributes", "obtainTypedArray"]
                    .iter()
                    .map(move |name| CallPattern::new(owner, name, Some(TYPED_ARRAY_SIG)))
            })
            .collect(),
        true,
    );

    let velocity_tracker = kind(
        "VelocityTracker",
        VELOCITY_TRACKER_CLS,
        vec![CallPattern::new(VELOCITY_TRACKER_CLS, "obtain", None)],
        false,
    );

    let message = kind(
        "Message",
        MESSAGE_CLS,
        vec![
            CallPattern::new(HANDLER_CLS, "obtainMessage", Some(MESSAGE_SIG)),
            CallPattern::new(MESSAGE_CLS, "obtain", Some(MESSAGE_SIG)),
        ],
        false,
    );

    let mut motion_event = kind(
        "MotionEvent",
        MOTION_EVENT_CLS,
        vec![
            CallPattern::new(MOTION_EVENT_CLS, "obtain", None),
            CallPattern::new(MOTION_EVENT_CLS, "obtainNoHistory", None),
        ],
        true,
    );
    motion_event.preserving = vec![CallPattern::new(MOTION_EVENT_CLS, "obtain", None)];

    let parcel = kind(
        "Parcel",
        PARCEL_CLS,
        vec![CallPattern::new(PARCEL_CLS, "obtain", None)],
        true,
    );

    ResourceTable::new(vec![typed_array, velocity_tracker, message, motion_event, parcel])
});

impl ResourceTable {
    pub fn new(kinds: Vec<ResourceKind>) -> Self {
        Self { kinds }
    }

    /// 内置资源表
    pub fn builtin() -> &'static ResourceTable {
        &BUILTIN
    }

    /// 以内置表为基础，移除禁用种类并追加（或覆盖同名）自定义种类
    pub fn configured(
        disabled: &[String],
        extra: &[ResourceKind],
    ) -> Self {
        let mut table = Self::builtin().clone();
        for kind in extra {
            table.insert(kind.clone());
        }
        table.kinds.retain(|k| !disabled.iter().any(|d| d == &k.name));
        table
    }

    /// 插入种类，同名种类被替换
    pub fn insert(
        &mut self,
        kind: ResourceKind,
    ) {
        match self.kinds.iter_mut().find(|k| k.name == kind.name) {
            Some(existing) => *existing = kind,
            None => self.kinds.push(kind),
        }
    }

    pub fn kinds(&self) -> &[ResourceKind] {
        &self.kinds
    }

    pub fn kind(
        &self,
        id: KindId,
    ) -> Option<&ResourceKind> {
        self.kinds.get(id)
    }

    pub fn find(
        &self,
        name: &str,
    ) -> Option<KindId> {
        self.kinds.iter().position(|k| k.name == name)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    /// 归还调用优先；同一调用不会同时是获取调用
    pub fn classify(
        &self,
        call: &CallSite,
    ) -> Option<CallRole> {
        if let Some(id) = self.kinds.iter().position(|k| k.is_release(call)) {
            return Some(CallRole::Release(id));
        }
        self.kinds
            .iter()
            .position(|k| k.is_obtain(call))
            .map(CallRole::Obtain)
    }
}
