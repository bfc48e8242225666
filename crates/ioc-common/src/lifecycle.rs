//! 组件生命周期管理

use serde::{Deserialize, Serialize};
use std::fmt;

/// 生命周期回调返回的错误类型
pub type HookError = Box<dyn std::error::Error + Send + Sync>;

/// 生命周期回调结果
pub type HookResult = Result<(), HookError>;

/// 组件作用域
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// 单例模式 - 容器内只存在一个共享实例
    #[default]
    Singleton,
    /// 原型模式 - 每次解析都创建新实例
    Prototype,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Singleton => f.write_str("singleton"),
            Self::Prototype => f.write_str("prototype"),
        }
    }
}

/// Bean 生命周期状态
///
/// `Unregistered -> Registered -> Initializing -> Ready -> Destroying -> Destroyed`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// 未注册
    #[default]
    Unregistered,
    /// 已注册
    Registered,
    /// 初始化中
    Initializing,
    /// 就绪
    Ready,
    /// 销毁中
    Destroying,
    /// 已销毁
    Destroyed,
    /// 初始化失败
    Failed,
}

/// 生命周期阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecyclePhase {
    /// 名称感知回调
    BeanNameAware,
    /// 主初始化回调
    Init,
    /// 构造后回调
    PostConstruct,
    /// 自定义初始化方法
    CustomInit,
    /// 销毁前回调
    PreDestroy,
    /// 主销毁回调
    Destroy,
    /// 自定义销毁方法
    CustomDestroy,
}

impl LifecyclePhase {
    /// 初始化阶段的执行顺序
    pub const INIT_SEQUENCE: [Self; 3] = [Self::Init, Self::PostConstruct, Self::CustomInit];

    /// 销毁阶段的执行顺序
    pub const DESTROY_SEQUENCE: [Self; 3] = [Self::PreDestroy, Self::Destroy, Self::CustomDestroy];

    /// 默认方法名称
    pub const fn default_method_name(self) -> &'static str {
        match self {
            Self::BeanNameAware => "set_bean_name",
            Self::Init => "init",
            Self::PostConstruct => "post_construct",
            Self::CustomInit => "init_method",
            Self::PreDestroy => "pre_destroy",
            Self::Destroy => "destroy",
            Self::CustomDestroy => "destroy_method",
        }
    }

    /// 是否属于销毁阶段
    pub const fn is_destruction(self) -> bool {
        matches!(self, Self::PreDestroy | Self::Destroy | Self::CustomDestroy)
    }
}

impl fmt::Display for LifecyclePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BeanNameAware => "名称感知",
            Self::Init => "初始化",
            Self::PostConstruct => "构造后",
            Self::CustomInit => "自定义初始化",
            Self::PreDestroy => "销毁前",
            Self::Destroy => "销毁",
            Self::CustomDestroy => "自定义销毁",
        };
        f.write_str(label)
    }
}

/// Bean 名称感知 trait
///
/// 组件实例在容器内共享，回调通过 `&self` 调用，状态需要内部可变性。
pub trait BeanNameAware: Send + Sync {
    /// 设置 Bean 名称
    fn set_bean_name(&self, name: &str);
}

/// 初始化 trait
pub trait Initializer: Send + Sync {
    /// 主初始化回调
    fn init(&self) -> HookResult;
}

/// 构造后回调 trait
///
/// 在 [`Initializer::init`] 成功之后调用
pub trait PostConstruct: Send + Sync {
    /// 构造后回调
    fn post_construct(&self) -> HookResult;
}

/// 销毁前回调 trait
pub trait PreDestroy: Send + Sync {
    /// 销毁前回调
    fn pre_destroy(&self) -> HookResult;
}

/// 销毁 trait
pub trait Destroyer: Send + Sync {
    /// 主销毁回调
    fn destroy(&self) -> HookResult;
}
