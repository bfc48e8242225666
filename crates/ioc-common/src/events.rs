//! 容器事件定义
//!
//! 容器在注册、注入、生命周期回调和上下文启停时产生事件，
//! 交给 [`EventSink`](crate::sink::EventSink) 处理。

use crate::lifecycle::Scope;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// 事件级别
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventLevel {
    /// 调试信息
    Debug,
    /// 一般信息
    #[default]
    Info,
    /// 警告
    Warn,
    /// 错误
    Error,
    /// 关闭
    Off,
}

impl fmt::Display for EventLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
            Self::Off => "off",
        };
        f.write_str(label)
    }
}

/// 容器事件
#[derive(Debug, Clone, Serialize)]
pub struct ContainerEvent {
    /// 事件时间
    pub timestamp: DateTime<Utc>,
    /// 事件内容
    #[serde(flatten)]
    pub kind: EventKind,
}

/// 事件内容
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EventKind {
    /// 容器创建
    ContainerCreated,
    /// 组件注册
    ComponentRegistered {
        component_id: String,
        component_type: String,
        scope: Scope,
    },
    /// 依赖注入成功
    DependencyInjected {
        target_type: String,
        dependency_type: String,
        field_name: String,
        by_name: bool,
    },
    /// 依赖注入失败
    DependencyInjectionFailed {
        target_type: String,
        dependency_type: String,
        field_name: String,
        error: String,
    },
    /// 原型实例创建
    ComponentCreated {
        component_id: String,
        component_type: String,
        creation_time: Duration,
    },
    /// 组件销毁
    ComponentDestroyed {
        component_id: String,
        component_type: String,
    },
    /// 初始化回调开始
    LifecycleStarting {
        component_id: String,
        component_type: String,
        method_name: String,
    },
    /// 初始化回调结束
    LifecycleStarted {
        component_id: String,
        component_type: String,
        method_name: String,
        duration: Duration,
        error: Option<String>,
    },
    /// 销毁回调开始
    LifecycleStopping {
        component_id: String,
        component_type: String,
        method_name: String,
    },
    /// 销毁回调结束
    LifecycleStopped {
        component_id: String,
        component_type: String,
        method_name: String,
        duration: Duration,
        error: Option<String>,
    },
    /// 上下文启动中
    ContextStarting,
    /// 上下文已启动
    ContextStarted {
        duration: Duration,
        component_count: usize,
    },
    /// 上下文停止中
    ContextStopping,
    /// 上下文已停止
    ContextStopped { duration: Duration },
}

impl ContainerEvent {
    /// 以当前时间创建事件
    pub fn new(kind: EventKind) -> Self {
        Self {
            timestamp: Utc::now(),
            kind,
        }
    }

    /// 事件名称
    pub fn name(&self) -> &'static str {
        match &self.kind {
            EventKind::ContainerCreated => "container_created",
            EventKind::ComponentRegistered { .. } => "component_registered",
            EventKind::DependencyInjected { .. } => "dependency_injected",
            EventKind::DependencyInjectionFailed { .. } => "dependency_injection_failed",
            EventKind::ComponentCreated { .. } => "component_created",
            EventKind::ComponentDestroyed { .. } => "component_destroyed",
            EventKind::LifecycleStarting { .. } => "lifecycle_starting",
            EventKind::LifecycleStarted { .. } => "lifecycle_started",
            EventKind::LifecycleStopping { .. } => "lifecycle_stopping",
            EventKind::LifecycleStopped { .. } => "lifecycle_stopped",
            EventKind::ContextStarting => "context_starting",
            EventKind::ContextStarted { .. } => "context_started",
            EventKind::ContextStopping => "context_stopping",
            EventKind::ContextStopped { .. } => "context_stopped",
        }
    }

    /// 事件级别
    ///
    /// 带错误的回调结束事件和注入失败为错误级别，
    /// 注入成功与回调开始为调试级别，其余为信息级别。
    pub fn level(&self) -> EventLevel {
        match &self.kind {
            EventKind::DependencyInjectionFailed { .. } => EventLevel::Error,
            EventKind::LifecycleStarted { error, .. } | EventKind::LifecycleStopped { error, .. } => {
                if error.is_some() {
                    EventLevel::Error
                } else {
                    EventLevel::Info
                }
            }
            EventKind::DependencyInjected { .. }
            | EventKind::LifecycleStarting { .. }
            | EventKind::LifecycleStopping { .. } => EventLevel::Debug,
            _ => EventLevel::Info,
        }
    }

    /// 事件关联的组件名称
    pub fn component_id(&self) -> Option<&str> {
        match &self.kind {
            EventKind::ComponentRegistered { component_id, .. }
            | EventKind::ComponentCreated { component_id, .. }
            | EventKind::ComponentDestroyed { component_id, .. }
            | EventKind::LifecycleStarting { component_id, .. }
            | EventKind::LifecycleStarted { component_id, .. }
            | EventKind::LifecycleStopping { component_id, .. }
            | EventKind::LifecycleStopped { component_id, .. } => Some(component_id),
            _ => None,
        }
    }
}

impl fmt::Display for ContainerEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] ", self.timestamp.format("%H:%M:%S%.3f"))?;

        match &self.kind {
            EventKind::ContainerCreated => f.write_str("Container created"),
            EventKind::ComponentRegistered {
                component_id,
                component_type,
                scope,
            } => write!(
                f,
                "Component registered: {component_id} (type: {component_type}, scope: {scope})"
            ),
            EventKind::DependencyInjected {
                target_type,
                dependency_type,
                field_name,
                by_name,
            } => {
                let mode = if *by_name { "by name" } else { "by type" };
                write!(
                    f,
                    "Dependency injected: {target_type}.{field_name} <- {dependency_type} ({mode})"
                )
            }
            EventKind::DependencyInjectionFailed {
                target_type,
                dependency_type,
                field_name,
                error,
            } => write!(
                f,
                "Dependency injection failed: {target_type}.{field_name} <- {dependency_type} (error: {error})"
            ),
            EventKind::ComponentCreated {
                component_id,
                component_type,
                creation_time,
            } => write!(
                f,
                "Component created: {component_id} (type: {component_type}, time: {creation_time:?})"
            ),
            EventKind::ComponentDestroyed {
                component_id,
                component_type,
            } => write!(f, "Component destroyed: {component_id} (type: {component_type})"),
            EventKind::LifecycleStarting {
                component_id,
                component_type,
                method_name,
            } => write!(
                f,
                "Lifecycle starting: {component_id}.{method_name} (type: {component_type})"
            ),
            EventKind::LifecycleStarted {
                component_id,
                component_type,
                method_name,
                duration,
                error,
            } => match error {
                Some(error) => write!(
                    f,
                    "Lifecycle started with error: {component_id}.{method_name} (type: {component_type}, duration: {duration:?}, error: {error})"
                ),
                None => write!(
                    f,
                    "Lifecycle started: {component_id}.{method_name} (type: {component_type}, duration: {duration:?})"
                ),
            },
            EventKind::LifecycleStopping {
                component_id,
                component_type,
                method_name,
            } => write!(
                f,
                "Lifecycle stopping: {component_id}.{method_name} (type: {component_type})"
            ),
            EventKind::LifecycleStopped {
                component_id,
                component_type,
                method_name,
                duration,
                error,
            } => match error {
                Some(error) => write!(
                    f,
                    "Lifecycle stopped with error: {component_id}.{method_name} (type: {component_type}, duration: {duration:?}, error: {error})"
                ),
                None => write!(
                    f,
                    "Lifecycle stopped: {component_id}.{method_name} (type: {component_type}, duration: {duration:?})"
                ),
            },
            EventKind::ContextStarting => f.write_str("Application context starting"),
            EventKind::ContextStarted {
                duration,
                component_count,
            } => write!(
                f,
                "Application context started (duration: {duration:?}, components: {component_count})"
            ),
            EventKind::ContextStopping => f.write_str("Application context stopping"),
            EventKind::ContextStopped { duration } => {
                write!(f, "Application context stopped (duration: {duration:?})")
            }
        }
    }
}
