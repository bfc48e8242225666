//! 错误类型定义

use crate::lifecycle::{HookError, LifecyclePhase};
use thiserror::Error;

/// 注册表错误类型
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("Bean 名称已存在: {name}")]
    DuplicateName { name: String },

    #[error("类型 {type_name} 未实现接口 {interface}")]
    TypeMismatch { type_name: String, interface: String },

    #[error("原型 Bean 缺少实例工厂: {name} (类型: {type_name})")]
    MissingFactory { name: String, type_name: String },
}

impl RegistryError {
    /// 创建名称重复错误
    pub fn duplicate_name(name: impl Into<String>) -> Self {
        Self::DuplicateName { name: name.into() }
    }

    /// 创建类型不匹配错误
    pub fn type_mismatch(type_name: impl Into<String>, interface: impl Into<String>) -> Self {
        Self::TypeMismatch {
            type_name: type_name.into(),
            interface: interface.into(),
        }
    }
}

/// 依赖注入错误类型
#[derive(Error, Debug)]
pub enum InjectionError {
    #[error("依赖未解析: {owner}.{field} <- {dependency}")]
    Unresolved {
        owner: String,
        field: String,
        dependency: String,
    },

    #[error("依赖类型不匹配: {owner}.{field} <- {actual} (期望: {dependency})")]
    NotAssignable {
        owner: String,
        field: String,
        dependency: String,
        actual: String,
    },

    #[error("Bean '{bean}' 依赖注入失败: {source}")]
    BeanWiring {
        bean: String,
        source: Box<InjectionError>,
    },
}

/// 生命周期错误类型
#[derive(Error, Debug)]
pub enum LifecycleError {
    #[error("Bean '{bean}' 在 {phase} 阶段 ({method}) 执行失败: {source}")]
    Hook {
        bean: String,
        phase: LifecyclePhase,
        method: String,
        source: HookError,
    },
}

impl LifecycleError {
    /// 失败的 Bean 名称
    pub fn bean(&self) -> &str {
        match self {
            Self::Hook { bean, .. } => bean,
        }
    }

    /// 失败的生命周期阶段
    pub fn phase(&self) -> LifecyclePhase {
        match self {
            Self::Hook { phase, .. } => *phase,
        }
    }
}

/// 原型 Bean 创建错误类型
#[derive(Error, Debug)]
pub enum CreationError {
    #[error("原型 Bean 不存在: {name}")]
    NotPrototype { name: String },

    #[error("原型 Bean 存在循环依赖: {name}")]
    Cycle { name: String },

    #[error("原型 Bean 缺少实例工厂: {name}")]
    MissingFactory { name: String },

    #[error("原型 Bean 依赖装配失败: {source}")]
    Wiring {
        #[from]
        source: InjectionError,
    },

    #[error("原型 Bean 初始化失败: {source}")]
    Initialization {
        #[from]
        source: LifecycleError,
    },
}

/// 应用上下文错误类型
#[derive(Error, Debug)]
pub enum ContextError {
    #[error("应用上下文已经启动")]
    AlreadyStarted,

    #[error("应用上下文尚未启动")]
    NotStarted,

    #[error("注册失败: {source}")]
    Registry {
        #[from]
        source: RegistryError,
    },

    #[error("依赖装配失败: {source}")]
    Wiring {
        #[from]
        source: InjectionError,
    },

    #[error("初始化 Bean '{bean}' 失败: {source}")]
    Initialization {
        bean: String,
        source: LifecycleError,
    },

    #[error("创建 Bean 失败: {source}")]
    Creation {
        #[from]
        source: CreationError,
    },
}

/// 配置错误类型
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("容器配置加载失败: {source}")]
    Load {
        #[from]
        source: config::ConfigError,
    },

    #[error("配置文件不存在: {path}")]
    FileNotFound { path: String },
}

/// 结果类型别名
pub type RegistryResult<T> = Result<T, RegistryError>;
pub type InjectionResult<T> = Result<T, InjectionError>;
pub type LifecycleResult<T> = Result<T, LifecycleError>;
pub type CreationResult<T> = Result<T, CreationError>;
pub type ContextResult<T> = Result<T, ContextError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
