//! # IoC Common
//!
//! 这个 crate 提供了 Lorn IoC 容器的公共类型和 traits。
//!
//! ## 核心组件
//!
//! - [`Component`] - 组件元数据入口（`describe`）
//! - [`ComponentDescriptor`] - 组件描述符及其构建器
//! - [`Autowired`] - 可注入字段槽位
//! - [`BeanInstance`] - 类型擦除的组件实例句柄
//! - [`EventSink`] - 容器生命周期事件接收器
//! - [`ContainerConfig`] - 容器配置
//!
//! ## 设计原则
//!
//! - 组件元数据通过显式构建器声明，每个类型只构建一次
//! - 接口绑定在注册时确定，解析复杂度为 O(1)
//! - 事件接收器的故障不会影响容器操作

pub mod autowired;
pub mod configuration;
pub mod descriptor;
pub mod errors;
pub mod events;
pub mod instance;
pub mod lifecycle;
pub mod metadata;
pub mod resolver;
pub mod sink;

pub use autowired::*;
pub use configuration::*;
pub use descriptor::*;
pub use errors::*;
pub use events::*;
pub use instance::*;
pub use lifecycle::*;
pub use metadata::*;
pub use resolver::*;
pub use sink::*;
