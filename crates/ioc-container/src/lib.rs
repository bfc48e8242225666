//! # IoC Container
//!
//! Lorn IoC 的容器实现：Bean 注册表、依赖注入器、生命周期引擎与应用上下文。
//!
//! ```
//! use ioc_common::{Autowired, Component, ComponentDescriptor, HookResult, Initializer};
//! use ioc_container::ApplicationContext;
//! use std::sync::Arc;
//!
//! #[derive(Default)]
//! struct Greeting;
//!
//! impl Component for Greeting {
//!     fn describe() -> ComponentDescriptor {
//!         ComponentDescriptor::builder::<Self>().name("greeting").build()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct Greeter {
//!     greeting: Autowired<Greeting>,
//! }
//!
//! impl Initializer for Greeter {
//!     fn init(&self) -> HookResult {
//!         assert!(self.greeting.is_wired());
//!         Ok(())
//!     }
//! }
//!
//! impl Component for Greeter {
//!     fn describe() -> ComponentDescriptor {
//!         ComponentDescriptor::builder::<Self>()
//!             .inject_by_type("greeting", |g| &g.greeting)
//!             .initializer()
//!             .build()
//!     }
//! }
//!
//! let ctx = ApplicationContext::new();
//! ctx.register_component(Arc::new(Greeting)).unwrap();
//! ctx.register_component(Arc::new(Greeter::default())).unwrap();
//!
//! ctx.start().unwrap();
//! assert_eq!(ctx.init_order(), vec!["greeting", "greeter"]);
//! ctx.stop().unwrap();
//! ```

pub mod context;
pub mod injector;
pub mod lifecycle;
pub mod registry;

pub use context::{ApplicationContext, ApplicationContextBuilder, ShutdownReport};
pub use injector::{InjectionReport, Injector};
pub use lifecycle::LifecycleEngine;
pub use registry::{BeanRecord, Registry};
