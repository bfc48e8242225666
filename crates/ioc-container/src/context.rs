//! 应用上下文
//!
//! 组合注册表、注入器和生命周期引擎，提供启动、停止和刷新操作。

use crate::injector::InjectionReport;
use crate::lifecycle::LifecycleEngine;
use crate::registry::{BeanRecord, Registry};
use ioc_common::{
    dispatch, BeanInstance, Component, ContainerConfig, ContainerEvent, ContextError,
    ContextResult, CreationError, EventKind, EventSink, InjectionError, InjectionPolicy,
    LifecycleError, LifecycleState, Scope, TypeInfo,
};
use parking_lot::ReentrantMutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// 停止上下文的结果
///
/// 销毁失败不会中断其余 Bean 的销毁，失败在此汇总。
#[derive(Debug, Default)]
pub struct ShutdownReport {
    /// 成功销毁的 Bean，按销毁顺序
    pub destroyed: Vec<String>,
    /// 销毁失败
    pub failures: Vec<LifecycleError>,
}

impl ShutdownReport {
    /// 是否全部销毁成功
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// 应用上下文构建器
#[derive(Default)]
pub struct ApplicationContextBuilder {
    config: ContainerConfig,
    sink: Option<Arc<dyn EventSink>>,
}

impl ApplicationContextBuilder {
    /// 设置容器配置
    pub fn with_config(mut self, config: ContainerConfig) -> Self {
        self.config = config;
        self
    }

    /// 设置注入策略
    pub fn with_injection_policy(mut self, policy: InjectionPolicy) -> Self {
        self.config.injection_policy = policy;
        self
    }

    /// 设置事件接收器，覆盖配置中的接收器类型
    pub fn with_sink(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// 构建应用上下文
    pub fn build(self) -> ApplicationContext {
        let sink = self.sink.unwrap_or_else(|| self.config.build_sink());
        let id = Uuid::new_v4();
        info!("创建应用上下文: {} (注入策略: {:?})", id, self.config.injection_policy);

        ApplicationContext {
            id,
            registry: Registry::new(Arc::clone(&sink), self.config.injection_policy),
            config: self.config,
            sink,
            started: AtomicBool::new(false),
            run_guard: ReentrantMutex::new(()),
        }
    }
}

/// 应用上下文
///
/// 启动、停止、刷新以及经由上下文的注册共用一把可重入锁，
/// 生命周期回调中可以再次注册 Bean。
pub struct ApplicationContext {
    id: Uuid,
    config: ContainerConfig,
    registry: Registry,
    sink: Arc<dyn EventSink>,
    started: AtomicBool,
    run_guard: ReentrantMutex<()>,
}

impl ApplicationContext {
    /// 使用默认配置创建应用上下文
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// 创建构建器
    pub fn builder() -> ApplicationContextBuilder {
        ApplicationContextBuilder::default()
    }

    /// 上下文标识
    pub const fn id(&self) -> Uuid {
        self.id
    }

    /// 容器配置
    pub const fn config(&self) -> &ContainerConfig {
        &self.config
    }

    /// 底层注册表
    pub const fn registry(&self) -> &Registry {
        &self.registry
    }

    /// 生命周期引擎
    pub const fn lifecycle(&self) -> &LifecycleEngine {
        self.registry.lifecycle()
    }

    /// 是否已启动
    pub fn is_started(&self) -> bool {
        self.started.load(Ordering::SeqCst)
    }

    /// 启动上下文
    ///
    /// 先为所有单例注入依赖，再按注册顺序初始化：单例初始化已注册的实例，
    /// 原型创建一个新实例完成注入和初始化。任一初始化失败即中止，
    /// 上下文保持未启动状态，已注入的依赖不会回滚。
    ///
    /// 初始化回调中注册的 Bean 在本次启动中一并装配和初始化。
    pub fn start(&self) -> ContextResult<()> {
        let _run = self.run_guard.lock();
        if self.is_started() {
            return Err(ContextError::AlreadyStarted);
        }

        info!("启动应用上下文: {}", self.id);
        let started_at = Instant::now();
        self.lifecycle().reset();
        self.emit(EventKind::ContextStarting);

        self.registry.wire_all().map_err(|e| {
            error!("依赖装配失败: {}", e);
            ContextError::from(e)
        })?;

        let mut processed = 0;
        loop {
            let order = self.registry.registration_order();
            if processed >= order.len() {
                break;
            }
            let wired = processed == 0;
            for name in &order[processed..] {
                self.bring_up(name, wired)?;
            }
            processed = order.len();
        }

        self.started.store(true, Ordering::SeqCst);
        let duration = started_at.elapsed();
        info!("应用上下文启动完成: {} 个组件, 耗时 {:?}", processed, duration);
        self.emit(EventKind::ContextStarted {
            duration,
            component_count: processed,
        });
        Ok(())
    }

    /// 初始化一个 Bean，`wired` 为假时先注入依赖
    fn bring_up(&self, name: &str, wired: bool) -> ContextResult<()> {
        let Some(record) = self.registry.get_bean_definition(name) else {
            return Ok(());
        };

        match (record.scope, record.instance) {
            (Scope::Singleton, Some(bean)) => {
                if !wired {
                    self.wire(name, &bean)?;
                }
                self.initialize(name, &bean)
            }
            (Scope::Prototype, _) => self.initialize_prototype(name),
            (Scope::Singleton, None) => Ok(()),
        }
    }

    fn initialize_prototype(&self, name: &str) -> ContextResult<()> {
        self.registry.set_state(name, LifecycleState::Initializing);
        match self.registry.create_prototype(name) {
            Ok(_) => {
                self.lifecycle().record_initialized(name);
                self.registry.set_state(name, LifecycleState::Ready);
                debug!("原型 Bean 校验完成: {}", name);
                Ok(())
            }
            Err(e) => {
                self.registry.set_state(name, LifecycleState::Failed);
                error!("原型 Bean '{}' 创建失败: {}", name, e);
                Err(match e {
                    CreationError::Initialization { source } => ContextError::Initialization {
                        bean: name.to_string(),
                        source,
                    },
                    CreationError::Wiring { source } => ContextError::Wiring {
                        source: InjectionError::BeanWiring {
                            bean: name.to_string(),
                            source: Box::new(source),
                        },
                    },
                    other => ContextError::from(other),
                })
            }
        }
    }

    /// 停止上下文
    ///
    /// 按注册顺序的逆序销毁所有单例，然后清空注册表。
    pub fn stop(&self) -> ContextResult<ShutdownReport> {
        let _run = self.run_guard.lock();
        if !self.is_started() {
            return Err(ContextError::NotStarted);
        }

        info!("停止应用上下文: {}", self.id);
        let started_at = Instant::now();
        self.emit(EventKind::ContextStopping);

        let mut report = ShutdownReport::default();
        for (name, bean) in self.registry.managed_instances().iter().rev() {
            self.registry.set_state(name, LifecycleState::Destroying);
            match self.lifecycle().process_destruction(name, bean) {
                Ok(()) => {
                    self.registry.set_state(name, LifecycleState::Destroyed);
                    report.destroyed.push(name.clone());
                }
                Err(e) => {
                    error!("销毁 Bean '{}' 失败: {}", name, e);
                    report.failures.push(e);
                }
            }
        }

        self.registry.destroy();
        self.started.store(false, Ordering::SeqCst);

        let duration = started_at.elapsed();
        if report.is_clean() {
            info!("应用上下文已停止, 耗时 {:?}", duration);
        } else {
            warn!(
                "应用上下文已停止, {} 个 Bean 销毁失败, 耗时 {:?}",
                report.failures.len(),
                duration
            );
        }
        self.emit(EventKind::ContextStopped { duration });
        Ok(report)
    }

    /// 刷新上下文
    ///
    /// 已启动时先停止再启动。停止会清空注册表，刷新后的上下文中没有 Bean。
    /// 整个过程持有运行锁，其他线程的启动或停止只能在刷新前后执行。
    pub fn refresh(&self) -> ContextResult<()> {
        let _run = self.run_guard.lock();
        if self.is_started() {
            self.stop()?;
        }
        self.start()
    }

    fn initialize(&self, name: &str, bean: &BeanInstance) -> ContextResult<()> {
        self.registry.set_state(name, LifecycleState::Initializing);
        match self.lifecycle().process_initialization(name, bean) {
            Ok(()) => {
                self.registry.set_state(name, LifecycleState::Ready);
                Ok(())
            }
            Err(source) => {
                self.registry.set_state(name, LifecycleState::Failed);
                error!("初始化 Bean '{}' 失败: {}", name, source);
                Err(ContextError::Initialization {
                    bean: name.to_string(),
                    source,
                })
            }
        }
    }

    /// 已启动时立即装配并初始化新注册的单例
    fn activate(&self, name: &str) -> ContextResult<()> {
        if !self.is_started() {
            return Ok(());
        }

        let Some(bean) = self
            .registry
            .get_bean_definition(name)
            .and_then(|record| record.instance)
        else {
            return Ok(());
        };

        debug!("上下文已启动, 立即激活 Bean: {}", name);
        self.wire(name, &bean)?;
        self.initialize(name, &bean)
    }

    fn wire(&self, name: &str, bean: &BeanInstance) -> ContextResult<()> {
        self.registry
            .autowire(bean)
            .map_err(|e| InjectionError::BeanWiring {
                bean: name.to_string(),
                source: Box::new(e),
            })?;
        Ok(())
    }

    /// 注册单例 Bean
    pub fn register_singleton<T: Component>(
        &self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> ContextResult<()> {
        let name = name.into();
        let _run = self.run_guard.lock();
        self.registry.register_singleton(name.clone(), instance)?;
        self.activate(&name)
    }

    /// 注册原型 Bean
    pub fn register_prototype<T: Component + Default>(
        &self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> ContextResult<()> {
        let _run = self.run_guard.lock();
        self.registry.register_prototype(name, instance)?;
        Ok(())
    }

    /// 按接口注册单例 Bean
    pub fn register_by_interface(
        &self,
        interface: &TypeInfo,
        bean: BeanInstance,
        name: impl Into<String>,
    ) -> ContextResult<()> {
        let name = name.into();
        let _run = self.run_guard.lock();
        self.registry
            .register_by_interface(interface, bean, name.clone())?;
        self.activate(&name)
    }

    /// 按接口注册单例 Bean 的泛型版本
    pub fn register_interface<I, T>(&self, name: impl Into<String>, instance: Arc<T>) -> ContextResult<()>
    where
        I: ?Sized + 'static,
        T: Component,
    {
        let bean = self.registry.instance_of(instance);
        self.register_by_interface(&TypeInfo::of::<I>(), bean, name)
    }

    /// 注册组件，名称与作用域取自组件描述符
    ///
    /// 返回注册使用的 Bean 名称。
    pub fn register_component<T: Component>(&self, instance: Arc<T>) -> ContextResult<String> {
        self.register_instance(self.registry.instance_of(instance))
    }

    /// 批量注册组件
    ///
    /// 遇到第一个失败即停止，之前已注册的组件保留。
    pub fn register_components<I>(&self, components: I) -> ContextResult<Vec<String>>
    where
        I: IntoIterator<Item = BeanInstance>,
    {
        components
            .into_iter()
            .map(|bean| self.register_instance(bean))
            .collect()
    }

    fn register_instance(&self, bean: BeanInstance) -> ContextResult<String> {
        let name = bean.descriptor().bean_name();
        let scope = bean.descriptor().scope();
        let _run = self.run_guard.lock();
        self.registry.register_bean(name.clone(), bean, scope)?;
        self.activate(&name)?;
        Ok(name)
    }

    /// 调用工厂创建实例并注册，作用域取自组件描述符
    pub fn create_bean<T, F>(&self, name: impl Into<String>, factory: F) -> ContextResult<()>
    where
        T: Component,
        F: FnOnce() -> Arc<T>,
    {
        let name = name.into();
        let bean = self.registry.instance_of(factory());
        let scope = bean.descriptor().scope();
        let _run = self.run_guard.lock();
        self.registry.register_bean(name.clone(), bean, scope)?;
        self.activate(&name)
    }

    /// 为容器外的实例注入依赖
    pub fn autowire<T: Component>(&self, instance: &Arc<T>) -> ContextResult<InjectionReport> {
        self.autowire_instance(&self.registry.instance_of(Arc::clone(instance)))
    }

    /// 为类型擦除的实例注入依赖
    pub fn autowire_instance(&self, bean: &BeanInstance) -> ContextResult<InjectionReport> {
        Ok(self.registry.autowire(bean)?)
    }

    /// 按名称获取 Bean
    pub fn get_bean(&self, name: &str) -> Option<BeanInstance> {
        self.registry.get_bean(name)
    }

    /// 按名称获取 Bean 并转换为指定类型
    pub fn get_bean_as<D: ?Sized + 'static>(&self, name: &str) -> Option<Arc<D>> {
        self.registry.get_bean_as::<D>(name)
    }

    /// 按类型获取 Bean
    pub fn get_bean_by_type(&self, type_info: &TypeInfo) -> Option<BeanInstance> {
        self.registry.get_bean_by_type(type_info)
    }

    /// 按类型获取 Bean 并转换为该类型
    pub fn get_bean_of<D: ?Sized + 'static>(&self) -> Option<Arc<D>> {
        self.registry.get_bean_of::<D>()
    }

    /// 获取所有可赋值给指定类型的 Bean
    pub fn get_beans_of_type(&self, type_info: &TypeInfo) -> HashMap<String, BeanInstance> {
        self.registry.get_beans_of_type(type_info)
    }

    /// 是否存在指定名称的 Bean
    pub fn has_bean(&self, name: &str) -> bool {
        self.registry.has_bean(name)
    }

    /// 所有 Bean 名称（无序）
    pub fn list_beans(&self) -> Vec<String> {
        self.registry.list_beans()
    }

    /// 获取 Bean 记录
    pub fn get_bean_definition(&self, name: &str) -> Option<BeanRecord> {
        self.registry.get_bean_definition(name)
    }

    /// 初始化顺序
    pub fn init_order(&self) -> Vec<String> {
        self.lifecycle().init_order()
    }

    /// 销毁顺序
    pub fn destroy_order(&self) -> Vec<String> {
        self.lifecycle().destroy_order()
    }

    fn emit(&self, kind: EventKind) {
        dispatch(self.sink.as_ref(), &ContainerEvent::new(kind));
    }
}

impl Default for ApplicationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ApplicationContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationContext")
            .field("id", &self.id)
            .field("started", &self.is_started())
            .field("config", &self.config)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}
