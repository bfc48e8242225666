//! Bean 注册表
//!
//! 维护名称到 Bean 记录、类型到名称的两张映射。写操作持有独占锁，
//! 读操作持有共享锁；原型实例先在锁内取出记录快照，释放锁后再创建、注入和初始化。

use crate::injector::{InjectionReport, Injector};
use crate::lifecycle::LifecycleEngine;
use ioc_common::{
    dispatch, BeanInstance, BeanResolver, Component, ComponentDescriptor, ContainerEvent,
    CreationError, CreationResult, DescriptorCache, EventKind, EventSink, InjectionPolicy,
    InjectionResult, LifecycleState, RegistryError, RegistryResult, Scope, TracingSink, TypeInfo,
};
use parking_lot::RwLock;
use std::any::TypeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Bean 记录
#[derive(Debug, Clone)]
pub struct BeanRecord {
    /// Bean 名称
    pub name: String,
    /// 声明类型
    pub declared_type: TypeInfo,
    /// 作用域
    pub scope: Scope,
    /// 生命周期状态
    pub state: LifecycleState,
    /// 单例实例，原型记录为空
    pub instance: Option<BeanInstance>,
    /// 组件描述符
    pub descriptor: Arc<ComponentDescriptor>,
}

#[derive(Default)]
struct RegistryState {
    beans: HashMap<String, BeanRecord>,
    type_mapping: HashMap<TypeId, String>,
    order: Vec<String>,
}

impl RegistryState {
    fn insert(&mut self, record: BeanRecord, extra_types: &[TypeInfo]) -> RegistryResult<()> {
        if self.beans.contains_key(&record.name) {
            return Err(RegistryError::duplicate_name(&record.name));
        }

        let descriptor = Arc::clone(&record.descriptor);
        let types = [*descriptor.type_info(), *descriptor.pointer_type()];
        for type_info in types.iter().chain(extra_types) {
            self.bind_type(type_info, &record.name);
        }

        self.order.push(record.name.clone());
        self.beans.insert(record.name.clone(), record);
        Ok(())
    }

    fn bind_type(&mut self, type_info: &TypeInfo, name: &str) {
        if let Some(previous) = self.type_mapping.insert(type_info.id(), name.to_string()) {
            if previous != name {
                warn!(
                    "类型映射被覆盖: {} ({} -> {})",
                    type_info.name(),
                    previous,
                    name
                );
            }
        }
    }
}

thread_local! {
    /// 当前线程正在创建的原型 Bean，用于检测循环依赖
    static CREATION_CHAIN: RefCell<Vec<(usize, String)>> = RefCell::new(Vec::new());
}

struct CreationGuard;

impl CreationGuard {
    fn enter(registry: usize, name: &str) -> CreationResult<Self> {
        CREATION_CHAIN.with(|chain| {
            let mut chain = chain.borrow_mut();
            if chain.iter().any(|(owner, n)| *owner == registry && n == name) {
                let path: Vec<&str> = chain.iter().map(|(_, n)| n.as_str()).collect();
                error!("检测到原型 Bean 循环依赖: {} -> {}", path.join(" -> "), name);
                return Err(CreationError::Cycle {
                    name: name.to_string(),
                });
            }
            chain.push((registry, name.to_string()));
            Ok(Self)
        })
    }
}

impl Drop for CreationGuard {
    fn drop(&mut self) {
        CREATION_CHAIN.with(|chain| {
            chain.borrow_mut().pop();
        });
    }
}

/// Bean 注册表
pub struct Registry {
    state: RwLock<RegistryState>,
    descriptors: DescriptorCache,
    injector: Injector,
    lifecycle: LifecycleEngine,
    sink: Arc<dyn EventSink>,
}

impl Registry {
    /// 创建注册表
    pub fn new(sink: Arc<dyn EventSink>, policy: InjectionPolicy) -> Self {
        let registry = Self {
            state: RwLock::new(RegistryState::default()),
            descriptors: DescriptorCache::new(),
            injector: Injector::new(Arc::clone(&sink), policy),
            lifecycle: LifecycleEngine::new(Arc::clone(&sink)),
            sink,
        };
        debug!("创建 Bean 注册表, 注入策略: {:?}", policy);
        registry.emit(EventKind::ContainerCreated);
        registry
    }

    /// 使用指定接收器和宽松注入策略创建注册表
    pub fn with_sink(sink: Arc<dyn EventSink>) -> Self {
        Self::new(sink, InjectionPolicy::default())
    }

    /// 注册单例 Bean
    pub fn register_singleton<T: Component>(
        &self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> RegistryResult<()> {
        self.register_bean(name, self.instance_of(instance), Scope::Singleton)
    }

    /// 注册原型 Bean
    ///
    /// 传入的实例只用于确定类型，每次解析都由 `T::default()` 创建新实例。
    pub fn register_prototype<T: Component + Default>(
        &self,
        name: impl Into<String>,
        instance: Arc<T>,
    ) -> RegistryResult<()> {
        let descriptor = self.descriptors.resolve::<T>();
        let descriptor = if descriptor.has_factory() {
            descriptor
        } else {
            Arc::new((*descriptor).clone().with_default_factory::<T>())
        };
        self.register_bean(
            name,
            BeanInstance::with_descriptor(instance, descriptor),
            Scope::Prototype,
        )
    }

    /// 注册类型擦除的 Bean
    pub fn register_bean(
        &self,
        name: impl Into<String>,
        bean: BeanInstance,
        scope: Scope,
    ) -> RegistryResult<()> {
        let record = self.new_record(name.into(), bean, scope)?;
        self.insert(record, &[])
    }

    /// 按接口注册单例 Bean
    ///
    /// 实例的描述符必须声明实现了该接口，注册与接口绑定在同一把写锁内完成。
    pub fn register_by_interface(
        &self,
        interface: &TypeInfo,
        bean: BeanInstance,
        name: impl Into<String>,
    ) -> RegistryResult<()> {
        if !bean.descriptor().declares_interface(interface) {
            return Err(RegistryError::type_mismatch(
                bean.type_info().name(),
                interface.name(),
            ));
        }

        let record = self.new_record(name.into(), bean, Scope::Singleton)?;
        self.insert(record, &[*interface])
    }

    /// 按接口注册单例 Bean 的泛型版本
    pub fn register_interface<I, T>(&self, name: impl Into<String>, instance: Arc<T>) -> RegistryResult<()>
    where
        I: ?Sized + 'static,
        T: Component,
    {
        self.register_by_interface(&TypeInfo::of::<I>(), self.instance_of(instance), name)
    }

    fn new_record(&self, name: String, bean: BeanInstance, scope: Scope) -> RegistryResult<BeanRecord> {
        let descriptor = Arc::clone(bean.descriptor());
        if scope == Scope::Prototype && !descriptor.has_factory() {
            return Err(RegistryError::MissingFactory {
                name,
                type_name: descriptor.type_info().name().to_string(),
            });
        }

        Ok(BeanRecord {
            name,
            declared_type: *descriptor.type_info(),
            scope,
            state: LifecycleState::Registered,
            instance: (scope == Scope::Singleton).then_some(bean),
            descriptor,
        })
    }

    fn insert(&self, record: BeanRecord, extra_types: &[TypeInfo]) -> RegistryResult<()> {
        let name = record.name.clone();
        let component_type = record.declared_type.name().to_string();
        let scope = record.scope;

        self.state.write().insert(record, extra_types).map_err(|e| {
            warn!("Bean 注册失败: {}", e);
            e
        })?;

        info!("注册 Bean: {} ({}, {})", name, component_type, scope);
        self.emit(EventKind::ComponentRegistered {
            component_id: name,
            component_type,
            scope,
        });
        Ok(())
    }

    /// 按名称获取 Bean
    ///
    /// 单例返回已注册的实例；原型每次创建新实例，注入依赖并执行初始化回调，
    /// 创建失败时返回 `None`。
    pub fn get_bean(&self, name: &str) -> Option<BeanInstance> {
        let (scope, instance, descriptor) = {
            let state = self.state.read();
            let record = state.beans.get(name)?;
            (
                record.scope,
                record.instance.clone(),
                Arc::clone(&record.descriptor),
            )
        };

        match scope {
            Scope::Singleton => instance,
            Scope::Prototype => self
                .instantiate(name, &descriptor)
                .map_err(|e| match e {
                    CreationError::Cycle { .. } => {}
                    other => warn!("原型 Bean '{}' 创建失败: {}", name, other),
                })
                .ok(),
        }
    }

    /// 创建原型 Bean 的新实例
    ///
    /// 与 [`Registry::get_bean`] 相同，但保留失败原因。
    pub fn create_prototype(&self, name: &str) -> CreationResult<BeanInstance> {
        let descriptor = {
            let state = self.state.read();
            state
                .beans
                .get(name)
                .filter(|record| record.scope == Scope::Prototype)
                .map(|record| Arc::clone(&record.descriptor))
        };
        let descriptor = descriptor.ok_or_else(|| CreationError::NotPrototype {
            name: name.to_string(),
        })?;
        self.instantiate(name, &descriptor)
    }

    fn instantiate(&self, name: &str, descriptor: &Arc<ComponentDescriptor>) -> CreationResult<BeanInstance> {
        let _guard = CreationGuard::enter(self as *const Self as usize, name)?;
        let started = Instant::now();

        let bean = BeanInstance::create(descriptor).ok_or_else(|| CreationError::MissingFactory {
            name: name.to_string(),
        })?;
        self.injector.inject_dependencies(self, &bean)?;
        self.lifecycle.initialize_instance(name, &bean)?;

        let creation_time = started.elapsed();
        debug!("创建原型 Bean: {} ({:?})", name, creation_time);
        self.emit(EventKind::ComponentCreated {
            component_id: name.to_string(),
            component_type: descriptor.type_info().name().to_string(),
            creation_time,
        });
        Ok(bean)
    }

    /// 按类型获取 Bean
    ///
    /// 查找具体类型、指针类型或已绑定的接口类型。
    pub fn get_bean_by_type(&self, type_info: &TypeInfo) -> Option<BeanInstance> {
        let name = self.state.read().type_mapping.get(&type_info.id()).cloned()?;
        self.get_bean(&name)
    }

    /// 按名称获取 Bean 并转换为指定类型
    pub fn get_bean_as<D: ?Sized + 'static>(&self, name: &str) -> Option<Arc<D>> {
        self.get_bean(name)?.as_type::<D>()
    }

    /// 按类型获取 Bean 并转换为该类型
    pub fn get_bean_of<D: ?Sized + 'static>(&self) -> Option<Arc<D>> {
        self.get_bean_by_type(&TypeInfo::of::<D>())?.as_type::<D>()
    }

    /// 获取所有可赋值给指定类型的 Bean
    ///
    /// 声明实现了接口的 Bean 即使未按接口注册也会被返回。
    pub fn get_beans_of_type(&self, type_info: &TypeInfo) -> HashMap<String, BeanInstance> {
        let names: Vec<String> = {
            let state = self.state.read();
            state
                .order
                .iter()
                .filter(|name| {
                    state
                        .beans
                        .get(*name)
                        .is_some_and(|record| record.descriptor.is_assignable_to(type_info))
                })
                .cloned()
                .collect()
        };

        names
            .into_iter()
            .filter_map(|name| self.get_bean(&name).map(|bean| (name, bean)))
            .collect()
    }

    /// 是否存在指定名称的 Bean
    pub fn has_bean(&self, name: &str) -> bool {
        self.state.read().beans.contains_key(name)
    }

    /// 所有 Bean 名称（无序）
    pub fn list_beans(&self) -> Vec<String> {
        self.state.read().beans.keys().cloned().collect()
    }

    /// 按注册顺序排列的 Bean 名称
    pub fn registration_order(&self) -> Vec<String> {
        self.state.read().order.clone()
    }

    /// 获取 Bean 记录
    pub fn get_bean_definition(&self, name: &str) -> Option<BeanRecord> {
        self.state.read().beans.get(name).cloned()
    }

    /// 更新 Bean 的生命周期状态
    pub fn set_state(&self, name: &str, state: LifecycleState) -> bool {
        self.state
            .write()
            .beans
            .get_mut(name)
            .map(|record| record.state = state)
            .is_some()
    }

    /// Bean 数量
    pub fn len(&self) -> usize {
        self.state.read().beans.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.state.read().beans.is_empty()
    }

    /// 按注册顺序排列的单例实例
    pub fn managed_instances(&self) -> Vec<(String, BeanInstance)> {
        let state = self.state.read();
        state
            .order
            .iter()
            .filter_map(|name| {
                let record = state.beans.get(name)?;
                record
                    .instance
                    .as_ref()
                    .map(|bean| (name.clone(), bean.clone()))
            })
            .collect()
    }

    /// 为所有单例注入依赖
    pub fn wire_all(&self) -> InjectionResult<()> {
        self.injector.wire_all(self, &self.managed_instances())
    }

    /// 为容器外的实例注入依赖
    pub fn autowire(&self, bean: &BeanInstance) -> InjectionResult<InjectionReport> {
        self.injector.inject_dependencies(self, bean)
    }

    /// 使用缓存的描述符包装实例
    pub fn instance_of<T: Component>(&self, instance: Arc<T>) -> BeanInstance {
        BeanInstance::with_descriptor(instance, self.descriptors.resolve::<T>())
    }

    /// 获取类型的缓存描述符
    pub fn descriptor_of<T: Component>(&self) -> Arc<ComponentDescriptor> {
        self.descriptors.resolve::<T>()
    }

    /// 注入器
    pub const fn injector(&self) -> &Injector {
        &self.injector
    }

    /// 生命周期引擎
    pub const fn lifecycle(&self) -> &LifecycleEngine {
        &self.lifecycle
    }

    /// 清空注册表
    ///
    /// 只清理记录和映射，不调用任何生命周期回调。
    pub fn destroy(&self) {
        let (mut beans, order) = {
            let mut state = self.state.write();
            state.type_mapping.clear();
            (
                std::mem::take(&mut state.beans),
                std::mem::take(&mut state.order),
            )
        };

        for name in order {
            if let Some(record) = beans.remove(&name) {
                self.emit(EventKind::ComponentDestroyed {
                    component_id: record.name,
                    component_type: record.declared_type.name().to_string(),
                });
            }
        }
        info!("Bean 注册表已清空");
    }

    fn emit(&self, kind: EventKind) {
        dispatch(self.sink.as_ref(), &ContainerEvent::new(kind));
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_sink(Arc::new(TracingSink))
    }
}

impl BeanResolver for Registry {
    fn resolve_by_name(&self, name: &str) -> Option<BeanInstance> {
        self.get_bean(name)
    }

    fn resolve_by_type(&self, type_info: &TypeInfo) -> Option<BeanInstance> {
        self.get_bean_by_type(type_info)
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("beans", &self.registration_order())
            .field("injector", &self.injector)
            .finish_non_exhaustive()
    }
}
