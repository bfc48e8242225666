//! 组件描述符
//!
//! 组件的名称、作用域、注入字段、接口与生命周期回调通过 [`DescriptorBuilder`]
//! 显式声明，由 [`Component::describe`] 返回。描述符按类型构建一次并缓存在
//! [`DescriptorCache`] 中，注入时不再重新推导。
//!
//! ```
//! use ioc_common::{Autowired, Component, ComponentDescriptor, HookResult, Initializer};
//! use std::sync::Arc;
//!
//! trait UserRepository: Send + Sync {
//!     fn find(&self, id: u32) -> Option<String>;
//! }
//!
//! #[derive(Default)]
//! struct MemoryUserRepository;
//!
//! impl UserRepository for MemoryUserRepository {
//!     fn find(&self, id: u32) -> Option<String> {
//!         (id == 1).then(|| "alice".to_string())
//!     }
//! }
//!
//! impl Component for MemoryUserRepository {
//!     fn describe() -> ComponentDescriptor {
//!         ComponentDescriptor::builder::<Self>()
//!             .name("userRepository")
//!             .implements::<dyn UserRepository>(|repo| repo)
//!             .build()
//!     }
//! }
//!
//! #[derive(Default)]
//! struct UserService {
//!     repository: Autowired<dyn UserRepository>,
//! }
//!
//! impl Initializer for UserService {
//!     fn init(&self) -> HookResult {
//!         Ok(())
//!     }
//! }
//!
//! impl Component for UserService {
//!     fn describe() -> ComponentDescriptor {
//!         ComponentDescriptor::builder::<Self>()
//!             .name("userService")
//!             .inject_by_type("repository", |svc| &svc.repository)
//!             .initializer()
//!             .build()
//!     }
//! }
//!
//! let descriptor = UserService::describe();
//! assert_eq!(descriptor.name(), Some("userService"));
//! assert_eq!(descriptor.fields().len(), 1);
//! ```

use crate::autowired::Autowired;
use crate::instance::{BeanInstance, ObjectRef};
use crate::lifecycle::{
    BeanNameAware, Destroyer, HookResult, Initializer, LifecyclePhase, PostConstruct, PreDestroy,
    Scope,
};
use crate::metadata::TypeInfo;
use dashmap::DashMap;
use std::any::{Any, TypeId};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// 组件 trait
///
/// 所有由容器管理的组件都必须实现此 trait。`describe` 是纯函数，
/// 返回该类型的静态元数据。
pub trait Component: Any + Send + Sync + Sized {
    /// 组件元数据
    fn describe() -> ComponentDescriptor;
}

type CastFn = Arc<dyn Fn(&ObjectRef) -> Option<Box<dyn Any + Send + Sync>> + Send + Sync>;
type AssignFn = Arc<dyn Fn(&(dyn Any + Send + Sync), &BeanInstance) -> bool + Send + Sync>;
type HookFn = Arc<dyn Fn(&(dyn Any + Send + Sync)) -> HookResult + Send + Sync>;
type NameHookFn = Arc<dyn Fn(&(dyn Any + Send + Sync), &str) + Send + Sync>;
pub(crate) type FactoryFn = Arc<dyn Fn() -> ObjectRef + Send + Sync>;

/// 字段绑定方式
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Binding {
    /// 按 Bean 名称绑定
    ByName(String),
    /// 按字段类型绑定
    ByType,
}

impl Binding {
    /// 是否按名称绑定
    pub const fn is_by_name(&self) -> bool {
        matches!(self, Self::ByName(_))
    }
}

/// 注入字段描述
#[derive(Clone)]
pub struct FieldSpec {
    field_name: &'static str,
    target_type: TypeInfo,
    binding: Binding,
    optional: bool,
    assign: AssignFn,
}

impl FieldSpec {
    /// 字段名称
    pub const fn field_name(&self) -> &'static str {
        self.field_name
    }

    /// 字段声明的依赖类型
    pub const fn target_type(&self) -> &TypeInfo {
        &self.target_type
    }

    /// 绑定方式
    pub const fn binding(&self) -> &Binding {
        &self.binding
    }

    /// 是否可选
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    /// 将依赖写入目标实例的字段
    ///
    /// 目标实例类型不符或依赖无法转换为字段类型时返回 `false`，字段保持不变。
    pub fn assign(&self, target: &BeanInstance, dependency: &BeanInstance) -> bool {
        (self.assign)(target.object(), dependency)
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("field_name", &self.field_name)
            .field("target_type", &self.target_type.name())
            .field("binding", &self.binding)
            .field("optional", &self.optional)
            .finish_non_exhaustive()
    }
}

#[derive(Clone)]
struct InterfaceSpec {
    type_info: TypeInfo,
    cast: CastFn,
}

#[derive(Clone)]
struct NamedHook {
    method: &'static str,
    hook: HookFn,
}

/// 组件生命周期回调集合
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    bean_name_aware: Option<NameHookFn>,
    init: Option<NamedHook>,
    post_construct: Option<NamedHook>,
    custom_init: Option<NamedHook>,
    pre_destroy: Option<NamedHook>,
    destroy: Option<NamedHook>,
    custom_destroy: Option<NamedHook>,
}

impl LifecycleHooks {
    fn slot(&self, phase: LifecyclePhase) -> Option<&NamedHook> {
        match phase {
            LifecyclePhase::BeanNameAware => None,
            LifecyclePhase::Init => self.init.as_ref(),
            LifecyclePhase::PostConstruct => self.post_construct.as_ref(),
            LifecyclePhase::CustomInit => self.custom_init.as_ref(),
            LifecyclePhase::PreDestroy => self.pre_destroy.as_ref(),
            LifecyclePhase::Destroy => self.destroy.as_ref(),
            LifecyclePhase::CustomDestroy => self.custom_destroy.as_ref(),
        }
    }

    /// 是否声明了指定阶段的回调
    pub fn has(&self, phase: LifecyclePhase) -> bool {
        match phase {
            LifecyclePhase::BeanNameAware => self.bean_name_aware.is_some(),
            _ => self.slot(phase).is_some(),
        }
    }

    /// 指定阶段回调的方法名称
    pub fn method_name(&self, phase: LifecyclePhase) -> Option<&'static str> {
        match phase {
            LifecyclePhase::BeanNameAware => self
                .bean_name_aware
                .as_ref()
                .map(|_| phase.default_method_name()),
            _ => self.slot(phase).map(|hook| hook.method),
        }
    }

    /// 调用名称感知回调，未声明时返回 `false`
    pub fn set_bean_name(&self, target: &BeanInstance, name: &str) -> bool {
        self.bean_name_aware.as_ref().map_or(false, |hook| {
            hook(target.object(), name);
            true
        })
    }

    /// 调用指定阶段的回调，未声明时返回 `None`
    pub fn invoke(&self, phase: LifecyclePhase, target: &BeanInstance) -> Option<HookResult> {
        self.slot(phase).map(|hook| (hook.hook)(target.object()))
    }
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let declared: Vec<&str> = [
            LifecyclePhase::BeanNameAware,
            LifecyclePhase::Init,
            LifecyclePhase::PostConstruct,
            LifecyclePhase::CustomInit,
            LifecyclePhase::PreDestroy,
            LifecyclePhase::Destroy,
            LifecyclePhase::CustomDestroy,
        ]
        .into_iter()
        .filter_map(|phase| self.method_name(phase))
        .collect();
        f.debug_tuple("LifecycleHooks").field(&declared).finish()
    }
}

/// 组件描述符
#[derive(Clone)]
pub struct ComponentDescriptor {
    name: Option<String>,
    type_info: TypeInfo,
    pointer_type: TypeInfo,
    scope: Scope,
    fields: Vec<FieldSpec>,
    concrete: CastFn,
    interfaces: Vec<InterfaceSpec>,
    hooks: LifecycleHooks,
    factory: Option<FactoryFn>,
}

impl ComponentDescriptor {
    /// 创建描述符构建器
    pub fn builder<T: Component>() -> DescriptorBuilder<T> {
        DescriptorBuilder::new()
    }

    /// 获取类型的描述符
    pub fn of<T: Component>() -> Self {
        T::describe()
    }

    /// 声明的组件名称
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// 注册时使用的 Bean 名称
    ///
    /// 未声明名称时按约定使用小写的简短类型名称。
    pub fn bean_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.type_info.short_name().to_lowercase())
    }

    /// 具体类型信息
    pub const fn type_info(&self) -> &TypeInfo {
        &self.type_info
    }

    /// 指针类型信息（`Arc<T>`）
    pub const fn pointer_type(&self) -> &TypeInfo {
        &self.pointer_type
    }

    /// 作用域
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// 注入字段，按声明顺序
    pub fn fields(&self) -> &[FieldSpec] {
        &self.fields
    }

    /// 声明实现的接口
    pub fn interfaces(&self) -> impl Iterator<Item = &TypeInfo> + '_ {
        self.interfaces.iter().map(|spec| &spec.type_info)
    }

    /// 是否声明实现了指定接口
    pub fn declares_interface(&self, interface: &TypeInfo) -> bool {
        self.interfaces
            .iter()
            .any(|spec| spec.type_info.id() == interface.id())
    }

    /// 实例是否可赋值给指定类型（具体类型、指针类型或声明的接口）
    pub fn is_assignable_to(&self, target: &TypeInfo) -> bool {
        target.id() == self.type_info.id()
            || target.id() == self.pointer_type.id()
            || self.declares_interface(target)
    }

    /// 生命周期回调
    pub const fn hooks(&self) -> &LifecycleHooks {
        &self.hooks
    }

    /// 是否可以创建新实例
    pub fn has_factory(&self) -> bool {
        self.factory.is_some()
    }

    /// 使用 `Default` 作为实例工厂
    pub fn with_default_factory<T: Component + Default>(mut self) -> Self {
        debug_assert!(self.type_info.is::<T>());
        self.factory = Some(default_factory::<T>());
        self
    }

    pub(crate) fn factory(&self) -> Option<&FactoryFn> {
        self.factory.as_ref()
    }

    pub(crate) fn cast(&self, object: &ObjectRef, target: TypeId) -> Option<Box<dyn Any + Send + Sync>> {
        if target == self.type_info.id() {
            return (self.concrete)(object);
        }
        self.interfaces
            .iter()
            .find(|spec| spec.type_info.id() == target)
            .and_then(|spec| (spec.cast)(object))
    }
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("type", &self.type_info.name())
            .field("scope", &self.scope)
            .field("fields", &self.fields)
            .field(
                "interfaces",
                &self.interfaces().map(TypeInfo::name).collect::<Vec<_>>(),
            )
            .field("hooks", &self.hooks)
            .field("has_factory", &self.has_factory())
            .finish()
    }
}

fn default_factory<T: Component + Default>() -> FactoryFn {
    Arc::new(|| Arc::new(T::default()) as ObjectRef)
}

fn typed_hook<T: Component>(method: &'static str, hook: fn(&T) -> HookResult) -> NamedHook {
    NamedHook {
        method,
        hook: Arc::new(move |target: &(dyn Any + Send + Sync)| match target.downcast_ref::<T>() {
            Some(typed) => hook(typed),
            None => Err(format!("目标实例不是 {}", std::any::type_name::<T>()).into()),
        }),
    }
}

/// 组件描述符构建器
pub struct DescriptorBuilder<T> {
    descriptor: ComponentDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Component> DescriptorBuilder<T> {
    fn new() -> Self {
        let concrete: CastFn = Arc::new(|object: &ObjectRef| {
            object
                .clone()
                .downcast::<T>()
                .ok()
                .map(|typed| Box::new(typed) as Box<dyn Any + Send + Sync>)
        });

        Self {
            descriptor: ComponentDescriptor {
                name: None,
                type_info: TypeInfo::of::<T>(),
                pointer_type: TypeInfo::of::<Arc<T>>(),
                scope: Scope::Singleton,
                fields: Vec::new(),
                concrete,
                interfaces: Vec::new(),
                hooks: LifecycleHooks::default(),
                factory: None,
            },
            _marker: PhantomData,
        }
    }

    /// 设置组件名称
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.descriptor.name = Some(name.into());
        self
    }

    /// 单例作用域（默认）
    pub fn singleton(mut self) -> Self {
        self.descriptor.scope = Scope::Singleton;
        self
    }

    /// 原型作用域，新实例由 `Default` 创建
    pub fn prototype(mut self) -> Self
    where
        T: Default,
    {
        self.descriptor.scope = Scope::Prototype;
        self.descriptor.factory = Some(default_factory::<T>());
        self
    }

    /// 声明按名称注入的字段
    pub fn inject_by_name<D>(
        self,
        field: &'static str,
        bean_name: impl Into<String>,
        slot: fn(&T) -> &Autowired<D>,
    ) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
    {
        self.field(field, Binding::ByName(bean_name.into()), false, slot)
    }

    /// 声明按类型注入的字段
    pub fn inject_by_type<D>(self, field: &'static str, slot: fn(&T) -> &Autowired<D>) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
    {
        self.field(field, Binding::ByType, false, slot)
    }

    /// 声明按名称注入的可选字段
    pub fn optional_by_name<D>(
        self,
        field: &'static str,
        bean_name: impl Into<String>,
        slot: fn(&T) -> &Autowired<D>,
    ) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
    {
        self.field(field, Binding::ByName(bean_name.into()), true, slot)
    }

    /// 声明按类型注入的可选字段
    pub fn optional_by_type<D>(self, field: &'static str, slot: fn(&T) -> &Autowired<D>) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
    {
        self.field(field, Binding::ByType, true, slot)
    }

    fn field<D>(
        mut self,
        field_name: &'static str,
        binding: Binding,
        optional: bool,
        slot: fn(&T) -> &Autowired<D>,
    ) -> Self
    where
        D: ?Sized + Send + Sync + 'static,
    {
        let assign: AssignFn = Arc::new(
            move |target: &(dyn Any + Send + Sync), dependency: &BeanInstance| {
                match (target.downcast_ref::<T>(), dependency.as_type::<D>()) {
                    (Some(owner), Some(value)) => {
                        slot(owner).set(value);
                        true
                    }
                    _ => false,
                }
            },
        );

        self.descriptor.fields.push(FieldSpec {
            field_name,
            target_type: TypeInfo::of::<D>(),
            binding,
            optional,
            assign,
        });
        self
    }

    /// 声明实现的接口
    ///
    /// 仅使实例具备绑定资格，接口映射需通过按接口注册显式建立。
    pub fn implements<I>(mut self, cast: fn(Arc<T>) -> Arc<I>) -> Self
    where
        I: ?Sized + Send + Sync + 'static,
    {
        let cast: CastFn = Arc::new(move |object: &ObjectRef| {
            object
                .clone()
                .downcast::<T>()
                .ok()
                .map(|typed| Box::new(cast(typed)) as Box<dyn Any + Send + Sync>)
        });

        let type_info = TypeInfo::of::<I>();
        self.descriptor
            .interfaces
            .retain(|spec| spec.type_info.id() != type_info.id());
        self.descriptor.interfaces.push(InterfaceSpec { type_info, cast });
        self
    }

    /// 启用名称感知回调
    pub fn bean_name_aware(mut self) -> Self
    where
        T: BeanNameAware,
    {
        self.descriptor.hooks.bean_name_aware = Some(Arc::new(
            |target: &(dyn Any + Send + Sync), name: &str| {
                if let Some(typed) = target.downcast_ref::<T>() {
                    typed.set_bean_name(name);
                }
            },
        ));
        self
    }

    /// 启用主初始化回调
    pub fn initializer(mut self) -> Self
    where
        T: Initializer,
    {
        self.descriptor.hooks.init = Some(typed_hook::<T>(
            LifecyclePhase::Init.default_method_name(),
            <T as Initializer>::init,
        ));
        self
    }

    /// 启用构造后回调
    pub fn post_construct(mut self) -> Self
    where
        T: PostConstruct,
    {
        self.descriptor.hooks.post_construct = Some(typed_hook::<T>(
            LifecyclePhase::PostConstruct.default_method_name(),
            <T as PostConstruct>::post_construct,
        ));
        self
    }

    /// 设置自定义初始化方法
    pub fn init_method(mut self, method: &'static str, hook: fn(&T) -> HookResult) -> Self {
        self.descriptor.hooks.custom_init = Some(typed_hook::<T>(method, hook));
        self
    }

    /// 启用销毁前回调
    pub fn pre_destroy(mut self) -> Self
    where
        T: PreDestroy,
    {
        self.descriptor.hooks.pre_destroy = Some(typed_hook::<T>(
            LifecyclePhase::PreDestroy.default_method_name(),
            <T as PreDestroy>::pre_destroy,
        ));
        self
    }

    /// 启用主销毁回调
    pub fn destroyer(mut self) -> Self
    where
        T: Destroyer,
    {
        self.descriptor.hooks.destroy = Some(typed_hook::<T>(
            LifecyclePhase::Destroy.default_method_name(),
            <T as Destroyer>::destroy,
        ));
        self
    }

    /// 设置自定义销毁方法
    pub fn destroy_method(mut self, method: &'static str, hook: fn(&T) -> HookResult) -> Self {
        self.descriptor.hooks.custom_destroy = Some(typed_hook::<T>(method, hook));
        self
    }

    /// 构建描述符
    pub fn build(self) -> ComponentDescriptor {
        self.descriptor
    }
}

/// 组件描述符缓存
///
/// 每个类型只缓存一个描述符。[`Component::describe`] 在缓存锁之外执行，
/// 其中可以再次通过同一缓存解析其他类型；并发首次访问时先写入的结果生效。
#[derive(Debug, Default)]
pub struct DescriptorCache {
    descriptors: DashMap<TypeId, Arc<ComponentDescriptor>>,
}

impl DescriptorCache {
    /// 创建新的描述符缓存
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取类型的描述符，首次访问时构建
    pub fn resolve<T: Component>(&self) -> Arc<ComponentDescriptor> {
        let id = TypeId::of::<T>();
        if let Some(cached) = self.descriptors.get(&id) {
            return Arc::clone(&cached);
        }

        let built = Arc::new(T::describe());
        let entry = self.descriptors.entry(id).or_insert(built);
        Arc::clone(&entry)
    }

    /// 已缓存的类型数量
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// 缓存是否为空
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// 清空缓存
    pub fn clear(&self) {
        self.descriptors.clear();
    }
}
