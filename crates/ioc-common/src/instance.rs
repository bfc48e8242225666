//! Bean 实例句柄

use crate::descriptor::{Component, ComponentDescriptor};
use crate::metadata::TypeInfo;
use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

/// 类型擦除后的共享实例
pub type ObjectRef = Arc<dyn Any + Send + Sync>;

/// Bean 实例
///
/// 共享实例与其组件描述符的组合，克隆只增加引用计数。
#[derive(Clone)]
pub struct BeanInstance {
    object: ObjectRef,
    descriptor: Arc<ComponentDescriptor>,
}

impl BeanInstance {
    /// 包装组件实例
    pub fn new<T: Component>(instance: Arc<T>) -> Self {
        Self::with_descriptor(instance, Arc::new(T::describe()))
    }

    /// 使用已缓存的描述符包装组件实例
    pub fn with_descriptor<T: Component>(
        instance: Arc<T>,
        descriptor: Arc<ComponentDescriptor>,
    ) -> Self {
        debug_assert!(descriptor.type_info().is::<T>());
        Self {
            object: instance,
            descriptor,
        }
    }

    /// 通过描述符的实例工厂创建新实例
    pub fn create(descriptor: &Arc<ComponentDescriptor>) -> Option<Self> {
        let factory = descriptor.factory()?;
        Some(Self {
            object: factory(),
            descriptor: Arc::clone(descriptor),
        })
    }

    /// 类型擦除后的实例引用
    pub fn object(&self) -> &(dyn Any + Send + Sync) {
        &*self.object
    }

    /// 组件描述符
    pub fn descriptor(&self) -> &Arc<ComponentDescriptor> {
        &self.descriptor
    }

    /// 具体类型信息
    pub fn type_info(&self) -> TypeInfo {
        *self.descriptor.type_info()
    }

    /// 以具体类型或声明的接口类型查看实例
    pub fn as_type<D: ?Sized + 'static>(&self) -> Option<Arc<D>> {
        self.descriptor
            .cast(&self.object, TypeId::of::<D>())?
            .downcast::<Arc<D>>()
            .ok()
            .map(|view| *view)
    }

    /// 转换为具体类型
    pub fn downcast<T: Component>(&self) -> Option<Arc<T>> {
        Arc::clone(&self.object).downcast::<T>().ok()
    }

    /// 是否为同一个实例
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::as_ptr(&self.object).cast::<()>() == Arc::as_ptr(&other.object).cast::<()>()
    }
}

impl<T: Component> From<Arc<T>> for BeanInstance {
    fn from(instance: Arc<T>) -> Self {
        Self::new(instance)
    }
}

impl fmt::Debug for BeanInstance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BeanInstance")
            .field("type", &self.descriptor.type_info().name())
            .field("address", &Arc::as_ptr(&self.object).cast::<()>())
            .finish()
    }
}
