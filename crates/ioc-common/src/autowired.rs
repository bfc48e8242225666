//! 可注入字段槽位

use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// 可注入字段
///
/// 组件结构体中声明为注入目标的字段使用此类型。零值为空槽位，
/// 由注入器在装配时写入依赖实例。`T` 可以是具体类型，也可以是 `dyn Trait`。
pub struct Autowired<T: ?Sized> {
    slot: RwLock<Option<Arc<T>>>,
}

impl<T: ?Sized> Autowired<T> {
    /// 创建空槽位
    pub fn new() -> Self {
        Self {
            slot: RwLock::new(None),
        }
    }

    /// 创建已装配的槽位
    pub fn wired(value: Arc<T>) -> Self {
        Self {
            slot: RwLock::new(Some(value)),
        }
    }

    /// 获取已注入的依赖
    pub fn get(&self) -> Option<Arc<T>> {
        self.slot.read().clone()
    }

    /// 写入依赖
    pub fn set(&self, value: Arc<T>) {
        *self.slot.write() = Some(value);
    }

    /// 清空槽位
    pub fn clear(&self) {
        *self.slot.write() = None;
    }

    /// 是否已注入
    pub fn is_wired(&self) -> bool {
        self.slot.read().is_some()
    }
}

impl<T: ?Sized> Default for Autowired<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> fmt::Debug for Autowired<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Autowired")
            .field("type", &std::any::type_name::<T>())
            .field("wired", &self.is_wired())
            .finish()
    }
}
