//! 元数据定义
//!
//! 提供类型引用信息

use std::any::TypeId;
use std::fmt;

/// 类型信息
///
/// 同时用于具体类型和 `dyn Trait` 接口类型。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
}

impl TypeInfo {
    /// 从类型获取类型信息
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// 类型ID
    pub const fn id(&self) -> TypeId {
        self.id
    }

    /// 完整类型名称
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// 获取简短的类型名称（不包含模块路径）
    ///
    /// 泛型类型保持完整名称。
    pub fn short_name(&self) -> &'static str {
        if self.name.contains('<') {
            return self.name;
        }
        self.name.rsplit("::").next().unwrap_or(self.name)
    }

    /// 是否为指定类型
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
