//! Bean 解析抽象

use crate::instance::BeanInstance;
use crate::metadata::TypeInfo;

/// Bean 解析器
///
/// 注入器通过此 trait 查找依赖，不直接依赖具体的注册表实现。
pub trait BeanResolver: Send + Sync {
    /// 按名称解析
    fn resolve_by_name(&self, name: &str) -> Option<BeanInstance>;

    /// 按类型解析
    ///
    /// 先查具体类型的映射，再查接口映射。
    fn resolve_by_type(&self, type_info: &TypeInfo) -> Option<BeanInstance>;
}
