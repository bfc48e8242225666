//! 字段级依赖注入

use ioc_common::{
    dispatch, BeanInstance, BeanResolver, Binding, ContainerEvent, EventKind, EventSink,
    FieldSpec, InjectionError, InjectionPolicy, InjectionResult,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// 单个实例的注入结果
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InjectionReport {
    /// 已注入的字段
    pub injected: Vec<&'static str>,
    /// 未能注入的字段
    pub unresolved: Vec<&'static str>,
}

impl InjectionReport {
    /// 所有字段是否都已注入
    pub fn is_complete(&self) -> bool {
        self.unresolved.is_empty()
    }
}

/// 依赖注入器
///
/// 不保存任何 Bean 状态，依赖通过 [`BeanResolver`] 查找。
pub struct Injector {
    sink: Arc<dyn EventSink>,
    policy: InjectionPolicy,
}

impl Injector {
    /// 创建注入器
    pub fn new(sink: Arc<dyn EventSink>, policy: InjectionPolicy) -> Self {
        Self { sink, policy }
    }

    /// 注入策略
    pub const fn policy(&self) -> InjectionPolicy {
        self.policy
    }

    /// 为实例注入依赖
    ///
    /// 按字段声明顺序解析。宽松策略下未解析的依赖只产生事件；
    /// 严格策略下必需字段未解析时返回错误，之前已写入的字段保持不变。
    pub fn inject_dependencies(
        &self,
        resolver: &dyn BeanResolver,
        target: &BeanInstance,
    ) -> InjectionResult<InjectionReport> {
        let owner = target.type_info().name();
        let mut report = InjectionReport::default();

        for field in target.descriptor().fields() {
            let resolved = match field.binding() {
                Binding::ByName(name) => resolver.resolve_by_name(name),
                Binding::ByType => resolver.resolve_by_type(field.target_type()),
            };

            let failure = match resolved {
                Some(dependency) if field.assign(target, &dependency) => {
                    debug!(
                        "注入依赖: {}.{} <- {}",
                        owner,
                        field.field_name(),
                        dependency.type_info().name()
                    );
                    self.emit(EventKind::DependencyInjected {
                        target_type: owner.to_string(),
                        dependency_type: dependency.type_info().name().to_string(),
                        field_name: field.field_name().to_string(),
                        by_name: field.binding().is_by_name(),
                    });
                    report.injected.push(field.field_name());
                    continue;
                }
                Some(dependency) => InjectionError::NotAssignable {
                    owner: owner.to_string(),
                    field: field.field_name().to_string(),
                    dependency: field.target_type().name().to_string(),
                    actual: dependency.type_info().name().to_string(),
                },
                None => InjectionError::Unresolved {
                    owner: owner.to_string(),
                    field: field.field_name().to_string(),
                    dependency: describe_binding(field),
                },
            };

            self.emit(EventKind::DependencyInjectionFailed {
                target_type: owner.to_string(),
                dependency_type: field.target_type().name().to_string(),
                field_name: field.field_name().to_string(),
                error: failure.to_string(),
            });
            report.unresolved.push(field.field_name());

            if self.policy == InjectionPolicy::Strict && !field.is_optional() {
                warn!("必需依赖未注入: {}", failure);
                return Err(failure);
            }
        }

        Ok(report)
    }

    /// 按给定顺序为每个 Bean 注入一次依赖
    ///
    /// 第一个失败即返回，错误中包含 Bean 名称。
    pub fn wire_all(
        &self,
        resolver: &dyn BeanResolver,
        beans: &[(String, BeanInstance)],
    ) -> InjectionResult<()> {
        debug!("开始装配 {} 个 Bean", beans.len());

        for (name, bean) in beans {
            self.inject_dependencies(resolver, bean)
                .map_err(|e| InjectionError::BeanWiring {
                    bean: name.clone(),
                    source: Box::new(e),
                })?;
        }

        Ok(())
    }

    fn emit(&self, kind: EventKind) {
        dispatch(self.sink.as_ref(), &ContainerEvent::new(kind));
    }
}

impl std::fmt::Debug for Injector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Injector")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

fn describe_binding(field: &FieldSpec) -> String {
    match field.binding() {
        Binding::ByName(name) => format!("'{name}'"),
        Binding::ByType => field.target_type().name().to_string(),
    }
}
