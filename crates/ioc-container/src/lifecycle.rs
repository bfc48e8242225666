//! 生命周期引擎
//!
//! 负责按固定顺序调用组件的初始化和销毁回调，并记录初始化顺序与销毁顺序。

use ioc_common::{
    dispatch, BeanInstance, ContainerEvent, EventKind, EventSink, LifecycleError,
    LifecyclePhase, LifecycleResult,
};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct LifecycleOrder {
    init: Vec<String>,
    destroy: Vec<String>,
}

/// 生命周期引擎
pub struct LifecycleEngine {
    order: Mutex<LifecycleOrder>,
    sink: Arc<dyn EventSink>,
}

impl LifecycleEngine {
    /// 创建生命周期引擎
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self {
            order: Mutex::new(LifecycleOrder::default()),
            sink,
        }
    }

    /// 初始化 Bean
    ///
    /// 依次执行名称感知、主初始化、构造后和自定义初始化回调，
    /// 任一回调失败即停止，Bean 名称不会进入初始化顺序。
    pub fn process_initialization(&self, name: &str, bean: &BeanInstance) -> LifecycleResult<()> {
        self.initialize_instance(name, bean)?;
        self.record_initialized(name);
        info!("Bean 初始化完成: {}", name);
        Ok(())
    }

    /// 对单个实例执行初始化回调，不记入初始化顺序
    ///
    /// 原型 Bean 每次创建都会经过这里。
    pub fn initialize_instance(&self, name: &str, bean: &BeanInstance) -> LifecycleResult<()> {
        if bean.descriptor().hooks().set_bean_name(bean, name) {
            debug!("设置 Bean 名称: {}", name);
        }

        LifecyclePhase::INIT_SEQUENCE
            .into_iter()
            .try_for_each(|phase| self.run_hook(name, bean, phase))
    }

    pub(crate) fn record_initialized(&self, name: &str) {
        self.order.lock().init.push(name.to_string());
    }

    /// 销毁 Bean
    ///
    /// 依次执行销毁前、主销毁和自定义销毁回调，任一回调失败即跳过后续回调。
    /// 无论成功与否，Bean 名称都会按实际销毁次序记入销毁顺序。
    pub fn process_destruction(&self, name: &str, bean: &BeanInstance) -> LifecycleResult<()> {
        let result = LifecyclePhase::DESTROY_SEQUENCE
            .into_iter()
            .try_for_each(|phase| self.run_hook(name, bean, phase));

        self.order.lock().destroy.push(name.to_string());

        match &result {
            Ok(()) => info!("Bean 销毁完成: {}", name),
            Err(e) => warn!("Bean 销毁失败: {}", e),
        }
        result
    }

    fn run_hook(&self, name: &str, bean: &BeanInstance, phase: LifecyclePhase) -> LifecycleResult<()> {
        let hooks = bean.descriptor().hooks();
        let Some(method) = hooks.method_name(phase) else {
            return Ok(());
        };
        let component_type = bean.type_info().name().to_string();

        self.emit(if phase.is_destruction() {
            EventKind::LifecycleStopping {
                component_id: name.to_string(),
                component_type: component_type.clone(),
                method_name: method.to_string(),
            }
        } else {
            EventKind::LifecycleStarting {
                component_id: name.to_string(),
                component_type: component_type.clone(),
                method_name: method.to_string(),
            }
        });

        let started = Instant::now();
        let result = hooks.invoke(phase, bean).unwrap_or(Ok(()));
        let duration = started.elapsed();
        let error = result.as_ref().err().map(ToString::to_string);

        self.emit(if phase.is_destruction() {
            EventKind::LifecycleStopped {
                component_id: name.to_string(),
                component_type,
                method_name: method.to_string(),
                duration,
                error,
            }
        } else {
            EventKind::LifecycleStarted {
                component_id: name.to_string(),
                component_type,
                method_name: method.to_string(),
                duration,
                error,
            }
        });

        result.map_err(|source| LifecycleError::Hook {
            bean: name.to_string(),
            phase,
            method: method.to_string(),
            source,
        })
    }

    /// 初始化顺序快照
    pub fn init_order(&self) -> Vec<String> {
        self.order.lock().init.clone()
    }

    /// 销毁顺序快照
    pub fn destroy_order(&self) -> Vec<String> {
        self.order.lock().destroy.clone()
    }

    /// 清空顺序记录
    pub fn reset(&self) {
        let mut order = self.order.lock();
        order.init.clear();
        order.destroy.clear();
    }

    fn emit(&self, kind: EventKind) {
        dispatch(self.sink.as_ref(), &ContainerEvent::new(kind));
    }
}

impl std::fmt::Debug for LifecycleEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let order = self.order.lock();
        f.debug_struct("LifecycleEngine")
            .field("init", &order.init)
            .field("destroy", &order.destroy)
            .finish_non_exhaustive()
    }
}
