//! 容器配置
//!
//! 配置只影响容器自身的行为（注入策略、事件输出），不参与组件装配。

use crate::errors::{ConfigError, ConfigResult};
use crate::events::EventLevel;
use crate::sink::{EventSink, LeveledSink, NopSink, TracingSink, WriterFormat, WriterSink};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error};

/// 环境变量前缀
pub const ENV_PREFIX: &str = "IOC";

/// 依赖注入策略
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InjectionPolicy {
    /// 未解析的依赖只产生事件，字段保持为空
    #[default]
    Lenient,
    /// 必需字段未解析时注入失败
    Strict,
}

/// 事件接收器类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkKind {
    /// 输出到 tracing
    #[default]
    Tracing,
    /// 文本输出到标准错误
    Console,
    /// JSON Lines 输出到标准错误
    Json,
    /// 不输出
    None,
}

/// 容器配置
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerConfig {
    /// 依赖注入策略
    pub injection_policy: InjectionPolicy,
    /// 事件最低级别
    pub event_level: EventLevel,
    /// 事件接收器类型
    pub sink: SinkKind,
}

impl ContainerConfig {
    /// 从可选的配置文件和 `IOC_*` 环境变量加载配置
    ///
    /// 环境变量优先于文件，例如 `IOC_INJECTION_POLICY=strict`。
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            if !path.exists() {
                error!("配置文件不存在: {}", path.display());
                return Err(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                });
            }
            debug!("加载容器配置文件: {}", path.display());
            builder = builder.add_source(config::File::from(path));
        }

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(|e| {
                error!("容器配置构建失败: {}", e);
                ConfigError::from(e)
            })?;

        let loaded: Self = settings.try_deserialize().map_err(|e| {
            error!("容器配置绑定失败: {}", e);
            ConfigError::from(e)
        })?;

        debug!(
            "容器配置加载成功: policy={:?}, level={}, sink={:?}",
            loaded.injection_policy, loaded.event_level, loaded.sink
        );
        Ok(loaded)
    }

    /// 仅从环境变量加载配置
    pub fn from_env() -> ConfigResult<Self> {
        Self::load(None)
    }

    /// 设置注入策略
    pub fn with_injection_policy(mut self, policy: InjectionPolicy) -> Self {
        self.injection_policy = policy;
        self
    }

    /// 设置事件最低级别
    pub fn with_event_level(mut self, level: EventLevel) -> Self {
        self.event_level = level;
        self
    }

    /// 设置事件接收器类型
    pub fn with_sink(mut self, sink: SinkKind) -> Self {
        self.sink = sink;
        self
    }

    /// 按配置创建事件接收器
    pub fn build_sink(&self) -> Arc<dyn EventSink> {
        let inner: Arc<dyn EventSink> = match self.sink {
            SinkKind::None => return Arc::new(NopSink),
            SinkKind::Tracing => Arc::new(TracingSink),
            SinkKind::Console => Arc::new(WriterSink::stderr(WriterFormat::Text)),
            SinkKind::Json => Arc::new(WriterSink::stderr(WriterFormat::Json)),
        };
        Arc::new(LeveledSink::new(inner, self.event_level))
    }
}
