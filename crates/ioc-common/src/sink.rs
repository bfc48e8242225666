//! 容器事件接收器
//!
//! 所有调用均为同步且不返回结果。容器通过 [`dispatch`] 调用接收器，
//! 接收器内部的 panic 会被捕获并记录，不影响容器操作。

use crate::events::{ContainerEvent, EventLevel};
use parking_lot::Mutex;
use std::fmt;
use std::io::{self, Write};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 事件接收器 trait
pub trait EventSink: Send + Sync {
    /// 处理事件
    fn log_event(&self, event: &ContainerEvent);
}

/// 向接收器投递事件，捕获接收器内部的 panic
pub fn dispatch(sink: &dyn EventSink, event: &ContainerEvent) {
    if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| sink.log_event(event))) {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| (*s).to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "未知原因".to_string());
        error!(event = event.name(), reason = %reason, "事件接收器处理事件时发生 panic");
    }
}

/// 忽略所有事件
#[derive(Debug, Default, Clone, Copy)]
pub struct NopSink;

impl EventSink for NopSink {
    fn log_event(&self, _event: &ContainerEvent) {}
}

/// 通过 tracing 输出事件（默认接收器）
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl EventSink for TracingSink {
    fn log_event(&self, event: &ContainerEvent) {
        let name = event.name();
        match event.level() {
            EventLevel::Debug => debug!(target: "ioc::events", event = name, "{}", event),
            EventLevel::Info => info!(target: "ioc::events", event = name, "{}", event),
            EventLevel::Warn => warn!(target: "ioc::events", event = name, "{}", event),
            EventLevel::Error => error!(target: "ioc::events", event = name, "{}", event),
            EventLevel::Off => {}
        }
    }
}

/// 文本输出格式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriterFormat {
    /// 可读文本，每行一个事件
    #[default]
    Text,
    /// JSON Lines
    Json,
}

/// 写入任意 `Write` 的接收器
pub struct WriterSink<W: Write + Send> {
    writer: Mutex<W>,
    format: WriterFormat,
}

impl WriterSink<io::Stderr> {
    /// 输出到标准错误
    pub fn stderr(format: WriterFormat) -> Self {
        Self::new(io::stderr(), format)
    }
}

impl<W: Write + Send> WriterSink<W> {
    /// 创建写入接收器
    pub fn new(writer: W, format: WriterFormat) -> Self {
        Self {
            writer: Mutex::new(writer),
            format,
        }
    }

    /// 取回底层写入器
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }

    fn write_event(&self, event: &ContainerEvent) -> io::Result<()> {
        let mut writer = self.writer.lock();
        match self.format {
            WriterFormat::Text => writeln!(writer, "{event}"),
            WriterFormat::Json => {
                serde_json::to_writer(&mut *writer, event)?;
                writeln!(writer)
            }
        }
    }
}

impl<W: Write + Send> EventSink for WriterSink<W> {
    fn log_event(&self, event: &ContainerEvent) {
        if let Err(e) = self.write_event(event) {
            warn!(event = event.name(), error = %e, "事件写入失败");
        }
    }
}

impl<W: Write + Send> fmt::Debug for WriterSink<W> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WriterSink")
            .field("format", &self.format)
            .finish_non_exhaustive()
    }
}

/// 同时投递到多个接收器
#[derive(Default, Clone)]
pub struct MultiSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl MultiSink {
    /// 创建空的组合接收器
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加接收器
    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    /// 添加接收器
    pub fn push(&mut self, sink: Arc<dyn EventSink>) {
        self.sinks.push(sink);
    }

    /// 接收器数量
    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    /// 是否为空
    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }
}

impl EventSink for MultiSink {
    fn log_event(&self, event: &ContainerEvent) {
        for sink in &self.sinks {
            dispatch(sink.as_ref(), event);
        }
    }
}

impl fmt::Debug for MultiSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiSink")
            .field("sinks", &self.sinks.len())
            .finish()
    }
}

type EventFilter = Box<dyn Fn(&ContainerEvent) -> bool + Send + Sync>;

/// 只投递满足条件的事件
pub struct FilteredSink {
    inner: Arc<dyn EventSink>,
    filter: EventFilter,
}

impl FilteredSink {
    /// 创建过滤接收器
    pub fn new<F>(inner: Arc<dyn EventSink>, filter: F) -> Self
    where
        F: Fn(&ContainerEvent) -> bool + Send + Sync + 'static,
    {
        Self {
            inner,
            filter: Box::new(filter),
        }
    }
}

impl EventSink for FilteredSink {
    fn log_event(&self, event: &ContainerEvent) {
        if (self.filter)(event) {
            self.inner.log_event(event);
        }
    }
}

impl fmt::Debug for FilteredSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilteredSink").finish_non_exhaustive()
    }
}

/// 按事件级别过滤
pub struct LeveledSink {
    inner: Arc<dyn EventSink>,
    level: EventLevel,
}

impl LeveledSink {
    /// 创建分级接收器
    pub fn new(inner: Arc<dyn EventSink>, level: EventLevel) -> Self {
        Self { inner, level }
    }

    /// 最低投递级别
    pub const fn level(&self) -> EventLevel {
        self.level
    }
}

impl EventSink for LeveledSink {
    fn log_event(&self, event: &ContainerEvent) {
        if self.level != EventLevel::Off && event.level() >= self.level {
            self.inner.log_event(event);
        }
    }
}

impl fmt::Debug for LeveledSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LeveledSink")
            .field("level", &self.level)
            .finish_non_exhaustive()
    }
}

/// 在内存中记录事件
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ContainerEvent>>,
}

impl RecordingSink {
    /// 创建记录接收器
    pub fn new() -> Self {
        Self::default()
    }

    /// 已记录事件的快照
    pub fn events(&self) -> Vec<ContainerEvent> {
        self.events.lock().clone()
    }

    /// 已记录事件的名称
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(ContainerEvent::name).collect()
    }

    /// 指定名称的事件数量
    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name() == name).count()
    }

    /// 清空记录
    pub fn clear(&self) {
        self.events.lock().clear();
    }
}

impl EventSink for RecordingSink {
    fn log_event(&self, event: &ContainerEvent) {
        self.events.lock().push(event.clone());
    }
}
