//! 应用事件
//!
//! 上下文只通过 [`ApplicationEventProcessor`] 这个窄接口与事件总线交互：
//! 启动完成后投递 `Started`，关闭时同步通知 `Stopped` 与 `Closed`。

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use di_abstractions::{Capabilities, Component};
use infrastructure_common::InfrastructureError;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, error, info, warn};

/// 默认事件队列容量
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 4096;

/// 事件种类
#[derive(Debug, Clone, PartialEq)]
pub enum ApplicationEventKind {
    /// 上下文启动完成
    Started,
    /// 上下文开始关闭
    Stopped,
    /// 上下文关闭完成
    Closed,
    /// 业务负载
    Payload(Value),
}

impl fmt::Display for ApplicationEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Started => f.write_str("started"),
            Self::Stopped => f.write_str("stopped"),
            Self::Closed => f.write_str("closed"),
            Self::Payload(_) => f.write_str("payload"),
        }
    }
}

/// 应用事件
#[derive(Debug, Clone)]
pub struct ApplicationEvent {
    kind: ApplicationEventKind,
    occurred_at: DateTime<Utc>,
}

impl ApplicationEvent {
    /// 以当前时间创建事件
    pub fn new(kind: ApplicationEventKind) -> Self {
        Self {
            kind,
            occurred_at: Utc::now(),
        }
    }

    /// 业务负载事件
    pub fn payload(value: impl Into<Value>) -> Self {
        Self::new(ApplicationEventKind::Payload(value.into()))
    }

    /// 事件种类
    pub fn kind(&self) -> &ApplicationEventKind {
        &self.kind
    }

    /// 发生时间
    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    /// 负载，非负载事件返回 `None`
    pub fn payload_value(&self) -> Option<&Value> {
        match &self.kind {
            ApplicationEventKind::Payload(value) => Some(value),
            _ => None,
        }
    }
}

/// 事件监听器
///
/// 注册为组件的监听器会在注册时自动加入事件总线。
pub trait ApplicationEventListener: Send + Sync {
    /// 处理事件
    fn on_application_event(&self, event: &ApplicationEvent);
}

/// 事件发布者
pub trait ApplicationEventPublisher: Send + Sync {
    /// 投递到队列，由消费线程异步分发
    fn publish_event(&self, event: ApplicationEvent) -> Result<(), InfrastructureError>;

    /// 在当前线程同步分发
    fn notify_event(&self, event: ApplicationEvent) -> Result<(), InfrastructureError>;
}

di_abstractions::capability!(dyn ApplicationEventListener, dyn ApplicationEventPublisher);

/// 事件处理器
pub trait ApplicationEventProcessor: ApplicationEventPublisher {
    /// 启动消费
    fn start(&self) -> Result<(), InfrastructureError>;

    /// 停止消费，已入队的事件会先分发完
    fn close(&self) -> Result<(), InfrastructureError>;

    /// 添加监听器
    fn add_listener(
        &self,
        listener: Arc<dyn ApplicationEventListener>,
    ) -> Result<(), InfrastructureError>;
}

type Listeners = Arc<Mutex<Vec<Arc<dyn ApplicationEventListener>>>>;

fn dispatch(listeners: &Listeners, event: &ApplicationEvent) {
    let snapshot = listeners.lock().clone();
    for listener in &snapshot {
        listener.on_application_event(event);
    }
}

/// 默认事件处理器
///
/// 有界队列加一个专用消费线程。队列满时 [`publish_event`](ApplicationEventPublisher::publish_event)
/// 立即返回错误而不是阻塞。
pub struct DefaultEventProcessor {
    listeners: Listeners,
    sender: Mutex<Option<mpsc::Sender<ApplicationEvent>>>,
    receiver: Mutex<Option<mpsc::Receiver<ApplicationEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
    closed: AtomicBool,
}

impl DefaultEventProcessor {
    /// 使用默认队列容量创建
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_EVENT_BUFFER_SIZE)
    }

    /// 指定队列容量
    pub fn with_capacity(capacity: usize) -> Self {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        Self {
            listeners: Arc::new(Mutex::new(Vec::new())),
            sender: Mutex::new(Some(sender)),
            receiver: Mutex::new(Some(receiver)),
            worker: Mutex::new(None),
            closed: AtomicBool::new(false),
        }
    }

    /// 监听器数量
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }
}

impl Default for DefaultEventProcessor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DefaultEventProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DefaultEventProcessor")
            .field("listeners", &self.listener_count())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl ApplicationEventPublisher for DefaultEventProcessor {
    fn publish_event(&self, event: ApplicationEvent) -> Result<(), InfrastructureError> {
        let sender = self.sender.lock().clone();
        let Some(sender) = sender else {
            return Err(InfrastructureError::EventDeliveryFailed {
                message: "事件处理器已关闭".to_string(),
            });
        };
        sender.try_send(event).map_err(|e| {
            let message = match e {
                TrySendError::Full(event) => format!("事件队列已满, 丢弃事件: {}", event.kind()),
                TrySendError::Closed(event) => format!("事件队列已关闭, 丢弃事件: {}", event.kind()),
            };
            warn!("{}", message);
            InfrastructureError::EventDeliveryFailed { message }
        })
    }

    fn notify_event(&self, event: ApplicationEvent) -> Result<(), InfrastructureError> {
        dispatch(&self.listeners, &event);
        Ok(())
    }
}

impl ApplicationEventProcessor for DefaultEventProcessor {
    fn start(&self) -> Result<(), InfrastructureError> {
        let Some(mut receiver) = self.receiver.lock().take() else {
            debug!("事件处理器已启动");
            return Ok(());
        };
        let listeners = Arc::clone(&self.listeners);
        let handle = std::thread::Builder::new()
            .name("lorn-event".to_string())
            .spawn(move || {
                while let Some(event) = receiver.blocking_recv() {
                    dispatch(&listeners, &event);
                }
                debug!("事件消费线程退出");
            })
            .map_err(|e| InfrastructureError::BootstrapFailed {
                message: format!("启动事件消费线程失败: {}", e),
            })?;
        *self.worker.lock() = Some(handle);
        info!("事件处理器已启动");
        Ok(())
    }

    fn close(&self) -> Result<(), InfrastructureError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        // 释放发送端后消费线程会在队列排空时退出
        drop(self.sender.lock().take());
        drop(self.receiver.lock().take());
        let worker = self.worker.lock().take();
        if let Some(worker) = worker {
            if worker.join().is_err() {
                error!("事件消费线程异常退出");
                return Err(InfrastructureError::EventDeliveryFailed {
                    message: "事件消费线程异常退出".to_string(),
                });
            }
        }
        info!("事件处理器已关闭");
        Ok(())
    }

    fn add_listener(
        &self,
        listener: Arc<dyn ApplicationEventListener>,
    ) -> Result<(), InfrastructureError> {
        self.listeners.lock().push(listener);
        Ok(())
    }
}

/// 禁用状态的事件处理器
#[derive(Debug, Default, Clone, Copy)]
pub struct DisabledEventProcessor;

impl ApplicationEventPublisher for DisabledEventProcessor {
    fn publish_event(&self, _event: ApplicationEvent) -> Result<(), InfrastructureError> {
        Err(InfrastructureError::EventsDisabled)
    }

    fn notify_event(&self, _event: ApplicationEvent) -> Result<(), InfrastructureError> {
        Err(InfrastructureError::EventsDisabled)
    }
}

impl ApplicationEventProcessor for DisabledEventProcessor {
    fn start(&self) -> Result<(), InfrastructureError> {
        Ok(())
    }

    fn close(&self) -> Result<(), InfrastructureError> {
        Ok(())
    }

    fn add_listener(
        &self,
        _listener: Arc<dyn ApplicationEventListener>,
    ) -> Result<(), InfrastructureError> {
        Err(InfrastructureError::EventsDisabled)
    }
}

/// 注册为组件的事件发布者
///
/// 组件以 `Arc<dyn ApplicationEventPublisher>` 注入它。
pub struct EventPublisher {
    processor: Arc<dyn ApplicationEventProcessor>,
}

impl EventPublisher {
    /// 包装事件处理器
    pub fn new(processor: Arc<dyn ApplicationEventProcessor>) -> Self {
        Self { processor }
    }
}

impl ApplicationEventPublisher for EventPublisher {
    fn publish_event(&self, event: ApplicationEvent) -> Result<(), InfrastructureError> {
        self.processor.publish_event(event)
    }

    fn notify_event(&self, event: ApplicationEvent) -> Result<(), InfrastructureError> {
        self.processor.notify_event(event)
    }
}

impl Component for EventPublisher {
    fn capabilities() -> Arc<Capabilities> {
        Capabilities::builder::<Self>()
            .provides::<dyn ApplicationEventPublisher>(|v| v)
            .build()
    }
}
