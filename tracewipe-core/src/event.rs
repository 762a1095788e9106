use serde::Serialize;
use std::sync::mpsc;

/// 每次运行结束时的消息，同时用作最后一条日志和总结
pub const COMPLETION_MESSAGE: &str = "Erasure complete.";

/// 清除引擎产生的事件，按发出顺序排列
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EngineEvent {
    /// 信息或错误描述
    Log { message: String },
    /// 总体进度 0-100，单次运行内不会减少
    Progress { percent: u8 },
    /// 终止事件，每次运行恰好一个
    Completed { summary: String },
}

impl EngineEvent {
    pub fn log(message: impl Into<String>) -> Self {
        EngineEvent::Log {
            message: message.into(),
        }
    }

    pub fn progress(percent: u8) -> Self {
        EngineEvent::Progress {
            percent: percent.min(100),
        }
    }

    pub fn completed(summary: impl Into<String>) -> Self {
        EngineEvent::Completed {
            summary: summary.into(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, EngineEvent::Completed { .. })
    }
}

/// 事件协议的接收端
///
/// 不得无限期阻塞引擎。引擎从不回读，消费者已退出时应静默丢弃事件。
pub trait EventSink {
    fn accept(&self, event: EngineEvent);
}

impl<S: EventSink + ?Sized> EventSink for &S {
    fn accept(&self, event: EngineEvent) {
        (**self).accept(event);
    }
}

impl EventSink for mpsc::Sender<EngineEvent> {
    fn accept(&self, event: EngineEvent) {
        let _ = self.send(event);
    }
}

impl EventSink for mpsc::SyncSender<EngineEvent> {
    fn accept(&self, event: EngineEvent) {
        let _ = self.send(event);
    }
}

impl EventSink for tokio::sync::mpsc::UnboundedSender<EngineEvent> {
    fn accept(&self, event: EngineEvent) {
        let _ = self.send(event);
    }
}

/// 基于闭包的接收端，参见 [`from_fn`]
pub struct FnSink<F>(F);

impl<F> EventSink for FnSink<F>
where
    F: Fn(EngineEvent),
{
    fn accept(&self, event: EngineEvent) {
        (self.0)(event);
    }
}

/// 将闭包包装为 [`EventSink`]
pub fn from_fn<F>(f: F) -> FnSink<F>
where
    F: Fn(EngineEvent),
{
    FnSink(f)
}
