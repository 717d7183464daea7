//! Fire-and-forget progress notices.
//!
//! Events are delivered in pipeline order: selection confirmed, extraction
//! complete, provider call start/end per language, fonts loading, fonts
//! loaded, done. A sink must never block or fail the run.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub message: String,
    pub is_error: bool,
}

impl StatusEvent {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            is_error: true,
        }
    }
}

pub trait StatusSink: Send + Sync {
    fn emit(&self, event: StatusEvent);

    fn info(&self, message: &str) {
        self.emit(StatusEvent::info(message));
    }

    fn error(&self, message: &str) {
        self.emit(StatusEvent::error(message));
    }
}

/// Writes every event to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn emit(&self, event: StatusEvent) {
        if event.is_error {
            warn!("{}", event.message);
        } else {
            info!("{}", event.message);
        }
    }
}

/// Forwards events to an unbounded channel. Events sent after the receiver
/// is dropped are lost.
#[derive(Debug, Clone)]
pub struct ChannelStatus {
    sender: mpsc::UnboundedSender<StatusEvent>,
}

impl ChannelStatus {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl StatusSink for ChannelStatus {
    fn emit(&self, event: StatusEvent) {
        let _ = self.sender.send(event);
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingStatus {
    events: Mutex<Vec<StatusEvent>>,
}

impl RecordingStatus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.events().into_iter().map(|e| e.message).collect()
    }
}

impl StatusSink for RecordingStatus {
    fn emit(&self, event: StatusEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
