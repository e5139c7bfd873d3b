// ── Transient user notices ──
//
// Failures the core absorbs (fetch errors, rejected writes) still need to
// reach the operator. They go out as notices on a broadcast channel that
// front ends render as dismissible messages.

use tokio::sync::broadcast;
use tracing::{error, info, warn};

const NOTICE_CHANNEL_SIZE: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

/// Fan-out point for notices. Cheap to clone.
#[derive(Debug, Clone)]
pub struct NoticeCenter {
    tx: broadcast::Sender<Notice>,
}

impl NoticeCenter {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(NOTICE_CHANNEL_SIZE);
        Self { tx }
    }

    /// Receive every notice raised after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.tx.subscribe()
    }

    pub fn push(&self, notice: Notice) {
        match notice.level {
            NoticeLevel::Error => error!(message = %notice.message, "notice"),
            NoticeLevel::Warning => warn!(message = %notice.message, "notice"),
            NoticeLevel::Info | NoticeLevel::Success => info!(message = %notice.message, "notice"),
        }
        // No receivers is fine: nobody is showing notices right now.
        let _ = self.tx.send(notice);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Notice {
            level: NoticeLevel::Info,
            message: message.into(),
        });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Notice {
            level: NoticeLevel::Success,
            message: message.into(),
        });
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(Notice {
            level: NoticeLevel::Warning,
            message: message.into(),
        });
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Notice {
            level: NoticeLevel::Error,
            message: message.into(),
        });
    }
}

impl Default for NoticeCenter {
    fn default() -> Self {
        Self::new()
    }
}
