//! Transient user-facing notices (toasts).

use crate::Error;
use tokio::sync::mpsc;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Success,
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub message: String,
}

/// Sending half of the notice queue; the front end drains the receiver.
///
/// Sends never fail: notices raised after the front end went away are dropped.
#[derive(Clone, Debug)]
pub struct Notifications {
    sender: mpsc::UnboundedSender<Notice>,
}

impl Notifications {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notice>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(Level::Success, message.into());
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(Level::Info, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(Level::Error, message.into());
    }

    /// Surface a failed call using its user-facing message.
    pub fn failure(&self, err: &Error) {
        self.push(Level::Error, err.user_message());
    }

    fn push(&self, level: Level, message: String) {
        let _ = self.sender.send(Notice { level, message });
    }
}
