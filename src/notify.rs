//! Best-effort alert notifications.
//!
//! The banner drawn by the UI is what the user relies on. Notifications are
//! an extra nudge: permission is asked once per session and any failure is
//! logged and otherwise ignored.

use std::fmt::Debug;
use std::io::{IsTerminal, Write};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

/// Outcome of a permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Permission {
    Granted,
    Denied,
}

impl Permission {
    pub fn is_granted(&self) -> bool {
        matches!(self, Permission::Granted)
    }
}

/// Errors from delivering a notification.
#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification permission denied")]
    Denied,

    #[error("Notification delivery failed: {0}")]
    Io(#[from] std::io::Error),
}

/// A sink for alert notifications.
pub trait Notifier: Send + Debug {
    /// Ask for permission to notify. Called at most once per session.
    fn request_permission(&mut self) -> Permission;

    /// Deliver one notification.
    fn deliver(&mut self, title: &str, body: &str) -> Result<(), NotifyError>;
}

/// Rings the terminal bell.
///
/// Permission is granted only when stdout is a terminal.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Notifier for TerminalBell {
    fn request_permission(&mut self) -> Permission {
        if std::io::stdout().is_terminal() {
            Permission::Granted
        } else {
            Permission::Denied
        }
    }

    fn deliver(&mut self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        let mut out = std::io::stdout();
        out.write_all(b"\x07")?;
        out.flush()?;
        Ok(())
    }
}

/// Emits each notification as a `tracing` warning.
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn request_permission(&mut self) -> Permission {
        Permission::Granted
    }

    fn deliver(&mut self, title: &str, body: &str) -> Result<(), NotifyError> {
        warn!(title, body, "Alert notification");
        Ok(())
    }
}

/// Never notifies.
#[derive(Debug, Default)]
pub struct Muted;

impl Notifier for Muted {
    fn request_permission(&mut self) -> Permission {
        Permission::Denied
    }

    fn deliver(&mut self, _title: &str, _body: &str) -> Result<(), NotifyError> {
        Err(NotifyError::Denied)
    }
}

/// Notifier selected in settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotifierKind {
    #[default]
    Bell,
    Log,
    Off,
}

impl std::str::FromStr for NotifierKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bell" => Ok(NotifierKind::Bell),
            "log" => Ok(NotifierKind::Log),
            "off" | "none" => Ok(NotifierKind::Off),
            other => Err(format!("Unknown notifier: {}", other)),
        }
    }
}

impl NotifierKind {
    pub fn build(self) -> Box<dyn Notifier> {
        match self {
            NotifierKind::Bell => Box::new(TerminalBell),
            NotifierKind::Log => Box::new(LogNotifier),
            NotifierKind::Off => Box::new(Muted),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn muted_denies() {
        let mut n = Muted;
        assert_eq!(n.request_permission(), Permission::Denied);
        assert!(matches!(n.deliver("a", "b"), Err(NotifyError::Denied)));
    }

    #[test]
    fn log_notifier_always_delivers() {
        let mut n = LogNotifier;
        assert!(n.request_permission().is_granted());
        assert!(n.deliver("Vitalwatch alert", "Patient 1: test").is_ok());
    }

    #[test]
    fn notifier_kind_from_str() {
        assert_eq!("LOG".parse::<NotifierKind>(), Ok(NotifierKind::Log));
        assert_eq!("none".parse::<NotifierKind>(), Ok(NotifierKind::Off));
        assert!("email".parse::<NotifierKind>().is_err());
    }
}
