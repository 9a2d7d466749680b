//! Alert banner shown above the device panel.
//!
//! Transient alerts disappear on their own after the configured lifetime;
//! persistent ones stay until the operator dismisses them or another alert
//! replaces them.

use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_ALERT_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertLevel {
    Success,
    Info,
    Warning,
    Danger,
}

impl AlertLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            AlertLevel::Success => "success",
            AlertLevel::Info => "info",
            AlertLevel::Warning => "warning",
            AlertLevel::Danger => "danger",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alert {
    pub message: String,
    pub level: AlertLevel,
    pub persistent: bool,
}

impl Alert {
    pub fn transient(level: AlertLevel, message: impl Into<String>) -> Self {
        Self { message: message.into(), level, persistent: false }
    }

    pub fn persistent(level: AlertLevel, message: impl Into<String>) -> Self {
        Self { message: message.into(), level, persistent: true }
    }
}

#[derive(Debug)]
pub struct AlertBanner {
    current: Option<(Alert, Option<Instant>)>,
    lifetime: Duration,
}

impl AlertBanner {
    pub fn new(lifetime: Duration) -> Self {
        Self { current: None, lifetime }
    }

    pub fn current(&self) -> Option<&Alert> {
        self.current.as_ref().map(|(alert, _)| alert)
    }

    pub fn show(&mut self, alert: Alert, now: Instant) {
        let expires_at = (!alert.persistent).then(|| now + self.lifetime);
        self.current = Some((alert, expires_at));
    }

    /// Returns true when a transient alert just expired and was removed.
    pub fn expire(&mut self, now: Instant) -> bool {
        let expired = matches!(&self.current, Some((_, Some(deadline))) if now >= *deadline);
        if expired {
            self.current = None;
        }
        expired
    }

    pub fn dismiss(&mut self) -> bool {
        self.current.take().is_some()
    }
}

impl Default for AlertBanner {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_LIFETIME)
    }
}
