use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Represents the severity level of a log message.
///
/// Variants are ordered from most to least severe, so a message passes a
/// filter when its level is `<=` the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    /// The application cannot continue.
    Fatal,
    Error,
    Warn,
    Info,
    /// Detailed messages useful for debugging.
    Debug,
}

impl Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Severity::Fatal => write!(f, "[FATAL]"),
            Severity::Error => write!(f, "[ERROR]"),
            Severity::Warn => write!(f, "[WARN]"),
            Severity::Info => write!(f, "[INFO]"),
            Severity::Debug => write!(f, "[DEBUG]"),
        }
    }
}

/// Represents a structured log message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LogMessage {
    pub level: Severity,
    pub msg: String,
}

impl Display for LogMessage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.level, self.msg)
    }
}

impl LogMessage {
    pub fn new(level: Severity, msg: String) -> Self {
        LogMessage { level, msg }
    }

    pub fn warn(msg: String) -> Self {
        Self::new(Severity::Warn, msg)
    }

    pub fn info(msg: String) -> Self {
        Self::new(Severity::Info, msg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severities_are_ordered_by_importance() {
        assert!(Severity::Fatal < Severity::Error);
        assert!(Severity::Warn < Severity::Debug);
    }

    #[test]
    fn display_prefixes_level() {
        let msg = LogMessage::warn("clamped block_size".to_owned());
        assert_eq!(msg.to_string(), "[WARN] clamped block_size");
    }
}
