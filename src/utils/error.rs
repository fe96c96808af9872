//! Error types for the entire application.
//!
//! We use `thiserror` for library-style errors with custom types,
//! and `anyhow` for application-level error propagation in main.rs and commands.

use std::path::PathBuf;
use thiserror::Error;

/// Boxed error returned by user code
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Coarse failure classes used by the fallback chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Counter API or tracer not available on this OS
    UnsupportedFeature,
    /// Tracer binary not installed
    ToolMissing,
    /// Tracer could not attach (ptrace policy, denied privileges)
    AttachDenied,
    /// Exclusive trace facility already in use
    ResourceBusy,
    /// Bounded wait expired
    Timeout,
    /// Local I/O failure unrelated to the trace source
    Environment,
    /// The profiled code itself failed
    UserCode,
}

/// Errors a measurement backend can produce
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("{0} is not supported on this platform")]
    Unsupported(String),

    #[error("{0} not found - is it installed?")]
    TracerNotFound(String),

    #[error("{tool} failed to attach: {detail}")]
    AttachDenied { tool: String, detail: String },

    #[error("{0} is busy (Resource busy)")]
    ResourceBusy(String),

    #[error("timed out waiting for {0}")]
    Timeout(String),

    #[error("{tool} failed: {detail}")]
    HelperFailed { tool: String, detail: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("profiled code failed: {0}")]
    Execution(#[source] BoxError),
}

impl BackendError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Unsupported(_) => ErrorCategory::UnsupportedFeature,
            Self::TracerNotFound(_) => ErrorCategory::ToolMissing,
            Self::AttachDenied { .. } | Self::HelperFailed { .. } => ErrorCategory::AttachDenied,
            Self::ResourceBusy(_) => ErrorCategory::ResourceBusy,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Io(_) => ErrorCategory::Environment,
            Self::Execution(_) => ErrorCategory::UserCode,
        }
    }

    /// Whether a later backend may be tried instead.
    pub fn is_recoverable(&self) -> bool {
        !matches!(
            self.category(),
            ErrorCategory::Environment | ErrorCategory::UserCode
        )
    }
}

/// Errors that can occur while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Errors that can occur during file output
#[derive(Error, Debug)]
pub enum OutputError {
    #[error("Failed to write file: {0}")]
    WriteFailed(#[from] std::io::Error),

    #[error("Failed to serialize JSON: {0}")]
    SerializationFailed(#[from] serde_json::Error),

    #[error("Invalid output path: {0}")]
    InvalidPath(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recoverable_categories() {
        assert!(BackendError::ResourceBusy("ktrace".into()).is_recoverable());
        assert!(BackendError::TracerNotFound("strace".into()).is_recoverable());
        assert!(BackendError::Timeout("fs_usage".into()).is_recoverable());
        assert!(BackendError::Unsupported("/proc/self/io".into()).is_recoverable());
        assert!(!BackendError::Execution("boom".into()).is_recoverable());
        assert!(!BackendError::Io(std::io::Error::other("disk")).is_recoverable());
    }

    #[test]
    fn test_busy_message_carries_signature() {
        let err = BackendError::ResourceBusy("ktrace".into());
        assert!(err.to_string().contains("Resource busy"));
    }
}
