//! Normalized I/O events.
//!
//! Every trace source is reduced to the same shape: a read or a write,
//! the number of bytes it moved, and (when the source has one) the raw
//! timestamp text it was observed at.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Direction of one I/O operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoKind {
    Read,
    Write,
}

impl IoKind {
    /// Classify an operation name by substring.
    ///
    /// A name containing `read` is a read, one containing `write` is a write.
    /// The caller decides whether the comparison is case-insensitive.
    pub fn from_op_name(name: &str) -> Option<Self> {
        if name.contains("read") {
            Some(Self::Read)
        } else if name.contains("write") {
            Some(Self::Write)
        } else {
            None
        }
    }
}

impl fmt::Display for IoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read => write!(f, "read"),
            Self::Write => write!(f, "write"),
        }
    }
}

/// One observed read or write
///
/// Timestamps are kept as the tracer printed them (decimal epoch seconds
/// or `HH:MM:SS.ffffff`); the binning engine normalizes them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IoEvent {
    pub kind: IoKind,
    pub bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl IoEvent {
    pub fn new(kind: IoKind, bytes: u64) -> Self {
        Self {
            kind,
            bytes,
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }

    pub fn is_read(&self) -> bool {
        self.kind == IoKind::Read
    }

    pub fn is_write(&self) -> bool {
        self.kind == IoKind::Write
    }
}
