//! IOPS Profiler
//!
//! Measures the file I/O operations per second of a code snippet.
//! Per-process tracing (strace on Linux, fs_usage on macOS) is tried
//! first; I/O counters are the fallback.
//!
//! ## Getting Started
//!
//! ```bash
//! iops-profiler run --histogram -- 'dd if=/dev/zero of=/tmp/x bs=4k count=100'
//! ```
//!
//! Library users build a [`backend::Profiler`] and pass the result to
//! [`output::display_result`].

pub mod aggregator;
pub mod backend;
pub mod binning;
pub mod commands;
pub mod output;
pub mod parser;
pub mod utils;
