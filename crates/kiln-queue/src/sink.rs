//! # Diagnostic Sinks
//!
//! Destinations for push disassembly dumps.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use spin::Mutex;

/// Receives human-readable submission dumps
pub trait DiagnosticSink: Send + Sync {
    /// Emit one complete dump
    fn emit(&self, report: &str);
}

/// Forwards dumps to the `log` facade, one record per line
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl DiagnosticSink for LogSink {
    fn emit(&self, report: &str) {
        for line in report.lines() {
            log::info!(target: "kiln::push", "{}", line);
        }
    }
}

/// Writes dumps to standard error
#[cfg(feature = "std")]
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrSink;

#[cfg(feature = "std")]
impl DiagnosticSink for StderrSink {
    fn emit(&self, report: &str) {
        use std::io::Write;

        let stderr = std::io::stderr();
        let mut lock = stderr.lock();
        // Nowhere left to report a failed diagnostic write.
        let _ = lock.write_all(report.as_bytes());
        let _ = lock.flush();
    }
}

/// Keeps every dump in memory until taken
#[derive(Debug, Default)]
pub struct MemorySink {
    reports: Mutex<Vec<String>>,
}

impl MemorySink {
    /// Empty sink
    pub const fn new() -> Self {
        Self {
            reports: Mutex::new(Vec::new()),
        }
    }

    /// Number of dumps held
    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    /// No dumps held
    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    /// Remove and return every held dump
    pub fn take(&self) -> Vec<String> {
        core::mem::take(&mut *self.reports.lock())
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, report: &str) {
        self.reports.lock().push(String::from(report));
    }
}

impl fmt::Debug for dyn DiagnosticSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DiagnosticSink")
    }
}
