//! # Queue Configuration
//!
//! Per-queue settings passed explicitly at construction.

use alloc::sync::Arc;

use kiln_core::DebugFlags;

use crate::sink::{DiagnosticSink, LogSink};

/// Queue configuration
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Submission debugging switches
    pub debug: DebugFlags,
    /// Where push dumps go
    pub sink: Arc<dyn DiagnosticSink>,
}

impl QueueConfig {
    /// Configuration with explicit flags and sink
    pub fn new(debug: DebugFlags, sink: Arc<dyn DiagnosticSink>) -> Self {
        Self { debug, sink }
    }

    /// Replace the debug flags
    pub fn with_debug(mut self, debug: DebugFlags) -> Self {
        self.debug = debug;
        self
    }

    /// Replace the diagnostic sink
    pub fn with_sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Read debug flags from `KILN_DEBUG` and dump to standard error
    #[cfg(feature = "std")]
    pub fn from_env() -> Self {
        let debug = std::env::var(DebugFlags::ENV_VAR)
            .map(|v| DebugFlags::parse(&v))
            .unwrap_or_default();
        Self::new(debug, Arc::new(crate::sink::StderrSink))
    }

    /// Dump every submitted stream
    #[inline]
    pub fn dump_all(&self) -> bool {
        self.debug.contains(DebugFlags::PUSH_DUMP)
    }

    /// Wait for every submission to complete
    #[inline]
    pub fn sync_submits(&self) -> bool {
        self.debug.contains(DebugFlags::PUSH_SYNC)
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self::new(DebugFlags::empty(), Arc::new(LogSink))
    }
}
