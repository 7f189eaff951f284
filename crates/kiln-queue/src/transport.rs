//! # Submission Transport
//!
//! The kernel submission path, as seen by the queue.
//!
//! The transport receives an optional leading push (the queue state stream
//! or a one-off bring-up stream), the caller's command buffers and extra
//! buffer objects that must stay resident. It owns the kernel protocol.
//!
//! The kernel takes a reference on every buffer object named in a
//! submission and holds it until the GPU is done. The queue relies on this
//! when it releases a superseded state push buffer or binding table right
//! after installing its replacement.

use kiln_core::{BoRef, Result};

// =============================================================================
// COMMAND BUFFERS
// =============================================================================

/// A recorded command buffer ready for submission
pub trait CommandBuffer: Send + Sync {
    /// Encoded words, used for diagnostics
    fn words(&self) -> &[u32];
}

// =============================================================================
// SUBMISSION
// =============================================================================

/// Push stream placed ahead of the command buffers
#[derive(Debug, Clone, Copy)]
pub struct PushRef<'a> {
    /// Buffer object holding the stream
    pub bo: &'a BoRef,
    /// Encoded words; `words.len()` is the dword count
    pub words: &'a [u32],
}

impl PushRef<'_> {
    /// Encoded dword count
    #[inline]
    pub fn dw_count(&self) -> usize {
        self.words.len()
    }
}

/// Everything one kernel submission carries
pub struct Submission<'a> {
    /// Leading push stream
    pub push: Option<PushRef<'a>>,
    /// Command buffers, executed in order after the push
    pub command_buffers: &'a [&'a dyn CommandBuffer],
    /// Additional buffer objects the GPU reads
    pub extra_bos: &'a [BoRef],
    /// Wait for completion before returning
    pub sync: bool,
}

impl core::fmt::Debug for Submission<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Submission")
            .field("push", &self.push)
            .field("command_buffers", &self.command_buffers.len())
            .field("extra_bos", &self.extra_bos)
            .field("sync", &self.sync)
            .finish()
    }
}

/// Kernel submission transport
pub trait SubmitTransport: Send + Sync {
    /// Submit to the hardware channel.
    ///
    /// With `submission.sync` set, returns only after the work completed.
    fn submit(&self, submission: &Submission<'_>) -> Result<()>;
}
