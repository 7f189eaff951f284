//! # Kiln Queue
//!
//! Hardware queue command-stream synchronization and submission.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                          Submission Path                          │
//! │                                                                   │
//! │  ┌──────────────┐    ┌──────────────┐    ┌──────────────────┐     │
//! │  │  Resource    │    │ Queue State  │    │   State Push     │     │
//! │  │  Providers   │───▶│  (refresh)   │───▶│   (rebuild)      │     │
//! │  └──────────────┘    └──────────────┘    └────────┬─────────┘     │
//! │                                                   │               │
//! │  ┌──────────────┐                        ┌────────▼─────────┐     │
//! │  │   Command    │───────────────────────▶│    Transport     │     │
//! │  │   Buffers    │                        │   (kernel)       │     │
//! │  └──────────────┘                        └──────────────────┘     │
//! └───────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Submission Flow
//!
//! 1. Every provider is queried for its current buffer object
//! 2. If any slot changed, the state push is re-encoded into a new BO
//! 3. The state push goes to the transport ahead of the command buffers
//! 4. A failed rebuild or submission latches the queue lost for good

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod config;
pub mod device;
pub mod provider;
pub mod queue;
pub mod sink;
pub mod state;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

// Re-exports
pub use config::QueueConfig;
pub use device::DeviceContext;
pub use provider::{DescriptorTable, ResourceProvider, ResourceSlot, SlmArea, SlmSizing};
pub use queue::{Queue, QueueStats};
pub use sink::{DiagnosticSink, LogSink, MemorySink};
#[cfg(feature = "std")]
pub use sink::StderrSink;
pub use state::{QueueState, StatePush};
pub use transport::{CommandBuffer, PushRef, Submission, SubmitTransport};
