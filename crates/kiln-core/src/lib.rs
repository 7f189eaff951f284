//! # Kiln Core
//!
//! Foundational types shared by the push-buffer encoder and the hardware
//! queue.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                        kiln-core                            │
//! │  ┌─────────────┐  ┌─────────────┐  ┌─────────────────────┐  │
//! │  │   Types     │  │   Buffer    │  │     Error           │  │
//! │  │ (GpuAddr,   │  │  Objects    │  │   Taxonomy          │  │
//! │  │  ByteSize)  │  │ (BoRef,Map) │  │                     │  │
//! │  └─────────────┘  └─────────────┘  └─────────────────────┘  │
//! │  ┌─────────────┐  ┌─────────────┐                           │
//! │  │   Device    │  │   Debug     │                           │
//! │  │   Info      │  │   Flags     │                           │
//! │  └─────────────┘  └─────────────┘                           │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Buffer-object allocation, mapping and destruction are owned by an
//! external winsys layer; this crate only describes the narrow interface
//! the queue needs from it.

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

// =============================================================================
// MODULE EXPORTS
// =============================================================================

pub mod bo;
pub mod debug;
pub mod device;
pub mod error;
pub mod types;

// Re-exports for convenience
pub use bo::{BoAllocator, BoFlags, BoHandle, BoMapping, BoRef, BufferObject, MapFlags, MappedBo, UploadQueue};
pub use debug::DebugFlags;
pub use device::{DeviceInfo, QueueFlags};
pub use error::{Error, Result};
pub use types::{ByteSize, GpuAddr};
