//! # Kiln Error Handling
//!
//! Error taxonomy for queue synchronization and submission.
//!
//! Three classes matter to callers:
//! - [`Error::OutOfMemory`]: an allocation failed. Only fatal to a queue when
//!   it happens while rebuilding the queue state push buffer.
//! - [`Error::TransportFailure`]: the kernel rejected or could not complete a
//!   submission. Always fatal to the queue.
//! - [`Error::DeviceLost`]: the queue was already latched lost. Returned
//!   without attempting any work.

use core::fmt;

// =============================================================================
// RESULT TYPE
// =============================================================================

/// Kiln Result type alias
pub type Result<T> = core::result::Result<T, Error>;

// =============================================================================
// ERROR ENUM
// =============================================================================

/// Kiln unified error type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Error {
    // =========================================================================
    // Memory Errors
    // =========================================================================
    /// Buffer object or push buffer allocation failed
    OutOfMemory,
    /// Mapping a buffer object into the CPU address space failed
    MappingFailed,

    // =========================================================================
    // Command Submission Errors
    // =========================================================================
    /// Encoding would exceed the push buffer capacity
    CommandBufferFull,
    /// The kernel rejected or could not complete a submission
    TransportFailure,
    /// The queue is latched lost and accepts no further work
    DeviceLost,

    // =========================================================================
    // Generic Errors
    // =========================================================================
    /// Queue bring-up failed
    InitializationFailed,
    /// Invalid parameter provided
    InvalidParameter,
}

impl Error {
    /// Whether this error always latches the submitting queue lost.
    pub const fn is_fatal(self) -> bool {
        matches!(self, Self::TransportFailure | Self::DeviceLost)
    }

    /// Vulkan `VkResult` code a front end should report for this error.
    pub const fn as_vk_result(self) -> i32 {
        match self {
            Self::OutOfMemory | Self::CommandBufferFull => -2, // VK_ERROR_OUT_OF_DEVICE_MEMORY
            Self::MappingFailed => -5,                         // VK_ERROR_MEMORY_MAP_FAILED
            Self::TransportFailure | Self::DeviceLost => -4,   // VK_ERROR_DEVICE_LOST
            Self::InitializationFailed => -3,                  // VK_ERROR_INITIALIZATION_FAILED
            Self::InvalidParameter => -13,                     // VK_ERROR_UNKNOWN
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory => write!(f, "out of device memory"),
            Self::MappingFailed => write!(f, "buffer object mapping failed"),
            Self::CommandBufferFull => write!(f, "push buffer full"),
            Self::TransportFailure => write!(f, "submission failed"),
            Self::DeviceLost => write!(f, "device lost"),
            Self::InitializationFailed => write!(f, "queue initialization failed"),
            Self::InvalidParameter => write!(f, "invalid parameter"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
