//! # Kiln Core Types
//!
//! Strongly typed GPU addresses and sizes.

use core::fmt;

// =============================================================================
// GPU ADDRESS
// =============================================================================

/// GPU Virtual Address
///
/// This is an address in the GPU's virtual address space.
/// It is NOT a CPU pointer and cannot be dereferenced directly.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct GpuAddr(u64);

impl GpuAddr {
    /// Create a new GPU address
    #[inline]
    pub const fn new(addr: u64) -> Self {
        Self(addr)
    }

    /// Upper 32 bits, as written to an `_A` method
    #[inline]
    pub const fn hi(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Lower 32 bits, as written to a `_B` method
    #[inline]
    pub const fn lo(self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Debug for GpuAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GpuAddr(0x{:016x})", self.0)
    }
}

impl fmt::Display for GpuAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:016x}", self.0)
    }
}

// =============================================================================
// SIZE TYPES
// =============================================================================

/// Size in bytes
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[repr(transparent)]
pub struct ByteSize(u64);

impl ByteSize {
    /// 4 KiB
    pub const KIB_4: Self = Self(4 * 1024);

    /// Create from bytes
    #[inline]
    pub const fn from_bytes(bytes: u64) -> Self {
        Self(bytes)
    }

    /// Create from a dword count
    #[inline]
    pub const fn from_dwords(dwords: u32) -> Self {
        Self(dwords as u64 * 4)
    }

    /// Get as bytes
    #[inline]
    pub const fn as_bytes(self) -> u64 {
        self.0
    }

    /// Upper 32 bits
    #[inline]
    pub const fn hi(self) -> u32 {
        (self.0 >> 32) as u32
    }

    /// Lower 32 bits
    #[inline]
    pub const fn lo(self) -> u32 {
        self.0 as u32
    }

    /// Check alignment
    #[inline]
    pub const fn is_multiple_of(self, granularity: u64) -> bool {
        self.0 % granularity == 0
    }
}

impl fmt::Debug for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 >= 1024 * 1024 {
            write!(f, "{} MiB", self.0 / (1024 * 1024))
        } else if self.0 >= 1024 {
            write!(f, "{} KiB", self.0 / 1024)
        } else {
            write!(f, "{} B", self.0)
        }
    }
}

impl fmt::Display for ByteSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
