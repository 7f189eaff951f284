//! # Buffer Objects
//!
//! Reference-counted handles to kernel buffer objects (BOs).
//!
//! A [`BoRef`] is one reference on a kernel BO. Cloning acquires another
//! reference; dropping releases it. The winsys implementation behind
//! [`BufferObject`] destroys the kernel object when its last reference goes
//! away. The GPU may still be reading a BO after the CPU side dropped its
//! last reference: keeping it alive until then is the kernel's job, through
//! the reference the submission ioctl takes on every BO it is handed.

use alloc::boxed::Box;
use alloc::sync::Arc;
use core::fmt;

use crate::error::Result;
use crate::types::{ByteSize, GpuAddr};

// =============================================================================
// BO HANDLE
// =============================================================================

/// Kernel GEM handle identifying a buffer object
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct BoHandle(pub u32);

impl fmt::Debug for BoHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "BoHandle({})", self.0)
    }
}

// =============================================================================
// FLAGS
// =============================================================================

bitflags::bitflags! {
    /// Placement and sharing flags for a new buffer object
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BoFlags: u32 {
        /// Place in VRAM
        const LOCAL = 1 << 0;
        /// Place in GART (system memory visible to the GPU)
        const GART = 1 << 1;
        /// CPU mappable
        const MAP = 1 << 2;
        /// Never exported to another process
        const NO_SHARE = 1 << 3;
    }
}

bitflags::bitflags! {
    /// CPU access requested when mapping a buffer object
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct MapFlags: u32 {
        /// Read access
        const RD = 1 << 0;
        /// Write access
        const WR = 1 << 1;
    }
}

// =============================================================================
// BUFFER OBJECT
// =============================================================================

/// A kernel buffer object, implemented by the winsys layer.
///
/// Dropping the implementing value destroys the kernel object.
pub trait BufferObject: Send + Sync + fmt::Debug {
    /// Kernel handle
    fn handle(&self) -> BoHandle;

    /// Allocation size
    fn size(&self) -> ByteSize;

    /// GPU virtual address of the first byte
    fn offset(&self) -> GpuAddr;
}

/// One reference on a kernel buffer object.
///
/// Equality is identity: two references are equal when they name the same
/// kernel handle.
#[derive(Clone)]
pub struct BoRef(Arc<dyn BufferObject>);

impl BoRef {
    /// Wrap a freshly created buffer object
    pub fn new(bo: Arc<dyn BufferObject>) -> Self {
        Self(bo)
    }

    /// Kernel handle
    #[inline]
    pub fn handle(&self) -> BoHandle {
        self.0.handle()
    }

    /// Allocation size
    #[inline]
    pub fn size(&self) -> ByteSize {
        self.0.size()
    }

    /// GPU virtual address
    #[inline]
    pub fn offset(&self) -> GpuAddr {
        self.0.offset()
    }

    /// Number of live CPU-side references on this object
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl PartialEq for BoRef {
    fn eq(&self, other: &Self) -> bool {
        self.handle() == other.handle()
    }
}

impl Eq for BoRef {}

impl fmt::Debug for BoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoRef")
            .field("handle", &self.handle())
            .field("size", &self.size())
            .field("offset", &self.offset())
            .finish()
    }
}

// =============================================================================
// MAPPINGS
// =============================================================================

/// A live CPU mapping of a buffer object, viewed as dwords.
///
/// Dropping the mapping unmaps it.
pub trait BoMapping: Send {
    /// Mapped words
    fn as_slice(&self) -> &[u32];

    /// Mapped words, writable
    fn as_mut_slice(&mut self) -> &mut [u32];
}

/// A buffer object together with its CPU mapping.
pub struct MappedBo {
    // Field order matters: the mapping drops (unmaps) before the BO
    // reference is released.
    map: Box<dyn BoMapping>,
    bo: BoRef,
}

impl MappedBo {
    /// Pair a buffer object with its mapping
    pub fn new(bo: BoRef, map: Box<dyn BoMapping>) -> Self {
        Self { map, bo }
    }

    /// The underlying buffer object
    pub fn bo(&self) -> &BoRef {
        &self.bo
    }

    /// Mapped words
    pub fn words(&self) -> &[u32] {
        self.map.as_slice()
    }

    /// Mapped words, writable
    pub fn words_mut(&mut self) -> &mut [u32] {
        self.map.as_mut_slice()
    }

    /// Capacity in dwords
    pub fn dw_capacity(&self) -> usize {
        self.map.as_slice().len()
    }
}

impl fmt::Debug for MappedBo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedBo")
            .field("bo", &self.bo)
            .field("dw_capacity", &self.dw_capacity())
            .finish()
    }
}

// =============================================================================
// COLLABORATORS
// =============================================================================

/// Winsys buffer-object allocator
pub trait BoAllocator: Send + Sync {
    /// Allocate an unmapped buffer object
    fn new_bo(&self, size: ByteSize, align: u64, flags: BoFlags) -> Result<BoRef>;

    /// Allocate a buffer object and map it into the CPU address space
    fn new_mapped(
        &self,
        size: ByteSize,
        align: u64,
        flags: BoFlags,
        map: MapFlags,
    ) -> Result<MappedBo>;
}

/// Device-side upload queue used to initialize GPU-only memory
pub trait UploadQueue: Send + Sync {
    /// Fill `size` bytes at `dst` with `value`
    fn fill(&self, dst: GpuAddr, value: u32, size: ByteSize) -> Result<()>;

    /// Wait until every queued upload has landed
    fn sync(&self) -> Result<()>;
}
