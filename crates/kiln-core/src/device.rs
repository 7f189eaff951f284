//! # Device Information
//!
//! Engine class numbers the hardware exposes and the queue capability flags.

// =============================================================================
// ENGINE CLASSES
// =============================================================================

/// Memory-to-memory format engine (Fermi)
pub const FERMI_MEMORY_TO_MEMORY_FORMAT_A: u16 = 0x9039;
/// Inline-to-memory engine (Kepler+)
pub const KEPLER_INLINE_TO_MEMORY_A: u16 = 0xa040;
/// 3D engine (Fermi)
pub const FERMI_A: u16 = 0x9097;
/// 3D engine (Kepler)
pub const KEPLER_A: u16 = 0xa097;
/// 3D engine (Maxwell)
pub const MAXWELL_A: u16 = 0xb097;
/// 3D engine (Pascal)
pub const PASCAL_A: u16 = 0xc097;
/// 3D engine (Volta)
pub const VOLTA_A: u16 = 0xc397;
/// 3D engine (Turing)
pub const TURING_A: u16 = 0xc597;
/// Compute engine (Fermi)
pub const FERMI_COMPUTE_A: u16 = 0x90c0;
/// Compute engine (Kepler)
pub const KEPLER_COMPUTE_A: u16 = 0xa0c0;
/// Compute engine (Maxwell)
pub const MAXWELL_COMPUTE_A: u16 = 0xb0c0;
/// Compute engine (Pascal)
pub const PASCAL_COMPUTE_A: u16 = 0xc0c0;
/// Compute engine (Volta)
pub const VOLTA_COMPUTE_A: u16 = 0xc3c0;
/// Compute engine (Turing)
pub const TURING_COMPUTE_A: u16 = 0xc5c0;
/// Compute engine (Ampere)
pub const AMPERE_COMPUTE_A: u16 = 0xc6c0;

// =============================================================================
// DEVICE INFO
// =============================================================================

/// Engine classes bound on a device's channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceInfo {
    /// 3D engine class
    pub cls_eng3d: u16,
    /// Compute engine class
    pub cls_compute: u16,
    /// Memory-to-memory engine class
    pub cls_m2mf: u16,
}

impl DeviceInfo {
    /// Kepler-class device
    pub const fn kepler() -> Self {
        Self {
            cls_eng3d: KEPLER_A,
            cls_compute: KEPLER_COMPUTE_A,
            cls_m2mf: KEPLER_INLINE_TO_MEMORY_A,
        }
    }

    /// Turing-class device
    pub const fn turing() -> Self {
        Self {
            cls_eng3d: TURING_A,
            cls_compute: TURING_COMPUTE_A,
            cls_m2mf: KEPLER_INLINE_TO_MEMORY_A,
        }
    }

    /// Compute engine has the Volta 64-bit memory-window methods
    #[inline]
    pub const fn has_volta_compute(&self) -> bool {
        self.cls_compute >= VOLTA_COMPUTE_A
    }

    /// M2MF still needs an explicit `SET_OBJECT` at bring-up
    #[inline]
    pub const fn needs_m2mf_object(&self) -> bool {
        self.cls_m2mf <= FERMI_MEMORY_TO_MEMORY_FORMAT_A
    }
}

// =============================================================================
// QUEUE FLAGS
// =============================================================================

bitflags::bitflags! {
    /// Queue capability flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct QueueFlags: u32 {
        /// Graphics queue
        const GRAPHICS = 1 << 0;
        /// Compute queue
        const COMPUTE = 1 << 1;
        /// Transfer queue
        const TRANSFER = 1 << 2;
    }
}

impl QueueFlags {
    /// Engines a queue of this family actually has to bring up.
    ///
    /// Queries run as compute shaders, so graphics needs compute. Indirect
    /// dispatch runs through 3D engine macros, so compute needs graphics.
    pub fn with_implied_engines(self) -> Self {
        let mut flags = self;
        if self.contains(Self::GRAPHICS) {
            flags |= Self::COMPUTE;
        }
        if self.contains(Self::COMPUTE) {
            flags |= Self::GRAPHICS;
        }
        flags
    }
}
