//! # Engine Classes
//!
//! Subchannel assignment and the method offsets used by queue state setup.
//! Only the methods this crate emits are listed.

use kiln_core::DeviceInfo;

// =============================================================================
// SUBCHANNELS
// =============================================================================

/// Fixed subchannel each engine is bound to on a channel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Subchannel {
    /// 3D engine
    Eng3d = 0,
    /// Compute engine
    Compute = 1,
    /// Memory-to-memory / inline-to-memory engine
    M2mf = 2,
    /// 2D engine
    Eng2d = 3,
    /// Copy engine
    Copy = 4,
}

impl Subchannel {
    /// Raw subchannel number
    #[inline]
    pub const fn raw(self) -> u8 {
        self as u8
    }

    /// Subchannel from its raw number
    pub const fn from_raw(subc: u8) -> Option<Self> {
        match subc {
            0 => Some(Self::Eng3d),
            1 => Some(Self::Compute),
            2 => Some(Self::M2mf),
            3 => Some(Self::Eng2d),
            4 => Some(Self::Copy),
            _ => None,
        }
    }

    /// Class bound on this subchannel for a device
    pub const fn class(self, info: &DeviceInfo) -> Option<u16> {
        match self {
            Self::Eng3d => Some(info.cls_eng3d),
            Self::Compute => Some(info.cls_compute),
            Self::M2mf => Some(info.cls_m2mf),
            Self::Eng2d | Self::Copy => None,
        }
    }
}

// =============================================================================
// METHOD OFFSETS
// =============================================================================

/// Fermi+ memory-to-memory methods
pub mod nv9039 {
    /// Bind an engine object to the subchannel
    pub const SET_OBJECT: u16 = 0x0000;
}

/// Fermi+ 3D methods
pub mod nv9097 {
    /// Bind an engine object to the subchannel
    pub const SET_OBJECT: u16 = 0x0000;
    /// 32-bit local memory window
    pub const SET_SHADER_LOCAL_MEMORY_WINDOW: u16 = 0x077c;
    /// Local memory address, upper bits
    pub const SET_SHADER_LOCAL_MEMORY_A: u16 = 0x0790;
    /// Local memory address, lower bits
    pub const SET_SHADER_LOCAL_MEMORY_B: u16 = 0x0794;
    /// Local memory size, upper bits
    pub const SET_SHADER_LOCAL_MEMORY_C: u16 = 0x0798;
    /// Local memory size, lower bits
    pub const SET_SHADER_LOCAL_MEMORY_D: u16 = 0x079c;
    /// Local memory bytes per warp
    pub const SET_SHADER_LOCAL_MEMORY_E: u16 = 0x07a0;
    /// Invalidate the sampler cache without waiting for idle
    pub const INVALIDATE_SAMPLER_CACHE_NO_WFI: u16 = 0x1424;
    /// Invalidate the texture header cache without waiting for idle
    pub const INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI: u16 = 0x1428;
    /// Sampler pool address, upper bits
    pub const SET_TEX_SAMPLER_POOL_A: u16 = 0x155c;
    /// Sampler pool address, lower bits
    pub const SET_TEX_SAMPLER_POOL_B: u16 = 0x1560;
    /// Sampler pool maximum index
    pub const SET_TEX_SAMPLER_POOL_C: u16 = 0x1564;
    /// Texture header pool address, upper bits
    pub const SET_TEX_HEADER_POOL_A: u16 = 0x1574;
    /// Texture header pool address, lower bits
    pub const SET_TEX_HEADER_POOL_B: u16 = 0x1578;
    /// Texture header pool maximum index
    pub const SET_TEX_HEADER_POOL_C: u16 = 0x157c;
    /// Constant buffer size
    pub const SET_CONSTANT_BUFFER_SELECTOR_A: u16 = 0x2380;
    /// Constant buffer address, upper bits
    pub const SET_CONSTANT_BUFFER_SELECTOR_B: u16 = 0x2384;
    /// Constant buffer address, lower bits
    pub const SET_CONSTANT_BUFFER_SELECTOR_C: u16 = 0x2388;
}

/// Kepler+ compute methods
pub mod nva0c0 {
    /// Bind an engine object to the subchannel
    pub const SET_OBJECT: u16 = 0x0000;
    /// 32-bit shared memory window
    pub const SET_SHADER_SHARED_MEMORY_WINDOW: u16 = 0x0214;
    /// Per-TPC local memory, upper bits
    pub const SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_A: u16 = 0x02e4;
    /// Per-TPC local memory, lower bits
    pub const SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_B: u16 = 0x02e8;
    /// Maximum SM count
    pub const SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_C: u16 = 0x02ec;
    /// Throttled per-TPC local memory, upper bits
    pub const SET_SHADER_LOCAL_MEMORY_THROTTLED_A: u16 = 0x02f0;
    /// Throttled per-TPC local memory, lower bits
    pub const SET_SHADER_LOCAL_MEMORY_THROTTLED_B: u16 = 0x02f4;
    /// Throttled maximum SM count
    pub const SET_SHADER_LOCAL_MEMORY_THROTTLED_C: u16 = 0x02f8;
    /// 32-bit local memory window
    pub const SET_SHADER_LOCAL_MEMORY_WINDOW: u16 = 0x077c;
    /// Local memory address, upper bits
    pub const SET_SHADER_LOCAL_MEMORY_A: u16 = 0x0790;
    /// Local memory address, lower bits
    pub const SET_SHADER_LOCAL_MEMORY_B: u16 = 0x0794;
    /// Invalidate the sampler cache without waiting for idle
    pub const INVALIDATE_SAMPLER_CACHE_NO_WFI: u16 = 0x1424;
    /// Invalidate the texture header cache without waiting for idle
    pub const INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI: u16 = 0x1428;
    /// Sampler pool address, upper bits
    pub const SET_TEX_SAMPLER_POOL_A: u16 = 0x155c;
    /// Sampler pool address, lower bits
    pub const SET_TEX_SAMPLER_POOL_B: u16 = 0x1560;
    /// Sampler pool maximum index
    pub const SET_TEX_SAMPLER_POOL_C: u16 = 0x1564;
    /// Texture header pool address, upper bits
    pub const SET_TEX_HEADER_POOL_A: u16 = 0x1574;
    /// Texture header pool address, lower bits
    pub const SET_TEX_HEADER_POOL_B: u16 = 0x1578;
    /// Texture header pool maximum index
    pub const SET_TEX_HEADER_POOL_C: u16 = 0x157c;
}

/// Volta+ compute methods
pub mod nvc3c0 {
    /// 64-bit shared memory window, upper bits
    pub const SET_SHADER_SHARED_MEMORY_WINDOW_A: u16 = 0x02a0;
    /// 64-bit shared memory window, lower bits
    pub const SET_SHADER_SHARED_MEMORY_WINDOW_B: u16 = 0x02a4;
    /// 64-bit local memory window, upper bits
    pub const SET_SHADER_LOCAL_MEMORY_WINDOW_A: u16 = 0x07b0;
    /// 64-bit local memory window, lower bits
    pub const SET_SHADER_LOCAL_MEMORY_WINDOW_B: u16 = 0x07b4;
}

/// `lines` field value for the cache invalidation methods
pub const INVALIDATE_LINES_ALL: u32 = 0;

// =============================================================================
// METHOD NAMES
// =============================================================================

const NV9097_NAMES: &[(u16, &str)] = &[
    (nv9097::SET_OBJECT, "SET_OBJECT"),
    (nv9097::SET_SHADER_LOCAL_MEMORY_WINDOW, "SET_SHADER_LOCAL_MEMORY_WINDOW"),
    (nv9097::SET_SHADER_LOCAL_MEMORY_A, "SET_SHADER_LOCAL_MEMORY_A"),
    (nv9097::SET_SHADER_LOCAL_MEMORY_B, "SET_SHADER_LOCAL_MEMORY_B"),
    (nv9097::SET_SHADER_LOCAL_MEMORY_C, "SET_SHADER_LOCAL_MEMORY_C"),
    (nv9097::SET_SHADER_LOCAL_MEMORY_D, "SET_SHADER_LOCAL_MEMORY_D"),
    (nv9097::SET_SHADER_LOCAL_MEMORY_E, "SET_SHADER_LOCAL_MEMORY_E"),
    (nv9097::INVALIDATE_SAMPLER_CACHE_NO_WFI, "INVALIDATE_SAMPLER_CACHE_NO_WFI"),
    (
        nv9097::INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI,
        "INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI",
    ),
    (nv9097::SET_TEX_SAMPLER_POOL_A, "SET_TEX_SAMPLER_POOL_A"),
    (nv9097::SET_TEX_SAMPLER_POOL_B, "SET_TEX_SAMPLER_POOL_B"),
    (nv9097::SET_TEX_SAMPLER_POOL_C, "SET_TEX_SAMPLER_POOL_C"),
    (nv9097::SET_TEX_HEADER_POOL_A, "SET_TEX_HEADER_POOL_A"),
    (nv9097::SET_TEX_HEADER_POOL_B, "SET_TEX_HEADER_POOL_B"),
    (nv9097::SET_TEX_HEADER_POOL_C, "SET_TEX_HEADER_POOL_C"),
    (nv9097::SET_CONSTANT_BUFFER_SELECTOR_A, "SET_CONSTANT_BUFFER_SELECTOR_A"),
    (nv9097::SET_CONSTANT_BUFFER_SELECTOR_B, "SET_CONSTANT_BUFFER_SELECTOR_B"),
    (nv9097::SET_CONSTANT_BUFFER_SELECTOR_C, "SET_CONSTANT_BUFFER_SELECTOR_C"),
];

const NVA0C0_NAMES: &[(u16, &str)] = &[
    (nva0c0::SET_OBJECT, "SET_OBJECT"),
    (nva0c0::SET_SHADER_SHARED_MEMORY_WINDOW, "SET_SHADER_SHARED_MEMORY_WINDOW"),
    (
        nva0c0::SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_A,
        "SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_A",
    ),
    (
        nva0c0::SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_B,
        "SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_B",
    ),
    (
        nva0c0::SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_C,
        "SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_C",
    ),
    (nva0c0::SET_SHADER_LOCAL_MEMORY_THROTTLED_A, "SET_SHADER_LOCAL_MEMORY_THROTTLED_A"),
    (nva0c0::SET_SHADER_LOCAL_MEMORY_THROTTLED_B, "SET_SHADER_LOCAL_MEMORY_THROTTLED_B"),
    (nva0c0::SET_SHADER_LOCAL_MEMORY_THROTTLED_C, "SET_SHADER_LOCAL_MEMORY_THROTTLED_C"),
    (nva0c0::SET_SHADER_LOCAL_MEMORY_WINDOW, "SET_SHADER_LOCAL_MEMORY_WINDOW"),
    (nva0c0::SET_SHADER_LOCAL_MEMORY_A, "SET_SHADER_LOCAL_MEMORY_A"),
    (nva0c0::SET_SHADER_LOCAL_MEMORY_B, "SET_SHADER_LOCAL_MEMORY_B"),
    (nva0c0::INVALIDATE_SAMPLER_CACHE_NO_WFI, "INVALIDATE_SAMPLER_CACHE_NO_WFI"),
    (
        nva0c0::INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI,
        "INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI",
    ),
    (nva0c0::SET_TEX_SAMPLER_POOL_A, "SET_TEX_SAMPLER_POOL_A"),
    (nva0c0::SET_TEX_SAMPLER_POOL_B, "SET_TEX_SAMPLER_POOL_B"),
    (nva0c0::SET_TEX_SAMPLER_POOL_C, "SET_TEX_SAMPLER_POOL_C"),
    (nva0c0::SET_TEX_HEADER_POOL_A, "SET_TEX_HEADER_POOL_A"),
    (nva0c0::SET_TEX_HEADER_POOL_B, "SET_TEX_HEADER_POOL_B"),
    (nva0c0::SET_TEX_HEADER_POOL_C, "SET_TEX_HEADER_POOL_C"),
];

const NVC3C0_NAMES: &[(u16, &str)] = &[
    (nvc3c0::SET_SHADER_SHARED_MEMORY_WINDOW_A, "SET_SHADER_SHARED_MEMORY_WINDOW_A"),
    (nvc3c0::SET_SHADER_SHARED_MEMORY_WINDOW_B, "SET_SHADER_SHARED_MEMORY_WINDOW_B"),
    (nvc3c0::SET_SHADER_LOCAL_MEMORY_WINDOW_A, "SET_SHADER_LOCAL_MEMORY_WINDOW_A"),
    (nvc3c0::SET_SHADER_LOCAL_MEMORY_WINDOW_B, "SET_SHADER_LOCAL_MEMORY_WINDOW_B"),
];

const NV9039_NAMES: &[(u16, &str)] = &[(nv9039::SET_OBJECT, "SET_OBJECT")];

fn lookup(table: &[(u16, &'static str)], addr: u16) -> Option<&'static str> {
    table.iter().find(|(a, _)| *a == addr).map(|(_, name)| *name)
}

/// Name of the method at `addr` on `subc` for the given device, if known
pub fn method_name(info: &DeviceInfo, subc: Subchannel, addr: u16) -> Option<&'static str> {
    match subc {
        Subchannel::Eng3d => lookup(NV9097_NAMES, addr),
        Subchannel::Compute => {
            // Volta moved the memory windows; the Kepler offsets are reused
            // for other methods there.
            if info.has_volta_compute() {
                lookup(NVC3C0_NAMES, addr).or_else(|| match addr {
                    nva0c0::SET_SHADER_SHARED_MEMORY_WINDOW
                    | nva0c0::SET_SHADER_LOCAL_MEMORY_WINDOW => None,
                    _ => lookup(NVA0C0_NAMES, addr),
                })
            } else {
                lookup(NVA0C0_NAMES, addr)
            }
        }
        Subchannel::M2mf => lookup(NV9039_NAMES, addr),
        Subchannel::Eng2d | Subchannel::Copy => None,
    }
}
