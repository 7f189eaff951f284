//! # State Commands
//!
//! Typed queue-state setup commands and their encoding.
//!
//! Queue code builds a [`StatePlan`] of [`StateCmd`]s in the order the
//! hardware must see them and hands it to [`encode_plan`]. Which class a
//! command is encoded against is decided here from the [`DeviceInfo`], so
//! callers never deal in raw method offsets.

use arrayvec::ArrayVec;
use kiln_core::{ByteSize, DeviceInfo, GpuAddr, Result};
use static_assertions::const_assert;

use crate::builder::PushBuilder;
use crate::class::{nv9039, nv9097, nva0c0, nvc3c0, Subchannel, INVALIDATE_LINES_ALL};

/// Capacity of a queue state push buffer in dwords
pub const STATE_PUSH_DW_CAPACITY: usize = 256;

/// Most commands a single state plan can hold
pub const MAX_STATE_CMDS: usize = 24;

/// Most dwords any single [`StateCmd`] encodes to
pub const MAX_CMD_DWORDS: usize = 6;

const_assert!(MAX_STATE_CMDS * MAX_CMD_DWORDS <= STATE_PUSH_DW_CAPACITY);

/// An ordered list of state commands
pub type StatePlan = ArrayVec<StateCmd, MAX_STATE_CMDS>;

// =============================================================================
// EXECUTION CONTEXTS
// =============================================================================

/// Execution context with its own binding-table caches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Engine {
    /// Compute engine
    Compute,
    /// 3D engine
    Eng3d,
}

impl Engine {
    /// Both contexts, in the order state is written to them
    pub const ALL: [Engine; 2] = [Engine::Compute, Engine::Eng3d];

    /// Subchannel the engine is bound to
    pub const fn subchannel(self) -> Subchannel {
        match self {
            Self::Compute => Subchannel::Compute,
            Self::Eng3d => Subchannel::Eng3d,
        }
    }
}

// =============================================================================
// STATE COMMANDS
// =============================================================================

/// One queue-state setup command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateCmd {
    /// Bind an engine class to its subchannel
    SetObject {
        /// Subchannel to bind
        subc: Subchannel,
        /// Engine class
        class: u16,
    },
    /// Texture header pool base and bound
    TexHeaderPool {
        /// Target context
        engine: Engine,
        /// Pool base address
        addr: GpuAddr,
        /// Highest valid index (`count - 1`)
        max_index: u32,
    },
    /// Drop every cached texture header
    InvalidateTexHeaderCache {
        /// Target context
        engine: Engine,
    },
    /// Sampler pool base and bound
    TexSamplerPool {
        /// Target context
        engine: Engine,
        /// Pool base address
        addr: GpuAddr,
        /// Highest valid index (`count - 1`)
        max_index: u32,
    },
    /// Drop every cached sampler
    InvalidateSamplerCache {
        /// Target context
        engine: Engine,
    },
    /// Compute scratch base address
    ComputeLocalMemory {
        /// Scratch base address
        addr: GpuAddr,
    },
    /// Compute scratch per-TPC size
    ComputeLocalMemoryNonThrottled {
        /// Bytes per TPC
        bytes_per_tpc: ByteSize,
        /// Maximum SM count
        max_sm_count: u32,
    },
    /// Compute scratch per-TPC size for the throttled path (pre-Volta)
    ComputeLocalMemoryThrottled {
        /// Bytes per TPC
        bytes_per_tpc: ByteSize,
        /// Maximum SM count
        max_sm_count: u32,
    },
    /// 3D scratch base, total size and per-warp size
    Eng3dLocalMemory {
        /// Scratch base address
        addr: GpuAddr,
        /// Scratch buffer size
        size: ByteSize,
        /// Bytes per warp
        bytes_per_warp: u32,
    },
    /// Compute shared memory window
    ComputeSharedMemoryWindow {
        /// Window base
        addr: GpuAddr,
    },
    /// Compute local memory window
    ComputeLocalMemoryWindow {
        /// Window base
        addr: GpuAddr,
    },
    /// 3D local memory window; the 3D engine only has a 32-bit pointer
    Eng3dLocalMemoryWindow {
        /// Window base
        addr: u32,
    },
    /// Bind constant buffer selector
    ConstantBufferSelector {
        /// Buffer size in bytes
        size: u32,
        /// Buffer address
        addr: GpuAddr,
    },
}

impl StateCmd {
    /// Encode against the classes bound on `info`
    pub fn encode(&self, info: &DeviceInfo, p: &mut PushBuilder<'_>) -> Result<()> {
        match *self {
            Self::SetObject { subc, class } => {
                p.mthd(subc, nv9039::SET_OBJECT, &[u32::from(class)])?;
            }
            Self::TexHeaderPool {
                engine,
                addr,
                max_index,
            } => {
                let a = match engine {
                    Engine::Compute => nva0c0::SET_TEX_HEADER_POOL_A,
                    Engine::Eng3d => nv9097::SET_TEX_HEADER_POOL_A,
                };
                p.mthd(engine.subchannel(), a, &[addr.hi(), addr.lo(), max_index])?;
            }
            Self::InvalidateTexHeaderCache { engine } => {
                let m = match engine {
                    Engine::Compute => nva0c0::INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI,
                    Engine::Eng3d => nv9097::INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI,
                };
                p.immd(engine.subchannel(), m, INVALIDATE_LINES_ALL)?;
            }
            Self::TexSamplerPool {
                engine,
                addr,
                max_index,
            } => {
                let a = match engine {
                    Engine::Compute => nva0c0::SET_TEX_SAMPLER_POOL_A,
                    Engine::Eng3d => nv9097::SET_TEX_SAMPLER_POOL_A,
                };
                p.mthd(engine.subchannel(), a, &[addr.hi(), addr.lo(), max_index])?;
            }
            Self::InvalidateSamplerCache { engine } => {
                let m = match engine {
                    Engine::Compute => nva0c0::INVALIDATE_SAMPLER_CACHE_NO_WFI,
                    Engine::Eng3d => nv9097::INVALIDATE_SAMPLER_CACHE_NO_WFI,
                };
                p.immd(engine.subchannel(), m, INVALIDATE_LINES_ALL)?;
            }
            Self::ComputeLocalMemory { addr } => {
                p.mthd(
                    Subchannel::Compute,
                    nva0c0::SET_SHADER_LOCAL_MEMORY_A,
                    &[addr.hi(), addr.lo()],
                )?;
            }
            Self::ComputeLocalMemoryNonThrottled {
                bytes_per_tpc,
                max_sm_count,
            } => {
                p.mthd(
                    Subchannel::Compute,
                    nva0c0::SET_SHADER_LOCAL_MEMORY_NON_THROTTLED_A,
                    &[bytes_per_tpc.hi(), bytes_per_tpc.lo(), max_sm_count],
                )?;
            }
            Self::ComputeLocalMemoryThrottled {
                bytes_per_tpc,
                max_sm_count,
            } => {
                p.mthd(
                    Subchannel::Compute,
                    nva0c0::SET_SHADER_LOCAL_MEMORY_THROTTLED_A,
                    &[bytes_per_tpc.hi(), bytes_per_tpc.lo(), max_sm_count],
                )?;
            }
            Self::Eng3dLocalMemory {
                addr,
                size,
                bytes_per_warp,
            } => {
                p.mthd(
                    Subchannel::Eng3d,
                    nv9097::SET_SHADER_LOCAL_MEMORY_A,
                    &[
                        addr.hi(),
                        addr.lo(),
                        size.hi(),
                        size.lo(),
                        bytes_per_warp,
                    ],
                )?;
            }
            Self::ComputeSharedMemoryWindow { addr } => {
                if info.has_volta_compute() {
                    p.mthd(
                        Subchannel::Compute,
                        nvc3c0::SET_SHADER_SHARED_MEMORY_WINDOW_A,
                        &[addr.hi(), addr.lo()],
                    )?;
                } else {
                    debug_assert_eq!(addr.hi(), 0);
                    p.mthd(
                        Subchannel::Compute,
                        nva0c0::SET_SHADER_SHARED_MEMORY_WINDOW,
                        &[addr.lo()],
                    )?;
                }
            }
            Self::ComputeLocalMemoryWindow { addr } => {
                if info.has_volta_compute() {
                    p.mthd(
                        Subchannel::Compute,
                        nvc3c0::SET_SHADER_LOCAL_MEMORY_WINDOW_A,
                        &[addr.hi(), addr.lo()],
                    )?;
                } else {
                    debug_assert_eq!(addr.hi(), 0);
                    p.mthd(
                        Subchannel::Compute,
                        nva0c0::SET_SHADER_LOCAL_MEMORY_WINDOW,
                        &[addr.lo()],
                    )?;
                }
            }
            Self::Eng3dLocalMemoryWindow { addr } => {
                p.immd(Subchannel::Eng3d, nv9097::SET_SHADER_LOCAL_MEMORY_WINDOW, addr)?;
            }
            Self::ConstantBufferSelector { size, addr } => {
                p.mthd(
                    Subchannel::Eng3d,
                    nv9097::SET_CONSTANT_BUFFER_SELECTOR_A,
                    &[size, addr.hi(), addr.lo()],
                )?;
            }
        }
        Ok(())
    }
}

/// Encode every command of `plan` in order
pub fn encode_plan(plan: &[StateCmd], info: &DeviceInfo, p: &mut PushBuilder<'_>) -> Result<()> {
    for cmd in plan {
        cmd.encode(info, p)?;
    }
    Ok(())
}
