//! # Queue State
//!
//! Queue-global binding state: the image and sampler descriptor tables and
//! the shader local memory area, plus the push stream that binds them.
//!
//! The push stream is rebuilt from scratch whenever a slot changes and then
//! replaces the previous one. It is never patched in place, so the installed
//! stream always describes the slots as they are now.

use kiln_core::{BoFlags, ByteSize, DeviceInfo, GpuAddr, MapFlags, MappedBo, Result};
use kiln_push::{encode_plan, Engine, PushBuilder, StateCmd, StatePlan, STATE_PUSH_DW_CAPACITY};
use static_assertions::const_assert;

use crate::device::DeviceContext;
use crate::provider::{ResourceSlot, SlmSizing};
use crate::transport::PushRef;

// =============================================================================
// CONSTANTS
// =============================================================================

/// Granularity of the per-TPC local memory size
pub const SLM_PER_TPC_ALIGN: u64 = 0x8000;

/// Base of the shared memory window
pub const SHARED_WINDOW_BASE: GpuAddr = GpuAddr::new(0xfe << 24);

/// Base of the local memory window
pub const LOCAL_WINDOW_BASE: GpuAddr = GpuAddr::new(0xff << 24);

/// SM count programmed alongside the per-TPC local memory size
const SLM_MAX_SM_COUNT: u32 = 0xff;

const_assert!(SLM_PER_TPC_ALIGN.is_power_of_two());
const_assert!(LOCAL_WINDOW_BASE.hi() == 0);

// =============================================================================
// STATE PUSH
// =============================================================================

/// An encoded state stream in its own mapped buffer object
#[derive(Debug)]
pub struct StatePush {
    mapped: MappedBo,
    dw_count: usize,
}

impl StatePush {
    /// Encoded words
    pub fn words(&self) -> &[u32] {
        &self.mapped.words()[..self.dw_count]
    }

    /// Submission view
    pub fn as_push_ref(&self) -> PushRef<'_> {
        PushRef {
            bo: self.mapped.bo(),
            words: self.words(),
        }
    }
}

// =============================================================================
// QUEUE STATE
// =============================================================================

/// Bound resources and the stream that binds them
#[derive(Debug, Default)]
pub struct QueueState {
    images: ResourceSlot<u32>,
    samplers: ResourceSlot<u32>,
    slm: ResourceSlot<SlmSizing>,
    push: Option<StatePush>,
    /// A slot changed and no rebuild has succeeded since
    needs_rebuild: bool,
}

impl QueueState {
    /// Empty state; nothing bound, no stream
    pub fn new() -> Self {
        Self::default()
    }

    /// Image descriptor table slot
    pub fn images(&self) -> &ResourceSlot<u32> {
        &self.images
    }

    /// Sampler descriptor table slot
    pub fn samplers(&self) -> &ResourceSlot<u32> {
        &self.samplers
    }

    /// Shader local memory slot
    pub fn slm(&self) -> &ResourceSlot<SlmSizing> {
        &self.slm
    }

    /// Installed state stream
    pub fn push(&self) -> Option<&StatePush> {
        self.push.as_ref()
    }

    /// Query every provider; `true` if any slot changed.
    pub fn refresh(&mut self, dev: &DeviceContext) -> bool {
        // All three are queried even once one reported a change.
        let images = self.images.refresh(&*dev.images);
        let samplers = self.samplers.refresh(&*dev.samplers);
        let slm = self.slm.refresh(&*dev.slm);
        images || samplers || slm
    }

    /// Commands binding the current slots, in hardware order
    pub fn plan(&self, info: &DeviceInfo) -> StatePlan {
        let mut plan = StatePlan::new();

        if let Some(bo) = self.images.bo() {
            // An empty table clamps to index 0 rather than wrapping.
            let max_index = self.images.sizing().saturating_sub(1);
            for engine in Engine::ALL {
                plan.push(StateCmd::TexHeaderPool {
                    engine,
                    addr: bo.offset(),
                    max_index,
                });
                plan.push(StateCmd::InvalidateTexHeaderCache { engine });
            }
        }

        if let Some(bo) = self.samplers.bo() {
            // Clamped as for images.
            let max_index = self.samplers.sizing().saturating_sub(1);
            for engine in Engine::ALL {
                plan.push(StateCmd::TexSamplerPool {
                    engine,
                    addr: bo.offset(),
                    max_index,
                });
                plan.push(StateCmd::InvalidateSamplerCache { engine });
            }
        }

        if let Some(bo) = self.slm.bo() {
            let SlmSizing {
                bytes_per_warp,
                bytes_per_tpc,
            } = self.slm.sizing();
            let bytes_per_tpc = ByteSize::from_bytes(bytes_per_tpc);
            assert!(
                bytes_per_tpc.is_multiple_of(SLM_PER_TPC_ALIGN),
                "SLM bytes per TPC 0x{:x} is not a multiple of 0x{:x}",
                bytes_per_tpc.as_bytes(),
                SLM_PER_TPC_ALIGN
            );

            plan.push(StateCmd::ComputeLocalMemory { addr: bo.offset() });
            plan.push(StateCmd::ComputeLocalMemoryNonThrottled {
                bytes_per_tpc,
                max_sm_count: SLM_MAX_SM_COUNT,
            });
            if !info.has_volta_compute() {
                plan.push(StateCmd::ComputeLocalMemoryThrottled {
                    bytes_per_tpc,
                    max_sm_count: SLM_MAX_SM_COUNT,
                });
            }
            plan.push(StateCmd::Eng3dLocalMemory {
                addr: bo.offset(),
                size: bo.size(),
                bytes_per_warp,
            });
        }

        // Windows are always programmed; left alone they point anywhere.
        let shared = StateCmd::ComputeSharedMemoryWindow {
            addr: SHARED_WINDOW_BASE,
        };
        let local = StateCmd::ComputeLocalMemoryWindow {
            addr: LOCAL_WINDOW_BASE,
        };
        if info.has_volta_compute() {
            plan.push(shared);
            plan.push(local);
        } else {
            plan.push(local);
            plan.push(shared);
        }
        plan.push(StateCmd::Eng3dLocalMemoryWindow {
            addr: LOCAL_WINDOW_BASE.lo(),
        });

        plan
    }

    /// Encode the current slots into a new stream and install it.
    ///
    /// On failure the installed stream is left untouched.
    pub fn rebuild(&mut self, dev: &DeviceContext) -> Result<()> {
        let plan = self.plan(&dev.info);

        let mut mapped = dev.allocator.new_mapped(
            ByteSize::from_dwords(STATE_PUSH_DW_CAPACITY as u32),
            0,
            BoFlags::GART | BoFlags::MAP | BoFlags::NO_SHARE,
            MapFlags::WR,
        )?;

        let dw_count = {
            let mut p = PushBuilder::new(mapped.words_mut());
            encode_plan(&plan, &dev.info, &mut p)?;
            p.dw_count()
        };

        log::debug!(
            "queue state push rebuilt: {} commands, {} dwords in {:?}",
            plan.len(),
            dw_count,
            mapped.bo().handle()
        );

        // The previous stream unmaps and releases only after the new one is in.
        let old = self.push.replace(StatePush { mapped, dw_count });
        drop(old);
        Ok(())
    }

    /// Refresh and rebuild if needed; `true` when a new stream was installed.
    ///
    /// A change seen by a refresh whose rebuild failed is still pending on
    /// the next call.
    pub fn update(&mut self, dev: &DeviceContext) -> Result<bool> {
        if self.refresh(dev) {
            self.needs_rebuild = true;
        }
        if !self.needs_rebuild {
            log::trace!("queue state clean");
            return Ok(false);
        }
        self.rebuild(dev)?;
        self.needs_rebuild = false;
        Ok(true)
    }

    /// Release every slot and the installed stream
    pub fn clear(&mut self) {
        self.push = None;
        self.images.clear();
        self.samplers.clear();
        self.slm.clear();
        self.needs_rebuild = false;
    }
}
