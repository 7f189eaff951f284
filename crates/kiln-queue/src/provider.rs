//! # Resource Providers
//!
//! Interfaces to the device-wide allocators whose buffer objects the queue
//! state binds: the image and sampler descriptor tables and the shader
//! local memory (SLM) area.
//!
//! A provider hands out a fresh reference on every query and does not track
//! what the caller does with it. The caller keeps the reference when the
//! value changed and drops it otherwise.

use kiln_core::BoRef;

// =============================================================================
// PROVIDER TRAIT
// =============================================================================

/// A device-wide allocator backing one queue state slot
pub trait ResourceProvider: Send + Sync {
    /// Sizing metadata reported alongside the buffer object
    type Sizing: Copy + PartialEq + Default + core::fmt::Debug;

    /// Current backing buffer object (with a new reference) and its sizing.
    ///
    /// `None` means the resource has not been allocated yet.
    fn current_ref(&self) -> (Option<BoRef>, Self::Sizing);
}

/// Image or sampler descriptor table; sizing is the allocated entry count
pub type DescriptorTable = dyn ResourceProvider<Sizing = u32>;

/// Shader local memory area
pub type SlmArea = dyn ResourceProvider<Sizing = SlmSizing>;

/// Shader local memory sizing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SlmSizing {
    /// Bytes of local memory per warp
    pub bytes_per_warp: u32,
    /// Bytes of local memory per TPC
    pub bytes_per_tpc: u64,
}

// =============================================================================
// RESOURCE SLOT
// =============================================================================

/// Cached provider value held by the queue state
#[derive(Debug, Default)]
pub struct ResourceSlot<S> {
    bo: Option<BoRef>,
    sizing: S,
}

impl<S: Copy + PartialEq + Default + core::fmt::Debug> ResourceSlot<S> {
    /// Empty slot
    pub fn new() -> Self {
        Self {
            bo: None,
            sizing: S::default(),
        }
    }

    /// Bound buffer object
    #[inline]
    pub fn bo(&self) -> Option<&BoRef> {
        self.bo.as_ref()
    }

    /// Bound sizing
    #[inline]
    pub fn sizing(&self) -> S {
        self.sizing
    }

    /// Query `provider` and take its value if it differs from the cached one.
    ///
    /// Returns `true` when the slot changed. The superseded reference, or the
    /// unused duplicate when nothing changed, is released here.
    pub fn refresh(&mut self, provider: &dyn ResourceProvider<Sizing = S>) -> bool {
        let (bo, sizing) = provider.current_ref();
        if self.bo == bo && self.sizing == sizing {
            return false;
        }

        log::debug!(
            "slot changed: {:?} {:?} -> {:?} {:?}",
            self.bo.as_ref().map(BoRef::handle),
            self.sizing,
            bo.as_ref().map(BoRef::handle),
            sizing
        );
        self.bo = bo;
        self.sizing = sizing;
        true
    }

    /// Drop the bound reference
    pub fn clear(&mut self) {
        self.bo = None;
        self.sizing = S::default();
    }
}
