//! # Device Context
//!
//! The device-wide collaborators every queue on a device shares.

use alloc::sync::Arc;
use core::fmt;

use kiln_core::{BoAllocator, DeviceInfo, UploadQueue};

use crate::provider::{DescriptorTable, SlmArea};
use crate::transport::SubmitTransport;

/// Device-wide state shared by the queues of one device.
///
/// Providers must tolerate concurrent queries from several queues.
pub struct DeviceContext {
    /// Engine classes
    pub info: DeviceInfo,
    /// Buffer-object allocator
    pub allocator: Arc<dyn BoAllocator>,
    /// Upload queue for GPU-only memory
    pub upload: Arc<dyn UploadQueue>,
    /// Kernel submission path
    pub transport: Arc<dyn SubmitTransport>,
    /// Image descriptor table
    pub images: Arc<DescriptorTable>,
    /// Sampler descriptor table
    pub samplers: Arc<DescriptorTable>,
    /// Shader local memory area
    pub slm: Arc<SlmArea>,
}

impl fmt::Debug for DeviceContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceContext")
            .field("info", &self.info)
            .finish_non_exhaustive()
    }
}
