//! # Hardware Queue
//!
//! Queue bring-up, submission and the lost-queue latch.
//!
//! ## Lifecycle
//!
//! ```text
//!   Queue::new ──▶ Idle ◀──▶ Submitting
//!                   │            │
//!                   └─────┬──────┘
//!                         ▼
//!                       Lost (terminal)
//! ```
//!
//! Calls on one queue must be serialized by the caller; every operation
//! takes `&mut self`. Distinct queues share only the [`DeviceContext`].

use alloc::string::String;
use alloc::sync::Arc;
use core::fmt::Write;

use kiln_core::{BoFlags, BoRef, ByteSize, DeviceInfo, Error, MapFlags, QueueFlags, Result};
use kiln_push::{dump_push, PushBuilder, StateCmd, Subchannel};

use crate::config::QueueConfig;
use crate::device::DeviceContext;
use crate::state::QueueState;
use crate::transport::{CommandBuffer, PushRef, Submission};

/// Size of the constant buffer bound on graphics queues
pub const DRAW_CB0_SIZE: ByteSize = ByteSize::KIB_4;

/// Capacity of the on-stack bring-up stream in dwords
const BRING_UP_DW_CAPACITY: usize = 64;

const LOST_STATE_UPDATE: &str = "failed to update queue base pointers push buffer";
const LOST_SUBMIT: &str = "submit failed";

// =============================================================================
// STATISTICS
// =============================================================================

/// Queue statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    /// Submissions that reached the transport
    pub submissions: u64,
    /// One-off submissions that reached the transport
    pub simple_submissions: u64,
    /// State push rebuilds
    pub rebuilds: u64,
    /// Submissions that failed after the lost check
    pub failed_submissions: u64,
}

// =============================================================================
// QUEUE
// =============================================================================

/// A hardware execution queue
#[derive(Debug)]
pub struct Queue {
    dev: Arc<DeviceContext>,
    config: QueueConfig,
    flags: QueueFlags,
    state: QueueState,
    draw_cb0: Option<BoRef>,
    lost: Option<&'static str>,
    stats: QueueStats,
}

impl Queue {
    /// Bring up a queue of the given family.
    ///
    /// `flags` is widened by [`QueueFlags::with_implied_engines`]. Anything
    /// acquired before a failure is released again.
    pub fn new(dev: Arc<DeviceContext>, flags: QueueFlags, config: QueueConfig) -> Result<Self> {
        let flags = flags.with_implied_engines();
        let mut queue = Self {
            dev,
            config,
            flags,
            state: QueueState::new(),
            draw_cb0: None,
            lost: None,
            stats: QueueStats::default(),
        };

        if flags.contains(QueueFlags::GRAPHICS) {
            let cb0 = queue.dev.allocator.new_bo(
                DRAW_CB0_SIZE,
                0,
                BoFlags::LOCAL | BoFlags::NO_SHARE,
            )?;
            queue.dev.upload.fill(cb0.offset(), 0, cb0.size())?;
            queue.draw_cb0 = Some(cb0);
        }

        queue.init_context_state()?;
        log::debug!("queue up: {:?} on {:?}", queue.flags, queue.dev.info);
        Ok(queue)
    }

    fn init_context_state(&mut self) -> Result<()> {
        let info = self.dev.info;
        let mut buf = [0u32; BRING_UP_DW_CAPACITY];
        let mut p = PushBuilder::new(&mut buf);

        if info.needs_m2mf_object() {
            StateCmd::SetObject {
                subc: Subchannel::M2mf,
                class: info.cls_m2mf,
            }
            .encode(&info, &mut p)?;
        }

        if self.flags.contains(QueueFlags::GRAPHICS) {
            StateCmd::SetObject {
                subc: Subchannel::Eng3d,
                class: info.cls_eng3d,
            }
            .encode(&info, &mut p)?;
            if let Some(cb0) = &self.draw_cb0 {
                StateCmd::ConstantBufferSelector {
                    size: cb0.size().as_bytes() as u32,
                    addr: cb0.offset(),
                }
                .encode(&info, &mut p)?;
            }
        }

        if self.flags.contains(QueueFlags::COMPUTE) {
            StateCmd::SetObject {
                subc: Subchannel::Compute,
                class: info.cls_compute,
            }
            .encode(&info, &mut p)?;
        }

        let words = p.words();
        log::debug!("queue bring-up stream: {} dwords", words.len());
        self.submit_simple(words, &[])
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Engines this queue brought up
    #[inline]
    pub fn flags(&self) -> QueueFlags {
        self.flags
    }

    /// Device this queue belongs to
    pub fn device(&self) -> &Arc<DeviceContext> {
        &self.dev
    }

    /// Configuration
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Bound resources and the installed state stream
    pub fn state(&self) -> &QueueState {
        &self.state
    }

    /// Graphics constant buffer, on graphics queues
    pub fn draw_cb0(&self) -> Option<&BoRef> {
        self.draw_cb0.as_ref()
    }

    /// Statistics
    pub fn stats(&self) -> QueueStats {
        self.stats
    }

    /// Whether the queue is latched lost
    #[inline]
    pub fn is_lost(&self) -> bool {
        self.lost.is_some()
    }

    /// Why the queue was lost
    pub fn lost_reason(&self) -> Option<&'static str> {
        self.lost
    }

    fn set_lost(&mut self, reason: &'static str) {
        if self.lost.is_none() {
            log::error!("queue lost: {}", reason);
            self.lost = Some(reason);
        }
    }

    fn check_lost(&self) -> Result<()> {
        match self.lost {
            Some(_) => Err(Error::DeviceLost),
            None => Ok(()),
        }
    }

    // =========================================================================
    // Submission
    // =========================================================================

    /// Submit command buffers behind the current queue state stream.
    ///
    /// A failed state update returns its cause; a failed transport returns
    /// [`Error::TransportFailure`]. Either latches the queue lost, after
    /// which every call returns [`Error::DeviceLost`] without doing work.
    pub fn submit(&mut self, command_buffers: &[&dyn CommandBuffer]) -> Result<()> {
        self.check_lost()?;

        match self.state.update(&self.dev) {
            Ok(true) => self.stats.rebuilds += 1,
            Ok(false) => {}
            Err(err) => {
                log::warn!("queue state update failed: {}", err);
                self.stats.failed_submissions += 1;
                self.set_lost(LOST_STATE_UPDATE);
                return Err(err);
            }
        }

        let push = self.state.push().map(|p| p.as_push_ref());
        let result = self.dev.transport.submit(&Submission {
            push,
            command_buffers,
            extra_bos: &[],
            sync: self.config.sync_submits(),
        });
        self.stats.submissions += 1;

        if result.is_err() || self.config.dump_all() {
            self.dump(push, command_buffers);
        }

        if let Err(err) = result {
            log::warn!("submit of {} command buffers failed: {}", command_buffers.len(), err);
            self.stats.failed_submissions += 1;
            self.set_lost(LOST_SUBMIT);
            return Err(Error::TransportFailure);
        }
        Ok(())
    }

    /// Submit `words` once from a temporary buffer object.
    ///
    /// The queue state is neither consulted nor updated. An allocation
    /// failure is returned without losing the queue.
    pub fn submit_simple(&mut self, words: &[u32], extra_bos: &[BoRef]) -> Result<()> {
        self.check_lost()?;

        let mut mapped = self.dev.allocator.new_mapped(
            ByteSize::from_dwords(words.len() as u32),
            0,
            BoFlags::GART | BoFlags::MAP | BoFlags::NO_SHARE,
            MapFlags::WR,
        )?;
        let dst = mapped
            .words_mut()
            .get_mut(..words.len())
            .ok_or(Error::MappingFailed)?;
        dst.copy_from_slice(words);

        let push = PushRef {
            bo: mapped.bo(),
            words: &mapped.words()[..words.len()],
        };
        let result = self.dev.transport.submit(&Submission {
            push: Some(push),
            command_buffers: &[],
            extra_bos,
            sync: self.config.sync_submits(),
        });
        self.stats.simple_submissions += 1;

        if result.is_err() || self.config.dump_all() {
            self.dump(Some(push), &[]);
        }
        drop(mapped);

        if let Err(err) = result {
            log::warn!("simple submit of {} dwords failed: {}", words.len(), err);
            self.stats.failed_submissions += 1;
            self.set_lost(LOST_SUBMIT);
            return Err(Error::TransportFailure);
        }
        Ok(())
    }

    fn dump(&self, push: Option<PushRef<'_>>, command_buffers: &[&dyn CommandBuffer]) {
        let mut report = String::new();
        // Writing into a String cannot fail.
        let _ = write_report(&self.dev.info, push, command_buffers, &mut report);
        self.config.sink.emit(&report);
    }

    // =========================================================================
    // Teardown
    // =========================================================================

    /// Tear the queue down
    pub fn finish(self) {
        drop(self);
    }

    fn release(&mut self) {
        if let Some(cb0) = self.draw_cb0.take() {
            // The zero fill may still be in flight.
            if let Err(err) = self.dev.upload.sync() {
                log::warn!("upload sync before releasing draw cb0 failed: {}", err);
            }
            drop(cb0);
        }
        self.state.clear();
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        self.release();
    }
}

fn write_report(
    info: &DeviceInfo,
    push: Option<PushRef<'_>>,
    command_buffers: &[&dyn CommandBuffer],
    out: &mut String,
) -> core::fmt::Result {
    if let Some(push) = push {
        writeln!(out, "push {:?}, {} dwords:", push.bo.handle(), push.dw_count())?;
        dump_push(push.words, info, out)?;
    }
    for (i, cmd) in command_buffers.iter().enumerate() {
        writeln!(out, "command buffer {}, {} dwords:", i, cmd.words().len())?;
        dump_push(cmd.words(), info, out)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SlmSizing;
    use crate::testing::{Event, Harness, MockCmdBuf};
    use kiln_core::DebugFlags;
    use kiln_push::class::{nv9039, nv9097, nva0c0};
    use kiln_push::{IncType, MthdHeader};

    fn queue(h: &Harness, flags: QueueFlags, debug: DebugFlags) -> Queue {
        Queue::new(h.dev.clone(), flags, h.config(debug)).unwrap()
    }

    #[test]
    fn test_graphics_bring_up() {
        let h = Harness::new(DeviceInfo::turing());
        let q = queue(&h, QueueFlags::GRAPHICS, DebugFlags::empty());
        assert_eq!(q.flags(), QueueFlags::GRAPHICS | QueueFlags::COMPUTE);

        let cb0 = q.draw_cb0().unwrap();
        assert_eq!(cb0.size(), DRAW_CB0_SIZE);
        assert!(h.log.position(Event::Fill(cb0.offset())).is_some());

        let submits = h.transport.submits();
        assert_eq!(submits.len(), 1);
        let (_, words) = submits[0].push.clone().unwrap();
        assert_eq!(
            words,
            [
                MthdHeader::data(IncType::NInc, 0, nv9097::SET_OBJECT, 1),
                u32::from(DeviceInfo::turing().cls_eng3d),
                MthdHeader::data(IncType::NInc, 0, nv9097::SET_CONSTANT_BUFFER_SELECTOR_A, 3),
                4096,
                cb0.offset().hi(),
                cb0.offset().lo(),
                MthdHeader::data(IncType::NInc, 1, nva0c0::SET_OBJECT, 1),
                u32::from(DeviceInfo::turing().cls_compute),
            ]
        );
        assert_eq!(q.stats().simple_submissions, 1);
    }

    #[test]
    fn test_transfer_bring_up_is_m2mf_only() {
        let mut info = DeviceInfo::kepler();
        info.cls_m2mf = kiln_core::device::FERMI_MEMORY_TO_MEMORY_FORMAT_A;
        let h = Harness::new(info);
        let q = queue(&h, QueueFlags::TRANSFER, DebugFlags::empty());
        assert!(q.draw_cb0().is_none());

        let (_, words) = h.transport.submits()[0].push.clone().unwrap();
        assert_eq!(
            words,
            [
                MthdHeader::data(IncType::NInc, 2, nv9039::SET_OBJECT, 1),
                u32::from(info.cls_m2mf),
            ]
        );
    }

    #[test]
    fn test_bring_up_buffer_is_released() {
        let h = Harness::new(DeviceInfo::turing());
        let _q = queue(&h, QueueFlags::COMPUTE, DebugFlags::empty());
        let (handle, _) = h.transport.submits()[0].push.clone().unwrap();
        let unmap = h.log.position(Event::Unmap(handle)).unwrap();
        let destroy = h.log.position(Event::Destroy(handle)).unwrap();
        assert!(unmap < destroy);
    }

    #[test]
    fn test_init_failure_releases_cb0() {
        let h = Harness::new(DeviceInfo::turing());
        h.transport.set_fail(true);
        let err = Queue::new(h.dev.clone(), QueueFlags::GRAPHICS, h.config(DebugFlags::empty()));
        assert_eq!(err.err(), Some(Error::TransportFailure));

        // draw cb0 is handle 1, the bring-up stream handle 2
        let sync = h.log.position(Event::UploadSync).unwrap();
        let destroy = h.log.position(Event::Destroy(kiln_core::BoHandle(1))).unwrap();
        assert!(sync < destroy);
    }

    #[test]
    fn test_init_fill_failure() {
        let h = Harness::new(DeviceInfo::turing());
        h.upload.set_fail(true);
        let err = Queue::new(h.dev.clone(), QueueFlags::GRAPHICS, h.config(DebugFlags::empty()));
        assert_eq!(err.err(), Some(Error::OutOfMemory));
        assert_eq!(h.transport.calls(), 0);
        assert_eq!(h.log.count(|e| matches!(e, Event::Destroy(_))), 1);
    }

    #[test]
    fn test_submit_pushes_state_ahead() {
        let h = Harness::new(DeviceInfo::turing());
        let mut q = queue(&h, QueueFlags::COMPUTE, DebugFlags::empty());
        h.images.set(Some(h.alloc.bo(0x1000)), 10);

        let cmd = MockCmdBuf(alloc::vec![0x2001_0000, 0]);
        q.submit(&[&cmd, &cmd]).unwrap();

        let last = h.transport.submits().pop().unwrap();
        let state_push = q.state().push().unwrap();
        assert_eq!(last.push.unwrap().1, state_push.words());
        assert_eq!(last.command_buffers, 2);
        assert!(!last.sync);
        assert_eq!(q.stats().rebuilds, 1);
        assert!(h.sink.is_empty());
    }

    #[test]
    fn test_no_spurious_rebuilds() {
        let h = Harness::new(DeviceInfo::turing());
        let mut q = queue(&h, QueueFlags::COMPUTE, DebugFlags::empty());
        let table = h.alloc.bo(0x1000);
        h.images.set(Some(table.clone()), 10);

        q.submit(&[]).unwrap();
        let attempts = h.alloc.attempts();
        q.submit(&[]).unwrap();
        h.images.set(Some(table.clone()), 10);
        q.submit(&[]).unwrap();
        assert_eq!(h.alloc.attempts(), attempts);
        assert_eq!(q.stats().rebuilds, 1);

        h.images.set(Some(table.clone()), 20);
        q.submit(&[]).unwrap();
        assert_eq!(q.stats().rebuilds, 2);

        h.slm.set(
            Some(h.alloc.bo(0x10_0000)),
            SlmSizing {
                bytes_per_warp: 0x200,
                bytes_per_tpc: 0x8000,
            },
        );
        q.submit(&[]).unwrap();
        assert_eq!(q.stats().rebuilds, 3);
        assert_eq!(q.stats().submissions, 5);
    }

    #[test]
    fn test_rebuild_oom_loses_queue() {
        let h = Harness::new(DeviceInfo::turing());
        let mut q = queue(&h, QueueFlags::COMPUTE, DebugFlags::empty());
        h.images.set(Some(h.alloc.bo(0x1000)), 10);
        h.alloc.set_fail(true);
        let calls = h.transport.calls();

        assert_eq!(q.submit(&[]), Err(Error::OutOfMemory));
        assert!(q.is_lost());
        assert_eq!(q.lost_reason(), Some(LOST_STATE_UPDATE));

        let attempts = h.alloc.attempts();
        let queries = h.images.queries();
        assert_eq!(q.submit(&[]), Err(Error::DeviceLost));
        assert_eq!(q.submit_simple(&[0], &[]), Err(Error::DeviceLost));
        assert_eq!(h.alloc.attempts(), attempts);
        assert_eq!(h.images.queries(), queries);
        assert_eq!(h.transport.calls(), calls);
    }

    #[test]
    fn test_transport_failure_always_dumps() {
        let h = Harness::new(DeviceInfo::turing());
        let mut q = queue(&h, QueueFlags::COMPUTE, DebugFlags::empty());
        h.transport.set_fail(true);

        let cmd = MockCmdBuf(alloc::vec![MthdHeader::immd(
            1,
            nva0c0::INVALIDATE_SAMPLER_CACHE_NO_WFI,
            0
        )]);
        assert_eq!(q.submit(&[&cmd]), Err(Error::TransportFailure));
        assert_eq!(q.lost_reason(), Some(LOST_SUBMIT));

        let reports = h.sink.take();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("command buffer 0, 1 dwords:"));
        assert!(reports[0].contains("INVALIDATE_SAMPLER_CACHE_NO_WFI"));

        let calls = h.transport.calls();
        assert_eq!(q.submit(&[&cmd]), Err(Error::DeviceLost));
        assert_eq!(h.transport.calls(), calls);
        assert!(h.sink.is_empty());
        assert_eq!(q.stats().failed_submissions, 1);
    }

    #[test]
    fn test_dump_flag_dumps_on_success() {
        let h = Harness::new(DeviceInfo::kepler());
        let mut q = queue(&h, QueueFlags::COMPUTE, DebugFlags::PUSH_DUMP);
        // bring-up dumped too
        assert_eq!(h.sink.take().len(), 1);

        h.samplers.set(Some(h.alloc.bo(0x1000)), 8);
        q.submit(&[]).unwrap();
        let reports = h.sink.take();
        assert_eq!(reports.len(), 1);
        assert!(reports[0].contains("SET_TEX_SAMPLER_POOL_C = 0x00000007"));
        assert!(!q.is_lost());
    }

    #[test]
    fn test_sync_flag_reaches_transport() {
        let h = Harness::new(DeviceInfo::turing());
        let mut q = queue(&h, QueueFlags::COMPUTE, DebugFlags::PUSH_SYNC);
        q.submit(&[]).unwrap();
        assert!(h.transport.submits().iter().all(|s| s.sync));
        assert!(h.sink.is_empty());
    }

    #[test]
    fn test_simple_oom_keeps_queue() {
        let h = Harness::new(DeviceInfo::turing());
        let mut q = queue(&h, QueueFlags::COMPUTE, DebugFlags::empty());
        h.alloc.set_fail(true);
        assert_eq!(q.submit_simple(&[1, 2], &[]), Err(Error::OutOfMemory));
        assert!(!q.is_lost());

        h.alloc.set_fail(false);
        let extra = h.alloc.bo(0x1000);
        q.submit_simple(&[1, 2], &[extra.clone()]).unwrap();
        let last = h.transport.submits().pop().unwrap();
        assert_eq!(last.push.unwrap().1, [1, 2]);
        assert_eq!(last.extra_bos, [extra.handle()]);
        assert_eq!(last.command_buffers, 0);
    }

    #[test]
    fn test_simple_transport_failure_loses_queue() {
        let h = Harness::new(DeviceInfo::turing());
        let mut q = queue(&h, QueueFlags::COMPUTE, DebugFlags::empty());
        h.transport.set_fail(true);
        assert_eq!(q.submit_simple(&[1], &[]), Err(Error::TransportFailure));
        assert!(q.is_lost());
        assert_eq!(h.sink.len(), 1);
    }

    #[test]
    fn test_finish_syncs_before_releasing_cb0() {
        let h = Harness::new(DeviceInfo::turing());
        let mut q = queue(&h, QueueFlags::GRAPHICS, DebugFlags::empty());
        let cb0 = q.draw_cb0().map(BoRef::handle).unwrap();
        h.images.set(Some(h.alloc.bo(0x1000)), 10);
        q.submit(&[]).unwrap();
        let push = q.state().push().map(|p| p.as_push_ref().bo.handle()).unwrap();

        q.finish();
        let sync = h.log.position(Event::UploadSync).unwrap();
        let destroy = h.log.position(Event::Destroy(cb0)).unwrap();
        assert!(sync < destroy);
        assert!(h.log.position(Event::Destroy(push)).is_some());
    }
}
