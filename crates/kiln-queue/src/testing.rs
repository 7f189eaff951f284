//! Mock collaborators for queue tests.

#![allow(missing_docs, missing_debug_implementations)]

use alloc::boxed::Box;
use alloc::sync::Arc;
use alloc::vec;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};

use kiln_core::{
    BoAllocator, BoFlags, BoHandle, BoMapping, BoRef, BufferObject, ByteSize, DebugFlags,
    DeviceInfo, Error, GpuAddr, MapFlags, MappedBo, Result, UploadQueue,
};
use spin::Mutex;

use crate::config::QueueConfig;
use crate::device::DeviceContext;
use crate::provider::{ResourceProvider, SlmSizing};
use crate::sink::MemorySink;
use crate::transport::{CommandBuffer, Submission, SubmitTransport};

// =============================================================================
// EVENT LOG
// =============================================================================

/// Observable side effect of a mock collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Alloc(BoHandle),
    Unmap(BoHandle),
    Destroy(BoHandle),
    Fill(GpuAddr),
    UploadSync,
}

#[derive(Debug, Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    pub fn push(&self, event: Event) {
        self.0.lock().push(event);
    }

    pub fn position(&self, event: Event) -> Option<usize> {
        self.0.lock().iter().position(|e| *e == event)
    }

    pub fn count(&self, f: impl Fn(&Event) -> bool) -> usize {
        self.0.lock().iter().filter(|e| f(e)).count()
    }
}

// =============================================================================
// ALLOCATOR
// =============================================================================

#[derive(Debug)]
struct MockBo {
    handle: BoHandle,
    size: ByteSize,
    offset: GpuAddr,
    log: EventLog,
}

impl BufferObject for MockBo {
    fn handle(&self) -> BoHandle {
        self.handle
    }

    fn size(&self) -> ByteSize {
        self.size
    }

    fn offset(&self) -> GpuAddr {
        self.offset
    }
}

impl Drop for MockBo {
    fn drop(&mut self) {
        self.log.push(Event::Destroy(self.handle));
    }
}

struct MockMap {
    handle: BoHandle,
    words: Vec<u32>,
    log: EventLog,
}

impl BoMapping for MockMap {
    fn as_slice(&self) -> &[u32] {
        &self.words
    }

    fn as_mut_slice(&mut self) -> &mut [u32] {
        &mut self.words
    }
}

impl Drop for MockMap {
    fn drop(&mut self) {
        self.log.push(Event::Unmap(self.handle));
    }
}

/// Allocator recording every BO it hands out, with failure injection
#[derive(Debug)]
pub struct MockAllocator {
    next_handle: AtomicU32,
    attempts: AtomicUsize,
    fail: AtomicBool,
    log: EventLog,
}

impl MockAllocator {
    pub fn new() -> Arc<Self> {
        Self::with_log(EventLog::default())
    }

    pub fn with_log(log: EventLog) -> Arc<Self> {
        Arc::new(Self {
            next_handle: AtomicU32::new(1),
            attempts: AtomicUsize::new(0),
            fail: AtomicBool::new(false),
            log,
        })
    }

    fn make(&self, size: u64) -> MockBo {
        let handle = BoHandle(self.next_handle.fetch_add(1, Ordering::SeqCst));
        self.log.push(Event::Alloc(handle));
        MockBo {
            handle,
            size: ByteSize::from_bytes(size),
            offset: GpuAddr::new(0x1_0000_0000 + u64::from(handle.0) * 0x10_0000),
            log: self.log.clone(),
        }
    }

    /// Create a BO outside the allocation path, e.g. for a provider
    pub fn bo(&self, size: u64) -> BoRef {
        BoRef::new(Arc::new(self.make(size)))
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Calls to `new_bo`/`new_mapped`, failed ones included
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    fn attempt(&self) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::OutOfMemory);
        }
        Ok(())
    }
}

impl BoAllocator for MockAllocator {
    fn new_bo(&self, size: ByteSize, _align: u64, _flags: BoFlags) -> Result<BoRef> {
        self.attempt()?;
        Ok(self.bo(size.as_bytes()))
    }

    fn new_mapped(
        &self,
        size: ByteSize,
        _align: u64,
        _flags: BoFlags,
        _map: MapFlags,
    ) -> Result<MappedBo> {
        self.attempt()?;
        let bo = self.make(size.as_bytes());
        let map = MockMap {
            handle: bo.handle,
            words: vec![0; (size.as_bytes() / 4) as usize],
            log: self.log.clone(),
        };
        Ok(MappedBo::new(BoRef::new(Arc::new(bo)), Box::new(map)))
    }
}

// =============================================================================
// PROVIDER
// =============================================================================

/// Provider returning whatever was last `set`
#[derive(Debug)]
pub struct MockProvider<S> {
    value: Mutex<(Option<BoRef>, S)>,
    queries: AtomicUsize,
}

impl<S> MockProvider<S> {
    pub fn new(bo: Option<BoRef>, sizing: S) -> Self {
        Self {
            value: Mutex::new((bo, sizing)),
            queries: AtomicUsize::new(0),
        }
    }

    pub fn set(&self, bo: Option<BoRef>, sizing: S) {
        *self.value.lock() = (bo, sizing);
    }

    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

impl<S> ResourceProvider for MockProvider<S>
where
    S: Copy + PartialEq + Default + core::fmt::Debug + Send + Sync,
{
    type Sizing = S;

    fn current_ref(&self) -> (Option<BoRef>, S) {
        self.queries.fetch_add(1, Ordering::SeqCst);
        let value = self.value.lock();
        (value.0.clone(), value.1)
    }
}

// =============================================================================
// UPLOAD QUEUE
// =============================================================================

#[derive(Debug)]
pub struct MockUpload {
    fail: AtomicBool,
    log: EventLog,
}

impl MockUpload {
    pub fn new(log: EventLog) -> Arc<Self> {
        Arc::new(Self {
            fail: AtomicBool::new(false),
            log,
        })
    }

    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }
}

impl UploadQueue for MockUpload {
    fn fill(&self, dst: GpuAddr, _value: u32, _size: ByteSize) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::OutOfMemory);
        }
        self.log.push(Event::Fill(dst));
        Ok(())
    }

    fn sync(&self) -> Result<()> {
        self.log.push(Event::UploadSync);
        Ok(())
    }
}

// =============================================================================
// TRANSPORT
// =============================================================================

/// One submission as the transport saw it
#[derive(Debug, Clone)]
pub struct Recorded {
    pub push: Option<(BoHandle, Vec<u32>)>,
    pub command_buffers: usize,
    pub extra_bos: Vec<BoHandle>,
    pub sync: bool,
}

#[derive(Debug, Default)]
pub struct MockTransport {
    submits: Mutex<Vec<Recorded>>,
    fail: AtomicBool,
}

impl MockTransport {
    pub fn set_fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn submits(&self) -> Vec<Recorded> {
        self.submits.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.submits.lock().len()
    }
}

impl SubmitTransport for MockTransport {
    fn submit(&self, submission: &Submission<'_>) -> Result<()> {
        self.submits.lock().push(Recorded {
            push: submission
                .push
                .map(|p| (p.bo.handle(), p.words.to_vec())),
            command_buffers: submission.command_buffers.len(),
            extra_bos: submission.extra_bos.iter().map(BoRef::handle).collect(),
            sync: submission.sync,
        });
        if self.fail.load(Ordering::SeqCst) {
            return Err(Error::TransportFailure);
        }
        Ok(())
    }
}

// =============================================================================
// COMMAND BUFFER
// =============================================================================

#[derive(Debug)]
pub struct MockCmdBuf(pub Vec<u32>);

impl CommandBuffer for MockCmdBuf {
    fn words(&self) -> &[u32] {
        &self.0
    }
}

// =============================================================================
// HARNESS
// =============================================================================

/// A device context wired to mocks
pub struct Harness {
    pub log: EventLog,
    pub alloc: Arc<MockAllocator>,
    pub upload: Arc<MockUpload>,
    pub transport: Arc<MockTransport>,
    pub images: Arc<MockProvider<u32>>,
    pub samplers: Arc<MockProvider<u32>>,
    pub slm: Arc<MockProvider<SlmSizing>>,
    pub sink: Arc<MemorySink>,
    pub dev: Arc<DeviceContext>,
}

impl Harness {
    pub fn new(info: DeviceInfo) -> Self {
        let log = EventLog::default();
        let alloc = MockAllocator::with_log(log.clone());
        let upload = MockUpload::new(log.clone());
        let transport = Arc::new(MockTransport::default());
        let images = Arc::new(MockProvider::new(None, 0u32));
        let samplers = Arc::new(MockProvider::new(None, 0u32));
        let slm = Arc::new(MockProvider::new(None, SlmSizing::default()));

        let dev = Arc::new(DeviceContext {
            info,
            allocator: alloc.clone(),
            upload: upload.clone(),
            transport: transport.clone(),
            images: images.clone(),
            samplers: samplers.clone(),
            slm: slm.clone(),
        });

        Self {
            log,
            alloc,
            upload,
            transport,
            images,
            samplers,
            slm,
            sink: Arc::new(MemorySink::new()),
            dev,
        }
    }

    pub fn config(&self, debug: DebugFlags) -> QueueConfig {
        QueueConfig::new(debug, self.sink.clone())
    }
}
