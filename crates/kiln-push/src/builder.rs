//! # Push Builder
//!
//! Bounded writer for a push buffer.
//!
//! The builder writes into a caller-provided dword slice, usually the CPU
//! mapping of a freshly allocated buffer object. Every write is checked
//! against the slice length before anything is stored, so a failed write
//! leaves the already encoded prefix intact.

use kiln_core::{Error, Result};

use crate::class::Subchannel;
use crate::header::{add_count, IncType, MthdHeader, MAX_IMMD_DATA, MAX_MTHD_COUNT};

// =============================================================================
// OPEN HEADER
// =============================================================================

/// The last incrementing header, still open for appending
#[derive(Debug, Clone, Copy)]
struct OpenMthd {
    /// Index of the header word
    at: usize,
    subc: u8,
    /// Address the next merged method must have
    next_addr: u16,
    count: u16,
}

// =============================================================================
// PUSH BUILDER
// =============================================================================

/// Encodes host methods into a fixed-capacity dword buffer
#[derive(Debug)]
pub struct PushBuilder<'a> {
    buf: &'a mut [u32],
    len: usize,
    open: Option<OpenMthd>,
}

impl<'a> PushBuilder<'a> {
    /// Start encoding at the beginning of `buf`
    pub fn new(buf: &'a mut [u32]) -> Self {
        Self {
            buf,
            len: 0,
            open: None,
        }
    }

    /// Number of dwords written so far
    #[inline]
    pub fn dw_count(&self) -> usize {
        self.len
    }

    /// Capacity in dwords
    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Remaining space in dwords
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Encoded words
    pub fn words(&self) -> &[u32] {
        &self.buf[..self.len]
    }

    fn reserve(&self, dwords: usize) -> Result<()> {
        if dwords > self.remaining() {
            log::debug!(
                "push builder full: need {} dwords, {} of {} left",
                dwords,
                self.remaining(),
                self.capacity()
            );
            return Err(Error::CommandBufferFull);
        }
        Ok(())
    }

    fn push_word(&mut self, word: u32) {
        self.buf[self.len] = word;
        self.len += 1;
    }

    /// Write consecutive methods starting at `addr`.
    ///
    /// Data continuing the previous incrementing header (same subchannel,
    /// next address) is appended to it instead of opening a new header.
    pub fn mthd(&mut self, subc: Subchannel, addr: u16, data: &[u32]) -> Result<()> {
        if data.is_empty() {
            return Ok(());
        }
        debug_assert!(addr & 3 == 0, "method address 0x{:x} is not dword aligned", addr);
        let subc = subc.raw();

        let mut rest = data;
        let mut addr = addr;

        if let Some(open) = self.open {
            if open.subc == subc && open.next_addr == addr {
                let room = usize::from(MAX_MTHD_COUNT - open.count);
                let n = rest.len().min(room);
                self.reserve(n)?;
                let merged = self.open.as_mut().map(|o| {
                    o.count += n as u16;
                    o.next_addr = o.next_addr.wrapping_add(n as u16 * 4);
                    o.at
                });
                if let Some(at) = merged {
                    add_count(&mut self.buf[at], n as u16);
                }
                for &word in &rest[..n] {
                    self.push_word(word);
                }
                rest = &rest[n..];
                addr = addr.wrapping_add(n as u16 * 4);
            }
        }

        while !rest.is_empty() {
            let n = rest.len().min(usize::from(MAX_MTHD_COUNT));
            self.reserve(n + 1)?;
            let at = self.len;
            self.push_word(MthdHeader::data(IncType::NInc, subc, addr, n as u16));
            for &word in &rest[..n] {
                self.push_word(word);
            }
            self.open = Some(OpenMthd {
                at,
                subc,
                next_addr: addr.wrapping_add(n as u16 * 4),
                count: n as u16,
            });
            rest = &rest[n..];
            addr = addr.wrapping_add(n as u16 * 4);
        }
        Ok(())
    }

    /// Write a single method, as an immediate header when the payload fits
    pub fn immd(&mut self, subc: Subchannel, addr: u16, data: u32) -> Result<()> {
        if data > MAX_IMMD_DATA {
            return self.mthd(subc, addr, &[data]);
        }
        self.reserve(1)?;
        self.push_word(MthdHeader::immd(subc.raw(), addr, data as u16));
        self.open = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_method() {
        let mut buf = [0u32; 8];
        let mut p = PushBuilder::new(&mut buf);
        p.mthd(Subchannel::Compute, 0x1574, &[0x1, 0x2000_0000, 9]).unwrap();
        assert_eq!(p.words(), &[0x2003_255d, 0x1, 0x2000_0000, 9]);
        assert_eq!(p.dw_count(), 4);
    }

    #[test]
    fn test_merge_consecutive() {
        let mut buf = [0u32; 8];
        let mut p = PushBuilder::new(&mut buf);
        p.mthd(Subchannel::Eng3d, 0x0790, &[0xa]).unwrap();
        p.mthd(Subchannel::Eng3d, 0x0794, &[0xb]).unwrap();
        assert_eq!(p.dw_count(), 3);
        assert_eq!(p.words()[0], MthdHeader::data(IncType::NInc, 0, 0x0790, 2));
    }

    #[test]
    fn test_no_merge_across_subchannels() {
        let mut buf = [0u32; 8];
        let mut p = PushBuilder::new(&mut buf);
        p.mthd(Subchannel::Eng3d, 0x0790, &[0xa]).unwrap();
        p.mthd(Subchannel::Compute, 0x0794, &[0xb]).unwrap();
        assert_eq!(p.dw_count(), 4);
    }

    #[test]
    fn test_immd_breaks_merge() {
        let mut buf = [0u32; 8];
        let mut p = PushBuilder::new(&mut buf);
        p.mthd(Subchannel::Eng3d, 0x1574, &[1, 2, 3]).unwrap();
        p.immd(Subchannel::Eng3d, 0x1428, 0).unwrap();
        p.mthd(Subchannel::Eng3d, 0x1580, &[4]).unwrap();
        assert_eq!(p.dw_count(), 7);
    }

    #[test]
    fn test_large_immd_falls_back() {
        let mut buf = [0u32; 4];
        let mut p = PushBuilder::new(&mut buf);
        p.immd(Subchannel::Eng3d, 0x077c, 0xff << 24).unwrap();
        assert_eq!(p.words(), &[MthdHeader::data(IncType::NInc, 0, 0x077c, 1), 0xff00_0000]);
    }

    #[test]
    fn test_capacity_is_enforced() {
        let mut buf = [0u32; 3];
        let mut p = PushBuilder::new(&mut buf);
        assert_eq!(
            p.mthd(Subchannel::Compute, 0x1574, &[1, 2, 3]),
            Err(Error::CommandBufferFull)
        );
        assert_eq!(p.dw_count(), 0);

        p.mthd(Subchannel::Compute, 0x1574, &[1, 2]).unwrap();
        assert_eq!(p.immd(Subchannel::Compute, 0x1428, 0), Err(Error::CommandBufferFull));
        assert_eq!(p.dw_count(), 3);
    }
}
