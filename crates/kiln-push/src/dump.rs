//! # Push Disassembler
//!
//! Human-readable dump of an encoded dword stream.
//!
//! ```text
//! [0000] 0x2003255d  NINC subc 1 (class 0xc5c0) mthd 0x1574 count 3
//!            SET_TEX_HEADER_POOL_A = 0x00000001
//!            SET_TEX_HEADER_POOL_B = 0x00200000
//!            SET_TEX_HEADER_POOL_C = 0x00000009
//! [0004] 0x8000250a  IMMD subc 1 (class 0xc5c0) mthd 0x1428
//!            INVALIDATE_TEXTURE_HEADER_CACHE_NO_WFI = 0x0000
//! ```
//!
//! The output format is for people, not a stable interface. Malformed and
//! truncated streams are reported inline and decoding continues where it
//! can.

use core::fmt::{self, Write};

use kiln_core::DeviceInfo;

use crate::class::{method_name, Subchannel};
use crate::header::{IncType, MthdHeader};

fn write_subc(info: &DeviceInfo, subc: u8, out: &mut impl Write) -> fmt::Result {
    write!(out, "subc {}", subc)?;
    match Subchannel::from_raw(subc).and_then(|s| s.class(info)) {
        Some(class) => write!(out, " (class 0x{:04x})", class),
        None => Ok(()),
    }
}

fn write_method(
    info: &DeviceInfo,
    subc: u8,
    addr: u16,
    data: u32,
    out: &mut impl Write,
) -> fmt::Result {
    let name = Subchannel::from_raw(subc).and_then(|s| method_name(info, s, addr));
    match name {
        Some(name) => writeln!(out, "           {} = 0x{:08x}", name, data),
        None => writeln!(out, "           mthd 0x{:04x} = 0x{:08x}", addr, data),
    }
}

/// Disassemble `words` into `out`
pub fn dump_push(words: &[u32], info: &DeviceInfo, out: &mut impl Write) -> fmt::Result {
    let mut i = 0;
    while i < words.len() {
        let bits = words[i];
        write!(out, "[{:04}] 0x{:08x}  ", i, bits)?;
        i += 1;

        match MthdHeader::decode(bits) {
            None => {
                writeln!(out, "<invalid header type {}>", bits >> 29)?;
            }
            Some(MthdHeader::Immd { subc, addr, data }) => {
                write!(out, "IMMD ")?;
                write_subc(info, subc, out)?;
                writeln!(out, " mthd 0x{:04x}", addr)?;
                let name = Subchannel::from_raw(subc).and_then(|s| method_name(info, s, addr));
                match name {
                    Some(name) => writeln!(out, "           {} = 0x{:04x}", name, data)?,
                    None => writeln!(out, "           mthd 0x{:04x} = 0x{:04x}", addr, data)?,
                }
            }
            Some(MthdHeader::Data {
                inc,
                subc,
                addr,
                count,
            }) => {
                let tag = match inc {
                    IncType::NInc => "NINC",
                    IncType::OneInc => "1INC",
                    IncType::ZeroInc => "0INC",
                };
                write!(out, "{} ", tag)?;
                write_subc(info, subc, out)?;
                writeln!(out, " mthd 0x{:04x} count {}", addr, count)?;

                let count = usize::from(count);
                let avail = count.min(words.len() - i);
                for (n, &data) in words[i..i + avail].iter().enumerate() {
                    write_method(info, subc, inc.addr_of(addr, n as u16), data, out)?;
                }
                i += avail;
                if avail < count {
                    writeln!(
                        out,
                        "<truncated: {} of {} data words missing>",
                        count - avail,
                        count
                    )?;
                }
            }
        }
    }
    Ok(())
}
