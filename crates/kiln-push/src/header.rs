//! # Method Headers
//!
//! Host method headers as consumed by the channel's command processor.
//!
//! ```text
//!  31   29 28            16 15  13 12           0
//! ┌───────┬────────────────┬──────┬──────────────┐
//! │ type  │ count / immd   │ subc │  addr >> 2   │
//! └───────┴────────────────┴──────┴──────────────┘
//! ```

/// Largest method count a single header can carry
pub const MAX_MTHD_COUNT: u16 = 0x1fff;

/// Largest payload an immediate header can carry
pub const MAX_IMMD_DATA: u32 = 0x1fff;

// =============================================================================
// INCREMENT TYPE
// =============================================================================

/// How the method address advances across a header's data words
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IncType {
    /// Each dword increments the address by one
    NInc,
    /// The first dword increments the address by one
    OneInc,
    /// The address is not incremented
    ZeroInc,
}

impl IncType {
    const fn type_bits(self) -> u32 {
        match self {
            Self::NInc => 1,
            Self::OneInc => 3,
            Self::ZeroInc => 5,
        }
    }

    /// Method address for the `i`-th data word following a header at `addr`
    pub const fn addr_of(self, addr: u16, i: u16) -> u16 {
        match self {
            Self::NInc => addr.wrapping_add(i * 4),
            Self::OneInc => {
                if i == 0 {
                    addr
                } else {
                    addr.wrapping_add(4)
                }
            }
            Self::ZeroInc => addr,
        }
    }
}

// =============================================================================
// METHOD HEADER
// =============================================================================

/// A decoded method header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MthdHeader {
    /// `count` data words follow
    Data {
        /// Address advance mode
        inc: IncType,
        /// Subchannel
        subc: u8,
        /// Byte address of the first method
        addr: u16,
        /// Number of data words
        count: u16,
    },
    /// Payload is carried in the header itself
    Immd {
        /// Subchannel
        subc: u8,
        /// Byte address of the method
        addr: u16,
        /// 13-bit payload
        data: u16,
    },
}

impl MthdHeader {
    /// Encode a data header
    pub const fn data(inc: IncType, subc: u8, addr: u16, count: u16) -> u32 {
        (inc.type_bits() << 29)
            | ((count as u32 & MAX_MTHD_COUNT as u32) << 16)
            | ((subc as u32 & 0x7) << 13)
            | ((addr as u32 >> 2) & 0x1fff)
    }

    /// Encode an immediate header
    pub const fn immd(subc: u8, addr: u16, data: u16) -> u32 {
        (4 << 29)
            | ((data as u32 & MAX_IMMD_DATA) << 16)
            | ((subc as u32 & 0x7) << 13)
            | ((addr as u32 >> 2) & 0x1fff)
    }

    /// Decode a header word, or `None` for an unknown header type
    pub const fn decode(bits: u32) -> Option<Self> {
        let subc = ((bits >> 13) & 0x7) as u8;
        let addr = ((bits & 0x1fff) << 2) as u16;
        let field = ((bits >> 16) & 0x1fff) as u16;
        let inc = match bits >> 29 {
            1 => IncType::NInc,
            3 => IncType::OneInc,
            5 => IncType::ZeroInc,
            4 => return Some(Self::Immd { subc, addr, data: field }),
            _ => return None,
        };
        Some(Self::Data {
            inc,
            subc,
            addr,
            count: field,
        })
    }

    /// Number of data words following this header
    pub const fn data_words(&self) -> usize {
        match self {
            Self::Data { count, .. } => *count as usize,
            Self::Immd { .. } => 0,
        }
    }
}

/// Bump the count of an incrementing header already in the stream
pub(crate) fn add_count(bits: &mut u32, n: u16) {
    let count = ((*bits >> 16) & 0x1fff) as u16 + n;
    debug_assert!(count <= MAX_MTHD_COUNT);
    *bits = (*bits & !0x1fff_0000) | ((u32::from(count) & 0x1fff) << 16);
}
