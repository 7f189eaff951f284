//! # Kiln Push
//!
//! NVIDIA host-method push buffer encoding and disassembly.
//!
//! ## Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                      State Encoding Path                      │
//! │                                                               │
//! │  ┌──────────────┐    ┌──────────────┐    ┌────────────────┐   │
//! │  │  StatePlan   │    │ PushBuilder  │    │  Mapped BO     │   │
//! │  │ (StateCmd[]) │───▶│ (headers +   │───▶│  (dword slice) │   │
//! │  │              │    │   merging)   │    │                │   │
//! │  └──────────────┘    └──────────────┘    └───────┬────────┘   │
//! │                                                  │            │
//! │                                         ┌────────▼────────┐   │
//! │                                         │   dump_push     │   │
//! │                                         │ (disassembler)  │   │
//! │                                         └─────────────────┘   │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! Commands are typed; raw method offsets stay inside [`class`].

#![no_std]
#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]
#![warn(clippy::all)]

#[cfg(test)]
extern crate alloc;

#[cfg(any(feature = "std", test))]
extern crate std;

pub mod builder;
pub mod class;
pub mod cmd;
pub mod dump;
pub mod header;

// Re-exports
pub use builder::PushBuilder;
pub use class::Subchannel;
pub use cmd::{encode_plan, Engine, StateCmd, StatePlan, MAX_STATE_CMDS, STATE_PUSH_DW_CAPACITY};
pub use dump::dump_push;
pub use header::{IncType, MthdHeader};
