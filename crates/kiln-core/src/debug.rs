//! # Debug Flags
//!
//! Submission debugging switches. Parsing is separate from lookup so the
//! caller decides where the string comes from.

bitflags::bitflags! {
    /// Submission debugging switches
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct DebugFlags: u32 {
        /// Disassemble every submitted push to the diagnostic sink
        const PUSH_DUMP = 1 << 0;
        /// Wait for each submission to complete before returning
        const PUSH_SYNC = 1 << 1;
    }
}

impl DebugFlags {
    /// Name of the environment variable read by `QueueConfig::from_env`
    pub const ENV_VAR: &'static str = "KILN_DEBUG";

    /// Parse a comma or whitespace separated flag list.
    ///
    /// Unknown tokens are ignored.
    pub fn parse(s: &str) -> Self {
        let mut flags = Self::empty();
        for token in s.split(|c: char| c == ',' || c.is_whitespace()) {
            match token.trim() {
                "push_dump" => flags |= Self::PUSH_DUMP,
                "push_sync" => flags |= Self::PUSH_SYNC,
                "push" => flags |= Self::PUSH_DUMP | Self::PUSH_SYNC,
                "" => {}
                other => log::debug!("ignoring unknown debug flag {:?}", other),
            }
        }
        flags
    }
}
