//! Per-machine constants the codec needs but cannot infer from the data.

use serde::Serialize;

use crate::checksum::Checksum;

/// Machine id byte of K5000-family dump headers.
pub const MACHINE_ID_K5000: u8 = 0x0A;

/// A hardware generation, identified by the machine id byte of a dump header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Machine {
    /// The K5000 family: 128 slots per bank, masked checksums.
    K5000,
}

impl Machine {
    /// Every known machine.
    pub const ALL: [Machine; 1] = [Machine::K5000];

    /// Looks up a machine by the id byte of a dump header.
    pub fn from_id(id: u8) -> Option<Machine> {
        Self::ALL.into_iter().find(|machine| machine.id() == id)
    }

    /// The id byte sent in dump headers and requests.
    pub const fn id(self) -> u8 {
        match self {
            Machine::K5000 => MACHINE_ID_K5000,
        }
    }

    /// Addressable patch slots per bank; this fixes the tone map length.
    pub const fn slot_capacity(self) -> usize {
        match self {
            Machine::K5000 => 128,
        }
    }

    /// Checksum family of the patch records.
    pub const fn checksum(self) -> Checksum {
        match self {
            Machine::K5000 => Checksum::Masked,
        }
    }

    /// Short name for display.
    pub const fn name(self) -> &'static str {
        match self {
            Machine::K5000 => "K5000",
        }
    }
}
