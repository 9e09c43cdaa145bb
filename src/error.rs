//! Error types for each decoding stage.
//!
//! Framing and header errors are fatal to the message they came from. Block
//! errors carry the index of the record that failed, so callers can report
//! how far the walk got before giving up.

use thiserror::Error;

/// Failure to recognise a buffer as a complete SysEx message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FramingError {
    /// Fewer bytes than the smallest well-formed message.
    #[error("SYSEX message too short: {len} bytes, need at least {needed}")]
    TooShort {
        /// Bytes available.
        len: usize,
        /// Bytes required.
        needed: usize,
    },

    /// The first byte is not 0xF0.
    #[error("missing SYSEX initiator: first byte is 0x{found:02X}")]
    MissingInitiator {
        /// The byte found instead.
        found: u8,
    },

    /// The last byte is not 0xF7.
    #[error("missing SYSEX terminator: last byte is 0x{found:02X}")]
    MissingTerminator {
        /// The byte found instead.
        found: u8,
    },
}

/// Failure to decode or build a [`ToneMap`](crate::ToneMap).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ToneMapError {
    /// Fewer bytes than the wire length for the capacity.
    #[error("tone map needs {needed} bytes, got {len}")]
    TooShort {
        /// Bytes available.
        len: usize,
        /// Wire length for the capacity.
        needed: usize,
    },

    /// A slot index at or past the capacity.
    #[error("slot {index} is outside a tone map of capacity {capacity}")]
    OutOfRange {
        /// The offending slot.
        index: usize,
        /// Slots in the map.
        capacity: usize,
    },
}

/// Failure to parse a dump header from a manufacturer payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum HeaderError {
    /// The payload ends before the header does.
    #[error("dump header too short: {len} bytes, need {needed}")]
    TooShort {
        /// Bytes available.
        len: usize,
        /// Bytes the header needs up to the point it ran out.
        needed: usize,
    },

    /// The function byte is not a dump.
    #[error("function 0x{0:02X} does not carry a dump header")]
    UnknownFunction(u8),

    /// The machine id is not in the machine table.
    #[error("unknown machine id 0x{0:02X}")]
    UnknownMachine(u8),

    /// substatus1 names neither singles nor multis.
    #[error("unknown patch kind (substatus1 0x{0:02X})")]
    UnknownKind(u8),
}

/// Failure while walking a block of patch records.
///
/// `E` is the error type of the content decoder and is passed through as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockError<E> {
    /// The payload ran out before `expected` records were read.
    #[error("patch block truncated at record {index} of {expected} ({remaining} bytes left)")]
    Truncated {
        /// Record that could not be read.
        index: usize,
        /// Records the block should hold.
        expected: usize,
        /// Bytes left when the walk stopped.
        remaining: usize,
    },

    /// The content decoder rejected record `index`.
    #[error("could not decode record {index}: {error}")]
    Decode {
        /// Record that failed.
        index: usize,
        /// The decoder's error.
        error: E,
    },

    /// Checksum mismatch under [`ChecksumPolicy::Abort`](crate::ChecksumPolicy::Abort).
    #[error("checksum mismatch in record {index}: stored 0x{stored:02X}, computed 0x{computed:02X}")]
    ChecksumMismatch {
        /// Record that failed.
        index: usize,
        /// Checksum byte on the wire.
        stored: u8,
        /// Checksum of the content.
        computed: u8,
    },
}
