//! Kawai SYSEX codec.
//!
//! Frames raw SYSEX buffers, identifies the manufacturer, parses the dump
//! header and tone map of Kawai patch dumps, and walks blocks of patch
//! records with checksum verification. Decoding what a patch *means* is left
//! to a [`PatchDecoder`] supplied by the caller.
//!
//! ```
//! use ksyx::{decode_dump, BlockOptions, FixedLength};
//!
//! // A one-patch K5000 single dump with a four-byte patch.
//! let content = [0x01, 0x02, 0x03, 0x04];
//! let checksum = ksyx::Machine::K5000.checksum();
//! let mut data = vec![0xF0, 0x40, 0x00, 0x20, 0x00, 0x0A, 0x00, 0x00, 0x05];
//! data.push(ksyx::ChecksumStrategy::compute(&checksum, &content));
//! data.extend_from_slice(&content);
//! data.push(0xF7);
//!
//! let dump = decode_dump(&data).unwrap();
//! let record = dump
//!     .records(FixedLength(4), checksum, BlockOptions::default())
//!     .next()
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(record.slot, Some(5));
//! assert!(record.checksum_ok());
//! ```

#![warn(missing_docs)]

pub mod block;
pub mod checksum;
pub mod dump;
pub mod error;
pub mod machine;
pub mod manufacturer;
pub mod sysex;
pub mod tone_map;

use anyhow::{anyhow, Context, Result};

pub use block::{BlockOptions, ChecksumPolicy, FixedLength, PatchBlock, PatchDecoder, PatchRecord};
pub use checksum::{Checksum, ChecksumStrategy};
pub use dump::{Cardinality, Dump, DumpHeader, DumpRequest, Function, PatchKind};
pub use error::{BlockError, FramingError, HeaderError, ToneMapError};
pub use machine::Machine;
pub use manufacturer::{ManufacturerDescriptor, ManufacturerGroup, ManufacturerKind};
pub use sysex::{ManufacturerSpecificMessage, Message, UniversalMessage};
pub use tone_map::ToneMap;

/// Frames `data` and parses it as a Kawai dump for a known machine.
pub fn decode_dump(data: &[u8]) -> Result<Dump<'_>> {
    let message = Message::parse(data).context("Invalid SYSEX framing")?;

    let Message::ManufacturerSpecific(message) = message else {
        return Err(anyhow!("Universal SYSEX message, not a Kawai dump"));
    };
    if message.identifier != [manufacturer::ID_KAWAI].as_slice() {
        return Err(anyhow!(
            "Not a Kawai SYSEX message (manufacturer {})",
            message.manufacturer.name
        ));
    }

    Dump::parse_for_machine(message.payload).context("Invalid dump header")
}

/// Reads a `.syx` file and returns each complete message in it.
///
/// Unterminated fragments are logged and dropped.
pub fn read_sysex_file(filename: &str) -> Result<Vec<Vec<u8>>> {
    let data = std::fs::read(filename)
        .with_context(|| format!("Failed to read SYSEX file '{}'", filename))?;

    let mut messages = Vec::new();
    for span in sysex::split(&data) {
        match span {
            Ok(message) => messages.push(message.to_vec()),
            Err(error) => log::warn!("SYSEX: skipping fragment in '{}': {}", filename, error),
        }
    }

    if messages.is_empty() {
        return Err(anyhow!("No SYSEX messages found in '{}'", filename));
    }

    Ok(messages)
}
