#![allow(dead_code)]

use ksyx::{Checksum, ChecksumStrategy, ToneMap};

/// Bytes before the per-source data: 8 name bytes, then the source count.
pub const COMMON_SIZE: usize = 9;

/// Bytes per tone source.
pub const SOURCE_SIZE: usize = 6;

/// A stand-in for a K5000 single: a name and a variable number of sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestPatch {
    pub name: String,
    pub sources: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestDecodeError {
    ShortCommon(usize),
    BadSourceCount(u8),
}

/// Reads the common block to learn the record length. The source data
/// itself is not touched, so a short record is only noticed by the block
/// walker.
pub fn decode_test_patch(data: &[u8]) -> Result<(TestPatch, usize), TestDecodeError> {
    let common = data
        .get(..COMMON_SIZE)
        .ok_or(TestDecodeError::ShortCommon(data.len()))?;
    let name = String::from_utf8_lossy(&common[..8]).trim_end().to_string();
    let sources = common[8];
    if !(2..=6).contains(&sources) {
        return Err(TestDecodeError::BadSourceCount(sources));
    }
    let sources = usize::from(sources);
    Ok((TestPatch { name, sources }, COMMON_SIZE + sources * SOURCE_SIZE))
}

/// Content bytes of a test patch.
pub fn test_patch_content(name: &str, sources: u8) -> Vec<u8> {
    let mut content = format!("{:8}", name).into_bytes();
    content.truncate(8);
    content.push(sources);
    for source in 0..sources {
        content.extend_from_slice(&[source, 0x10, 0x20, 0x30, 0x40, 0x7F]);
    }
    content
}

/// A checksummed record: checksum byte then content.
pub fn test_record(content: &[u8], checksum: Checksum) -> Vec<u8> {
    let mut record = vec![checksum.compute(content)];
    record.extend_from_slice(content);
    record
}

/// A complete K5000 "all singles" block dump holding `patches` at `slots`.
pub fn k5000_block_dump(slots: &[usize], patches: &[(&str, u8)]) -> Vec<u8> {
    assert_eq!(slots.len(), patches.len());

    let mut data = vec![0xF0, 0x40, 0x00, 0x21, 0x00, 0x0A, 0x00, 0x00];
    let tone_map = ToneMap::with_selected(128, slots.iter().copied()).unwrap();
    data.extend(tone_map.encode());
    for (name, sources) in patches {
        data.extend(test_record(&test_patch_content(name, *sources), Checksum::Masked));
    }
    data.push(0xF7);
    data
}
