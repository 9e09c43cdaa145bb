//! Patch record checksums.
//!
//! Every family sums the content bytes onto a fixed offset. They differ in
//! whether the result is then masked to seven bits.

use serde::Serialize;

/// Added to the byte sum before any masking.
pub const CHECKSUM_OFFSET: u8 = 0xA5;

/// Computes the checksum byte stored ahead of a patch record's content.
pub trait ChecksumStrategy {
    /// Checksum of `content`, checksum byte excluded.
    fn compute(&self, content: &[u8]) -> u8;
}

/// The checksum families used by the supported machines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Checksum {
    /// `(sum + 0xA5) mod 256`, then the high bit cleared.
    Masked,
    /// `(sum + 0xA5) mod 256`.
    Unmasked,
}

impl ChecksumStrategy for Checksum {
    fn compute(&self, content: &[u8]) -> u8 {
        let sum = byte_sum(CHECKSUM_OFFSET, content);
        match self {
            Checksum::Masked => sum & 0x7F,
            Checksum::Unmasked => sum,
        }
    }
}

/// Any function of the content works as a strategy.
impl<F> ChecksumStrategy for F
where
    F: Fn(&[u8]) -> u8,
{
    fn compute(&self, content: &[u8]) -> u8 {
        self(content)
    }
}

fn byte_sum(initial: u8, content: &[u8]) -> u8 {
    content
        .iter()
        .fold(initial, |sum, &byte| sum.wrapping_add(byte))
}
