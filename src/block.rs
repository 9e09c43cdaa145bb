//! Walking a block of concatenated patch records.
//!
//! Each record is a checksum byte followed by the patch content. Records are
//! not fixed-size and nothing on the wire says where one ends: the content
//! decoder reads the record and reports how many bytes it used, and the walk
//! continues from there.

use std::convert::Infallible;

use serde::Serialize;

use crate::checksum::ChecksumStrategy;
use crate::error::BlockError;

/// Decodes one patch from the front of a byte slice.
///
/// `data` runs to the end of the block, so it usually holds more than one
/// record. The decoder returns the patch and the number of content bytes it
/// belongs to (the checksum byte is not included).
pub trait PatchDecoder {
    /// The decoded patch.
    type Patch;
    /// Why a record could not be decoded.
    type Error;

    /// Decodes the record at the front of `data`.
    fn decode(&self, data: &[u8]) -> Result<(Self::Patch, usize), Self::Error>;
}

impl<F, P, E> PatchDecoder for F
where
    F: Fn(&[u8]) -> Result<(P, usize), E>,
{
    type Patch = P;
    type Error = E;

    fn decode(&self, data: &[u8]) -> Result<(P, usize), E> {
        self(data)
    }
}

/// Treats every record as `len` opaque content bytes.
///
/// Useful for machines whose patches have a fixed size, or to inspect a block
/// without decoding it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedLength(pub usize);

impl PatchDecoder for FixedLength {
    type Patch = ();
    type Error = Infallible;

    fn decode(&self, _data: &[u8]) -> Result<((), usize), Infallible> {
        Ok(((), self.0))
    }
}

/// What to do with a record whose stored checksum does not match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
pub enum ChecksumPolicy {
    /// Yield the record with `checksum_ok() == false`.
    #[default]
    Flag,
    /// Drop the record and carry on with the next one.
    Skip,
    /// Stop the walk with [`BlockError::ChecksumMismatch`].
    Abort,
}

/// Settings for a block walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockOptions {
    /// Handling of checksum mismatches.
    pub policy: ChecksumPolicy,
}

/// One decoded record of a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRecord<'a, P> {
    /// Position of the record within the block.
    pub index: usize,
    /// Patch slot the record was dumped from, when known.
    pub slot: Option<usize>,
    /// Checksum byte read from the wire.
    pub stored_checksum: u8,
    /// Checksum computed over `content`.
    pub computed_checksum: u8,
    /// The content bytes the decoder claimed, checksum byte excluded.
    pub content: &'a [u8],
    /// Whatever the decoder produced.
    pub patch: P,
}

impl<P> PatchRecord<'_, P> {
    /// Whether the stored and computed checksums agree.
    pub fn checksum_ok(&self) -> bool {
        self.stored_checksum == self.computed_checksum
    }
}

/// Iterator over the records of a block.
///
/// Yields at most `expected` records. After an error it yields nothing more.
pub struct PatchBlock<'a, D, S> {
    data: &'a [u8],
    offset: usize,
    index: usize,
    expected: usize,
    decoder: D,
    checksum: S,
    options: BlockOptions,
    slots: Vec<usize>,
    done: bool,
}

impl<'a, D, S> PatchBlock<'a, D, S>
where
    D: PatchDecoder,
    S: ChecksumStrategy,
{
    /// Walks `expected` records from the start of `data`.
    pub fn new(data: &'a [u8], expected: usize, decoder: D, checksum: S) -> Self {
        Self {
            data,
            offset: 0,
            index: 0,
            expected,
            decoder,
            checksum,
            options: BlockOptions::default(),
            slots: Vec::new(),
            done: false,
        }
    }

    /// Replaces the default options.
    pub fn with_options(mut self, options: BlockOptions) -> Self {
        self.options = options;
        self
    }

    /// Slot numbers to attach to the records, in record order.
    pub fn with_slots(mut self, slots: Vec<usize>) -> Self {
        self.slots = slots;
        self
    }

    /// Bytes not consumed so far.
    pub fn remaining(&self) -> &'a [u8] {
        &self.data[self.offset..]
    }

    /// Bytes consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }

    #[allow(clippy::type_complexity)]
    fn fail(
        &mut self,
        error: BlockError<D::Error>,
    ) -> Option<Result<PatchRecord<'a, D::Patch>, BlockError<D::Error>>> {
        self.done = true;
        Some(Err(error))
    }
}

impl<'a, D, S> Iterator for PatchBlock<'a, D, S>
where
    D: PatchDecoder,
    S: ChecksumStrategy,
{
    type Item = Result<PatchRecord<'a, D::Patch>, BlockError<D::Error>>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.done && self.index < self.expected {
            let index = self.index;
            let rest = self.remaining();

            let Some((&stored_checksum, data)) = rest.split_first() else {
                return self.fail(BlockError::Truncated {
                    index,
                    expected: self.expected,
                    remaining: 0,
                });
            };

            let (patch, consumed) = match self.decoder.decode(data) {
                Ok(decoded) => decoded,
                Err(error) => return self.fail(BlockError::Decode { index, error }),
            };
            let Some(content) = data.get(..consumed) else {
                return self.fail(BlockError::Truncated {
                    index,
                    expected: self.expected,
                    remaining: rest.len(),
                });
            };

            self.offset += 1 + consumed;
            self.index += 1;

            let record = PatchRecord {
                index,
                slot: self.slots.get(index).copied(),
                stored_checksum,
                computed_checksum: self.checksum.compute(content),
                content,
                patch,
            };
            log::trace!(
                "BLOCK: record {} at offset {}, {} content bytes",
                index,
                self.offset - consumed - 1,
                consumed
            );

            if !record.checksum_ok() {
                log::warn!(
                    "BLOCK: checksum mismatch in record {}: stored 0x{:02X}, computed 0x{:02X}",
                    index,
                    record.stored_checksum,
                    record.computed_checksum
                );
                match self.options.policy {
                    ChecksumPolicy::Flag => {}
                    ChecksumPolicy::Skip => continue,
                    ChecksumPolicy::Abort => {
                        return self.fail(BlockError::ChecksumMismatch {
                            index,
                            stored: record.stored_checksum,
                            computed: record.computed_checksum,
                        });
                    }
                }
            }

            if self.index == self.expected {
                log::debug!(
                    "BLOCK: read {} records, {} bytes left over",
                    self.expected,
                    self.data.len() - self.offset
                );
            }

            return Some(Ok(record));
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.done {
            (0, Some(0))
        } else {
            (0, Some(self.expected - self.index))
        }
    }
}

impl<D, S> std::iter::FusedIterator for PatchBlock<'_, D, S>
where
    D: PatchDecoder,
    S: ChecksumStrategy,
{
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checksum::Checksum;

    /// Length-prefixed test records: content is `[n, n bytes...]`.
    fn length_prefixed(data: &[u8]) -> Result<(Vec<u8>, usize), &'static str> {
        let (&len, body) = data.split_first().ok_or("empty")?;
        let body = body.get(..usize::from(len)).ok_or("short")?;
        Ok((body.to_vec(), 1 + usize::from(len)))
    }

    fn record(content: &[u8], checksum: Checksum) -> Vec<u8> {
        let mut out = vec![checksum.compute(content)];
        out.extend_from_slice(content);
        out
    }

    fn block(contents: &[&[u8]]) -> Vec<u8> {
        contents
            .iter()
            .flat_map(|content| record(content, Checksum::Masked))
            .collect()
    }

    #[test]
    fn test_variable_length_records() {
        let data = block(&[&[2, 0xAA, 0xBB], &[0], &[3, 1, 2, 3]]);
        let mut records = PatchBlock::new(&data, 3, length_prefixed, Checksum::Masked);

        let first = records.next().unwrap().unwrap();
        assert_eq!(first.index, 0);
        assert_eq!(first.patch, vec![0xAA, 0xBB]);
        assert_eq!(first.content, &[2, 0xAA, 0xBB]);
        assert!(first.checksum_ok());

        let second = records.next().unwrap().unwrap();
        assert_eq!(second.patch, Vec::<u8>::new());

        let third = records.next().unwrap().unwrap();
        assert_eq!(third.patch, vec![1, 2, 3]);

        assert!(records.next().is_none());
        assert!(records.remaining().is_empty());
        assert_eq!(records.offset(), data.len());
    }

    #[test]
    fn test_stops_at_expected_count() {
        let data = block(&[&[1, 9], &[1, 8], &[1, 7]]);
        let mut records = PatchBlock::new(&data, 2, length_prefixed, Checksum::Masked);
        assert_eq!(records.by_ref().count(), 2);
        assert_eq!(records.remaining().len(), 3);
    }

    #[test]
    fn test_zero_expected() {
        let mut records = PatchBlock::new(&[], 0, FixedLength(4), Checksum::Masked);
        assert!(records.next().is_none());
    }

    #[test]
    fn test_truncated_without_checksum_byte() {
        let data = block(&[&[1, 9]]);
        let results: Vec<_> = PatchBlock::new(&data, 2, length_prefixed, Checksum::Masked).collect();
        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert_eq!(
            results[1],
            Err(BlockError::Truncated {
                index: 1,
                expected: 2,
                remaining: 0
            })
        );
    }

    #[test]
    fn test_truncated_content() {
        let mut data = block(&[&[0x10; 8], &[0x20; 8]]);
        data.pop();
        let results: Vec<_> = PatchBlock::new(&data, 2, FixedLength(8), Checksum::Masked).collect();
        assert!(results[0].is_ok());
        assert_eq!(
            results[1],
            Err(BlockError::Truncated {
                index: 1,
                expected: 2,
                remaining: 8
            })
        );
    }

    #[test]
    fn test_decode_error_is_passed_through() {
        let data = block(&[&[1, 9], &[5, 1]]);
        let results: Vec<_> = PatchBlock::new(&data, 3, length_prefixed, Checksum::Masked).collect();
        assert_eq!(results.len(), 2);
        assert_eq!(results[1], Err(BlockError::Decode { index: 1, error: "short" }));
    }

    fn corrupt_second(contents: &[&[u8]]) -> Vec<u8> {
        let mut data = block(contents);
        let second = 1 + contents[0].len();
        data[second] ^= 0x01;
        data
    }

    #[test]
    fn test_checksum_policy_flag() {
        let data = corrupt_second(&[&[1, 1], &[1, 2], &[1, 3]]);
        let records: Vec<_> = PatchBlock::new(&data, 3, length_prefixed, Checksum::Masked)
            .map(Result::unwrap)
            .collect();
        let ok: Vec<_> = records.iter().map(PatchRecord::checksum_ok).collect();
        assert_eq!(ok, vec![true, false, true]);
    }

    #[test]
    fn test_checksum_policy_skip() {
        let data = corrupt_second(&[&[1, 1], &[1, 2], &[1, 3]]);
        let options = BlockOptions {
            policy: ChecksumPolicy::Skip,
        };
        let indices: Vec<_> = PatchBlock::new(&data, 3, length_prefixed, Checksum::Masked)
            .with_options(options)
            .map(|record| record.unwrap().index)
            .collect();
        assert_eq!(indices, vec![0, 2]);
    }

    #[test]
    fn test_checksum_policy_abort() {
        let data = corrupt_second(&[&[1, 1], &[1, 2], &[1, 3]]);
        let options = BlockOptions {
            policy: ChecksumPolicy::Abort,
        };
        let stored = data[3];
        let results: Vec<_> = PatchBlock::new(&data, 3, length_prefixed, Checksum::Masked)
            .with_options(options)
            .collect();
        assert_eq!(results.len(), 2);
        assert_eq!(
            results[1],
            Err(BlockError::ChecksumMismatch {
                index: 1,
                stored,
                computed: stored ^ 0x01,
            })
        );
    }

    #[test]
    fn test_slots_are_attached() {
        let data = block(&[&[0xAA; 4], &[0xBB; 4]]);
        let slots: Vec<_> = PatchBlock::new(&data, 2, FixedLength(4), Checksum::Masked)
            .with_slots(vec![12, 99])
            .map(|record| record.unwrap().slot)
            .collect();
        assert_eq!(slots, vec![Some(12), Some(99)]);
    }

    #[test]
    fn test_strategy_is_caller_chosen() {
        let content = [0x10; 4];
        let mut data = vec![Checksum::Unmasked.compute(&content)];
        data.extend_from_slice(&content);

        let unmasked = PatchBlock::new(&data, 1, FixedLength(4), Checksum::Unmasked)
            .next()
            .unwrap()
            .unwrap();
        assert!(unmasked.checksum_ok());

        // 0xA5 + 0x40 = 0xE5, which masking changes.
        let masked = PatchBlock::new(&data, 1, FixedLength(4), Checksum::Masked)
            .next()
            .unwrap()
            .unwrap();
        assert!(!masked.checksum_ok());
    }
}
