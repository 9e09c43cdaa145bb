//! Tone maps: which patch slots a block dump contains.
//!
//! On the wire a tone map is `ceil(capacity / 7)` bytes. Each byte carries
//! seven slots in its low bits, least significant bit first, and the high bit
//! is always zero. Bits past `capacity` in the last byte are padding.

use serde::Serialize;

use crate::error::ToneMapError;

/// Data bits per wire byte.
const BITS_PER_BYTE: usize = 7;

/// A fixed-capacity set of selected patch slots.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct ToneMap {
    slots: Vec<bool>,
}

impl ToneMap {
    /// An empty selection over `capacity` slots.
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![false; capacity],
        }
    }

    /// A selection with every slot in `0..capacity` set.
    pub fn full(capacity: usize) -> Self {
        Self {
            slots: vec![true; capacity],
        }
    }

    /// Builds a selection from slot indices.
    pub fn with_selected<I>(capacity: usize, selected: I) -> Result<Self, ToneMapError>
    where
        I: IntoIterator<Item = usize>,
    {
        let mut map = Self::new(capacity);
        for index in selected {
            map.set(index, true)?;
        }
        Ok(map)
    }

    /// Number of wire bytes for a tone map of `capacity` slots.
    pub const fn wire_len(capacity: usize) -> usize {
        (capacity + BITS_PER_BYTE - 1) / BITS_PER_BYTE
    }

    /// Decodes the first `wire_len(capacity)` bytes of `data`.
    ///
    /// High bits and padding bits past `capacity` are ignored.
    pub fn decode(data: &[u8], capacity: usize) -> Result<Self, ToneMapError> {
        let needed = Self::wire_len(capacity);
        let Some(bytes) = data.get(..needed) else {
            return Err(ToneMapError::TooShort {
                len: data.len(),
                needed,
            });
        };

        let slots = (0..capacity)
            .map(|index| {
                let byte = bytes[index / BITS_PER_BYTE];
                (byte >> (index % BITS_PER_BYTE)) & 1 == 1
            })
            .collect();

        Ok(Self { slots })
    }

    /// Appends the wire form, always `wire_len(capacity)` bytes.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        for chunk in self.slots.chunks(BITS_PER_BYTE) {
            let byte = chunk
                .iter()
                .enumerate()
                .filter(|&(_, &selected)| selected)
                .fold(0u8, |byte, (bit, _)| byte | (1 << bit));
            out.push(byte);
        }
    }

    /// The wire form as a new buffer.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::wire_len(self.capacity()));
        self.write_to(&mut out);
        out
    }

    /// Number of addressable slots, selected or not.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of selected slots.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|&&selected| selected).count()
    }

    /// Whether no slot is selected.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Whether `index` is selected. Out-of-range indices are never selected.
    pub fn is_selected(&self, index: usize) -> bool {
        self.slots.get(index).copied().unwrap_or(false)
    }

    /// Selects or clears one slot.
    pub fn set(&mut self, index: usize, selected: bool) -> Result<(), ToneMapError> {
        let capacity = self.capacity();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(ToneMapError::OutOfRange { index, capacity })?;
        *slot = selected;
        Ok(())
    }

    /// Selected slot indices in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(index, &selected)| selected.then_some(index))
    }
}

impl<'a> IntoIterator for &'a ToneMap {
    type Item = usize;
    type IntoIter = Box<dyn Iterator<Item = usize> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
