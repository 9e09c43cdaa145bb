//! Dump headers at the start of a Kawai manufacturer payload.
//!
//! Layout after the manufacturer ID:
//!
//! ```text
//! channel | function | group | machine | substatus1 | [substatus2] | tone map or instrument
//! ```
//!
//! `substatus2` (the bank) is only sent for single-voice dumps. A block dump
//! follows the fixed part with a tone map; a one-patch dump with a single
//! instrument number byte.

use serde::Serialize;

use crate::block::{BlockOptions, PatchBlock, PatchDecoder};
use crate::checksum::ChecksumStrategy;
use crate::error::HeaderError;
use crate::machine::Machine;
use crate::manufacturer::ID_KAWAI;
use crate::sysex::{SYSEX_END, SYSEX_START};
use crate::tone_map::ToneMap;

/// Group byte used by all synthesizer dumps.
pub const GROUP_SYNTHESIZER: u8 = 0x00;

/// substatus1 of single-voice dumps.
pub const SUBSTATUS1_SINGLE: u8 = 0x00;
/// substatus1 of multi (combination) dumps.
pub const SUBSTATUS1_MULTI: u8 = 0x20;

/// channel, function, group, machine, substatus1
const FIXED_LEN: usize = 5;

/// Function codes. A block variant is always its one-patch variant plus one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Function {
    /// 0x00: ask for one patch.
    OneBlockDataRequest,
    /// 0x01: ask for a whole bank.
    AllBlockDataRequest,
    /// 0x20: one patch.
    OneBlockDump,
    /// 0x21: a bank, with a tone map.
    AllBlockDump,
    /// 0x40
    WriteComplete,
    /// 0x41
    WriteError,
    /// 0x42: memory protected.
    WriteErrorProtect,
    /// 0x43: no card inserted.
    WriteErrorNoCard,
}

impl Function {
    const ALL: [Function; 8] = [
        Function::OneBlockDataRequest,
        Function::AllBlockDataRequest,
        Function::OneBlockDump,
        Function::AllBlockDump,
        Function::WriteComplete,
        Function::WriteError,
        Function::WriteErrorProtect,
        Function::WriteErrorNoCard,
    ];

    /// Looks up a function byte.
    pub fn from_code(code: u8) -> Option<Function> {
        Self::ALL.into_iter().find(|function| function.code() == code)
    }

    /// The function byte on the wire.
    pub const fn code(self) -> u8 {
        match self {
            Function::OneBlockDataRequest => 0x00,
            Function::AllBlockDataRequest => 0x01,
            Function::OneBlockDump => 0x20,
            Function::AllBlockDump => 0x21,
            Function::WriteComplete => 0x40,
            Function::WriteError => 0x41,
            Function::WriteErrorProtect => 0x42,
            Function::WriteErrorNoCard => 0x43,
        }
    }

    /// One patch or a block, for requests and dumps. `None` for the write
    /// acknowledgements.
    pub const fn cardinality(self) -> Option<Cardinality> {
        match self {
            Function::OneBlockDataRequest | Function::OneBlockDump => Some(Cardinality::One),
            Function::AllBlockDataRequest | Function::AllBlockDump => Some(Cardinality::Block),
            _ => None,
        }
    }

    /// Whether a dump header follows.
    pub const fn is_dump(self) -> bool {
        matches!(self, Function::OneBlockDump | Function::AllBlockDump)
    }

    const fn request(cardinality: Cardinality) -> Function {
        match cardinality {
            Cardinality::One => Function::OneBlockDataRequest,
            Cardinality::Block => Function::AllBlockDataRequest,
        }
    }

    const fn dump(cardinality: Cardinality) -> Function {
        match cardinality {
            Cardinality::One => Function::OneBlockDump,
            Cardinality::Block => Function::AllBlockDump,
        }
    }
}

/// How many patches a request or dump covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Cardinality {
    /// A single patch, named by its instrument number.
    One,
    /// The patches selected by a tone map.
    Block,
}

/// What sort of patch a dump carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum PatchKind {
    /// Single-voice patches.
    Single,
    /// Multi (combination) patches.
    Multi,
}

impl PatchKind {
    /// Kind named by a substatus1 byte.
    pub fn from_substatus1(substatus1: u8) -> Option<PatchKind> {
        match substatus1 {
            SUBSTATUS1_SINGLE => Some(PatchKind::Single),
            SUBSTATUS1_MULTI => Some(PatchKind::Multi),
            _ => None,
        }
    }

    /// The substatus1 byte for this kind.
    pub const fn substatus1(self) -> u8 {
        match self {
            PatchKind::Single => SUBSTATUS1_SINGLE,
            PatchKind::Multi => SUBSTATUS1_MULTI,
        }
    }

    /// Whether the header carries a bank byte after substatus1.
    pub const fn has_substatus2(self) -> bool {
        matches!(self, PatchKind::Single)
    }
}

/// A parsed dump header.
///
/// Exactly one of `tone_map` and `instrument_number` is set, according to
/// `cardinality`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DumpHeader {
    /// MIDI channel, 0-based.
    pub channel: u8,
    /// A dump function, never a request or acknowledgement.
    pub function: Function,
    /// Always [`GROUP_SYNTHESIZER`] in practice.
    pub group: u8,
    /// See [`Machine::from_id`].
    pub machine_id: u8,
    /// Selects the patch kind.
    pub substatus1: u8,
    /// Bank byte, single-voice dumps only.
    pub substatus2: Option<u8>,
    /// Follows from `function`.
    pub cardinality: Cardinality,
    /// Follows from `substatus1`.
    pub kind: PatchKind,
    /// Set for block dumps.
    pub tone_map: Option<ToneMap>,
    /// Set for one-patch dumps.
    pub instrument_number: Option<u8>,
}

impl DumpHeader {
    /// Parses a header whose tone map (if any) addresses `slot_capacity`
    /// slots.
    pub fn parse(payload: &[u8], slot_capacity: usize) -> Result<DumpHeader, HeaderError> {
        let too_short = |needed| HeaderError::TooShort {
            len: payload.len(),
            needed,
        };

        let &[channel, function_code, group, machine_id, substatus1, ref rest @ ..] = payload else {
            return Err(too_short(FIXED_LEN));
        };

        let function = Function::from_code(function_code)
            .filter(|function| function.is_dump())
            .ok_or(HeaderError::UnknownFunction(function_code))?;
        let cardinality = function
            .cardinality()
            .ok_or(HeaderError::UnknownFunction(function_code))?;
        let kind = PatchKind::from_substatus1(substatus1).ok_or(HeaderError::UnknownKind(substatus1))?;

        let (substatus2, rest) = if kind.has_substatus2() {
            match rest {
                [substatus2, rest @ ..] => (Some(*substatus2), rest),
                [] => return Err(too_short(FIXED_LEN + 1)),
            }
        } else {
            (None, rest)
        };
        let consumed = payload.len() - rest.len();

        let (tone_map, instrument_number) = match cardinality {
            Cardinality::Block => {
                let tone_map = ToneMap::decode(rest, slot_capacity)
                    .map_err(|_| too_short(consumed + ToneMap::wire_len(slot_capacity)))?;
                (Some(tone_map), None)
            }
            Cardinality::One => match rest.first() {
                Some(&instrument_number) => (None, Some(instrument_number)),
                None => return Err(too_short(consumed + 1)),
            },
        };

        let header = DumpHeader {
            channel,
            function,
            group,
            machine_id,
            substatus1,
            substatus2,
            cardinality,
            kind,
            tone_map,
            instrument_number,
        };

        log::debug!(
            "DUMP: {:?} {:?} dump for machine 0x{:02X}, {} patches, header {} bytes",
            header.cardinality,
            header.kind,
            header.machine_id,
            header.patch_count(),
            header.data_length()
        );

        Ok(header)
    }

    /// Parses a header, taking the tone map capacity from the machine id.
    pub fn parse_for_machine(payload: &[u8]) -> Result<DumpHeader, HeaderError> {
        let machine_id = *payload.get(3).ok_or(HeaderError::TooShort {
            len: payload.len(),
            needed: FIXED_LEN,
        })?;
        let machine = Machine::from_id(machine_id).ok_or(HeaderError::UnknownMachine(machine_id))?;
        Self::parse(payload, machine.slot_capacity())
    }

    /// Bytes taken by the header, tone map included. Patch data starts here.
    pub fn data_length(&self) -> usize {
        let substatus2 = usize::from(self.substatus2.is_some());
        let selection = match &self.tone_map {
            Some(tone_map) => ToneMap::wire_len(tone_map.capacity()),
            None => 1,
        };
        FIXED_LEN + substatus2 + selection
    }

    /// Number of patch records that follow the header.
    pub fn patch_count(&self) -> usize {
        match &self.tone_map {
            Some(tone_map) => tone_map.count(),
            None => 1,
        }
    }

    /// The machine named by `machine_id`, if known.
    pub fn machine(&self) -> Option<Machine> {
        Machine::from_id(self.machine_id)
    }

    /// Appends the wire form; inverse of [`parse`](Self::parse).
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.extend_from_slice(&[
            self.channel,
            self.function.code(),
            self.group,
            self.machine_id,
            self.substatus1,
        ]);
        out.extend(self.substatus2);
        match (&self.tone_map, self.instrument_number) {
            (Some(tone_map), _) => tone_map.write_to(out),
            (None, Some(instrument_number)) => out.push(instrument_number),
            (None, None) => {}
        }
    }

    /// The wire form as a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.data_length());
        self.write_to(&mut out);
        out
    }
}

/// A dump header together with the patch data that follows it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dump<'a> {
    /// The parsed header.
    pub header: DumpHeader,
    /// Everything after the header.
    pub patch_data: &'a [u8],
}

impl<'a> Dump<'a> {
    /// Splits a manufacturer payload into header and patch data.
    pub fn parse(payload: &'a [u8], slot_capacity: usize) -> Result<Dump<'a>, HeaderError> {
        let header = DumpHeader::parse(payload, slot_capacity)?;
        Ok(Self::from_header(header, payload))
    }

    /// Like [`parse`](Self::parse), with the capacity from the machine table.
    pub fn parse_for_machine(payload: &'a [u8]) -> Result<Dump<'a>, HeaderError> {
        let header = DumpHeader::parse_for_machine(payload)?;
        Ok(Self::from_header(header, payload))
    }

    fn from_header(header: DumpHeader, payload: &'a [u8]) -> Dump<'a> {
        let patch_data = &payload[header.data_length()..];
        Dump { header, patch_data }
    }

    /// Walks the patch records, labelling each with its slot number.
    pub fn records<D, S>(&self, decoder: D, checksum: S, options: BlockOptions) -> PatchBlock<'a, D, S>
    where
        D: PatchDecoder,
        S: ChecksumStrategy,
    {
        let slots = match (&self.header.tone_map, self.header.instrument_number) {
            (Some(tone_map), _) => tone_map.iter().collect(),
            (None, Some(instrument_number)) => vec![usize::from(instrument_number)],
            (None, None) => Vec::new(),
        };
        PatchBlock::new(self.patch_data, self.header.patch_count(), decoder, checksum)
            .with_options(options)
            .with_slots(slots)
    }
}

/// A request asking the instrument to send a dump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DumpRequest {
    /// MIDI channel, 0-based.
    pub channel: u8,
    /// One patch or the whole bank.
    pub cardinality: Cardinality,
    /// Singles or multis.
    pub kind: PatchKind,
    /// Target machine.
    pub machine: Machine,
    /// Bank byte, only sent for single-voice requests.
    pub bank: u8,
    /// Only sent for one-patch requests.
    pub instrument_number: u8,
}

impl DumpRequest {
    /// The complete request message, F0 and F7 included.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = vec![
            SYSEX_START,
            ID_KAWAI,
            self.channel,
            Function::request(self.cardinality).code(),
            GROUP_SYNTHESIZER,
            self.machine.id(),
            self.kind.substatus1(),
        ];
        if self.kind.has_substatus2() {
            out.push(self.bank);
        }
        if self.cardinality == Cardinality::One {
            out.push(self.instrument_number);
        }
        out.push(SYSEX_END);
        out
    }

    /// The function code of the dump this request should be answered with.
    pub fn expected_reply(&self) -> Function {
        Function::dump(self.cardinality)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const K5000_SLOTS: usize = 128;

    #[test]
    fn test_one_single() {
        let payload = [0x00, 0x20, 0x00, 0x0A, 0x00, 0x00, 0x00];
        let header = DumpHeader::parse(&payload, K5000_SLOTS).unwrap();
        assert_eq!(header.cardinality, Cardinality::One);
        assert_eq!(header.kind, PatchKind::Single);
        assert_eq!(header.function, Function::OneBlockDump);
        assert_eq!(header.machine_id, 0x0A);
        assert_eq!(header.substatus2, Some(0x00));
        assert_eq!(header.instrument_number, Some(0x00));
        assert_eq!(header.tone_map, None);
        assert_eq!(header.data_length(), 7);
        assert_eq!(header.patch_count(), 1);
    }

    #[test]
    fn test_block_single_empty_tone_map() {
        let mut payload = vec![0x00, 0x21, 0x00, 0x0A, 0x00, 0x00];
        payload.extend_from_slice(&[0x00; 19]);
        let header = DumpHeader::parse(&payload, K5000_SLOTS).unwrap();
        assert_eq!(header.cardinality, Cardinality::Block);
        assert_eq!(header.instrument_number, None);
        let tone_map = header.tone_map.as_ref().unwrap();
        assert_eq!(tone_map.count(), 0);
        assert_eq!(tone_map.capacity(), 128);
        assert_eq!(header.data_length(), 25);
    }

    #[test]
    fn test_one_multi_has_no_bank() {
        let payload = [0x03, 0x20, 0x00, 0x0A, 0x20, 0x05];
        let header = DumpHeader::parse(&payload, K5000_SLOTS).unwrap();
        assert_eq!(header.kind, PatchKind::Multi);
        assert_eq!(header.channel, 0x03);
        assert_eq!(header.substatus2, None);
        assert_eq!(header.instrument_number, Some(0x05));
        assert_eq!(header.data_length(), 6);
    }

    #[test]
    fn test_too_short() {
        assert_eq!(
            DumpHeader::parse(&[0x00, 0x20, 0x00], K5000_SLOTS),
            Err(HeaderError::TooShort { len: 3, needed: 5 })
        );
        assert_eq!(
            DumpHeader::parse(&[0x00, 0x20, 0x00, 0x0A, 0x00], K5000_SLOTS),
            Err(HeaderError::TooShort { len: 5, needed: 6 })
        );
        assert_eq!(
            DumpHeader::parse(&[0x00, 0x20, 0x00, 0x0A, 0x00, 0x00], K5000_SLOTS),
            Err(HeaderError::TooShort { len: 6, needed: 7 })
        );
        let mut block = vec![0x00, 0x21, 0x00, 0x0A, 0x00, 0x00];
        block.extend_from_slice(&[0x00; 18]);
        assert_eq!(
            DumpHeader::parse(&block, K5000_SLOTS),
            Err(HeaderError::TooShort { len: 24, needed: 25 })
        );
    }

    #[test]
    fn test_unknown_function() {
        // A request is a valid function but carries no dump header.
        assert_eq!(
            DumpHeader::parse(&[0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x00], K5000_SLOTS),
            Err(HeaderError::UnknownFunction(0x00))
        );
        assert_eq!(
            DumpHeader::parse(&[0x00, 0x33, 0x00, 0x0A, 0x00, 0x00, 0x00], K5000_SLOTS),
            Err(HeaderError::UnknownFunction(0x33))
        );
    }

    #[test]
    fn test_unknown_kind() {
        assert_eq!(
            DumpHeader::parse(&[0x00, 0x20, 0x00, 0x0A, 0x10, 0x00, 0x00], K5000_SLOTS),
            Err(HeaderError::UnknownKind(0x10))
        );
    }

    #[test]
    fn test_parse_for_machine() {
        let mut payload = vec![0x00, 0x21, 0x00, 0x0A, 0x00, 0x00];
        payload.extend_from_slice(&[0x7F; 19]);
        let header = DumpHeader::parse_for_machine(&payload).unwrap();
        assert_eq!(header.machine(), Some(Machine::K5000));
        assert_eq!(header.patch_count(), 128);

        // An explicit capacity overrides the machine table.
        let mut small = vec![0x00, 0x21, 0x00, 0x04, 0x00, 0x00];
        small.extend_from_slice(&[0x7F; 10]);
        let header = DumpHeader::parse(&small, 64).unwrap();
        assert_eq!(header.machine(), None);
        assert_eq!(header.patch_count(), 64);
        assert_eq!(header.data_length(), 16);
        assert_eq!(
            DumpHeader::parse_for_machine(&small),
            Err(HeaderError::UnknownMachine(0x04))
        );

        assert_eq!(
            DumpHeader::parse_for_machine(&[0x00, 0x21, 0x00, 0x7F, 0x00, 0x00]),
            Err(HeaderError::UnknownMachine(0x7F))
        );
    }

    #[test]
    fn test_header_round_trip() {
        let mut payload = vec![0x00, 0x21, 0x00, 0x0A, 0x00, 0x01];
        let tone_map = ToneMap::with_selected(128, [0, 5, 100]).unwrap();
        payload.extend(tone_map.encode());
        let header = DumpHeader::parse(&payload, K5000_SLOTS).unwrap();
        assert_eq!(header.to_bytes(), payload);

        let one = [0x02, 0x20, 0x00, 0x0A, 0x20, 0x3F];
        let header = DumpHeader::parse(&one, K5000_SLOTS).unwrap();
        assert_eq!(header.to_bytes(), one);
    }

    #[test]
    fn test_dump_splits_patch_data() {
        let payload = [0x00, 0x20, 0x00, 0x0A, 0x00, 0x00, 0x07, 0x11, 0x22];
        let dump = Dump::parse(&payload, K5000_SLOTS).unwrap();
        assert_eq!(dump.patch_data, &[0x11, 0x22]);
    }

    #[test]
    fn test_function_codes() {
        for function in Function::ALL {
            assert_eq!(Function::from_code(function.code()), Some(function));
        }
        // Block codes sit one above their one-patch codes.
        assert_eq!(Function::AllBlockDump.code(), Function::OneBlockDump.code() + 1);
        assert_eq!(
            Function::AllBlockDataRequest.code(),
            Function::OneBlockDataRequest.code() + 1
        );
        assert_eq!(Function::WriteComplete.cardinality(), None);
    }

    #[test]
    fn test_dump_request() {
        let one_single = DumpRequest {
            channel: 0,
            cardinality: Cardinality::One,
            kind: PatchKind::Single,
            machine: Machine::K5000,
            bank: 0x00,
            instrument_number: 0x10,
        };
        assert_eq!(
            one_single.to_bytes(),
            vec![0xF0, 0x40, 0x00, 0x00, 0x00, 0x0A, 0x00, 0x00, 0x10, 0xF7]
        );
        assert_eq!(one_single.expected_reply(), Function::OneBlockDump);

        let all_multi = DumpRequest {
            cardinality: Cardinality::Block,
            kind: PatchKind::Multi,
            ..one_single
        };
        assert_eq!(
            all_multi.to_bytes(),
            vec![0xF0, 0x40, 0x00, 0x01, 0x00, 0x0A, 0x20, 0xF7]
        );
        assert_eq!(all_multi.expected_reply(), Function::AllBlockDump);
    }
}
