//! SYSEX message framing.
//!
//! A message is `F0 | selector | payload | F7`. The selector is one byte for
//! standard and development IDs and three bytes for extended IDs. Universal
//! messages use the ID byte, the device and sub-ID#1 as their selector, so
//! sub-ID#2 is the first payload byte. Framing only looks at structure; the
//! payload is handed back untouched as a view into the input.

use crate::error::FramingError;
use crate::manufacturer::{self, ManufacturerDescriptor, DEVELOPMENT, ID_DEVELOPMENT};

/// First byte of every message.
pub const SYSEX_START: u8 = 0xF0;
/// Last byte of every message.
pub const SYSEX_END: u8 = 0xF7;

/// Escape byte in front of a two-byte manufacturer ID.
pub const ID_EXTENDED: u8 = 0x00;
/// Universal non-real time messages.
pub const ID_UNIVERSAL_NON_REAL_TIME: u8 = 0x7E;
/// Universal real time messages.
pub const ID_UNIVERSAL_REAL_TIME: u8 = 0x7F;

/// Device ID that addresses every device on the bus.
pub const DEVICE_ID_ALL_CALL: u8 = 0x7F;

/// Non-real time sub-ID#1: sample dump header.
pub const SUB_ID1_NRT_SAMPLE_DUMP_HEADER: u8 = 0x01;
/// Non-real time sub-ID#1: sample data packet.
pub const SUB_ID1_NRT_SAMPLE_DATA_PACKET: u8 = 0x02;
/// Non-real time sub-ID#1: general information (identity request/reply).
pub const SUB_ID1_NRT_GENERAL_INFORMATION: u8 = 0x06;
/// Non-real time sub-ID#1: General MIDI on/off.
pub const SUB_ID1_NRT_GENERAL_MIDI: u8 = 0x09;
/// Non-real time sub-ID#1: NAK.
pub const SUB_ID1_NRT_NAK: u8 = 0x7E;
/// Non-real time sub-ID#1: ACK.
pub const SUB_ID1_NRT_ACK: u8 = 0x7F;

/// Sub-ID#2 under General Information: identity request.
pub const SUB_ID2_IDENTITY_REQUEST: u8 = 0x01;
/// Sub-ID#2 under General Information: identity reply.
pub const SUB_ID2_IDENTITY_REPLY: u8 = 0x02;

/// Smallest buffer that can be a message: F0, three more bytes, F7.
pub const MIN_MESSAGE_LEN: usize = 5;

/// A framed SYSEX message borrowing its payload from the input buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message<'a> {
    /// Selector 0x7E or 0x7F.
    Universal(UniversalMessage<'a>),
    /// Any other selector.
    ManufacturerSpecific(ManufacturerSpecificMessage<'a>),
}

/// A message defined by MIDI itself rather than by a manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniversalMessage<'a> {
    /// Selector 0x7F rather than 0x7E.
    pub is_realtime: bool,
    /// Target device, or [`DEVICE_ID_ALL_CALL`].
    pub device_channel: u8,
    /// Message category.
    pub sub_id1: u8,
    /// Bytes after sub-ID#1 up to but excluding F7, starting with sub-ID#2.
    pub payload: &'a [u8],
}

impl UniversalMessage<'_> {
    /// The first payload byte, if any.
    pub fn sub_id2(&self) -> Option<u8> {
        self.payload.first().copied()
    }

    /// Whether this is a General Information identity reply.
    pub fn is_identity_reply(&self) -> bool {
        !self.is_realtime
            && self.sub_id1 == SUB_ID1_NRT_GENERAL_INFORMATION
            && self.sub_id2() == Some(SUB_ID2_IDENTITY_REPLY)
    }
}

/// A message whose payload layout is defined by a manufacturer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManufacturerSpecificMessage<'a> {
    /// Registry entry for the identifier; [`UNKNOWN`](manufacturer::UNKNOWN) on a miss.
    pub manufacturer: ManufacturerDescriptor,
    /// The identifier bytes as they appeared on the wire. Unlike
    /// `manufacturer.identifier` this is never empty.
    pub identifier: &'a [u8],
    /// Bytes after the identifier, up to but excluding F7.
    pub payload: &'a [u8],
}

impl<'a> Message<'a> {
    /// Validates the framing bytes and classifies `data`.
    pub fn parse(data: &'a [u8]) -> Result<Message<'a>, FramingError> {
        let too_short = FramingError::TooShort {
            len: data.len(),
            needed: MIN_MESSAGE_LEN,
        };
        if data.len() < MIN_MESSAGE_LEN {
            return Err(too_short);
        }
        let &[first, ref body @ .., last] = data else {
            return Err(too_short);
        };
        if first != SYSEX_START {
            return Err(FramingError::MissingInitiator { found: first });
        }
        if last != SYSEX_END {
            return Err(FramingError::MissingTerminator { found: last });
        }

        let message = match body {
            &[ID_DEVELOPMENT, ref payload @ ..] => {
                Message::ManufacturerSpecific(ManufacturerSpecificMessage {
                    manufacturer: DEVELOPMENT,
                    identifier: &body[..1],
                    payload,
                })
            }
            &[id @ (ID_UNIVERSAL_NON_REAL_TIME | ID_UNIVERSAL_REAL_TIME), device_channel, sub_id1, ref payload @ ..] => {
                Message::Universal(UniversalMessage {
                    is_realtime: id == ID_UNIVERSAL_REAL_TIME,
                    device_channel,
                    sub_id1,
                    payload,
                })
            }
            &[ID_EXTENDED, _, _, ref payload @ ..] => {
                let identifier = &body[..3];
                Message::ManufacturerSpecific(ManufacturerSpecificMessage {
                    manufacturer: manufacturer::find(identifier),
                    identifier,
                    payload,
                })
            }
            &[_, ref payload @ ..] => {
                let identifier = &body[..1];
                Message::ManufacturerSpecific(ManufacturerSpecificMessage {
                    manufacturer: manufacturer::find(identifier),
                    identifier,
                    payload,
                })
            }
            &[] => return Err(too_short),
        };

        log::debug!("SYSEX: {} bytes classified as {}", data.len(), message.describe());

        Ok(message)
    }

    /// Bytes between the selector and F7.
    pub fn payload(&self) -> &'a [u8] {
        match self {
            Message::Universal(universal) => universal.payload,
            Message::ManufacturerSpecific(specific) => specific.payload,
        }
    }

    /// Whether every payload byte is a MIDI data byte (high bit clear).
    pub fn is_seven_bit(&self) -> bool {
        self.payload().iter().all(|&byte| byte < 0x80)
    }

    /// Writes the complete message, F0 and F7 included.
    pub fn write_to(&self, out: &mut Vec<u8>) {
        out.push(SYSEX_START);
        match self {
            Message::Universal(universal) => {
                out.push(if universal.is_realtime {
                    ID_UNIVERSAL_REAL_TIME
                } else {
                    ID_UNIVERSAL_NON_REAL_TIME
                });
                out.extend_from_slice(&[universal.device_channel, universal.sub_id1]);
            }
            Message::ManufacturerSpecific(specific) => {
                out.extend_from_slice(specific.identifier);
            }
        }
        out.extend_from_slice(self.payload());
        out.push(SYSEX_END);
    }

    /// The complete message as a new buffer.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.payload().len() + MIN_MESSAGE_LEN);
        self.write_to(&mut out);
        out
    }

    fn describe(&self) -> &'static str {
        match self {
            Message::Universal(UniversalMessage { is_realtime: true, .. }) => "universal real time",
            Message::Universal(_) => "universal non-real time",
            Message::ManufacturerSpecific(specific) => specific.manufacturer.name,
        }
    }
}

/// Iterates over the `F0 .. F7` spans of a buffer holding several messages,
/// such as a `.syx` file.
///
/// Bytes between spans are skipped. A span that is interrupted by another F0,
/// or that runs to the end of the buffer, is reported as
/// [`FramingError::MissingTerminator`].
pub fn split(data: &[u8]) -> Split<'_> {
    Split { data, pos: 0 }
}

/// Iterator returned by [`split`].
#[derive(Debug, Clone)]
pub struct Split<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Iterator for Split<'a> {
    type Item = Result<&'a [u8], FramingError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rest = &self.data[self.pos..];
        let start = self.pos + rest.iter().position(|&byte| byte == SYSEX_START)?;

        let after_start = &self.data[start + 1..];
        match after_start
            .iter()
            .position(|&byte| byte == SYSEX_END || byte == SYSEX_START)
        {
            Some(offset) if after_start[offset] == SYSEX_END => {
                let end = start + 1 + offset + 1;
                self.pos = end;
                Some(Ok(&self.data[start..end]))
            }
            Some(offset) => {
                // Resume at the interrupting F0.
                let next_start = start + 1 + offset;
                self.pos = next_start;
                Some(Err(FramingError::MissingTerminator {
                    found: self.data[next_start - 1],
                }))
            }
            None => {
                self.pos = self.data.len();
                Some(Err(FramingError::MissingTerminator {
                    found: self.data[self.data.len() - 1],
                }))
            }
        }
    }
}
