//! Manufacturer identifiers and the static lookup table.
//!
//! Identifiers are either one byte (standard) or three bytes starting with
//! 0x00 (extended). The development ID 0x7D never appears in the table; the
//! framer hands out [`DEVELOPMENT`] directly.

use serde::Serialize;

/// How a manufacturer identifier is encoded on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ManufacturerKind {
    /// 0x7D, for non-commercial use.
    Development,
    /// A single byte in 0x01..=0x7C.
    Standard,
    /// 0x00 followed by two bytes.
    Extended,
    /// Lookup miss.
    Unknown,
}

/// Geographic group the MMA/AMEI assigned the identifier from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ManufacturerGroup {
    /// 0x01..=0x1F, 0x00 0x00..=0x1F xx
    American,
    /// 0x20..=0x3F, 0x00 0x20..=0x3F xx
    European,
    /// 0x40..=0x5F, 0x00 0x40..=0x5F xx
    Japanese,
    /// 0x60..=0x7C, 0x00 0x60..=0x7F xx
    Other,
    /// 0x7D
    Development,
    /// Lookup miss.
    Unknown,
}

impl ManufacturerGroup {
    /// Group implied by the MIDI 1.0 identifier ranges.
    pub const fn of(identifier: &[u8]) -> ManufacturerGroup {
        match identifier {
            [0x7D] => ManufacturerGroup::Development,
            [0x01..=0x1F] => ManufacturerGroup::American,
            [0x20..=0x3F] => ManufacturerGroup::European,
            [0x40..=0x5F] => ManufacturerGroup::Japanese,
            [0x60..=0x7C] => ManufacturerGroup::Other,
            [0x00, 0x00..=0x1F, _] => ManufacturerGroup::American,
            [0x00, 0x20..=0x3F, _] => ManufacturerGroup::European,
            [0x00, 0x40..=0x5F, _] => ManufacturerGroup::Japanese,
            [0x00, 0x60..=0x7F, _] => ManufacturerGroup::Other,
            _ => ManufacturerGroup::Unknown,
        }
    }
}

/// Who defined the layout of a manufacturer-specific payload.
///
/// Two descriptors are equal when their identifiers are equal; the names are
/// informational only.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ManufacturerDescriptor {
    /// Wire encoding of `identifier`.
    pub kind: ManufacturerKind,
    /// One or three bytes, empty for [`UNKNOWN`].
    pub identifier: &'static [u8],
    /// Assigning group, from the identifier range.
    pub group: ManufacturerGroup,
    /// Short name.
    pub name: &'static str,
    /// Full company name.
    pub display_name: &'static str,
}

impl PartialEq for ManufacturerDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.identifier == other.identifier
    }
}

impl Eq for ManufacturerDescriptor {}

impl ManufacturerDescriptor {
    const fn new(identifier: &'static [u8], name: &'static str, display_name: &'static str) -> Self {
        let kind = match identifier.len() {
            1 => ManufacturerKind::Standard,
            _ => ManufacturerKind::Extended,
        };
        Self {
            kind,
            identifier,
            group: ManufacturerGroup::of(identifier),
            name,
            display_name,
        }
    }

    /// Whether this is the [`UNKNOWN`] sentinel.
    pub fn is_unknown(&self) -> bool {
        self.kind == ManufacturerKind::Unknown
    }
}

/// Sentinel returned by [`find`] on a miss.
pub const UNKNOWN: ManufacturerDescriptor = ManufacturerDescriptor {
    kind: ManufacturerKind::Unknown,
    identifier: &[],
    group: ManufacturerGroup::Unknown,
    name: "Unknown",
    display_name: "Unknown manufacturer",
};

/// Descriptor of the non-commercial ID 0x7D.
pub const DEVELOPMENT: ManufacturerDescriptor = ManufacturerDescriptor {
    kind: ManufacturerKind::Development,
    identifier: &[ID_DEVELOPMENT],
    group: ManufacturerGroup::Development,
    name: "Development",
    display_name: "Non-commercial / development use",
};

/// Non-commercial / development identifier.
pub const ID_DEVELOPMENT: u8 = 0x7D;
/// Kawai's standard identifier.
pub const ID_KAWAI: u8 = 0x40;

/// Known manufacturers. Extended IDs keep their leading 0x00.
static MANUFACTURERS: &[ManufacturerDescriptor] = &[
    ManufacturerDescriptor::new(&[0x01], "Sequential", "Sequential Circuits"),
    ManufacturerDescriptor::new(&[0x04], "Moog", "Moog Music"),
    ManufacturerDescriptor::new(&[0x06], "Lexicon", "Lexicon Inc."),
    ManufacturerDescriptor::new(&[0x07], "Kurzweil", "Kurzweil / Young Chang"),
    ManufacturerDescriptor::new(&[0x0F], "Ensoniq", "Ensoniq"),
    ManufacturerDescriptor::new(&[0x10], "Oberheim", "Oberheim / Gibson Labs"),
    ManufacturerDescriptor::new(&[0x18], "E-mu", "E-mu Systems"),
    ManufacturerDescriptor::new(&[0x1A], "ART", "Applied Research & Technology"),
    ManufacturerDescriptor::new(&[0x24], "Hohner", "Hohner"),
    ManufacturerDescriptor::new(&[0x29], "PPG", "PPG (Germany)"),
    ManufacturerDescriptor::new(&[0x2F], "Elka", "Elka"),
    ManufacturerDescriptor::new(&[0x33], "Clavia", "Clavia Digital Instruments"),
    ManufacturerDescriptor::new(&[0x3E], "Waldorf", "Waldorf Electronics GmbH"),
    ManufacturerDescriptor::new(&[ID_KAWAI], "Kawai", "Kawai Musical Instruments Mfg. Co. Ltd"),
    ManufacturerDescriptor::new(&[0x41], "Roland", "Roland Corporation"),
    ManufacturerDescriptor::new(&[0x42], "Korg", "Korg Inc."),
    ManufacturerDescriptor::new(&[0x43], "Yamaha", "Yamaha Corporation"),
    ManufacturerDescriptor::new(&[0x44], "Casio", "Casio Computer Co. Ltd"),
    ManufacturerDescriptor::new(&[0x47], "Akai", "Akai Electric Co. Ltd"),
    ManufacturerDescriptor::new(&[0x00, 0x00, 0x0E], "Alesis", "Alesis Studio Electronics"),
    ManufacturerDescriptor::new(&[0x00, 0x01, 0x05], "M-Audio", "M-Audio"),
    ManufacturerDescriptor::new(&[0x00, 0x20, 0x29], "Novation", "Focusrite / Novation"),
    ManufacturerDescriptor::new(&[0x00, 0x20, 0x32], "Behringer", "Behringer GmbH"),
    ManufacturerDescriptor::new(&[0x00, 0x20, 0x33], "Access", "Access Music Electronics"),
    ManufacturerDescriptor::new(&[0x00, 0x20, 0x3C], "Elektron", "Elektron ESI AB"),
    ManufacturerDescriptor::new(&[0x00, 0x20, 0x6B], "Arturia", "Arturia"),
    ManufacturerDescriptor::new(&[0x00, 0x21, 0x09], "Native Instruments", "Native Instruments"),
];

/// Looks up an identifier by value. Never fails: a miss returns [`UNKNOWN`].
pub fn find(identifier: &[u8]) -> ManufacturerDescriptor {
    MANUFACTURERS
        .iter()
        .find(|descriptor| descriptor.identifier == identifier)
        .copied()
        .unwrap_or(UNKNOWN)
}
