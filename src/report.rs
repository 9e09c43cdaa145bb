use serde::Serialize;

use ksyx::{
    sysex, BlockOptions, DumpHeader, FixedLength, Machine, ManufacturerDescriptor, Message,
};

/// What `inspect` found in one message of a file.
#[derive(Debug, Serialize)]
pub struct MessageReport {
    pub index: usize,
    pub length: usize,
    pub kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manufacturer: Option<ManufacturerDescriptor>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub universal: Option<UniversalReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header: Option<DumpHeader>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub records: Vec<RecordReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub leftover_bytes: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UniversalReport {
    pub realtime: bool,
    pub device: u8,
    pub sub_id1: u8,
    pub sub_id2: Option<u8>,
    pub payload_length: usize,
}

#[derive(Debug, Serialize)]
pub struct RecordReport {
    pub index: usize,
    pub slot: Option<usize>,
    pub length: usize,
    pub stored_checksum: u8,
    pub computed_checksum: u8,
    pub checksum_ok: bool,
}

impl MessageReport {
    fn new(index: usize, data: &[u8]) -> Self {
        Self {
            index,
            length: data.len(),
            kind: "invalid",
            manufacturer: None,
            universal: None,
            header: None,
            records: Vec::new(),
            leftover_bytes: None,
            error: None,
        }
    }
}

/// Inspects one framed message. Decoding problems end up in `error`.
pub fn inspect(
    index: usize,
    data: &[u8],
    record_size: Option<usize>,
    options: BlockOptions,
) -> MessageReport {
    let mut report = MessageReport::new(index, data);

    let message = match Message::parse(data) {
        Ok(message) => message,
        Err(error) => {
            report.error = Some(error.to_string());
            return report;
        }
    };

    let specific = match message {
        Message::Universal(universal) => {
            report.kind = "universal";
            report.universal = Some(UniversalReport {
                realtime: universal.is_realtime,
                device: universal.device_channel,
                sub_id1: universal.sub_id1,
                sub_id2: universal.sub_id2(),
                payload_length: universal.payload.len(),
            });
            return report;
        }
        Message::ManufacturerSpecific(specific) => specific,
    };

    report.kind = "manufacturer";
    report.manufacturer = Some(specific.manufacturer);
    if specific.identifier != [ksyx::manufacturer::ID_KAWAI].as_slice() {
        return report;
    }

    let dump = match ksyx::Dump::parse_for_machine(specific.payload) {
        Ok(dump) => dump,
        Err(error) => {
            report.error = Some(error.to_string());
            return report;
        }
    };
    report.kind = "dump";

    if let Some(record_size) = record_size {
        let checksum = dump
            .header
            .machine()
            .map_or(Machine::K5000.checksum(), Machine::checksum);
        let mut records = dump.records(FixedLength(record_size), checksum, options);
        for record in records.by_ref() {
            match record {
                Ok(record) => report.records.push(RecordReport {
                    index: record.index,
                    slot: record.slot,
                    length: record.content.len(),
                    stored_checksum: record.stored_checksum,
                    computed_checksum: record.computed_checksum,
                    checksum_ok: record.checksum_ok(),
                }),
                Err(error) => {
                    report.error = Some(error.to_string());
                    break;
                }
            }
        }
        report.leftover_bytes = Some(records.remaining().len());
    }

    report.header = Some(dump.header);
    report
}

/// Plain text rendering of a report.
pub fn format_text(report: &MessageReport) -> String {
    let mut ret = format!("#{} ({} bytes): {}", report.index, report.length, report.kind);

    if let Some(manufacturer) = &report.manufacturer {
        ret.push_str(&format!(", {}", manufacturer.display_name));
    }
    if let Some(universal) = &report.universal {
        ret.push_str(&format!(
            ", {} device {:02X}h, sub-ID {:02X}h/{}",
            if universal.realtime { "real time" } else { "non-real time" },
            universal.device,
            universal.sub_id1,
            universal
                .sub_id2
                .map_or("-".to_string(), |sub_id2| format!("{:02X}h", sub_id2))
        ));
    }
    if let Some(header) = &report.header {
        let machine = header.machine().map_or("unknown machine", Machine::name);
        ret.push_str(&format!(
            "\n  {} {:?} {:?} dump, channel {}, {} patches, header {} bytes",
            machine,
            header.cardinality,
            header.kind,
            header.channel + 1,
            header.patch_count(),
            header.data_length()
        ));
        if let Some(tone_map) = &header.tone_map {
            let slots: Vec<String> = tone_map.iter().map(|slot| (slot + 1).to_string()).collect();
            ret.push_str(&format!("\n  slots: {}", slots.join(" ")));
        }
        if let Some(instrument_number) = header.instrument_number {
            ret.push_str(&format!("\n  instrument: {}", instrument_number));
        }
    }
    for record in &report.records {
        ret.push_str(&format!(
            "\n  record {} (slot {}): {} bytes, checksum {:02X}h{}",
            record.index,
            record.slot.map_or("?".to_string(), |slot| (slot + 1).to_string()),
            record.length,
            record.stored_checksum,
            if record.checksum_ok {
                String::new()
            } else {
                format!(" (WRONG, expected {:02X}h)", record.computed_checksum)
            }
        ));
    }
    if let Some(leftover_bytes) = report.leftover_bytes {
        ret.push_str(&format!("\n  {} bytes left over", leftover_bytes));
    }
    if let Some(error) = &report.error {
        ret.push_str(&format!("\n  error: {}", error));
    }

    ret
}

/// Formats bytes as space-separated hex.
pub fn format_bytes(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|byte| format!("{:02X}", byte))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits `data` and inspects every complete message.
pub fn inspect_all(
    data: &[u8],
    record_size: Option<usize>,
    options: BlockOptions,
) -> Vec<MessageReport> {
    sysex::split(data)
        .enumerate()
        .map(|(index, span)| match span {
            Ok(message) => inspect(index, message, record_size, options),
            Err(error) => {
                let mut report = MessageReport::new(index, &[]);
                report.error = Some(error.to_string());
                report
            }
        })
        .collect()
}
