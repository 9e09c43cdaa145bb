use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use ksyx::{BlockOptions, Cardinality, ChecksumPolicy, DumpRequest, Machine, PatchKind};

mod report;

/// Inspect Kawai SYSEX patch dumps
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Describe every message in a sysex file
    Inspect {
        /// Path to the sysex file
        sysex_file: PathBuf,

        /// Walk block dumps treating each patch as this many bytes
        #[arg(long)]
        record_size: Option<usize>,

        /// What to do with records whose checksum does not match
        #[arg(long, value_enum, default_value_t = PolicyArg::Flag)]
        policy: PolicyArg,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a K5000 dump request message as hex
    Request {
        #[arg(long, value_enum, default_value_t = KindArg::Single)]
        kind: KindArg,

        /// MIDI channel (1-16)
        #[arg(long, default_value_t = 1)]
        channel: u8,

        /// Bank byte for single requests
        #[arg(long, default_value_t = 0)]
        bank: u8,

        /// Request one patch (1-indexed) instead of the whole block
        #[arg(long)]
        number: Option<u8>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum PolicyArg {
    Flag,
    Skip,
    Abort,
}

impl From<PolicyArg> for ChecksumPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Flag => ChecksumPolicy::Flag,
            PolicyArg::Skip => ChecksumPolicy::Skip,
            PolicyArg::Abort => ChecksumPolicy::Abort,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum KindArg {
    Single,
    Multi,
}

fn main() -> Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Inspect {
            sysex_file,
            record_size,
            policy,
            json,
        } => {
            let data = std::fs::read(&sysex_file)
                .with_context(|| format!("Failed to read SYSEX file '{}'", sysex_file.display()))?;

            let options = BlockOptions {
                policy: policy.into(),
            };
            let reports = report::inspect_all(&data, record_size, options);
            if reports.is_empty() {
                return Err(anyhow!("No SYSEX messages found in '{}'", sysex_file.display()));
            }

            if json {
                println!("{}", serde_json::to_string_pretty(&reports)?);
            } else {
                for report in &reports {
                    println!("{}", report::format_text(report));
                }
            }
        }
        Commands::Request {
            kind,
            channel,
            bank,
            number,
        } => {
            if !(1..=16).contains(&channel) {
                return Err(anyhow!("channel must be 1-16 (got {})", channel));
            }
            if number == Some(0) || number.map_or(false, |number| number > 128) {
                return Err(anyhow!("number must be 1-128"));
            }

            let request = DumpRequest {
                channel: channel - 1,
                cardinality: if number.is_some() {
                    Cardinality::One
                } else {
                    Cardinality::Block
                },
                kind: match kind {
                    KindArg::Single => PatchKind::Single,
                    KindArg::Multi => PatchKind::Multi,
                },
                machine: Machine::K5000,
                bank,
                instrument_number: number.map_or(0, |number| number - 1),
            };
            log::debug!("REQUEST: {:?}, expecting {:?}", request, request.expected_reply());

            println!("{}", report::format_bytes(&request.to_bytes()));
        }
    }

    Ok(())
}
