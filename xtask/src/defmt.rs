//! Decoding of the defmt stream written by the firmware.

use std::fmt;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use defmt_decoder::{DecodeError, Table};

/// The decoded log of one firmware run.
#[derive(Debug, Default)]
pub struct Log {
    lines: Vec<String>,
    errors: usize,
    /// The stream ended in a malformed frame, usually panic text written
    /// by the panic handler to the same semihosting channel.
    pub truncated: bool,
}

impl Log {
    /// Error-level lines, plus one for a truncated stream.
    pub fn errors(&self) -> usize {
        self.errors + usize::from(self.truncated)
    }
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{line}")?;
        }
        if self.truncated {
            writeln!(f, "[ERROR] malformed defmt frame, did the firmware panic?")?;
        }
        Ok(())
    }
}

/// Decode the raw defmt bytes of a run against the table in `elf_path`.
pub fn decode(elf_path: &Path, raw: &[u8]) -> Result<Log> {
    let elf = fs::read(elf_path).context("Failed to read ELF file")?;
    let table = Table::parse(&elf)
        .context("Failed to parse defmt table from ELF")?
        .ok_or_else(|| anyhow!("No defmt data found in ELF"))?;

    let mut decoder = table.new_stream_decoder();
    decoder.received(raw);

    let mut log = Log::default();
    loop {
        match decoder.decode() {
            Ok(frame) => {
                let level = frame.level().map_or("print", |l| l.as_str());
                if level == "error" {
                    log.errors += 1;
                }
                log.lines.push(format!(
                    "[{:<5}] {}",
                    level.to_uppercase(),
                    frame.display_message()
                ));
            }
            Err(DecodeError::UnexpectedEof) => break,
            Err(DecodeError::Malformed) => {
                log.truncated = true;
                break;
            }
        }
    }

    Ok(log)
}
