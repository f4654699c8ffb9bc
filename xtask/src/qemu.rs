//! QEMU runner for Cortex-M3 emulation.

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{Context, Result};

/// Output from running QEMU.
pub struct QemuOutput {
    /// Whether the firmware exited through semihosting with success.
    pub success: bool,
    /// defmt frames written to semihosting stdout.
    pub semihosting: Vec<u8>,
    /// QEMU's own diagnostics.
    pub stderr: String,
}

/// Run an ELF on the emulated LM3S6965 until it exits through semihosting.
pub fn run_qemu(elf_path: &Path) -> Result<QemuOutput> {
    let output = Command::new("qemu-system-arm")
        .arg("-cpu")
        .arg("cortex-m3")
        .arg("-machine")
        .arg("lm3s6965evb")
        .arg("-nographic")
        .arg("-monitor")
        .arg("none")
        .arg("-serial")
        .arg("null")
        .arg("-semihosting-config")
        .arg("enable=on,target=native")
        .arg("-kernel")
        .arg(elf_path)
        .stdin(Stdio::null())
        .output()
        .context("Failed to run QEMU")?;

    Ok(QemuOutput {
        success: output.status.success(),
        semihosting: output.stdout,
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}
