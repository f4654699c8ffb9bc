//! Running a testsuite example and judging the outcome.

use anyhow::Result;

use crate::build::build_example;
use crate::defmt;
use crate::qemu::run_qemu;

/// Options for running an example.
pub struct RunOptions {
    /// Print the decoded log even when the example passes.
    pub verbose: bool,
    /// Build in release mode.
    pub release: bool,
}

/// Build and run an example.
///
/// The example passes when the firmware exits with success and logged
/// nothing at error level. Returns `Ok(true)` on pass, `Ok(false)` on
/// failure.
pub fn run_example(example: &str, opts: &RunOptions) -> Result<bool> {
    println!("Building '{example}'...");
    let elf_path = build_example(example, opts.release)?;

    println!("Running in QEMU...");
    let output = run_qemu(&elf_path)?;
    let log = defmt::decode(&elf_path, &output.semihosting)?;
    let errors = log.errors();

    let passed = output.success && errors == 0;

    if opts.verbose || !passed {
        print!("{log}");
        println!("--- QEMU run end ---");
    }
    if !output.stderr.is_empty() {
        println!("--- QEMU stderr ---");
        print!("{}", output.stderr);
    }

    if passed {
        println!("  PASS");
    } else if !output.success {
        println!("  FAIL: firmware exited with failure");
    } else {
        println!("  FAIL: {errors} error(s) logged");
    }

    Ok(passed)
}
