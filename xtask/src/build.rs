//! Building the QEMU testsuite firmware.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};

/// Target of the emulated LM3S6965.
const TARGET: &str = "thumbv7m-none-eabi";

fn workspace_root() -> &'static Path {
    // xtask is a direct member of the workspace.
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap_or_else(|| Path::new("."))
}

fn testsuite_dir() -> PathBuf {
    workspace_root().join("testsuite")
}

/// Build `example` with every log level enabled and return its ELF.
pub fn build_example(example: &str, release: bool) -> Result<PathBuf> {
    let profile = if release { "release" } else { "debug" };

    let mut cmd = Command::new(env!("CARGO"));
    cmd.current_dir(testsuite_dir())
        .env("DEFMT_LOG", "trace")
        .args(["build", "--quiet", "--target", TARGET, "--example", example]);
    if release {
        cmd.arg("--release");
    }

    let status = cmd
        .status()
        .with_context(|| format!("Failed to build '{example}'"))?;
    if !status.success() {
        bail!("cargo build of '{example}' failed ({status})");
    }

    Ok(workspace_root()
        .join("target")
        .join(TARGET)
        .join(profile)
        .join("examples")
        .join(example))
}

/// Names of the testsuite examples containing `filter`, sorted.
pub fn discover_examples(filter: Option<&str>) -> Result<Vec<String>> {
    let dir = testsuite_dir().join("examples");

    let mut examples = Vec::new();
    for entry in fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))? {
        let path = entry?.path();
        if path.extension().is_none_or(|ext| ext != "rs") {
            continue;
        }
        let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
            continue;
        };
        if filter.is_none_or(|f| name.contains(f)) {
            examples.push(name.to_owned());
        }
    }
    examples.sort();
    Ok(examples)
}
