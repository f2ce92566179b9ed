use std::process::Command;

use anyhow::{bail, Context, Result};
use log::debug;

const REMOTE_BIN: &str = "transmission-remote";

pub fn listing() -> Result<Vec<String>> {
    capture(&["-l"])
}

pub fn detail(id: i64) -> Result<Vec<String>> {
    capture(&["-t", &id.to_string(), "-i"])
}

fn capture(args: &[&str]) -> Result<Vec<String>> {
    debug!("running {REMOTE_BIN} {}", args.join(" "));
    let output = Command::new(REMOTE_BIN)
        .args(args)
        .output()
        .with_context(|| format!("failed to run {REMOTE_BIN}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = stderr.trim();
        if stderr.is_empty() {
            bail!("{REMOTE_BIN} exited with {}", output.status);
        }
        bail!("{REMOTE_BIN} failed: {stderr}");
    }

    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}
