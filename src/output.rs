//! Report formatting and persistence.
//!
//! Supports pretty-printing, JSON logging, and writing JSON payloads to a
//! file or stdout.

use anyhow::Result;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use tracing::{debug, info};

/// Logs a report using Rust's debug pretty-print format.
pub fn print_pretty<T: Serialize + std::fmt::Debug>(report: &T) {
    debug!("{:#?}", report);
}

/// Logs a report as pretty-printed JSON.
pub fn print_json<T: Serialize>(report: &T) -> Result<()> {
    info!("{}", serde_json::to_string_pretty(report)?);
    Ok(())
}

/// Writes a report as pretty-printed JSON to `path`, or to stdout when no
/// path is given.
pub fn write_report<T: Serialize>(path: Option<&str>, report: &T) -> Result<()> {
    match path {
        Some(path) => {
            debug!(path, "Writing JSON report");
            let file = File::create(path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer_pretty(&mut writer, report)?;
            writer.write_all(b"\n")?;
            writer.flush()?;
            info!(path, "Report written");
        }
        None => {
            let mut out = stdout().lock();
            serde_json::to_writer_pretty(&mut out, report)?;
            out.write_all(b"\n")?;
        }
    }
    Ok(())
}
