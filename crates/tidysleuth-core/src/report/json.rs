/// Pretty-printed JSON output. Every report type serialises as-is.
use crate::error::Result;
use serde::Serialize;
use std::io::Write;

pub fn write<W: Write, T: Serialize>(mut out: W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
