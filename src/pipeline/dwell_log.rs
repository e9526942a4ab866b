// src/pipeline/dwell_log.rs
//
// Destination for expiry records: one text line per vehicle, echoed to the
// console through tracing.

use crate::analysis::DwellRecord;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::info;

pub struct DwellLog<W: Write> {
    out: W,
    pub lines_written: u64,
}

impl DwellLog<File> {
    /// Truncates any existing log at `path`
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = File::create(path)
            .with_context(|| format!("Failed to create dwell log {}", path.display()))?;
        info!("💾 Dwell times will be written to: {}", path.display());
        Ok(Self::new(file))
    }
}

impl<W: Write> DwellLog<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            lines_written: 0,
        }
    }

    /// Flushed after every line so the log survives an abrupt stop
    pub fn write(&mut self, record: &DwellRecord) -> Result<()> {
        let line = record.to_string();
        info!("{}", line);
        writeln!(self.out, "{}", line)?;
        self.out.flush()?;
        self.lines_written += 1;
        Ok(())
    }

    pub fn write_all(&mut self, records: &[DwellRecord]) -> Result<()> {
        for record in records {
            self.write(record)?;
        }
        Ok(())
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}
