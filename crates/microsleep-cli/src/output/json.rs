//! JSON output adapter.

use anyhow::Result;
use microsleep_core::{PredictionRecord, ResultOutput};
use std::io::{self, Write};
use std::sync::Mutex;

/// How records are laid out on the writer.
enum Layout {
    /// One compact object per line, written as records arrive.
    Lines,
    /// A single array emitted on flush.
    Array {
        pretty: bool,
        buffer: Mutex<Vec<PredictionRecord>>,
    },
}

/// JSON output adapter.
pub struct JsonOutput {
    writer: Mutex<Box<dyn Write + Send>>,
    layout: Layout,
}

impl JsonOutput {
    /// Creates a JSON Lines output writing to stdout.
    #[must_use]
    pub fn stdout() -> Self {
        Self::lines(Box::new(io::stdout()))
    }

    /// Creates a JSON array output writing to stdout.
    #[must_use]
    pub fn stdout_array(pretty: bool) -> Self {
        Self::array(Box::new(io::stdout()), pretty)
    }

    /// Creates a JSON Lines output writing to the given writer.
    #[must_use]
    pub fn lines(writer: Box<dyn Write + Send>) -> Self {
        Self {
            writer: Mutex::new(writer),
            layout: Layout::Lines,
        }
    }

    /// Creates a JSON array output writing to the given writer.
    #[must_use]
    pub fn array(writer: Box<dyn Write + Send>, pretty: bool) -> Self {
        Self {
            writer: Mutex::new(writer),
            layout: Layout::Array {
                pretty,
                buffer: Mutex::new(Vec::new()),
            },
        }
    }
}

impl ResultOutput for JsonOutput {
    #[allow(clippy::significant_drop_tightening)]
    fn write(&self, record: &PredictionRecord) -> Result<()> {
        match &self.layout {
            Layout::Lines => {
                let json = serde_json::to_string(record)?;
                let mut writer = self
                    .writer
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;
                writeln!(writer, "{json}")?;
            }
            Layout::Array { buffer, .. } => {
                buffer
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?
                    .push(record.clone());
            }
        }
        Ok(())
    }

    #[allow(clippy::significant_drop_tightening)]
    fn flush(&self) -> Result<()> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?;

        if let Layout::Array { pretty, buffer } = &self.layout {
            let records = std::mem::take(
                &mut *buffer
                    .lock()
                    .map_err(|e| anyhow::anyhow!("Lock poisoned: {e}"))?,
            );
            let json = if *pretty {
                serde_json::to_string_pretty(&records)?
            } else {
                serde_json::to_string(&records)?
            };
            writeln!(writer, "{json}")?;
        }

        writer.flush()?;
        Ok(())
    }
}
