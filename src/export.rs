use std::fs::File;
use std::io::Write;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ImeiError, Result};
use crate::lookup::DeviceRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Semicolon-separated values
    Csv,
    /// Tab-separated values
    Txt,
    Json,
}

impl ExportFormat {
    /// Infer the format from a file extension, if it is one we know
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }

    fn delimiter(self) -> Option<u8> {
        match self {
            ExportFormat::Csv => Some(b';'),
            ExportFormat::Txt => Some(b'\t'),
            ExportFormat::Json => None,
        }
    }
}

impl FromStr for ExportFormat {
    type Err = ImeiError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "txt" | "tsv" => Ok(ExportFormat::Txt),
            "json" => Ok(ExportFormat::Json),
            other => Err(ImeiError::Config(format!("unknown export format: {}", other))),
        }
    }
}

/// Write resolved devices to `writer` in the given format
pub fn write_records<W: Write>(writer: W, records: &[DeviceRecord], format: ExportFormat) -> Result<()> {
    match format.delimiter() {
        Some(delimiter) => {
            let mut csv_writer = csv::WriterBuilder::new()
                .delimiter(delimiter)
                .from_writer(writer);

            csv_writer.write_record(["IMEI", "Brand", "Model", "OS"])?;
            for record in records {
                csv_writer.write_record([
                    record.imei.as_str(),
                    record.brand_or_unknown(),
                    record.model_or_unknown(),
                    record.os_hint.as_str(),
                ])?;
            }
            csv_writer.flush()?;
        }
        None => {
            serde_json::to_writer_pretty(writer, records)?;
        }
    }
    Ok(())
}

/// Export to a file, returning the number of rows written
pub fn export_to_file(path: &Path, records: &[DeviceRecord], format: ExportFormat) -> Result<usize> {
    let file = File::create(path)?;
    write_records(file, records, format)?;
    tracing::info!("Exported {} records to {}", records.len(), path.display());
    Ok(records.len())
}
