use anyhow::Result;
use csv::WriterBuilder;
use serde::Serialize;
use std::fs::OpenOptions;
use std::path::Path;
use tracing::debug;

/// One row of the delivery log (`envios.csv`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryLogEntry {
    #[serde(rename = "fecha")]
    pub sent_at: String,
    #[serde(rename = "tipo")]
    pub kind: String,
    #[serde(rename = "para")]
    pub to: String,
    #[serde(rename = "asunto")]
    pub subject: String,
    /// Attachment paths joined with `;`.
    #[serde(rename = "adjuntos")]
    pub attachments: String,
}

/// Appends a [`DeliveryLogEntry`] as a row to a CSV file.
///
/// Creates the file with headers if it does not already exist.
pub fn append_delivery_log(path: &Path, entry: &DeliveryLogEntry) -> Result<()> {
    let file_exists = path.exists();
    debug!(path = %path.display(), file_exists, "Appending delivery log row");

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().append(true).create(true).open(path)?;

    let mut writer = WriterBuilder::new()
        .has_headers(!file_exists)
        .from_writer(file);

    writer.serialize(entry)?;
    writer.flush()?;

    Ok(())
}
