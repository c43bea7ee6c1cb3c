//! CSV loader for score sheets and coordinator directories.

use anyhow::{Context, Result};
use std::path::Path;
use tracing::debug;

use crate::records::{Cell, RawTable};

/// Decodes a CSV export of the score sheet into a [`RawTable`].
///
/// The delimiter (`,` or `;`) is taken from the header line. Rows may be
/// shorter or longer than the header; missing cells read as empty.
///
/// # Errors
///
/// Returns an error if the bytes are not valid CSV.
pub fn parse_table(bytes: &[u8]) -> Result<RawTable> {
    let delimiter = sniff_delimiter(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(bytes);

    let headers: Vec<String> = reader
        .headers()
        .context("failed to read CSV header row")?
        .iter()
        .map(clean_header)
        .collect();

    let mut rows = Vec::new();
    for (line, result) in reader.records().enumerate() {
        let record = result.with_context(|| format!("malformed CSV row {}", line + 2))?;
        rows.push(record.iter().map(Cell::from).collect());
    }

    debug!(columns = headers.len(), rows = rows.len(), "Parsed CSV table");
    Ok(RawTable::new(headers, rows))
}

/// Reads and parses a CSV file from disk.
pub fn load_table(path: &Path) -> Result<RawTable> {
    let bytes =
        std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    parse_table(&bytes).with_context(|| format!("failed to parse {}", path.display()))
}

/// `;` when the header line has more semicolons than commas, `,` otherwise.
pub fn sniff_delimiter(bytes: &[u8]) -> u8 {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    if semicolons > commas { b';' } else { b',' }
}

/// Strips byte-order marks and non-breaking spaces, then trims.
pub fn clean_header(raw: &str) -> String {
    raw.replace(['\u{feff}', '\u{a0}'], "").trim().to_string()
}
