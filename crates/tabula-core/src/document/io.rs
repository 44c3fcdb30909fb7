use super::Spreadsheet;
use crate::error::{Result, TabulaError};
use std::fs;
use std::path::Path;

pub const MAX_DOCUMENT_BYTES: u64 = 16 * 1_048_576; // 16 MiB

/// Load a spreadsheet document from a JSON file.
pub fn load_spreadsheet(path: &Path) -> Result<Spreadsheet> {
    let meta = fs::metadata(path)?;
    if meta.len() > MAX_DOCUMENT_BYTES {
        return Err(TabulaError::DocumentTooLarge {
            path: path.display().to_string(),
            size: meta.len(),
            max: MAX_DOCUMENT_BYTES,
        });
    }
    let content = fs::read_to_string(path)?;
    let doc: Spreadsheet = serde_json::from_str(&content)?;
    tracing::debug!(path = %path.display(), cells = doc.data.len(), "loaded spreadsheet");
    Ok(doc)
}

/// Write a spreadsheet document as pretty-printed JSON.
pub fn save_spreadsheet(path: &Path, doc: &Spreadsheet) -> Result<()> {
    let content = serde_json::to_string_pretty(doc)?;
    fs::write(path, content + "\n")?;
    tracing::debug!(path = %path.display(), cells = doc.data.len(), "saved spreadsheet");
    Ok(())
}
