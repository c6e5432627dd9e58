// ==============================================================================
// parsers/vep_json.rs - Annotator JSON Lines Decoder
// ==============================================================================
// Description: Decodes the annotator's line-delimited JSON output
// Author: Matt Barham
// Created: 2026-10-19
// Modified: 2026-10-19
// Version: 1.0.0
// ==============================================================================

use std::path::Path;
use tracing::debug;

use crate::error::AnnotationError;

/// One annotator output record, passed through opaquely
pub type AnnotationRecord = serde_json::Map<String, serde_json::Value>;

/// Decode JSON-lines text into records, in line order.
///
/// Blank lines are skipped. A line that is not a JSON object fails the whole
/// batch with its 1-based line number.
pub fn decode_records(content: &str) -> Result<Vec<AnnotationRecord>, AnnotationError> {
    let mut records = Vec::new();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let record: AnnotationRecord = serde_json::from_str(line)
            .map_err(|source| AnnotationError::OutputDecode {
                line: idx + 1,
                source,
            })?;
        records.push(record);
    }

    Ok(records)
}

/// Read and decode an annotator output file.
///
/// A missing file is treated as empty output.
pub async fn read_records(path: &Path) -> Result<Vec<AnnotationRecord>, AnnotationError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("Annotator wrote no output file at {:?}", path);
            String::new()
        }
        Err(e) => return Err(e.into()),
    };

    let records = decode_records(&content)?;
    debug!("Decoded {} annotation records from {:?}", records.len(), path);
    Ok(records)
}
