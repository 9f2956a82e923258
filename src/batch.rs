use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use crate::error::ExtractError;
use crate::records::BaseRecord;

pub fn parse_base_batch(text: &str) -> Result<Vec<BaseRecord>, ExtractError> {
    Ok(serde_json::from_str(text)?)
}

pub fn read_base_batch(path: &Path) -> Result<Vec<BaseRecord>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Missing base batch at {}", path.display()))?;
    let records = parse_base_batch(&text).with_context(|| format!("Reading {}", path.display()))?;
    info!("Loaded {} base records from {}", records.len(), path.display());
    Ok(records)
}

/// Write records as a pretty-printed JSON array, creating parent directories.
pub fn write_json<T: Serialize>(path: &Path, records: &[T]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(records)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_array_batch_is_rejected() {
        let err = parse_base_batch(r#"{"slug": "acme"}"#).unwrap_err();
        assert!(matches!(err, ExtractError::InvalidBatch(_)));
        assert!(parse_base_batch("not json").is_err());
    }

    #[test]
    fn record_without_slug_is_rejected() {
        let text = r#"[{"kind": "person", "display_name": "Jane", "detail_url": null,
            "thumbnail_url": null, "thumbnail_alt_text": null, "raw_tags": [],
            "derived_tags": {"card_tags": []}}]"#;
        assert!(matches!(parse_base_batch(text), Err(ExtractError::InvalidBatch(_))));
    }

    #[test]
    fn written_batch_reads_back() {
        let listing = std::fs::read_to_string("tests/fixtures/people_list.html").unwrap();
        let records = crate::parser::listing::extract_listing(
            crate::records::EntityKind::Person,
            &listing,
        )
        .unwrap()
        .records;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bronze").join("people_list.json");
        write_json(&path, &records).unwrap();
        assert_eq!(read_base_batch(&path).unwrap(), records);
    }
}
