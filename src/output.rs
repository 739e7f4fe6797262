use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::record::StatRecord;

/// Write `records` as a pretty-printed JSON array.
pub fn write_json(path: &Path, records: &[StatRecord]) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
    }
    let json = to_json(records)?;
    std::fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    info!("Wrote {} records to {}", records.len(), path.display());
    Ok(())
}

pub fn to_json(records: &[StatRecord]) -> Result<String> {
    serde_json::to_string_pretty(records).context("Failed to serialize records")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{StatField, StatValue, Stats};

    #[test]
    fn writes_array_to_nested_path() {
        let dir = std::env::temp_dir().join(format!("equipment_scraper_{}", std::process::id()));
        let path = dir.join("out").join("equipment_data.json");
        let records = vec![StatRecord {
            item_name: "Rune sword".into(),
            id: Some(1289),
            image: None,
            stats: Stats::new().with(StatField::Damage, StatValue::Number(300.0)),
        }];

        write_json(&path, &records).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let v: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(v[0]["itemName"], "Rune sword");
        assert_eq!(v[0]["stats"]["damage"], 300);
        assert!(text.contains("\n  {"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_list_is_empty_array() {
        assert_eq!(to_json(&[]).unwrap(), "[]");
    }
}
