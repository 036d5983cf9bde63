//! Persisted report formats.
//!
//! The static frontend and older dated archives read these files directly,
//! so field names, header rows and row order are fixed.

use anyhow::{Context, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs;
use std::path::Path;

use crate::types::{ActionCounts, ActionKind, ActionTally, CombinedRecord, PlaytimeEntry};

fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Pretty-printed JSON, creating parent directories as needed.
pub fn write_json<T>(data: &T, path: &Path) -> Result<()>
where
    T: Serialize + ?Sized,
{
    ensure_parent_dir(path)?;
    let json = simd_json::to_string_pretty(data).context("Failed to serialize JSON")?;
    fs::write(path, json).with_context(|| format!("Failed to write {}", path.display()))
}

/// Read a JSON file, returning `None` when it does not exist.
pub fn read_json<T>(path: &Path) -> Result<Option<T>>
where
    T: DeserializeOwned,
{
    let exists = path
        .try_exists()
        .with_context(|| format!("Failed to check {}", path.display()))?;
    if !exists {
        return Ok(None);
    }

    let mut bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let data = simd_json::from_slice(&mut bytes)
        .with_context(|| format!("Failed to parse {}", path.display()))?;
    Ok(Some(data))
}

fn counts_row(counts: &ActionCounts) -> impl Iterator<Item = String> + '_ {
    ActionKind::ALL
        .into_iter()
        .map(move |kind| counts.get(kind).to_string())
}

fn action_header(leading: &[&'static str]) -> Vec<&'static str> {
    leading
        .iter()
        .copied()
        .chain(ActionKind::ALL.into_iter().map(ActionKind::field_name))
        .collect()
}

/// `name,slap,kick,ban,rename,admin_chat`, one row per admin sorted by name.
pub fn write_action_tally_csv(tally: &ActionTally, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(action_header(&["name"]))?;
    for (name, counts) in tally {
        let row: Vec<String> = std::iter::once(name.clone())
            .chain(counts_row(counts))
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// `name,minutes,slap,kick,ban,rename,admin_chat`, one row per admin sorted by name.
pub fn write_combined_csv(record: &CombinedRecord, path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(action_header(&["name", "minutes"]))?;
    for (name, stats) in record {
        let row: Vec<String> = [name.clone(), stats.minutes.to_string()]
            .into_iter()
            .chain(counts_row(&stats.actions))
            .collect();
        writer.write_record(&row)?;
    }

    writer.flush()?;
    Ok(())
}

/// `name,minutes` rows in the order given.
pub fn write_playtime_csv(entries: &[PlaytimeEntry], path: &Path) -> Result<()> {
    ensure_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    if entries.is_empty() {
        // serialize() only emits the header alongside the first row
        writer.write_record(["name", "minutes"])?;
    }
    for entry in entries {
        writer.serialize(entry)?;
    }

    writer.flush()?;
    Ok(())
}

pub fn read_playtime_csv(path: &Path) -> Result<Vec<PlaytimeEntry>> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;

    let mut entries = Vec::new();
    for row in reader.deserialize::<PlaytimeEntry>() {
        entries.push(row.with_context(|| format!("Malformed row in {}", path.display()))?);
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CombinedStats;
    use tempfile::TempDir;

    fn sample_tally() -> ActionTally {
        ActionTally::from([
            (
                "chani".to_string(),
                ActionCounts {
                    slap: 1,
                    admin_chat: 1,
                    ..Default::default()
                },
            ),
            (
                "BaRoN".to_string(),
                ActionCounts {
                    kick: 1,
                    ..Default::default()
                },
            ),
        ])
    }

    #[test]
    fn action_tally_csv_layout() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("weekly").join("admin_actions.csv");

        write_action_tally_csv(&sample_tally(), &path).expect("write csv");

        let text = fs::read_to_string(&path).expect("read csv");
        assert_eq!(
            text,
            "name,slap,kick,ban,rename,admin_chat\nBaRoN,0,1,0,0,0\nchani,1,0,0,0,1\n"
        );
    }

    #[test]
    fn combined_csv_layout() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("combined.csv");
        let record = CombinedRecord::from([(
            "x".to_string(),
            CombinedStats {
                minutes: 30,
                actions: ActionCounts {
                    ban: 2,
                    ..Default::default()
                },
            },
        )]);

        write_combined_csv(&record, &path).expect("write csv");

        let text = fs::read_to_string(&path).expect("read csv");
        assert_eq!(
            text,
            "name,minutes,slap,kick,ban,rename,admin_chat\nx,30,0,0,2,0,0\n"
        );
    }

    #[test]
    fn playtime_csv_keeps_given_order() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("weekly_results.csv");
        let entries = vec![PlaytimeEntry::new("b", 1), PlaytimeEntry::new("a", 2)];

        write_playtime_csv(&entries, &path).expect("write csv");

        assert_eq!(
            fs::read_to_string(&path).expect("read csv"),
            "name,minutes\nb,1\na,2\n"
        );
        assert_eq!(read_playtime_csv(&path).expect("read back"), entries);
    }

    #[test]
    fn empty_playtime_csv_still_has_header() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("empty.csv");

        write_playtime_csv(&[], &path).expect("write csv");

        assert_eq!(fs::read_to_string(&path).expect("read csv"), "name,minutes\n");
        assert!(read_playtime_csv(&path).expect("read back").is_empty());
    }

    #[test]
    fn combined_json_uses_flat_field_names() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("combined_stats.json");
        let record = CombinedRecord::from([(
            "y".to_string(),
            CombinedStats {
                minutes: 0,
                actions: ActionCounts {
                    slap: 1,
                    ..Default::default()
                },
            },
        )]);

        write_json(&record, &path).expect("write json");

        let text = fs::read_to_string(&path).expect("read json");
        for field in ["minutes", "slap", "kick", "ban", "rename", "admin_chat"] {
            assert!(text.contains(&format!("\"{field}\"")), "missing {field}: {text}");
        }
        assert!(!text.contains("actions"));

        let back: CombinedRecord = read_json(&path).expect("read json").expect("present");
        assert_eq!(back, record);
    }

    #[test]
    fn tally_json_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("admin_actions.json");

        write_json(&sample_tally(), &path).expect("write json");
        let back: ActionTally = read_json(&path).expect("read json").expect("present");

        assert_eq!(back, sample_tally());
    }

    #[test]
    fn read_json_distinguishes_absent_from_empty() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("weekly_results.json");

        let absent: Option<Vec<PlaytimeEntry>> = read_json(&path).expect("read absent");
        assert!(absent.is_none());

        write_json::<[PlaytimeEntry]>(&[], &path).expect("write empty");
        let empty: Option<Vec<PlaytimeEntry>> = read_json(&path).expect("read empty");
        assert_eq!(empty, Some(Vec::new()));
    }

    #[test]
    fn read_json_under_a_file_is_an_error_not_absent() {
        let dir = TempDir::new().expect("tempdir");
        let frontend = dir.path().join("frontend");
        fs::write(&frontend, "not a directory").expect("write file");

        let result = read_json::<Vec<PlaytimeEntry>>(&frontend.join("weekly_results.json"));
        assert!(result.is_err());
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("admin_actions.json");
        fs::write(&path, "{ not json").expect("write");

        assert!(read_json::<ActionTally>(&path).is_err());
    }
}
