use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

use crate::report;
use crate::types::{PlaytimeEntry, PlaytimeRecord};

/// Last observed playtime per admin, persisted between runs.
///
/// The playtime source already reports a rolling window, so new observations
/// replace the stored value instead of being added to it.
#[derive(Debug, Clone)]
pub struct PlaytimeHistory {
    path: PathBuf,
    record: PlaytimeRecord,
}

impl PlaytimeHistory {
    /// Read the history CSV at `path`. A missing file is a first run and
    /// gives an empty history; a file that exists but cannot be parsed is an
    /// error.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        let exists = path
            .try_exists()
            .with_context(|| format!("Failed to check playtime history {}", path.display()))?;

        let record = if exists {
            report::read_playtime_csv(&path)
                .with_context(|| format!("Failed to load playtime history {}", path.display()))?
                .into_iter()
                .map(|entry| (entry.name, entry.minutes))
                .collect()
        } else {
            PlaytimeRecord::new()
        };

        Ok(Self { path, record })
    }

    /// Overwrite the stored minutes of every admin in `observed`; everyone
    /// else keeps their previous value.
    pub fn update<I, S>(&mut self, observed: I) -> &PlaytimeRecord
    where
        I: IntoIterator<Item = (S, u64)>,
        S: Into<String>,
    {
        for (name, minutes) in observed {
            self.record.insert(name.into(), minutes);
        }
        &self.record
    }

    pub fn record(&self) -> &PlaytimeRecord {
        &self.record
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Entries ordered by minutes descending, ties broken by name.
    pub fn ranked(&self) -> Vec<PlaytimeEntry> {
        let mut entries: Vec<PlaytimeEntry> = self
            .record
            .iter()
            .map(|(name, minutes)| PlaytimeEntry::new(name.clone(), *minutes))
            .collect();
        entries.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.name.cmp(&b.name)));
        entries
    }

    /// Write the history back as `name,minutes` rows in [`ranked`](Self::ranked) order.
    pub fn persist(&self) -> Result<()> {
        report::write_playtime_csv(&self.ranked(), &self.path)
            .with_context(|| format!("Failed to save playtime history {}", self.path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn history_in(dir: &TempDir) -> PlaytimeHistory {
        PlaytimeHistory::load(dir.path().join("leaderboard_history.csv")).expect("load history")
    }

    #[test]
    fn missing_file_is_an_empty_history() {
        let dir = TempDir::new().expect("tempdir");
        assert!(history_in(&dir).record().is_empty());
    }

    #[test]
    fn update_overwrites_instead_of_adding() {
        let dir = TempDir::new().expect("tempdir");
        let mut history = history_in(&dir);

        history.update([("a", 10)]);
        let record = history.update([("a", 5)]);

        assert_eq!(record.get("a"), Some(&5));
    }

    #[test]
    fn update_leaves_unobserved_admins_alone() {
        let dir = TempDir::new().expect("tempdir");
        let mut history = history_in(&dir);
        history.update([("a", 10), ("b", 20)]);

        let record = history.update([("b", 1)]);
        assert_eq!(record.get("a"), Some(&10));
        assert_eq!(record.get("b"), Some(&1));
    }

    #[test]
    fn persist_orders_by_minutes_descending() {
        let dir = TempDir::new().expect("tempdir");
        let mut history = history_in(&dir);
        history.update([("low", 5), ("high", 300), ("mid", 42), ("also-mid", 42)]);
        history.persist().expect("persist");

        let text = fs::read_to_string(history.path()).expect("read csv");
        assert_eq!(
            text,
            "name,minutes\nhigh,300\nalso-mid,42\nmid,42\nlow,5\n"
        );
    }

    #[test]
    fn persisted_history_round_trips() {
        let dir = TempDir::new().expect("tempdir");
        let mut history = history_in(&dir);
        history.update([("chani", 120), ("R()CK~KI||3R", 7)]);
        history.persist().expect("persist");

        let reloaded = history_in(&dir);
        assert_eq!(reloaded.record(), history.record());
    }

    #[test]
    fn unreachable_history_is_an_error_not_a_first_run() {
        let dir = TempDir::new().expect("tempdir");
        let frontend = dir.path().join("frontend");
        fs::write(&frontend, "not a directory").expect("write file");

        assert!(PlaytimeHistory::load(frontend.join("leaderboard_history.csv")).is_err());
    }

    #[test]
    fn malformed_history_is_an_error() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("leaderboard_history.csv");
        fs::write(&path, "name,minutes\nchani,lots\n").expect("write csv");

        assert!(PlaytimeHistory::load(path).is_err());
    }
}
