use anyhow::{Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::error::StatsError;

/// The admins whose actions and playtime are tracked.
///
/// Names are matched exactly as written, there is no case folding or
/// whitespace normalization beyond trimming each roster line.
#[derive(Debug, Clone, Default)]
pub struct Roster {
    names: Vec<String>,
    index: HashSet<String>,
}

impl Roster {
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut roster = Roster::default();
        for name in names {
            let name = name.into();
            if roster.index.insert(name.clone()) {
                roster.names.push(name);
            }
        }
        roster
    }

    /// Parse roster text: one name per line, blank and `#` lines skipped.
    pub fn parse(text: &str) -> Self {
        Self::from_names(
            text.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty() && !line.starts_with('#')),
        )
    }

    /// Load the roster file, failing with [`StatsError`] when it is absent or
    /// lists nobody.
    pub fn load(path: &Path) -> Result<Self> {
        let exists = path
            .try_exists()
            .with_context(|| format!("Failed to check roster {}", path.display()))?;
        if !exists {
            return Err(StatsError::missing("admin roster", path).into());
        }

        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read roster {}", path.display()))?;
        let roster = Self::parse(&text);

        if roster.is_empty() {
            return Err(StatsError::EmptyRoster {
                path: path.to_path_buf(),
            }
            .into());
        }

        Ok(roster)
    }

    /// Names in file order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn parse_skips_blank_and_comment_lines() {
        let roster = Roster::parse("# admins\nchani\n\n  BaRoN  \n#US-B\nR()CK~KI||3R\n");
        assert_eq!(roster.names(), ["chani", "BaRoN", "R()CK~KI||3R"]);
        assert!(!roster.names().iter().any(|name| name == "baron"));
    }

    #[test]
    fn duplicate_names_keep_first_position() {
        let roster = Roster::parse("b\na\nb\n");
        assert_eq!(roster.names(), ["b", "a"]);
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = TempDir::new().expect("tempdir");
        let err = Roster::load(&dir.path().join("admins.txt")).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StatsError>(),
            Some(StatsError::MissingInput { what: "admin roster", .. })
        ));
    }

    #[test]
    fn load_fails_when_roster_parent_is_a_file() {
        let dir = TempDir::new().expect("tempdir");
        let data = dir.path().join("data");
        fs::write(&data, "not a directory").expect("write file");

        let err = Roster::load(&data.join("admins.txt")).unwrap_err();
        assert!(err.downcast_ref::<StatsError>().is_none(), "{err:#}");
    }

    #[test]
    fn load_reports_roster_without_names() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("admins.txt");
        fs::write(&path, "# nobody yet\n\n").expect("write roster");

        let err = Roster::load(&path).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<StatsError>(),
            Some(StatsError::EmptyRoster { .. })
        ));
    }

    #[test]
    fn load_reads_names() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("admins.txt");
        fs::write(&path, "chani\nBaRoN\n").expect("write roster");

        let roster = Roster::load(&path).expect("load roster");
        assert_eq!(roster.names(), ["chani", "BaRoN"]);
    }
}
