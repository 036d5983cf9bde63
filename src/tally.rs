use anyhow::{Context, Result};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

use crate::debug_log;
use crate::error::StatsError;
use crate::extractor::extract_actions;
use crate::roster::Roster;
use crate::types::{ActionCounts, ActionTally};

/// A tally with an all-zero entry for every roster admin.
pub fn seed_tally(roster: &Roster) -> ActionTally {
    roster
        .names()
        .iter()
        .map(|name| (name.clone(), ActionCounts::default()))
        .collect()
}

/// Count admin actions over the lines of one source.
///
/// The result covers exactly the roster: actors who are not on it are
/// ignored even when a line otherwise matches.
pub fn tally_lines<I, S>(lines: I, roster: &Roster) -> ActionTally
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tally = seed_tally(roster);

    for line in lines {
        for action in extract_actions(line.as_ref()) {
            if let Some(counts) = tally.get_mut(action.actor) {
                counts.increment(action.kind);
            }
        }
    }

    tally
}

/// Tally a single log file. Bytes that are not valid UTF-8 are replaced
/// rather than failing the file; a file that cannot be read is an error.
pub fn tally_file(path: &Path, roster: &Roster) -> Result<ActionTally> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read log file {}", path.display()))?;
    let text = String::from_utf8_lossy(&bytes);

    let tally = tally_lines(text.lines(), roster);
    debug_log::log(
        "TALLY",
        "FILE",
        &format!("{} ({} bytes)", path.display(), bytes.len()),
    );
    Ok(tally)
}

/// Per-admin, per-field sum of every input tally.
///
/// Admins missing from an input contribute nothing for it, so the result is
/// independent of input order and grouping.
pub fn merge_tallies<I>(tallies: I) -> ActionTally
where
    I: IntoIterator<Item = ActionTally>,
{
    let mut merged = ActionTally::new();
    for tally in tallies {
        for (name, counts) in tally {
            *merged.entry(name).or_default() += counts;
        }
    }
    merged
}

/// Merged tally for a whole log directory.
#[derive(Debug, Clone)]
pub struct LogDirTally {
    pub tally: ActionTally,
    pub files: Vec<PathBuf>,
}

/// `*.log` files directly inside `dir`, sorted by path.
pub fn discover_log_files(dir: &Path) -> Result<Vec<PathBuf>> {
    match fs::metadata(dir) {
        Ok(meta) if meta.is_dir() => {}
        Ok(_) => anyhow::bail!("Log directory {} is not a directory", dir.display()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(StatsError::missing("log directory", dir).into());
        }
        Err(e) => {
            return Err(e).with_context(|| format!("Failed to access log directory {}", dir.display()));
        }
    }

    let pattern = format!(
        "{}/*.log",
        glob::Pattern::escape(&dir.to_string_lossy())
    );

    let mut files = Vec::new();
    for entry in glob::glob(&pattern)? {
        let path = entry?;
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    Ok(files)
}

/// Tally every log file in `dir` and merge the results.
///
/// Files are parsed in parallel; the first unreadable file fails the whole
/// directory. An empty directory still yields the zero-seeded roster tally.
pub fn tally_log_dir(dir: &Path, roster: &Roster) -> Result<LogDirTally> {
    let files = discover_log_files(dir)?;

    let tally = files
        .par_iter()
        .map(|path| tally_file(path, roster))
        .try_reduce(
            || seed_tally(roster),
            |acc, tally| Ok(merge_tallies([acc, tally])),
        )?;

    Ok(LogDirTally { tally, files })
}
