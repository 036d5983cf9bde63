//! Weekly playtime collection.
//!
//! For each roster admin a graph image is fetched and its minutes are read
//! off by OCR. Both steps sit behind traits so the collection loop can be
//! driven by anything that produces bytes and minutes.

mod gametracker;
mod ocr;

pub use gametracker::GameTrackerFetcher;
pub use ocr::CommandOcr;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::fs;
use std::path::Path;

use crate::debug_log;
use crate::roster::Roster;
use crate::types::PlaytimeEntry;

/// Produces the raw playtime graph for one admin.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, name: &str) -> Result<Vec<u8>>;
}

/// Reads the minutes played from a graph image.
///
/// An image with no readable digits is 0 minutes, not an error.
pub trait MinutesReader: Send + Sync {
    fn read_minutes(&self, image: &[u8]) -> Result<u64>;
}

#[derive(Debug)]
pub struct CollectionFailure {
    pub name: String,
    pub error: anyhow::Error,
}

/// Outcome of one collection pass: successes in roster order plus every
/// admin that could not be collected.
#[derive(Debug, Default)]
pub struct PlaytimeCollection {
    pub results: Vec<PlaytimeEntry>,
    pub failures: Vec<CollectionFailure>,
}

/// Fetch and read playtime for every roster admin, one attempt each.
///
/// A failure for one admin is recorded and the loop moves on. When
/// `save_dir` is set the raw image is kept there under [`graph_file_name`].
pub async fn collect_playtime(
    roster: &Roster,
    fetcher: &dyn ImageFetcher,
    reader: &dyn MinutesReader,
    save_dir: Option<&Path>,
) -> PlaytimeCollection {
    let mut collection = PlaytimeCollection::default();

    for name in roster.names() {
        match collect_one(name, fetcher, reader, save_dir).await {
            Ok(minutes) => {
                debug_log::log("PLAYTIME", "OK", &format!("{name}: {minutes}"));
                collection.results.push(PlaytimeEntry::new(name.clone(), minutes));
            }
            Err(error) => {
                debug_log::log("PLAYTIME", "FAILED", &format!("{name}: {error:#}"));
                collection.failures.push(CollectionFailure {
                    name: name.clone(),
                    error,
                });
            }
        }
    }

    collection
}

/// `{name}.png` with the name made safe to use as a single file name.
///
/// Path separators, characters Windows rejects and control characters become
/// `_`, as does a leading `.`. `inprogress` is the OCR scratch image, so an
/// admin of that name gets `inprogress_.png`.
pub fn graph_file_name(name: &str) -> String {
    let mut stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    if stem.is_empty() || stem.starts_with('.') {
        stem.replace_range(..stem.chars().next().map_or(0, char::len_utf8), "_");
    }
    if stem == "inprogress" {
        stem.push('_');
    }

    format!("{stem}.png")
}

async fn collect_one(
    name: &str,
    fetcher: &dyn ImageFetcher,
    reader: &dyn MinutesReader,
    save_dir: Option<&Path>,
) -> Result<u64> {
    let image = fetcher
        .fetch(name)
        .await
        .context("Failed to fetch playtime graph")?;

    if let Some(dir) = save_dir {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create {}", dir.display()))?;
        let path = dir.join(graph_file_name(name));
        fs::write(&path, &image)
            .with_context(|| format!("Failed to save {}", path.display()))?;
    }

    reader
        .read_minutes(&image)
        .context("Failed to read minutes from graph")
}
