//! The three report stages: admin actions from logs, playtime from graphs,
//! and the combined report built from the latest output of both.

use anyhow::Result;
use std::path::PathBuf;

use crate::aggregate::combine;
use crate::config::PathsConfig;
use crate::debug_log::{self, StageTimer};
use crate::error::StatsError;
use crate::history::PlaytimeHistory;
use crate::playtime::{self, ImageFetcher, MinutesReader, PlaytimeCollection};
use crate::report;
use crate::roster::Roster;
use crate::tally::tally_log_dir;
use crate::types::{ActionTally, CombinedRecord, PlaytimeEntry};

/// File locations for one run, dated with the run's UTC day.
#[derive(Debug, Clone)]
pub struct RunLayout {
    pub paths: PathsConfig,
    pub date: String,
}

impl RunLayout {
    pub fn new(paths: PathsConfig, date: impl Into<String>) -> Self {
        Self {
            paths,
            date: date.into(),
        }
    }

    fn archive(&self, stem: &str, ext: &str) -> PathBuf {
        self.paths
            .archive_dir
            .join(format!("{stem}_{}.{ext}", self.date))
    }

    pub fn actions_archive_json(&self) -> PathBuf {
        self.archive("admin_actions", "json")
    }

    pub fn actions_archive_csv(&self) -> PathBuf {
        self.archive("admin_actions", "csv")
    }

    pub fn actions_latest_json(&self) -> PathBuf {
        self.paths.frontend_dir.join("admin_actions.json")
    }

    pub fn history_csv(&self) -> PathBuf {
        self.paths.frontend_dir.join("leaderboard_history.csv")
    }

    pub fn weekly_csv(&self) -> PathBuf {
        self.paths
            .frontend_dir
            .join(format!("{}_weekly_results.csv", self.date))
    }

    pub fn weekly_json(&self) -> PathBuf {
        self.paths.frontend_dir.join("weekly_results.json")
    }

    pub fn combined_archive_json(&self) -> PathBuf {
        self.archive("combined_stats", "json")
    }

    pub fn combined_archive_csv(&self) -> PathBuf {
        self.archive("combined_stats", "csv")
    }

    pub fn combined_latest_json(&self) -> PathBuf {
        self.paths.frontend_dir.join("combined_stats.json")
    }
}

#[derive(Debug)]
pub struct ActionsOutcome {
    pub tally: ActionTally,
    pub log_files: usize,
    pub written: Vec<PathBuf>,
}

/// Tally admin actions across the log directory and write the dated archive
/// plus the frontend copy.
pub fn run_actions(layout: &RunLayout) -> Result<ActionsOutcome> {
    let _timer = StageTimer::start("actions");

    let roster = Roster::load(&layout.paths.roster)?;
    let dir_tally = tally_log_dir(&layout.paths.log_dir, &roster)?;

    let written = vec![
        layout.actions_archive_json(),
        layout.actions_archive_csv(),
        layout.actions_latest_json(),
    ];
    report::write_json(&dir_tally.tally, &written[0])?;
    report::write_action_tally_csv(&dir_tally.tally, &written[1])?;
    report::write_json(&dir_tally.tally, &written[2])?;

    Ok(ActionsOutcome {
        tally: dir_tally.tally,
        log_files: dir_tally.files.len(),
        written,
    })
}

#[derive(Debug)]
pub struct PlaytimeOutcome {
    pub collection: PlaytimeCollection,
    pub written: Vec<PathBuf>,
}

/// Collect this week's playtime, fold it into the history, and write the
/// weekly results. Admins that failed keep their previous history value.
pub async fn run_playtime(
    layout: &RunLayout,
    fetcher: &dyn ImageFetcher,
    reader: &dyn MinutesReader,
) -> Result<PlaytimeOutcome> {
    let _timer = StageTimer::start("playtime");

    let roster = Roster::load(&layout.paths.roster)?;
    let mut history = PlaytimeHistory::load(layout.history_csv())?;

    let save_dir = layout
        .paths
        .keep_images
        .then_some(layout.paths.images_dir.as_path());
    let collection = playtime::collect_playtime(&roster, fetcher, reader, save_dir).await;

    history.update(
        collection
            .results
            .iter()
            .map(|entry| (entry.name.clone(), entry.minutes)),
    );
    history.persist()?;

    let weekly_csv = layout.weekly_csv();
    let weekly_json = layout.weekly_json();
    report::write_playtime_csv(&collection.results, &weekly_csv)?;
    report::write_json(&collection.results, &weekly_json)?;

    debug_log::log(
        "PLAYTIME",
        "DONE",
        &format!(
            "{} collected, {} failed, {} in history",
            collection.results.len(),
            collection.failures.len(),
            history.record().len()
        ),
    );

    Ok(PlaytimeOutcome {
        collection,
        written: vec![history.path().to_path_buf(), weekly_csv, weekly_json],
    })
}

#[derive(Debug)]
pub struct CombineOutcome {
    pub combined: CombinedRecord,
    pub written: Vec<PathBuf>,
}

/// Join the latest weekly playtime with the latest action tally.
///
/// Either input being absent is a [`StatsError::MissingInput`]; an input
/// that exists but is empty is combined as-is.
pub fn run_combine(layout: &RunLayout) -> Result<CombineOutcome> {
    let _timer = StageTimer::start("combine");

    let weekly_path = layout.weekly_json();
    let actions_path = layout.actions_latest_json();

    let playtime: Vec<PlaytimeEntry> = report::read_json(&weekly_path)?
        .ok_or_else(|| StatsError::missing("weekly playtime results", &weekly_path))?;
    let tally: ActionTally = report::read_json(&actions_path)?
        .ok_or_else(|| StatsError::missing("admin action tally", &actions_path))?;

    let combined = combine(&playtime, &tally);

    let written = vec![
        layout.combined_archive_json(),
        layout.combined_archive_csv(),
        layout.combined_latest_json(),
    ];
    report::write_json(&combined, &written[0])?;
    report::write_combined_csv(&combined, &written[1])?;
    report::write_json(&combined, &written[2])?;

    Ok(CombineOutcome { combined, written })
}
