//! Opt-in trace log for diagnosing a run.
//!
//! Enable by setting environment variable: ADMINWATCH_DEBUG_LOG=1
//! Logs are written to `adminwatch-debug.log` in the system temp directory.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

static ENABLED: AtomicBool = AtomicBool::new(false);
static START_TIME: OnceLock<Instant> = OnceLock::new();
static LOG_FILE: OnceLock<std::sync::Mutex<std::fs::File>> = OnceLock::new();

pub fn log_path() -> PathBuf {
    std::env::temp_dir().join("adminwatch-debug.log")
}

/// Initialize debug logging. Call once at startup.
pub fn init() {
    if std::env::var("ADMINWATCH_DEBUG_LOG").is_err() {
        return;
    }

    let opened = OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .open(log_path());

    match opened {
        Ok(file) => {
            LOG_FILE.get_or_init(|| std::sync::Mutex::new(file));
            START_TIME.get_or_init(Instant::now);
            ENABLED.store(true, Ordering::SeqCst);
            log("DEBUG", "init", "Debug logging initialized");
        }
        Err(e) => eprintln!("⚠️  Could not open {}: {e}", log_path().display()),
    }
}

/// Check if debug logging is enabled.
#[inline]
pub fn is_enabled() -> bool {
    ENABLED.load(Ordering::Relaxed)
}

/// Log a debug message with elapsed time and thread ID.
pub fn log(category: &str, action: &str, detail: &str) {
    if !is_enabled() {
        return;
    }

    let elapsed = START_TIME
        .get()
        .map(|s| s.elapsed().as_millis())
        .unwrap_or(0);
    let thread_id = std::thread::current().id();

    let msg = format!(
        "[{:>8}ms] [{:?}] [{}] {} - {}\n",
        elapsed, thread_id, category, action, detail
    );

    if let Some(file_mutex) = LOG_FILE.get()
        && let Ok(mut file) = file_mutex.lock()
    {
        let _ = file.write_all(msg.as_bytes());
        let _ = file.flush();
    }
}

/// RAII guard that logs a stage's start and, when dropped, its duration.
pub struct StageTimer {
    stage: &'static str,
    started: Instant,
}

impl StageTimer {
    pub fn start(stage: &'static str) -> Self {
        log("STAGE", "START", stage);
        Self {
            stage,
            started: Instant::now(),
        }
    }
}

impl Drop for StageTimer {
    fn drop(&mut self) {
        if is_enabled() {
            log(
                "STAGE",
                "END",
                &format!("{} ({}ms)", self.stage, self.started.elapsed().as_millis()),
            );
        }
    }
}
