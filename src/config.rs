use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::fs;
use std::path::PathBuf;

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub paths: PathsConfig,
    pub gametracker: GameTrackerConfig,
    pub ocr: OcrConfig,
    pub formatting: FormattingConfig,
}

/// Where inputs are read from and reports are written to. Relative paths
/// resolve against the working directory.
#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct PathsConfig {
    pub log_dir: PathBuf,
    pub roster: PathBuf,
    /// Dated JSON/CSV archives
    pub archive_dir: PathBuf,
    /// Latest JSON read by the static frontend, plus the playtime history
    pub frontend_dir: PathBuf,
    pub images_dir: PathBuf,
    /// Keep each downloaded graph in `images_dir` as `{name}.png`
    pub keep_images: bool,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct GameTrackerConfig {
    pub url: String,
    /// Game server address, `ip:port`
    pub host: String,
    /// Graph time window, e.g. `-1w`
    pub start: String,
    pub user_agent: String,
    pub timeout_seconds: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct OcrConfig {
    pub command: String,
    /// `{image}` is replaced by the path of the preprocessed image
    pub args: Vec<String>,
    /// left, top, right, bottom
    pub crop_box: [u32; 4],
    pub scale_factor: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct FormattingConfig {
    pub number_comma: bool,
    pub locale: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            log_dir: PathBuf::from("data/logs"),
            roster: PathBuf::from("data/admins.txt"),
            archive_dir: PathBuf::from("data/weekly"),
            frontend_dir: PathBuf::from("docs/data"),
            images_dir: PathBuf::from("images"),
            keep_images: true,
        }
    }
}

impl Default for GameTrackerConfig {
    fn default() -> Self {
        Self {
            url: "https://cache.gametracker.com/images/graphs/player_time.php".to_string(),
            host: "149.202.87.35:27015".to_string(),
            start: "-1w".to_string(),
            user_agent: "GTStatsBot/1.0".to_string(),
            timeout_seconds: 20,
        }
    }
}

impl Default for OcrConfig {
    fn default() -> Self {
        Self {
            command: "tesseract".to_string(),
            args: ["{image}", "stdout", "--psm", "6"]
                .into_iter()
                .map(String::from)
                .collect(),
            crop_box: [39, 0, 260, 152],
            scale_factor: 2,
        }
    }
}

impl Default for FormattingConfig {
    fn default() -> Self {
        Self {
            number_comma: true,
            locale: "en".to_string(),
        }
    }
}

thread_local! {
    static TEST_CONFIG_PATH: RefCell<Option<PathBuf>> = const { RefCell::new(None) };
}

#[cfg(test)]
pub fn set_test_config_path(path: PathBuf) {
    TEST_CONFIG_PATH.with(|p| *p.borrow_mut() = Some(path));
}

impl Config {
    pub fn config_path() -> Result<PathBuf> {
        #[cfg(test)]
        {
            if let Some(path) = TEST_CONFIG_PATH.with(|p| p.borrow().clone()) {
                return Ok(path);
            }
        }

        Ok(dirs::home_dir()
            .context("Could not find home directory")?
            .join(".adminwatch.toml"))
    }

    pub fn load() -> Result<Option<Config>> {
        let config_path = Self::config_path()?;

        if !config_path
            .try_exists()
            .context("Failed to check config file")?
        {
            return Ok(None);
        }

        let content = fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        Ok(Some(config))
    }

    pub fn save(&self, silent: bool) -> Result<()> {
        let config_path = Self::config_path()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, content).context("Failed to write config file")?;

        if !silent {
            println!("✅ Configuration saved to: {}", config_path.display());
        }

        Ok(())
    }
}

// CLI helper functions
pub fn create_default_config(overwrite: bool) -> Result<()> {
    let config = Config::default();
    if !std::fs::exists(Config::config_path()?)? || overwrite {
        config.save(true)?;

        println!("📝 Created default configuration file.");
        println!("📍 Adjust paths and the game server with:");
        println!("   adminwatch config set host 1.2.3.4:27015");
        println!("or");
        println!("   {}", Config::config_path()?.display());
    } else {
        println!("Configuration already exists.  Pass `--overwrite` to overwrite.");
    }

    Ok(())
}

fn describe_config(config: &Config) -> Vec<String> {
    let [left, top, right, bottom] = config.ocr.crop_box;
    vec![
        format!("Log Dir: {}", config.paths.log_dir.display()),
        format!("Roster: {}", config.paths.roster.display()),
        format!("Archive Dir: {}", config.paths.archive_dir.display()),
        format!("Frontend Dir: {}", config.paths.frontend_dir.display()),
        format!("Images Dir: {}", config.paths.images_dir.display()),
        format!("Keep Images: {}", config.paths.keep_images),
        format!("Graph URL: {}", config.gametracker.url),
        format!("Host: {}", config.gametracker.host),
        format!("Start: {}", config.gametracker.start),
        format!("User Agent: {}", config.gametracker.user_agent),
        format!("Timeout: {}s", config.gametracker.timeout_seconds),
        format!(
            "OCR Command: {} {}",
            config.ocr.command,
            config.ocr.args.join(" ")
        ),
        format!("Crop Box: {left},{top},{right},{bottom}"),
        format!("Scale Factor: {}", config.ocr.scale_factor),
        format!("Number Comma: {}", config.formatting.number_comma),
        format!("Locale: {}", config.formatting.locale),
    ]
}

pub fn show_config() -> Result<()> {
    match Config::load()? {
        Some(config) => {
            println!("🔧 Current configuration:");
            for line in describe_config(&config) {
                println!("   {line}");
            }
        }
        None => {
            println!("❌ No configuration file found.");
            println!("   Run 'adminwatch config init' to create one.");
        }
    }
    Ok(())
}

/// `left,top,right,bottom` in pixels.
fn parse_crop_box(value: &str) -> Result<[u32; 4]> {
    let parts = value
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .context("Invalid crop box. Use 'left,top,right,bottom'")?;

    let &[left, top, right, bottom] = parts.as_slice() else {
        anyhow::bail!("Invalid crop box. Use 'left,top,right,bottom'");
    };
    if right <= left || bottom <= top {
        anyhow::bail!("Crop box must have right > left and bottom > top");
    }
    Ok([left, top, right, bottom])
}

fn parse_bool(value: &str) -> Result<bool> {
    value
        .parse::<bool>()
        .context("Invalid boolean value. Use 'true' or 'false'")
}

pub fn set_config_value(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?.unwrap_or_default();

    match key {
        "log-dir" => config.paths.log_dir = PathBuf::from(value),
        "roster" => config.paths.roster = PathBuf::from(value),
        "archive-dir" => config.paths.archive_dir = PathBuf::from(value),
        "frontend-dir" => config.paths.frontend_dir = PathBuf::from(value),
        "images-dir" => config.paths.images_dir = PathBuf::from(value),
        "keep-images" => config.paths.keep_images = parse_bool(value)?,
        "url" => {
            reqwest::Url::parse(value).context("Invalid graph URL")?;
            config.gametracker.url = value.to_string();
        }
        "host" => config.gametracker.host = value.to_string(),
        "start" => config.gametracker.start = value.to_string(),
        "user-agent" => config.gametracker.user_agent = value.to_string(),
        "timeout-seconds" => {
            config.gametracker.timeout_seconds =
                value.parse::<u64>().context("Invalid number value")?;
        }
        "ocr-command" => config.ocr.command = value.to_string(),
        "crop-box" => config.ocr.crop_box = parse_crop_box(value)?,
        "scale-factor" => {
            let factor = value.parse::<u32>().context("Invalid number value")?;
            if factor == 0 {
                anyhow::bail!("Scale factor must be at least 1");
            }
            config.ocr.scale_factor = factor;
        }
        "number-comma" => config.formatting.number_comma = parse_bool(value)?,
        "locale" => config.formatting.locale = value.to_string(),
        _ => anyhow::bail!("Unknown config key: {}", key),
    }

    config.save(false)?;
    Ok(())
}
