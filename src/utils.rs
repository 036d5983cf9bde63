use chrono::Utc;
use num_format::{Locale, ToFormattedString};

use crate::config::FormattingConfig;
use crate::types::CombinedRecord;

#[derive(Clone)]
pub struct NumberFormatOptions {
    pub use_comma: bool,
    pub locale: String,
}

impl From<&FormattingConfig> for NumberFormatOptions {
    fn from(config: &FormattingConfig) -> Self {
        Self {
            use_comma: config.number_comma,
            locale: config.locale.clone(),
        }
    }
}

pub fn format_number(n: impl Into<u64>, options: &NumberFormatOptions) -> String {
    let n: u64 = n.into();
    let locale = match options.locale.as_str() {
        "de" => Locale::de,
        "fr" => Locale::fr,
        "es" => Locale::es,
        "it" => Locale::it,
        "ja" => Locale::ja,
        "ko" => Locale::ko,
        "zh" => Locale::zh,
        _ => Locale::en,
    };

    if options.use_comma {
        n.to_formatted_string(&locale)
    } else {
        n.to_string()
    }
}

/// Today's UTC date as used in dated report file names.
pub fn today_utc() -> String {
    Utc::now().format("%Y-%m-%d").to_string()
}

/// Leaderboard lines for the combined report: most minutes first, ties by name.
pub fn summary_lines(combined: &CombinedRecord, options: &NumberFormatOptions) -> Vec<String> {
    let mut rows: Vec<_> = combined.iter().collect();
    rows.sort_by(|(a_name, a), (b_name, b)| {
        b.minutes.cmp(&a.minutes).then_with(|| a_name.cmp(b_name))
    });

    let width = rows.iter().map(|(name, _)| name.chars().count()).max().unwrap_or(0);

    rows.into_iter()
        .enumerate()
        .map(|(i, (name, stats))| {
            format!(
                "{:>3}. {:<width$}  {:>8} min  slap {:>3}  kick {:>3}  ban {:>3}  rename {:>3}  chat {:>3}",
                i + 1,
                name,
                format_number(stats.minutes, options),
                stats.actions.slap,
                stats.actions.kick,
                stats.actions.ban,
                stats.actions.rename,
                stats.actions.admin_chat,
            )
        })
        .collect()
}
