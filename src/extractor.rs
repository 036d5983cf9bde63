//! Admin action extraction from raw server log lines.
//!
//! Player references in HLDS logs look like `"name<uid><steamid><team>"`;
//! the actor of an admin command is the first such reference, followed by
//! the verb (`slapped`, `kicked`, ...). Admin chat lines carry the actor in
//! parentheses after a literal `[ADMIN CHAT]` tag.

use std::sync::LazyLock;

use regex::Regex;

use crate::types::ActionKind;

/// A single action found on a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractedAction<'a> {
    pub kind: ActionKind,
    pub actor: &'a str,
}

static PATTERNS: LazyLock<Vec<(ActionKind, Regex)>> = LazyLock::new(|| {
    let player_verb = |verb: &str| {
        // Name stops at the first '<'; the annotations run up to the closing quote.
        Regex::new(&format!(r#""([^"<]+)<[^"]*>" {verb}"#))
            .expect("player action pattern must compile")
    };

    vec![
        (ActionKind::Slap, player_verb("slapped")),
        (ActionKind::Kick, player_verb("kicked")),
        (ActionKind::Ban, player_verb("banned")),
        (ActionKind::Rename, player_verb("changed name of")),
        (
            ActionKind::AdminChat,
            // Name ends at a ')' followed by whitespace, ':' or end of line, so
            // names containing ')' survive.
            Regex::new(r"\[ADMIN CHAT\] \((.+?)\)(?:\s|:|$)")
                .expect("admin chat pattern must compile"),
        ),
    ]
});

/// Returns every admin action recognised on `line`, at most one per kind.
///
/// Lines that match nothing (including malformed ones) yield an empty vector.
pub fn extract_actions(line: &str) -> Vec<ExtractedAction<'_>> {
    PATTERNS
        .iter()
        .filter_map(|(kind, regex)| {
            let actor = regex.captures(line)?.get(1)?.as_str().trim();
            if actor.is_empty() {
                return None;
            }
            Some(ExtractedAction { kind: *kind, actor })
        })
        .collect()
}
