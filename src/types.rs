use std::collections::BTreeMap;
use std::ops::AddAssign;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ActionKind {
    Slap,
    Kick,
    Ban,
    Rename,
    AdminChat,
}

impl ActionKind {
    pub const ALL: [ActionKind; 5] = [
        ActionKind::Slap,
        ActionKind::Kick,
        ActionKind::Ban,
        ActionKind::Rename,
        ActionKind::AdminChat,
    ];

    /// Column / JSON key used for this kind in every persisted format
    pub fn field_name(self) -> &'static str {
        match self {
            ActionKind::Slap => "slap",
            ActionKind::Kick => "kick",
            ActionKind::Ban => "ban",
            ActionKind::Rename => "rename",
            ActionKind::AdminChat => "admin_chat",
        }
    }
}

/// Per-admin action counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    #[serde(default)]
    pub slap: u64,
    #[serde(default)]
    pub kick: u64,
    #[serde(default)]
    pub ban: u64,
    #[serde(default)]
    pub rename: u64,
    #[serde(default)]
    pub admin_chat: u64,
}

impl ActionCounts {
    pub fn get(&self, kind: ActionKind) -> u64 {
        match kind {
            ActionKind::Slap => self.slap,
            ActionKind::Kick => self.kick,
            ActionKind::Ban => self.ban,
            ActionKind::Rename => self.rename,
            ActionKind::AdminChat => self.admin_chat,
        }
    }

    pub fn increment(&mut self, kind: ActionKind) {
        let counter = match kind {
            ActionKind::Slap => &mut self.slap,
            ActionKind::Kick => &mut self.kick,
            ActionKind::Ban => &mut self.ban,
            ActionKind::Rename => &mut self.rename,
            ActionKind::AdminChat => &mut self.admin_chat,
        };
        *counter = counter.saturating_add(1);
    }

    pub fn total(&self) -> u64 {
        ActionKind::ALL.iter().map(|kind| self.get(*kind)).sum()
    }
}

impl AddAssign for ActionCounts {
    fn add_assign(&mut self, other: Self) {
        self.slap = self.slap.saturating_add(other.slap);
        self.kick = self.kick.saturating_add(other.kick);
        self.ban = self.ban.saturating_add(other.ban);
        self.rename = self.rename.saturating_add(other.rename);
        self.admin_chat = self.admin_chat.saturating_add(other.admin_chat);
    }
}

/// Action counts keyed by admin name.
pub type ActionTally = BTreeMap<String, ActionCounts>;

/// Last known minutes per admin, the long-lived playtime history.
pub type PlaytimeRecord = BTreeMap<String, u64>;

/// One row of a weekly playtime result (also the history CSV row shape).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaytimeEntry {
    pub name: String,
    #[serde(default)]
    pub minutes: u64,
}

impl PlaytimeEntry {
    pub fn new(name: impl Into<String>, minutes: u64) -> Self {
        Self {
            name: name.into(),
            minutes,
        }
    }
}

/// Playtime and action counts for one admin, the unit of the combined report.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombinedStats {
    #[serde(default)]
    pub minutes: u64,
    #[serde(flatten)]
    pub actions: ActionCounts,
}

pub type CombinedRecord = BTreeMap<String, CombinedStats>;
