use crate::types::{ActionTally, CombinedRecord, CombinedStats, PlaytimeEntry};

/// Join weekly playtime with the action tally into one record per admin.
///
/// Every name from either input appears in the result. Minutes come from
/// `playtime` and action counters from `tally`; an admin seen by only one
/// source gets zeroes for the other. Tally counters are assigned, not added,
/// because each admin appears in the tally exactly once.
pub fn combine(playtime: &[PlaytimeEntry], tally: &ActionTally) -> CombinedRecord {
    let mut combined = CombinedRecord::new();

    for entry in playtime {
        combined.insert(
            entry.name.clone(),
            CombinedStats {
                minutes: entry.minutes,
                ..Default::default()
            },
        );
    }

    for (name, counts) in tally {
        combined.entry(name.clone()).or_default().actions = *counts;
    }

    combined
}
