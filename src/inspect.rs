//! Offline rendering of the key report for an authorized_keys-style file.

use crate::blacklist::BlacklistSet;
use crate::keyinfo::CollectedKey;
use crate::report::Report;
use crate::ssh::presenter::build_report;
use crate::ssh::session::ChannelRequests;

/// Report for the parseable lines plus the lines that were skipped.
#[derive(Debug)]
pub struct Inspection {
    pub report: Report,
    pub keys: Vec<CollectedKey>,
    /// `(line number, error)` for every line that could not be parsed.
    pub skipped: Vec<(usize, String)>,
}

/// Parse `text` line by line. Blank lines and `#` comments are ignored.
///
/// A line is blacklisted when its key's canonical form is listed, or when the
/// whole trimmed line (comment included) is.
pub fn inspect_text(text: &str, blacklist: &BlacklistSet) -> Inspection {
    let mut keys = Vec::new();
    let mut skipped = Vec::new();

    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        match CollectedKey::from_authorized_line(trimmed) {
            Ok(mut key) => {
                key.blacklisted = blacklist.is_blacklisted(&key) || blacklist.contains_line(trimmed);
                keys.push(key);
            }
            Err(e) => skipped.push((idx + 1, e.to_string())),
        }
    }

    // No channel is involved, so no forwarding requests are ever recorded
    let report = build_report(&keys, &ChannelRequests::new(), true);
    Inspection {
        report,
        keys,
        skipped,
    }
}
