//! Snapshot to text.

use std::fmt::Write;
use tracing::{debug, warn};

use super::ExportStats;
use crate::model::Snapshot;

/// Encode every person with their geocaches and found ids.
///
/// Geocaches without an owner have no place in the format; they are left
/// out and counted in [`ExportStats::unowned_skipped`]. Found ids pointing at
/// them are dropped too, counted in [`ExportStats::found_skipped`], so the
/// output always loads back.
#[must_use]
pub fn encode(snapshot: &Snapshot) -> (String, ExportStats) {
    let mut out = String::new();
    let mut stats = ExportStats::default();

    for person in snapshot.persons() {
        // Writing into a String cannot fail
        let _ = writeln!(
            out,
            "{}|{}|{}|{}|{}|{}|{}|{}",
            person.first_name,
            person.last_name,
            person.country,
            person.city,
            person.street_name,
            person.street_number,
            person.location.latitude,
            person.location.longitude
        );
        stats.persons += 1;

        for geocache in snapshot.owned_by(person.id) {
            let _ = writeln!(
                out,
                "{}|{}|{}|{}|{}",
                geocache.id,
                geocache.location.latitude,
                geocache.location.longitude,
                geocache.contents,
                geocache.message
            );
            stats.geocaches += 1;
        }

        let mut found = Vec::new();
        for relation in snapshot.found_by(person.id) {
            if snapshot
                .geocache(relation.geocache_id)
                .is_some_and(|g| g.owner.is_some())
            {
                found.push(relation.geocache_id.to_string());
            } else {
                stats.found_skipped += 1;
            }
        }
        stats.found += found.len();
        let _ = writeln!(out, "Found:{}", found.join(","));

        out.push('\n');
    }

    stats.unowned_skipped = snapshot.unowned().count();
    if stats.unowned_skipped > 0 {
        warn!(
            count = stats.unowned_skipped,
            found = stats.found_skipped,
            "Geocaches without an owner were not exported"
        );
    }

    debug!(?stats, "Encoded snapshot");
    (out, stats)
}
