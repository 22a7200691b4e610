//! Seed file discovery
//!
//! Scans the seed directory and resolves at most one candidate file per
//! entity: the one with the greatest parsed timestamp. Whether a candidate
//! actually gets loaded is decided later against the batch ledger, which is
//! the single source of idempotence truth; discovery itself keeps no state
//! between runs.

use crate::entity::{parse_timestamp, Entity, SeedFile};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

/// Scan `seed_dir` and return the latest candidate file per entity.
///
/// Entities with no matching files are simply absent from the result. A
/// missing directory or an unparseable timestamp suffix is a warning, not
/// an error; the run continues with whatever was found.
pub fn discover(seed_dir: &Path) -> Vec<SeedFile> {
    let entries = match std::fs::read_dir(seed_dir) {
        Ok(entries) => entries,
        Err(err) => {
            warn!(dir = %seed_dir.display(), error = %err, "Seed directory not readable");
            return Vec::new();
        },
    };

    let mut by_entity: HashMap<Entity, Vec<SeedFile>> = HashMap::new();

    for entry in entries.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };

        let Some(entity) = Entity::ALL
            .into_iter()
            .find(|e| file_name.starts_with(e.name()) && file_name[e.name().len()..].starts_with('_'))
        else {
            debug!(file = %file_name, "Ignoring file without entity prefix");
            continue;
        };

        if !file_name.ends_with(".csv") {
            debug!(file = %file_name, "Ignoring non-CSV file");
            continue;
        }

        match parse_timestamp(file_name, entity) {
            Some(timestamp) => {
                by_entity.entry(entity).or_default().push(SeedFile {
                    entity,
                    path: path.clone(),
                    file_name: file_name.to_string(),
                    timestamp,
                });
            },
            None => {
                warn!(file = %file_name, "Could not extract timestamp, excluding file");
            },
        }
    }

    let mut out = Vec::new();
    for entity in Entity::ALL {
        let Some(mut candidates) = by_entity.remove(&entity) else {
            debug!(entity = %entity, "No seed files found");
            continue;
        };
        // Fixed-width YYYYMMDDHHMM timestamps order lexicographically.
        candidates.sort_by(|a, b| a.timestamp.cmp(&b.timestamp));
        let latest = candidates.pop();
        if !candidates.is_empty() {
            let skipped: Vec<&str> = candidates.iter().map(|f| f.file_name.as_str()).collect();
            debug!(entity = %entity, skipped = ?skipped, "Skipping older candidate files");
        }
        if let Some(latest) = latest {
            out.push(latest);
        }
    }

    out
}
