//! Staleness audit: compares stored contexts with the live repository.
//!
//! ```text
//! tracked dirs ──┬── no document, not hidden ──────────────> needs_creation
//!                │
//! inventory ─────┼── dir gone from disk, or ignored ───────> needs_deletion
//!                │
//!                └── otherwise: no git_ref, or changed ────> needs_update
//! ```
//!
//! Creation only looks at keys without a document; deletion and update only at
//! keys with one, and update skips whatever deletion claimed, so the three lists
//! never share a key.

use crate::directory_key::DirectoryKey;
use crate::error::Result;
use crate::inspector::{changed_since, is_ignored, tracked_directories, RepoInspector};
use crate::store::ContextStore;
use std::collections::BTreeSet;
use sudo_context_protocol::StatusReport;

pub fn audit(store: &ContextStore, inspector: &dyn RepoInspector) -> Result<StatusReport> {
    let root = store.project_root();
    let tracked = tracked_directories(inspector, root);
    let existing: BTreeSet<DirectoryKey> = store.inventory()?.into_iter().collect();

    let needs_creation: Vec<&DirectoryKey> = tracked
        .iter()
        .filter(|key| !existing.contains(*key))
        .filter(|key| !key.is_hidden())
        .collect();

    let mut needs_deletion: BTreeSet<&DirectoryKey> = BTreeSet::new();
    for key in &existing {
        if !store.layout().working_dir(key).is_dir() {
            log::debug!("{key} no longer exists on disk");
            needs_deletion.insert(key);
            continue;
        }
        if !key.is_root() && is_ignored(inspector, root, key) {
            log::debug!("{key} is ignored by version control");
            needs_deletion.insert(key);
        }
    }

    let mut needs_update: Vec<&DirectoryKey> = Vec::new();
    for key in existing.iter().filter(|key| !needs_deletion.contains(key)) {
        let Some(doc) = store.load(key)? else {
            log::debug!("{key} disappeared during the audit");
            continue;
        };
        match doc.baseline_ref() {
            None => needs_update.push(key),
            Some(git_ref) => {
                if changed_since(inspector, root, git_ref, key) {
                    needs_update.push(key);
                }
            }
        }
    }

    let report = StatusReport {
        needs_creation: to_strings(needs_creation),
        needs_deletion: to_strings(needs_deletion),
        needs_update: to_strings(needs_update),
    };
    log::info!(
        "audit of {}: {} to create, {} to delete, {} to update",
        root.display(),
        report.needs_creation.len(),
        report.needs_deletion.len(),
        report.needs_update.len()
    );
    Ok(report)
}

fn to_strings<'a>(keys: impl IntoIterator<Item = &'a DirectoryKey>) -> Vec<String> {
    let mut out: Vec<String> = keys.into_iter().map(DirectoryKey::to_string).collect();
    out.sort();
    out.dedup();
    out
}
