#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use sudo_context_protocol::Sections;
use sudo_context_store::{ContextError, ContextStore, ContextUpdate, DirectoryKey, RepoInspector};

/// In-memory repository state for audit scenarios.
#[derive(Default)]
pub struct FakeInspector {
    /// `None` simulates a failing file listing (e.g. not a repository).
    pub tracked_files: Option<Vec<String>>,
    pub ignored: BTreeSet<String>,
    /// Directories that changed, keyed by the ref they changed since.
    pub changed: HashMap<String, BTreeSet<String>>,
    pub diff_calls: RefCell<Vec<(String, String)>>,
}

impl FakeInspector {
    pub fn tracking(files: &[&str]) -> Self {
        Self {
            tracked_files: Some(files.iter().map(|f| f.to_string()).collect()),
            ..Self::default()
        }
    }

    pub fn ignore(mut self, path: &str) -> Self {
        self.ignored.insert(path.to_string());
        self
    }

    pub fn changed_since(mut self, git_ref: &str, dir: &str) -> Self {
        self.changed
            .entry(git_ref.to_string())
            .or_default()
            .insert(dir.to_string());
        self
    }
}

impl RepoInspector for FakeInspector {
    fn list_tracked_files(&self, _root: &Path) -> sudo_context_store::Result<Vec<String>> {
        self.tracked_files
            .clone()
            .ok_or_else(|| ContextError::Environment {
                command: "git ls-files -z".to_string(),
                message: "fatal: not a git repository".to_string(),
            })
    }

    fn path_is_ignored(&self, _root: &Path, path: &str) -> sudo_context_store::Result<bool> {
        Ok(self.ignored.contains(path))
    }

    fn has_changes_since(
        &self,
        _root: &Path,
        git_ref: &str,
        path: &str,
    ) -> sudo_context_store::Result<bool> {
        self.diff_calls
            .borrow_mut()
            .push((git_ref.to_string(), path.to_string()));
        Ok(self
            .changed
            .get(git_ref)
            .is_some_and(|dirs| dirs.contains(path)))
    }
}

pub fn sections(pairs: &[(&str, &str)]) -> Sections {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

pub fn upsert(store: &ContextStore, directory: &str, git_ref: &str, pairs: &[(&str, &str)]) {
    store
        .upsert(ContextUpdate {
            repo: "owner/repo".to_string(),
            git_ref: git_ref.to_string(),
            directory: DirectoryKey::parse(directory).expect("directory key"),
            sections: sections(pairs),
        })
        .expect("upsert");
}

pub fn mkdirs(root: &Path, dirs: &[&str]) {
    for dir in dirs {
        std::fs::create_dir_all(root.join(dir)).expect("create dir");
    }
}
