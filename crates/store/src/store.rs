use crate::directory_key::DirectoryKey;
use crate::error::{ContextError, Result};
use crate::layout::{StorageLayout, DOCUMENT_FILE_NAME};
use chrono::{SecondsFormat, Utc};
use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use sudo_context_protocol::{ContextDocument, Sections};

/// Incoming merge-write for one directory.
#[derive(Debug, Clone)]
pub struct ContextUpdate {
    pub repo: String,
    pub git_ref: String,
    pub directory: DirectoryKey,
    pub sections: Sections,
}

/// File-backed context documents for a single project root.
#[derive(Debug, Clone)]
pub struct ContextStore {
    layout: StorageLayout,
}

impl ContextStore {
    pub fn open(project_root: impl AsRef<Path>) -> Self {
        Self {
            layout: StorageLayout::new(project_root),
        }
    }

    pub fn layout(&self) -> &StorageLayout {
        &self.layout
    }

    pub fn project_root(&self) -> &Path {
        self.layout.project_root()
    }

    pub fn document_path(&self, key: &DirectoryKey) -> PathBuf {
        self.layout.document_path(key)
    }

    /// Load the document for `key`, or `None` when nothing is stored there.
    pub fn load(&self, key: &DirectoryKey) -> Result<Option<ContextDocument>> {
        let path = self.layout.document_path(key);
        if !path.is_file() {
            return Ok(None);
        }
        let raw = std::fs::read_to_string(&path).map_err(|e| ContextError::io(&path, e))?;
        let doc = serde_json::from_str(&raw)
            .map_err(|source| ContextError::CorruptDocument { path, source })?;
        Ok(Some(doc))
    }

    /// Merge `update.sections` over whatever is stored and persist the result.
    ///
    /// Keys absent from the update survive untouched.
    pub fn upsert(&self, update: ContextUpdate) -> Result<PathBuf> {
        let ContextUpdate {
            repo,
            git_ref,
            directory,
            sections,
        } = update;

        let mut merged = self
            .load(&directory)?
            .map(|existing| existing.sections)
            .unwrap_or_default();
        let incoming = sections.len();
        merged.extend(sections);

        let doc = ContextDocument {
            repo,
            directory: directory.to_string(),
            git_ref: Some(git_ref),
            updated_at: utc_timestamp(),
            sections: merged,
        };

        let path = self.layout.document_path(&directory);
        write_document(&path, &doc)?;
        log::info!(
            "stored context for {directory} ({incoming} incoming, {} total sections)",
            doc.sections.len()
        );
        Ok(path)
    }

    /// Point query. A non-empty `filter` restricts the returned sections to the
    /// requested names that exist.
    pub fn query(&self, key: &DirectoryKey, filter: Option<&[String]>) -> Result<ContextDocument> {
        let mut doc = self
            .load(key)?
            .ok_or_else(|| ContextError::NotFound(key.to_string()))?;
        if let Some(names) = filter.filter(|names| !names.is_empty()) {
            doc.retain_sections(names);
        }
        Ok(doc)
    }

    /// Every directory key with a stored document, sorted.
    pub fn inventory(&self) -> Result<Vec<DirectoryKey>> {
        let storage = self.layout.storage_dir();
        if !storage.is_dir() {
            return Ok(Vec::new());
        }

        let mut keys = Vec::new();
        let mut visited: HashSet<PathBuf> = HashSet::new();
        let mut stack = vec![storage.to_path_buf()];

        while let Some(dir) = stack.pop() {
            if !first_visit(&mut visited, &dir, storage)? {
                continue;
            }

            let entries = match std::fs::read_dir(&dir) {
                Ok(entries) => entries,
                Err(err) if dir.as_path() != storage => {
                    log::warn!("skipping unreadable {}: {err}", dir.display());
                    continue;
                }
                Err(err) => return Err(ContextError::io(&dir, err)),
            };

            for entry in entries {
                let entry = entry.map_err(|e| ContextError::io(&dir, e))?;
                let path = entry.path();
                // Follows symlinks; cycles are cut by `visited`.
                let Ok(meta) = std::fs::metadata(&path) else {
                    log::debug!("skipping dangling entry {}", path.display());
                    continue;
                };
                if meta.is_dir() {
                    stack.push(path);
                } else if meta.is_file() && entry.file_name() == DOCUMENT_FILE_NAME {
                    if let Some(key) = self.layout.key_for_storage_dir(&dir) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        keys.dedup();
        log::debug!("inventory found {} context documents", keys.len());
        Ok(keys)
    }
}

/// Whether `dir` still needs walking. Only the storage root itself is fatal
/// when it cannot be resolved.
fn first_visit(visited: &mut HashSet<PathBuf>, dir: &Path, storage: &Path) -> Result<bool> {
    match dir.canonicalize() {
        Ok(canonical) => {
            let fresh = visited.insert(canonical);
            if !fresh {
                log::debug!("skipping already visited {}", dir.display());
            }
            Ok(fresh)
        }
        Err(err) if dir != storage => {
            log::warn!("skipping unresolvable {}: {err}", dir.display());
            Ok(false)
        }
        Err(err) => Err(ContextError::io(dir, err)),
    }
}

/// ISO-8601 UTC, second precision, `Z` suffix.
pub fn utc_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_document(path: &Path, doc: &ContextDocument) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| ContextError::io(path, std::io::ErrorKind::InvalidInput.into()))?;
    std::fs::create_dir_all(parent).map_err(|e| ContextError::io(parent, e))?;

    let mut bytes = serde_json::to_vec_pretty(doc).map_err(|source| {
        ContextError::CorruptDocument {
            path: path.to_path_buf(),
            source,
        }
    })?;
    bytes.push(b'\n');
    write_atomic(path, parent, &bytes)
}

fn write_atomic(path: &Path, parent: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = parent.join(format!(
        ".{DOCUMENT_FILE_NAME}.tmp-{}",
        std::process::id()
    ));
    {
        let mut file = File::create(&tmp).map_err(|e| ContextError::io(&tmp, e))?;
        file.write_all(bytes).map_err(|e| ContextError::io(&tmp, e))?;
        file.sync_all().map_err(|e| ContextError::io(&tmp, e))?;
    }
    std::fs::rename(&tmp, path).map_err(|e| ContextError::io(path, e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    #[test]
    fn timestamp_is_second_precision_zulu() {
        let ts = utc_timestamp();
        assert!(ts.ends_with('Z'), "{ts}");
        assert_eq!(ts.len(), "2024-01-01T00:00:00Z".len(), "{ts}");
        assert!(DateTime::parse_from_rfc3339(&ts).is_ok());
    }

    #[test]
    fn load_missing_document_is_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ContextStore::open(tmp.path());
        assert!(store.load(&DirectoryKey::root()).unwrap().is_none());
        assert!(store.inventory().unwrap().is_empty());
    }

    #[test]
    fn vanished_subdirectory_is_skipped_but_vanished_storage_is_fatal() {
        let tmp = tempfile::tempdir().unwrap();
        let storage = tmp.path().join(".sudo-context");
        std::fs::create_dir_all(&storage).unwrap();
        let gone = storage.join("removed-mid-walk");
        let mut visited = HashSet::new();

        assert!(first_visit(&mut visited, &storage, &storage).unwrap());
        assert!(!first_visit(&mut visited, &storage, &storage).unwrap());
        assert!(!first_visit(&mut visited, &gone, &storage).unwrap());

        let missing_storage = tmp.path().join("elsewhere");
        let err =
            first_visit(&mut HashSet::new(), &missing_storage, &missing_storage).unwrap_err();
        assert_eq!(err.code(), "io");
    }

    #[test]
    fn corrupt_document_is_reported_with_path() {
        let tmp = tempfile::tempdir().unwrap();
        let store = ContextStore::open(tmp.path());
        let key = DirectoryKey::parse("src").unwrap();
        let path = store.document_path(&key);
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "{not json").unwrap();

        let err = store.load(&key).unwrap_err();
        assert_eq!(err.code(), "corrupt_document");
        assert!(err.to_string().contains("context.json"), "{err}");
    }
}
