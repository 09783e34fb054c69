use crate::directory_key::DirectoryKey;
use std::path::{Path, PathBuf};

pub const STORAGE_DIR_NAME: &str = ".sudo-context";
pub const DOCUMENT_FILE_NAME: &str = "context.json";

/// Maps directory keys to document locations under `<project_root>/.sudo-context`.
#[derive(Debug, Clone)]
pub struct StorageLayout {
    project_root: PathBuf,
    storage_dir: PathBuf,
}

impl StorageLayout {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        let project_root = project_root.as_ref().to_path_buf();
        let storage_dir = project_root.join(STORAGE_DIR_NAME);
        Self {
            project_root,
            storage_dir,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    pub fn document_path(&self, key: &DirectoryKey) -> PathBuf {
        let mut path = self.storage_dir.clone();
        for segment in key.segments() {
            path.push(segment);
        }
        path.push(DOCUMENT_FILE_NAME);
        path
    }

    /// Working-tree location of the directory a key names.
    pub fn working_dir(&self, key: &DirectoryKey) -> PathBuf {
        let mut path = self.project_root.clone();
        for segment in key.segments() {
            path.push(segment);
        }
        path
    }

    /// Inverse of [`Self::document_path`] for a directory inside the storage area.
    pub fn key_for_storage_dir(&self, dir: &Path) -> Option<DirectoryKey> {
        let rel = dir.strip_prefix(&self.storage_dir).ok()?;
        let joined = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        DirectoryKey::parse(&joined).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_document_sits_at_top_of_storage() {
        let layout = StorageLayout::new("/repo");
        assert_eq!(
            layout.document_path(&DirectoryKey::root()),
            PathBuf::from("/repo/.sudo-context/context.json")
        );
        assert_eq!(layout.working_dir(&DirectoryKey::root()), PathBuf::from("/repo"));
    }

    #[test]
    fn nested_document_mirrors_key_segments() {
        let layout = StorageLayout::new("/repo");
        let key = DirectoryKey::parse("src/tools").unwrap();
        let path = layout.document_path(&key);
        assert_eq!(
            path,
            PathBuf::from("/repo/.sudo-context/src/tools/context.json")
        );
        assert_eq!(
            layout.key_for_storage_dir(path.parent().unwrap()),
            Some(key)
        );
        assert_eq!(
            layout.key_for_storage_dir(Path::new("/repo/.sudo-context")),
            Some(DirectoryKey::root())
        );
    }
}
