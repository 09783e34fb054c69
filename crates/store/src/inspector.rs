use crate::directory_key::DirectoryKey;
use crate::error::{ContextError, Result};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::Path;
use std::process::{Command, Output};

/// Overrides the `git` executable used by [`GitInspector::from_env`].
pub const GIT_BIN_ENV: &str = "SUDO_CONTEXT_GIT";

/// Read-only view of a project's version control state.
///
/// Implementations report failures as [`ContextError::Environment`]; callers go
/// through [`tracked_directories`], [`is_ignored`] and [`changed_since`], which
/// degrade instead of failing.
pub trait RepoInspector {
    /// Tracked file paths, relative to `root`, `/`-separated.
    fn list_tracked_files(&self, root: &Path) -> Result<Vec<String>>;

    fn path_is_ignored(&self, root: &Path, path: &str) -> Result<bool>;

    /// Whether anything under `path` differs between `git_ref` and the current revision.
    fn has_changes_since(&self, root: &Path, git_ref: &str, path: &str) -> Result<bool>;
}

/// Every directory implied by a tracked file, plus the root. Falls back to just
/// the root when the file listing fails.
pub fn tracked_directories(inspector: &dyn RepoInspector, root: &Path) -> BTreeSet<DirectoryKey> {
    let mut dirs = BTreeSet::new();
    dirs.insert(DirectoryKey::root());
    match inspector.list_tracked_files(root) {
        Ok(files) => {
            for file in &files {
                dirs.extend(DirectoryKey::ancestors_of_file(file));
            }
            log::debug!(
                "{} tracked files imply {} directories",
                files.len(),
                dirs.len()
            );
        }
        Err(err) => log::warn!("listing tracked files failed, auditing root only: {err}"),
    }
    dirs
}

/// Ignore check that treats an unanswerable query as "not ignored".
pub fn is_ignored(inspector: &dyn RepoInspector, root: &Path, key: &DirectoryKey) -> bool {
    inspector
        .path_is_ignored(root, key.as_str())
        .unwrap_or_else(|err| {
            log::warn!("ignore check for {key} failed, assuming not ignored: {err}");
            false
        })
}

/// Change check that treats an unanswerable query as "changed".
pub fn changed_since(
    inspector: &dyn RepoInspector,
    root: &Path,
    git_ref: &str,
    key: &DirectoryKey,
) -> bool {
    inspector
        .has_changes_since(root, git_ref, key.as_str())
        .unwrap_or_else(|err| {
            log::warn!("diff for {key} since {git_ref} failed, assuming stale: {err}");
            true
        })
}

/// [`RepoInspector`] backed by the `git` command line.
#[derive(Debug, Clone)]
pub struct GitInspector {
    git: OsString,
}

impl Default for GitInspector {
    fn default() -> Self {
        Self::new()
    }
}

impl GitInspector {
    pub fn new() -> Self {
        Self::with_binary("git")
    }

    pub fn with_binary(git: impl Into<OsString>) -> Self {
        Self { git: git.into() }
    }

    pub fn from_env() -> Self {
        match std::env::var_os(GIT_BIN_ENV).filter(|value| !value.is_empty()) {
            Some(git) => {
                log::debug!("using git binary from {GIT_BIN_ENV}: {}", git.to_string_lossy());
                Self::with_binary(git)
            }
            None => Self::new(),
        }
    }

    fn run(&self, root: &Path, args: &[&str]) -> Result<Output> {
        Command::new(&self.git)
            .arg("-C")
            .arg(root)
            .args(args)
            .output()
            .map_err(|err| ContextError::Environment {
                command: describe(args),
                message: err.to_string(),
            })
    }
}

impl RepoInspector for GitInspector {
    fn list_tracked_files(&self, root: &Path) -> Result<Vec<String>> {
        let args = ["ls-files", "-z"];
        let out = self.run(root, &args)?;
        if !out.status.success() {
            return Err(failure(&args, &out));
        }
        Ok(String::from_utf8_lossy(&out.stdout)
            .split('\0')
            .filter(|path| !path.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn path_is_ignored(&self, root: &Path, path: &str) -> Result<bool> {
        let args = ["check-ignore", "-q", "--", path];
        let out = self.run(root, &args)?;
        match out.status.code() {
            Some(0) => Ok(true),
            Some(1) => Ok(false),
            _ => Err(failure(&args, &out)),
        }
    }

    fn has_changes_since(&self, root: &Path, git_ref: &str, path: &str) -> Result<bool> {
        // git reads a leading `-` in the revision slot as an option (e.g. `--output`).
        if git_ref.starts_with('-') {
            return Err(ContextError::Environment {
                command: describe(&["diff", "--quiet"]),
                message: format!("refusing option-like ref '{git_ref}'"),
            });
        }
        let range = format!("{git_ref}..HEAD");
        let args = ["diff", "--quiet", range.as_str(), "--", path];
        let out = self.run(root, &args)?;
        match out.status.code() {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(failure(&args, &out)),
        }
    }
}

fn describe(args: &[&str]) -> String {
    format!("git {}", args.join(" "))
}

fn failure(args: &[&str], out: &Output) -> ContextError {
    let stderr = String::from_utf8_lossy(&out.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        format!("exit status {}", out.status)
    } else {
        stderr
    };
    ContextError::Environment {
        command: describe(args),
        message,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    struct Broken;

    impl RepoInspector for Broken {
        fn list_tracked_files(&self, _root: &Path) -> Result<Vec<String>> {
            Err(ContextError::Environment {
                command: "git ls-files -z".to_string(),
                message: "not a git repository".to_string(),
            })
        }

        fn path_is_ignored(&self, _root: &Path, path: &str) -> Result<bool> {
            Err(ContextError::Environment {
                command: format!("git check-ignore -q {path}"),
                message: "not a git repository".to_string(),
            })
        }

        fn has_changes_since(&self, _root: &Path, git_ref: &str, _path: &str) -> Result<bool> {
            Err(ContextError::Environment {
                command: format!("git diff --quiet {git_ref}..HEAD"),
                message: "unknown revision".to_string(),
            })
        }
    }

    #[test]
    fn failures_degrade_to_documented_defaults() {
        let root = PathBuf::from("/nowhere");
        let key = DirectoryKey::parse("src").unwrap();

        let dirs = tracked_directories(&Broken, &root);
        assert_eq!(dirs.into_iter().collect::<Vec<_>>(), vec![DirectoryKey::root()]);
        assert!(!is_ignored(&Broken, &root, &key));
        assert!(changed_since(&Broken, &root, "abc123", &key));
    }

    #[test]
    fn missing_git_binary_is_an_environment_error() {
        let tmp = tempfile::tempdir().unwrap();
        let inspector = GitInspector::with_binary("definitely-not-git-sudo-context");
        let err = inspector.list_tracked_files(tmp.path()).unwrap_err();
        assert_eq!(err.code(), "environment");
    }
}
