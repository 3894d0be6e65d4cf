//! Filesystem deletion strategies for the cache tree

use std::io::ErrorKind;
use std::path::Path;

use crate::error::CacheError;

type Result<T> = std::result::Result<T, CacheError>;

/// How the cache tree is emptied
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearStrategy {
    /// `rm -rf <root>/*` through `sh`. Faster on very large trees; Unix only.
    Shell,
    /// Native post-order walk
    Portable,
}

impl ClearStrategy {
    /// Pick the strategy for a `use_shell_clear` setting.
    ///
    /// The shell strategy is only honoured where a POSIX shell is expected.
    pub fn from_flag(use_shell_clear: bool) -> Self {
        if use_shell_clear && cfg!(unix) {
            ClearStrategy::Shell
        } else {
            ClearStrategy::Portable
        }
    }
}

/// Counts from a filesystem clear
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RemovedCounts {
    pub files: usize,
    pub dirs: usize,
}

/// Remove everything under `root`, keeping `root` itself
pub fn clear_tree(root: &Path, strategy: ClearStrategy) -> Result<RemovedCounts> {
    match strategy {
        ClearStrategy::Shell => {
            shell_clear(root)?;
            Ok(RemovedCounts::default())
        }
        ClearStrategy::Portable => {
            let mut counts = RemovedCounts::default();
            match std::fs::read_dir(root) {
                Ok(_) => remove_children(root, &mut counts)?,
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    log::debug!("Cache root {} does not exist", root.display());
                }
                Err(e) => {
                    return Err(CacheError::Io(format!(
                        "Failed to read {}: {}",
                        root.display(),
                        e
                    )));
                }
            }
            Ok(counts)
        }
    }
}

/// Depth-first, children before parents. Entries that disappear mid-walk are
/// skipped; any other failure aborts the walk.
fn remove_children(dir: &Path, counts: &mut RemovedCounts) -> Result<()> {
    let entries = std::fs::read_dir(dir)
        .map_err(|e| CacheError::Io(format!("Failed to read {}: {}", dir.display(), e)))?;

    for entry in entries {
        let entry = entry
            .map_err(|e| CacheError::Io(format!("Failed to read {}: {}", dir.display(), e)))?;
        let path = entry.path();
        let file_type = entry
            .file_type()
            .map_err(|e| CacheError::Io(format!("Failed to stat {}: {}", path.display(), e)))?;

        if file_type.is_dir() {
            remove_children(&path, counts)?;
            match std::fs::remove_dir(&path) {
                Ok(()) => counts.dirs += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::Io(format!(
                        "Failed to remove {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        } else {
            match std::fs::remove_file(&path) {
                Ok(()) => counts.files += 1,
                Err(e) if e.kind() == ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(CacheError::Io(format!(
                        "Failed to remove {}: {}",
                        path.display(),
                        e
                    )));
                }
            }
        }
    }

    Ok(())
}

/// Quote a path for a POSIX shell
fn shell_quote(path: &Path) -> String {
    format!("'{}'", path.display().to_string().replace('\'', r"'\''"))
}

fn shell_clear(root: &Path) -> Result<()> {
    // The glob must stay outside the quotes so the shell expands it
    let command = format!("rm -rf {}/*", shell_quote(root));
    log::debug!("Running: sh -c {:?}", command);

    let output = std::process::Command::new("sh")
        .arg("-c")
        .arg(&command)
        .output()
        .map_err(|e| CacheError::Shell(format!("Failed to spawn sh: {}", e)))?;

    if !output.status.success() {
        return Err(CacheError::Shell(format!(
            "'{}' exited with {}: {}",
            command,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        )));
    }

    Ok(())
}

/// Remove an entry's `index.html`, then prune directories it leaves empty,
/// stopping at `root`. Returns the counts actually removed.
pub fn remove_entry(root: &Path, dir: &Path, file_name: &str) -> Result<RemovedCounts> {
    let mut counts = RemovedCounts::default();
    let file = dir.join(file_name);

    match std::fs::remove_file(&file) {
        Ok(()) => counts.files += 1,
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            return Err(CacheError::Io(format!(
                "Failed to remove {}: {}",
                file.display(),
                e
            )));
        }
    }

    let mut current = Some(dir);
    while let Some(d) = current {
        if d == root || !d.starts_with(root) {
            break;
        }
        // Non-empty or already gone: stop pruning
        if std::fs::remove_dir(d).is_err() {
            break;
        }
        counts.dirs += 1;
        current = d.parent();
    }

    Ok(counts)
}
