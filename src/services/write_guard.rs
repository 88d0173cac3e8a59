//! Confinement of remediation writes to allowed directories.
//!
//! Candidate paths are resolved component by component from the canonical
//! project root. Existing components are canonicalized, so a symlink anywhere
//! on the path is followed before the prefix check, and dangling symlinks are
//! rejected outright.

use std::io;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;
use tracing::warn;

use crate::domain::models::is_project_subdir;

#[derive(Debug, Error)]
pub enum WriteGuardError {
    #[error("Unsafe file path rejected: path is empty")]
    Empty,

    #[error("Unsafe file path rejected: '{0}' must be relative to the project root")]
    Absolute(String),

    #[error("Unsafe file path rejected: '{0}' escapes the project root")]
    EscapesRoot(String),

    #[error("Unsafe file path rejected: '{0}' is a dangling symlink")]
    DanglingSymlink(String),

    #[error("Unsafe file path rejected: '{path}' resolves outside the writable directories {roots:?}")]
    OutsideAllowedRoots { path: String, roots: Vec<PathBuf> },

    #[error("Writable directory '{0}' must resolve to a subdirectory of the project root")]
    InvalidRoot(String),

    #[error("Unsafe file path rejected: '{path}' could not be resolved: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },
}

/// Allow-list of directories a remediation may write into.
#[derive(Debug, Clone)]
pub struct WriteGuard {
    project_root: PathBuf,
    roots: Vec<PathBuf>,
}

impl WriteGuard {
    /// Resolve the allowed roots once. The project root must exist; writable
    /// directories that do not exist yet are kept as lexical children of it.
    ///
    /// Every writable directory must end up strictly below the project root,
    /// after following symlinks.
    pub fn new<I, S>(project_root: &Path, writable_dirs: I) -> Result<Self, WriteGuardError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<Path>,
    {
        let project_root = project_root
            .canonicalize()
            .map_err(|source| WriteGuardError::Io {
                path: project_root.display().to_string(),
                source,
            })?;

        let roots = writable_dirs
            .into_iter()
            .map(|dir| {
                let dir = dir.as_ref();
                let invalid = || WriteGuardError::InvalidRoot(dir.display().to_string());
                if !is_project_subdir(dir) {
                    return Err(invalid());
                }
                let joined = project_root.join(dir);
                let root = joined.canonicalize().unwrap_or(joined);
                if root == project_root || !root.starts_with(&project_root) {
                    return Err(invalid());
                }
                Ok(root)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            project_root,
            roots,
        })
    }

    /// Resolve `candidate` and require it to lie strictly below an allowed root.
    pub fn resolve(&self, candidate: &str) -> Result<PathBuf, WriteGuardError> {
        let result = self.resolve_inner(candidate);
        if let Err(ref err) = result {
            warn!(path = candidate, error = %err, "write rejected");
        }
        result
    }

    fn resolve_inner(&self, candidate: &str) -> Result<PathBuf, WriteGuardError> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(WriteGuardError::Empty);
        }

        let relative = Path::new(trimmed);
        if relative.is_absolute() || relative.has_root() {
            return Err(WriteGuardError::Absolute(trimmed.to_string()));
        }

        let mut resolved = self.project_root.clone();
        for component in relative.components() {
            match component {
                Component::CurDir => {}
                Component::ParentDir => {
                    if !resolved.pop() || !resolved.starts_with(&self.project_root) {
                        return Err(WriteGuardError::EscapesRoot(trimmed.to_string()));
                    }
                }
                Component::Normal(part) => {
                    resolved.push(part);
                    resolved = Self::follow(resolved, trimmed)?;
                }
                Component::RootDir | Component::Prefix(_) => {
                    return Err(WriteGuardError::Absolute(trimmed.to_string()));
                }
            }
        }

        let allowed = self
            .roots
            .iter()
            .any(|root| resolved.starts_with(root) && resolved != *root);

        if allowed {
            Ok(resolved)
        } else {
            Err(WriteGuardError::OutsideAllowedRoots {
                path: trimmed.to_string(),
                roots: self.roots.clone(),
            })
        }
    }

    /// Canonicalize `path` if it exists; keep it lexical if it does not.
    fn follow(path: PathBuf, original: &str) -> Result<PathBuf, WriteGuardError> {
        match path.symlink_metadata() {
            Ok(_) => path.canonicalize().map_err(|source| {
                if source.kind() == io::ErrorKind::NotFound {
                    WriteGuardError::DanglingSymlink(original.to_string())
                } else {
                    WriteGuardError::Io {
                        path: original.to_string(),
                        source,
                    }
                }
            }),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(path),
            Err(source) => Err(WriteGuardError::Io {
                path: original.to_string(),
                source,
            }),
        }
    }
}
