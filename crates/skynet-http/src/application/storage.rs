//! Filesystem access for the route handlers, confined to the serving root.
//!
//! Every path that reaches the disk goes through this module:
//!
//! - [`resolve_download`] maps a `/download/<path>` request onto a file or
//!   directory *inside* the root.  Paths with `..`, a root or a drive prefix
//!   are refused outright, and the canonical target must still live under
//!   the root so symlinks cannot be used to escape.
//! - [`sanitize_upload_name`] accepts only a single plain filename.
//! - [`UploadTarget`] opens the destination according to the
//!   [`CollisionPolicy`] and removes partial files when a transfer fails.
//!   Overwrites are staged in a hidden sibling and renamed into place, so a
//!   failed upload never touches the existing file.
//!
//! The root handed to these functions is expected to be canonical (the
//! service manager canonicalizes it before building routes).

use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use skynet_core::CollisionPolicy;
use tokio::fs::{self, File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::debug;
use uuid::Uuid;

use super::errors::RequestError;

/// Upper bound on `name (N).ext` candidates tried under [`CollisionPolicy::Rename`].
const MAX_RENAME_ATTEMPTS: u32 = 10_000;

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingEntry {
    pub name: String,
    pub is_dir: bool,
}

/// What a download path resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    /// A regular file and its size in bytes.
    File { path: PathBuf, len: u64 },
    /// A directory inside the root; `relative` is its path below the root
    /// using `/` separators.
    Directory { path: PathBuf, relative: String },
}

/// Reads `dir` and returns its entries sorted by name.
///
/// Hidden files are included.  The listing is not recursive and is read
/// fresh on every call.
pub async fn list_directory(dir: &Path) -> Result<Vec<ListingEntry>, RequestError> {
    let mut reader = fs::read_dir(dir).await.map_err(RequestError::Storage)?;
    let mut entries = Vec::new();

    while let Some(entry) = reader.next_entry().await.map_err(RequestError::Storage)? {
        let is_dir = entry
            .file_type()
            .await
            .map(|t| t.is_dir())
            .unwrap_or(false);
        entries.push(ListingEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            is_dir,
        });
    }

    entries.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(entries)
}

/// Maps `requested` (already percent-decoded) onto a path under `root`.
///
/// # Errors
///
/// - [`RequestError::InvalidPath`] if `requested` contains `..`, a root or a
///   prefix component.
/// - [`RequestError::NotFound`] if nothing exists there, if the canonical
///   target lies outside `root`, or if it is neither a file nor a directory.
pub async fn resolve_download(root: &Path, requested: &str) -> Result<Resolved, RequestError> {
    let relative = confined_relative_path(requested)
        .ok_or_else(|| RequestError::InvalidPath(requested.to_string()))?;

    let joined = root.join(&relative);
    let canonical = fs::canonicalize(&joined)
        .await
        .map_err(|_| RequestError::NotFound(requested.to_string()))?;

    if !canonical.starts_with(root) {
        debug!("download of '{requested}' escapes the serving root; refusing");
        return Err(RequestError::NotFound(requested.to_string()));
    }

    let meta = fs::metadata(&canonical)
        .await
        .map_err(|_| RequestError::NotFound(requested.to_string()))?;

    if meta.is_file() {
        Ok(Resolved::File {
            path: canonical,
            len: meta.len(),
        })
    } else if meta.is_dir() {
        Ok(Resolved::Directory {
            path: canonical,
            relative: slash_joined(&relative),
        })
    } else {
        Err(RequestError::NotFound(requested.to_string()))
    }
}

/// Returns `requested` as a relative path made only of normal components,
/// or `None` if it contains anything that could leave the root.
fn confined_relative_path(requested: &str) -> Option<PathBuf> {
    // Backslashes are separators on Windows; treat them as such everywhere so
    // `..\..\x` is refused on every platform.
    let normalized = requested.replace('\\', "/");
    let mut relative = PathBuf::new();

    for component in Path::new(&normalized).components() {
        match component {
            Component::Normal(part) => relative.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }

    Some(relative)
}

fn slash_joined(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Validates a client-supplied upload filename.
///
/// The name must be a single normal path component: no separators (`/` or
/// `\`), not `.` or `..`, not empty and without NUL bytes.
pub fn sanitize_upload_name(submitted: &str) -> Result<String, RequestError> {
    let invalid = || RequestError::InvalidFileName(submitted.to_string());

    if submitted.is_empty()
        || submitted.contains(['/', '\\', '\0'])
        || submitted == "."
        || submitted == ".."
    {
        return Err(invalid());
    }

    let mut components = Path::new(submitted).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(submitted.to_string()),
        _ => Err(invalid()),
    }
}

/// Builds the `N`-th alternative name: `report.pdf` → `report (N).pdf`.
pub fn numbered_name(name: &str, n: u32) -> String {
    let path = Path::new(name);
    match (path.file_stem(), path.extension()) {
        (Some(stem), Some(ext)) if !stem.is_empty() => format!(
            "{} ({n}).{}",
            stem.to_string_lossy(),
            ext.to_string_lossy()
        ),
        _ => format!("{name} ({n})"),
    }
}

/// An open upload destination inside the serving root.
///
/// Create it with [`UploadTarget::create`], stream chunks with
/// [`UploadTarget::write`], then either [`UploadTarget::finish`] or
/// [`UploadTarget::discard`].
#[derive(Debug)]
pub struct UploadTarget {
    file: File,
    /// File being written.
    path: PathBuf,
    /// Set when `path` is a staging file renamed over this path on finish.
    replaces: Option<PathBuf>,
    stored_name: String,
}

impl UploadTarget {
    /// Opens the destination for `name` under `root` according to `policy`.
    ///
    /// `Reject` and `Rename` use exclusive creation, so two concurrent uploads
    /// of the same name never write into the same file.  `Overwrite` writes a
    /// staging file next to the target and only replaces the target in
    /// [`UploadTarget::finish`]; a symlinked target is refused.
    ///
    /// # Errors
    ///
    /// [`RequestError::Conflict`] when the name is taken (or no free
    /// alternative exists), [`RequestError::Storage`] for other I/O failures.
    pub async fn create(
        root: &Path,
        name: &str,
        policy: CollisionPolicy,
    ) -> Result<Self, RequestError> {
        match policy {
            CollisionPolicy::Overwrite => {
                let path = root.join(name);
                if let Ok(meta) = fs::symlink_metadata(&path).await {
                    if meta.file_type().is_symlink() {
                        return Err(RequestError::Conflict(name.to_string()));
                    }
                }
                let staging = root.join(staging_name(name));
                let file = create_new(&staging).await.map_err(RequestError::Storage)?;
                let mut target = Self::opened(file, staging, name.to_string());
                target.replaces = Some(path);
                Ok(target)
            }
            CollisionPolicy::Reject => match create_new(&root.join(name)).await {
                Ok(file) => Ok(Self::opened(file, root.join(name), name.to_string())),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    Err(RequestError::Conflict(name.to_string()))
                }
                Err(e) => Err(RequestError::Storage(e)),
            },
            CollisionPolicy::Rename => {
                for attempt in 0..=MAX_RENAME_ATTEMPTS {
                    let candidate = if attempt == 0 {
                        name.to_string()
                    } else {
                        numbered_name(name, attempt)
                    };
                    let path = root.join(&candidate);
                    match create_new(&path).await {
                        Ok(file) => return Ok(Self::opened(file, path, candidate)),
                        Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
                        Err(e) => return Err(RequestError::Storage(e)),
                    }
                }
                Err(RequestError::Conflict(name.to_string()))
            }
        }
    }

    fn opened(file: File, path: PathBuf, stored_name: String) -> Self {
        Self {
            file,
            path,
            replaces: None,
            stored_name,
        }
    }

    /// The filename the upload is being stored under.
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Appends one chunk to the destination.
    pub async fn write(&mut self, chunk: &[u8]) -> Result<(), RequestError> {
        self.file
            .write_all(chunk)
            .await
            .map_err(RequestError::Storage)
    }

    /// Flushes the file, moves a staged overwrite into place and returns the
    /// stored filename.
    pub async fn finish(mut self) -> Result<String, RequestError> {
        if let Err(e) = self.file.flush().await {
            self.discard().await;
            return Err(RequestError::Storage(e));
        }
        let Self {
            file,
            path,
            replaces,
            stored_name,
        } = self;
        if let Some(target) = replaces {
            // Close the staging file first; Windows refuses to rename open files.
            drop(file);
            if let Err(e) = fs::rename(&path, &target).await {
                if let Err(e) = fs::remove_file(&path).await {
                    debug!("could not remove staged upload {}: {e}", path.display());
                }
                return Err(RequestError::Storage(e));
            }
        }
        Ok(stored_name)
    }

    /// Closes and deletes the partially written file.  A file being
    /// overwritten is left as it was.
    pub async fn discard(self) {
        let Self { file, path, .. } = self;
        drop(file);
        if let Err(e) = fs::remove_file(&path).await {
            debug!("could not remove partial upload {}: {e}", path.display());
        }
    }
}

/// Hidden sibling used while an overwrite is in flight.
fn staging_name(name: &str) -> String {
    format!(".{name}.{}.part", Uuid::new_v4().simple())
}

async fn create_new(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
}

// ── Tests ─────────────────────────────────────────────────────────────────────
