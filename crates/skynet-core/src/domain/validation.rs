//! Validation rules applied before any network resource is touched.
//!
//! Both the CLI and the service manager run these checks first, so an invalid
//! port never reaches `bind()` and a bad directory never reaches the route
//! builder.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Ports below this value require elevated privileges on most systems.
pub const PRIVILEGED_PORT_CEILING: u16 = 1024;

/// A request was rejected before any socket or file was opened.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// The port is outside `[1, 65535]`.
    #[error("port {0} is out of range (expected 1-65535)")]
    PortOutOfRange(u32),

    /// The port is below 1024 and the process is not privileged.
    #[error("port {0} requires elevated privileges (use a port of 1024 or above)")]
    PrivilegedPort(u16),

    /// The serving directory does not exist.
    #[error("directory '{0}' does not exist")]
    DirectoryMissing(PathBuf),

    /// The serving path exists but is not a directory.
    #[error("'{0}' is not a directory")]
    NotADirectory(PathBuf),
}

/// Checks that `port` is a usable listen port.
///
/// `port` is taken as `u32` so that out-of-range values coming from a CLI or
/// a GUI text field can be reported instead of silently truncated.
///
/// # Errors
///
/// - [`ValidationError::PortOutOfRange`] for `0` or anything above `65535`.
/// - [`ValidationError::PrivilegedPort`] for `1..1024` unless
///   `allow_privileged` is set.
pub fn validate_port(port: u32, allow_privileged: bool) -> Result<u16, ValidationError> {
    let port = match u16::try_from(port) {
        Ok(p) if p != 0 => p,
        _ => return Err(ValidationError::PortOutOfRange(port)),
    };

    if port < PRIVILEGED_PORT_CEILING && !allow_privileged {
        return Err(ValidationError::PrivilegedPort(port));
    }

    Ok(port)
}

/// Checks that `dir` names an existing directory and returns it as an
/// absolute path.
///
/// Relative paths are resolved against `base` (normally the process working
/// directory).  The service manager does not use this check: it creates
/// missing directories on demand.  Entry points that refuse to serve a
/// missing directory call it instead.
///
/// # Errors
///
/// [`ValidationError::DirectoryMissing`] or [`ValidationError::NotADirectory`].
pub fn validate_existing_directory(dir: &Path, base: &Path) -> Result<PathBuf, ValidationError> {
    let absolute = if dir.is_absolute() {
        dir.to_path_buf()
    } else {
        base.join(dir)
    };

    if !absolute.exists() {
        return Err(ValidationError::DirectoryMissing(absolute));
    }
    if !absolute.is_dir() {
        return Err(ValidationError::NotADirectory(absolute));
    }

    Ok(absolute)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_port_accepts_unprivileged_range() {
        assert_eq!(validate_port(1024, false), Ok(1024));
        assert_eq!(validate_port(8080, false), Ok(8080));
        assert_eq!(validate_port(65535, false), Ok(65535));
    }

    #[test]
    fn test_validate_port_rejects_zero_and_overflow() {
        assert_eq!(validate_port(0, true), Err(ValidationError::PortOutOfRange(0)));
        assert_eq!(
            validate_port(65536, true),
            Err(ValidationError::PortOutOfRange(65536))
        );
    }

    #[test]
    fn test_validate_port_rejects_privileged_without_permission() {
        assert_eq!(validate_port(80, false), Err(ValidationError::PrivilegedPort(80)));
        assert_eq!(
            validate_port(1023, false),
            Err(ValidationError::PrivilegedPort(1023))
        );
    }

    #[test]
    fn test_validate_port_allows_privileged_when_permitted() {
        assert_eq!(validate_port(80, true), Ok(80));
        assert_eq!(validate_port(1, true), Ok(1));
    }

    #[test]
    fn test_validate_existing_directory_resolves_relative_paths() {
        // Arrange
        let base = tempfile::tempdir().unwrap();
        std::fs::create_dir(base.path().join("share")).unwrap();

        // Act
        let resolved = validate_existing_directory(Path::new("share"), base.path()).unwrap();

        // Assert
        assert_eq!(resolved, base.path().join("share"));
        assert!(resolved.is_absolute());
    }

    #[test]
    fn test_validate_existing_directory_reports_missing() {
        let base = tempfile::tempdir().unwrap();
        let missing = base.path().join("nope");

        let err = validate_existing_directory(&missing, base.path()).unwrap_err();

        assert_eq!(err, ValidationError::DirectoryMissing(missing));
    }

    #[test]
    fn test_validate_existing_directory_rejects_files() {
        let base = tempfile::tempdir().unwrap();
        let file = base.path().join("a.txt");
        std::fs::write(&file, b"x").unwrap();

        let err = validate_existing_directory(&file, base.path()).unwrap_err();

        assert_eq!(err, ValidationError::NotADirectory(file));
    }
}
