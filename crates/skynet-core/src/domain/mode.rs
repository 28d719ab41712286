//! Service mode: which half (or both halves) of the file service is exposed.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Selects which routes the route builder installs for one server run.
///
/// | Mode       | Routes                                                      |
/// |------------|-------------------------------------------------------------|
/// | `Download` | `/` listing, `/download/<name>`                             |
/// | `Upload`   | `/` form (GET) and upload target (POST)                     |
/// | `Combined` | `/` landing, `/upload-service`, `/download-service`, `/download/<name>` |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceMode {
    Download,
    Upload,
    #[serde(alias = "all")]
    Combined,
}

impl ServiceMode {
    /// Returns `true` if this mode installs the download routes.
    pub fn serves_downloads(self) -> bool {
        matches!(self, ServiceMode::Download | ServiceMode::Combined)
    }

    /// Returns `true` if this mode accepts uploads.
    pub fn accepts_uploads(self) -> bool {
        matches!(self, ServiceMode::Upload | ServiceMode::Combined)
    }
}

impl fmt::Display for ServiceMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ServiceMode::Download => "Download",
            ServiceMode::Upload => "Upload",
            ServiceMode::Combined => "All",
        };
        f.write_str(label)
    }
}

/// Returned when a string does not name a [`ServiceMode`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("unknown service mode '{0}' (expected download, upload or all)")]
pub struct ParseModeError(pub String);

impl FromStr for ServiceMode {
    type Err = ParseModeError;

    /// Parses `download`, `upload`, `all` or `combined`, ignoring ASCII case.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "download" => Ok(ServiceMode::Download),
            "upload" => Ok(ServiceMode::Upload),
            "all" | "combined" => Ok(ServiceMode::Combined),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_accepts_all_spellings_case_insensitively() {
        assert_eq!("download".parse(), Ok(ServiceMode::Download));
        assert_eq!("UPLOAD".parse(), Ok(ServiceMode::Upload));
        assert_eq!("All".parse(), Ok(ServiceMode::Combined));
        assert_eq!(" combined ".parse(), Ok(ServiceMode::Combined));
    }

    #[test]
    fn test_parse_rejects_unknown_mode() {
        let err = "sync".parse::<ServiceMode>().unwrap_err();
        assert_eq!(err, ParseModeError("sync".to_string()));
        assert!(err.to_string().contains("sync"));
    }

    #[test]
    fn test_display_uses_pick_list_labels() {
        assert_eq!(ServiceMode::Download.to_string(), "Download");
        assert_eq!(ServiceMode::Upload.to_string(), "Upload");
        assert_eq!(ServiceMode::Combined.to_string(), "All");
    }

    #[test]
    fn test_route_capabilities_per_mode() {
        assert!(ServiceMode::Download.serves_downloads());
        assert!(!ServiceMode::Download.accepts_uploads());
        assert!(!ServiceMode::Upload.serves_downloads());
        assert!(ServiceMode::Upload.accepts_uploads());
        assert!(ServiceMode::Combined.serves_downloads());
        assert!(ServiceMode::Combined.accepts_uploads());
    }

    #[test]
    fn test_serde_uses_lowercase_and_accepts_all_alias() {
        let json = serde_json::to_string(&ServiceMode::Combined).unwrap();
        assert_eq!(json, "\"combined\"");
        let parsed: ServiceMode = serde_json::from_str("\"all\"").unwrap();
        assert_eq!(parsed, ServiceMode::Combined);
    }
}
