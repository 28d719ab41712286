//! Platform aliases for well-known environment variables.
//!
//! Unix shells export `HOME`, `USER`, `PWD` and friends; Windows spells the
//! same concepts differently.  Entry points ask for the portable name and
//! [`platform_variable`] reads whichever variable the running platform
//! actually sets.
//!
//! The service manager never consults this table.  It receives concrete
//! values (a directory path, an address) from its callers.

/// Portable name → Windows name.
const WINDOWS_ALIASES: [(&str, &str); 5] = [
    ("HOME", "USERPROFILE"),
    ("USER", "USERNAME"),
    ("SHELL", "ComSpec"),
    ("PWD", "CD"),
    ("HOSTNAME", "COMPUTERNAME"),
];

/// Returns the variable name to read for `key` on the platform `os`.
///
/// `os` uses the values of [`std::env::consts::OS`].  Unknown keys and
/// non-Windows platforms pass through unchanged.
pub fn resolve_alias<'a>(key: &'a str, os: &str) -> &'a str {
    if os != "windows" {
        return key;
    }
    WINDOWS_ALIASES
        .iter()
        .find(|(portable, _)| *portable == key)
        .map(|(_, native)| *native)
        .unwrap_or(key)
}

/// Reads the environment variable `key` under its platform-specific name.
///
/// Returns `None` when the variable is unset or not valid Unicode.
pub fn platform_variable(key: &str) -> Option<String> {
    let name = resolve_alias(key, std::env::consts::OS);
    std::env::var(name).ok().filter(|value| !value.is_empty())
}

/// Name of the user who launched the process.
///
/// When running under `sudo`, `SUDO_USER` holds the original user and takes
/// precedence over `USER`.
pub fn invoking_user() -> Option<String> {
    platform_variable("SUDO_USER").or_else(|| platform_variable("USER"))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
