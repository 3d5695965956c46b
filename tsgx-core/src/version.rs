//! Installed package version

use std::path::Path;

pub const UNKNOWN_VERSION: &str = "(version unknown)";

/// First line of the version file written by the package installer
pub fn installed_version(path: &Path) -> String {
    std::fs::read_to_string(path)
        .ok()
        .and_then(|contents| contents.lines().next().map(|line| line.trim().to_string()))
        .filter(|version| !version.is_empty())
        .unwrap_or_else(|| UNKNOWN_VERSION.to_string())
}
