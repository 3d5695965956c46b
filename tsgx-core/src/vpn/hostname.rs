//! Host label derivation from the GX system name
//!
//! The system name may contain characters that are not valid in a DNS
//! label. The derived label is only passed on the next `up`/`login`.

use tracing::{info, warn};

/// Characters replaced by `-`
pub const DISALLOWED_CHARS: &[char] = &[
    '!', '@', '#', '$', '%', '^', '&', '*', '(', ')', '[', ']', '{', '}', ';', ':', ',', '.', '/',
    '<', '>', '?', '|', '`', '\'', '~', '=', '_', '+', ' ', '\\',
];

/// Turn a display name into a hostname label
///
/// Empty input gives an empty label, meaning "omit `--hostname`".
pub fn sanitize_hostname(name: &str) -> String {
    name.replace(DISALLOWED_CHARS, "-")
        .trim_matches(|c| c == '-' || c == ' ')
        .to_lowercase()
}

/// Tracks the system name and recomputes the label when it changes
#[derive(Debug, Default)]
pub struct HostnameTracker {
    /// Last observed raw name; `None` before the first observation
    system_name: Option<Option<String>>,
    label: String,
}

impl HostnameTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record this cycle's system name; returns true when the label changed
    pub fn observe(&mut self, name: Option<&str>) -> bool {
        let name = name.map(str::to_string);
        if self.system_name.as_ref() == Some(&name) {
            return false;
        }

        let label = match name.as_deref() {
            None | Some("") => {
                warn!("no system name so no host name");
                String::new()
            }
            Some(raw) => {
                let label = sanitize_hostname(raw);
                info!("system name changed to {}", raw);
                info!("new host name {} will be used on NEXT login", label);
                label
            }
        };

        self.system_name = Some(name);
        let changed = label != self.label;
        self.label = label;
        changed
    }

    /// Label to pass on the next `up`/`login`
    pub fn label(&self) -> &str {
        &self.label
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize_hostname("My Boat (Main)"), "my-boat--main");
        assert_eq!(sanitize_hostname("--cerbo_gx--"), "cerbo-gx");
        assert_eq!(sanitize_hostname(r"a\b"), "a-b");
        assert_eq!(sanitize_hostname(""), "");
        assert_eq!(sanitize_hostname("!!!"), "");
    }

    #[test]
    fn test_tracker_only_recomputes_on_change() {
        let mut tracker = HostnameTracker::new();
        assert!(tracker.observe(Some("Van GX")));
        assert_eq!(tracker.label(), "van-gx");
        assert!(!tracker.observe(Some("Van GX")));
        assert!(tracker.observe(None));
        assert_eq!(tracker.label(), "");
    }
}
