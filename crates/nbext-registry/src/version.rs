//! Host version comparison and compatibility matching.

use std::cmp::Ordering;
use std::sync::OnceLock;

use regex::Regex;

use crate::descriptor::DEFAULT_COMPATIBILITY;
use crate::RegistryError;

fn trailing_zero_groups() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    // `.0` groups at the end, optionally followed by a non-numeric release suffix.
    PATTERN.get_or_init(|| Regex::new(r"(\.0)+(?:[^.0-9][^.]*)?$").expect("valid regex"))
}

fn version_components(raw: &str) -> Result<Vec<u64>, RegistryError> {
    let trimmed = raw.trim();
    let invalid = || RegistryError::InvalidVersionFormat {
        version: raw.to_string(),
    };
    if trimmed.is_empty() {
        return Err(invalid());
    }
    let stripped = trailing_zero_groups().replace(trimmed, "");
    stripped
        .split('.')
        .map(|component| {
            if component.is_empty() || !component.bytes().all(|byte| byte.is_ascii_digit()) {
                return Err(invalid());
            }
            component.parse::<u64>().map_err(|_| invalid())
        })
        .collect()
}

/// Compares dot-separated numeric versions.
///
/// Trailing `.0` groups are ignored, so `4.2.0 == 4.2`. When every compared
/// component is equal the shorter version orders first.
pub fn version_compare(left: &str, right: &str) -> Result<Ordering, RegistryError> {
    let left_components = version_components(left)?;
    let right_components = version_components(right)?;
    for (left_component, right_component) in left_components.iter().zip(&right_components) {
        match left_component.cmp(right_component) {
            Ordering::Equal => continue,
            other => return Ok(other),
        }
    }
    Ok(left_components.len().cmp(&right_components.len()))
}

/// Token searched for in compatibility strings, e.g. `5.x` for host `5.3.1`.
pub fn compatibility_token(host_version: &str) -> String {
    let major = host_version
        .trim()
        .split('.')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    format!("{major}.x")
}

/// Returns whether `compatibility` (default `?.x`) names the host's major version.
///
/// Tokens are delimited by anything other than alphanumerics, `.` and `?`, so
/// host `1.x` does not match `11.x`.
pub fn is_compatible(compatibility: Option<&str>, host_version: &str) -> bool {
    let wanted = compatibility_token(host_version);
    compatibility
        .unwrap_or(DEFAULT_COMPATIBILITY)
        .to_lowercase()
        .split(|ch: char| !(ch.is_alphanumeric() || ch == '.' || ch == '?'))
        .any(|token| token == wanted)
}
