//! URL → profile name.
//!
//! Case-insensitive substring match over the registry's host patterns, in
//! registry order. First match wins. No match is the normal "unsupported
//! site" outcome, not an error.

use super::ProfileRegistry;

/// Name of the first profile whose host pattern occurs in `url`.
pub fn detect_profile<'a>(registry: &'a ProfileRegistry, url: &str) -> Option<&'a str> {
    let url = url.to_lowercase();
    let found = registry
        .profiles()
        .iter()
        .find(|p| url.contains(&p.host_pattern.to_lowercase()))
        .map(|p| p.name.as_str());

    match found {
        Some(name) => log::debug!("[PROFILE] '{}' matched profile {}", url, name),
        None => log::debug!("[PROFILE] No profile for '{}'", url),
    }
    found
}
