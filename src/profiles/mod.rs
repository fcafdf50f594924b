//! Site profile registry.
//!
//! A profile is plain data: percentage-based regions for the title,
//! description and photo, plus the keywords that disqualify OCR lines.
//! Adding a site means adding a `SiteProfile` value (built in, or through
//! the profiles JSON file), never touching the pipeline.
//!
//! The registry is built once at startup and is read-only afterwards.

pub mod detect;

use crate::error::ExtractError;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub use detect::detect_profile;

/// Default minimum cleaned length for an accepted title.
pub const DEFAULT_MIN_TITLE_LENGTH: usize = 1;

/// Rectangle expressed as percentages (0–100) of image height and width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Region {
    pub y_start: f64,
    pub y_end: f64,
    pub x_start: f64,
    pub x_end: f64,
}

impl Region {
    pub const fn new(y_start: f64, y_end: f64, x_start: f64, x_end: f64) -> Self {
        Self { y_start, y_end, x_start, x_end }
    }

    /// Check `0 <= start < end <= 100` on both axes.
    pub fn validate(&self) -> Result<(), String> {
        let in_range = |v: f64| (0.0..=100.0).contains(&v);
        if ![self.y_start, self.y_end, self.x_start, self.x_end]
            .iter()
            .all(|v| in_range(*v))
        {
            return Err(format!("bounds must be within 0..=100, got {:?}", self));
        }
        if self.y_start >= self.y_end {
            return Err(format!("yStart {} must be below yEnd {}", self.y_start, self.y_end));
        }
        if self.x_start >= self.x_end {
            return Err(format!("xStart {} must be below xEnd {}", self.x_start, self.x_end));
        }
        Ok(())
    }
}

/// How a text field is located on the page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "lowercase")]
pub enum FieldStrategy {
    /// Crop the region and run OCR on it.
    Region { region: Region },
    /// Field is not extracted; the result carries the sentinel.
    Disabled,
}

impl FieldStrategy {
    pub fn region(&self) -> Option<&Region> {
        match self {
            FieldStrategy::Region { region } => Some(region),
            FieldStrategy::Disabled => None,
        }
    }
}

/// Layout knowledge for one supported site.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SiteProfile {
    pub name: String,
    /// Substring looked for (case-insensitively) in the page URL.
    pub host_pattern: String,
    /// Lowercase tokens; a line containing any of them is never a candidate.
    #[serde(default)]
    pub blacklist_keywords: Vec<String>,
    pub title: FieldStrategy,
    pub description: FieldStrategy,
    pub image: Region,
    #[serde(default = "default_min_title_length")]
    pub min_title_length: usize,
}

fn default_min_title_length() -> usize {
    DEFAULT_MIN_TITLE_LENGTH
}

impl SiteProfile {
    /// True if the line contains any blacklisted keyword (case-insensitive).
    pub fn is_blacklisted(&self, line: &str) -> bool {
        let lower = line.to_lowercase();
        self.blacklist_keywords.iter().any(|k| lower.contains(k.as_str()))
    }

    /// Trim and lowercase keywords, dropping empties.
    ///
    /// An empty keyword would be a substring of every line.
    pub fn normalize(&mut self) {
        self.blacklist_keywords = self
            .blacklist_keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        self.host_pattern = self.host_pattern.trim().to_lowercase();
    }

    /// Check the profile invariants: non-empty name and host, valid regions.
    pub fn validate(&self) -> Result<(), ExtractError> {
        let invalid = |reason: String| ExtractError::InvalidProfile {
            name: self.name.clone(),
            reason,
        };
        if self.name.trim().is_empty() {
            return Err(invalid("name must not be empty".to_string()));
        }
        if self.host_pattern.trim().is_empty() {
            return Err(invalid("hostPattern must not be empty".to_string()));
        }
        if let Some(region) = self.title.region() {
            region.validate().map_err(|e| invalid(format!("title: {}", e)))?;
        }
        if let Some(region) = self.description.region() {
            region.validate().map_err(|e| invalid(format!("description: {}", e)))?;
        }
        self.image
            .validate()
            .map_err(|e| invalid(format!("image: {}", e)))?;
        Ok(())
    }
}

/// Built-in profiles, in detection order.
pub fn builtin_profiles() -> Vec<SiteProfile> {
    vec![
        SiteProfile {
            name: "Craigslist".to_string(),
            host_pattern: "craigslist.org".to_string(),
            blacklist_keywords: vec!["craigslist".to_string(), "posted".to_string()],
            title: FieldStrategy::Region {
                region: Region::new(11.0, 15.0, 10.0, 72.0),
            },
            description: FieldStrategy::Region {
                region: Region::new(74.0, 80.0, 9.0, 64.0),
            },
            image: Region::new(17.0, 68.0, 19.0, 55.0),
            min_title_length: 1,
        },
        SiteProfile {
            name: "eBay".to_string(),
            host_pattern: "ebay.com".to_string(),
            blacklist_keywords: vec!["ebay".to_string(), "cart".to_string()],
            title: FieldStrategy::Region {
                region: Region::new(25.0, 35.0, 62.0, 99.0),
            },
            description: FieldStrategy::Region {
                region: Region::new(63.0, 72.0, 69.0, 97.0),
            },
            image: Region::new(26.0, 92.0, 10.0, 62.0),
            min_title_length: 1,
        },
        SiteProfile {
            name: "Facebook".to_string(),
            host_pattern: "facebook.com/marketplace".to_string(),
            blacklist_keywords: vec!["facebook".to_string(), "marketplace".to_string()],
            title: FieldStrategy::Region {
                region: Region::new(4.0, 16.0, 79.0, 100.0),
            },
            description: FieldStrategy::Region {
                region: Region::new(27.0, 40.0, 79.0, 100.0),
            },
            image: Region::new(4.0, 98.0, 15.0, 69.0),
            min_title_length: 1,
        },
    ]
}

/// On-disk format of the extra profiles file.
#[derive(Debug, Deserialize)]
struct ProfilesFile {
    profiles: Vec<SiteProfile>,
}

/// Ordered, immutable set of site profiles.
#[derive(Debug, Clone)]
pub struct ProfileRegistry {
    profiles: Vec<SiteProfile>,
}

impl ProfileRegistry {
    /// Registry holding only the built-in profiles.
    pub fn builtin() -> Self {
        Self {
            profiles: builtin_profiles(),
        }
    }

    /// Built-ins merged with `extra`, validated.
    ///
    /// A profile named like a built-in replaces it at the same position so
    /// detection order is preserved; new names go after the built-ins.
    pub fn with_profiles(extra: Vec<SiteProfile>) -> Result<Self, ExtractError> {
        let mut profiles = builtin_profiles();
        for mut profile in extra {
            profile.normalize();
            profile.validate()?;
            match profiles.iter_mut().find(|p| p.name == profile.name) {
                Some(slot) => {
                    log::info!("[PROFILE] Overriding built-in profile '{}'", profile.name);
                    *slot = profile;
                }
                None => {
                    log::info!(
                        "[PROFILE] Registered profile '{}' for '{}'",
                        profile.name,
                        profile.host_pattern
                    );
                    profiles.push(profile);
                }
            }
        }
        Ok(Self { profiles })
    }

    /// Parse a profiles JSON document and merge it over the built-ins.
    pub fn from_json(raw: &str) -> Result<Self, ExtractError> {
        let file: ProfilesFile = serde_json::from_str(raw)
            .map_err(|e| ExtractError::Config(format!("Invalid profiles JSON: {}", e)))?;
        Self::with_profiles(file.profiles)
    }

    /// Load extra profiles from a file; a missing file means built-ins only.
    pub fn load(path: &Path) -> Result<Self, ExtractError> {
        if !path.exists() {
            log::info!("[PROFILE] No profiles file at {}, using built-ins", path.display());
            return Ok(Self::builtin());
        }
        let raw = std::fs::read_to_string(path).map_err(|e| {
            ExtractError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        let registry = Self::from_json(&raw)?;
        log::info!(
            "[PROFILE] Loaded {} profiles ({})",
            registry.len(),
            path.display()
        );
        Ok(registry)
    }

    /// Look up a profile by name.
    pub fn get(&self, name: &str) -> Option<&SiteProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Profiles in detection order.
    pub fn profiles(&self) -> &[SiteProfile] {
        &self.profiles
    }

    /// The profile whose host pattern matches `url`, first match wins.
    pub fn resolve(&self, url: &str) -> Result<&SiteProfile, ExtractError> {
        detect_profile(self, url)
            .and_then(|name| self.get(name))
            .ok_or_else(|| ExtractError::UnsupportedSite {
                url: url.to_string(),
            })
    }

    /// Whether any profile's host pattern matches the URL.
    pub fn is_supported_url(&self, url: &str) -> bool {
        detect_profile(self, url).is_some()
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

impl Default for ProfileRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_regions_are_within_bounds_and_monotonic() {
        for profile in builtin_profiles() {
            profile.validate().unwrap();
            let regions = [
                profile.title.region().copied(),
                profile.description.region().copied(),
                Some(profile.image),
            ];
            for region in regions.into_iter().flatten() {
                assert!(0.0 <= region.y_start && region.y_start < region.y_end && region.y_end <= 100.0);
                assert!(0.0 <= region.x_start && region.x_start < region.x_end && region.x_end <= 100.0);
            }
        }
    }

    #[test]
    fn builtin_blacklists_are_lowercase() {
        for profile in builtin_profiles() {
            for keyword in &profile.blacklist_keywords {
                assert_eq!(keyword, &keyword.to_lowercase());
            }
        }
    }

    #[test]
    fn region_validation_rejects_inverted_and_out_of_range() {
        assert!(Region::new(20.0, 10.0, 0.0, 50.0).validate().is_err());
        assert!(Region::new(0.0, 10.0, 50.0, 50.0).validate().is_err());
        assert!(Region::new(0.0, 101.0, 0.0, 50.0).validate().is_err());
        assert!(Region::new(-1.0, 10.0, 0.0, 50.0).validate().is_err());
        assert!(Region::new(0.0, 100.0, 0.0, 100.0).validate().is_ok());
    }

    #[test]
    fn resolve_returns_profile_or_unsupported_site() {
        let registry = ProfileRegistry::builtin();
        let profile = registry
            .resolve("https://www.ebay.com/itm/1234")
            .unwrap();
        assert_eq!(profile.name, "eBay");

        let err = registry.resolve("https://www.amazon.com/dp/B0").unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedSite { .. }));
    }

    #[test]
    fn blacklist_match_is_case_insensitive() {
        let profile = builtin_profiles().remove(1);
        assert!(profile.is_blacklisted("Shop on eBay"));
        assert!(profile.is_blacklisted("Add to CART"));
        assert!(!profile.is_blacklisted("Vintage Leather Jacket"));
    }

    #[test]
    fn json_profiles_append_and_override() {
        let raw = r#"{
            "profiles": [
                {
                    "name": "Kijiji",
                    "hostPattern": "Kijiji.ca",
                    "blacklistKeywords": [" Kijiji ", "", "Report Ad"],
                    "title": {"strategy": "region", "region": {"yStart": 10, "yEnd": 20, "xStart": 5, "xEnd": 60}},
                    "description": {"strategy": "disabled"},
                    "image": {"yStart": 20, "yEnd": 70, "xStart": 5, "xEnd": 60}
                },
                {
                    "name": "eBay",
                    "hostPattern": "ebay.com",
                    "blacklistKeywords": ["ebay"],
                    "title": {"strategy": "region", "region": {"yStart": 20, "yEnd": 30, "xStart": 60, "xEnd": 99}},
                    "description": {"strategy": "disabled"},
                    "image": {"yStart": 26, "yEnd": 92, "xStart": 10, "xEnd": 62},
                    "minTitleLength": 5
                }
            ]
        }"#;
        let registry = ProfileRegistry::from_json(raw).unwrap();
        let names: Vec<&str> = registry.profiles().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Craigslist", "eBay", "Facebook", "Kijiji"]);

        let kijiji = registry.get("Kijiji").unwrap();
        assert_eq!(kijiji.host_pattern, "kijiji.ca");
        assert_eq!(kijiji.blacklist_keywords, vec!["kijiji", "report ad"]);
        assert_eq!(kijiji.min_title_length, DEFAULT_MIN_TITLE_LENGTH);
        assert_eq!(kijiji.description, FieldStrategy::Disabled);

        let ebay = registry.get("eBay").unwrap();
        assert_eq!(ebay.min_title_length, 5);
        assert_eq!(ebay.title.region().unwrap().y_start, 20.0);
    }

    #[test]
    fn json_profile_with_bad_region_is_rejected() {
        let raw = r#"{
            "profiles": [{
                "name": "Broken",
                "hostPattern": "broken.example",
                "title": {"strategy": "region", "region": {"yStart": 30, "yEnd": 10, "xStart": 0, "xEnd": 50}},
                "description": {"strategy": "disabled"},
                "image": {"yStart": 0, "yEnd": 50, "xStart": 0, "xEnd": 50}
            }]
        }"#;
        let err = ProfileRegistry::from_json(raw).unwrap_err();
        match err {
            ExtractError::InvalidProfile { name, reason } => {
                assert_eq!(name, "Broken");
                assert!(reason.starts_with("title"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn region_strategy_without_rectangle_fails_to_parse() {
        let raw = r#"{
            "profiles": [{
                "name": "NoRect",
                "hostPattern": "norect.example",
                "title": {"strategy": "region"},
                "description": {"strategy": "disabled"},
                "image": {"yStart": 0, "yEnd": 50, "xStart": 0, "xEnd": 50}
            }]
        }"#;
        assert!(matches!(
            ProfileRegistry::from_json(raw),
            Err(ExtractError::Config(_))
        ));
    }

    #[test]
    fn missing_profiles_file_falls_back_to_builtins() {
        let path = std::env::temp_dir().join("pe-test-no-such-profiles.json");
        let _ = std::fs::remove_file(&path);
        let registry = ProfileRegistry::load(&path).unwrap();
        assert_eq!(registry.len(), 3);
    }
}
