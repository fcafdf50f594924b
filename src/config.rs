//! Runtime configuration from `.env` files and environment variables.
//!
//! Variables:
//!   - TESSERACT_PATH   tesseract binary (default: looked up on PATH)
//!   - OCR_LANG         recognition language (default: eng)
//!   - OCR_PSM          tesseract page segmentation mode, 0–13
//!   - OCR_TIMEOUT_SECS per-recognition timeout (default: 30)
//!   - PROFILES_PATH    extra site profiles JSON
//!                        (default: <config dir>/product-extractor/profiles.json)

use crate::error::ExtractError;
use crate::ocr::tesseract::{TesseractConfig, DEFAULT_LANGUAGE, DEFAULT_TIMEOUT_SECS};
use crate::profiles::ProfileRegistry;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_DIR: &str = "product-extractor";
const PROFILES_FILENAME: &str = "profiles.json";

/// Everything the binary needs before the first run.
#[derive(Debug, Clone)]
pub struct ExtractorConfig {
    pub ocr: TesseractConfig,
    pub profiles_path: Option<PathBuf>,
}

/// Load `.env.local`, then `.env`, from `dir`. The first file found wins.
pub fn load_env_files(dir: &Path) {
    for env_file in [".env.local", ".env"] {
        let path = dir.join(env_file);
        if path.exists() {
            match dotenvy::from_path(&path) {
                Ok(_) => log::info!("[CONFIG] Loaded {}", path.display()),
                Err(e) => log::warn!("[CONFIG] Failed to load {}: {}", path.display(), e),
            }
            return;
        }
    }
}

/// Default location of the extra profiles file.
pub fn default_profiles_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR)
        .join(PROFILES_FILENAME)
}

impl ExtractorConfig {
    /// Read configuration from the process environment.
    pub fn from_env() -> Self {
        let var = |key: &str| std::env::var(key).ok().filter(|v| !v.trim().is_empty());

        let ocr = TesseractConfig {
            binary: var("TESSERACT_PATH").map(PathBuf::from),
            language: var("OCR_LANG").unwrap_or_else(|| DEFAULT_LANGUAGE.to_string()),
            page_seg_mode: parse_psm(var("OCR_PSM").as_deref()),
            timeout: parse_timeout(var("OCR_TIMEOUT_SECS").as_deref()),
        };

        let profiles_path = match var("PROFILES_PATH") {
            Some(p) => Some(PathBuf::from(p)),
            None => {
                let path = default_profiles_path();
                path.exists().then_some(path)
            }
        };

        Self { ocr, profiles_path }
    }

    /// Build the profile registry this configuration points at.
    pub fn registry(&self) -> Result<ProfileRegistry, ExtractError> {
        match &self.profiles_path {
            Some(path) => ProfileRegistry::load(path),
            None => Ok(ProfileRegistry::builtin()),
        }
    }
}

/// Parse OCR_PSM; out-of-range or malformed values are ignored.
pub fn parse_psm(raw: Option<&str>) -> Option<u8> {
    let raw = raw?;
    match raw.trim().parse::<u8>() {
        Ok(psm) if psm <= 13 => Some(psm),
        _ => {
            log::warn!("[CONFIG] Ignoring invalid OCR_PSM '{}'", raw);
            None
        }
    }
}

/// Parse OCR_TIMEOUT_SECS; malformed or zero values fall back to the default.
pub fn parse_timeout(raw: Option<&str>) -> Duration {
    let default = Duration::from_secs(DEFAULT_TIMEOUT_SECS);
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Duration::from_secs(secs),
        _ => {
            log::warn!(
                "[CONFIG] Invalid OCR_TIMEOUT_SECS '{}', using {}s",
                raw,
                DEFAULT_TIMEOUT_SECS
            );
            default
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn psm_accepts_valid_modes_only() {
        assert_eq!(parse_psm(None), None);
        assert_eq!(parse_psm(Some("6")), Some(6));
        assert_eq!(parse_psm(Some(" 13 ")), Some(13));
        assert_eq!(parse_psm(Some("14")), None);
        assert_eq!(parse_psm(Some("auto")), None);
    }

    #[test]
    fn timeout_falls_back_on_bad_values() {
        assert_eq!(parse_timeout(None), Duration::from_secs(30));
        assert_eq!(parse_timeout(Some("5")), Duration::from_secs(5));
        assert_eq!(parse_timeout(Some("0")), Duration::from_secs(30));
        assert_eq!(parse_timeout(Some("soon")), Duration::from_secs(30));
    }

    #[test]
    fn default_profiles_path_ends_with_app_file() {
        let path = default_profiles_path();
        assert!(path.ends_with("product-extractor/profiles.json"));
    }

    #[test]
    fn registry_loads_from_configured_file() {
        let dir = std::env::temp_dir().join("pe-test-config-registry");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("profiles.json");
        fs::write(
            &path,
            r#"{"profiles": [{
                "name": "OfferUp",
                "hostPattern": "offerup.com",
                "blacklistKeywords": ["offerup"],
                "title": {"strategy": "region", "region": {"yStart": 10, "yEnd": 18, "xStart": 55, "xEnd": 95}},
                "description": {"strategy": "disabled"},
                "image": {"yStart": 10, "yEnd": 80, "xStart": 5, "xEnd": 55}
            }]}"#,
        )
        .unwrap();

        let config = ExtractorConfig {
            ocr: TesseractConfig::default(),
            profiles_path: Some(path),
        };
        let registry = config.registry().unwrap();
        assert!(registry.get("OfferUp").is_some());
        assert!(registry.is_supported_url("https://offerup.com/item/detail/1"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn env_file_values_are_loaded() {
        let dir = std::env::temp_dir().join("pe-test-env-files");
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(".env.local"), "PE_TEST_ENV_LOCAL_ONLY=local\n").unwrap();
        fs::write(dir.join(".env"), "PE_TEST_ENV_FALLBACK_ONLY=fallback\n").unwrap();

        load_env_files(&dir);
        assert_eq!(std::env::var("PE_TEST_ENV_LOCAL_ONLY").unwrap(), "local");
        // .env.local was found, so .env is not read.
        assert!(std::env::var("PE_TEST_ENV_FALLBACK_ONLY").is_err());

        let _ = fs::remove_dir_all(&dir);
    }
}
