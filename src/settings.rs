//! Config file loading.

use std::path::{Path, PathBuf};

use color_eyre::eyre::{Context, Result};
use serde::Deserialize;

use cleanslate_core::{EngineConfig, ScanConfig};

/// Contents of `config.toml`. Every section and key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub scan: ScanConfig,
    pub engine: EngineConfig,
}

impl Settings {
    /// Default config file location.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("cleanslate").join("config.toml"))
    }

    /// Load settings from `path`, or from the default location.
    ///
    /// A missing default file means defaults; a missing explicit file is an
    /// error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        if !explicit && !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)
            .wrap_err_with(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).wrap_err_with(|| format!("Invalid config {}", path.display()))
    }

    /// Parse and validate a TOML document.
    pub fn parse(content: &str) -> Result<Self> {
        let raw: Self = toml::from_str(content)?;
        let engine = EngineConfig::builder()
            .large_file_threshold(raw.engine.large_file_threshold)
            .old_file_days(raw.engine.old_file_days)
            .min_scored_size(raw.engine.min_scored_size)
            .fingerprint_prefix(raw.engine.fingerprint_prefix)
            .verify_large_candidates(raw.engine.verify_large_candidates)
            .build()?;
        Ok(Self {
            scan: raw.scan,
            engine,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_empty_document_is_default() {
        let settings = Settings::parse("").unwrap();
        assert_eq!(settings.engine, EngineConfig::default());
        assert!(settings.scan.include_hidden);
    }

    #[test]
    fn test_partial_sections() {
        let settings = Settings::parse(
            r#"
            [scan]
            ignore_patterns = ["node_modules", "*.part"]
            include_hidden = false

            [engine]
            old_file_days = 90
            "#,
        )
        .unwrap();
        assert_eq!(settings.scan.ignore_patterns.len(), 2);
        assert!(!settings.scan.include_hidden);
        assert_eq!(settings.engine.old_file_days, 90);
        assert_eq!(
            settings.engine.large_file_threshold,
            EngineConfig::default().large_file_threshold
        );
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        for invalid in [
            "[engine]\nfingerprint_prefix = 0\n",
            "[engine]\nlarge_file_threshold = 0\n",
            "[colors]\ntheme = \"dark\"\n",
        ] {
            assert!(Settings::parse(invalid).is_err(), "{invalid}");
        }
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let temp = TempDir::new().unwrap();
        let absent = temp.path().join("absent.toml");
        assert!(Settings::load(Some(&absent)).is_err());

        let path = temp.path().join("config.toml");
        std::fs::write(&path, "[engine]\nold_file_days = 30\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.engine.old_file_days, 30);
    }
}
