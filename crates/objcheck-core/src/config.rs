use crate::crvd::{CrvdSettings, DEFAULT_CONTENT_LENGTH, DEFAULT_RANDOM_SEED};
use crate::digest::Algorithm;
use crate::error::{Error, Result};
use crate::objects::HttpSettings;
use crate::progress::{ProgressSettings, DEFAULT_PROGRESS_INTERVAL};
use crate::streaming::DEFAULT_RANGE_SIZE;
use crate::target::TargetOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Global configuration loaded from `~/.config/objcheck/config.toml`.
/// Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObjcheckConfig {
    /// Maximum bytes requested per ranged GET.
    pub range_size: u64,
    /// Digest algorithm name: "sha256" or "md5".
    pub algorithm: String,
    /// Body size for `crvd` and key validation, in bytes.
    pub content_length: u64,
    pub random_seed: u64,
    /// Seconds between progress log lines; 0 disables progress reporting.
    pub progress_interval_secs: u64,
    /// Service endpoint for `s3://` bucket URLs.
    pub endpoint: Option<String>,
    pub region: Option<String>,
    pub http: HttpSettings,
}

impl Default for ObjcheckConfig {
    fn default() -> Self {
        Self {
            range_size: DEFAULT_RANGE_SIZE,
            algorithm: Algorithm::default().name().to_string(),
            content_length: DEFAULT_CONTENT_LENGTH,
            random_seed: DEFAULT_RANDOM_SEED,
            progress_interval_secs: DEFAULT_PROGRESS_INTERVAL.as_secs(),
            endpoint: None,
            region: None,
            http: HttpSettings::default(),
        }
    }
}

impl ObjcheckConfig {
    /// Checks every field that could only fail later, mid-transfer.
    pub fn validate(&self) -> Result<()> {
        self.algorithm()?;
        if self.range_size == 0 {
            return Err(Error::Config("range_size must be greater than 0".to_string()));
        }
        Ok(())
    }

    pub fn algorithm(&self) -> Result<Algorithm> {
        self.algorithm.parse()
    }

    pub fn progress(&self) -> Option<ProgressSettings> {
        if self.progress_interval_secs == 0 {
            return None;
        }
        Some(ProgressSettings {
            interval: Duration::from_secs(self.progress_interval_secs),
            ..ProgressSettings::default()
        })
    }

    /// Round-trip settings derived from this config. Fails on invalid fields.
    pub fn crvd_settings(&self) -> Result<CrvdSettings> {
        self.validate()?;
        Ok(CrvdSettings {
            content_length: self.content_length,
            random_seed: self.random_seed,
            algorithm: self.algorithm()?,
            range_size: self.range_size,
            progress: self.progress(),
        })
    }

    pub fn target_options(&self) -> TargetOptions {
        TargetOptions {
            endpoint: self.endpoint.clone(),
            region: self.region.clone(),
            http: self.http,
        }
    }
}

pub fn config_path() -> Result<PathBuf> {
    let xdg_dirs = xdg::BaseDirectories::with_prefix("objcheck")?;
    Ok(xdg_dirs.place_config_file("config.toml")?)
}

/// Load configuration from disk, creating a default file if none exists.
pub fn load_or_init() -> Result<ObjcheckConfig> {
    let path = config_path()?;
    if !path.exists() {
        let default_cfg = ObjcheckConfig::default();
        let toml = toml::to_string_pretty(&default_cfg)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, toml)?;
        tracing::info!("created default config at {}", path.display());
        return Ok(default_cfg);
    }
    load_from(&path)
}

pub fn load_from(path: &Path) -> Result<ObjcheckConfig> {
    let data = fs::read_to_string(path)?;
    let cfg: ObjcheckConfig = toml::from_str(&data)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_values() {
        let cfg = ObjcheckConfig::default();
        assert_eq!(cfg.range_size, 5 * 1024 * 1024);
        assert_eq!(cfg.algorithm, "sha256");
        assert_eq!(cfg.content_length, 8);
        assert_eq!(cfg.random_seed, 1);
        assert_eq!(cfg.progress_interval_secs, 1);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn config_toml_roundtrip() {
        let cfg = ObjcheckConfig {
            endpoint: Some("http://127.0.0.1:9000/".to_string()),
            ..ObjcheckConfig::default()
        };
        let toml = toml::to_string_pretty(&cfg).unwrap();
        let parsed: ObjcheckConfig = toml::from_str(&toml).unwrap();
        assert_eq!(parsed, cfg);
    }

    #[test]
    fn config_toml_partial_values() {
        let toml = r#"
            algorithm = "md5"
            range_size = 1048576
            region = "eu-central-1"

            [http]
            connect_timeout_secs = 5
            low_speed_limit = 1
            low_speed_time_secs = 10
            timeout_secs = 60
        "#;
        let cfg: ObjcheckConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.algorithm().unwrap(), Algorithm::Md5);
        assert_eq!(cfg.range_size, 1_048_576);
        assert_eq!(cfg.content_length, 8);
        assert_eq!(cfg.http.connect_timeout_secs, 5);
        let opts = cfg.target_options();
        assert_eq!(opts.region.as_deref(), Some("eu-central-1"));
        assert!(opts.endpoint.is_none());
    }

    #[test]
    fn unsupported_algorithm_fails_validation() {
        let cfg = ObjcheckConfig {
            algorithm: "crc32".to_string(),
            ..ObjcheckConfig::default()
        };
        let err = cfg.crvd_settings().unwrap_err();
        assert!(matches!(err, Error::UnsupportedAlgorithm(ref a) if a == "crc32"));
        assert!(err.is_configuration());
    }

    #[test]
    fn zero_range_size_is_rejected() {
        let cfg = ObjcheckConfig {
            range_size: 0,
            ..ObjcheckConfig::default()
        };
        assert!(cfg.validate().unwrap_err().is_configuration());
    }

    #[test]
    fn zero_interval_disables_progress() {
        let cfg = ObjcheckConfig {
            progress_interval_secs: 0,
            ..ObjcheckConfig::default()
        };
        assert!(cfg.progress().is_none());
        assert!(cfg.crvd_settings().unwrap().progress.is_none());
    }

    #[test]
    fn load_from_reports_path_on_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "range_size = \"big\"").unwrap();
        match load_from(&path) {
            Err(Error::Config(msg)) => assert!(msg.contains("config.toml")),
            other => panic!("expected Config error, got {:?}", other),
        }
    }
}
