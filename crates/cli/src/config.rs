//! CLI configuration utilities

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokenward_core::{AuthConfig, CredentialStore, FileCredentialStore};

/// Global options that shape how commands load configuration
#[derive(Debug, Default)]
pub struct Settings {
    pub config_path: Option<PathBuf>,
    pub base_url: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    /// Load the auth configuration, applying command line overrides last
    pub fn auth_config(&self) -> Result<AuthConfig> {
        let mut config = match &self.config_path {
            Some(path) => AuthConfig::load_from_file(path)
                .with_context(|| format!("loading {}", path.display()))?,
            None => AuthConfig::load().context("loading configuration")?,
        };

        if let Some(base_url) = &self.base_url {
            config.base_url.clone_from(base_url);
            config.validate()?;
        }

        Ok(config)
    }

    /// Log level from the flag, else from the configuration.
    ///
    /// Runs before logging exists, so an unreadable configuration falls back
    /// to the default level here and is reported by the command itself.
    pub fn log_level(&self, flag: Option<&str>) -> String {
        match flag {
            Some(level) => level.to_string(),
            None => self
                .auth_config()
                .map_or_else(|_| AuthConfig::default().log_level, |config| config.log_level),
        }
    }

    /// Credential store under `--data-dir`, or the platform data directory
    pub fn credential_store(&self) -> Result<Arc<dyn CredentialStore>> {
        let store = match &self.data_dir {
            Some(dir) => FileCredentialStore::new(dir),
            None => FileCredentialStore::in_data_dir()?,
        };
        Ok(Arc::new(store))
    }
}

/// Render the default configuration as TOML
pub fn default_config_toml() -> Result<String> {
    Ok(toml::to_string_pretty(&AuthConfig::default())?)
}

/// Write the default configuration file
pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
    std::fs::write(path, default_config_toml()?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenward.toml");
        generate_default_config(&path).unwrap();

        let settings = Settings {
            config_path: Some(path),
            ..Settings::default()
        };
        assert_eq!(settings.auth_config().unwrap(), AuthConfig::default());
    }

    #[test]
    fn test_log_level_comes_from_config_unless_flag_given() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenward.toml");
        std::fs::write(&path, "log_level = \"debug\"\n").unwrap();

        let settings = Settings {
            config_path: Some(path),
            ..Settings::default()
        };
        assert_eq!(settings.log_level(None), "debug");
        assert_eq!(settings.log_level(Some("warn")), "warn");

        let missing = Settings {
            config_path: Some(dir.path().join("absent.toml")),
            ..Settings::default()
        };
        assert_eq!(missing.log_level(None), "info");
    }

    #[test]
    fn test_base_url_override_is_validated() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tokenward.toml");
        generate_default_config(&path).unwrap();

        let settings = Settings {
            config_path: Some(path.clone()),
            base_url: Some("https://auth.example.com/api".to_string()),
            data_dir: None,
        };
        assert_eq!(
            settings.auth_config().unwrap().base_url,
            "https://auth.example.com/api"
        );

        let bad = Settings {
            config_path: Some(path),
            base_url: Some("not a url".to_string()),
            data_dir: None,
        };
        assert!(bad.auth_config().is_err());
    }
}
