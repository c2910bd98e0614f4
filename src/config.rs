use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use anyhow::{Result, anyhow};

pub const DEFAULT_ENDPOINT: &str = "https://web-production-7d8f8.up.railway.app/chat";

#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&config_content)?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Create config directory if it doesn't exist
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(path, config_content)?;
        Ok(())
    }

    /// Pick the endpoint: explicit override (CLI flag or env), then the file,
    /// then the built-in default. Blank values count as unset.
    pub fn resolve_endpoint(&self, override_endpoint: Option<&str>) -> String {
        [override_endpoint, self.endpoint.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|e| !e.is_empty())
            .unwrap_or(DEFAULT_ENDPOINT)
            .to_string()
    }

    pub fn resolve_log_file(&self, override_path: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = override_path.or(self.log_file.as_deref()) {
            return Ok(path.to_path_buf());
        }

        let data_dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;
        Ok(data_dir.join("revtalk").join("revtalk.log"))
    }

    pub fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| anyhow!("Could not determine config directory"))?;

        Ok(config_dir.join("revtalk").join("config.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(config, Config::new());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.json");

        let config = Config {
            endpoint: Some("http://localhost:8000/chat".to_string()),
            log_file: None,
        };
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);
        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("log_file"));
    }

    #[test]
    fn test_garbage_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        assert!(Config::load_from(&path).is_err());
    }

    #[test]
    fn test_endpoint_precedence() {
        let config = Config {
            endpoint: Some("http://from-file/chat".to_string()),
            log_file: None,
        };
        assert_eq!(config.resolve_endpoint(Some("http://flag/chat")), "http://flag/chat");
        assert_eq!(config.resolve_endpoint(None), "http://from-file/chat");
        assert_eq!(Config::new().resolve_endpoint(None), DEFAULT_ENDPOINT);
        assert_eq!(config.resolve_endpoint(Some("  ")), "http://from-file/chat");
        assert_eq!(Config::new().resolve_endpoint(Some("  ")), DEFAULT_ENDPOINT);
    }

    #[test]
    fn test_log_file_override() {
        let config = Config {
            endpoint: None,
            log_file: Some(PathBuf::from("/tmp/from-config.log")),
        };
        assert_eq!(
            config.resolve_log_file(Some(Path::new("/tmp/flag.log"))).unwrap(),
            PathBuf::from("/tmp/flag.log")
        );
        assert_eq!(
            config.resolve_log_file(None).unwrap(),
            PathBuf::from("/tmp/from-config.log")
        );
    }
}
