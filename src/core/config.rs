use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, time::Duration};
use tracing::debug;

use super::fanout::{FailurePolicy, FanOutOptions};

pub const DEFAULT_BASE_URL: &str = "https://fundmobapi.eastmoney.com";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 11_0 like Mac OS X) AppleWebKit/604.1.38 (KHTML, like Gecko) Version/11.0 Mobile/15A372 Safari/604.1";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ProviderConfig {
    pub base_url: String,
    pub user_agent: String,
    pub request_timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        ProviderConfig {
            base_url: DEFAULT_BASE_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct FetchConfig {
    pub max_in_flight: usize,
    pub run_timeout_secs: u64,
    pub failure_policy: FailurePolicy,
}

impl Default for FetchConfig {
    fn default() -> Self {
        FetchConfig {
            max_in_flight: 8,
            run_timeout_secs: 30,
            failure_policy: FailurePolicy::FailFast,
        }
    }
}

impl From<&FetchConfig> for FanOutOptions {
    fn from(config: &FetchConfig) -> Self {
        FanOutOptions {
            max_in_flight: config.max_in_flight.max(1),
            run_timeout: Duration::from_secs(config.run_timeout_secs.max(1)),
            failure_policy: config.failure_policy,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Overrides the default `$HOME/.fund` fund list.
    pub fund_list: Option<PathBuf>,
    pub provider: ProviderConfig,
    pub fetch: FetchConfig,
}

impl AppConfig {
    /// Loads the settings file from the default location, falling back to
    /// defaults when it does not exist.
    pub fn load() -> Result<Self> {
        debug!("Loading default config");
        let config_path = Self::default_config_path()?;
        if !config_path.exists() {
            debug!("No config at {}, using defaults", config_path.display());
            return Ok(Self::default());
        }
        Self::load_from_path(&config_path)
    }

    pub fn default_config_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("in", "fundavg", "fundavg")
            .context("Could not determine project directories")?;
        Ok(proj_dirs.config_dir().join("config.yaml"))
    }

    pub fn default_fund_list_path() -> Result<PathBuf> {
        let base_dirs = BaseDirs::new().context("Could not determine home directory")?;
        Ok(base_dirs.home_dir().join(".fund"))
    }

    /// Fund list path: the configured override, or `$HOME/.fund`.
    pub fn fund_list_path(&self) -> Result<PathBuf> {
        match &self.fund_list {
            Some(path) => Ok(path.clone()),
            None => Self::default_fund_list_path(),
        }
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Result<Self> {
        let config_str = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        // An empty YAML document deserializes to unit, not a map.
        if config_str.trim().is_empty() {
            return Ok(Self::default());
        }

        let config: Self = serde_yaml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;
        debug!("Successfully loaded config");
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_config_deserialization() {
        let yaml_str = r#"
fund_list: "/tmp/funds.txt"
provider:
  base_url: "http://example.com/quotes"
fetch:
  max_in_flight: 4
  failure_policy: partial
"#;

        let config: AppConfig = serde_yaml::from_str(yaml_str).expect("Failed to deserialize");
        assert_eq!(config.fund_list, Some(PathBuf::from("/tmp/funds.txt")));
        assert_eq!(config.provider.base_url, "http://example.com/quotes");
        assert_eq!(config.provider.user_agent, DEFAULT_USER_AGENT);
        assert_eq!(config.provider.request_timeout_secs, 10);
        assert_eq!(config.fetch.max_in_flight, 4);
        assert_eq!(config.fetch.run_timeout_secs, 30);
        assert_eq!(config.fetch.failure_policy, FailurePolicy::Partial);
    }

    #[test]
    fn test_defaults_when_sections_missing() {
        let config: AppConfig = serde_yaml::from_str("fetch: {}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.provider.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.fetch.failure_policy, FailurePolicy::FailFast);
    }

    #[test]
    fn test_zero_limits_are_clamped() {
        let config: AppConfig =
            serde_yaml::from_str("fetch:\n  max_in_flight: 0\n  run_timeout_secs: 0\n").unwrap();
        let options = FanOutOptions::from(&config.fetch);
        assert_eq!(options.max_in_flight, 1);
        assert_eq!(options.run_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_load_from_path() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "fetch:\n  run_timeout_secs: 5")?;

        let config = AppConfig::load_from_path(file.path())?;
        assert_eq!(config.fetch.run_timeout_secs, 5);

        let options = FanOutOptions::from(&config.fetch);
        assert_eq!(options.run_timeout, Duration::from_secs(5));
        assert_eq!(options.max_in_flight, 8);
        Ok(())
    }

    #[test]
    fn test_load_from_empty_file_gives_defaults() -> Result<()> {
        let file = tempfile::NamedTempFile::new()?;
        assert_eq!(AppConfig::load_from_path(file.path())?, AppConfig::default());
        Ok(())
    }

    #[test]
    fn test_invalid_yaml_is_an_error() -> Result<()> {
        let mut file = tempfile::NamedTempFile::new()?;
        writeln!(file, "fetch: [not, a, map")?;
        assert!(AppConfig::load_from_path(file.path()).is_err());
        Ok(())
    }

    #[test]
    fn test_fund_list_override() -> Result<()> {
        let config = AppConfig {
            fund_list: Some(PathBuf::from("/srv/funds")),
            ..Default::default()
        };
        assert_eq!(config.fund_list_path()?, PathBuf::from("/srv/funds"));
        Ok(())
    }
}
