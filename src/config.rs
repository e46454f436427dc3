use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for TagSentry
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Directory containing one tracking record per watched repository
    pub repos_dir: String,

    /// Mailchimp account credentials
    pub mailchimp: Credentials,

    /// Remote endpoint overrides
    #[serde(default)]
    pub endpoints: Endpoints,
}

/// Mailchimp credentials, loaded once and shared read-only across the run
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Credentials {
    /// Account API key; the segment after the last hyphen names the datacenter
    pub api_key: String,

    /// Mailing list (audience) id to broadcast to
    pub list_id: String,

    /// Sender address, also used as the reply-to
    pub from_email: String,
}

/// Remote API base URLs
///
/// Defaults target the public services; tests point these at mock servers.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Endpoints {
    /// GitHub REST API base
    #[serde(default = "default_github_api")]
    pub github_api: String,

    /// Campaign API base; derived from the API key's datacenter suffix when unset
    pub mailchimp_api: Option<String>,
}

fn default_github_api() -> String {
    "https://api.github.com".to_string()
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            github_api: default_github_api(),
            mailchimp_api: None,
        }
    }
}

impl Credentials {
    /// Datacenter prefix encoded in the API key (e.g. `xxxx-us21` -> `us21`)
    ///
    /// Keys without a hyphen yield the whole key, matching the upstream
    /// convention of taking everything after the last separator.
    pub fn server_prefix(&self) -> &str {
        match self.api_key.rsplit_once('-') {
            Some((_, suffix)) => suffix,
            None => &self.api_key,
        }
    }
}

impl Config {
    /// Load configuration from the default XDG location
    ///
    /// A missing file is fatal: the run cannot proceed without credentials.
    pub fn load_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load(&config_path)
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("tagsentry").join("config.yml"))
    }

    /// Expand environment variables in configuration paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.repos_dir = shellexpand::full(&self.repos_dir)
            .context("Failed to expand repos_dir path")?
            .into_owned();

        Ok(())
    }

    /// Campaign API base URL for this account
    pub fn campaign_api_base(&self) -> String {
        match &self.endpoints.mailchimp_api {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!(
                "https://{}.api.mailchimp.com/3.0",
                self.mailchimp.server_prefix()
            ),
        }
    }

    /// GitHub API base URL
    pub fn github_api_base(&self) -> String {
        self.endpoints.github_api.trim_end_matches('/').to_string()
    }
}
