use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const DEFAULT_BASE_URL: &str = "https://gitlab.com";
pub const DEFAULT_API_VERSION: &str = "v4";
pub const DEFAULT_RESOURCE: &str = "issues";

pub const ENV_BASE_URL: &str = "GITLAB_URL";
pub const ENV_API_VERSION: &str = "GITLAB_API_VERSION";
pub const ENV_RESOURCE: &str = "GITLAB_API";
pub const ENV_PRIVATE_TOKEN: &str = "PRIVATE_ACCESS_TOKEN";
pub const ENV_USERNAME: &str = "GITLAB_USER_NAME";
pub const ENV_NAME: &str = "GITLAB_NAME";
pub const ENV_PROJECT_ID: &str = "PROJECT_ID";

/// Connection settings for the GitLab issues API.
///
/// Built once at startup and handed to the client by value; nothing mutates
/// it afterwards. Token and identity fields are optional because the client
/// never validates them locally: a missing token surfaces as a 401 from the
/// remote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_resource")]
    pub resource: String,
    #[serde(default)]
    pub private_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub project_id: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_version: default_api_version(),
            resource: default_resource(),
            private_token: None,
            username: None,
            name: None,
            project_id: None,
        }
    }
}

impl Config {
    /// Build a configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup, starting from
    /// the defaults. Blank values are treated as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Load configuration from the provided YAML file (or the default
    /// location), then apply environment overrides on top.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`Config::load`] with an explicit variable lookup in place of the
    /// process environment. Non-blank lookup values win over the file.
    pub fn load_with<P, F>(path: Option<P>, lookup: F) -> Result<Self>
    where
        P: AsRef<Path>,
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::load_file(path)?;
        config.apply_overrides(lookup)?;
        Ok(config)
    }

    /// Read only the YAML file. A missing file yields the defaults.
    pub fn load_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let path = path
            .map(|p| p.as_ref().to_path_buf())
            .unwrap_or_else(Config::default_path);

        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Config::default());
        }

        let raw = fs::read_to_string(&path)
            .with_context(|| format!("Unable to read config file at {}", path.display()))?;

        serde_yaml::from_str(&raw)
            .with_context(|| format!("Malformed YAML in config file {}", path.display()))
    }

    /// Web URL GitLab reports for the configured user, `<base_url>/<username>`.
    pub fn author_web_url(&self) -> Option<String> {
        self.username
            .as_deref()
            .map(|username| format!("{}/{}", self.base_url.trim_end_matches('/'), username))
    }

    fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(base_url) = get(ENV_BASE_URL) {
            self.base_url = base_url;
        }
        if let Some(api_version) = get(ENV_API_VERSION) {
            self.api_version = api_version;
        }
        if let Some(resource) = get(ENV_RESOURCE) {
            self.resource = resource;
        }
        if let Some(token) = get(ENV_PRIVATE_TOKEN) {
            self.private_token = Some(token);
        }
        if let Some(username) = get(ENV_USERNAME) {
            self.username = Some(username);
        }
        if let Some(name) = get(ENV_NAME) {
            self.name = Some(name);
        }
        if let Some(raw) = get(ENV_PROJECT_ID) {
            let project_id = raw.trim().parse::<u64>().with_context(|| {
                format!("{ENV_PROJECT_ID} must be a numeric project id, got '{raw}'")
            })?;
            self.project_id = Some(project_id);
        }

        Ok(())
    }

    fn default_path() -> PathBuf {
        let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        path.push(".gitlab-issues");
        path.push("config.yaml");
        path
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_resource() -> String {
    DEFAULT_RESOURCE.to_string()
}
