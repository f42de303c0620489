//! Configuration loader and validator for the admin list tooling.
use reqwest::Url;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Environment variable that overrides `api.base_url`.
pub const API_BASE_URL_ENV: &str = "API_BASE_URL";

/// Used when neither the config file nor the environment names a base URL.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:5000/api/";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("YAML parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(&'static str),
}

/// Root configuration struct mirroring the YAML schema exactly.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default)]
    pub api: Api,
    #[serde(default)]
    pub resources: Resources,
}

/// Remote admin API settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Api {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: String,
}

impl Default for Api {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: String::new(),
        }
    }
}

/// Endpoint mapping for each list kind.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Resources {
    pub faq: Resource,
    pub popular_posts: Resource,
    pub flexible_content: Resource,
}

impl Default for Resources {
    fn default() -> Self {
        Self {
            faq: Resource::named("faq"),
            popular_posts: Resource::named("popular-posts"),
            flexible_content: Resource::named("flexible-content"),
        }
    }
}

/// A container resource: the path under the base URL and the name of the
/// identifier field the backend uses on list items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Resource {
    pub path: String,
    #[serde(default = "default_id_field")]
    pub id_field: String,
}

impl Resource {
    pub fn named(path: &str) -> Self {
        Self {
            path: path.to_string(),
            id_field: default_id_field(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_API_BASE_URL.to_string()
}

fn default_id_field() -> String {
    "_id".to_string()
}

impl Config {
    /// Apply `API_BASE_URL` from the process environment, if set.
    pub fn apply_env(&mut self) {
        self.apply_base_url_override(std::env::var(API_BASE_URL_ENV).ok());
    }

    fn apply_base_url_override(&mut self, value: Option<String>) {
        if let Some(url) = value.filter(|v| !v.trim().is_empty()) {
            self.api.base_url = url;
        }
    }

    /// Parsed base URL. Always ends with `/` so relative joins keep the
    /// configured path prefix.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let mut raw = self.api.base_url.trim().to_string();
        if !raw.ends_with('/') {
            raw.push('/');
        }
        Url::parse(&raw).map_err(|_| ConfigError::Invalid("api.base_url must be a valid URL"))
    }

    /// Bearer token, if one is configured.
    pub fn token(&self) -> Option<&str> {
        Some(self.api.token.trim()).filter(|t| !t.is_empty())
    }
}

/// Load configuration from a YAML file, apply the environment override and
/// validate it.
/// - If `path` is None, uses `config.yaml` in the current working directory.
/// - A missing file is not an error: defaults are used instead.
pub fn load(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.unwrap_or_else(|| Path::new("config.yaml"));
    let mut cfg: Config = if path.exists() {
        let content = fs::read_to_string(path)?;
        serde_yaml::from_str(&content)?
    } else {
        Config::default()
    };
    cfg.apply_env();
    validate(&cfg)?;
    Ok(cfg)
}

/// Validate a configuration instance.
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if cfg.api.base_url.trim().is_empty() {
        return Err(ConfigError::Invalid("api.base_url must be non-empty"));
    }
    let url = cfg.base_url()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Invalid("api.base_url must use http or https"));
    }

    let r = &cfg.resources;
    if r.faq.path.trim().is_empty() {
        return Err(ConfigError::Invalid("resources.faq.path must be non-empty"));
    }
    if r.popular_posts.path.trim().is_empty() {
        return Err(ConfigError::Invalid("resources.popular_posts.path must be non-empty"));
    }
    if r.flexible_content.path.trim().is_empty() {
        return Err(ConfigError::Invalid("resources.flexible_content.path must be non-empty"));
    }
    for res in [&r.faq, &r.popular_posts, &r.flexible_content] {
        if res.id_field.trim().is_empty() {
            return Err(ConfigError::Invalid("resources.*.id_field must be non-empty"));
        }
    }

    Ok(())
}

/// Returns the example YAML content.
pub fn example() -> &'static str {
    r#"api:
  base_url: "http://localhost:5000/api/"
  token: ""

resources:
  faq:
    path: "faq"
    id_field: "_id"
  popular_posts:
    path: "popular-posts"
    id_field: "_id"
  flexible_content:
    path: "flexible-content"
    id_field: "_id"
"#
}
