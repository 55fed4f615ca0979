use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use statements_client::{ClientConfig, Credentials, DEFAULT_BASE_URL};
use statements_core::{ResponseOrdering, DEFAULT_PAGE_SIZE};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::state::ensure_statements_home;

pub const ENV_API_URL: &str = "STATEMENTS_API_URL";
pub const ENV_API_USER: &str = "STATEMENTS_API_USER";
pub const ENV_API_PASSWORD: &str = "STATEMENTS_API_PASSWORD";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub viewer: ViewerSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    /// Basic auth is only sent when both username and password are set
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSection {
    pub page_size: u32,
    pub ordering: ResponseOrdering,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            username: None,
            password: None,
            timeout_secs: 60,
        }
    }
}

impl Default for ViewerSection {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            ordering: ResponseOrdering::LatestIssued,
        }
    }
}

impl Config {
    /// Apply `STATEMENTS_API_*` overrides looked up through `var`.
    pub fn apply_env(&mut self, var: impl Fn(&str) -> Option<String>) {
        let set = |v: Option<String>| v.filter(|s| !s.is_empty());
        if let Some(url) = set(var(ENV_API_URL)) {
            self.api.base_url = url;
        }
        if let Some(user) = set(var(ENV_API_USER)) {
            self.api.username = Some(user);
        }
        if let Some(password) = set(var(ENV_API_PASSWORD)) {
            self.api.password = Some(password);
        }
    }

    pub fn credentials(&self) -> Option<Credentials> {
        match (&self.api.username, &self.api.password) {
            (Some(username), Some(password)) => Some(Credentials {
                username: username.clone(),
                password: password.clone(),
            }),
            _ => None,
        }
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            base_url: self.api.base_url.clone(),
            credentials: self.credentials(),
            timeout: Duration::from_secs(self.api.timeout_secs),
        }
    }

    /// Copy suitable for printing: the password is masked.
    pub fn redacted(&self) -> Config {
        let mut c = self.clone();
        if c.api.password.is_some() {
            c.api.password = Some("********".to_string());
        }
        c
    }
}

pub fn config_path() -> Result<PathBuf> {
    Ok(ensure_statements_home()?.join("config.toml"))
}

/// File config (or defaults) with environment overrides applied.
pub fn load_config() -> Result<Config> {
    let p = config_path()?;
    let mut cfg = if p.exists() {
        let s = fs::read_to_string(&p).with_context(|| format!("read {}", p.display()))?;
        toml::from_str(&s).with_context(|| format!("parse {}", p.display()))?
    } else {
        Config::default()
    };
    cfg.apply_env(|k| std::env::var(k).ok());
    Ok(cfg)
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = config_path()?;
    let s = toml::to_string_pretty(cfg).context("serialize config")?;
    fs::write(&p, s).with_context(|| format!("write {}", p.display()))?;
    Ok(())
}

pub fn init_config() -> Result<()> {
    let p = config_path()?;
    if p.exists() {
        println!("Config already exists: {}", p.display());
        return Ok(());
    }
    save_config(&Config::default())?;
    println!("Wrote {}", p.display());
    Ok(())
}

pub fn show_config(cfg: &Config) -> Result<()> {
    let s = toml::to_string_pretty(&cfg.redacted()).context("serialize config")?;
    println!("# {}\n{}", config_path()?.display(), s);
    Ok(())
}
