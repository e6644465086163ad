//! Configuration for sri.
//!
//! Settings are layered, later sources overriding earlier ones:
//!
//! 1. Built-in defaults.
//! 2. `sri.toml`, `sri.yaml` or `sri.json` in the user's configuration
//!    directory (as reported by [`directories::ProjectDirs`]).
//! 3. A file passed explicitly (`--config`).
//! 4. `SRI_`-prefixed environment variables. Nested settings use a double
//!    underscore, e.g. `SRI_STORAGE__READ_ONLY=true`.
//!
//! ```toml
//! site_url = "https://example.org"
//! prefix = "wpsri_"
//!
//! [storage]
//! path = "/var/lib/sri/options"
//!
//! [nonce]
//! secret = "correct horse battery staple"
//! ```

pub mod error;

use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use serde::{Deserialize, Serialize};
use sri_cache::{DEFAULT_PREFIX, Prefix};
use sri_resource::Origin;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ErrorKind, Result};

const ENV_PREFIX: &str = "SRI_";
const FILE_STEM: &str = "sri";
const OPTIONS_DIR: &str = "options";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Home URL of the site; decides which resources are local.
    pub site_url: Option<String>,
    /// Prefix of every option key (and of the nonce query parameter).
    pub prefix: String,
    pub storage: StorageConfig,
    pub nonce: NonceConfig,
    pub fetch: FetchConfig,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            site_url: None,
            prefix: DEFAULT_PREFIX.to_string(),
            storage: StorageConfig::default(),
            nonce: NonceConfig::default(),
            fetch: FetchConfig::default(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory of option documents. Defaults to `options/` in the user's
    /// data directory.
    pub path: Option<PathBuf>,
    /// Never write; every change is logged and dropped.
    pub read_only: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NonceConfig {
    /// Signing secret. Only needed for issuing and checking admin tokens.
    pub secret: Option<String>,
    pub lifetime_secs: u64,
}
impl Default for NonceConfig {
    fn default() -> Self {
        Self { secret: None, lifetime_secs: 24 * 60 * 60 }
    }
}
impl NonceConfig {
    pub fn lifetime(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Largest resource body that will be downloaded and hashed.
    pub max_bytes: u64,
}
impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: concat!("sri/", env!("CARGO_PKG_VERSION")).to_string(),
            max_bytes: 10 * 1024 * 1024,
        }
    }
}
impl FetchConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Config {
    /// Load and validate configuration from every layer.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let dirs = ProjectDirs::from("", "", FILE_STEM);
        Self::load_from(dirs.as_ref().map(ProjectDirs::config_dir), explicit)
    }

    /// Like [`load()`](Self::load), with the user configuration directory
    /// given explicitly (or skipped with `None`).
    pub fn load_from(config_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let config: Self = Self::figment(config_dir, explicit)?.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        tracing::debug!(site_url = config.site_url.as_deref(), prefix = %config.prefix, "Configuration loaded");
        Ok(config)
    }

    fn figment(config_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Figment> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(dir) = config_dir {
            figment = figment
                .merge(Toml::file(dir.join(format!("{FILE_STEM}.toml"))))
                .merge(Yaml::file(dir.join(format!("{FILE_STEM}.yaml"))))
                .merge(Json::file(dir.join(format!("{FILE_STEM}.json"))));
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::FileNotFound(path.to_path_buf()));
            }
            figment = match path.extension().and_then(|ext| ext.to_str()) {
                Some("toml") => figment.merge(Toml::file(path)),
                Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
            };
        }
        Ok(figment.merge(Env::prefixed(ENV_PREFIX).split("__")))
    }

    /// Check the settings that can be checked without touching the outside
    /// world.
    pub fn validate(&self) -> Result<()> {
        self.origin()?;
        self.prefix()?;
        if let Some(path) = &self.storage.path
            && !path.is_absolute()
        {
            exn::bail!(ErrorKind::Invalid { field: "storage.path", reason: "must be absolute".to_string() });
        }
        if self.nonce.lifetime_secs < 2 {
            exn::bail!(ErrorKind::Invalid {
                field: "nonce.lifetime_secs",
                reason: "must be at least 2 seconds".to_string(),
            });
        }
        if self.fetch.timeout_secs == 0 {
            exn::bail!(ErrorKind::Invalid { field: "fetch.timeout_secs", reason: "must not be zero".to_string() });
        }
        if self.fetch.max_bytes == 0 {
            exn::bail!(ErrorKind::Invalid { field: "fetch.max_bytes", reason: "must not be zero".to_string() });
        }
        Ok(())
    }

    pub fn origin(&self) -> Result<Origin> {
        let site_url = self.site_url.as_deref().ok_or_raise(|| ErrorKind::Missing("site_url"))?;
        Origin::parse(site_url)
            .or_raise(|| ErrorKind::Invalid { field: "site_url", reason: format!("not an http(s) URL: {site_url}") })
    }

    pub fn prefix(&self) -> Result<Prefix> {
        Prefix::new(self.prefix.as_str())
            .or_raise(|| ErrorKind::Invalid { field: "prefix", reason: format!("unusable in option keys: {}", self.prefix) })
    }

    /// The configured storage directory, or the default one.
    pub fn storage_path(&self) -> Result<PathBuf> {
        if let Some(path) = &self.storage.path {
            return Ok(path.clone());
        }
        ProjectDirs::from("", "", FILE_STEM)
            .map(|dirs| dirs.data_dir().join(OPTIONS_DIR))
            .ok_or_raise(|| ErrorKind::Missing("storage.path"))
    }

    pub fn nonce_secret(&self) -> Result<&str> {
        self.nonce.secret.as_deref().filter(|secret| !secret.is_empty()).ok_or_raise(|| ErrorKind::Missing("nonce.secret"))
    }
}
