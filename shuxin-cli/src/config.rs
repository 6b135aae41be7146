use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use shuxin_client::{DEFAULT_API_BASE, DEFAULT_TIMEOUT};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::state::{default_log_dir, ensure_shuxin_home, shuxin_home};

/// Environment override for the decision service base URL.
pub const API_BASE_ENV: &str = "SHUXIN_API_BASE";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api: ApiSection,
    pub log: LogSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSection {
    pub base_url: String,
    /// Hard limit per request. 0 means the built-in default.
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogSection {
    /// tracing filter directive; `RUST_LOG` wins when set.
    pub level: String,
    /// Directory for the rolling log file (default: ~/.shuxin/logs)
    pub dir: Option<PathBuf>,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

impl Default for LogSection {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            dir: None,
        }
    }
}

/// Settings after applying overrides, computed once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub api_base: String,
    pub timeout: Duration,
    pub log_level: String,
    pub log_dir: PathBuf,
}

const CONFIG_FILE: &str = "config.toml";

/// Location of the config file. Does not touch the filesystem.
pub fn config_path() -> Result<PathBuf> {
    Ok(shuxin_home()?.join(CONFIG_FILE))
}

/// Read `p`, or return the defaults when it does not exist.
pub fn load_config_from(p: &Path) -> Result<Config> {
    if !p.exists() {
        return Ok(Config::default());
    }
    let s = fs::read_to_string(p).with_context(|| format!("read {}", p.display()))?;
    parse_config(&s)
}

pub fn parse_config(s: &str) -> Result<Config> {
    toml::from_str(s).context("parse config.toml")
}

pub fn save_config(cfg: &Config) -> Result<()> {
    let p = ensure_shuxin_home()?.join(CONFIG_FILE);
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
    let cfg = Config::default();
    save_config(&cfg)?;
    println!("Wrote {}", p.display());
    Ok(())
}

/// First non-blank candidate wins, in the order given; else the default.
pub fn resolve_api_base<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> String {
    candidates
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|s| !s.is_empty())
        .unwrap_or(DEFAULT_API_BASE)
        .to_string()
}

/// Precedence for the base URL: `--api-base`, then `SHUXIN_API_BASE`, then
/// the config file. `home` is the shuxin home directory, if there is one.
pub fn resolve(
    cfg: &Config,
    flag: Option<&str>,
    env: Option<&str>,
    home: Option<&Path>,
) -> ResolvedConfig {
    let api_base = resolve_api_base([flag, env, Some(cfg.api.base_url.as_str())]);

    let timeout = match cfg.api.timeout_secs {
        0 => DEFAULT_TIMEOUT,
        secs => Duration::from_secs(secs),
    };

    let log_dir = match &cfg.log.dir {
        Some(dir) => dir.clone(),
        None => default_log_dir(home),
    };

    ResolvedConfig {
        api_base,
        timeout,
        log_level: cfg.log.level.clone(),
        log_dir,
    }
}

/// Load the config file and apply process-level overrides. Without `HOME`
/// the built-in defaults are used.
pub fn resolve_from_env(flag: Option<&str>) -> Result<ResolvedConfig> {
    let home = shuxin_home().ok();
    let cfg = match &home {
        Some(home) => load_config_from(&home.join(CONFIG_FILE))?,
        None => Config::default(),
    };
    let env = std::env::var(API_BASE_ENV).ok();
    Ok(resolve(&cfg, flag, env.as_deref(), home.as_deref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_base_precedence() {
        assert_eq!(
            resolve_api_base([Some("https://flag"), Some("https://env"), Some("https://file")]),
            "https://flag"
        );
        assert_eq!(
            resolve_api_base([None, Some("  https://env  "), Some("https://file")]),
            "https://env"
        );
        assert_eq!(
            resolve_api_base([Some("   "), Some(""), Some("https://file")]),
            "https://file"
        );
        assert_eq!(resolve_api_base([None, None, Some(" ")]), DEFAULT_API_BASE);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let cfg = parse_config("[api]\nbase_url = \"http://localhost:3000/\"\n").unwrap();
        assert_eq!(cfg.api.base_url, "http://localhost:3000/");
        assert_eq!(cfg.api.timeout_secs, 12);
        assert_eq!(cfg.log.level, "info");

        let empty = parse_config("").unwrap();
        assert_eq!(empty.api.base_url, DEFAULT_API_BASE);
    }

    #[test]
    fn test_resolve_timeout_and_log_dir() {
        let mut cfg = Config::default();
        cfg.api.timeout_secs = 0;
        cfg.log.dir = Some(PathBuf::from("/tmp/shuxin-logs"));

        let r = resolve(&cfg, None, None, None);
        assert_eq!(r.timeout, DEFAULT_TIMEOUT);
        assert_eq!(r.log_dir, PathBuf::from("/tmp/shuxin-logs"));
        assert_eq!(r.api_base, DEFAULT_API_BASE);

        cfg.api.timeout_secs = 3;
        let r = resolve(&cfg, None, Some("http://127.0.0.1:9"), None);
        assert_eq!(r.timeout, Duration::from_secs(3));
        assert_eq!(r.api_base, "http://127.0.0.1:9");
    }

    #[test]
    fn test_resolve_without_home_uses_defaults() {
        let r = resolve(&Config::default(), None, None, None);
        assert_eq!(r.api_base, DEFAULT_API_BASE);
        assert_eq!(r.timeout, DEFAULT_TIMEOUT);
        assert_eq!(r.log_dir, std::env::temp_dir().join("shuxin").join("logs"));

        let home = PathBuf::from("/home/someone/.shuxin");
        let r = resolve(&Config::default(), None, None, Some(home.as_path()));
        assert_eq!(r.log_dir, home.join("logs"));
    }

    #[test]
    fn test_loading_missing_config_creates_nothing() {
        let home = std::env::temp_dir().join(format!("shuxin-no-home-{}", std::process::id()));
        let cfg = load_config_from(&home.join(CONFIG_FILE)).unwrap();
        assert_eq!(cfg.api.base_url, DEFAULT_API_BASE);
        assert!(!home.exists());
    }

    #[test]
    fn test_default_config_round_trips_through_toml() {
        let s = toml::to_string_pretty(&Config::default()).unwrap();
        let back = parse_config(&s).unwrap();
        assert_eq!(back.api.base_url, DEFAULT_API_BASE);
        assert_eq!(back.api.timeout_secs, 12);
    }
}
