//! Configuration for storyfetch.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (STORYFETCH_HOME, STORYFETCH_API_URL,
//!    STORYFETCH_FLAGS_URL, STORYFETCH_SUBSCRIPTION_URL, STORYFETCH_APP_VERSION)
//! 2. Config file (.storyfetch/config.yaml)
//! 3. Defaults (~/.storyfetch)
//!
//! Config file discovery:
//! - Searches current directory and parents for .storyfetch/config.yaml
//! - `paths.home` is relative to the .storyfetch/ directory

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::{FetchSettings, FlagResolverConfig, RetryPolicy};
use crate::domain::VersionGates;

/// Global cached configuration (stores Result to handle init errors)
static CONFIG: OnceLock<Result<ResolvedConfig, String>> = OnceLock::new();

const DEFAULT_EXTRACT_URL: &str = "https://api.storyfetch.app/v1/extract";
const DEFAULT_FLAGS_URL: &str = "https://config.storyfetch.app/flags.json";
const DEFAULT_SUBSCRIPTION_URL: &str = "https://config.storyfetch.app/subscription.json";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub fetch: Option<FetchConfig>,
    #[serde(default)]
    pub app: Option<AppConfig>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .storyfetch/)
    pub home: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EndpointsConfig {
    pub extract_url: Option<String>,
    pub flags_url: Option<String>,
    pub subscription_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub backoff_base: Option<u32>,
    pub backoff_unit_ms: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub version: Option<String>,
    pub hidden_in_v1: Option<String>,
    pub hidden_in_v2: Option<String>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// Absolute path to the state directory
    pub home: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub extract_url: String,
    pub flags_url: String,
    pub subscription_url: String,
    pub fetch: FetchSettings,
    /// Version of the running app
    pub app_version: String,
    pub gates: VersionGates,
}

impl ResolvedConfig {
    /// Directory of the file-backed settings store
    pub fn settings_dir(&self) -> PathBuf {
        self.home.join("settings")
    }

    /// Flag resolver settings derived from this config
    pub fn flag_resolver_config(&self) -> FlagResolverConfig {
        FlagResolverConfig {
            flags_url: self.flags_url.clone(),
            subscription_url: self.subscription_url.clone(),
            gates: self.gates.clone(),
            app_version: self.app_version.clone(),
        }
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(".storyfetch").join("config.yaml");
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to `base`
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

fn fetch_settings(fetch: Option<&FetchConfig>) -> FetchSettings {
    let defaults = FetchSettings::default();
    let Some(fetch) = fetch else {
        return defaults;
    };

    FetchSettings {
        timeout: fetch
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout),
        retry: RetryPolicy {
            max_retries: fetch.max_retries.unwrap_or(defaults.retry.max_retries),
            backoff_base: fetch.backoff_base.unwrap_or(defaults.retry.backoff_base),
            backoff_unit_ms: fetch
                .backoff_unit_ms
                .unwrap_or(defaults.retry.backoff_unit_ms),
        },
    }
}

/// Build the resolved config from an optional parsed file and env lookup
fn resolve(
    file: Option<(&Path, ConfigFile)>,
    env: impl Fn(&str) -> Option<String>,
    default_home: PathBuf,
) -> ResolvedConfig {
    let (config_file, parsed) = match file {
        Some((path, parsed)) => (Some(path.to_path_buf()), Some(parsed)),
        None => (None, None),
    };

    let home = env("STORYFETCH_HOME")
        .map(PathBuf::from)
        .or_else(|| {
            let home_path = parsed.as_ref()?.paths.home.as_ref()?;
            let dir = config_file.as_deref()?.parent().unwrap_or(Path::new("."));
            Some(resolve_path(dir, home_path))
        })
        .unwrap_or(default_home);

    let endpoints = parsed
        .as_ref()
        .map(|p| p.endpoints.clone())
        .unwrap_or_default();
    let app = parsed.as_ref().and_then(|p| p.app.clone());

    let default_gates = VersionGates::default();
    let gates = VersionGates {
        v1: app
            .as_ref()
            .and_then(|a| a.hidden_in_v1.clone())
            .unwrap_or(default_gates.v1),
        v2: app
            .as_ref()
            .and_then(|a| a.hidden_in_v2.clone())
            .unwrap_or(default_gates.v2),
    };

    ResolvedConfig {
        home,
        config_file,
        extract_url: env("STORYFETCH_API_URL")
            .or(endpoints.extract_url)
            .unwrap_or_else(|| DEFAULT_EXTRACT_URL.to_string()),
        flags_url: env("STORYFETCH_FLAGS_URL")
            .or(endpoints.flags_url)
            .unwrap_or_else(|| DEFAULT_FLAGS_URL.to_string()),
        subscription_url: env("STORYFETCH_SUBSCRIPTION_URL")
            .or(endpoints.subscription_url)
            .unwrap_or_else(|| DEFAULT_SUBSCRIPTION_URL.to_string()),
        fetch: fetch_settings(parsed.as_ref().and_then(|p| p.fetch.as_ref())),
        app_version: env("STORYFETCH_APP_VERSION")
            .or_else(|| app.as_ref().and_then(|a| a.version.clone()))
            .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string()),
        gates,
    }
}

/// Load configuration from all sources
fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(".storyfetch");

    let config_path = find_config_file();
    let parsed = match config_path {
        Some(ref path) => Some((path.as_path(), load_config_file(path)?)),
        None => None,
    };

    Ok(resolve(parsed, |key| std::env::var(key).ok(), default_home))
}

/// Get the global configuration (loads once, then cached)
pub fn config() -> Result<&'static ResolvedConfig> {
    let result = CONFIG.get_or_init(|| load_config().map_err(|e| e.to_string()));

    match result {
        Ok(config) => Ok(config),
        Err(e) => anyhow::bail!("{}", e),
    }
}

/// Force reload configuration (useful for testing)
pub fn reload_config() -> Result<ResolvedConfig> {
    load_config()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_defaults_without_file() {
        let config = resolve(None, no_env, PathBuf::from("/home/u/.storyfetch"));

        assert_eq!(config.home, PathBuf::from("/home/u/.storyfetch"));
        assert_eq!(config.settings_dir(), PathBuf::from("/home/u/.storyfetch/settings"));
        assert!(config.config_file.is_none());
        assert_eq!(config.extract_url, DEFAULT_EXTRACT_URL);
        assert_eq!(config.fetch, FetchSettings::default());
        assert_eq!(config.gates, VersionGates::default());
        assert_eq!(config.app_version, env!("CARGO_PKG_VERSION"));
    }

    #[test]
    fn test_config_file_parsing() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join(".storyfetch");
        std::fs::create_dir_all(&dir).unwrap();

        let config_path = dir.join("config.yaml");
        let mut file = std::fs::File::create(&config_path).unwrap();
        writeln!(
            file,
            r#"
version: "1"
paths:
  home: ./state
endpoints:
  extract_url: https://proxy.example/extract
fetch:
  timeout_seconds: 5
  max_retries: 1
app:
  version: "1.0.9"
  hidden_in_v2: "1.0.10"
"#
        )
        .unwrap();

        let parsed = load_config_file(&config_path).unwrap();
        assert_eq!(parsed.version, "1");
        assert_eq!(parsed.paths.home.as_deref(), Some("./state"));

        let config = resolve(Some((config_path.as_path(), parsed)), no_env, PathBuf::from("/unused"));
        assert_eq!(config.home, dir.join("./state"));
        assert_eq!(config.extract_url, "https://proxy.example/extract");
        assert_eq!(config.flags_url, DEFAULT_FLAGS_URL);
        assert_eq!(config.fetch.timeout, Duration::from_secs(5));
        assert_eq!(config.fetch.retry.max_retries, 1);
        assert_eq!(config.fetch.retry.backoff_base, 2);
        assert_eq!(config.app_version, "1.0.9");
        assert_eq!(config.gates.v1, "1.0.8");
        assert_eq!(config.gates.v2, "1.0.10");
    }

    #[test]
    fn test_env_overrides_file() {
        let parsed: ConfigFile = serde_yaml::from_str(
            r#"
version: "1"
endpoints:
  flags_url: https://file.example/flags
app:
  version: "1.0.8"
"#,
        )
        .unwrap();

        let env: HashMap<&str, &str> = [
            ("STORYFETCH_FLAGS_URL", "https://env.example/flags"),
            ("STORYFETCH_APP_VERSION", "2.0.0"),
            ("STORYFETCH_HOME", "/srv/storyfetch"),
        ]
        .into_iter()
        .collect();

        let path = PathBuf::from("/project/.storyfetch/config.yaml");
        let config = resolve(
            Some((path.as_path(), parsed)),
            |k| env.get(k).map(|v| v.to_string()),
            PathBuf::from("/unused"),
        );

        assert_eq!(config.flags_url, "https://env.example/flags");
        assert_eq!(config.app_version, "2.0.0");
        assert_eq!(config.home, PathBuf::from("/srv/storyfetch"));
        assert_eq!(config.config_file, Some(path));
    }

    #[test]
    fn test_resolve_relative_path() {
        let base = PathBuf::from("/home/user/project");

        assert_eq!(
            resolve_path(&base, "./subdir"),
            PathBuf::from("/home/user/project/subdir")
        );
        assert_eq!(
            resolve_path(&base, "/absolute/path"),
            PathBuf::from("/absolute/path")
        );
    }
}
