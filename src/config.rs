use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use serde::Deserialize;
use crate::error::ConfigError;
use crate::rules::RuleManager;

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8081";
pub const DEFAULT_GO_BIN: &str = "go";
/// Environment variable holding the replace rules.
pub const RULES_ENV: &str = "GOPROXY_REPLACERULES";

/// Optional settings, as read from a `modgate.toml` file or the command line.
///
/// ```toml
/// listen = "127.0.0.1:8081"
/// rules = "corp.io/(.*) github.com/corp/$1"
/// cache_dir = "/var/cache/go/pkg/mod/cache/download"
/// go_bin = "/usr/local/go/bin/go"
/// ```
#[derive(Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    pub listen: Option<String>,
    pub rules: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub go_bin: Option<String>,
}

impl Settings {
    /// Loads settings from a TOML file.
    ///
    /// # Errors
    /// Returns an error if the file can't be read or deserialized.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Settings, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Layers `overrides` on top of `self`; any value set in `overrides` wins.
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            listen: overrides.listen.or(self.listen),
            rules: overrides.rules.or(self.rules),
            cache_dir: overrides.cache_dir.or(self.cache_dir),
            go_bin: overrides.go_bin.or(self.go_bin),
        }
    }

    /// Resolves defaults and compiles the rules.
    ///
    /// `gopath` is only consulted when no cache dir was given.
    ///
    /// # Errors
    /// Returns an error for an invalid rule pattern or when the cache dir can't be derived.
    pub fn build(self, gopath: Option<&OsStr>) -> Result<GatewayConfig, ConfigError> {
        let rules = RuleManager::build(self.rules.as_deref().unwrap_or(""))?;
        let cache_dir = match self.cache_dir {
            Some(dir) => dir,
            None => cache_dir_from_gopath(gopath)?,
        };
        Ok(GatewayConfig {
            listen: self.listen.unwrap_or_else(|| DEFAULT_LISTEN.to_string()),
            cache_dir,
            rules,
            go_bin: self.go_bin.unwrap_or_else(|| DEFAULT_GO_BIN.to_string()),
        })
    }
}

/// Everything the gateway needs, fixed at startup.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub listen: String,
    pub cache_dir: PathBuf,
    pub rules: RuleManager,
    pub go_bin: String,
}

/// `<first GOPATH entry>/pkg/mod/cache/download`, where the Go toolchain keeps downloads.
pub fn cache_dir_from_gopath(gopath: Option<&OsStr>) -> Result<PathBuf, ConfigError> {
    let gopath = gopath.filter(|g| !g.is_empty()).ok_or(ConfigError::MissingGopath)?;
    let first = std::env::split_paths(gopath)
        .next()
        .filter(|p| !p.as_os_str().is_empty())
        .ok_or(ConfigError::MissingGopath)?;
    Ok(first.join("pkg").join("mod").join("cache").join("download"))
}
