//! Server configuration and runtime directories

use std::fs;
use std::io;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Local};
use crowd_core::ModelFactory;

const DEFAULT_CACHE_CAPACITY: NonZeroUsize = match NonZeroUsize::new(256) {
    Some(capacity) => capacity,
    None => unreachable!(),
};

/// Server settings read from the environment
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Provider used by `/generate` when the request names none
    pub default_provider: String,

    /// Model used by `/generate` when the request names none
    pub default_model: String,

    /// Upper bound for one generation
    pub request_timeout: Duration,

    /// Prefix of the per-start runtime directory
    pub runtime_dir: PathBuf,

    /// Model cache bound; cache keys come from request data
    pub cache_capacity: NonZeroUsize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:6003".into(),
            default_provider: "anthropic".into(),
            default_model: "claude-3-haiku-20240307".into(),
            request_timeout: Duration::from_secs(120),
            runtime_dir: PathBuf::from("runtime"),
            cache_capacity: DEFAULT_CACHE_CAPACITY,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let text = |var: &str, default: String| {
            lookup(var).filter(|v| !v.trim().is_empty()).unwrap_or(default)
        };

        Self {
            bind_addr: text("BIND_ADDR", defaults.bind_addr),
            default_provider: text("DEFAULT_PROVIDER", defaults.default_provider),
            default_model: text("DEFAULT_MODEL", defaults.default_model),
            request_timeout: lookup("REQUEST_TIMEOUT_SECS")
                .and_then(|s| s.trim().parse().ok())
                .map_or(defaults.request_timeout, Duration::from_secs),
            runtime_dir: lookup("RUNTIME_DIR")
                .filter(|v| !v.trim().is_empty())
                .map_or(defaults.runtime_dir, PathBuf::from),
            cache_capacity: lookup("MODEL_CACHE_CAPACITY")
                .and_then(|s| s.trim().parse::<usize>().ok())
                .and_then(NonZeroUsize::new)
                .unwrap_or(defaults.cache_capacity),
        }
    }

    /// Apply the server's cache bound to `factory`
    pub fn bound_cache(&self, factory: ModelFactory) -> ModelFactory {
        factory.with_cache_capacity(self.cache_capacity)
    }
}

/// Directories for one server start: `<prefix>_<YYYYmmdd-HHMM>/{logs,outputs}`
#[derive(Clone, Debug)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub logs: PathBuf,
    pub outputs: PathBuf,
}

impl RuntimePaths {
    /// Create the directory tree, replacing any existing one with the same stamp
    pub fn create(prefix: &Path, started: DateTime<Local>) -> io::Result<Self> {
        let mut name = prefix.as_os_str().to_owned();
        name.push(format!("_{}", started.format("%Y%m%d-%H%M")));
        let root = PathBuf::from(name);

        if root.exists() {
            fs::remove_dir_all(&root)?;
        }

        let paths = Self {
            logs: root.join("logs"),
            outputs: root.join("outputs"),
            root,
        };
        fs::create_dir_all(&paths.logs)?;
        fs::create_dir_all(&paths.outputs)?;
        Ok(paths)
    }

    pub fn log_file(&self) -> PathBuf {
        self.logs.join("server.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::from_lookup(|_| None);
        assert_eq!(config.bind_addr, "0.0.0.0:6003");
        assert_eq!(config.default_provider, "anthropic");
        assert_eq!(config.default_model, "claude-3-haiku-20240307");
        assert_eq!(config.request_timeout, Duration::from_secs(120));
        assert_eq!(config.runtime_dir, PathBuf::from("runtime"));
        assert_eq!(config.cache_capacity.get(), 256);
    }

    #[test]
    fn test_overrides() {
        let config = ServerConfig::from_lookup(|name| match name {
            "BIND_ADDR" => Some("127.0.0.1:8080".into()),
            "DEFAULT_PROVIDER" => Some("groq".into()),
            "REQUEST_TIMEOUT_SECS" => Some("15".into()),
            "DEFAULT_MODEL" => Some(String::new()),
            _ => None,
        });
        assert_eq!(config.bind_addr, "127.0.0.1:8080");
        assert_eq!(config.default_provider, "groq");
        assert_eq!(config.request_timeout, Duration::from_secs(15));
        assert_eq!(config.default_model, "claude-3-haiku-20240307");
    }

    #[test]
    fn test_cache_capacity_is_always_bounded() {
        let config = ServerConfig::from_lookup(|name| {
            (name == "MODEL_CACHE_CAPACITY").then(|| "32".to_string())
        });
        assert_eq!(config.cache_capacity.get(), 32);

        for raw in ["0", "unbounded", ""] {
            let config = ServerConfig::from_lookup(|name| {
                (name == "MODEL_CACHE_CAPACITY").then(|| raw.to_string())
            });
            assert_eq!(config.cache_capacity.get(), 256, "{raw:?}");
        }
    }

    #[test]
    fn test_runtime_paths_are_recreated() {
        let dir = tempfile::tempdir().unwrap();
        let prefix = dir.path().join("runtime");
        let started = Local.with_ymd_and_hms(2024, 3, 9, 14, 5, 0).unwrap();

        let paths = RuntimePaths::create(&prefix, started).unwrap();
        assert_eq!(paths.root, dir.path().join("runtime_20240309-1405"));
        assert!(paths.logs.is_dir());
        assert!(paths.outputs.is_dir());

        let stale = paths.outputs.join("old.json");
        fs::write(&stale, "{}").unwrap();

        let again = RuntimePaths::create(&prefix, started).unwrap();
        assert!(again.outputs.is_dir());
        assert!(!stale.exists());
        assert_eq!(again.log_file(), again.logs.join("server.log"));
    }
}
