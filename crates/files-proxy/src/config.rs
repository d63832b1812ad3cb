//! Configuration from environment variables

use crate::types::{ProxyConfig, RemoteConfig};
use origin_fetcher::FetcherConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Read the configuration from the process environment
pub fn load_config() -> ProxyConfig {
    from_lookup(|name| std::env::var(name).ok())
}

/// Build the configuration from any variable lookup.
///
/// Empty values count as unset; unparsable values fall back to defaults.
pub fn from_lookup<F>(lookup: F) -> ProxyConfig
where
    F: Fn(&str) -> Option<String>,
{
    let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
    let defaults = ProxyConfig::default();

    let port = var("PORT")
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(defaults.port);

    let storage_dir = var("STORAGE_DIR").map(PathBuf::from);

    let remote = var("REMOTE_URL").map(|url| {
        let fetcher_defaults = FetcherConfig::new(url);
        let connect_timeout = var("REMOTE_CONNECT_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(fetcher_defaults.connect_timeout);
        let read_timeout = var("REMOTE_READ_TIMEOUT_SECS")
            .and_then(|s| s.parse::<u64>().ok())
            .map(Duration::from_secs)
            .unwrap_or(fetcher_defaults.read_timeout);

        RemoteConfig {
            fetcher: FetcherConfig {
                connect_timeout,
                read_timeout,
                ..fetcher_defaults
            },
            username: var("REMOTE_USERNAME"),
            password: var("REMOTE_PASSWORD"),
            token: var("REMOTE_TOKEN"),
        }
    });

    let cache_enabled = var("PROXY_CACHE")
        .and_then(|s| parse_bool(&s))
        .unwrap_or(defaults.cache_enabled);

    let cache_buffer_bytes = var("CACHE_BUFFER_BYTES")
        .and_then(|s| s.parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(defaults.cache_buffer_bytes);

    ProxyConfig {
        port,
        storage_dir,
        remote,
        cache_enabled,
        cache_buffer_bytes,
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(vars: &[(&str, &str)]) -> ProxyConfig {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        from_lookup(|name| map.get(name).cloned())
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8080);
        assert!(config.storage_dir.is_none());
        assert!(config.remote.is_none());
        assert!(config.cache_enabled);
        assert_eq!(config.cache_buffer_bytes, 16 * 1024 * 1024);
    }

    #[test]
    fn test_proxy_settings() {
        let config = config_from(&[
            ("PORT", "9000"),
            ("STORAGE_DIR", "/var/lib/files"),
            ("REMOTE_URL", "https://repo.example.com/files"),
            ("REMOTE_USERNAME", "alice"),
            ("REMOTE_PASSWORD", "secret"),
            ("REMOTE_CONNECT_TIMEOUT_SECS", "3"),
            ("REMOTE_READ_TIMEOUT_SECS", "120"),
            ("PROXY_CACHE", "off"),
            ("CACHE_BUFFER_BYTES", "1048576"),
        ]);

        assert_eq!(config.port, 9000);
        assert_eq!(config.storage_dir, Some(PathBuf::from("/var/lib/files")));
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_buffer_bytes, 1024 * 1024);

        let remote = config.remote.unwrap();
        assert_eq!(remote.fetcher.base_url, "https://repo.example.com/files");
        assert_eq!(remote.fetcher.connect_timeout, Duration::from_secs(3));
        assert_eq!(remote.fetcher.read_timeout, Duration::from_secs(120));
        assert_eq!(remote.username.as_deref(), Some("alice"));
        assert_eq!(remote.password.as_deref(), Some("secret"));
        assert!(remote.token.is_none());
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("PROXY_CACHE", "maybe"),
            ("CACHE_BUFFER_BYTES", "0"),
            ("REMOTE_URL", ""),
        ]);
        assert_eq!(config.port, 8080);
        assert!(config.cache_enabled);
        assert_eq!(config.cache_buffer_bytes, 16 * 1024 * 1024);
        assert!(config.remote.is_none());
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("TRUE"), Some(true));
        assert_eq!(parse_bool(" no "), Some(false));
        assert_eq!(parse_bool("2"), None);
    }
}
