//! INI parsing: the single place where INI keys map to struct fields.

use std::path::PathBuf;

use ini::Ini;

use super::file::{ConfigFile, ConfigFileError};
use crate::registry::RegistryUrls;

/// Parse an `Ini` object into a `ConfigFile`.
///
/// Starts from `ConfigFile::default()` and overlays any values found in the INI.
pub(super) fn parse_ini(ini: &Ini) -> Result<ConfigFile, ConfigFileError> {
    let mut config = ConfigFile::default();

    // [registry] section
    if let Some(section) = ini.section(Some("registry")) {
        if let Some(v) = section.get("url") {
            let v = v.trim();
            if !v.is_empty() {
                let urls = RegistryUrls::new(v).map_err(|_| {
                    invalid("registry", "url", v, "must be an http:// or https:// URL")
                })?;
                config.registry.url = urls.base().to_string();
            }
        }
        if let Some(v) = section.get("request_timeout") {
            config.registry.request_timeout = match v.trim().parse::<u64>() {
                Ok(secs) if secs > 0 => secs,
                _ => {
                    return Err(invalid(
                        "registry",
                        "request_timeout",
                        v,
                        "must be a positive integer (seconds)",
                    ))
                }
            };
        }
    }

    // [install] section
    if let Some(section) = ini.section(Some("install")) {
        if let Some(v) = section.get("concurrency") {
            config.install.concurrency = match v.trim().parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(invalid(
                        "install",
                        "concurrency",
                        v,
                        "must be a positive integer",
                    ))
                }
            };
        }
        if let Some(v) = section.get("batch_timeout") {
            config.install.batch_timeout = v.trim().parse().map_err(|_| {
                invalid(
                    "install",
                    "batch_timeout",
                    v,
                    "must be a non-negative integer (seconds, 0 disables)",
                )
            })?;
        }
        if let Some(v) = section.get("dependency_dir") {
            let v = v.trim();
            if !v.is_empty() {
                config.install.dependency_dir = PathBuf::from(v);
            }
        }
    }

    Ok(config)
}

fn invalid(section: &str, key: &str, value: &str, reason: &str) -> ConfigFileError {
    ConfigFileError::InvalidValue {
        section: section.to_string(),
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Result<ConfigFile, ConfigFileError> {
        parse_ini(&Ini::load_from_str(text).unwrap())
    }

    #[test]
    fn test_empty_ini_gives_defaults() {
        assert_eq!(parse("").unwrap(), ConfigFile::default());
    }

    #[test]
    fn test_overlay_values() {
        let config = parse(
            "[registry]\nurl = http://localhost:4873/\nrequest_timeout = 5\n\n\
             [install]\nconcurrency = 4\nbatch_timeout = 0\ndependency_dir = vendor/js\n",
        )
        .unwrap();

        assert_eq!(config.registry.url, "http://localhost:4873");
        assert_eq!(config.registry.request_timeout, 5);
        assert_eq!(config.install.concurrency, 4);
        assert_eq!(config.install.batch_timeout, 0);
        assert_eq!(config.install.dependency_dir, PathBuf::from("vendor/js"));
    }

    #[test]
    fn test_invalid_concurrency() {
        let err = parse("[install]\nconcurrency = 0\n").unwrap_err();
        match err {
            ConfigFileError::InvalidValue { section, key, .. } => {
                assert_eq!(section, "install");
                assert_eq!(key, "concurrency");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_invalid_url() {
        let err = parse("[registry]\nurl = ftp://mirror.local\n").unwrap_err();
        assert!(err.to_string().contains("registry.url"));
    }

    #[test]
    fn test_invalid_timeouts() {
        assert!(parse("[registry]\nrequest_timeout = 0\n").is_err());
        assert!(parse("[install]\nbatch_timeout = soon\n").is_err());
    }
}
