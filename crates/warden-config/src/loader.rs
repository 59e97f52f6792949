// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Configuration loading.
//!
//! Pipeline: read file, resolve `${VAR}` / `${VAR:default}` placeholders,
//! parse by extension (YAML, TOML, JSON), apply `WARDEN_*` environment
//! overrides, validate.

use std::env;
use std::fs;
use std::path::Path;

use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::error::{ConfigError, ConfigResult};
use crate::schema::WardenConfig;

// =============================================================================
// ConfigFormat
// =============================================================================

/// Supported configuration file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// YAML format.
    Yaml,
    /// TOML format.
    Toml,
    /// JSON format.
    Json,
}

impl ConfigFormat {
    /// Determines the format from a file path.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());

        match ext.as_deref() {
            Some("yaml") | Some("yml") => Ok(ConfigFormat::Yaml),
            Some("toml") => Ok(ConfigFormat::Toml),
            Some("json") => Ok(ConfigFormat::Json),
            Some(other) => Err(ConfigError::unsupported_format(other)),
            None => Err(ConfigError::unsupported_format("(no extension)")),
        }
    }
}

// =============================================================================
// ConfigLoader
// =============================================================================

/// Loads and processes WARDEN configuration files.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_prefix: String,
    resolve_env_vars: bool,
}

impl ConfigLoader {
    /// Creates a loader with the `WARDEN` environment prefix.
    pub fn new() -> Self {
        Self {
            env_prefix: "WARDEN".to_string(),
            resolve_env_vars: true,
        }
    }

    /// Sets the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Enables or disables environment variable resolution.
    pub fn with_env_vars(mut self, enabled: bool) -> Self {
        self.resolve_env_vars = enabled;
        self
    }

    /// Loads configuration from a file.
    pub fn load(&self, path: impl AsRef<Path>) -> ConfigResult<WardenConfig> {
        let path = path.as_ref();
        info!("Loading configuration from: {}", path.display());

        if !path.exists() {
            return Err(ConfigError::file_not_found(path));
        }
        let content = fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
        let format = ConfigFormat::from_path(path)?;

        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(&content)?
        } else {
            content
        };
        let mut config: WardenConfig = parse_str(&content, format).map_err(|e| match e {
            ConfigError::Serialization { message } => ConfigError::parse(path, message),
            other => other,
        })?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }
        config.validate()?;

        info!("Configuration loaded successfully");
        Ok(config)
    }

    /// Loads configuration from a string in the given format.
    pub fn load_from_str(&self, content: &str, format: ConfigFormat) -> ConfigResult<WardenConfig> {
        let content = if self.resolve_env_vars {
            self.resolve_env_placeholders(content)?
        } else {
            content.to_string()
        };

        let mut config = parse_str(&content, format)?;

        if self.resolve_env_vars {
            self.apply_env_overrides(&mut config)?;
        }
        config.validate()?;
        Ok(config)
    }

    /// Resolves `${VAR}` and `${VAR:default}` placeholders in content.
    fn resolve_env_placeholders(&self, content: &str) -> ConfigResult<String> {
        let mut result = String::with_capacity(content.len());
        let mut chars = content.chars().peekable();

        while let Some(c) = chars.next() {
            if c == '$' && chars.peek() == Some(&'{') {
                chars.next(); // consume '{'

                let mut var_content = String::new();
                let mut found_close = false;
                for c in chars.by_ref() {
                    if c == '}' {
                        found_close = true;
                        break;
                    }
                    var_content.push(c);
                }

                if !found_close {
                    result.push('$');
                    result.push('{');
                    result.push_str(&var_content);
                    continue;
                }

                let (var_name, default_value) = match var_content.find(':') {
                    Some(idx) => (&var_content[..idx], Some(&var_content[idx + 1..])),
                    None => (var_content.as_str(), None),
                };

                match env::var(var_name) {
                    Ok(value) => result.push_str(&value),
                    Err(_) => {
                        if let Some(default) = default_value {
                            result.push_str(default);
                        } else {
                            warn!("Environment variable '{}' not found", var_name);
                            result.push_str(&format!("${{{var_name}}}"));
                        }
                    }
                }
            } else {
                result.push(c);
            }
        }

        Ok(result)
    }

    /// Applies `WARDEN_*` environment overrides.
    fn apply_env_overrides(&self, config: &mut WardenConfig) -> ConfigResult<()> {
        if let Ok(value) = env::var(format!("{}_PORT", self.env_prefix)) {
            config.server.port = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(
                    format!("{}_PORT", self.env_prefix),
                    "expected valid port number",
                )
            })?;
        }
        if let Ok(value) = env::var(format!("{}_ENVIRONMENT", self.env_prefix)) {
            config.server.environment = value;
        }
        if let Ok(value) = env::var(format!("{}_DATABASE_URL", self.env_prefix)) {
            config.database.url = value;
        }
        if let Ok(value) = env::var(format!("{}_JWT_ACCESS_SECRET", self.env_prefix)) {
            config.jwt.access_secret = value;
        }
        if let Ok(value) = env::var(format!("{}_JWT_REFRESH_SECRET", self.env_prefix)) {
            config.jwt.refresh_secret = value;
        }
        if let Ok(value) = env::var(format!("{}_RATE_LIMIT_PER_SECOND", self.env_prefix)) {
            config.rate_limit.per_second = value.parse().map_err(|_| {
                ConfigError::invalid_env_var(
                    format!("{}_RATE_LIMIT_PER_SECOND", self.env_prefix),
                    "expected valid number",
                )
            })?;
        }
        if let Ok(value) = env::var(format!("{}_LOG_LEVEL", self.env_prefix)) {
            config.logging.level = value;
        }
        Ok(())
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Helpers
// =============================================================================

fn parse_str<T: DeserializeOwned>(content: &str, format: ConfigFormat) -> ConfigResult<T> {
    match format {
        ConfigFormat::Yaml => {
            let parsed = config::Config::builder()
                .add_source(config::File::from_str(content, config::FileFormat::Yaml))
                .build()
                .map_err(|e| ConfigError::serialization(e.to_string()))?;
            parsed
                .try_deserialize()
                .map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Toml => {
            toml::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
        ConfigFormat::Json => {
            serde_json::from_str(content).map_err(|e| ConfigError::serialization(e.to_string()))
        }
    }
}

/// Loads configuration from a file with default settings.
pub fn load_config(path: impl AsRef<Path>) -> ConfigResult<WardenConfig> {
    ConfigLoader::new().load(path)
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn test_yaml() -> String {
        r#"
server:
  port: 50051
  environment: development

database:
  url: memory://

jwt:
  access_secret: access-secret-long-enough-for-testing-00
  refresh_secret: refresh-secret-long-enough-for-testing-0
  access_expiration_secs: 900
  refresh_expiration_secs: 604800

oauth_providers:
  github:
    client_id: gh-client
    client_secret: gh-secret
    redirect_url: https://x.io/cb

rate_limit:
  per_second: 100

logging:
  level: info
"#
        .to_string()
    }

    #[test]
    fn test_load_yaml() {
        let mut file = NamedTempFile::with_suffix(".yaml").unwrap();
        file.write_all(test_yaml().as_bytes()).unwrap();

        let config = ConfigLoader::new().load(file.path()).unwrap();

        assert_eq!(config.server.port, 50051);
        assert_eq!(config.database.url, "memory://");
        assert!(config.oauth_providers.contains_key("github"));
    }

    #[test]
    fn test_format_from_path() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("warden.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("warden.toml")).unwrap(),
            ConfigFormat::Toml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("warden.json")).unwrap(),
            ConfigFormat::Json
        );
        assert!(ConfigFormat::from_path(Path::new("warden.ini")).is_err());
    }

    #[test]
    fn test_env_placeholder_with_default() {
        let loader = ConfigLoader::new();
        let result = loader
            .resolve_env_placeholders("url: ${WARDEN_TEST_NONEXISTENT:memory://}")
            .unwrap();
        assert_eq!(result, "url: memory://");
    }

    #[test]
    fn test_missing_file() {
        let result = ConfigLoader::new().load("/nonexistent/warden.yaml");
        assert!(matches!(result, Err(ConfigError::FileNotFound { .. })));
    }

    #[test]
    fn test_invalid_config_rejected() {
        // Equal secrets must fail validation.
        let yaml = test_yaml().replace(
            "refresh_secret: refresh-secret-long-enough-for-testing-0",
            "refresh_secret: access-secret-long-enough-for-testing-00",
        );
        let result = ConfigLoader::new()
            .with_env_vars(false)
            .load_from_str(&yaml, ConfigFormat::Yaml);
        assert!(matches!(result, Err(ConfigError::Validation { .. })));
    }

    #[test]
    fn test_load_toml() {
        let toml = r#"
[database]
url = "memory://"

[jwt]
access_secret = "access-secret-long-enough-for-testing-00"
refresh_secret = "refresh-secret-long-enough-for-testing-0"
"#;
        let config = ConfigLoader::new()
            .with_env_vars(false)
            .load_from_str(toml, ConfigFormat::Toml)
            .unwrap();
        assert_eq!(config.server.port, crate::schema::DEFAULT_PORT);
    }
}
