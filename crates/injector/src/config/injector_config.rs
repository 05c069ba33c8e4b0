use std::collections::HashMap;
use std::env;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::{ConfigError, ConfigSource};

/// Environment variable toggling the builtin service lookup hook
pub const ENV_SERVICE_LOOKUP: &str = "ELIF_INJECTOR_SERVICE_LOOKUP";
/// Environment variable overriding the namespace separator
pub const ENV_NAMESPACE_SEPARATOR: &str = "ELIF_INJECTOR_NAMESPACE_SEPARATOR";
/// Environment variable listing namespaces to auto-register, comma separated
pub const ENV_NAMESPACES: &str = "ELIF_INJECTOR_NAMESPACES";

pub const DEFAULT_NAMESPACE_SEPARATOR: &str = "::";

const FIELDS: [&str; 3] = ["service_lookup", "namespace_separator", "namespaces"];

/// Injector configuration
///
/// Equality compares the settings only, not where they came from.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct InjectorConfig {
    /// Install the builtin hook resolving non-builtin parameter types as services
    pub service_lookup: bool,
    /// Separator between namespace segments in type names
    pub namespace_separator: String,
    /// Namespaces whose types are auto-registered as services on first request
    pub namespaces: Vec<String>,
    /// Where each explicitly set field came from, keyed by field name
    #[serde(skip)]
    pub(crate) sources: HashMap<String, ConfigSource>,
}

impl InjectorConfig {
    pub fn new() -> Self {
        Self {
            service_lookup: true,
            namespace_separator: DEFAULT_NAMESPACE_SEPARATOR.to_string(),
            namespaces: Vec::new(),
            sources: HashMap::new(),
        }
    }

    /// Builder-style namespace registration
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespaces.push(namespace.into());
        self.record("namespaces", ConfigSource::Programmatic);
        self
    }

    /// Builder-style toggle of the builtin service lookup hook
    pub fn with_service_lookup(mut self, enabled: bool) -> Self {
        self.service_lookup = enabled;
        self.record("service_lookup", ConfigSource::Programmatic);
        self
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut config = Self::new();

        if let Ok(value) = env::var(ENV_SERVICE_LOOKUP) {
            config.service_lookup = parse_flag("service_lookup", &value)?;
            config.record("service_lookup", ConfigSource::EnvVar(ENV_SERVICE_LOOKUP.to_string()));
        }

        if let Ok(separator) = env::var(ENV_NAMESPACE_SEPARATOR) {
            config.namespace_separator = separator;
            config.record(
                "namespace_separator",
                ConfigSource::EnvVar(ENV_NAMESPACE_SEPARATOR.to_string()),
            );
        }

        if let Ok(namespaces) = env::var(ENV_NAMESPACES) {
            config.namespaces = namespaces
                .split(',')
                .map(str::trim)
                .filter(|ns| !ns.is_empty())
                .map(str::to_string)
                .collect();
            config.record("namespaces", ConfigSource::EnvVar(ENV_NAMESPACES.to_string()));
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a YAML document
    ///
    /// Keys present in the document are reported as programmatic.
    pub fn from_yaml_str(content: &str) -> Result<Self, ConfigError> {
        Self::parse_yaml(content, ConfigSource::Programmatic)
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        Self::parse_yaml(&content, ConfigSource::File(path.display().to_string()))
    }

    fn parse_yaml(content: &str, source: ConfigSource) -> Result<Self, ConfigError> {
        let document: serde_yaml::Value = serde_yaml::from_str(content)?;
        let mut config: Self = serde_yaml::from_value(document.clone())?;

        if let serde_yaml::Value::Mapping(mapping) = &document {
            for key in mapping.keys().filter_map(serde_yaml::Value::as_str) {
                config.record(key, source.clone());
            }
        }

        config.validate()?;
        Ok(config)
    }

    /// Note where `field` was set; unknown field names are ignored
    pub(crate) fn record(&mut self, field: &str, source: ConfigSource) {
        if FIELDS.contains(&field) {
            self.sources.insert(field.to_string(), source);
        }
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        let separator = &self.namespace_separator;
        if separator.is_empty()
            || separator
                .chars()
                .any(|c| c.is_alphanumeric() || c == '_' || c.is_whitespace())
        {
            return Err(ConfigError::invalid_value(
                "namespace_separator",
                separator.clone(),
                "non-empty punctuation such as '::' or '\\'",
            ));
        }

        if let Some(blank) = self.namespaces.iter().find(|ns| ns.trim().is_empty()) {
            return Err(ConfigError::invalid_value(
                "namespaces",
                blank.clone(),
                "non-empty namespace names",
            ));
        }

        Ok(())
    }

    /// Get configuration source information for debugging
    pub fn config_sources(&self) -> HashMap<String, ConfigSource> {
        let defaults = ["true", DEFAULT_NAMESPACE_SEPARATOR, "none"];
        FIELDS
            .iter()
            .zip(defaults)
            .map(|(field, default)| {
                let source = self
                    .sources
                    .get(*field)
                    .cloned()
                    .unwrap_or_else(|| ConfigSource::Default(default.to_string()));
                (field.to_string(), source)
            })
            .collect()
    }
}

impl Default for InjectorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for InjectorConfig {
    fn eq(&self, other: &Self) -> bool {
        self.service_lookup == other.service_lookup
            && self.namespace_separator == other.namespace_separator
            && self.namespaces == other.namespaces
    }
}

impl Eq for InjectorConfig {}

fn parse_flag(field: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::invalid_value(field, value, "true or false")),
    }
}
