use regex::Regex;

use crate::config::ConfigError;
use crate::container::injector::Injector;
use crate::errors::{InjectorError, Result};

/// Namespace prefixes whose types are auto-registered as services
#[derive(Debug, Clone)]
pub struct NamespaceRegistry {
    separator: String,
    syntax: Regex,
    namespaces: Vec<String>,
}

impl NamespaceRegistry {
    /// Create a registry for namespaces using `separator` between segments
    pub fn new(separator: &str) -> std::result::Result<Self, ConfigError> {
        if separator.is_empty() {
            return Err(ConfigError::invalid_value(
                "namespace_separator",
                separator,
                "a non-empty separator",
            ));
        }

        let sep = regex::escape(separator);
        let pattern = format!(
            r"^[A-Za-z][A-Za-z0-9_]*(?:{sep}[A-Za-z_][A-Za-z0-9_]*)*(?:{sep})?$"
        );
        let syntax = Regex::new(&pattern).map_err(|e| {
            ConfigError::validation_failed(format!(
                "Invalid namespace separator '{}': {}",
                separator, e
            ))
        })?;

        Ok(Self {
            separator: separator.to_string(),
            syntax,
            namespaces: Vec::new(),
        })
    }

    pub fn separator(&self) -> &str {
        &self.separator
    }

    /// Register a namespace, normalized to end with the separator
    pub fn register(&mut self, namespace: &str) -> Result<()> {
        if !self.syntax.is_match(namespace) {
            return Err(InjectorError::NamespaceInvalid {
                namespace: namespace.to_string(),
            });
        }

        let mut normalized = namespace.to_string();
        if !normalized.ends_with(&self.separator) {
            normalized.push_str(&self.separator);
        }

        if self.namespaces.contains(&normalized) {
            return Err(InjectorError::NamespaceAlreadyRegistered {
                namespace: normalized,
            });
        }

        tracing::debug!(namespace = %normalized, "namespace registered");
        self.namespaces.push(normalized);
        Ok(())
    }

    /// Whether `type_name` lives under any registered namespace
    pub fn contains(&self, type_name: &str) -> bool {
        self.namespaces
            .iter()
            .any(|namespace| type_name.starts_with(namespace.as_str()))
    }

    pub fn len(&self) -> usize {
        self.namespaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.namespaces.is_empty()
    }

    pub fn namespaces(&self) -> &[String] {
        &self.namespaces
    }
}

/// Namespace registry operations bound to an injector
#[derive(Clone, Copy)]
pub struct Namespaces<'a> {
    injector: &'a Injector,
}

impl<'a> Namespaces<'a> {
    pub(crate) fn new(injector: &'a Injector) -> Self {
        Self { injector }
    }

    pub fn register(&self, namespace: &str) -> Result<()> {
        self.injector
            .namespace_registry_mut()
            .register(namespace)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.injector.namespace_registry().contains(type_name)
    }
}
