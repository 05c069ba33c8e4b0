use std::collections::HashMap;

use crate::container::injector::Injector;
use crate::errors::{InjectorError, Result};
use crate::metadata::TypeMetadataProvider;

/// Alias type name mapped to the service type that answers for it
#[derive(Debug, Default)]
pub struct AliasRegistry {
    aliases: HashMap<String, String>,
    order: Vec<String>,
}

impl AliasRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `alias` as another name for `service_type`
    ///
    /// The two types must be related by subtyping in either direction.
    pub fn register(
        &mut self,
        metadata: &dyn TypeMetadataProvider,
        alias: &str,
        service_type: &str,
    ) -> Result<()> {
        if let Some(existing) = self.aliases.get(alias) {
            return Err(InjectorError::AliasAlreadyRegistered {
                alias: alias.to_string(),
                service_type: service_type.to_string(),
                existing: existing.clone(),
            });
        }

        if !metadata.type_exists(service_type) {
            return Err(InjectorError::ServiceClassNotFound {
                service_type: service_type.to_string(),
            });
        }

        if !metadata.type_exists(alias) {
            return Err(InjectorError::AliasClassNotFound {
                alias: alias.to_string(),
            });
        }

        let related = metadata.is_subtype_of(service_type, alias)
            || metadata.is_subtype_of(alias, service_type);
        if !related {
            return Err(InjectorError::AliasTypesNotRelated {
                alias: alias.to_string(),
                service_type: service_type.to_string(),
            });
        }

        self.aliases.insert(alias.to_string(), service_type.to_string());
        self.order.push(alias.to_string());
        tracing::debug!(alias, service_type, "alias registered");
        Ok(())
    }

    pub fn get(&self, alias: &str) -> Result<&str> {
        self.aliases
            .get(alias)
            .map(String::as_str)
            .ok_or_else(|| InjectorError::AliasNotRegistered {
                alias: alias.to_string(),
            })
    }

    /// Service type for `alias`, or `None` when it is not an alias
    pub fn target(&self, alias: &str) -> Option<&str> {
        self.aliases.get(alias).map(String::as_str)
    }

    pub fn has(&self, alias: &str) -> bool {
        self.aliases.contains_key(alias)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// Aliases in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.order.iter().filter_map(|alias| {
            self.aliases
                .get(alias)
                .map(|target| (alias.as_str(), target.as_str()))
        })
    }
}

/// Alias registry operations bound to an injector
#[derive(Clone, Copy)]
pub struct Aliases<'a> {
    injector: &'a Injector,
}

impl<'a> Aliases<'a> {
    pub(crate) fn new(injector: &'a Injector) -> Self {
        Self { injector }
    }

    pub fn register(&self, alias: &str, service_type: &str) -> Result<()> {
        self.injector
            .alias_registry_mut()
            .register(self.injector.metadata(), alias, service_type)
    }

    pub fn get(&self, alias: &str) -> Result<String> {
        self.injector
            .alias_registry()
            .get(alias)
            .map(str::to_string)
    }

    pub fn has(&self, alias: &str) -> bool {
        self.injector.alias_registry().has(alias)
    }
}
