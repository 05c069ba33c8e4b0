use std::collections::HashMap;

use crate::container::injector::Injector;
use crate::errors::{InjectorError, Result};
use crate::metadata::TypeMetadataProvider;
use crate::value::{Parameters, Value};

/// Service entry in the registry
#[derive(Debug, Clone)]
pub enum ServiceEntry {
    /// Registered but not built yet; holds the stored constructor parameters
    Pending(Parameters),
    /// Built once and cached
    Resolved(Value),
}

impl ServiceEntry {
    pub fn is_resolved(&self) -> bool {
        matches!(self, ServiceEntry::Resolved(_))
    }

    pub fn instance(&self) -> Option<&Value> {
        match self {
            ServiceEntry::Pending(_) => None,
            ServiceEntry::Resolved(instance) => Some(instance),
        }
    }
}

/// Registry of memoized services keyed by type name
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, ServiceEntry>,
    order: Vec<String>,
}

impl ServiceRegistry {
    /// Create a new service registry
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has(&self, type_name: &str) -> bool {
        self.services.contains_key(type_name)
    }

    pub fn entry(&self, type_name: &str) -> Result<&ServiceEntry> {
        self.services
            .get(type_name)
            .ok_or_else(|| InjectorError::service_not_found(type_name))
    }

    /// Register a pending service with its constructor parameters
    pub fn register(
        &mut self,
        metadata: &dyn TypeMetadataProvider,
        type_name: &str,
        parameters: Parameters,
    ) -> Result<()> {
        if !metadata.type_exists(type_name) {
            return Err(InjectorError::ServiceClassNotFound {
                service_type: type_name.to_string(),
            });
        }

        if self.has(type_name) {
            return Err(InjectorError::ServiceAlreadyRegistered {
                service_type: type_name.to_string(),
            });
        }

        self.services
            .insert(type_name.to_string(), ServiceEntry::Pending(parameters));
        self.order.push(type_name.to_string());
        tracing::debug!(service_type = type_name, "service registered");
        Ok(())
    }

    /// Complete the Pending → Resolved transition
    ///
    /// If the entry was resolved in the meantime (for instance by a `set` issued
    /// while the service was being built), the existing instance is kept and
    /// returned so every caller observes the same instance.
    pub fn resolve(&mut self, type_name: &str, instance: Value) -> Value {
        match self.services.get(type_name) {
            Some(ServiceEntry::Resolved(existing)) => existing.clone(),
            _ => {
                if !self.has(type_name) {
                    self.order.push(type_name.to_string());
                }
                self.services
                    .insert(type_name.to_string(), ServiceEntry::Resolved(instance.clone()));
                tracing::trace!(service_type = type_name, "service resolved");
                instance
            }
        }
    }

    /// Manually provide the instance of a pending service
    pub fn set(
        &mut self,
        metadata: &dyn TypeMetadataProvider,
        type_name: &str,
        instance: Value,
        auto_register: bool,
    ) -> Result<()> {
        if !self.has(type_name) {
            if !auto_register {
                return Err(InjectorError::service_not_found(type_name));
            }
            self.register(metadata, type_name, Parameters::new())?;
        }

        if self.entry(type_name)?.is_resolved() {
            return Err(InjectorError::ServiceAlreadyResolved {
                service_type: type_name.to_string(),
            });
        }

        let compatible = instance
            .type_name()
            .map(|instance_type| metadata.is_subtype_of(instance_type, type_name))
            .unwrap_or(false);
        if !compatible {
            return Err(InjectorError::ServiceInstanceTypeMismatch {
                service_type: type_name.to_string(),
                instance_type: instance.type_name().unwrap_or("null").to_string(),
            });
        }

        self.services
            .insert(type_name.to_string(), ServiceEntry::Resolved(instance));
        tracing::debug!(service_type = type_name, "service instance set");
        Ok(())
    }

    /// Whether the service has been built
    pub fn is_available(&self, type_name: &str) -> Result<bool> {
        Ok(self.entry(type_name)?.is_resolved())
    }

    /// Get the number of registered services
    pub fn service_count(&self) -> usize {
        self.services.len()
    }

    /// Registered services in registration order
    pub fn entries(&self) -> impl Iterator<Item = (&str, &ServiceEntry)> {
        self.order
            .iter()
            .filter_map(|name| self.services.get(name).map(|entry| (name.as_str(), entry)))
    }
}

/// Service registry operations bound to an injector
#[derive(Clone, Copy)]
pub struct Services<'a> {
    injector: &'a Injector,
}

impl<'a> Services<'a> {
    pub(crate) fn new(injector: &'a Injector) -> Self {
        Self { injector }
    }

    /// Register a service; it is built on first `get`
    pub fn register(&self, type_name: &str, parameters: Parameters) -> Result<()> {
        self.injector.service_registry_mut().register(
            self.injector.metadata(),
            type_name,
            parameters,
        )
    }

    /// Get the service instance, building it on first use
    ///
    /// `extra` is merged over the stored constructor parameters when the
    /// service is still pending and ignored once it is resolved.
    pub fn get(&self, type_name: &str, extra: &Parameters) -> Result<Value> {
        self.injector.resolve_service(type_name, extra)
    }

    /// Provide the instance of a pending (or, with `auto_register`, unknown) service
    pub fn set(&self, type_name: &str, instance: Value, auto_register: bool) -> Result<()> {
        self.injector.service_registry_mut().set(
            self.injector.metadata(),
            type_name,
            instance,
            auto_register,
        )
    }

    pub fn is_available(&self, type_name: &str) -> Result<bool> {
        self.injector.service_registry().is_available(type_name)
    }

    pub fn has(&self, type_name: &str) -> bool {
        self.injector.service_registry().has(type_name)
    }

    pub fn len(&self) -> usize {
        self.injector.service_registry().service_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
