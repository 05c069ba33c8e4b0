use std::sync::Arc;

use crate::config::InjectorConfig;
use crate::container::injector::Injector;
use crate::container::namespaces::NamespaceRegistry;
use crate::container::resolution::{service_lookup_hook, LookupHook, LookupRequest, ValueFinder};
use crate::errors::Result;
use crate::metadata::TypeMetadataProvider;
use crate::value::Value;

/// Builder for constructing injectors
pub struct InjectorBuilder {
    metadata: Arc<dyn TypeMetadataProvider>,
    config: InjectorConfig,
    hooks: Vec<LookupHook>,
}

impl InjectorBuilder {
    /// Create a new injector builder over a metadata provider
    pub fn new(metadata: Arc<dyn TypeMetadataProvider>) -> Self {
        Self {
            metadata,
            config: InjectorConfig::default(),
            hooks: Vec::new(),
        }
    }

    /// Replace the configuration
    pub fn with_config(mut self, config: InjectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a namespace at construction
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.config = self.config.with_namespace(namespace);
        self
    }

    /// Toggle the builtin service lookup hook
    pub fn with_service_lookup(mut self, enabled: bool) -> Self {
        self.config = self.config.with_service_lookup(enabled);
        self
    }

    /// Add a lookup hook that runs after the builtin one
    pub fn with_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&Injector, &LookupRequest<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
        self
    }

    /// Build the injector
    pub fn build(self) -> Result<Injector> {
        self.config.validate()?;

        let mut finder = ValueFinder::new();
        if self.config.service_lookup {
            finder.push_hook(service_lookup_hook());
        }
        for hook in self.hooks {
            finder.push_hook(hook);
        }

        let mut namespaces = NamespaceRegistry::new(&self.config.namespace_separator)?;
        for namespace in &self.config.namespaces {
            namespaces.register(namespace)?;
        }

        tracing::debug!(
            service_lookup = self.config.service_lookup,
            namespaces = namespaces.len(),
            hooks = finder.hook_count(),
            "injector built"
        );

        Injector::from_parts(self.metadata, self.config, finder, namespaces)
    }
}
