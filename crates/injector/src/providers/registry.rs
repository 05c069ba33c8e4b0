use std::fmt;
use std::sync::Arc;

use crate::container::Injector;
use crate::errors::{InjectorError, Result};
use crate::metadata::{TypeMetadataProvider, SERVICE_PROVIDER_CONTRACT};
use crate::providers::{provider_from_value, ServiceProvider};
use crate::value::{Parameters, Value};

/// Provider registry keeps registered providers in registration order
#[derive(Default)]
pub struct ProviderRegistry {
    providers: Vec<(String, Arc<dyn ServiceProvider>)>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `provider_type` may be registered before constructing it
    pub fn check_registrable(
        &self,
        metadata: &dyn TypeMetadataProvider,
        provider_type: &str,
    ) -> Result<()> {
        if !metadata.type_exists(provider_type) {
            return Err(InjectorError::ProviderClassNotFound {
                provider_type: provider_type.to_string(),
            });
        }

        if self.has_type(provider_type) {
            return Err(InjectorError::ProviderAlreadyRegistered {
                provider_type: provider_type.to_string(),
            });
        }

        if !metadata.is_subtype_of(provider_type, SERVICE_PROVIDER_CONTRACT) {
            return Err(InjectorError::ProviderMissingContract {
                provider_type: provider_type.to_string(),
            });
        }

        Ok(())
    }

    /// Store a constructed provider
    pub fn insert(&mut self, provider_type: &str, provider: Arc<dyn ServiceProvider>) -> Result<()> {
        if self.has_type(provider_type) {
            return Err(InjectorError::ProviderAlreadyRegistered {
                provider_type: provider_type.to_string(),
            });
        }

        self.providers.push((provider_type.to_string(), provider));
        tracing::debug!(provider_type, "service provider registered");
        Ok(())
    }

    /// Whether a provider of this type is registered
    pub fn has_type(&self, provider_type: &str) -> bool {
        self.providers.iter().any(|(name, _)| name == provider_type)
    }

    /// Registered providers, cloned so no lock outlives the call
    pub fn snapshot(&self) -> Vec<Arc<dyn ServiceProvider>> {
        self.providers
            .iter()
            .map(|(_, provider)| Arc::clone(provider))
            .collect()
    }

    /// Provider type names in registration order
    pub fn provider_types(&self) -> Vec<String> {
        self.providers.iter().map(|(name, _)| name.clone()).collect()
    }

    /// Get the number of registered providers
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderRegistry")
            .field("providers", &self.provider_types())
            .finish()
    }
}

/// Provider registry operations bound to an injector
#[derive(Clone, Copy)]
pub struct Providers<'a> {
    injector: &'a Injector,
}

impl<'a> Providers<'a> {
    pub(crate) fn new(injector: &'a Injector) -> Self {
        Self { injector }
    }

    /// Construct `provider_type` through the injector and register it
    pub fn register(&self, provider_type: &str, parameters: &Parameters) -> Result<()> {
        self.injector
            .provider_registry()
            .check_registrable(self.injector.metadata(), provider_type)?;

        let instance = self.injector.instantiate(provider_type, parameters)?;
        let provider = provider_from_value(&instance).ok_or_else(|| {
            InjectorError::ProviderMissingContract {
                provider_type: provider_type.to_string(),
            }
        })?;

        self.injector
            .provider_registry_mut()
            .insert(provider_type, provider)
    }

    /// Whether any registered provider claims `type_name`
    pub fn has(&self, type_name: &str) -> bool {
        self.injector.claiming_provider(type_name).is_some()
    }

    /// Construct `type_name` through the first provider claiming it
    pub fn get(&self, type_name: &str, parameters: &Parameters) -> Result<Value> {
        let provider = self
            .injector
            .claiming_provider(type_name)
            .ok_or_else(|| InjectorError::NoProviderForType {
                type_name: type_name.to_string(),
            })?;
        self.injector.provide(provider.as_ref(), type_name, parameters)
    }

    pub fn len(&self) -> usize {
        self.injector.provider_registry().provider_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
