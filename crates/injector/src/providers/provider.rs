use std::sync::Arc;

use crate::container::Injector;
use crate::errors::Result;
use crate::value::{Parameters, Value};

/// Service provider contract
///
/// A registered provider is asked, in registration order, whether it claims a
/// type; the first one that does constructs it instead of the injector. The
/// injector is handed in on every call so providers can resolve their own
/// dependencies through it.
pub trait ServiceProvider: Send + Sync {
    /// Whether this provider constructs `type_name`
    fn supports(&self, injector: &Injector, type_name: &str) -> bool;

    /// Construct an instance of a supported type
    fn construct(&self, injector: &Injector, type_name: &str, parameters: &Parameters) -> Result<Value>;
}

/// Wrap a provider as the value a provider type's constructor returns
///
/// Provider registration constructs the provider type through the injector and
/// expects the resulting value to carry the provider behind this wrapper.
pub fn provider_value<P>(type_name: &str, provider: P) -> Value
where
    P: ServiceProvider + 'static,
{
    let provider: Arc<dyn ServiceProvider> = Arc::new(provider);
    Value::new(type_name, provider)
}

/// Extract the provider carried by a value built with [`provider_value`]
pub fn provider_from_value(value: &Value) -> Option<Arc<dyn ServiceProvider>> {
    value.downcast_ref::<Arc<dyn ServiceProvider>>().cloned()
}
