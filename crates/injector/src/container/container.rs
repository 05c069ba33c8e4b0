use std::fmt;
use std::sync::Weak;

use crate::container::injector::{Injector, InjectorState};
use crate::errors::{InjectorError, Result};
use crate::value::Value;

/// Handle over the services an injector can supply
///
/// Lookups go through [`Injector::find_service`], so aliases, providers and
/// namespace auto-registration all apply. The handle does not keep the
/// injector alive; once the injector is dropped every lookup fails with
/// [`InjectorError::ContainerDetached`].
#[derive(Clone)]
pub struct ServiceContainer {
    state: Weak<InjectorState>,
}

impl ServiceContainer {
    pub(crate) fn new(injector: &Injector) -> Self {
        Self {
            state: injector.downgrade(),
        }
    }

    /// Whether `type_name` resolves to a service
    ///
    /// Resolution errors count as "not available".
    pub fn has(&self, type_name: &str) -> bool {
        match self.injector() {
            Ok(injector) => matches!(injector.find_service(type_name), Ok(Some(_))),
            Err(_) => false,
        }
    }

    pub fn get(&self, type_name: &str) -> Result<Value> {
        self.injector()?
            .find_service(type_name)?
            .ok_or_else(|| InjectorError::service_not_found(type_name))
    }

    /// Whether the owning injector is still alive
    pub fn is_attached(&self) -> bool {
        self.state.strong_count() > 0
    }

    fn injector(&self) -> Result<Injector> {
        Injector::from_state(self.state.clone()).ok_or(InjectorError::ContainerDetached)
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("attached", &self.is_attached())
            .finish()
    }
}
