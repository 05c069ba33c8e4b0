use thiserror::Error;

use crate::config::ConfigError;

/// Boxed failure raised by a raw construct/invoke primitive or a provider.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the injector
pub type Result<T, E = InjectorError> = std::result::Result<T, E>;

/// Owner name used in diagnostics for free functions and closures
pub const FUNCTION_OWNER: &str = "{function}";

/// Marker used in diagnostics for anonymous closures
pub const CLOSURE_NAME: &str = "{closure}";

/// Error type for every injector operation
#[derive(Debug, Error)]
pub enum InjectorError {
    // Lookup / definition errors
    #[error("Type not defined: {type_name}")]
    TypeNotFound { type_name: String },

    #[error("Type '{type_name}' is not instantiable")]
    TypeNotInstantiable { type_name: String },

    #[error("Method '{method}' is not defined on type '{type_name}'")]
    MethodNotFound { type_name: String, method: String },

    #[error("Method '{method}' on type '{type_name}' is static")]
    MethodIsStatic { type_name: String, method: String },

    #[error("Method '{method}' on type '{type_name}' is not public")]
    MethodNotPublic { type_name: String, method: String },

    #[error("Function not defined: {function}")]
    FunctionNotFound { function: String },

    #[error("Field '{field}' is not defined on type '{type_name}'")]
    FieldNotFound { type_name: String, field: String },

    #[error("Field '{field}' on type '{type_name}' is static")]
    FieldIsStatic { type_name: String, field: String },

    #[error("Field '{field}' on type '{type_name}' is not public")]
    FieldNotPublic { type_name: String, field: String },

    #[error("Service not found: {service_type}")]
    ServiceNotFound { service_type: String },

    #[error("Service type not defined: {service_type}")]
    ServiceClassNotFound { service_type: String },

    #[error("Service container used after its injector was dropped")]
    ContainerDetached,

    #[error("No registered provider supports type '{type_name}'")]
    NoProviderForType { type_name: String },

    #[error("Provider type not defined: {provider_type}")]
    ProviderClassNotFound { provider_type: String },

    #[error("Alias type not defined: {alias}")]
    AliasClassNotFound { alias: String },

    #[error("Alias '{alias}' has not been registered")]
    AliasNotRegistered { alias: String },

    // Registration conflicts
    #[error("Alias '{alias}' is already registered for '{existing}', cannot register it for '{service_type}'")]
    AliasAlreadyRegistered {
        alias: String,
        service_type: String,
        existing: String,
    },

    #[error("Alias '{alias}' and service '{service_type}' are not related by subtyping")]
    AliasTypesNotRelated { alias: String, service_type: String },

    #[error("Provider '{provider_type}' is already registered")]
    ProviderAlreadyRegistered { provider_type: String },

    #[error("Provider '{provider_type}' does not implement the service provider contract")]
    ProviderMissingContract { provider_type: String },

    #[error("Namespace '{namespace}' is already registered")]
    NamespaceAlreadyRegistered { namespace: String },

    #[error("Invalid namespace syntax: '{namespace}'")]
    NamespaceInvalid { namespace: String },

    #[error("Service '{service_type}' is already registered")]
    ServiceAlreadyRegistered { service_type: String },

    #[error("Service '{service_type}' is already resolved and cannot be set")]
    ServiceAlreadyResolved { service_type: String },

    #[error("Instance of '{instance_type}' is not an instance or subtype of service '{service_type}'")]
    ServiceInstanceTypeMismatch {
        service_type: String,
        instance_type: String,
    },

    // Resolution errors
    #[error("Circular reference detected while instantiating '{type_name}': {}", .chain.join(" -> "))]
    CircularReference { type_name: String, chain: Vec<String> },

    #[error("Failed to discover parameter '{parameter}' for '{method}' on '{owner}'")]
    ParameterDiscoveryFailed {
        owner: String,
        method: String,
        parameter: String,
    },

    #[error("Parameter '{parameter}' for '{method}' on '{owner}' has no type and no explicit value")]
    ParameterTypeRequired {
        owner: String,
        method: String,
        parameter: String,
    },

    #[error("Unsupported type shape for parameter '{parameter}': {shape}")]
    UnsupportedTypeShape { parameter: String, shape: String },

    // Downstream wrapping
    #[error("Failed to construct '{type_name}': {source}")]
    ConstructionFailed { type_name: String, source: BoxError },

    #[error("Invocation of '{method}' on '{type_name}' failed: {source}")]
    InvocationFailed {
        type_name: String,
        method: String,
        source: BoxError,
    },

    #[error("Call to '{function}' failed: {source}")]
    CallFailed { function: String, source: BoxError },

    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),
}

impl InjectorError {
    /// Create a new type not found error
    pub fn type_not_found(type_name: impl Into<String>) -> Self {
        Self::TypeNotFound {
            type_name: type_name.into(),
        }
    }

    /// Create a new service not found error
    pub fn service_not_found(service_type: impl Into<String>) -> Self {
        Self::ServiceNotFound {
            service_type: service_type.into(),
        }
    }

    /// Create a new parameter discovery error
    pub fn parameter_discovery_failed(
        owner: impl Into<String>,
        method: impl Into<String>,
        parameter: impl Into<String>,
    ) -> Self {
        Self::ParameterDiscoveryFailed {
            owner: owner.into(),
            method: method.into(),
            parameter: parameter.into(),
        }
    }

    /// Wrap a raw construction failure
    pub fn construction_failed(type_name: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::ConstructionFailed {
            type_name: type_name.into(),
            source: source.into(),
        }
    }

    /// Wrap an invocation failure
    pub fn invocation_failed(
        type_name: impl Into<String>,
        method: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::InvocationFailed {
            type_name: type_name.into(),
            method: method.into(),
            source: source.into(),
        }
    }

    /// Wrap a function or closure call failure
    pub fn call_failed(function: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::CallFailed {
            function: function.into(),
            source: source.into(),
        }
    }

    /// Check if the error is a circular reference
    pub fn is_circular_reference(&self) -> bool {
        matches!(self, Self::CircularReference { .. })
    }

    /// Check if the error reports a missing definition or registration
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TypeNotFound { .. }
                | Self::MethodNotFound { .. }
                | Self::FunctionNotFound { .. }
                | Self::FieldNotFound { .. }
                | Self::ServiceNotFound { .. }
                | Self::ServiceClassNotFound { .. }
                | Self::NoProviderForType { .. }
                | Self::ProviderClassNotFound { .. }
                | Self::AliasClassNotFound { .. }
                | Self::AliasNotRegistered { .. }
        )
    }

    /// Check if the error is a registration conflict
    pub fn is_registration_conflict(&self) -> bool {
        matches!(
            self,
            Self::AliasAlreadyRegistered { .. }
                | Self::AliasTypesNotRelated { .. }
                | Self::ProviderAlreadyRegistered { .. }
                | Self::ProviderMissingContract { .. }
                | Self::NamespaceAlreadyRegistered { .. }
                | Self::NamespaceInvalid { .. }
                | Self::ServiceAlreadyRegistered { .. }
                | Self::ServiceAlreadyResolved { .. }
                | Self::ServiceInstanceTypeMismatch { .. }
        )
    }

    /// Chain of in-progress types for a circular reference
    pub fn circular_chain(&self) -> Option<&[String]> {
        match self {
            Self::CircularReference { chain, .. } => Some(chain),
            _ => None,
        }
    }
}
