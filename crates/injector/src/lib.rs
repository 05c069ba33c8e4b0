pub mod config;
pub mod container;
pub mod errors;
pub mod metadata;
pub mod providers;
pub mod value;

// Re-export key types for convenience
pub use config::{ConfigError, ConfigSource, InjectorConfig};
pub use container::{
    Callable, Closure, Injector, InjectorBuilder, InjectorSnapshot, LookupRequest,
    ServiceContainer,
};
pub use errors::{BoxError, InjectorError, Result};
pub use metadata::{
    Arguments, FieldDefinition, MethodDefinition, ParameterDescriptor, ParameterType,
    TypeCatalog, TypeDefinition, TypeMetadataProvider, TypeRef, Visibility,
    SERVICE_CONTAINER_TYPE,
};
pub use providers::{provider_value, ServiceProvider};
pub use value::{Object, Parameters, Value};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const CRATE_NAME: &str = "elif-injector";

/// Get crate version
pub fn version() -> &'static str {
    VERSION
}

/// Get crate name
pub fn name() -> &'static str {
    CRATE_NAME
}
