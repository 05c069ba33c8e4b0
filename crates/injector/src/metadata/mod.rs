//! Type introspection boundary
//!
//! The injector never inspects types itself. Everything it needs to know about
//! a type, a method, a field or a free function comes through
//! [`TypeMetadataProvider`], together with the raw primitives that physically
//! construct objects and call code once the arguments are known.
//! [`TypeCatalog`] is the descriptor-table implementation shipped with the crate.

pub mod catalog;
pub mod descriptor;

pub use catalog::{
    Arguments, CatalogError, FieldDefinition, MethodDefinition, TypeCatalog, TypeCatalogBuilder,
    TypeDefinition, TypeKind, Visibility,
};
pub use descriptor::{FieldDescriptor, ParameterDescriptor, ParameterType, TypeRef};

use crate::errors::BoxError;
use crate::value::{Object, Value};

/// Name of the contract every service provider type must declare
pub const SERVICE_PROVIDER_CONTRACT: &str = "elif_injector::ServiceProvider";

/// Type under which an injector registers its own [`ServiceContainer`](crate::ServiceContainer) handle
pub const SERVICE_CONTAINER_TYPE: &str = "elif_injector::ServiceContainer";

/// Introspection and raw construction capability consumed by the injector
pub trait TypeMetadataProvider: Send + Sync {
    fn type_exists(&self, type_name: &str) -> bool;

    /// Concrete (not abstract, not an interface)
    fn is_instantiable(&self, type_name: &str) -> bool;

    /// Reflexive and transitive: every type is a subtype of itself
    fn is_subtype_of(&self, sub_type: &str, super_type: &str) -> bool;

    /// Ordered constructor parameters; empty when the type declares none
    fn constructor_parameters(&self, type_name: &str) -> Result<Vec<ParameterDescriptor>, BoxError>;

    fn has_method(&self, type_name: &str, method: &str) -> bool;
    fn method_is_static(&self, type_name: &str, method: &str) -> bool;
    fn method_is_public(&self, type_name: &str, method: &str) -> bool;
    fn method_parameters(
        &self,
        type_name: &str,
        method: &str,
    ) -> Result<Vec<ParameterDescriptor>, BoxError>;

    /// Declared fields of the instance's type, in declaration order
    fn declared_fields(&self, instance: &Object) -> Vec<FieldDescriptor>;
    fn set_field(&self, instance: &Object, field: &str, value: Value) -> Result<(), BoxError>;

    fn has_function(&self, function: &str) -> bool;
    fn function_parameters(&self, function: &str) -> Result<Vec<ParameterDescriptor>, BoxError>;

    /// Raw construction with already-resolved arguments
    fn construct(&self, type_name: &str, args: Vec<Value>) -> Result<Value, BoxError>;
    fn invoke_method(&self, instance: &Object, method: &str, args: Vec<Value>) -> Result<Value, BoxError>;
    fn invoke_function(&self, function: &str, args: Vec<Value>) -> Result<Value, BoxError>;
}
