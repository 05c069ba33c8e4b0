use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;

use thiserror::Error;

use crate::errors::BoxError;
use crate::metadata::descriptor::{FieldDescriptor, ParameterDescriptor, ParameterType};
use crate::metadata::{TypeMetadataProvider, SERVICE_CONTAINER_TYPE, SERVICE_PROVIDER_CONTRACT};
use crate::value::{Object, Value};

type ConstructorFn = Arc<dyn Fn(Arguments) -> Result<Value, BoxError> + Send + Sync>;
type MethodFn = Arc<dyn Fn(&Object, Arguments) -> Result<Value, BoxError> + Send + Sync>;
type FunctionFn = Arc<dyn Fn(Arguments) -> Result<Value, BoxError> + Send + Sync>;
type FieldSetterFn = Arc<dyn Fn(&Object, Value) -> Result<(), BoxError> + Send + Sync>;
type FieldProbeFn = Arc<dyn Fn(&Object) -> bool + Send + Sync>;

/// Catalog construction errors
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("Type '{type_name}' is defined more than once")]
    DuplicateType { type_name: String },

    #[error("Function '{function}' is defined more than once")]
    DuplicateFunction { function: String },

    #[error("Type '{type_name}' declares unknown supertype '{super_type}'")]
    UnknownSupertype {
        type_name: String,
        super_type: String,
    },
}

/// Ordered, already-resolved arguments handed to a raw primitive
#[derive(Debug, Clone, Default)]
pub struct Arguments {
    values: Vec<Value>,
}

impl Arguments {
    pub fn new(values: Vec<Value>) -> Self {
        Self { values }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn value(&self, index: usize) -> Result<&Value, BoxError> {
        self.values
            .get(index)
            .ok_or_else(|| format!("missing argument #{}", index).into())
    }

    pub fn string(&self, index: usize) -> Result<String, BoxError> {
        self.value(index)?
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| format!("argument #{} is not a string", index).into())
    }

    pub fn int(&self, index: usize) -> Result<i64, BoxError> {
        self.value(index)?
            .as_int()
            .ok_or_else(|| format!("argument #{} is not an int", index).into())
    }

    pub fn bool(&self, index: usize) -> Result<bool, BoxError> {
        self.value(index)?
            .as_bool()
            .ok_or_else(|| format!("argument #{} is not a bool", index).into())
    }

    /// Shared handle to an object argument
    pub fn object<T: Any + Send + Sync>(&self, index: usize) -> Result<Arc<T>, BoxError> {
        self.value(index)?.downcast::<T>().ok_or_else(|| {
            format!(
                "argument #{} is not a {}",
                index,
                std::any::type_name::<T>()
            )
            .into()
        })
    }

    /// Object argument that may be null
    pub fn optional<T: Any + Send + Sync>(&self, index: usize) -> Result<Option<Arc<T>>, BoxError> {
        match self.value(index)? {
            Value::Null => Ok(None),
            _ => self.object::<T>(index).map(Some),
        }
    }

    pub fn into_vec(self) -> Vec<Value> {
        self.values
    }
}

/// What kind of type a definition describes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Concrete,
    Abstract,
    Interface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Public,
    Protected,
    Private,
}

/// A method declared on a type
#[derive(Clone)]
pub struct MethodDefinition {
    name: String,
    parameters: Vec<ParameterDescriptor>,
    visibility: Visibility,
    is_static: bool,
    body: MethodFn,
}

impl MethodDefinition {
    /// Public instance method
    pub fn new<F>(name: impl Into<String>, parameters: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(&Object, Arguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            parameters,
            visibility: Visibility::Public,
            is_static: false,
            body: Arc::new(body),
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }
}

/// A field declared on a type
#[derive(Clone)]
pub struct FieldDefinition {
    name: String,
    ty: Option<ParameterType>,
    visibility: Visibility,
    is_static: bool,
    readonly_probe: Option<FieldProbeFn>,
    setter: FieldSetterFn,
}

impl FieldDefinition {
    /// Public mutable field
    pub fn new<F>(name: impl Into<String>, ty: Option<ParameterType>, setter: F) -> Self
    where
        F: Fn(&Object, Value) -> Result<(), BoxError> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            ty,
            visibility: Visibility::Public,
            is_static: false,
            readonly_probe: None,
            setter: Arc::new(setter),
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = visibility;
        self
    }

    pub fn as_static(mut self) -> Self {
        self.is_static = true;
        self
    }

    /// Mark the field readonly; `is_set` reports whether an instance already holds a value
    pub fn readonly<F>(mut self, is_set: F) -> Self
    where
        F: Fn(&Object) -> bool + Send + Sync + 'static,
    {
        self.readonly_probe = Some(Arc::new(is_set));
        self
    }
}

/// Everything the catalog knows about one type
#[derive(Clone)]
pub struct TypeDefinition {
    name: String,
    kind: TypeKind,
    supertypes: Vec<String>,
    constructor: Option<(Vec<ParameterDescriptor>, ConstructorFn)>,
    methods: HashMap<String, MethodDefinition>,
    fields: Vec<FieldDefinition>,
}

impl TypeDefinition {
    fn with_kind(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            supertypes: Vec::new(),
            constructor: None,
            methods: HashMap::new(),
            fields: Vec::new(),
        }
    }

    pub fn concrete(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Concrete)
    }

    pub fn abstract_type(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Abstract)
    }

    pub fn interface(name: impl Into<String>) -> Self {
        Self::with_kind(name, TypeKind::Interface)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a direct supertype (parent type or implemented interface)
    pub fn extends(mut self, super_type: impl Into<String>) -> Self {
        self.supertypes.push(super_type.into());
        self
    }

    /// Declare that this type implements the service provider contract
    pub fn provider(self) -> Self {
        self.extends(SERVICE_PROVIDER_CONTRACT)
    }

    pub fn constructor<F>(mut self, parameters: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.constructor = Some((parameters, Arc::new(body)));
        self
    }

    pub fn method(mut self, method: MethodDefinition) -> Self {
        self.methods.insert(method.name.clone(), method);
        self
    }

    pub fn field(mut self, field: FieldDefinition) -> Self {
        self.fields.push(field);
        self
    }
}

#[derive(Clone)]
struct FunctionDefinition {
    parameters: Vec<ParameterDescriptor>,
    body: FunctionFn,
}

/// Builder collecting type and function definitions
pub struct TypeCatalogBuilder {
    types: Vec<TypeDefinition>,
    functions: Vec<(String, FunctionDefinition)>,
}

impl TypeCatalogBuilder {
    pub fn new() -> Self {
        Self {
            types: vec![
                TypeDefinition::interface(SERVICE_PROVIDER_CONTRACT),
                TypeDefinition::interface(SERVICE_CONTAINER_TYPE),
            ],
            functions: Vec::new(),
        }
    }

    pub fn define(mut self, definition: TypeDefinition) -> Self {
        self.types.push(definition);
        self
    }

    pub fn function<F>(mut self, name: impl Into<String>, parameters: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(Arguments) -> Result<Value, BoxError> + Send + Sync + 'static,
    {
        self.functions.push((
            name.into(),
            FunctionDefinition {
                parameters,
                body: Arc::new(body),
            },
        ));
        self
    }

    /// Validate the definitions and freeze them into a catalog
    pub fn build(self) -> Result<TypeCatalog, CatalogError> {
        let mut types = HashMap::with_capacity(self.types.len());
        for definition in self.types {
            if types.contains_key(&definition.name) {
                return Err(CatalogError::DuplicateType {
                    type_name: definition.name,
                });
            }
            types.insert(definition.name.clone(), definition);
        }

        for definition in types.values() {
            if let Some(missing) = definition
                .supertypes
                .iter()
                .find(|super_type| !types.contains_key(*super_type))
            {
                return Err(CatalogError::UnknownSupertype {
                    type_name: definition.name.clone(),
                    super_type: missing.clone(),
                });
            }
        }

        let mut functions = HashMap::with_capacity(self.functions.len());
        for (name, definition) in self.functions {
            if functions.contains_key(&name) {
                return Err(CatalogError::DuplicateFunction { function: name });
            }
            functions.insert(name, definition);
        }

        Ok(TypeCatalog { types, functions })
    }
}

impl Default for TypeCatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Descriptor-table implementation of [`TypeMetadataProvider`]
///
/// Types, their supertypes, constructors, methods and fields are declared once
/// at startup through [`TypeCatalog::builder`]; afterwards the catalog is
/// immutable and can be shared between injectors.
pub struct TypeCatalog {
    types: HashMap<String, TypeDefinition>,
    functions: HashMap<String, FunctionDefinition>,
}

impl TypeCatalog {
    pub fn builder() -> TypeCatalogBuilder {
        TypeCatalogBuilder::new()
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    fn definition(&self, type_name: &str) -> Result<&TypeDefinition, BoxError> {
        self.types
            .get(type_name)
            .ok_or_else(|| format!("type '{}' is not defined", type_name).into())
    }

    /// The type followed by its supertypes, breadth-first and without repeats
    fn lineage(&self, type_name: &str) -> Vec<&TypeDefinition> {
        let mut lineage = Vec::new();
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([type_name]);
        while let Some(current) = queue.pop_front() {
            if !visited.insert(current) {
                continue;
            }
            let Some(definition) = self.types.get(current) else {
                continue;
            };
            queue.extend(definition.supertypes.iter().map(String::as_str));
            lineage.push(definition);
        }
        lineage
    }

    /// Nearest definition of `method`, inherited ones included
    fn method(&self, type_name: &str, method: &str) -> Option<&MethodDefinition> {
        self.lineage(type_name)
            .into_iter()
            .find_map(|definition| definition.methods.get(method))
    }

    /// Fields of the type and its supertypes; a redeclared field hides the inherited one
    fn fields(&self, type_name: &str) -> Vec<&FieldDefinition> {
        let mut seen = HashSet::new();
        self.lineage(type_name)
            .into_iter()
            .flat_map(|definition| definition.fields.iter())
            .filter(|field| seen.insert(field.name.as_str()))
            .collect()
    }

    fn function(&self, function: &str) -> Result<&FunctionDefinition, BoxError> {
        self.functions
            .get(function)
            .ok_or_else(|| format!("function '{}' is not defined", function).into())
    }
}

impl std::fmt::Debug for TypeCatalog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut types: Vec<&String> = self.types.keys().collect();
        types.sort();
        let mut functions: Vec<&String> = self.functions.keys().collect();
        functions.sort();
        f.debug_struct("TypeCatalog")
            .field("types", &types)
            .field("functions", &functions)
            .finish()
    }
}

impl TypeMetadataProvider for TypeCatalog {
    fn type_exists(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    fn is_instantiable(&self, type_name: &str) -> bool {
        self.types
            .get(type_name)
            .map(|definition| definition.kind == TypeKind::Concrete)
            .unwrap_or(false)
    }

    fn is_subtype_of(&self, sub_type: &str, super_type: &str) -> bool {
        self.lineage(sub_type)
            .iter()
            .any(|definition| definition.name == super_type)
    }

    fn constructor_parameters(&self, type_name: &str) -> Result<Vec<ParameterDescriptor>, BoxError> {
        Ok(self
            .definition(type_name)?
            .constructor
            .as_ref()
            .map(|(parameters, _)| parameters.clone())
            .unwrap_or_default())
    }

    fn has_method(&self, type_name: &str, method: &str) -> bool {
        self.method(type_name, method).is_some()
    }

    fn method_is_static(&self, type_name: &str, method: &str) -> bool {
        self.method(type_name, method)
            .map(|m| m.is_static)
            .unwrap_or(false)
    }

    fn method_is_public(&self, type_name: &str, method: &str) -> bool {
        self.method(type_name, method)
            .map(|m| m.visibility == Visibility::Public)
            .unwrap_or(false)
    }

    fn method_parameters(
        &self,
        type_name: &str,
        method: &str,
    ) -> Result<Vec<ParameterDescriptor>, BoxError> {
        self.method(type_name, method)
            .map(|m| m.parameters.clone())
            .ok_or_else(|| format!("method '{}::{}' is not defined", type_name, method).into())
    }

    fn declared_fields(&self, instance: &Object) -> Vec<FieldDescriptor> {
        self.fields(instance.type_name())
            .into_iter()
            .map(|field| FieldDescriptor {
                name: field.name.clone(),
                ty: field.ty.clone(),
                is_static: field.is_static,
                is_public: field.visibility == Visibility::Public,
                is_readonly_and_set: field
                    .readonly_probe
                    .as_ref()
                    .map(|is_set| is_set(instance))
                    .unwrap_or(false),
            })
            .collect()
    }

    fn set_field(&self, instance: &Object, field: &str, value: Value) -> Result<(), BoxError> {
        let definition = self.definition(instance.type_name())?;
        let field = self
            .fields(&definition.name)
            .into_iter()
            .find(|f| f.name == field)
            .ok_or_else(|| format!("field '{}::{}' is not defined", definition.name, field))?;
        (field.setter)(instance, value)
    }

    fn has_function(&self, function: &str) -> bool {
        self.functions.contains_key(function)
    }

    fn function_parameters(&self, function: &str) -> Result<Vec<ParameterDescriptor>, BoxError> {
        Ok(self.function(function)?.parameters.clone())
    }

    fn construct(&self, type_name: &str, args: Vec<Value>) -> Result<Value, BoxError> {
        let definition = self.definition(type_name)?;
        if definition.kind != TypeKind::Concrete {
            return Err(format!("type '{}' is not concrete", type_name).into());
        }
        match &definition.constructor {
            Some((_, body)) => body(Arguments::new(args)),
            None => Ok(Value::new(definition.name.as_str(), ())),
        }
    }

    fn invoke_method(&self, instance: &Object, method: &str, args: Vec<Value>) -> Result<Value, BoxError> {
        let body = self
            .method(instance.type_name(), method)
            .map(|m| m.body.clone())
            .ok_or_else(|| format!("method '{}::{}' is not defined", instance.type_name(), method))?;
        body(instance, Arguments::new(args))
    }

    fn invoke_function(&self, function: &str, args: Vec<Value>) -> Result<Value, BoxError> {
        let body = self.function(function)?.body.clone();
        body(Arguments::new(args))
    }
}
