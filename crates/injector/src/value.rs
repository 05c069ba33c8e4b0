//! Dynamically typed values flowing through the injector
//!
//! Every argument the injector resolves, every instance it constructs and every
//! explicit parameter a caller supplies is a [`Value`]: either null, or an
//! [`Object`] pairing a runtime type name with a shared `Any` payload. The type
//! name is what the metadata provider, the registries and the lookup hooks
//! reason about; the payload is what user code downcasts.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Builtin type names used for scalar values
pub mod builtin {
    pub const STRING: &str = "string";
    pub const INT: &str = "int";
    pub const FLOAT: &str = "float";
    pub const BOOL: &str = "bool";
    pub const MIXED: &str = "mixed";
    pub const ARRAY: &str = "array";
    pub const CALLABLE: &str = "callable";
    pub const OBJECT: &str = "object";

    /// All builtin type names
    pub const ALL: &[&str] = &[STRING, INT, FLOAT, BOOL, MIXED, ARRAY, CALLABLE, OBJECT];

    /// Check whether a type name is a builtin (never a service candidate)
    pub fn is_builtin(type_name: &str) -> bool {
        ALL.contains(&type_name)
    }
}

/// A non-null value with its runtime type name
#[derive(Clone)]
pub struct Object {
    type_name: Arc<str>,
    data: Arc<dyn Any + Send + Sync>,
}

impl Object {
    /// Wrap a payload under the given runtime type name
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, data: T) -> Self {
        Self {
            type_name: type_name.into(),
            data: Arc::new(data),
        }
    }

    /// Wrap an already shared payload
    pub fn from_arc(type_name: impl Into<Arc<str>>, data: Arc<dyn Any + Send + Sync>) -> Self {
        Self {
            type_name: type_name.into(),
            data,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.data.downcast_ref::<T>()
    }

    /// Get a shared handle to the payload
    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.data.clone().downcast::<T>().ok()
    }

    pub fn ptr_eq(&self, other: &Object) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("type_name", &self.type_name)
            .field("data", &"<instance>")
            .finish()
    }
}

/// A resolved value: null or an object
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Object(Object),
}

impl Value {
    /// Wrap a payload under the given runtime type name
    pub fn new<T: Any + Send + Sync>(type_name: impl Into<Arc<str>>, data: T) -> Self {
        Value::Object(Object::new(type_name, data))
    }

    pub fn null() -> Self {
        Value::Null
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Runtime type name, `None` for null
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Null => None,
            Value::Object(object) => Some(object.type_name()),
        }
    }

    pub fn as_object(&self) -> Option<&Object> {
        match self {
            Value::Null => None,
            Value::Object(object) => Some(object),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_object().and_then(|object| object.downcast_ref::<T>())
    }

    pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.as_object().and_then(|object| object.downcast::<T>())
    }

    pub fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<String>().map(String::as_str)
    }

    pub fn as_int(&self) -> Option<i64> {
        self.downcast_ref::<i64>().copied()
    }

    pub fn as_float(&self) -> Option<f64> {
        self.downcast_ref::<f64>().copied()
    }

    pub fn as_bool(&self) -> Option<bool> {
        self.downcast_ref::<bool>().copied()
    }

    /// Reference identity; two nulls are considered identical
    pub fn ptr_eq(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Object(a), Value::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<Object> for Value {
    fn from(object: Object) -> Self {
        Value::Object(object)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::new(builtin::STRING, value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::new(builtin::STRING, value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::new(builtin::INT, value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::new(builtin::INT, i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::new(builtin::FLOAT, value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::new(builtin::BOOL, value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}

/// Named values passed to a construction, invocation or call
#[derive(Clone, Debug, Default)]
pub struct Parameters {
    values: HashMap<String, Value>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(name.into(), value.into())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Parameter names, sorted for stable diagnostics
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.values.keys().cloned().collect();
        names.sort();
        names
    }

    /// Merge `overrides` on top of these values; keys in `overrides` win
    pub fn merged_with(&self, overrides: &Parameters) -> Parameters {
        let mut merged = self.clone();
        for (name, value) in &overrides.values {
            merged.values.insert(name.clone(), value.clone());
        }
        merged
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Parameters {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(name, value)| (name.into(), value.into()))
                .collect(),
        }
    }
}
