use std::fmt;

use crate::value::Value;

/// A single named type as it appears in a signature
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TypeRef {
    pub name: String,
    pub nullable: bool,
}

impl TypeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: false,
        }
    }

    pub fn nullable(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            nullable: true,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.nullable {
            write!(f, "?{}", self.name)
        } else {
            f.write_str(&self.name)
        }
    }
}

/// Declared type shape of a parameter or field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParameterType {
    /// One candidate type
    Named(TypeRef),
    /// Candidates tried in declaration order
    Union(Vec<TypeRef>),
    /// Cannot be enumerated into candidates
    Intersection(Vec<TypeRef>),
}

impl ParameterType {
    pub fn named(name: impl Into<String>) -> Self {
        ParameterType::Named(TypeRef::new(name))
    }

    pub fn nullable(name: impl Into<String>) -> Self {
        ParameterType::Named(TypeRef::nullable(name))
    }

    pub fn union<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ParameterType::Union(names.into_iter().map(TypeRef::new).collect())
    }

    /// Candidate types in declaration order, `None` when the shape is unsupported
    pub fn candidates(&self) -> Option<&[TypeRef]> {
        match self {
            ParameterType::Named(type_ref) => Some(std::slice::from_ref(type_ref)),
            ParameterType::Union(types) => Some(types),
            ParameterType::Intersection(_) => None,
        }
    }

    pub fn allows_null(&self) -> bool {
        self.candidates()
            .map(|types| types.iter().any(|t| t.nullable))
            .unwrap_or(false)
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let join = |types: &[TypeRef], sep: &str| {
            types
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(sep)
        };
        match self {
            ParameterType::Named(type_ref) => write!(f, "{}", type_ref),
            ParameterType::Union(types) => f.write_str(&join(types, "|")),
            ParameterType::Intersection(types) => f.write_str(&join(types, "&")),
        }
    }
}

/// Metadata for one constructor, method or function parameter
#[derive(Debug, Clone)]
pub struct ParameterDescriptor {
    pub name: String,
    pub ty: Option<ParameterType>,
    pub default: Option<Value>,
}

impl ParameterDescriptor {
    /// Parameter with no declared type
    pub fn untyped(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ty: None,
            default: None,
        }
    }

    pub fn typed(name: impl Into<String>, ty: ParameterType) -> Self {
        Self {
            name: name.into(),
            ty: Some(ty),
            default: None,
        }
    }

    /// Shorthand for a parameter of one non-nullable type
    pub fn of(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::typed(name, ParameterType::named(type_name))
    }

    /// Shorthand for a parameter of one nullable type
    pub fn optional(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self::typed(name, ParameterType::nullable(type_name))
    }

    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }

    pub fn allows_null(&self) -> bool {
        self.ty.as_ref().map(ParameterType::allows_null).unwrap_or(false)
    }
}

/// Metadata for one declared field, as seen on a particular instance
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: Option<ParameterType>,
    pub is_static: bool,
    pub is_public: bool,
    /// Readonly field that already holds a value on this instance
    pub is_readonly_and_set: bool,
}
