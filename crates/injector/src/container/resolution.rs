//! Value resolution chain
//!
//! Resolves a value for one named, typed parameter. Explicit values always win;
//! otherwise every registered lookup hook is asked, in registration order, for
//! every candidate type, in declaration order. The first hook that answers
//! stops the search. When nothing answers but a candidate type is nullable the
//! parameter resolves to null.

use std::fmt;
use std::sync::Arc;

use crate::container::injector::Injector;
use crate::errors::{InjectorError, Result};
use crate::metadata::{ParameterDescriptor, ParameterType};
use crate::value::{builtin, Parameters, Value};

/// What a lookup hook is asked to supply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LookupRequest<'a> {
    /// Parameter or field name
    pub name: &'a str,
    /// One candidate type of the parameter
    pub type_name: &'a str,
}

/// Lookup hook: `Ok(Some(value))` reports a match, `Ok(None)` passes
pub type LookupHook = Arc<dyn Fn(&Injector, &LookupRequest<'_>) -> Result<Option<Value>> + Send + Sync>;

/// Ordered chain of lookup hooks
#[derive(Clone, Default)]
pub struct ValueFinder {
    hooks: Vec<LookupHook>,
}

impl ValueFinder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a hook; hooks run in registration order
    pub fn on_lookup<F>(&mut self, hook: F)
    where
        F: Fn(&Injector, &LookupRequest<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        self.hooks.push(Arc::new(hook));
    }

    pub fn push_hook(&mut self, hook: LookupHook) {
        self.hooks.push(hook);
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Resolve one value, `Ok(None)` when nothing supplies it
    pub fn find_value(
        &self,
        injector: &Injector,
        name: &str,
        ty: Option<&ParameterType>,
        explicit: &Parameters,
    ) -> Result<Option<Value>> {
        if let Some(value) = explicit.get(name) {
            return Ok(Some(value.clone()));
        }

        // Without a declared type only an explicit value can satisfy the parameter
        let Some(ty) = ty else {
            return Ok(None);
        };

        let candidates = ty
            .candidates()
            .ok_or_else(|| InjectorError::UnsupportedTypeShape {
                parameter: name.to_string(),
                shape: ty.to_string(),
            })?;

        let mut allows_null = false;
        for candidate in candidates {
            let request = LookupRequest {
                name,
                type_name: &candidate.name,
            };
            for hook in &self.hooks {
                if let Some(value) = hook(injector, &request)? {
                    tracing::trace!(name, type_name = %candidate.name, "lookup hook supplied value");
                    return Ok(Some(value));
                }
            }
            allows_null |= candidate.nullable;
        }

        Ok(allows_null.then(Value::null))
    }

    /// Resolve every parameter in order, falling back to declared defaults
    pub fn find_parameters(
        &self,
        injector: &Injector,
        owner: &str,
        method: &str,
        descriptors: &[ParameterDescriptor],
        explicit: &Parameters,
    ) -> Result<Vec<Value>> {
        let mut resolved = Vec::with_capacity(descriptors.len());

        for descriptor in descriptors {
            if let Some(value) = self.find_value(injector, &descriptor.name, descriptor.ty.as_ref(), explicit)? {
                resolved.push(value);
                continue;
            }

            match (&descriptor.default, &descriptor.ty) {
                (Some(default), _) => resolved.push(default.clone()),
                (None, None) => {
                    return Err(InjectorError::ParameterTypeRequired {
                        owner: owner.to_string(),
                        method: method.to_string(),
                        parameter: descriptor.name.clone(),
                    })
                }
                (None, Some(_)) => {
                    return Err(InjectorError::parameter_discovery_failed(
                        owner,
                        method,
                        &descriptor.name,
                    ))
                }
            }
        }

        Ok(resolved)
    }
}

impl fmt::Debug for ValueFinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueFinder")
            .field("hooks", &self.hooks.len())
            .finish()
    }
}

/// Builtin hook treating every non-builtin candidate type as a potential service
pub fn service_lookup_hook() -> LookupHook {
    Arc::new(|injector: &Injector, request: &LookupRequest<'_>| {
        if builtin::is_builtin(request.type_name) {
            return Ok(None);
        }
        injector.find_service(request.type_name)
    })
}

/// Hook supplying values for one exact candidate type through a delegate
pub fn delegate_hook<F>(type_name: impl Into<String>, delegate: F) -> LookupHook
where
    F: Fn(&Injector, &LookupRequest<'_>) -> Result<Value> + Send + Sync + 'static,
{
    let type_name = type_name.into();
    Arc::new(move |injector: &Injector, request: &LookupRequest<'_>| {
        if request.type_name != type_name {
            return Ok(None);
        }
        delegate(injector, request).map(Some)
    })
}
