//! The dependency injector
//!
//! [`Injector`] owns the instantiation tracker, the value resolution chain and
//! the four registries. The state sits behind an `Arc` so a
//! [`ServiceContainer`] handle can be registered as a service. Every lock is
//! released before control passes into a hook, a provider or a raw metadata
//! primitive, so resolution may re-enter the injector freely.
//!
//! One resolution chain runs at a time: callers sharing an injector across
//! threads must serialize access to it.

use std::fmt;
use std::sync::{
    Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard, Weak,
};

use crate::config::InjectorConfig;
use crate::container::aliases::{AliasRegistry, Aliases};
use crate::container::builder::InjectorBuilder;
use crate::container::container::ServiceContainer;
use crate::container::debug::InjectorSnapshot;
use crate::container::namespaces::{NamespaceRegistry, Namespaces};
use crate::container::registry::{ServiceEntry, ServiceRegistry, Services};
use crate::container::resolution::{delegate_hook, LookupRequest, ValueFinder};
use crate::container::tracker::{InstantiationTracker, TrackerFrame};
use crate::errors::{BoxError, InjectorError, Result, CLOSURE_NAME, FUNCTION_OWNER};
use crate::metadata::{
    Arguments, ParameterDescriptor, ParameterType, TypeMetadataProvider, SERVICE_CONTAINER_TYPE,
};
use crate::providers::{ProviderRegistry, Providers, ServiceProvider};
use crate::value::{Parameters, Value};

/// Method name reported for constructor parameters
pub const CONSTRUCTOR: &str = "new";

type ClosureBody = Arc<dyn Fn(Arguments) -> std::result::Result<Value, BoxError> + Send + Sync>;

/// Anonymous callable carrying its own parameter descriptors
#[derive(Clone)]
pub struct Closure {
    parameters: Vec<ParameterDescriptor>,
    body: ClosureBody,
}

impl Closure {
    pub fn new<F>(parameters: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(Arguments) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        Self {
            parameters,
            body: Arc::new(body),
        }
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }
}

impl fmt::Debug for Closure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Closure")
            .field("parameters", &self.parameters)
            .finish()
    }
}

/// Something `Injector::call` can call
#[derive(Debug, Clone)]
pub enum Callable {
    /// A free function known to the metadata provider
    Named(String),
    Closure(Closure),
}

impl Callable {
    pub fn named(function: impl Into<String>) -> Self {
        Callable::Named(function.into())
    }

    pub fn closure<F>(parameters: Vec<ParameterDescriptor>, body: F) -> Self
    where
        F: Fn(Arguments) -> std::result::Result<Value, BoxError> + Send + Sync + 'static,
    {
        Callable::Closure(Closure::new(parameters, body))
    }

    /// Name reported in call failures
    pub fn name(&self) -> &str {
        match self {
            Callable::Named(function) => function.as_str(),
            Callable::Closure(_) => CLOSURE_NAME,
        }
    }
}

impl From<Closure> for Callable {
    fn from(closure: Closure) -> Self {
        Callable::Closure(closure)
    }
}

/// Dependency injector
pub struct Injector {
    state: Arc<InjectorState>,
}

pub(crate) struct InjectorState {
    metadata: Arc<dyn TypeMetadataProvider>,
    config: InjectorConfig,
    finder: RwLock<ValueFinder>,
    tracker: Mutex<InstantiationTracker>,
    /// Types whose claiming provider is currently running, innermost last
    delegations: Mutex<Vec<String>>,
    services: RwLock<ServiceRegistry>,
    aliases: RwLock<AliasRegistry>,
    providers: RwLock<ProviderRegistry>,
    namespaces: RwLock<NamespaceRegistry>,
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Injector {
    /// Create an injector with the default configuration
    pub fn new(metadata: Arc<dyn TypeMetadataProvider>) -> Result<Self> {
        InjectorBuilder::new(metadata).build()
    }

    pub fn builder(metadata: Arc<dyn TypeMetadataProvider>) -> InjectorBuilder {
        InjectorBuilder::new(metadata)
    }

    pub(crate) fn from_parts(
        metadata: Arc<dyn TypeMetadataProvider>,
        config: InjectorConfig,
        finder: ValueFinder,
        namespaces: NamespaceRegistry,
    ) -> Result<Self> {
        let injector = Self {
            state: Arc::new(InjectorState {
                metadata,
                config,
                finder: RwLock::new(finder),
                tracker: Mutex::new(InstantiationTracker::new()),
                delegations: Mutex::new(Vec::new()),
                services: RwLock::new(ServiceRegistry::new()),
                aliases: RwLock::new(AliasRegistry::new()),
                providers: RwLock::new(ProviderRegistry::new()),
                namespaces: RwLock::new(namespaces),
            }),
        };

        if injector.metadata().type_exists(SERVICE_CONTAINER_TYPE) {
            let container = Value::new(SERVICE_CONTAINER_TYPE, injector.container());
            injector.services().set(SERVICE_CONTAINER_TYPE, container, true)?;
        }

        Ok(injector)
    }

    /// Handle sharing the state of a live injector
    pub(crate) fn from_state(state: Weak<InjectorState>) -> Option<Self> {
        state.upgrade().map(|state| Self { state })
    }

    pub(crate) fn downgrade(&self) -> Weak<InjectorState> {
        Arc::downgrade(&self.state)
    }

    pub fn metadata(&self) -> &dyn TypeMetadataProvider {
        self.state.metadata.as_ref()
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.state.config
    }

    pub fn services(&self) -> Services<'_> {
        Services::new(self)
    }

    pub fn aliases(&self) -> Aliases<'_> {
        Aliases::new(self)
    }

    pub fn providers(&self) -> Providers<'_> {
        Providers::new(self)
    }

    pub fn namespaces(&self) -> Namespaces<'_> {
        Namespaces::new(self)
    }

    /// Service container handle resolving through [`Injector::find_service`]
    ///
    /// The same handle is registered as the `elif_injector::ServiceContainer`
    /// service when the metadata provider declares that type, so constructors
    /// can take it as a dependency.
    pub fn container(&self) -> ServiceContainer {
        ServiceContainer::new(self)
    }

    pub(crate) fn service_registry(&self) -> RwLockReadGuard<'_, ServiceRegistry> {
        read(&self.state.services)
    }

    pub(crate) fn service_registry_mut(&self) -> RwLockWriteGuard<'_, ServiceRegistry> {
        write(&self.state.services)
    }

    pub(crate) fn alias_registry(&self) -> RwLockReadGuard<'_, AliasRegistry> {
        read(&self.state.aliases)
    }

    pub(crate) fn alias_registry_mut(&self) -> RwLockWriteGuard<'_, AliasRegistry> {
        write(&self.state.aliases)
    }

    pub(crate) fn provider_registry(&self) -> RwLockReadGuard<'_, ProviderRegistry> {
        read(&self.state.providers)
    }

    pub(crate) fn provider_registry_mut(&self) -> RwLockWriteGuard<'_, ProviderRegistry> {
        write(&self.state.providers)
    }

    pub(crate) fn namespace_registry(&self) -> RwLockReadGuard<'_, NamespaceRegistry> {
        read(&self.state.namespaces)
    }

    pub(crate) fn namespace_registry_mut(&self) -> RwLockWriteGuard<'_, NamespaceRegistry> {
        write(&self.state.namespaces)
    }

    /// Append a lookup hook; hooks run in registration order
    pub fn on_lookup<F>(&self, hook: F)
    where
        F: Fn(&Injector, &LookupRequest<'_>) -> Result<Option<Value>> + Send + Sync + 'static,
    {
        let mut finder = write(&self.state.finder);
        finder.on_lookup(hook);
        tracing::debug!(hooks = finder.hook_count(), "lookup hook registered");
    }

    /// Supply every parameter whose candidate type is exactly `type_name` through `delegate`
    pub fn delegate<F>(&self, type_name: &str, delegate: F)
    where
        F: Fn(&Injector, &LookupRequest<'_>) -> Result<Value> + Send + Sync + 'static,
    {
        write(&self.state.finder).push_hook(delegate_hook(type_name, delegate));
        tracing::debug!(type_name, "construction delegate registered");
    }

    /// Construct `type_name`, resolving its constructor parameters
    ///
    /// Registered services go through the memoized service path with
    /// `parameters` merged over the stored ones.
    pub fn instantiate(&self, type_name: &str, parameters: &Parameters) -> Result<Value> {
        let registered = self.service_registry().has(type_name);
        if registered {
            return self.resolve_service(type_name, parameters);
        }
        self.build(type_name, parameters)
    }

    /// Call `method` on `instance` with resolved parameters
    pub fn invoke(
        &self,
        instance: &Value,
        method: &str,
        parameters: &Parameters,
        public_only: bool,
    ) -> Result<Value> {
        let object = instance
            .as_object()
            .ok_or_else(|| InjectorError::MethodNotFound {
                type_name: "null".to_string(),
                method: method.to_string(),
            })?;
        let type_name = object.type_name();

        if !self.metadata().has_method(type_name, method) {
            return Err(InjectorError::MethodNotFound {
                type_name: type_name.to_string(),
                method: method.to_string(),
            });
        }
        if self.metadata().method_is_static(type_name, method) {
            return Err(InjectorError::MethodIsStatic {
                type_name: type_name.to_string(),
                method: method.to_string(),
            });
        }
        if public_only && !self.metadata().method_is_public(type_name, method) {
            return Err(InjectorError::MethodNotPublic {
                type_name: type_name.to_string(),
                method: method.to_string(),
            });
        }

        let invoke = || -> std::result::Result<Value, BoxError> {
            let descriptors = self.metadata().method_parameters(type_name, method)?;
            let args = self.find_parameters(type_name, method, &descriptors, parameters)?;
            self.metadata().invoke_method(object, method, args)
        };
        invoke().map_err(|e| InjectorError::invocation_failed(type_name, method, e))
    }

    /// [`Injector::invoke`] restricted to public methods
    pub fn invoke_public(&self, instance: &Value, method: &str, parameters: &Parameters) -> Result<Value> {
        self.invoke(instance, method, parameters, true)
    }

    /// Call a named function or a closure with resolved parameters
    pub fn call(&self, callable: &Callable, parameters: &Parameters) -> Result<Value> {
        let call = || -> std::result::Result<Value, BoxError> {
            match callable {
                Callable::Named(function) => {
                    if !self.metadata().has_function(function) {
                        return Err(InjectorError::FunctionNotFound {
                            function: function.clone(),
                        }
                        .into());
                    }
                    let descriptors = self.metadata().function_parameters(function)?;
                    let args = self.find_parameters(FUNCTION_OWNER, function, &descriptors, parameters)?;
                    self.metadata().invoke_function(function, args)
                }
                Callable::Closure(closure) => {
                    let args = self.find_parameters(
                        FUNCTION_OWNER,
                        CLOSURE_NAME,
                        &closure.parameters,
                        parameters,
                    )?;
                    (closure.body)(Arguments::new(args))
                }
            }
        };
        call().map_err(|e| InjectorError::call_failed(callable.name(), e))
    }

    /// Set every settable field of `instance` for which a value is found
    ///
    /// Static fields, non-public fields when `public_only`, and readonly fields
    /// that are already set are skipped. Fields with no value are left alone.
    pub fn populate(&self, instance: &Value, values: &Parameters, public_only: bool) -> Result<()> {
        let object = instance
            .as_object()
            .ok_or_else(|| InjectorError::type_not_found("null"))?;

        for field in self.metadata().declared_fields(object) {
            if field.is_static || (public_only && !field.is_public) || field.is_readonly_and_set {
                continue;
            }

            if let Some(value) = self.find_value(&field.name, field.ty.as_ref(), values)? {
                self.metadata()
                    .set_field(object, &field.name, value)
                    .map_err(|e| InjectorError::invocation_failed(object.type_name(), &field.name, e))?;
            }
        }

        Ok(())
    }

    /// Set one named field of `instance`, failing when no value is found
    pub fn populate_field(
        &self,
        instance: &Value,
        field: &str,
        values: &Parameters,
        public_only: bool,
    ) -> Result<()> {
        let object = instance
            .as_object()
            .ok_or_else(|| InjectorError::type_not_found("null"))?;
        let type_name = object.type_name();

        let descriptor = self
            .metadata()
            .declared_fields(object)
            .into_iter()
            .find(|f| f.name == field)
            .ok_or_else(|| InjectorError::FieldNotFound {
                type_name: type_name.to_string(),
                field: field.to_string(),
            })?;

        if descriptor.is_static {
            return Err(InjectorError::FieldIsStatic {
                type_name: type_name.to_string(),
                field: field.to_string(),
            });
        }
        if public_only && !descriptor.is_public {
            return Err(InjectorError::FieldNotPublic {
                type_name: type_name.to_string(),
                field: field.to_string(),
            });
        }

        let value = self
            .find_value(field, descriptor.ty.as_ref(), values)?
            .ok_or_else(|| InjectorError::parameter_discovery_failed(type_name, field, field))?;

        self.metadata()
            .set_field(object, field, value)
            .map_err(|e| InjectorError::invocation_failed(type_name, field, e))
    }

    /// Resolve one named, typed value through the lookup hooks
    pub fn find_value(
        &self,
        name: &str,
        ty: Option<&ParameterType>,
        explicit: &Parameters,
    ) -> Result<Option<Value>> {
        let finder = read(&self.state.finder).clone();
        finder.find_value(self, name, ty, explicit)
    }

    /// Resolve every parameter in order, falling back to declared defaults
    pub fn find_parameters(
        &self,
        owner: &str,
        method: &str,
        descriptors: &[ParameterDescriptor],
        explicit: &Parameters,
    ) -> Result<Vec<Value>> {
        let finder = read(&self.state.finder).clone();
        finder.find_parameters(self, owner, method, descriptors, explicit)
    }

    /// Resolve `type_name` as a service, or `Ok(None)` when nothing supplies it
    ///
    /// Consults, in order: the alias registry (one level of substitution), the
    /// provider registry, the namespace registry (auto-registering a matching
    /// type) and finally the service registry.
    pub fn find_service(&self, type_name: &str) -> Result<Option<Value>> {
        let target = self.alias_registry().target(type_name).map(str::to_string);
        let type_name = target.as_deref().unwrap_or(type_name);

        if let Some(provider) = self.claiming_provider(type_name) {
            tracing::trace!(type_name, "service supplied by provider");
            return self
                .provide(provider.as_ref(), type_name, &Parameters::new())
                .map(Some);
        }

        let registered = self.service_registry().has(type_name);
        if !registered {
            let in_namespace = self.namespace_registry().contains(type_name);
            if !in_namespace || !self.metadata().type_exists(type_name) {
                return Ok(None);
            }
            self.service_registry_mut()
                .register(self.metadata(), type_name, Parameters::new())?;
            tracing::debug!(type_name, "service auto-registered from namespace");
        }

        self.resolve_service(type_name, &Parameters::new()).map(Some)
    }

    /// Build `type_name` from its raw constructor, bypassing providers and services
    ///
    /// Constructor parameters are still resolved through the lookup hooks. This
    /// is the path a provider takes to build the type it claims; the type
    /// itself is not tracked, since the provider call already is.
    pub fn construct(&self, type_name: &str, parameters: &Parameters) -> Result<Value> {
        if !self.metadata().type_exists(type_name) {
            return Err(InjectorError::type_not_found(type_name));
        }
        if !self.metadata().is_instantiable(type_name) {
            return Err(InjectorError::TypeNotInstantiable {
                type_name: type_name.to_string(),
            });
        }

        let descriptors = self
            .metadata()
            .constructor_parameters(type_name)
            .map_err(|e| InjectorError::construction_failed(type_name, e))?;
        let args = self.find_parameters(type_name, CONSTRUCTOR, &descriptors, parameters)?;

        self.metadata()
            .construct(type_name, args)
            .map_err(|e| InjectorError::construction_failed(type_name, e))
    }

    /// Diagnostic snapshot of the registries and the in-progress stack
    pub fn snapshot(&self) -> InjectorSnapshot {
        let hook_count = read(&self.state.finder).hook_count();
        let tracker = lock(&self.state.tracker).clone();
        InjectorSnapshot::capture(
            &self.service_registry(),
            &self.alias_registry(),
            &self.provider_registry(),
            &self.namespace_registry(),
            hook_count,
            &tracker,
        )
    }

    /// Number of types currently under construction
    pub fn instantiation_depth(&self) -> usize {
        lock(&self.state.tracker).depth()
    }

    /// Memoized service path: build once on first request, then serve the cache
    pub(crate) fn resolve_service(&self, type_name: &str, extra: &Parameters) -> Result<Value> {
        let parameters = match self.service_registry().entry(type_name)? {
            ServiceEntry::Resolved(instance) => return Ok(instance.clone()),
            ServiceEntry::Pending(stored) => stored.merged_with(extra),
        };

        let instance = self.build(type_name, &parameters)?;
        Ok(self.service_registry_mut().resolve(type_name, instance))
    }

    /// First registered provider claiming `type_name`
    pub(crate) fn claiming_provider(&self, type_name: &str) -> Option<Arc<dyn ServiceProvider>> {
        let providers = self.provider_registry().snapshot();
        providers
            .into_iter()
            .find(|provider| provider.supports(self, type_name))
    }

    fn build(&self, type_name: &str, parameters: &Parameters) -> Result<Value> {
        if self.is_provider_reentry(type_name) {
            tracing::trace!(type_name, "provider building its own type");
            return self.construct(type_name, parameters);
        }

        if let Some(provider) = self.claiming_provider(type_name) {
            tracing::trace!(type_name, "construction delegated to provider");
            return self.provide(provider.as_ref(), type_name, parameters);
        }

        let _frame = TrackerFrame::enter(&self.state.tracker, type_name)?;
        self.construct(type_name, parameters)
    }

    /// Run `provider` for `type_name` with the type tracked as under construction
    pub(crate) fn provide(
        &self,
        provider: &dyn ServiceProvider,
        type_name: &str,
        parameters: &Parameters,
    ) -> Result<Value> {
        let _frame = TrackerFrame::enter(&self.state.tracker, type_name)?;
        lock(&self.state.delegations).push(type_name.to_string());
        let result = provider.construct(self, type_name, parameters);
        lock(&self.state.delegations).pop();
        result
    }

    /// Whether the provider for `type_name` is asking for `type_name` again
    ///
    /// Holds only while that type is the innermost entry of both the tracker
    /// and the provider stack, so a dependency cycle through the provided type
    /// is still reported.
    fn is_provider_reentry(&self, type_name: &str) -> bool {
        let delegated = lock(&self.state.delegations).last().map(String::as_str) == Some(type_name);
        delegated && lock(&self.state.tracker).chain().last().map(String::as_str) == Some(type_name)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("config", &self.state.config)
            .field("finder", &self.state.finder)
            .field("tracker", &self.state.tracker)
            .field("services", &self.state.services)
            .field("aliases", &self.state.aliases)
            .field("providers", &self.state.providers)
            .field("namespaces", &self.state.namespaces)
            .finish_non_exhaustive()
    }
}
