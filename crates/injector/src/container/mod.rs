#[allow(clippy::module_inception)]
pub mod container;
pub mod aliases;
pub mod builder;
pub mod debug;
pub mod injector;
pub mod namespaces;
pub mod registry;
pub mod resolution;
pub mod tracker;

pub use container::ServiceContainer;
pub use aliases::{AliasRegistry, Aliases};
pub use builder::InjectorBuilder;
pub use debug::{AliasSnapshot, InjectorSnapshot, ServiceSnapshot, ServiceState};
pub use injector::{Callable, Closure, Injector, CONSTRUCTOR};
pub use namespaces::{NamespaceRegistry, Namespaces};
pub use registry::{ServiceEntry, ServiceRegistry, Services};
pub use resolution::{delegate_hook, service_lookup_hook, LookupHook, LookupRequest, ValueFinder};
pub use tracker::{InstantiationTracker, TrackerFrame};
