//! Integration tests for constructor resolution
//!
//! Covers the full instantiate flow: explicit values, lookup hooks, providers,
//! memoized services, aliases, namespace auto-registration and circular
//! reference detection, all driven through a `TypeCatalog`.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use elif_injector::{
    provider_value, Injector, InjectorError, ParameterDescriptor, ParameterType, Parameters,
    Result, ServiceContainer, ServiceProvider, TypeCatalog, TypeDefinition, Value,
    SERVICE_CONTAINER_TYPE,
};

struct Greeter {
    message: String,
}

struct Logger {
    id: usize,
}

struct Mailer {
    logger: Arc<Logger>,
}

struct Widget {
    source: &'static str,
}

struct Report {
    logger: Option<Arc<Logger>>,
}

struct Node {
    peer: Option<String>,
}

struct Db {
    dsn: String,
}

struct Repo {
    db: Arc<Db>,
}

struct Registry {
    container: Arc<ServiceContainer>,
}

struct WidgetProvider;

impl ServiceProvider for WidgetProvider {
    fn supports(&self, _injector: &Injector, type_name: &str) -> bool {
        type_name == "app::Widget"
    }

    fn construct(&self, _injector: &Injector, type_name: &str, _parameters: &Parameters) -> Result<Value> {
        Ok(Value::new(type_name, Widget { source: "provider" }))
    }
}

/// Supplies `app::Db` with a default DSN, building it through the injector
struct DbProvider {
    direct: bool,
}

impl ServiceProvider for DbProvider {
    fn supports(&self, _injector: &Injector, type_name: &str) -> bool {
        type_name == "app::Db"
    }

    fn construct(&self, injector: &Injector, type_name: &str, parameters: &Parameters) -> Result<Value> {
        let parameters = Parameters::new()
            .with("dsn", "postgres://localhost/app")
            .merged_with(parameters);
        if self.direct {
            injector.construct(type_name, &parameters)
        } else {
            injector.instantiate(type_name, &parameters)
        }
    }
}

/// Builds `app::Db` by way of `app::Repo`, which itself needs `app::Db`
struct CyclicDbProvider;

impl ServiceProvider for CyclicDbProvider {
    fn supports(&self, _injector: &Injector, type_name: &str) -> bool {
        type_name == "app::Db"
    }

    fn construct(&self, injector: &Injector, _type_name: &str, _parameters: &Parameters) -> Result<Value> {
        injector.instantiate("app::Repo", &Parameters::new())
    }
}

struct LoggerProvider;

impl ServiceProvider for LoggerProvider {
    fn supports(&self, _injector: &Injector, type_name: &str) -> bool {
        type_name == "app::FileLogger"
    }

    fn construct(&self, _injector: &Injector, type_name: &str, _parameters: &Parameters) -> Result<Value> {
        Ok(Value::new(type_name, Logger { id: 42 }))
    }
}

/// Catalog shared by the tests; `constructions` counts `app::FileLogger` builds
fn catalog(constructions: Arc<AtomicUsize>) -> TypeCatalog {
    TypeCatalog::builder()
        .define(
            TypeDefinition::concrete("app::Greeter").constructor(
                vec![ParameterDescriptor::of("message", "string")],
                |args| {
                    Ok(Value::new(
                        "app::Greeter",
                        Greeter {
                            message: args.string(0)?,
                        },
                    ))
                },
            ),
        )
        .define(TypeDefinition::interface("app::Logger"))
        .define(
            TypeDefinition::concrete("app::FileLogger")
                .extends("app::Logger")
                .constructor(vec![], move |_| {
                    let id = constructions.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok(Value::new("app::FileLogger", Logger { id }))
                }),
        )
        .define(
            TypeDefinition::concrete("app::Mailer").constructor(
                vec![ParameterDescriptor::of("logger", "app::Logger")],
                |args| {
                    Ok(Value::new(
                        "app::Mailer",
                        Mailer {
                            logger: args.object::<Logger>(0)?,
                        },
                    ))
                },
            ),
        )
        .define(
            TypeDefinition::concrete("app::Widget")
                .constructor(vec![], |_| Err("raw construction must not run".into())),
        )
        .define(
            TypeDefinition::concrete("app::WidgetProvider")
                .provider()
                .constructor(vec![], |_| Ok(provider_value("app::WidgetProvider", WidgetProvider))),
        )
        .define(
            TypeDefinition::concrete("app::Db").constructor(
                vec![ParameterDescriptor::of("dsn", "string")],
                |args| Ok(Value::new("app::Db", Db { dsn: args.string(0)? })),
            ),
        )
        .define(
            TypeDefinition::concrete("app::Repo").constructor(
                vec![ParameterDescriptor::of("db", "app::Db")],
                |args| Ok(Value::new("app::Repo", Repo { db: args.object::<Db>(0)? })),
            ),
        )
        .define(
            TypeDefinition::concrete("app::DbProvider")
                .provider()
                .constructor(vec![], |_| {
                    Ok(provider_value("app::DbProvider", DbProvider { direct: false }))
                }),
        )
        .define(
            TypeDefinition::concrete("app::DirectDbProvider")
                .provider()
                .constructor(vec![], |_| {
                    Ok(provider_value("app::DirectDbProvider", DbProvider { direct: true }))
                }),
        )
        .define(
            TypeDefinition::concrete("app::CyclicDbProvider")
                .provider()
                .constructor(vec![], |_| Ok(provider_value("app::CyclicDbProvider", CyclicDbProvider))),
        )
        .define(
            TypeDefinition::concrete("app::LoggerProvider")
                .provider()
                .constructor(vec![], |_| Ok(provider_value("app::LoggerProvider", LoggerProvider))),
        )
        .define(
            TypeDefinition::concrete("app::Registry").constructor(
                vec![ParameterDescriptor::of("container", SERVICE_CONTAINER_TYPE)],
                |args| {
                    Ok(Value::new(
                        "app::Registry",
                        Registry {
                            container: args.object::<ServiceContainer>(0)?,
                        },
                    ))
                },
            ),
        )
        .define(TypeDefinition::concrete("app::Missing"))
        .define(
            TypeDefinition::concrete("app::Report").constructor(
                vec![ParameterDescriptor::optional("logger", "app::Missing")],
                |args| {
                    Ok(Value::new(
                        "app::Report",
                        Report {
                            logger: args.optional::<Logger>(0)?,
                        },
                    ))
                },
            ),
        )
        .define(
            TypeDefinition::concrete("app::StrictReport").constructor(
                vec![ParameterDescriptor::of("logger", "app::Missing")],
                |_| Ok(Value::new("app::StrictReport", ())),
            ),
        )
        .define(
            TypeDefinition::concrete("app::Port").constructor(
                vec![ParameterDescriptor::of("port", "int").with_default(8080)],
                |args| Ok(Value::from(args.int(0)?)),
            ),
        )
        .define(
            TypeDefinition::concrete("app::cycle::Left").constructor(
                vec![ParameterDescriptor::of("right", "app::cycle::Right")],
                |args| {
                    Ok(Value::new(
                        "app::cycle::Left",
                        Node {
                            peer: args.value(0)?.type_name().map(str::to_string),
                        },
                    ))
                },
            ),
        )
        .define(
            TypeDefinition::concrete("app::cycle::Right").constructor(
                vec![ParameterDescriptor::of("left", "app::cycle::Left")],
                |_| Ok(Value::new("app::cycle::Right", Node { peer: None })),
            ),
        )
        .build()
        .unwrap()
}

fn injector() -> (Injector, Arc<AtomicUsize>) {
    let constructions = Arc::new(AtomicUsize::new(0));
    let injector = Injector::builder(Arc::new(catalog(constructions.clone())))
        .with_namespace("app::cycle")
        .build()
        .unwrap();
    (injector, constructions)
}

#[test]
fn test_basic_construction_with_explicit_values() {
    let (injector, _) = injector();

    let greeter = injector
        .instantiate("app::Greeter", &Parameters::new().with("message", "hi"))
        .unwrap();

    assert_eq!(greeter.downcast_ref::<Greeter>().unwrap().message, "hi");
    assert_eq!(injector.instantiation_depth(), 0);
}

#[test]
fn test_hook_supplies_missing_value() {
    let (injector, _) = injector();
    injector.on_lookup(|_, request| {
        Ok((request.name == "message" && request.type_name == "string").then(|| Value::from("hello")))
    });

    let greeter = injector.instantiate("app::Greeter", &Parameters::new()).unwrap();
    assert_eq!(greeter.downcast_ref::<Greeter>().unwrap().message, "hello");

    let explicit = injector
        .instantiate("app::Greeter", &Parameters::new().with("message", "explicit"))
        .unwrap();
    assert_eq!(explicit.downcast_ref::<Greeter>().unwrap().message, "explicit");
}

#[test]
fn test_delegate_constructs_exact_type() {
    let (injector, _) = injector();
    injector.delegate("string", |_, request| Ok(Value::from(format!("delegated {}", request.name))));

    let greeter = injector.instantiate("app::Greeter", &Parameters::new()).unwrap();

    assert_eq!(greeter.downcast_ref::<Greeter>().unwrap().message, "delegated message");
}

#[test]
fn test_provider_delegation() {
    let (injector, _) = injector();
    injector
        .providers()
        .register("app::WidgetProvider", &Parameters::new())
        .unwrap();

    let widget = injector.instantiate("app::Widget", &Parameters::new()).unwrap();

    assert_eq!(widget.downcast_ref::<Widget>().unwrap().source, "provider");
    assert!(injector.providers().has("app::Widget"));
    assert!(!injector.providers().has("app::Greeter"));
    assert!(matches!(
        injector.providers().get("app::Greeter", &Parameters::new()),
        Err(InjectorError::NoProviderForType { .. })
    ));
}

#[test]
fn test_provider_registration_rules() {
    let (injector, _) = injector();
    let providers = injector.providers();

    assert!(matches!(
        providers.register("app::Nope", &Parameters::new()),
        Err(InjectorError::ProviderClassNotFound { .. })
    ));
    assert!(matches!(
        providers.register("app::Greeter", &Parameters::new()),
        Err(InjectorError::ProviderMissingContract { .. })
    ));

    providers.register("app::WidgetProvider", &Parameters::new()).unwrap();
    assert!(matches!(
        providers.register("app::WidgetProvider", &Parameters::new()),
        Err(InjectorError::ProviderAlreadyRegistered { .. })
    ));
    assert_eq!(providers.len(), 1);
}

#[test]
fn test_without_provider_raw_construction_fails() {
    let (injector, _) = injector();

    let error = injector.instantiate("app::Widget", &Parameters::new()).unwrap_err();

    assert!(matches!(error, InjectorError::ConstructionFailed { .. }));
}

#[test]
fn test_provider_builds_its_own_type_through_instantiate() {
    let (injector, _) = injector();
    injector
        .providers()
        .register("app::DbProvider", &Parameters::new())
        .unwrap();

    let repo = injector.instantiate("app::Repo", &Parameters::new()).unwrap();
    assert_eq!(repo.downcast_ref::<Repo>().unwrap().db.dsn, "postgres://localhost/app");

    let db = injector
        .instantiate("app::Db", &Parameters::new().with("dsn", "sqlite::memory:"))
        .unwrap();
    assert_eq!(db.downcast_ref::<Db>().unwrap().dsn, "sqlite::memory:");
    assert_eq!(injector.instantiation_depth(), 0);
}

#[test]
fn test_provider_builds_its_own_type_through_construct() {
    let (injector, _) = injector();
    injector
        .providers()
        .register("app::DirectDbProvider", &Parameters::new())
        .unwrap();

    let repo = injector.instantiate("app::Repo", &Parameters::new()).unwrap();
    assert_eq!(repo.downcast_ref::<Repo>().unwrap().db.dsn, "postgres://localhost/app");

    let db = injector.providers().get("app::Db", &Parameters::new()).unwrap();
    assert_eq!(db.downcast_ref::<Db>().unwrap().dsn, "postgres://localhost/app");
    assert_eq!(injector.instantiation_depth(), 0);
}

#[test]
fn test_cycle_through_provided_type_is_reported() {
    let (injector, _) = injector();
    injector
        .providers()
        .register("app::CyclicDbProvider", &Parameters::new())
        .unwrap();

    let error = injector.instantiate("app::Db", &Parameters::new()).unwrap_err();

    assert_eq!(
        error.circular_chain().map(|chain| chain.to_vec()),
        Some(vec![
            "app::Db".to_string(),
            "app::Repo".to_string(),
            "app::Db".to_string(),
        ])
    );
    assert_eq!(injector.instantiation_depth(), 0);
}

#[test]
fn test_construct_bypasses_providers() {
    let (injector, _) = injector();
    injector
        .providers()
        .register("app::WidgetProvider", &Parameters::new())
        .unwrap();

    let error = injector.construct("app::Widget", &Parameters::new()).unwrap_err();

    assert!(matches!(error, InjectorError::ConstructionFailed { .. }));
    assert!(matches!(
        injector.construct("app::Logger", &Parameters::new()),
        Err(InjectorError::TypeNotInstantiable { .. })
    ));
}

#[test]
fn test_alias_target_supplied_by_provider() {
    let (injector, constructions) = injector();
    injector
        .aliases()
        .register("app::Logger", "app::FileLogger")
        .unwrap();
    injector
        .providers()
        .register("app::LoggerProvider", &Parameters::new())
        .unwrap();

    let mailer = injector.instantiate("app::Mailer", &Parameters::new()).unwrap();

    assert_eq!(mailer.downcast_ref::<Mailer>().unwrap().logger.id, 42);
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
    assert!(!injector.services().has("app::FileLogger"));
}

#[test]
fn test_provider_takes_precedence_over_registered_service() {
    let (injector, constructions) = injector();
    injector
        .services()
        .register("app::FileLogger", Parameters::new())
        .unwrap();
    injector
        .providers()
        .register("app::LoggerProvider", &Parameters::new())
        .unwrap();

    let logger = injector.container().get("app::FileLogger").unwrap();

    assert_eq!(logger.downcast_ref::<Logger>().unwrap().id, 42);
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
    assert!(!injector.services().is_available("app::FileLogger").unwrap());
}

#[test]
fn test_container_is_injectable() {
    let (injector, constructions) = injector();
    injector
        .services()
        .register("app::FileLogger", Parameters::new())
        .unwrap();

    let registry = injector.instantiate("app::Registry", &Parameters::new()).unwrap();
    let container = registry.downcast_ref::<Registry>().unwrap().container.clone();

    // The service is only built when the injected container asks for it
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
    let logger = container.get("app::FileLogger").unwrap();
    assert_eq!(logger.downcast_ref::<Logger>().unwrap().id, 1);
    assert!(container.has(SERVICE_CONTAINER_TYPE));

    let again = injector.instantiate("app::Registry", &Parameters::new()).unwrap();
    assert!(Arc::ptr_eq(
        &container,
        &again.downcast_ref::<Registry>().unwrap().container
    ));

    drop(injector);
    assert!(!container.is_attached());
    assert!(matches!(
        container.get("app::FileLogger"),
        Err(InjectorError::ContainerDetached)
    ));
}

#[test]
fn test_service_is_built_once() {
    let (injector, constructions) = injector();
    let services = injector.services();
    services.register("app::FileLogger", Parameters::new()).unwrap();
    assert!(!services.is_available("app::FileLogger").unwrap());

    let first = services.get("app::FileLogger", &Parameters::new()).unwrap();
    let second = services.get("app::FileLogger", &Parameters::new()).unwrap();
    let third = injector.instantiate("app::FileLogger", &Parameters::new()).unwrap();

    assert!(first.ptr_eq(&second));
    assert!(first.ptr_eq(&third));
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(services.is_available("app::FileLogger").unwrap());
}

#[test]
fn test_service_get_merges_caller_parameters() {
    let (injector, _) = injector();
    let services = injector.services();
    services
        .register("app::Greeter", Parameters::new().with("message", "stored"))
        .unwrap();

    let greeter = services
        .get("app::Greeter", &Parameters::new().with("message", "caller"))
        .unwrap();
    assert_eq!(greeter.downcast_ref::<Greeter>().unwrap().message, "caller");

    // Once resolved, extra parameters are ignored
    let cached = services
        .get("app::Greeter", &Parameters::new().with("message", "ignored"))
        .unwrap();
    assert!(cached.ptr_eq(&greeter));
}

#[test]
fn test_unregistered_service_get_fails() {
    let (injector, _) = injector();

    assert!(matches!(
        injector.services().get("app::FileLogger", &Parameters::new()),
        Err(InjectorError::ServiceNotFound { .. })
    ));
    assert!(matches!(
        injector.container().get("app::FileLogger"),
        Err(InjectorError::ServiceNotFound { .. })
    ));
}

#[test]
fn test_alias_resolves_interface_parameter() {
    let (injector, constructions) = injector();
    injector
        .services()
        .register("app::FileLogger", Parameters::new())
        .unwrap();
    injector
        .aliases()
        .register("app::Logger", "app::FileLogger")
        .unwrap();

    let mailer = injector.instantiate("app::Mailer", &Parameters::new()).unwrap();
    let logger = injector
        .services()
        .get("app::FileLogger", &Parameters::new())
        .unwrap();

    let mailer = mailer.downcast_ref::<Mailer>().unwrap();
    assert!(Arc::ptr_eq(&mailer.logger, &logger.downcast::<Logger>().unwrap()));
    assert_eq!(mailer.logger.id, 1);
    assert_eq!(constructions.load(Ordering::SeqCst), 1);
    assert!(injector.container().has("app::Logger"));
}

#[test]
fn test_alias_registration_is_symmetric() {
    let (injector, _) = injector();

    injector
        .aliases()
        .register("app::FileLogger", "app::Logger")
        .unwrap();
    injector
        .aliases()
        .register("app::Logger", "app::FileLogger")
        .unwrap();

    assert_eq!(injector.aliases().get("app::Logger").unwrap(), "app::FileLogger");
    assert!(matches!(
        injector.aliases().register("app::Greeter", "app::FileLogger"),
        Err(InjectorError::AliasTypesNotRelated { .. })
    ));
}

#[test]
fn test_manually_set_service_is_injected() {
    let (injector, constructions) = injector();
    let instance = Value::new("app::FileLogger", Logger { id: 99 });

    injector
        .services()
        .set("app::Logger", instance.clone(), true)
        .unwrap();

    let mailer = injector.instantiate("app::Mailer", &Parameters::new()).unwrap();
    assert_eq!(mailer.downcast_ref::<Mailer>().unwrap().logger.id, 99);
    assert_eq!(constructions.load(Ordering::SeqCst), 0);
}

#[test]
fn test_nullable_parameter_falls_back_to_null() {
    let (injector, _) = injector();

    let report = injector.instantiate("app::Report", &Parameters::new()).unwrap();

    assert!(report.downcast_ref::<Report>().unwrap().logger.is_none());
}

#[test]
fn test_unresolvable_parameter_names_owner_and_method() {
    let (injector, _) = injector();

    let error = injector
        .instantiate("app::StrictReport", &Parameters::new())
        .unwrap_err();

    match error {
        InjectorError::ParameterDiscoveryFailed {
            owner,
            method,
            parameter,
        } => {
            assert_eq!(owner, "app::StrictReport");
            assert_eq!(method, "new");
            assert_eq!(parameter, "logger");
        }
        other => panic!("unexpected error: {}", other),
    }
}

#[test]
fn test_default_value_used_when_nothing_matches() {
    let (injector, _) = injector();

    let port = injector.instantiate("app::Port", &Parameters::new()).unwrap();
    assert_eq!(port.as_int(), Some(8080));

    let port = injector
        .instantiate("app::Port", &Parameters::new().with("port", 9000))
        .unwrap();
    assert_eq!(port.as_int(), Some(9000));
}

#[test]
fn test_union_candidates_follow_declaration_order() {
    let (injector, _) = injector();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let recorded = seen.clone();
    injector.on_lookup(move |_, request| {
        recorded.lock().unwrap().push(request.type_name.to_string());
        Ok((request.type_name == "string").then(|| Value::from("text")))
    });

    let value = injector
        .find_value(
            "input",
            Some(&ParameterType::union(["int", "string", "bool"])),
            &Parameters::new(),
        )
        .unwrap();

    assert_eq!(value.unwrap().as_str(), Some("text"));
    assert_eq!(*seen.lock().unwrap(), vec!["int".to_string(), "string".to_string()]);
}

#[test]
fn test_circular_reference_is_reported_and_does_not_poison() {
    let (injector, _) = injector();

    let error = injector
        .instantiate("app::cycle::Left", &Parameters::new())
        .unwrap_err();

    assert!(error.is_circular_reference());
    assert_eq!(
        error.circular_chain().unwrap().to_vec(),
        vec![
            "app::cycle::Left".to_string(),
            "app::cycle::Right".to_string(),
            "app::cycle::Left".to_string(),
        ]
    );
    assert_eq!(injector.instantiation_depth(), 0);
    assert!(injector.snapshot().in_progress.is_empty());

    // The cycle is broken by an explicit value; nothing was left on the stack
    let right = Value::new("app::cycle::Right", Node { peer: None });
    let left = injector
        .instantiate("app::cycle::Left", &Parameters::new().with("right", right))
        .unwrap();
    assert_eq!(
        left.downcast_ref::<Node>().unwrap().peer.as_deref(),
        Some("app::cycle::Right")
    );
}

#[test]
fn test_namespace_types_are_auto_registered() {
    let (injector, _) = injector();

    assert!(!injector.services().has("app::cycle::Right"));
    let error = injector.container().get("app::cycle::Right").unwrap_err();

    // Right needs Left which needs Right; both end up registered on the way
    assert!(error.is_circular_reference());
    assert!(injector.services().has("app::cycle::Right"));
    assert!(injector.services().has("app::cycle::Left"));
    assert!(!injector.services().is_available("app::cycle::Right").unwrap());
}

#[test]
fn test_types_outside_namespaces_are_not_services() {
    let (injector, _) = injector();

    assert_eq!(injector.find_service("app::Greeter").unwrap().map(|_| ()), None);
    assert!(!injector.container().has("app::Greeter"));
    assert!(!injector.services().has("app::Greeter"));
}

#[test]
fn test_unknown_and_abstract_types() {
    let (injector, _) = injector();

    assert!(matches!(
        injector.instantiate("app::Nope", &Parameters::new()),
        Err(InjectorError::TypeNotFound { .. })
    ));
    assert!(matches!(
        injector.instantiate("app::Logger", &Parameters::new()),
        Err(InjectorError::TypeNotInstantiable { .. })
    ));
    assert_eq!(injector.instantiation_depth(), 0);
}

#[test]
fn test_snapshot_serializes_registries() {
    let (injector, _) = injector();
    injector
        .services()
        .register("app::FileLogger", Parameters::new())
        .unwrap();
    injector
        .services()
        .register("app::Greeter", Parameters::new().with("message", "hi"))
        .unwrap();
    injector
        .aliases()
        .register("app::Logger", "app::FileLogger")
        .unwrap();
    injector
        .providers()
        .register("app::WidgetProvider", &Parameters::new())
        .unwrap();
    injector.instantiate("app::FileLogger", &Parameters::new()).unwrap();

    let json: serde_json::Value =
        serde_json::from_str(&injector.snapshot().to_json().unwrap()).unwrap();

    // The injector's own container handle is registered first
    assert_eq!(json["services"][0]["service_type"], "elif_injector::ServiceContainer");
    assert_eq!(json["services"][0]["state"], "resolved");
    assert_eq!(json["services"][1]["service_type"], "app::FileLogger");
    assert_eq!(json["services"][1]["state"], "resolved");
    assert_eq!(json["services"][1]["instance_type"], "app::FileLogger");
    assert_eq!(json["services"][2]["state"], "pending");
    assert_eq!(json["services"][2]["parameters"][0], "message");
    assert_eq!(json["aliases"][0]["alias"], "app::Logger");
    assert_eq!(json["providers"][0], "app::WidgetProvider");
    assert_eq!(json["namespaces"][0], "app::cycle::");
    assert_eq!(json["hook_count"], 1);
    assert_eq!(json["in_progress"].as_array().map(Vec::len), Some(0));
}
