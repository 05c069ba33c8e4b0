//! Example: resolving constructor parameters through lookup hooks
//!
//! Builds a small catalog, wires a configuration hook, a delegate and a
//! memoized service, then prints the injector snapshot.
//!
//! Run with `RUST_LOG=elif_injector=trace cargo run --example lookup_hooks`.

use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use elif_injector::{
    Injector, InjectorConfig, ParameterDescriptor, Parameters, TypeCatalog, TypeDefinition, Value,
};

struct Database {
    dsn: String,
}

struct Clock;

struct UserRepository {
    database: Arc<Database>,
    page_size: i64,
}

fn catalog() -> Result<TypeCatalog, Box<dyn Error>> {
    let catalog = TypeCatalog::builder()
        .define(TypeDefinition::concrete("app::Database").constructor(
            vec![ParameterDescriptor::of("dsn", "string")],
            |args| {
                Ok(Value::new(
                    "app::Database",
                    Database {
                        dsn: args.string(0)?,
                    },
                ))
            },
        ))
        .define(TypeDefinition::concrete("app::Clock"))
        .define(TypeDefinition::concrete("app::repositories::UserRepository").constructor(
            vec![
                ParameterDescriptor::of("database", "app::Database"),
                ParameterDescriptor::of("clock", "app::Clock"),
                ParameterDescriptor::of("page_size", "int").with_default(25),
            ],
            |args| {
                Ok(Value::new(
                    "app::repositories::UserRepository",
                    UserRepository {
                        database: args.object::<Database>(0)?,
                        page_size: args.int(2)?,
                    },
                ))
            },
        ))
        .build()?;
    Ok(catalog)
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new("info"))?)
        .with(fmt::layer())
        .init();

    let config = InjectorConfig::from_env()?.with_namespace("app::repositories");
    let injector = Injector::builder(Arc::new(catalog()?))
        .with_config(config)
        .build()?;

    // Configuration values by parameter name
    injector.on_lookup(|_, request| {
        Ok(match (request.name, request.type_name) {
            ("dsn", "string") => Some(Value::from("postgres://localhost/app")),
            _ => None,
        })
    });

    // Every clock parameter gets a fresh clock
    injector.delegate("app::Clock", |_, _| Ok(Value::new("app::Clock", Clock)));

    injector.services().register("app::Database", Parameters::new())?;

    let repository = injector.container().get("app::repositories::UserRepository")?;
    if let Some(repository) = repository.downcast_ref::<UserRepository>() {
        println!(
            "repository uses {} with page size {}",
            repository.database.dsn, repository.page_size
        );
    }

    println!("{}", injector.snapshot().to_json()?);
    Ok(())
}
