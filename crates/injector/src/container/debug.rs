use serde::{Deserialize, Serialize};

use crate::container::aliases::AliasRegistry;
use crate::container::namespaces::NamespaceRegistry;
use crate::container::registry::{ServiceEntry, ServiceRegistry};
use crate::container::tracker::InstantiationTracker;
use crate::providers::ProviderRegistry;

/// Lifecycle state of a registered service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceState {
    Pending,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceSnapshot {
    pub service_type: String,
    pub state: ServiceState,
    /// Names of the stored constructor parameters while pending
    pub parameters: Vec<String>,
    /// Runtime type of the cached instance once resolved
    pub instance_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AliasSnapshot {
    pub alias: String,
    pub service_type: String,
}

/// Serializable picture of an injector's registries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InjectorSnapshot {
    pub services: Vec<ServiceSnapshot>,
    pub aliases: Vec<AliasSnapshot>,
    pub providers: Vec<String>,
    pub namespaces: Vec<String>,
    pub hook_count: usize,
    /// Types under construction, outermost first
    pub in_progress: Vec<String>,
}

impl InjectorSnapshot {
    pub(crate) fn capture(
        services: &ServiceRegistry,
        aliases: &AliasRegistry,
        providers: &ProviderRegistry,
        namespaces: &NamespaceRegistry,
        hook_count: usize,
        tracker: &InstantiationTracker,
    ) -> Self {
        let services = services
            .entries()
            .map(|(service_type, entry)| match entry {
                ServiceEntry::Pending(parameters) => ServiceSnapshot {
                    service_type: service_type.to_string(),
                    state: ServiceState::Pending,
                    parameters: parameters.names(),
                    instance_type: None,
                },
                ServiceEntry::Resolved(instance) => ServiceSnapshot {
                    service_type: service_type.to_string(),
                    state: ServiceState::Resolved,
                    parameters: Vec::new(),
                    instance_type: instance.type_name().map(str::to_string),
                },
            })
            .collect();

        let aliases = aliases
            .entries()
            .map(|(alias, service_type)| AliasSnapshot {
                alias: alias.to_string(),
                service_type: service_type.to_string(),
            })
            .collect();

        Self {
            services,
            aliases,
            providers: providers.provider_types(),
            namespaces: namespaces.namespaces().to_vec(),
            hook_count,
            in_progress: tracker.chain().to_vec(),
        }
    }

    pub fn service(&self, service_type: &str) -> Option<&ServiceSnapshot> {
        self.services.iter().find(|s| s.service_type == service_type)
    }

    /// Render the snapshot as pretty-printed JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
