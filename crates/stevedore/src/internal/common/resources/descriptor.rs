use crate::internal::common::resources::consumables::{
    CONNECTIONS_RESOURCE_ID, ConsumableMap, Consumables,
};
use crate::internal::common::resources::ResourceAmount;
use crate::internal::common::utils::format_comma_delimited;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Compute,
    Service,
}

/// Capability of a resource type.
///
/// The same shape describes what a resource offers and what an implementation
/// consumes when it runs. Admission control is written once against this
/// trait: consumable dimensions are handled generically, everything that is
/// not a consumable (architecture, service identity, ...) is decided by
/// [`ResourceDescription::is_compatible`].
pub trait ResourceDescription: Clone + Debug + Send + Sync + 'static {
    const KIND: ResourceKind;

    fn consumables(&self) -> &Consumables;

    /// Static (non-consumable) match between this resource and `requirements`.
    fn is_compatible(&self, requirements: &Self) -> bool;

    /// Picks requirements of this resource kind out of a catalog entry.
    fn from_requirements(requirements: &Requirements) -> Option<&Self>;

    fn describe(&self, map: &ConsumableMap) -> String;
}

/// Requirements of one implementation, tagged with the resource kind it targets.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub enum Requirements {
    Compute(ComputeDescription),
    Service(ServiceDescription),
}

impl Requirements {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Requirements::Compute(_) => ResourceKind::Compute,
            Requirements::Service(_) => ResourceKind::Service,
        }
    }

    pub fn consumables(&self) -> &Consumables {
        match self {
            Requirements::Compute(d) => d.consumables(),
            Requirements::Service(d) => d.consumables(),
        }
    }
}

/// Resource that runs method implementations: cores, GPUs, memory and any
/// custom consumables, plus static properties.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct ComputeDescription {
    consumables: Consumables,
    #[serde(default)]
    architecture: Option<String>,
    /// Sorted and deduplicated
    #[serde(default)]
    features: Vec<String>,
}

impl ComputeDescription {
    pub fn new(consumables: Consumables) -> Self {
        ComputeDescription {
            consumables,
            architecture: None,
            features: Vec::new(),
        }
    }

    pub fn with_architecture(mut self, architecture: impl Into<String>) -> Self {
        self.architecture = Some(architecture.into());
        self
    }

    pub fn with_feature(mut self, feature: impl Into<String>) -> Self {
        let feature = feature.into();
        if let Err(pos) = self.features.binary_search(&feature) {
            self.features.insert(pos, feature);
        }
        self
    }

    pub fn architecture(&self) -> Option<&str> {
        self.architecture.as_deref()
    }

    pub fn features(&self) -> &[String] {
        &self.features
    }
}

impl ResourceDescription for ComputeDescription {
    const KIND: ResourceKind = ResourceKind::Compute;

    #[inline]
    fn consumables(&self) -> &Consumables {
        &self.consumables
    }

    fn is_compatible(&self, requirements: &Self) -> bool {
        if let Some(arch) = &requirements.architecture {
            if self.architecture.as_ref() != Some(arch) {
                return false;
            }
        }
        requirements
            .features
            .iter()
            .all(|f| self.features.binary_search(f).is_ok())
    }

    fn from_requirements(requirements: &Requirements) -> Option<&Self> {
        match requirements {
            Requirements::Compute(d) => Some(d),
            Requirements::Service(_) => None,
        }
    }

    fn describe(&self, map: &ConsumableMap) -> String {
        let mut s = format!("compute[{}]", self.consumables.format(map));
        if let Some(arch) = &self.architecture {
            s.push_str(&format!(" arch={arch}"));
        }
        if !self.features.is_empty() {
            s.push_str(&format!(" features={}", format_comma_delimited(&self.features)));
        }
        s
    }
}

/// Remote service endpoint; its only consumable is the number of
/// simultaneous connections it accepts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ServiceDescription {
    name: String,
    namespace: String,
    port: String,
    consumables: Consumables,
}

impl ServiceDescription {
    pub fn new(
        name: impl Into<String>,
        namespace: impl Into<String>,
        port: impl Into<String>,
        connections: u32,
    ) -> Self {
        ServiceDescription {
            name: name.into(),
            namespace: namespace.into(),
            port: port.into(),
            consumables: Consumables::new()
                .with(CONNECTIONS_RESOURCE_ID, ResourceAmount::new_units(connections)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn port(&self) -> &str {
        &self.port
    }
}

impl ResourceDescription for ServiceDescription {
    const KIND: ResourceKind = ResourceKind::Service;

    #[inline]
    fn consumables(&self) -> &Consumables {
        &self.consumables
    }

    fn is_compatible(&self, requirements: &Self) -> bool {
        self.name == requirements.name
            && self.namespace == requirements.namespace
            && self.port == requirements.port
    }

    fn from_requirements(requirements: &Requirements) -> Option<&Self> {
        match requirements {
            Requirements::Service(d) => Some(d),
            Requirements::Compute(_) => None,
        }
    }

    fn describe(&self, map: &ConsumableMap) -> String {
        format!(
            "service[{}/{}:{}; {}]",
            self.namespace,
            self.name,
            self.port,
            self.consumables.format(map)
        )
    }
}
