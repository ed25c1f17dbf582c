use crate::internal::common::error::StevedoreError;
use crate::internal::common::resources::{
    ComputeDescription, ConsumableMap, Requirements, ResourceAmount, ResourceKind,
    ServiceDescription,
};
use crate::internal::transfer::local::MemoryFailurePolicy;
use crate::NodeId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Shape shared by resource declarations and implementation requirements.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum DescriptionConfiguration {
    Compute {
        #[serde(default)]
        consumables: BTreeMap<String, f64>,
        #[serde(default)]
        architecture: Option<String>,
        #[serde(default)]
        features: Vec<String>,
    },
    Service {
        name: String,
        namespace: String,
        port: String,
        #[serde(default = "default_connections")]
        connections: u32,
    },
}

fn default_connections() -> u32 {
    1
}

impl DescriptionConfiguration {
    pub fn kind(&self) -> ResourceKind {
        match self {
            DescriptionConfiguration::Compute { .. } => ResourceKind::Compute,
            DescriptionConfiguration::Service { .. } => ResourceKind::Service,
        }
    }

    /// `allow_zero` is true for requirements (a zero demand is simply ignored)
    /// and false for declared capacity.
    pub fn validate(&self, allow_zero: bool) -> crate::Result<()> {
        match self {
            DescriptionConfiguration::Compute { consumables, .. } => {
                for (name, value) in consumables {
                    if name.is_empty() {
                        return Err(config_error("Consumable name cannot be empty"));
                    }
                    match ResourceAmount::from_float(*value) {
                        None => {
                            return Err(config_error(format!(
                                "Invalid amount {value} of consumable '{name}'"
                            )));
                        }
                        Some(amount) if amount.is_zero() && !allow_zero => {
                            return Err(config_error(format!("Consumable '{name}' is empty")));
                        }
                        Some(_) => {}
                    }
                }
            }
            DescriptionConfiguration::Service {
                name, connections, ..
            } => {
                if name.is_empty() {
                    return Err(config_error("Service name cannot be empty"));
                }
                if *connections == 0 && !allow_zero {
                    return Err(config_error(format!(
                        "Service '{name}' does not accept any connection"
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn to_compute(&self, map: &mut ConsumableMap) -> crate::Result<ComputeDescription> {
        match self {
            DescriptionConfiguration::Compute {
                consumables,
                architecture,
                features,
            } => {
                let mut amounts = Vec::with_capacity(consumables.len());
                for (name, value) in consumables {
                    let amount = ResourceAmount::from_float(*value).ok_or_else(|| {
                        config_error(format!("Invalid amount {value} of consumable '{name}'"))
                    })?;
                    amounts.push((name.as_str(), amount));
                }
                let mut description = ComputeDescription::new(map.consumables(amounts));
                if let Some(arch) = architecture {
                    description = description.with_architecture(arch.clone());
                }
                for feature in features {
                    description = description.with_feature(feature.clone());
                }
                Ok(description)
            }
            DescriptionConfiguration::Service { .. } => {
                Err(config_error("Expected a compute description, found a service"))
            }
        }
    }

    pub fn to_service(&self) -> crate::Result<ServiceDescription> {
        match self {
            DescriptionConfiguration::Service {
                name,
                namespace,
                port,
                connections,
            } => Ok(ServiceDescription::new(
                name.clone(),
                namespace.clone(),
                port.clone(),
                *connections,
            )),
            DescriptionConfiguration::Compute { .. } => {
                Err(config_error("Expected a service description, found a compute one"))
            }
        }
    }

    pub fn to_requirements(&self, map: &mut ConsumableMap) -> crate::Result<Requirements> {
        Ok(match self.kind() {
            ResourceKind::Compute => Requirements::Compute(self.to_compute(map)?),
            ResourceKind::Service => Requirements::Service(self.to_service()?),
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ResourceConfiguration {
    /// Hard ceiling of tasks running at the same time
    pub max_slots: u32,
    #[serde(flatten)]
    pub description: DescriptionConfiguration,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NodeConfiguration {
    pub name: String,
    pub node_id: NodeId,
    /// Root under which transferred files are materialized by their logical name
    pub temp_dir: PathBuf,
    #[serde(default)]
    pub memory_failure_policy: MemoryFailurePolicy,
    pub resources: ResourceConfiguration,
}

impl NodeConfiguration {
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let config: NodeConfiguration = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> crate::Result<()> {
        if self.name.is_empty() {
            return Err(config_error("Node name cannot be empty"));
        }
        if self.temp_dir.as_os_str().is_empty() {
            return Err(config_error(format!(
                "Node '{}' has no temporary directory",
                self.name
            )));
        }
        self.resources.description.validate(false)
    }
}

pub fn load_node_configuration(path: &Path) -> crate::Result<NodeConfiguration> {
    log::debug!("Loading node configuration from {}", path.display());
    let content = std::fs::read_to_string(path)?;
    NodeConfiguration::from_toml(&content)
}

fn config_error(message: impl Into<String>) -> StevedoreError {
    StevedoreError::ConfigurationError(message.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::common::resources::{
        CONNECTIONS_RESOURCE_ID, CPU_RESOURCE_ID, MEM_RESOURCE_ID, ResourceDescription,
    };

    const COMPUTE_NODE: &str = r#"
name = "worker-1"
node_id = 3
temp_dir = "/tmp/stevedore"

[resources]
max_slots = 4
kind = "compute"
architecture = "x86_64"
features = ["avx2"]
consumables = { cpus = 8, mem = 16, licenses = 0.5 }
"#;

    #[test]
    fn test_parse_compute_node() {
        let config = NodeConfiguration::from_toml(COMPUTE_NODE).unwrap();
        assert_eq!(config.name, "worker-1");
        assert_eq!(config.node_id, NodeId::new(3));
        assert_eq!(config.memory_failure_policy, MemoryFailurePolicy::Authoritative);
        assert_eq!(config.resources.max_slots, 4);

        let mut map = ConsumableMap::default();
        let description = config.resources.description.to_compute(&mut map).unwrap();
        let licenses = map.get_id("licenses").unwrap();
        assert_eq!(
            description.consumables().get(CPU_RESOURCE_ID),
            ResourceAmount::new_units(8)
        );
        assert_eq!(
            description.consumables().get(MEM_RESOURCE_ID),
            ResourceAmount::new_units(16)
        );
        assert_eq!(
            description.consumables().get(licenses),
            ResourceAmount::new(0, 5000)
        );
        assert_eq!(description.architecture(), Some("x86_64"));
        assert!(config.resources.description.to_service().is_err());
    }

    #[test]
    fn test_parse_service_node() {
        let config = NodeConfiguration::from_toml(
            r#"
name = "svc"
node_id = 1
temp_dir = "/tmp/svc"
memory_failure_policy = "fall-through"

[resources]
max_slots = 2
kind = "service"
name = "ranker"
namespace = "ml"
port = "8080"
connections = 3
"#,
        )
        .unwrap();
        assert_eq!(config.memory_failure_policy, MemoryFailurePolicy::FallThrough);
        let service = config.resources.description.to_service().unwrap();
        assert_eq!(service.name(), "ranker");
        assert_eq!(
            service.consumables().get(CONNECTIONS_RESOURCE_ID),
            ResourceAmount::new_units(3)
        );
    }

    #[test]
    fn test_reject_empty_consumable() {
        let content = COMPUTE_NODE.replace("licenses = 0.5", "licenses = 0");
        assert!(matches!(
            NodeConfiguration::from_toml(&content),
            Err(StevedoreError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_reject_negative_amount() {
        let content = COMPUTE_NODE.replace("mem = 16", "mem = -2");
        assert!(NodeConfiguration::from_toml(&content).is_err());
    }

    #[test]
    fn test_reject_malformed_toml() {
        assert!(matches!(
            NodeConfiguration::from_toml("name = "),
            Err(StevedoreError::ConfigurationError(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("node.toml");
        std::fs::write(&path, COMPUTE_NODE).unwrap();
        let config = load_node_configuration(&path).unwrap();
        assert_eq!(config.resources.description.kind(), ResourceKind::Compute);
        assert!(load_node_configuration(&dir.path().join("missing.toml")).is_err());
    }
}
