use crate::internal::catalog::CatalogRegistry;
use crate::internal::common::error::StevedoreError;
use crate::internal::common::resources::ConsumableMap;
use crate::internal::worker::configuration::DescriptionConfiguration;
use crate::CoreId;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct ImplementationDefinition {
    pub signature: String,
    #[serde(flatten)]
    pub requirements: DescriptionConfiguration,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CoreEntryDefinition {
    pub signature: String,
    #[serde(default)]
    pub implementations: Vec<ImplementationDefinition>,
}

/// Declarative list of cores, e.g. loaded from a TOML file.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct CatalogDefinition {
    #[serde(default)]
    pub cores: Vec<CoreEntryDefinition>,
}

impl CatalogDefinition {
    pub fn from_toml(content: &str) -> crate::Result<Self> {
        let definition: CatalogDefinition = toml::from_str(content)?;
        definition.validate()?;
        Ok(definition)
    }

    pub fn validate(&self) -> crate::Result<()> {
        for core in &self.cores {
            if core.signature.is_empty() {
                return Err(StevedoreError::ConfigurationError(
                    "Core signature cannot be empty".to_string(),
                ));
            }
            for implementation in &core.implementations {
                if implementation.signature.is_empty() {
                    return Err(StevedoreError::ConfigurationError(format!(
                        "Implementation of core '{}' has an empty signature",
                        core.signature
                    )));
                }
                implementation.requirements.validate(true)?;
            }
        }
        Ok(())
    }

    /// Registers every core into `registry` and returns the ids of cores
    /// whose implementation list changed.
    pub fn register_into(
        &self,
        registry: &CatalogRegistry,
        map: &mut ConsumableMap,
    ) -> crate::Result<Vec<CoreId>> {
        let mut changed = Vec::new();
        for core in &self.cores {
            let implementations = core
                .implementations
                .iter()
                .map(|i| Ok((i.signature.clone(), i.requirements.to_requirements(map)?)))
                .collect::<crate::Result<Vec<_>>>()?;
            let update = registry.register_core(&core.signature, implementations);
            for core_id in update.changed {
                if !changed.contains(&core_id) {
                    changed.push(core_id);
                }
            }
        }
        Ok(changed)
    }
}
