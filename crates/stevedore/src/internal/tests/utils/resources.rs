use crate::CoreId;
use crate::internal::catalog::{CatalogRegistry, CoreCatalogRef};
use crate::internal::common::resources::{
    CPU_RESOURCE_ID, ComputeDescription, ConsumableId, Consumables, GPU_RESOURCE_ID,
    MEM_RESOURCE_ID, Requirements, ResourceAmount, ServiceDescription,
};

#[derive(Default, Clone)]
pub struct ComputeBuilder {
    consumables: Consumables,
    architecture: Option<String>,
    features: Vec<String>,
}

impl ComputeBuilder {
    pub fn add(mut self, id: ConsumableId, amount: ResourceAmount) -> Self {
        self.consumables.set(id, amount);
        self
    }

    pub fn cpus(self, count: u32) -> Self {
        self.add(CPU_RESOURCE_ID, ResourceAmount::new_units(count))
    }

    pub fn gpus(self, count: u32) -> Self {
        self.add(GPU_RESOURCE_ID, ResourceAmount::new_units(count))
    }

    pub fn mem(self, count: u32) -> Self {
        self.add(MEM_RESOURCE_ID, ResourceAmount::new_units(count))
    }

    pub fn arch(mut self, architecture: &str) -> Self {
        self.architecture = Some(architecture.to_string());
        self
    }

    pub fn feature(mut self, feature: &str) -> Self {
        self.features.push(feature.to_string());
        self
    }

    pub fn finish(self) -> ComputeDescription {
        let mut description = ComputeDescription::new(self.consumables);
        if let Some(architecture) = self.architecture {
            description = description.with_architecture(architecture);
        }
        for feature in self.features {
            description = description.with_feature(feature);
        }
        description
    }

    pub fn requirements(self) -> Requirements {
        Requirements::Compute(self.finish())
    }
}

pub fn compute() -> ComputeBuilder {
    ComputeBuilder::default()
}

pub fn service(name: &str, connections: u32) -> ServiceDescription {
    ServiceDescription::new(name, "test", "8080", connections)
}

pub fn service_requirements(name: &str) -> Requirements {
    Requirements::Service(service(name, 1))
}

/// Registers `core` with implementations `<core>.<index>` and returns the
/// new snapshot and core id.
pub fn register(
    registry: &CatalogRegistry,
    core: &str,
    requirements: Vec<Requirements>,
) -> (CoreCatalogRef, CoreId) {
    let implementations = requirements
        .into_iter()
        .enumerate()
        .map(|(i, rq)| (format!("{core}.{i}"), rq))
        .collect();
    let update = registry.register_core(core, implementations);
    let catalog = update.catalog;
    let core_id = catalog.find_core(core).unwrap();
    (catalog, core_id)
}
