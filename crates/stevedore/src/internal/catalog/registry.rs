use crate::internal::catalog::{CoreCatalog, CoreCatalogRef, CoreDefinition, Implementation};
use crate::internal::common::resources::Requirements;
use crate::{CoreId, ImplId};
use parking_lot::Mutex;
use std::sync::Arc;

/// Result of a registration: the new snapshot and the cores it touched.
#[derive(Debug, Clone)]
pub struct CatalogUpdate {
    pub catalog: CoreCatalogRef,
    pub changed: Vec<CoreId>,
}

/// Process-wide owner of the core catalog.
///
/// Readers take cheap snapshots; writers publish a new snapshot atomically.
#[derive(Debug, Default)]
pub struct CatalogRegistry {
    current: Mutex<CoreCatalogRef>,
}

impl CatalogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> CoreCatalogRef {
        self.current.lock().clone()
    }

    /// Registers a core with the given implementations.
    ///
    /// When a core with the same signature already exists, implementations
    /// with new signatures are appended to it (ids continue densely); already
    /// known implementation signatures are ignored.
    pub fn register_core(
        &self,
        signature: &str,
        implementations: Vec<(String, Requirements)>,
    ) -> CatalogUpdate {
        let mut current = self.current.lock();
        let mut catalog = CoreCatalog::clone(&current);

        let mut is_new = false;
        let core_id = match catalog.find_core(signature) {
            Some(core_id) => core_id,
            None => {
                is_new = true;
                let core_id = CoreId::new(catalog.cores.len() as u32);
                log::debug!("New core registered '{signature}' as {core_id}");
                catalog.cores.push(CoreDefinition {
                    core_id,
                    signature: signature.to_string(),
                    implementations: Vec::new(),
                });
                core_id
            }
        };

        let core = &mut catalog.cores[core_id];
        let mut added = 0;
        for (impl_signature, requirements) in implementations {
            if core
                .implementations
                .iter()
                .any(|i| i.signature() == impl_signature)
            {
                log::debug!("Implementation '{impl_signature}' of core {core_id} already known");
                continue;
            }
            let impl_id = ImplId::new(core.implementations.len() as u32);
            core.implementations.push(Arc::new(Implementation::new(
                core_id,
                impl_id,
                impl_signature,
                requirements,
            )));
            added += 1;
        }

        let changed = if added > 0 || is_new {
            catalog.version += 1;
            vec![core_id]
        } else {
            Vec::new()
        };
        let catalog = Arc::new(catalog);
        *current = catalog.clone();
        CatalogUpdate { catalog, changed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::internal::common::resources::{ComputeDescription, Consumables, CPU_RESOURCE_ID};

    fn compute(cpus: u32) -> Requirements {
        Requirements::Compute(ComputeDescription::new(Consumables::from_units(&[(
            CPU_RESOURCE_ID,
            cpus,
        )])))
    }

    #[test]
    fn test_register_assigns_dense_ids() {
        let registry = CatalogRegistry::new();
        let u1 = registry.register_core(
            "sort",
            vec![
                ("sort.cpu".to_string(), compute(1)),
                ("sort.parallel".to_string(), compute(4)),
            ],
        );
        let u2 = registry.register_core("merge", vec![("merge.cpu".to_string(), compute(1))]);
        assert_eq!(u1.changed, vec![CoreId::new(0)]);
        assert_eq!(u2.changed, vec![CoreId::new(1)]);

        let catalog = registry.snapshot();
        assert_eq!(catalog.core_count(), 2);
        assert_eq!(catalog.version(), 2);
        let impls = catalog.implementations_of(CoreId::new(0));
        assert_eq!(impls.len(), 2);
        assert_eq!(impls[1].impl_id(), ImplId::new(1));
        assert_eq!(impls[1].core_id(), CoreId::new(0));
        assert_eq!(catalog.find_core("merge"), Some(CoreId::new(1)));
        assert!(catalog.implementations_of(CoreId::new(7)).is_empty());
    }

    #[test]
    fn test_register_extends_existing_core() {
        let registry = CatalogRegistry::new();
        registry.register_core("sort", vec![("sort.cpu".to_string(), compute(1))]);
        let old = registry.snapshot();

        let update = registry.register_core(
            "sort",
            vec![
                ("sort.cpu".to_string(), compute(1)),
                ("sort.gpu".to_string(), compute(2)),
            ],
        );
        assert_eq!(update.changed, vec![CoreId::new(0)]);
        assert_eq!(update.catalog.core_count(), 1);
        assert_eq!(update.catalog.implementations_of(CoreId::new(0)).len(), 2);

        // Old snapshots are not affected
        assert_eq!(old.implementations_of(CoreId::new(0)).len(), 1);

        let update = registry.register_core("sort", vec![("sort.gpu".to_string(), compute(2))]);
        assert!(update.changed.is_empty());
        assert_eq!(update.catalog.version(), 2);
    }
}
