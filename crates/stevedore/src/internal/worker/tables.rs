use crate::internal::catalog::{CoreCatalog, Implementation};
use crate::internal::common::index::IndexVec;
use crate::internal::common::resources::ResourceDescription;
use crate::{CoreId, ImplId};
use std::sync::Arc;

/// Capability tables of one resource, derived from its description and a
/// catalog snapshot. They describe the ideal situation (nothing else running)
/// and are replaced as a whole; they are never updated in place.
#[derive(Debug, Clone, Default)]
pub struct ExecutableTables {
    catalog_version: u64,
    executable_cores: Vec<CoreId>,
    executable_impls: IndexVec<CoreId, Vec<Arc<Implementation>>>,
    impl_slots: IndexVec<CoreId, IndexVec<ImplId, u32>>,
    ideal_slots: IndexVec<CoreId, u32>,
    core_slots: IndexVec<CoreId, u32>,
}

struct CoreEntry {
    impls: Vec<Arc<Implementation>>,
    impl_slots: IndexVec<ImplId, u32>,
    ideal: u32,
}

/// Number of instances of an implementation that could run simultaneously on
/// an otherwise idle resource, or `None` when the resource cannot run it at all.
pub(crate) fn simultaneous_capacity<D: ResourceDescription>(
    description: &D,
    max_slots: u32,
    implementation: &Implementation,
) -> Option<u32> {
    let requirements = D::from_requirements(implementation.requirements())?;
    if !description.is_compatible(requirements) {
        return None;
    }
    let fit = description
        .consumables()
        .fit_count(requirements.consumables())
        .unwrap_or(u64::MAX);
    Some(fit.min(max_slots as u64) as u32)
}

fn evaluate_core<D: ResourceDescription>(
    description: &D,
    max_slots: u32,
    implementations: &[Arc<Implementation>],
) -> CoreEntry {
    let mut entry = CoreEntry {
        impls: Vec::new(),
        impl_slots: IndexVec::filled(0, implementations.len()),
        ideal: 0,
    };
    for implementation in implementations {
        if let Some(capacity) = simultaneous_capacity(description, max_slots, implementation) {
            entry.ideal = entry.ideal.max(capacity);
            entry.impl_slots[implementation.impl_id()] = capacity;
            if capacity > 0 {
                entry.impls.push(implementation.clone());
            }
        }
    }
    entry
}

impl ExecutableTables {
    /// Evaluates every core of `catalog`.
    pub(crate) fn build<D: ResourceDescription>(
        description: &D,
        max_slots: u32,
        catalog: &CoreCatalog,
    ) -> Self {
        let mut tables = ExecutableTables {
            catalog_version: catalog.version(),
            ..Default::default()
        };
        for core_id in catalog.core_ids() {
            let entry = evaluate_core(description, max_slots, catalog.implementations_of(core_id));
            tables.push_core(core_id, entry, max_slots);
        }
        tables
    }

    /// Re-evaluates only `changed` cores; all other cores keep the entries of
    /// `previous`. Cores unknown to `previous` and not listed in `changed`
    /// stay non-executable.
    pub(crate) fn rebuild_cores<D: ResourceDescription>(
        previous: &ExecutableTables,
        description: &D,
        max_slots: u32,
        catalog: &CoreCatalog,
        changed: &[CoreId],
    ) -> Self {
        let mut tables = ExecutableTables {
            catalog_version: catalog.version(),
            ..Default::default()
        };
        for core_id in catalog.core_ids() {
            if changed.contains(&core_id) {
                let entry =
                    evaluate_core(description, max_slots, catalog.implementations_of(core_id));
                tables.push_core(core_id, entry, max_slots);
            } else if let Some(impls) = previous.executable_impls.get_at(core_id) {
                tables.executable_impls.push(impls.clone());
                tables.impl_slots.push(previous.impl_slots[core_id].clone());
                tables.ideal_slots.push(previous.ideal_slots[core_id]);
                tables.core_slots.push(previous.core_slots[core_id]);
                if previous.executable_cores.contains(&core_id) {
                    tables.executable_cores.push(core_id);
                }
            } else {
                let entry = CoreEntry {
                    impls: Vec::new(),
                    impl_slots: IndexVec::filled(0, catalog.implementations_of(core_id).len()),
                    ideal: 0,
                };
                tables.push_core(core_id, entry, max_slots);
            }
        }
        tables
    }

    fn push_core(&mut self, core_id: CoreId, entry: CoreEntry, max_slots: u32) {
        debug_assert_eq!(self.executable_impls.len(), usize::from(core_id));
        if !entry.impls.is_empty() {
            self.executable_cores.push(core_id);
        }
        self.executable_impls.push(entry.impls);
        self.impl_slots.push(entry.impl_slots);
        self.ideal_slots.push(entry.ideal);
        self.core_slots.push(entry.ideal.min(max_slots));
    }

    #[inline]
    pub fn catalog_version(&self) -> u64 {
        self.catalog_version
    }

    #[inline]
    pub fn core_count(&self) -> usize {
        self.executable_impls.len()
    }

    pub fn executable_cores(&self) -> &[CoreId] {
        &self.executable_cores
    }

    pub fn executable_impls(&self, core_id: CoreId) -> &[Arc<Implementation>] {
        self.executable_impls
            .get_at(core_id)
            .map(|v| v.as_slice())
            .unwrap_or_default()
    }

    pub fn impl_slots(&self, core_id: CoreId, impl_id: ImplId) -> u32 {
        self.impl_slots
            .get_at(core_id)
            .and_then(|slots| slots.get_at(impl_id))
            .copied()
            .unwrap_or(0)
    }

    pub fn ideal_slots(&self, core_id: CoreId) -> u32 {
        self.ideal_slots.get_at(core_id).copied().unwrap_or(0)
    }

    pub fn core_slots(&self, core_id: CoreId) -> u32 {
        self.core_slots.get_at(core_id).copied().unwrap_or(0)
    }

    pub fn all_core_slots(&self) -> &[u32] {
        &self.core_slots
    }

    pub fn all_ideal_slots(&self) -> &[u32] {
        &self.ideal_slots
    }
}
