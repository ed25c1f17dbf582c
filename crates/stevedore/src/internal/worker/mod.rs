pub mod capacity;
pub mod configuration;
pub mod tables;

use crate::internal::catalog::{CoreCatalog, Implementation};
use crate::internal::common::resources::{
    ComputeDescription, ConsumableMap, ResourceDescription, ServiceDescription,
};
use crate::internal::worker::capacity::SlotCapacity;
use crate::internal::worker::tables::{ExecutableTables, simultaneous_capacity};
use crate::CoreId;
use parking_lot::{Mutex, RwLock};
use std::fmt::Write;
use std::sync::Arc;

pub type ComputeWorker = Worker<ComputeDescription>;
pub type ServiceWorker = Worker<ServiceDescription>;

/// Admission control of one resource.
///
/// Live capacity (`reserve`/`release`) is guarded by its own mutex. The
/// capability tables are read-mostly; every recomputation builds a new
/// [`ExecutableTables`] and swaps it in, so readers always see either the old
/// or the new version.
pub struct Worker<D: ResourceDescription> {
    name: String,
    description: D,
    capacity: Mutex<SlotCapacity>,
    tables: RwLock<Arc<ExecutableTables>>,
}

impl<D: ResourceDescription> Worker<D> {
    pub fn new(name: impl Into<String>, description: D, max_slots: u32, catalog: &CoreCatalog) -> Self {
        let name = name.into();
        let tables = ExecutableTables::build(&description, max_slots, catalog);
        log::debug!(
            "Worker {name} created; executable cores: {:?}",
            tables.executable_cores()
        );
        Worker {
            capacity: Mutex::new(SlotCapacity::new(
                max_slots,
                description.consumables().clone(),
            )),
            tables: RwLock::new(Arc::new(tables)),
            description,
            name,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &D {
        &self.description
    }

    pub fn max_slots(&self) -> u32 {
        self.capacity.lock().max_slots()
    }

    pub fn used_slots(&self) -> u32 {
        self.capacity.lock().used_slots()
    }

    /// Copy of the live capacity record.
    pub fn capacity(&self) -> SlotCapacity {
        self.capacity.lock().clone()
    }

    /// Current capability tables. The returned snapshot is never modified.
    pub fn tables(&self) -> Arc<ExecutableTables> {
        self.tables.read().clone()
    }

    /// Recomputes the tables of `changed` cores against `catalog`;
    /// other cores keep their cached entries.
    pub fn update_executable_set(&self, catalog: &CoreCatalog, changed: &[CoreId]) {
        let max_slots = self.max_slots();
        let mut tables = self.tables.write();
        let new_tables =
            ExecutableTables::rebuild_cores(&tables, &self.description, max_slots, catalog, changed);
        log::debug!(
            "Worker {}: cores {:?} updated (catalog version {})",
            self.name,
            changed,
            catalog.version()
        );
        *tables = Arc::new(new_tables);
    }

    /// Recomputes the tables of all cores against `catalog`.
    pub fn update_all_features(&self, catalog: &CoreCatalog) {
        let max_slots = self.max_slots();
        let mut tables = self.tables.write();
        *tables = Arc::new(ExecutableTables::build(
            &self.description,
            max_slots,
            catalog,
        ));
        log::debug!(
            "Worker {}: all cores updated (catalog version {})",
            self.name,
            catalog.version()
        );
    }

    pub fn simultaneous_capacity(&self, implementation: &Implementation) -> u32 {
        simultaneous_capacity(&self.description, self.max_slots(), implementation).unwrap_or(0)
    }

    /// True when at least one implementation of the core fits on an idle resource.
    pub fn can_run(&self, core_id: CoreId) -> bool {
        self.tables.read().ideal_slots(core_id) > 0
    }

    /// Checks compatibility, a free slot and free consumables right now, not
    /// the ideal tables.
    pub fn can_run_now(&self, requirements: &D) -> bool {
        self.description.is_compatible(requirements)
            && self
                .capacity
                .lock()
                .can_run_now(requirements.consumables())
    }

    /// Implementations of `core_id` that could start right now, in catalog order.
    pub fn runnable_now(&self, core_id: CoreId) -> Vec<Arc<Implementation>> {
        let tables = self.tables();
        self.filter_runnable_now(tables.executable_impls(core_id))
    }

    /// The subset of `candidates` that could start right now.
    pub fn filter_runnable_now(
        &self,
        candidates: &[Arc<Implementation>],
    ) -> Vec<Arc<Implementation>> {
        let capacity = self.capacity.lock();
        candidates
            .iter()
            .filter(|implementation| {
                D::from_requirements(implementation.requirements()).is_some_and(|rq| {
                    self.description.is_compatible(rq) && capacity.can_run_now(rq.consumables())
                })
            })
            .cloned()
            .collect()
    }

    pub fn runnable_implementations(&self) -> Vec<Vec<Arc<Implementation>>> {
        let tables = self.tables();
        (0..tables.core_count() as u32)
            .map(|core_id| self.filter_runnable_now(tables.executable_impls(CoreId::new(core_id))))
            .collect()
    }

    pub fn runnable_cores(&self) -> Vec<CoreId> {
        let tables = self.tables();
        tables
            .executable_cores()
            .iter()
            .copied()
            .filter(|core_id| !self.filter_runnable_now(tables.executable_impls(*core_id)).is_empty())
            .collect()
    }

    /// Atomically takes a slot and the consumables of `requirements`.
    ///
    /// Returns `false` without any side effect when the resource is full; that
    /// is regular back-pressure, the caller should retry later or pick another
    /// resource.
    pub fn reserve(&self, requirements: &D) -> bool {
        if !self.description.is_compatible(requirements) {
            log::trace!("Worker {}: incompatible reservation rejected", self.name);
            return false;
        }
        let reserved = self
            .capacity
            .lock()
            .try_reserve(requirements.consumables());
        if !reserved {
            log::trace!("Worker {}: reservation rejected", self.name);
        }
        reserved
    }

    /// Inverse of a successful [`Worker::reserve`]; called once per finished
    /// task whatever its outcome.
    pub fn release(&self, requirements: &D) {
        let valid = self
            .capacity
            .lock()
            .release(requirements.consumables(), self.description.consumables());
        if !valid {
            log::warn!(
                "Worker {}: released resources that were not reserved",
                self.name
            );
        }
    }

    /// Reserves capacity for `implementation`; `false` also when the
    /// implementation targets another resource kind or is incompatible.
    pub fn reserve_implementation(&self, implementation: &Implementation) -> bool {
        D::from_requirements(implementation.requirements()).is_some_and(|rq| self.reserve(rq))
    }

    pub fn release_implementation(&self, implementation: &Implementation) {
        if let Some(rq) = D::from_requirements(implementation.requirements()) {
            self.release(rq);
        }
    }

    /// Detached copy for placement simulations: shares the current tables,
    /// owns an independent copy of the live capacity.
    pub fn scheduling_copy(&self) -> Worker<D> {
        Worker {
            name: self.name.clone(),
            description: self.description.clone(),
            capacity: Mutex::new(self.capacity()),
            tables: RwLock::new(self.tables()),
        }
    }

    pub fn monitoring_report(&self, map: &ConsumableMap) -> String {
        let tables = self.tables();
        let capacity = self.capacity();
        let mut report = String::new();
        // Writing into a String cannot fail
        let _ = writeln!(report, "NAME = {}", self.name);
        let _ = writeln!(report, "DESCRIPTION = {}", self.description.describe(map));
        let _ = writeln!(
            report,
            "SLOTS = {}/{}",
            capacity.used_slots(),
            capacity.max_slots()
        );
        let _ = writeln!(report, "FREE = [{}]", capacity.free().format(map));
        let _ = writeln!(
            report,
            "EXEC_CORES = [{}]",
            crate::format_comma_delimited(tables.executable_cores())
        );
        for core_id in 0..tables.core_count() as u32 {
            let core_id = CoreId::new(core_id);
            let _ = writeln!(
                report,
                "CORE {core_id}: SIM_TASKS = {} (ideal {})",
                tables.core_slots(core_id),
                tables.ideal_slots(core_id)
            );
            for implementation in tables.executable_impls(core_id) {
                let _ = writeln!(
                    report,
                    "  IMPL {}/{} '{}': SIM_TASKS = {}",
                    core_id,
                    implementation.impl_id(),
                    implementation.signature(),
                    tables.impl_slots(core_id, implementation.impl_id())
                );
            }
        }
        report
    }
}

impl<D: ResourceDescription> std::fmt::Debug for Worker<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("capacity", &*self.capacity.lock())
            .finish()
    }
}
