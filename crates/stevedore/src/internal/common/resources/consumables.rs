use crate::internal::common::Map;
use crate::internal::common::resources::ResourceAmount;
use crate::internal::common::utils::format_comma_delimited;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

define_id_type!(ConsumableId, u32);

pub const CPU_RESOURCE_ID: ConsumableId = ConsumableId::new(0);
pub const GPU_RESOURCE_ID: ConsumableId = ConsumableId::new(1);
pub const MEM_RESOURCE_ID: ConsumableId = ConsumableId::new(2);
pub const CONNECTIONS_RESOURCE_ID: ConsumableId = ConsumableId::new(3);

pub const CPU_RESOURCE_NAME: &str = "cpus";
pub const GPU_RESOURCE_NAME: &str = "gpus";
pub const MEM_RESOURCE_NAME: &str = "mem";
pub const CONNECTIONS_RESOURCE_NAME: &str = "connections";

/// Dense vector of consumable quantities indexed by [`ConsumableId`].
///
/// Describes capacity when attached to a resource and demand when attached to
/// an implementation. Dimensions past the end of the vector are zero.
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Consumables {
    amounts: SmallVec<[ResourceAmount; 4]>,
}

impl Consumables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_units(units: &[(ConsumableId, u32)]) -> Self {
        let mut consumables = Self::new();
        for (id, amount) in units {
            consumables.set(*id, ResourceAmount::new_units(*amount));
        }
        consumables
    }

    pub fn with(mut self, id: ConsumableId, amount: ResourceAmount) -> Self {
        self.set(id, amount);
        self
    }

    #[inline]
    pub fn get(&self, id: ConsumableId) -> ResourceAmount {
        self.amounts
            .get(usize::from(id))
            .copied()
            .unwrap_or(ResourceAmount::ZERO)
    }

    pub fn set(&mut self, id: ConsumableId, amount: ResourceAmount) {
        let idx = usize::from(id);
        if idx >= self.amounts.len() {
            self.amounts.resize(idx + 1, ResourceAmount::ZERO);
        }
        self.amounts[idx] = amount;
        // Keep the representation canonical so that equality ignores trailing zeros
        while self.amounts.last().is_some_and(|a| a.is_zero()) {
            self.amounts.pop();
        }
    }

    /// Iterates over non-zero dimensions.
    pub fn iter(&self) -> impl Iterator<Item = (ConsumableId, ResourceAmount)> + '_ {
        self.amounts
            .iter()
            .enumerate()
            .filter(|(_, amount)| !amount.is_zero())
            .map(|(idx, amount)| (ConsumableId::new(idx as u32), *amount))
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.iter().all(|a| a.is_zero())
    }

    /// Number of simultaneous copies of `demand` that fit into `self`,
    /// i.e. the minimum over all demanded dimensions of `floor(self / demand)`.
    /// Returns `None` when `demand` is empty.
    pub fn fit_count(&self, demand: &Consumables) -> Option<u64> {
        demand
            .iter()
            .filter_map(|(id, amount)| self.get(id).fits(amount))
            .min()
    }

    pub fn covers(&self, demand: &Consumables) -> bool {
        demand.iter().all(|(id, amount)| self.get(id) >= amount)
    }

    /// Subtracts `demand` when every dimension is covered.
    /// Leaves `self` untouched and returns `false` otherwise.
    pub fn try_remove(&mut self, demand: &Consumables) -> bool {
        if !self.covers(demand) {
            return false;
        }
        for (id, amount) in demand.iter() {
            let value = self.get(id) - amount;
            self.set(id, value);
        }
        true
    }

    pub fn add(&mut self, other: &Consumables) {
        for (id, amount) in other.iter() {
            let value = self.get(id) + amount;
            self.set(id, value);
        }
    }

    pub fn format(&self, map: &ConsumableMap) -> String {
        format_comma_delimited(self.iter().map(|(id, amount)| {
            format!("{}={}", map.get_name(id).unwrap_or("<unknown>"), amount)
        }))
    }
}

/// Process-wide mapping between consumable names and their dense ids.
#[derive(Debug, Clone)]
pub struct ConsumableMap {
    names: Vec<String>,
    ids: Map<String, ConsumableId>,
}

impl Default for ConsumableMap {
    fn default() -> Self {
        let mut map = ConsumableMap {
            names: Vec::new(),
            ids: Map::default(),
        };
        /* Fixed ids for well-known consumables */
        for name in [
            CPU_RESOURCE_NAME,
            GPU_RESOURCE_NAME,
            MEM_RESOURCE_NAME,
            CONNECTIONS_RESOURCE_NAME,
        ] {
            map.get_or_allocate_id(name);
        }
        map
    }
}

impl ConsumableMap {
    pub fn get_or_allocate_id(&mut self, name: &str) -> ConsumableId {
        match self.ids.get(name) {
            Some(&id) => id,
            None => {
                let id = ConsumableId::new(self.names.len() as u32);
                log::debug!("New consumable registered '{name}' as {id}");
                self.names.push(name.to_string());
                self.ids.insert(name.to_string(), id);
                id
            }
        }
    }

    #[inline]
    pub fn get_id(&self, name: &str) -> Option<ConsumableId> {
        self.ids.get(name).copied()
    }

    #[inline]
    pub fn get_name(&self, id: ConsumableId) -> Option<&str> {
        self.names.get(usize::from(id)).map(|s| s.as_str())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// Builds a consumable vector from named amounts, registering unknown names.
    pub fn consumables<'a>(
        &mut self,
        items: impl IntoIterator<Item = (&'a str, ResourceAmount)>,
    ) -> Consumables {
        let mut consumables = Consumables::new();
        for (name, amount) in items {
            let id = self.get_or_allocate_id(name);
            consumables.set(id, amount);
        }
        consumables
    }
}
