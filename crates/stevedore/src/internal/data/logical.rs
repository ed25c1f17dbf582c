use crate::internal::data::copy::DataCopy;
use crate::internal::data::location::DataLocation;
use crate::{CopyId, NodeId};
use parking_lot::Mutex;
use serde::Serialize;
use std::fmt::Debug;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::Arc;

/// Value resident in the memory of this process.
pub trait MemoryObject: Debug + Send + Sync {
    fn serialize_to(&self, path: &Path) -> crate::Result<()>;
}

impl<T: Serialize + Debug + Send + Sync> MemoryObject for T {
    fn serialize_to(&self, path: &Path) -> crate::Result<()> {
        let mut writer = BufWriter::new(std::fs::File::create(path)?);
        bincode::serialize_into(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

#[derive(Default)]
struct LogicalDataState {
    locations: Vec<DataLocation>,
    value: Option<Arc<dyn MemoryObject>>,
    copies: Vec<Arc<DataCopy>>,
    pins: u32,
    pending_removals: Vec<NodeId>,
}

/// One named data value and everything known about its replicas.
pub struct LogicalData {
    name: String,
    state: Mutex<LogicalDataState>,
}

pub type LogicalDataRef = Arc<LogicalData>;

pub(crate) enum CopyTicket {
    Joined(Arc<DataCopy>),
    Started(Arc<DataCopy>),
}

impl LogicalData {
    pub fn new(name: impl Into<String>) -> LogicalDataRef {
        Arc::new(LogicalData {
            name: name.into(),
            state: Default::default(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn locations(&self) -> Vec<DataLocation> {
        self.state.lock().locations.clone()
    }

    pub fn add_location(&self, location: DataLocation) {
        let mut state = self.state.lock();
        if !state.locations.contains(&location) {
            log::debug!("Data {}: new location {location}", self.name);
            state.locations.push(location);
        }
    }

    /// All hosts of all locations, without duplicates, in registration order.
    pub fn all_hosts(&self) -> Vec<NodeId> {
        let state = self.state.lock();
        let mut hosts = Vec::new();
        for location in &state.locations {
            for host in location.hosts() {
                if !hosts.contains(&host) {
                    hosts.push(host);
                }
            }
        }
        hosts
    }

    pub fn persistent_key(&self) -> Option<String> {
        self.state
            .lock()
            .locations
            .iter()
            .find_map(|location| match location {
                DataLocation::Persistent { key } => Some(key.clone()),
                _ => None,
            })
    }

    pub fn value(&self) -> Option<Arc<dyn MemoryObject>> {
        self.state.lock().value.clone()
    }

    pub fn is_in_memory(&self) -> bool {
        self.state.lock().value.is_some()
    }

    pub fn set_value(&self, value: Arc<dyn MemoryObject>) {
        self.state.lock().value = Some(value);
    }

    pub fn take_value(&self) -> Option<Arc<dyn MemoryObject>> {
        self.state.lock().value.take()
    }

    pub fn copies(&self) -> Vec<Arc<DataCopy>> {
        self.state.lock().copies.clone()
    }

    /// Unfinished copies that deliver the item to `node_id`.
    pub fn copies_to(&self, node_id: NodeId) -> Vec<Arc<DataCopy>> {
        self.state
            .lock()
            .copies
            .iter()
            .filter(|copy| copy.targets_node(node_id) && !copy.is_finished())
            .cloned()
            .collect()
    }

    /// Joins an unfinished copy to `node_id` or registers `copy`. Both happen
    /// under the item lock, so concurrent callers end up with a single copy.
    pub(crate) fn join_or_start_copy(&self, node_id: NodeId, copy: DataCopy) -> CopyTicket {
        let mut state = self.state.lock();
        if let Some(copy) = state
            .copies
            .iter()
            .find(|copy| copy.targets_node(node_id) && !copy.is_finished())
        {
            return CopyTicket::Joined(copy.clone());
        }
        let copy = Arc::new(copy);
        state.copies.push(copy.clone());
        CopyTicket::Started(copy)
    }

    pub(crate) fn remove_copy(&self, copy_id: CopyId) {
        self.state.lock().copies.retain(|copy| copy.id() != copy_id);
    }

    /// Keeps the locations of the item while the returned guard lives.
    pub fn pin(self: &Arc<Self>) -> RemovalPin {
        self.state.lock().pins += 1;
        RemovalPin { data: self.clone() }
    }

    pub fn pin_count(&self) -> u32 {
        self.state.lock().pins
    }

    /// Forgets every replica held by `node_id`. While the item is pinned the
    /// removal is only queued; returns `true` when it was applied right away.
    pub fn remove_host(&self, node_id: NodeId) -> bool {
        let mut state = self.state.lock();
        if state.pins > 0 {
            log::debug!(
                "Data {} is pinned; removal of node {node_id} postponed",
                self.name
            );
            if !state.pending_removals.contains(&node_id) {
                state.pending_removals.push(node_id);
            }
            return false;
        }
        state.locations.retain_mut(|location| !location.remove_host(node_id));
        true
    }

    fn unpin(&self) {
        let mut state = self.state.lock();
        debug_assert!(state.pins > 0);
        state.pins = state.pins.saturating_sub(1);
        if state.pins == 0 && !state.pending_removals.is_empty() {
            let removals = std::mem::take(&mut state.pending_removals);
            for node_id in removals {
                log::debug!("Data {}: applying postponed removal of node {node_id}", self.name);
                state.locations.retain_mut(|location| !location.remove_host(node_id));
            }
        }
    }
}

impl Debug for LogicalData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("LogicalData")
            .field("name", &self.name)
            .field("locations", &state.locations)
            .field("in_memory", &state.value.is_some())
            .field("copies", &state.copies.len())
            .field("pins", &state.pins)
            .finish()
    }
}

pub struct RemovalPin {
    data: LogicalDataRef,
}

impl Drop for RemovalPin {
    fn drop(&mut self) {
        self.data.unpin();
    }
}
