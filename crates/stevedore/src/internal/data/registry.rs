use crate::Map;
use crate::internal::data::logical::{LogicalData, LogicalDataRef};
use parking_lot::Mutex;

/// Process-wide table of logical data, keyed by name.
#[derive(Default)]
pub struct DataRegistry {
    items: Mutex<Map<String, LogicalDataRef>>,
}

impl DataRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the item called `name`, creating it on first reference.
    pub fn get_or_create(&self, name: &str) -> LogicalDataRef {
        self.items
            .lock()
            .entry_ref(name)
            .or_insert_with(|| LogicalData::new(name))
            .clone()
    }

    pub fn get(&self, name: &str) -> Option<LogicalDataRef> {
        self.items.lock().get(name).cloned()
    }

    pub fn remove(&self, name: &str) -> Option<LogicalDataRef> {
        let removed = self.items.lock().remove(name);
        if removed.is_some() {
            log::debug!("Data {name} removed from registry");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }
}
