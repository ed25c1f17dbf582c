use crate::internal::data::listener::{
    DataTarget, ListenerBox, TransferError, TransferResult, oneshot_listener,
};
use crate::internal::data::location::DataLocation;
use crate::internal::data::logical::LogicalDataRef;
use crate::{CopyId, NodeId};
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::atomic::{AtomicU64, Ordering};

static NEXT_COPY_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct CopyState {
    outcome: Option<TransferResult>,
    listeners: Vec<ListenerBox>,
}

/// A transfer of one item towards one target that is in progress.
/// Requests for the same item and target wait for it instead of starting
/// another transfer.
pub struct DataCopy {
    id: CopyId,
    data_name: String,
    source: Option<DataLocation>,
    target: DataLocation,
    target_data: Option<LogicalDataRef>,
    target_hosts: SmallVec<[NodeId; 2]>,
    state: Mutex<CopyState>,
}

impl DataCopy {
    pub fn new(
        data_name: impl Into<String>,
        source: Option<DataLocation>,
        target: DataLocation,
        target_data: Option<LogicalDataRef>,
    ) -> Self {
        let mut target_hosts = target.hosts();
        if let Some(target_data) = &target_data {
            for host in target_data.all_hosts() {
                if !target_hosts.contains(&host) {
                    target_hosts.push(host);
                }
            }
        }
        DataCopy {
            id: CopyId::new(NEXT_COPY_ID.fetch_add(1, Ordering::Relaxed)),
            data_name: data_name.into(),
            source,
            target,
            target_data,
            target_hosts,
            state: Default::default(),
        }
    }

    #[inline]
    pub fn id(&self) -> CopyId {
        self.id
    }

    pub fn data_name(&self) -> &str {
        &self.data_name
    }

    pub fn source(&self) -> Option<&DataLocation> {
        self.source.as_ref()
    }

    pub fn target(&self) -> &DataLocation {
        &self.target
    }

    pub fn target_data(&self) -> Option<&LogicalDataRef> {
        self.target_data.as_ref()
    }

    /// True when the copy delivers the item to `node_id`, either through its
    /// target location or through the hosts of its target data.
    pub fn targets_node(&self, node_id: NodeId) -> bool {
        self.target_hosts.contains(&node_id)
    }

    pub fn is_finished(&self) -> bool {
        self.state.lock().outcome.is_some()
    }

    pub fn outcome(&self) -> Option<TransferResult> {
        self.state.lock().outcome.clone()
    }

    /// Resolved target of a successfully finished copy.
    pub fn final_target(&self) -> Option<DataTarget> {
        match &self.state.lock().outcome {
            Some(Ok(target)) => Some(target.clone()),
            _ => None,
        }
    }

    /// Registers a waiter; it is notified immediately when the copy is
    /// already finished.
    pub fn add_listener(&self, listener: ListenerBox) {
        let outcome = {
            let mut state = self.state.lock();
            match &state.outcome {
                Some(outcome) => outcome.clone(),
                None => {
                    state.listeners.push(listener);
                    return;
                }
            }
        };
        listener.notify_end(outcome);
    }

    /// Stores the outcome and notifies all waiters. Returns `false` (and
    /// notifies nobody) when the copy was already finished.
    pub fn complete(&self, result: TransferResult) -> bool {
        let listeners = {
            let mut state = self.state.lock();
            if state.outcome.is_some() {
                log::warn!("Copy {} of data {} finished twice", self.id, self.data_name);
                return false;
            }
            state.outcome = Some(result.clone());
            std::mem::take(&mut state.listeners)
        };
        log::debug!(
            "Copy {} of data {} finished; notifying {} waiter(s)",
            self.id,
            self.data_name,
            listeners.len()
        );
        for listener in listeners {
            listener.notify_end(result.clone());
        }
        true
    }

    /// Blocks the calling thread until the copy finishes.
    pub fn wait(&self) -> TransferResult {
        let (listener, receiver) = oneshot_listener();
        self.add_listener(listener);
        receiver.blocking_recv().unwrap_or_else(|_| {
            Err(TransferError::Failed {
                data: self.data_name.clone(),
                message: "copy was abandoned".to_string(),
            })
        })
    }
}

impl std::fmt::Debug for DataCopy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DataCopy")
            .field("id", &self.id)
            .field("data", &self.data_name)
            .field("source", &self.source)
            .field("target", &self.target)
            .finish()
    }
}
