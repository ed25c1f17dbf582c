use crate::NodeId;
use crate::internal::data::listener::ListenerBox;
use crate::internal::data::location::DataLocation;
use crate::internal::data::logical::LogicalDataRef;
use std::sync::Arc;

/// Arguments of one obtain/send call.
#[derive(Debug, Clone)]
pub struct TransferRequest {
    pub data: LogicalDataRef,
    /// Preferred location to take the item from
    pub source: Option<DataLocation>,
    pub target: DataLocation,
    /// Item that receives the new location once the transfer succeeds
    pub target_data: Option<LogicalDataRef>,
    /// Node whose obtain issued this send and is waiting for its outcome
    pub requester: Option<NodeId>,
}

impl TransferRequest {
    pub fn new(data: LogicalDataRef, target: DataLocation) -> Self {
        TransferRequest {
            data,
            source: None,
            target,
            target_data: None,
            requester: None,
        }
    }

    pub fn with_source(mut self, source: DataLocation) -> Self {
        self.source = Some(source);
        self
    }

    pub fn with_target_data(mut self, target_data: LogicalDataRef) -> Self {
        self.target_data = Some(target_data);
        self
    }

    pub fn with_requester(mut self, requester: NodeId) -> Self {
        self.requester = Some(requester);
        self
    }
}

/// A resource able to take part in data transfers.
///
/// An `Err` return means the call was refused and the listener was dropped
/// without notification; otherwise the listener is notified exactly once,
/// possibly from another thread.
pub trait DataNode: Send + Sync {
    fn id(&self) -> NodeId;

    fn name(&self) -> &str;

    /// Brings the item to this node.
    fn obtain_data(&self, request: TransferRequest, listener: ListenerBox) -> crate::Result<()>;

    /// Delivers the item held by this node to the hosts of the target. The
    /// requester must not be asked to obtain the item again; it is already
    /// resolving this request.
    fn send_data(&self, request: TransferRequest, listener: ListenerBox) -> crate::Result<()>;
}

pub type DataNodeRef = Arc<dyn DataNode>;
