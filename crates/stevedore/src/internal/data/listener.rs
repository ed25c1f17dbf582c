use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use thiserror::Error;
use tokio::sync::oneshot;

/// Where a resolved item ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataTarget {
    Path(PathBuf),
    /// Name of a value resident in the memory of the target node
    Object(String),
    /// Key in the persistent store
    Key(String),
}

impl Display for DataTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataTarget::Path(path) => write!(f, "{}", path.display()),
            DataTarget::Object(name) => write!(f, "object:{name}"),
            DataTarget::Key(key) => write!(f, "key:{key}"),
        }
    }
}

/// Outcome delivered to listeners. Cloneable, since all waiters of one copy
/// receive the same outcome.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
    #[error("Data {data} cannot be obtained for {target}")]
    Exhausted { data: String, target: String },
    #[error("No reachable host to send data {data} to")]
    NoReachableHost { data: String },
    #[error("Serialization of data {data} failed: {message}")]
    Serialization { data: String, message: String },
    #[error("Transfer of data {data} failed: {message}")]
    Failed { data: String, message: String },
}

pub type TransferResult = Result<DataTarget, TransferError>;

/// Receiver of the end of one transfer. Consumed by the notification, so it
/// can be notified only once.
pub trait EventListener: Send {
    fn notify_end(self: Box<Self>, result: TransferResult);
}

impl<F: FnOnce(TransferResult) + Send> EventListener for F {
    fn notify_end(self: Box<Self>, result: TransferResult) {
        (*self)(result)
    }
}

pub type ListenerBox = Box<dyn EventListener>;

/// Listener that forwards the outcome into a oneshot channel.
pub fn oneshot_listener() -> (ListenerBox, oneshot::Receiver<TransferResult>) {
    let (sender, receiver) = oneshot::channel();
    let listener = move |result: TransferResult| {
        // Receiver may be gone when nobody waits for the outcome
        let _ = sender.send(result);
    };
    (Box::new(listener), receiver)
}
