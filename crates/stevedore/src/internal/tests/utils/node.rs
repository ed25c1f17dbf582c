use crate::NodeId;
use crate::internal::common::error::StevedoreError;
use crate::internal::data::listener::{DataTarget, ListenerBox, TransferError};
use crate::internal::data::location::DataLocation;
use crate::internal::transfer::directory::NodeDirectory;
use crate::internal::transfer::node::{DataNode, TransferRequest};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeerBehavior {
    /// Writes the content to the target and reports success
    Deliver,
    /// Returns an error from the call itself
    Refuse,
    /// Accepts the call and reports a failure after the delay
    Fail,
    /// Accepts the call and drops the listener
    Silent,
}

/// Fake peer that counts the transfers it was asked for.
pub struct TestNode {
    id: NodeId,
    name: String,
    behavior: PeerBehavior,
    delay: Duration,
    content: Vec<u8>,
    sends: AtomicUsize,
    obtains: AtomicUsize,
}

impl TestNode {
    pub fn new(id: u32) -> Self {
        TestNode {
            id: NodeId::new(id),
            name: format!("peer{id}"),
            behavior: PeerBehavior::Deliver,
            delay: Duration::ZERO,
            content: format!("content of peer{id}").into_bytes(),
            sends: AtomicUsize::new(0),
            obtains: AtomicUsize::new(0),
        }
    }

    pub fn behavior(mut self, behavior: PeerBehavior) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn content(&self) -> &[u8] {
        &self.content
    }

    pub fn sends(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
    }

    pub fn obtains(&self) -> usize {
        self.obtains.load(Ordering::SeqCst)
    }

    pub fn register(self, directory: &NodeDirectory) -> Arc<TestNode> {
        let node = Arc::new(self);
        directory.register(node.clone());
        node
    }

    fn handle(&self, path: Option<PathBuf>, write: bool, listener: ListenerBox) -> crate::Result<()> {
        match self.behavior {
            PeerBehavior::Refuse => {
                return Err(StevedoreError::TransferError(format!(
                    "node {} refuses transfers",
                    self.id
                )));
            }
            PeerBehavior::Silent => drop(listener),
            PeerBehavior::Fail => {
                let delay = self.delay;
                let message = format!("node {} failed", self.id);
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    listener.notify_end(Err(TransferError::Failed {
                        data: "test".to_string(),
                        message,
                    }));
                });
            }
            PeerBehavior::Deliver => {
                let delay = self.delay;
                let content = self.content.clone();
                std::thread::spawn(move || {
                    std::thread::sleep(delay);
                    let result = match path {
                        Some(path) => {
                            if write {
                                std::fs::write(&path, &content).unwrap();
                            }
                            Ok(DataTarget::Path(path))
                        }
                        None => Err(TransferError::Failed {
                            data: "test".to_string(),
                            message: "target has no path".to_string(),
                        }),
                    };
                    listener.notify_end(result);
                });
            }
        }
        Ok(())
    }
}

fn remote_path(target: &DataLocation, exclude: NodeId) -> Option<PathBuf> {
    target
        .hosts()
        .into_iter()
        .filter(|host| *host != exclude)
        .find_map(|host| target.path_in(host).map(|p| p.to_path_buf()))
}

impl DataNode for TestNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn obtain_data(&self, request: TransferRequest, listener: ListenerBox) -> crate::Result<()> {
        self.obtains.fetch_add(1, Ordering::SeqCst);
        let path = request.target.path_in(self.id).map(|p| p.to_path_buf());
        self.handle(path, false, listener)
    }

    fn send_data(&self, request: TransferRequest, listener: ListenerBox) -> crate::Result<()> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        let path = remote_path(&request.target, self.id);
        self.handle(path, true, listener)
    }
}
