use crate::NodeId;
use crate::internal::data::copy::DataCopy;
use crate::internal::data::listener::{
    DataTarget, ListenerBox, TransferError, TransferResult, oneshot_listener,
};
use crate::internal::data::location::{DataKind, DataLocation, complete_location};
use crate::internal::data::logical::{CopyTicket, MemoryObject};
use crate::internal::transfer::directory::NodeDirectory;
use crate::internal::transfer::node::{DataNode, TransferRequest};
use crate::internal::worker::configuration::NodeConfiguration;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// What happens when an in-memory value cannot be written to the target.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MemoryFailurePolicy {
    /// The resolution stops and the listener receives the failure
    #[default]
    Authoritative,
    /// The failure is logged and the remaining strategies are tried
    FallThrough,
}

/// The node running in this process. Resolves obtain requests against the
/// replicas it knows about and delegates to peers found in its directory.
pub struct LocalNode {
    id: NodeId,
    name: String,
    temp_dir: PathBuf,
    memory_failure_policy: MemoryFailurePolicy,
    directory: Arc<NodeDirectory>,
}

impl LocalNode {
    pub fn new(
        id: NodeId,
        name: impl Into<String>,
        temp_dir: impl Into<PathBuf>,
        memory_failure_policy: MemoryFailurePolicy,
        directory: Arc<NodeDirectory>,
    ) -> Self {
        LocalNode {
            id,
            name: name.into(),
            temp_dir: temp_dir.into(),
            memory_failure_policy,
            directory,
        }
    }

    pub fn from_configuration(config: &NodeConfiguration, directory: Arc<NodeDirectory>) -> Self {
        Self::new(
            config.node_id,
            config.name.clone(),
            config.temp_dir.clone(),
            config.memory_failure_policy,
            directory,
        )
    }

    pub fn temp_dir(&self) -> &Path {
        &self.temp_dir
    }

    pub fn memory_failure_policy(&self) -> MemoryFailurePolicy {
        self.memory_failure_policy
    }

    pub fn directory(&self) -> &Arc<NodeDirectory> {
        &self.directory
    }

    /// Location where an item of `kind` named `name` is materialized here.
    pub fn complete_location(&self, kind: DataKind, name: &str) -> DataLocation {
        complete_location(kind, self.id, &self.temp_dir, name)
    }

    /// Resolves `request` and notifies `listener` exactly once.
    pub fn obtain(&self, request: TransferRequest, listener: ListenerBox) {
        log::info!("Obtain data {}", request.data.name());
        log::debug!(
            "Obtain data {}: source {:?}, target {}, target data {:?}",
            request.data.name(),
            request.source,
            request.target,
            request.target_data.as_ref().map(|d| d.name())
        );
        let mut started_copy = None;
        let result = self.resolve(&request, &mut started_copy);
        if let Some(copy) = started_copy {
            copy.complete(result.clone());
            request.data.remove_copy(copy.id());
        }
        listener.notify_end(result);
    }

    fn resolve(
        &self,
        request: &TransferRequest,
        started_copy: &mut Option<Arc<DataCopy>>,
    ) -> TransferResult {
        let data = &request.data;

        if let Some(key) = data.persistent_key() {
            log::debug!(
                "Data {} is in the persistent store; target set to key {key}",
                data.name()
            );
            if let Some(target_data) = &request.target_data {
                target_data.add_location(DataLocation::persistent(key.clone()));
            }
            return Ok(DataTarget::Key(key));
        }

        let local_target = request.target.path_in(self.id).map(Path::to_path_buf);

        if let Some(value) = data.value() {
            match self.materialize_value(request, value, local_target.as_deref()) {
                Some(Ok(target)) => return Ok(target),
                Some(Err(error)) => match self.memory_failure_policy {
                    MemoryFailurePolicy::Authoritative => return Err(error),
                    MemoryFailurePolicy::FallThrough => {
                        log::debug!("Data {}: trying remaining replicas", data.name())
                    }
                },
                None => {}
            }
        }

        let _pin = data.pin();

        log::debug!(
            "Data {} not in memory; checking copies in progress to node {}",
            data.name(),
            self.id
        );
        for in_flight in data.copies_to(self.id) {
            if let Some(result) =
                self.finish_from_copy(request, &in_flight, local_target.as_deref())
            {
                return result;
            }
        }

        if let Some(target) = self.copy_local_replica(request, local_target.as_deref()) {
            return Ok(target);
        }

        if let Some(source) = &request.source {
            for host in source.hosts() {
                if host != self.id {
                    if let Some(result) = self.delegate(request, host, started_copy) {
                        return result;
                    }
                    continue;
                }
                let (Some(path), Some(target_path)) = (source.path_in(self.id), &local_target)
                else {
                    continue;
                };
                match local_copy(path, target_path) {
                    Ok(()) => return Ok(self.register(request, DataTarget::Path(target_path.clone()))),
                    Err(error) => log::warn!(
                        "Local copy of data {} from source {} to {} failed: {error}",
                        data.name(),
                        path.display(),
                        target_path.display()
                    ),
                }
            }
        } else {
            log::debug!("Data {}: no source location given", data.name());
        }

        for host in data.all_hosts() {
            if host == self.id {
                continue;
            }
            if let Some(result) = self.delegate(request, host, started_copy) {
                return result;
            }
        }

        log::warn!(
            "Data {} could not be transferred to {}",
            data.name(),
            request.target
        );
        Err(TransferError::Exhausted {
            data: data.name().to_string(),
            target: request.target.to_string(),
        })
    }

    /// `None` when the target can be neither written nor kept on this node.
    fn materialize_value(
        &self,
        request: &TransferRequest,
        value: Arc<dyn MemoryObject>,
        local_target: Option<&Path>,
    ) -> Option<TransferResult> {
        if let DataLocation::Memory { host, name } = &request.target {
            if *host != self.id {
                log::debug!(
                    "Data {} is in memory but target {} lives on node {host}",
                    request.data.name(),
                    request.target
                );
                return None;
            }
            if let Some(target_data) = &request.target_data {
                target_data.set_value(value);
            }
            log::debug!("Data {} kept in memory as {name}", request.data.name());
            return Some(Ok(self.register(request, DataTarget::Object(name.clone()))));
        }
        let Some(path) = local_target else {
            log::debug!(
                "Data {} is in memory but target {} has no path on node {}",
                request.data.name(),
                request.target,
                self.id
            );
            return None;
        };
        match value.serialize_to(path) {
            Ok(()) => {
                log::debug!(
                    "Data {} serialized from memory to {}",
                    request.data.name(),
                    path.display()
                );
                Some(Ok(self.register(request, DataTarget::Path(path.to_path_buf()))))
            }
            Err(error) => {
                log::warn!(
                    "Serialization of data {} to {} failed: {error}",
                    request.data.name(),
                    path.display()
                );
                Some(Err(TransferError::Serialization {
                    data: request.data.name().to_string(),
                    message: error.to_string(),
                }))
            }
        }
    }

    /// Copies a replica of the item held by this node to the target path.
    fn copy_local_replica(
        &self,
        request: &TransferRequest,
        local_target: Option<&Path>,
    ) -> Option<DataTarget> {
        let target_path = local_target?;
        for location in request.data.locations() {
            let Some(path) = location.path_in(self.id) else {
                continue;
            };
            match local_copy(path, target_path) {
                Ok(()) => {
                    return Some(self.register(request, DataTarget::Path(target_path.to_path_buf())));
                }
                Err(error) => log::warn!(
                    "Local copy of data {} from {} to {} failed: {error}",
                    request.data.name(),
                    path.display(),
                    target_path.display()
                ),
            }
        }
        None
    }

    /// Waits for `copy` and takes over its outcome. `None` only when the copy
    /// delivered but placing its result at the requested target failed.
    fn finish_from_copy(
        &self,
        request: &TransferRequest,
        copy: &DataCopy,
        local_target: Option<&Path>,
    ) -> Option<TransferResult> {
        log::debug!(
            "Waiting for copy {} of data {}",
            copy.id(),
            request.data.name()
        );
        match copy.wait() {
            Ok(DataTarget::Path(final_path)) => {
                let target_path = local_target.unwrap_or(final_path.as_path()).to_path_buf();
                if let Err(error) = local_copy(&final_path, &target_path) {
                    log::warn!(
                        "Local copy of data {} from {} to {} failed: {error}",
                        request.data.name(),
                        final_path.display(),
                        target_path.display()
                    );
                    return None;
                }
                Some(Ok(self.register(request, DataTarget::Path(target_path))))
            }
            Ok(target) => Some(Ok(self.register(request, target))),
            Err(error) => {
                log::debug!(
                    "Copy {} of data {} failed: {error}",
                    copy.id(),
                    request.data.name()
                );
                Some(Err(error))
            }
        }
    }

    /// Replica left at the target by a copy that finished and was unregistered
    /// after the earlier checks of this resolution.
    fn delivered_meanwhile(
        &self,
        request: &TransferRequest,
        local_target: Option<&Path>,
    ) -> Option<DataTarget> {
        if let (Some(target_data), Some(path)) = (&request.target_data, local_target) {
            if path.exists() && target_data.locations().contains(&request.target) {
                log::debug!(
                    "Data {} already delivered to {}",
                    request.data.name(),
                    request.target
                );
                return Some(DataTarget::Path(path.to_path_buf()));
            }
        }
        self.copy_local_replica(request, local_target)
    }

    /// Asks `host` to send the item here. The first remote attempt registers
    /// a copy on the item; a concurrent resolution already doing the same
    /// is joined instead and its outcome becomes the outcome of this one.
    fn delegate(
        &self,
        request: &TransferRequest,
        host: NodeId,
        started_copy: &mut Option<Arc<DataCopy>>,
    ) -> Option<TransferResult> {
        let Some(peer) = self.directory.get(host) else {
            log::debug!(
                "Node {host} is not in the directory; skipping it for data {}",
                request.data.name()
            );
            return None;
        };
        let local_target = request.target.path_in(self.id);
        while started_copy.is_none() {
            if let Some(target) = self.delivered_meanwhile(request, local_target) {
                return Some(Ok(target));
            }
            let copy = DataCopy::new(
                request.data.name(),
                request.source.clone(),
                request.target.clone(),
                request.target_data.clone(),
            );
            match request.data.join_or_start_copy(self.id, copy) {
                CopyTicket::Joined(in_flight) => {
                    if let Some(result) = self.finish_from_copy(request, &in_flight, local_target)
                    {
                        return Some(result);
                    }
                }
                CopyTicket::Started(copy) => *started_copy = Some(copy),
            }
        }

        log::debug!(
            "Sending data {} from node {host} to {}",
            request.data.name(),
            request.target
        );
        let (listener, receiver) = oneshot_listener();
        if let Err(error) = peer.send_data(request.clone().with_requester(self.id), listener) {
            log::warn!(
                "Node {host} cannot send data {}: {error}",
                request.data.name()
            );
            return None;
        }
        match receiver.blocking_recv() {
            Ok(Ok(target)) => {
                log::debug!("Data {} sent by node {host}", request.data.name());
                Some(Ok(self.register(request, target)))
            }
            Ok(Err(error)) => {
                log::warn!("Node {host} failed to send data: {error}");
                None
            }
            Err(_) => {
                log::warn!(
                    "Node {host} dropped the transfer of data {}",
                    request.data.name()
                );
                None
            }
        }
    }

    fn register(&self, request: &TransferRequest, target: DataTarget) -> DataTarget {
        if let Some(target_data) = &request.target_data {
            target_data.add_location(request.target.clone());
        }
        log::debug!("Data {}: target set to {target}", request.data.name());
        target
    }

    /// Writes a replica held here straight to the target path on `host`.
    /// Used when `host` is the requester, which waits for this send and must
    /// not be asked to obtain the item again.
    fn push(&self, request: &TransferRequest, host: NodeId) -> Option<DataTarget> {
        let Some(target_path) = request.target.path_in(host) else {
            log::debug!("Target {} has no path on node {host}", request.target);
            return None;
        };
        if let Some(value) = request.data.value() {
            match value.serialize_to(target_path) {
                Ok(()) => return Some(DataTarget::Path(target_path.to_path_buf())),
                Err(error) => log::warn!(
                    "Serialization of data {} to {} failed: {error}",
                    request.data.name(),
                    target_path.display()
                ),
            }
        }
        let replicas = request.source.iter().cloned().chain(request.data.locations());
        for location in replicas {
            let Some(path) = location.path_in(self.id) else {
                continue;
            };
            match local_copy(path, target_path) {
                Ok(()) => {
                    log::debug!(
                        "Data {} pushed from node {} to node {host}",
                        request.data.name(),
                        self.id
                    );
                    return Some(DataTarget::Path(target_path.to_path_buf()));
                }
                Err(error) => log::warn!(
                    "Copy of data {} from {} to {} failed: {error}",
                    request.data.name(),
                    path.display(),
                    target_path.display()
                ),
            }
        }
        log::debug!(
            "Node {} holds no replica of data {}",
            self.id,
            request.data.name()
        );
        None
    }

    /// Asks `host` to obtain the item and waits for the outcome.
    fn relay_obtain(&self, request: &TransferRequest, host: NodeId) -> Option<DataTarget> {
        let Some(peer) = self.directory.get(host) else {
            log::debug!("Node {host} is not in the directory; skipping it");
            return None;
        };
        let (relay, receiver) = oneshot_listener();
        if let Err(error) = peer.obtain_data(request.clone(), relay) {
            log::warn!(
                "Node {host} refused to obtain data {}: {error}",
                request.data.name()
            );
            return None;
        }
        match receiver.blocking_recv() {
            Ok(Ok(target)) => Some(target),
            Ok(Err(error)) => {
                log::warn!("Node {host} failed to obtain data: {error}");
                None
            }
            Err(_) => {
                log::warn!(
                    "Node {host} dropped the transfer of data {}",
                    request.data.name()
                );
                None
            }
        }
    }
}

/// Overwrites `to` with the content of `from`. Copying a file onto itself
/// is a no-op.
fn local_copy(from: &Path, to: &Path) -> std::io::Result<()> {
    if from == to {
        return Ok(());
    }
    std::fs::copy(from, to)?;
    Ok(())
}

impl DataNode for LocalNode {
    fn id(&self) -> NodeId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn obtain_data(&self, request: TransferRequest, listener: ListenerBox) -> crate::Result<()> {
        self.obtain(request, listener);
        Ok(())
    }

    /// Hands the request over to the first other host of the target that
    /// accepts it and delivers. The requester is served by a direct push.
    fn send_data(&self, request: TransferRequest, listener: ListenerBox) -> crate::Result<()> {
        for host in request.target.hosts() {
            if host == self.id {
                continue;
            }
            let delivered = if request.requester == Some(host) {
                self.push(&request, host)
            } else {
                self.relay_obtain(&request, host)
            };
            if let Some(target) = delivered {
                listener.notify_end(Ok(target));
                return Ok(());
            }
        }
        log::warn!(
            "No host of {} could receive data {}",
            request.target,
            request.data.name()
        );
        listener.notify_end(Err(TransferError::NoReachableHost {
            data: request.data.name().to_string(),
        }));
        Ok(())
    }
}
