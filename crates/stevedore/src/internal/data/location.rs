use crate::NodeId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Memory,
    File,
    Persistent,
}

/// Kind of a parameter, decides how the item is materialized on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataKind {
    File,
    Object,
    Persistent,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HostPath {
    pub host: NodeId,
    pub path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataLocation {
    /// Object held in the memory of a node
    Memory { host: NodeId, name: String },
    /// File visible under the given path on each listed host
    File {
        replicas: SmallVec<[HostPath; 1]>,
    },
    /// Item kept by the persistent store, reachable from everywhere
    Persistent { key: String },
}

impl DataLocation {
    pub fn memory(host: NodeId, name: impl Into<String>) -> Self {
        DataLocation::Memory {
            host,
            name: name.into(),
        }
    }

    pub fn file(host: NodeId, path: impl Into<PathBuf>) -> Self {
        DataLocation::File {
            replicas: smallvec::smallvec![HostPath {
                host,
                path: path.into(),
            }],
        }
    }

    /// File on a disk shared by several hosts.
    pub fn shared_file(replicas: impl IntoIterator<Item = HostPath>) -> Self {
        DataLocation::File {
            replicas: replicas.into_iter().collect(),
        }
    }

    pub fn persistent(key: impl Into<String>) -> Self {
        DataLocation::Persistent { key: key.into() }
    }

    pub fn protocol(&self) -> Protocol {
        match self {
            DataLocation::Memory { .. } => Protocol::Memory,
            DataLocation::File { .. } => Protocol::File,
            DataLocation::Persistent { .. } => Protocol::Persistent,
        }
    }

    /// Hosts holding this location; empty for persistent locations.
    pub fn hosts(&self) -> SmallVec<[NodeId; 2]> {
        match self {
            DataLocation::Memory { host, .. } => smallvec::smallvec![*host],
            DataLocation::File { replicas } => replicas.iter().map(|r| r.host).collect(),
            DataLocation::Persistent { .. } => SmallVec::new(),
        }
    }

    pub fn is_hosted_by(&self, node_id: NodeId) -> bool {
        match self {
            DataLocation::Memory { host, .. } => *host == node_id,
            DataLocation::File { replicas } => replicas.iter().any(|r| r.host == node_id),
            DataLocation::Persistent { .. } => false,
        }
    }

    /// Path of the file as seen from `node_id`.
    pub fn path_in(&self, node_id: NodeId) -> Option<&Path> {
        match self {
            DataLocation::File { replicas } => replicas
                .iter()
                .find(|r| r.host == node_id)
                .map(|r| r.path.as_path()),
            _ => None,
        }
    }

    /// Drops `node_id` from the location. Returns `true` when nothing remains.
    pub(crate) fn remove_host(&mut self, node_id: NodeId) -> bool {
        match self {
            DataLocation::Memory { host, .. } => *host == node_id,
            DataLocation::File { replicas } => {
                replicas.retain(|r| r.host != node_id);
                replicas.is_empty()
            }
            DataLocation::Persistent { .. } => false,
        }
    }
}

/// Location where an item named `name` is materialized on `host`.
pub fn complete_location(kind: DataKind, host: NodeId, temp_dir: &Path, name: &str) -> DataLocation {
    match kind {
        DataKind::File => DataLocation::file(host, temp_dir.join(name)),
        DataKind::Object => DataLocation::memory(host, name),
        DataKind::Persistent => DataLocation::persistent(name),
    }
}

impl Display for DataLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            DataLocation::Memory { host, name } => write!(f, "memory://node{host}/{name}"),
            DataLocation::File { replicas } => {
                for (i, replica) in replicas.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "file://node{}{}", replica.host, replica.path.display())?;
                }
                Ok(())
            }
            DataLocation::Persistent { key } => write!(f, "persistent://{key}"),
        }
    }
}
