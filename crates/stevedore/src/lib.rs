#[macro_use]
pub mod internal;

pub use crate::internal::common::index::IndexVec;
pub use crate::internal::common::utils::format_comma_delimited;
pub use crate::internal::common::{Map, Set};

pub use crate::internal::common::ids::{CopyId, CoreId, ImplId, NodeId};

pub type Error = internal::common::error::StevedoreError;
pub type Result<T> = std::result::Result<T, Error>;

pub mod resources {
    pub use crate::internal::common::resources::{
        CONNECTIONS_RESOURCE_NAME, CPU_RESOURCE_ID, CPU_RESOURCE_NAME, ComputeDescription,
        ConsumableId, ConsumableMap, Consumables, GPU_RESOURCE_NAME, MEM_RESOURCE_NAME,
        Requirements, ResourceAmount, ResourceDescription, ResourceKind, ServiceDescription,
    };

    pub use crate::internal::common::resources::amount::{
        FRACTIONS_MAX_DIGITS, FRACTIONS_PER_UNIT, ResourceFractions, ResourceUnits,
    };
}

pub mod catalog {
    pub use crate::internal::catalog::{
        CatalogDefinition, CatalogRegistry, CatalogUpdate, CoreCatalog, CoreCatalogRef,
        CoreDefinition, Implementation, ImplementationDefinition,
    };
}

pub mod worker {
    pub use crate::internal::worker::capacity::SlotCapacity;
    pub use crate::internal::worker::configuration::{
        DescriptionConfiguration, NodeConfiguration, ResourceConfiguration,
        load_node_configuration,
    };
    pub use crate::internal::worker::tables::ExecutableTables;
    pub use crate::internal::worker::{ComputeWorker, ServiceWorker, Worker};
}

pub mod data {
    pub use crate::internal::data::copy::DataCopy;
    pub use crate::internal::data::listener::{
        DataTarget, EventListener, ListenerBox, TransferError, TransferResult, oneshot_listener,
    };
    pub use crate::internal::data::location::{
        DataKind, DataLocation, HostPath, Protocol, complete_location,
    };
    pub use crate::internal::data::logical::{
        LogicalData, LogicalDataRef, MemoryObject, RemovalPin,
    };
    pub use crate::internal::data::registry::DataRegistry;
}

pub mod transfer {
    pub use crate::internal::transfer::directory::NodeDirectory;
    pub use crate::internal::transfer::local::{LocalNode, MemoryFailurePolicy};
    pub use crate::internal::transfer::node::{DataNode, DataNodeRef, TransferRequest};
}

pub mod setup {
    pub use crate::internal::common::setup::setup_logging;
}
