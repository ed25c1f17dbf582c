pub mod amount;
pub mod consumables;
pub mod descriptor;

pub use amount::{ResourceAmount, ResourceFractions, ResourceUnits};
pub use consumables::{
    CONNECTIONS_RESOURCE_ID, CONNECTIONS_RESOURCE_NAME, CPU_RESOURCE_ID, CPU_RESOURCE_NAME,
    ConsumableId, ConsumableMap, Consumables, GPU_RESOURCE_ID, GPU_RESOURCE_NAME,
    MEM_RESOURCE_ID, MEM_RESOURCE_NAME,
};
pub use descriptor::{
    ComputeDescription, Requirements, ResourceDescription, ResourceKind, ServiceDescription,
};
