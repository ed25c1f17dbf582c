use crate::define_id_type;

// Logical operation that a task asks to execute
define_id_type!(CoreId, u32);

// Position of an implementation inside the implementation list of its core
define_id_type!(ImplId, u32);

// A resource (master or worker) that can host data replicas
define_id_type!(NodeId, u32);

define_id_type!(CopyId, u64);
