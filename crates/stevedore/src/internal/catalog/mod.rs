mod definition;
mod registry;

pub use definition::{CatalogDefinition, CoreEntryDefinition, ImplementationDefinition};
pub use registry::{CatalogRegistry, CatalogUpdate};

use crate::internal::common::index::IndexVec;
use crate::internal::common::resources::Requirements;
use crate::{CoreId, ImplId};
use std::sync::Arc;

/// One concrete way to execute a core.
#[derive(Debug)]
pub struct Implementation {
    core_id: CoreId,
    impl_id: ImplId,
    signature: String,
    requirements: Requirements,
}

impl Implementation {
    pub fn new(
        core_id: CoreId,
        impl_id: ImplId,
        signature: String,
        requirements: Requirements,
    ) -> Self {
        Implementation {
            core_id,
            impl_id,
            signature,
            requirements,
        }
    }

    #[inline]
    pub fn core_id(&self) -> CoreId {
        self.core_id
    }

    #[inline]
    pub fn impl_id(&self) -> ImplId {
        self.impl_id
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[inline]
    pub fn requirements(&self) -> &Requirements {
        &self.requirements
    }
}

#[derive(Debug, Clone)]
pub struct CoreDefinition {
    core_id: CoreId,
    signature: String,
    implementations: Vec<Arc<Implementation>>,
}

impl CoreDefinition {
    #[inline]
    pub fn core_id(&self) -> CoreId {
        self.core_id
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    #[inline]
    pub fn implementations(&self) -> &[Arc<Implementation>] {
        &self.implementations
    }
}

/// Immutable snapshot of all registered cores.
///
/// Snapshots are never mutated; registering a core produces a new snapshot
/// with a higher version. Workers recompute their tables against an explicit
/// snapshot.
#[derive(Debug, Clone, Default)]
pub struct CoreCatalog {
    version: u64,
    cores: IndexVec<CoreId, CoreDefinition>,
}

pub type CoreCatalogRef = Arc<CoreCatalog>;

impl CoreCatalog {
    #[inline]
    pub fn version(&self) -> u64 {
        self.version
    }

    #[inline]
    pub fn core_count(&self) -> usize {
        self.cores.len()
    }

    pub fn core(&self, core_id: CoreId) -> Option<&CoreDefinition> {
        self.cores.get_at(core_id)
    }

    /// Implementations of a core in registration order; empty for unknown cores.
    pub fn implementations_of(&self, core_id: CoreId) -> &[Arc<Implementation>] {
        self.core(core_id)
            .map(|c| c.implementations())
            .unwrap_or_default()
    }

    pub fn find_core(&self, signature: &str) -> Option<CoreId> {
        self.cores
            .iter()
            .find(|c| c.signature == signature)
            .map(|c| c.core_id)
    }

    pub fn core_ids(&self) -> impl Iterator<Item = CoreId> + '_ {
        self.cores.iter().map(|c| c.core_id)
    }

    pub fn cores(&self) -> &[CoreDefinition] {
        &self.cores
    }
}
