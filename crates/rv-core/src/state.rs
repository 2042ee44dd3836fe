//! Persisted pointer to the currently-applied revision.

use crate::error::StateResult;
use crate::revision::Revision;

/// Storage for the chain state: the revision currently applied to the
/// database, or `None` when nothing is applied.
///
/// Callers must hold an exclusive lock on the underlying store for the
/// duration of a migration; two migrators racing on the same store would
/// corrupt the recorded revision. The engine itself does no locking.
pub trait ChainStateStore {
    /// Read the current revision.
    fn current(&self) -> StateResult<Option<Revision>>;

    /// Persist a new current revision. Must be durable before returning.
    fn set(&mut self, revision: Option<&Revision>) -> StateResult<()>;
}

/// In-process store, for tests and offline runs.
///
/// Every write is also appended to a log so callers can check that the
/// state moved exactly once per completed step.
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    current: Option<Revision>,
    writes: Vec<Option<Revision>>,
}

impl MemoryStateStore {
    /// Empty store (state at base)
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that starts at `revision` without recording a write
    pub fn at(revision: Option<Revision>) -> Self {
        Self {
            current: revision,
            writes: Vec::new(),
        }
    }

    /// All values written so far, oldest first
    pub fn writes(&self) -> &[Option<Revision>] {
        &self.writes
    }
}

impl ChainStateStore for MemoryStateStore {
    fn current(&self) -> StateResult<Option<Revision>> {
        Ok(self.current.clone())
    }

    fn set(&mut self, revision: Option<&Revision>) -> StateResult<()> {
        self.current = revision.cloned();
        self.writes.push(self.current.clone());
        Ok(())
    }
}
