//! Registry holding the live set of probe targets.

use arc_swap::ArcSwap;
use std::sync::Arc;
use tracing::info;

use crate::domain::target::Target;

/// The live target set shared between the discovery path and the scheduler.
///
/// Uses `ArcSwap` so a replacement publishes a whole new set in one atomic
/// pointer swap. Readers never take a lock and always observe either the
/// entirely-old or the entirely-new set.
#[derive(Debug)]
pub struct TargetRegistry {
    targets: ArcSwap<Vec<Target>>,
}

impl TargetRegistry {
    /// Create a registry with the initial set of targets.
    pub fn new(initial_targets: Vec<Target>) -> Self {
        Self {
            targets: ArcSwap::from_pointee(initial_targets),
        }
    }

    /// Atomically replace the entire set of targets.
    pub fn replace(&self, new_targets: Vec<Target>) {
        let count = new_targets.len();
        self.targets.store(Arc::new(new_targets));
        info!(count, "checker targets updated");
    }

    /// Retrieve a snapshot of all current targets.
    ///
    /// The returned set is immutable: later calls to [`TargetRegistry::replace`]
    /// publish a new allocation and never touch a snapshot already handed out.
    pub fn snapshot(&self) -> Arc<Vec<Target>> {
        self.targets.load_full()
    }

    /// Number of targets in the current set.
    pub fn len(&self) -> usize {
        self.targets.load().len()
    }

    /// Whether the current set is empty.
    pub fn is_empty(&self) -> bool {
        self.targets.load().is_empty()
    }
}

impl Default for TargetRegistry {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// A shared reference to the target registry.
pub type SharedTargetRegistry = Arc<TargetRegistry>;
