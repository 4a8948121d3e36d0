use std::ops::Deref;
use std::sync::{Arc, Weak};

use parking_lot::RwLock;

use crate::Trajectory;

/// Append-only collection of trajectories. Clones share the same underlying store.
///
/// Appends build a new list and publish it with a single pointer swap, so a `Snapshot` taken at any
/// moment only ever sees fully formed entries.
#[derive(Clone, Default)]
pub struct TrajectoryStore {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    current: RwLock<Arc<Vec<Arc<Trajectory>>>>,
}

impl Inner {
    fn append(&self, trajectory: Trajectory) -> usize {
        let entry = Arc::new(trajectory);
        let mut current = self.current.write();
        let mut next = Vec::with_capacity(current.len() + 1);
        next.extend(current.iter().cloned());
        next.push(entry);
        let idx = next.len() - 1;
        *current = Arc::new(next);
        idx
    }
}

impl TrajectoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the index of the new entry
    pub fn append(&self, trajectory: Trajectory) -> usize {
        let label = trajectory.label.clone();
        let idx = self.inner.append(trajectory);
        debug!("Stored trajectory {} as #{}", label, idx);
        idx
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            entries: self.inner.current.read().clone(),
        }
    }

    pub fn len(&self) -> usize {
        self.inner.current.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// A handle for ingestion that doesn't keep the store alive
    pub fn writer(&self) -> StoreWriter {
        StoreWriter {
            inner: Arc::downgrade(&self.inner),
        }
    }
}

/// Weak append handle. Once every `TrajectoryStore` handle is dropped, appends are discarded.
#[derive(Clone)]
pub struct StoreWriter {
    inner: Weak<Inner>,
}

impl StoreWriter {
    /// None if the store no longer exists
    pub fn append(&self, trajectory: Trajectory) -> Option<usize> {
        let inner = self.inner.upgrade()?;
        let label = trajectory.label.clone();
        let idx = inner.append(trajectory);
        debug!("Stored trajectory {} as #{}", label, idx);
        Some(idx)
    }

    pub fn is_closed(&self) -> bool {
        self.inner.strong_count() == 0
    }
}

/// A point-in-time view of the store. Cheap to clone; later appends never show up here.
#[derive(Clone, Default)]
pub struct Snapshot {
    entries: Arc<Vec<Arc<Trajectory>>>,
}

impl Deref for Snapshot {
    type Target = [Arc<Trajectory>];

    fn deref(&self) -> &Self::Target {
        &self.entries
    }
}
