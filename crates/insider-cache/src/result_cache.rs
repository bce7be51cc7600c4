use std::collections::VecDeque;
use std::sync::Arc;

use insider_models::{Dataset, QueryDescriptor};
use tracing::{debug, info};

/// A fetched dataset and the descriptor it was fetched under.
#[derive(Debug, Clone)]
pub struct CachedEntry {
    pub descriptor: QueryDescriptor,
    pub dataset: Arc<Dataset>,
    /// Monotonic insertion sequence number.
    pub seq: u64,
}

/// Bounded retention window of fetched datasets.
///
/// Entries are kept in insertion order and evicted oldest-first once the
/// capacity is exceeded. Lookups do not refresh an entry's position.
/// The cache holds no lock; callers serialize `insert` and `clear`.
pub struct ResultCache {
    entries: VecDeque<CachedEntry>,
    capacity: Option<usize>,
    max_rows: u32,
    next_seq: u64,
}

impl ResultCache {
    /// `capacity` of `Some(0)` disables caching, `None` never evicts.
    /// `max_rows` is the result cap a fetch must have been made at to be reusable.
    pub fn new(capacity: Option<usize>, max_rows: u32) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity,
            max_rows,
            next_seq: 0,
        }
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }

    pub fn max_rows(&self) -> u32 {
        self.max_rows
    }

    pub fn is_disabled(&self) -> bool {
        self.capacity == Some(0)
    }

    /// Find a cached dataset whose fetch scope covers `request`.
    /// Newest entries are checked first.
    pub fn find_covering(&self, request: &QueryDescriptor) -> Option<Arc<Dataset>> {
        let hit = self
            .entries
            .iter()
            .rev()
            .find(|entry| entry.descriptor.covers(request, self.max_rows));

        match hit {
            Some(entry) => {
                debug!(
                    request = %request,
                    cached = %entry.descriptor,
                    seq = entry.seq,
                    "Covering entry found"
                );
                Some(Arc::clone(&entry.dataset))
            }
            None => {
                debug!(request = %request, entries = self.entries.len(), "No covering entry");
                None
            }
        }
    }

    /// Append a freshly fetched dataset, evicting the oldest entries
    /// beyond capacity.
    pub fn insert(&mut self, descriptor: QueryDescriptor, dataset: Arc<Dataset>) {
        if self.is_disabled() {
            debug!(fetch_key = %descriptor.fetch_key(), "Caching disabled, entry dropped");
            return;
        }

        let seq = self.next_seq;
        self.next_seq += 1;
        debug!(fetch_key = %descriptor.fetch_key(), seq, rows = dataset.len(), "Caching dataset");
        self.entries.push_back(CachedEntry {
            descriptor,
            dataset,
            seq,
        });

        if let Some(capacity) = self.capacity {
            while self.entries.len() > capacity {
                if let Some(evicted) = self.entries.pop_front() {
                    info!(
                        fetch_key = %evicted.descriptor.fetch_key(),
                        seq = evicted.seq,
                        "Evicted oldest cache entry"
                    );
                }
            }
        }
    }

    /// Drop every entry. Idempotent.
    pub fn clear(&mut self) {
        let dropped = self.entries.len();
        self.entries.clear();
        info!(dropped, "Cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries from oldest to newest.
    pub fn entries(&self) -> impl Iterator<Item = &CachedEntry> {
        self.entries.iter()
    }
}
