//! In-memory record stores backing the list screens.

use std::sync::{Arc, Mutex};

use arbiter_api::{apply_filters, Criteria, Record, RecordPage};

/// Thread-safe in-memory store for one record listing, holding the pages fetched
/// so far together with the active filter criteria. Filtering runs locally over
/// the cached snapshot so criteria changes never require a refetch.
pub struct RecordStore<R, C> {
    inner: Arc<Mutex<Inner<R, C>>>,
}

struct Inner<R, C> {
    records: Vec<R>,
    criteria: C,
    total: u64,
    page: u32,
}

impl<R, C> Clone for RecordStore<R, C> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R, C: Default> Default for RecordStore<R, C> {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Inner {
                records: Vec::new(),
                criteria: C::default(),
                total: 0,
                page: 0,
            })),
        }
    }
}

impl<R, C> RecordStore<R, C>
where
    R: Record + Clone,
    C: Criteria<R> + Clone + Default,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the cached records with the first page of a fresh listing.
    pub fn begin(&self, page: RecordPage<R>) {
        let mut inner = self.inner.lock().unwrap();
        inner.records = page.data;
        inner.total = page.total;
        inner.page = 1;
    }

    /// Appends a follow-up page to the cached records.
    pub fn extend(&self, page: RecordPage<R>) {
        let mut inner = self.inner.lock().unwrap();
        inner.records.extend(page.data);
        inner.total = page.total;
        inner.page += 1;
    }

    pub fn set_criteria(&self, criteria: C) {
        self.inner.lock().unwrap().criteria = criteria;
    }

    pub fn criteria(&self) -> C {
        self.inner.lock().unwrap().criteria.clone()
    }

    /// Returns the cached records matching the active criteria, in fetch order.
    pub fn visible(&self) -> Vec<R> {
        let inner = self.inner.lock().unwrap();
        apply_filters(&inner.records, &inner.criteria)
    }

    /// Returns a cloned snapshot of all cached records, unfiltered.
    pub fn snapshot(&self) -> Vec<R> {
        self.inner.lock().unwrap().records.clone()
    }

    /// Finds a record by id in the current cache.
    pub fn find(&self, id: i64) -> Option<R> {
        self.inner
            .lock()
            .unwrap()
            .records
            .iter()
            .find(|r| r.record_id() == id)
            .cloned()
    }

    /// Swaps in a confirmed update for the stale cached copy. Returns false when
    /// the record is not cached.
    pub fn replace(&self, record: R) -> bool {
        let mut inner = self.inner.lock().unwrap();
        match inner
            .records
            .iter_mut()
            .find(|r| r.record_id() == record.record_id())
        {
            Some(slot) => {
                *slot = record;
                true
            }
            None => false,
        }
    }

    /// Total matches reported by the backend, across all pages.
    pub fn total(&self) -> u64 {
        self.inner.lock().unwrap().total
    }

    pub fn page(&self) -> u32 {
        self.inner.lock().unwrap().page
    }

    /// True while the backend holds pages this store has not fetched yet.
    pub fn has_more(&self) -> bool {
        let inner = self.inner.lock().unwrap();
        (inner.records.len() as u64) < inner.total
    }
}
