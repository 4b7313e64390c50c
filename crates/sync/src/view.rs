use std::collections::HashMap;

use tracing::warn;

use studyhall_core::{Document, Record, Stored};

/// The locally materialized, sorted projection of a subscription's latest
/// snapshot.
///
/// Every applied snapshot fully replaces the previous list; there is no
/// incremental patching, so the view can never diverge from what the
/// gateway last delivered.
#[derive(Debug, Clone)]
pub struct LiveView<T: Document> {
    items: Vec<Stored<T>>,
}

impl<T: Document> Default for LiveView<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Document> LiveView<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Replace the list with the given snapshot: decode, dedup by id (last
    /// occurrence wins), sort by the document's ordering.
    ///
    /// Records that no longer decode into `T` are skipped with a warning so
    /// one bad record cannot take down the whole panel.
    pub fn apply_snapshot(&mut self, records: &[Record]) {
        let mut index: HashMap<String, usize> = HashMap::with_capacity(records.len());
        let mut items: Vec<Stored<T>> = Vec::with_capacity(records.len());
        for record in records {
            match Stored::<T>::decode(record) {
                Ok(stored) => match index.get(&stored.id) {
                    Some(&at) => items[at] = stored,
                    None => {
                        index.insert(stored.id.clone(), items.len());
                        items.push(stored);
                    }
                },
                Err(e) => {
                    warn!(kind = T::KIND, id = %record.id, "skipping undecodable record: {e}");
                }
            }
        }
        items.sort_by(T::order);
        self.items = items;
    }

    /// Read-only view in display order.
    pub fn items(&self) -> &[Stored<T>] {
        &self.items
    }

    pub fn get(&self, id: &str) -> Option<&Stored<T>> {
        self.items.iter().find(|s| s.id == id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
