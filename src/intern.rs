use std::collections::HashMap;

use crate::error::EtlError;
use crate::item::{Item, ItemRef, ItemSink};

/// Maps a natural key to the handle of the record created for it, creating
/// and persisting on first encounter. First write wins: once a key is
/// interned, later calls return the cached handle without invoking the
/// build closure, so the persist side effect happens at most once per key
/// per run. A failed persist leaves the key uncached.
#[derive(Debug, Default)]
pub struct Interner {
    map: HashMap<String, ItemRef>,
}

impl Interner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_create<S: ItemSink + ?Sized>(
        &mut self,
        key: &str,
        sink: &mut S,
        build: impl FnOnce() -> Item,
    ) -> Result<ItemRef, EtlError> {
        if let Some(&handle) = self.map.get(key) {
            return Ok(handle);
        }
        let handle = sink.store(build())?;
        self.map.insert(key.to_string(), handle);
        Ok(handle)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::item::MemorySink;

    #[test]
    fn builds_at_most_once_per_key() {
        let mut sink = MemorySink::new();
        let mut interner = Interner::new();
        let mut builds = 0;

        let first = interner
            .get_or_create("ACH-000001", &mut sink, || {
                builds += 1;
                let mut item = Item::new("CellLine");
                item.set_attribute("DepMapID", "ACH-000001");
                item
            })
            .unwrap();

        for _ in 0..3 {
            let again = interner
                .get_or_create("ACH-000001", &mut sink, || {
                    builds += 1;
                    Item::new("CellLine")
                })
                .unwrap();
            assert_eq!(first, again);
        }

        assert_eq!(builds, 1);
        assert_eq!(sink.count("CellLine"), 1);
    }

    #[test]
    fn distinct_keys_never_share_a_handle() {
        let mut sink = MemorySink::new();
        let mut interner = Interner::new();

        let a = interner
            .get_or_create("ACH-000001", &mut sink, || Item::new("CellLine"))
            .unwrap();
        let b = interner
            .get_or_create("ACH-000002", &mut sink, || Item::new("CellLine"))
            .unwrap();

        assert_ne!(a, b);
        assert_eq!(interner.len(), 2);
    }

    #[test]
    fn failed_persist_leaves_key_uncached() {
        let mut sink = MemorySink::new();
        sink.fail_class("Drug");
        let mut interner = Interner::new();

        let err = interner
            .get_or_create("CHEMBL25", &mut sink, || Item::new("Drug"))
            .unwrap_err();
        assert_matches!(err, EtlError::Store(_));
        assert!(!interner.contains("CHEMBL25"));

        // a retry within the same run attempts creation again
        let mut sink = MemorySink::new();
        interner
            .get_or_create("CHEMBL25", &mut sink, || Item::new("Drug"))
            .unwrap();
        assert!(interner.contains("CHEMBL25"));
    }
}
