use std::collections::HashSet;
use std::path::Path;

use tracing::{debug, info};

use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemRef, ItemSink};
use crate::resolver::GeneResolver;

/// Resolution plus interning for genes: the one lookup every converter
/// performs. A raw symbol resolves (or not), optionally passes the external
/// gene-list filter, and on first sight a `Gene` record is stored with the
/// resolved primary identifier as its natural key.
pub struct GeneCatalog {
    resolver: GeneResolver,
    interned: Interner,
    allow_list: Option<HashSet<String>>,
}

impl GeneCatalog {
    pub fn new(resolver: GeneResolver) -> Self {
        Self {
            resolver,
            interned: Interner::new(),
            allow_list: None,
        }
    }

    /// Reads the first CSV column of a gene-list filter file, resolves each
    /// symbol, and keeps the resolved primary identifiers. Unresolvable
    /// symbols are dropped from the list, not errors.
    pub fn load_allow_list(&mut self, path: &Path) -> Result<(), EtlError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path)
            .map_err(|err| EtlError::GeneList(format!("{}: {err}", path.display())))?;

        let mut list = HashSet::new();
        for record in reader.records() {
            let record =
                record.map_err(|err| EtlError::GeneList(format!("{}: {err}", path.display())))?;
            let symbol = record.get(0).unwrap_or("").trim();
            if symbol.is_empty() {
                continue;
            }
            if let Some(primary) = self.resolver.resolve(symbol) {
                list.insert(primary);
            }
        }

        info!(genes = list.len(), path = %path.display(), "loaded gene list filter");
        self.allow_list = Some(list);
        Ok(())
    }

    /// Resolve a raw symbol and return the handle of its interned `Gene`
    /// record. `None` means the row depending on this gene must be skipped:
    /// the symbol is unresolvable or filtered out by the gene list.
    pub fn lookup<S: ItemSink + ?Sized>(
        &mut self,
        sink: &mut S,
        raw: &str,
        organism: ItemRef,
    ) -> Result<Option<ItemRef>, EtlError> {
        let Some(primary) = self.resolver.resolve(raw) else {
            debug!(symbol = raw, "skipping unresolvable gene");
            return Ok(None);
        };
        if let Some(list) = &self.allow_list {
            if !list.contains(&primary) {
                return Ok(None);
            }
        }
        let handle = self.interned.get_or_create(&primary, sink, || {
            let mut gene = Item::new("Gene");
            gene.set_attribute("primaryIdentifier", &primary);
            gene.set_reference("organism", organism);
            gene
        })?;
        Ok(Some(handle))
    }
}
