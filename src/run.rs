use crate::error::EtlError;
use crate::genes::GeneCatalog;
use crate::intern::Interner;
use crate::item::{Item, ItemRef, ItemSink};

/// Mutable state for one conversion run: the sink the records land in, the
/// shared gene catalog, and the organism record every gene points at.
/// Converters take a `&mut Run` so nothing about a run outlives it.
pub struct Run<S: ItemSink> {
    sink: S,
    genes: GeneCatalog,
    organisms: Interner,
    taxon: String,
}

impl<S: ItemSink> Run<S> {
    pub fn new(sink: S, genes: GeneCatalog, taxon: &str) -> Self {
        Self {
            sink,
            genes,
            organisms: Interner::new(),
            taxon: taxon.to_string(),
        }
    }

    /// The organism record for the run's taxon, stored on first use.
    pub fn organism(&mut self) -> Result<ItemRef, EtlError> {
        let taxon = self.taxon.clone();
        self.organisms.get_or_create(&taxon, &mut self.sink, || {
            let mut organism = Item::new("Organism");
            organism.set_attribute("taxonId", &taxon);
            organism
        })
    }

    /// Resolve and intern a gene, wiring its organism reference. `None`
    /// means the caller must skip whatever row needed this gene.
    pub fn gene(&mut self, raw: &str) -> Result<Option<ItemRef>, EtlError> {
        let organism = self.organism()?;
        self.genes.lookup(&mut self.sink, raw, organism)
    }

    pub fn store(&mut self, item: Item) -> Result<ItemRef, EtlError> {
        self.sink.store(item)
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}
