use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::error::EtlError;

/// Opaque handle to a stored record, usable as a reference target by
/// records stored later in the same run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ItemRef(u64);

/// A typed record under construction: a class name, string attributes and
/// references to previously stored records.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    class: String,
    attributes: BTreeMap<String, String>,
    references: BTreeMap<String, ItemRef>,
}

impl Item {
    pub fn new(class: impl Into<String>) -> Self {
        Self {
            class: class.into(),
            attributes: BTreeMap::new(),
            references: BTreeMap::new(),
        }
    }

    pub fn class(&self) -> &str {
        &self.class
    }

    pub fn set_attribute(&mut self, name: &str, value: impl Into<String>) {
        self.attributes.insert(name.to_string(), value.into());
    }

    pub fn set_reference(&mut self, name: &str, target: ItemRef) {
        self.references.insert(name.to_string(), target);
    }

    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    pub fn reference(&self, name: &str) -> Option<ItemRef> {
        self.references.get(name).copied()
    }
}

/// Persistence seam. Stores a finished record and hands back the handle
/// other records use to reference it. Failures are fatal for the run.
pub trait ItemSink {
    fn store(&mut self, item: Item) -> Result<ItemRef, EtlError>;
}

#[derive(Serialize)]
struct StoredItem<'a> {
    id: u64,
    #[serde(flatten)]
    item: &'a Item,
}

#[derive(Serialize)]
struct RunHeader<'a> {
    source: &'a str,
    dataset_title: &'a str,
    taxon: &'a str,
    started_at: String,
}

/// Line-delimited JSON sink. Records go to a temp file next to the target
/// path and are persisted atomically on `finish`, so an aborted run never
/// leaves a truncated output file behind.
pub struct NdjsonSink {
    writer: BufWriter<tempfile::NamedTempFile>,
    target: PathBuf,
    next_id: u64,
    stored: u64,
}

impl NdjsonSink {
    pub fn create(
        target: &Path,
        source: &str,
        dataset_title: &str,
        taxon: &str,
    ) -> Result<Self, EtlError> {
        let parent = target.parent().filter(|p| !p.as_os_str().is_empty());
        if let Some(parent) = parent {
            fs::create_dir_all(parent).map_err(|err| EtlError::Filesystem(err.to_string()))?;
        }
        let temp = tempfile::Builder::new()
            .prefix("storm-etl-items")
            .tempfile_in(parent.unwrap_or_else(|| Path::new(".")))
            .map_err(|err| EtlError::Filesystem(err.to_string()))?;

        let mut sink = Self {
            writer: BufWriter::new(temp),
            target: target.to_path_buf(),
            next_id: 1,
            stored: 0,
        };
        let header = RunHeader {
            source,
            dataset_title,
            taxon,
            started_at: chrono::Utc::now().to_rfc3339(),
        };
        sink.write_line(&header)?;
        Ok(sink)
    }

    fn write_line(&mut self, value: &impl Serialize) -> Result<(), EtlError> {
        let line =
            serde_json::to_string(value).map_err(|err| EtlError::Store(err.to_string()))?;
        self.writer
            .write_all(line.as_bytes())
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|err| EtlError::Store(err.to_string()))
    }

    pub fn finish(self) -> Result<u64, EtlError> {
        let stored = self.stored;
        let temp = self
            .writer
            .into_inner()
            .map_err(|err| EtlError::Store(err.to_string()))?;
        if self.target.exists() {
            fs::remove_file(&self.target)
                .map_err(|err| EtlError::Filesystem(err.to_string()))?;
        }
        temp.persist(&self.target)
            .map_err(|err| EtlError::Filesystem(err.to_string()))?;
        Ok(stored)
    }
}

impl ItemSink for NdjsonSink {
    fn store(&mut self, item: Item) -> Result<ItemRef, EtlError> {
        let id = self.next_id;
        self.write_line(&StoredItem { id, item: &item })?;
        self.next_id += 1;
        self.stored += 1;
        Ok(ItemRef(id))
    }
}

/// In-memory sink used by the test suite: counts persists per class and can
/// inject persistence failures for selected classes.
#[derive(Default)]
pub struct MemorySink {
    items: Vec<Item>,
    fail_classes: HashSet<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_class(&mut self, class: &str) {
        self.fail_classes.insert(class.to_string());
    }

    pub fn of_class(&self, class: &str) -> Vec<&Item> {
        self.items
            .iter()
            .filter(|item| item.class() == class)
            .collect()
    }

    pub fn count(&self, class: &str) -> usize {
        self.of_class(class).len()
    }

    pub fn item(&self, handle: ItemRef) -> &Item {
        &self.items[(handle.0 - 1) as usize]
    }
}

impl ItemSink for MemorySink {
    fn store(&mut self, item: Item) -> Result<ItemRef, EtlError> {
        if self.fail_classes.contains(item.class()) {
            return Err(EtlError::Store(format!(
                "store rejected {} record",
                item.class()
            )));
        }
        self.items.push(item);
        Ok(ItemRef(self.items.len() as u64))
    }
}
