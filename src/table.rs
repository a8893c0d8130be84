use std::fs::File;
use std::path::Path;

use csv::StringRecord;

use crate::error::EtlError;
use crate::item::Item;

pub const NOT_SPECIFIED: &str = "Not specified";

/// Delimited-text reader shared by every converter. Rows are surfaced as
/// `csv::StringRecord`s; ragged rows are tolerated because several upstream
/// dumps trail off mid-line.
pub struct Table {
    file: String,
    reader: csv::Reader<File>,
    headers: StringRecord,
}

impl Table {
    pub fn open(path: &Path, delimiter: u8) -> Result<Self, EtlError> {
        let file = path.display().to_string();
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .flexible(true)
            .from_path(path)
            .map_err(|err| EtlError::Table {
                file: file.clone(),
                message: err.to_string(),
            })?;
        let headers = reader
            .headers()
            .map_err(|err| EtlError::Table {
                file: file.clone(),
                message: err.to_string(),
            })?
            .clone();
        Ok(Self {
            file,
            reader,
            headers,
        })
    }

    pub fn csv(path: &Path) -> Result<Self, EtlError> {
        Self::open(path, b',')
    }

    pub fn tsv(path: &Path) -> Result<Self, EtlError> {
        Self::open(path, b'\t')
    }

    pub fn file(&self) -> &str {
        &self.file
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    pub fn rows(&mut self) -> impl Iterator<Item = Result<StringRecord, EtlError>> + '_ {
        let file = self.file.clone();
        self.reader.records().map(move |record| {
            record.map_err(|err| EtlError::Table {
                file: file.clone(),
                message: err.to_string(),
            })
        })
    }
}

/// Declared header-to-index mapping. Every converter names the columns it
/// needs up front; a missing one fails the whole run before any row is read.
#[derive(Debug)]
pub struct ColumnMap {
    indexes: Vec<usize>,
}

impl ColumnMap {
    /// Resolve the named columns against a header row, case-insensitively.
    /// The returned map is indexed by position in `columns`.
    pub fn resolve(headers: &StringRecord, columns: &[&str], file: &str) -> Result<Self, EtlError> {
        let mut indexes = Vec::with_capacity(columns.len());
        for column in columns {
            let found = headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(column));
            match found {
                Some(index) => indexes.push(index),
                None => {
                    return Err(EtlError::MissingColumn {
                        file: file.to_string(),
                        column: column.to_string(),
                    });
                }
            }
        }
        Ok(Self { indexes })
    }

    /// Field for the `slot`-th declared column, trimmed; `None` when the row
    /// is too short or the cell is blank.
    pub fn get<'r>(&self, row: &'r StringRecord, slot: usize) -> Option<&'r str> {
        let value = row.get(self.indexes[slot])?.trim();
        if value.is_empty() { None } else { Some(value) }
    }
}

pub fn is_float(value: &str) -> bool {
    value.trim().parse::<f64>().is_ok()
}

pub fn is_integer(value: &str) -> bool {
    value.trim().parse::<i64>().is_ok()
}

/// Set the attribute from the cell, or `"Not specified"` when it is absent.
pub fn attr_or_not_specified(item: &mut Item, name: &str, value: Option<&str>) {
    item.set_attribute(name, value.unwrap_or(NOT_SPECIFIED));
}

/// Set the attribute only when the cell carries a value.
pub fn attr_if_present(item: &mut Item, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        item.set_attribute(name, value);
    }
}

/// Set the attribute only when the cell parses as a float.
pub fn attr_if_float(item: &mut Item, name: &str, value: Option<&str>) {
    if let Some(value) = value {
        if is_float(value) {
            item.set_attribute(name, value.trim());
        }
    }
}
