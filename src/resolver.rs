use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::EtlError;

/// Species-scoped gene symbol dictionary. A symbol may map to zero, one or
/// several primary identifiers; only the exactly-one case is usable.
pub trait SymbolSource {
    fn has_taxon(&self, taxon: &str) -> bool;
    fn resolutions(&self, taxon: &str, symbol: &str) -> Result<Vec<String>, EtlError>;
}

/// What `resolve` does when no dictionary covers the taxon: pass raw
/// symbols through unchanged, or refuse to resolve anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionMode {
    Strict,
    Passthrough,
}

/// Resolves raw gene symbols to canonical primary identifiers, memoizing
/// successes and permanently caching failures. Ambiguous symbols (zero or
/// several dictionary matches) are unresolvable for the rest of the run.
pub struct GeneResolver {
    taxon: String,
    source: Option<Box<dyn SymbolSource>>,
    mode: ResolutionMode,
    resolved: HashMap<String, String>,
    unresolvable: HashSet<String>,
}

impl GeneResolver {
    pub fn new(taxon: &str, source: Option<Box<dyn SymbolSource>>, mode: ResolutionMode) -> Self {
        Self {
            taxon: taxon.to_string(),
            source,
            mode,
            resolved: HashMap::new(),
            unresolvable: HashSet::new(),
        }
    }

    pub fn resolve(&mut self, raw: &str) -> Option<String> {
        if self.unresolvable.contains(raw) {
            return None;
        }
        if let Some(id) = self.resolved.get(raw) {
            return Some(id.clone());
        }

        let source = self
            .source
            .as_ref()
            .filter(|source| source.has_taxon(&self.taxon));
        let Some(source) = source else {
            return match self.mode {
                ResolutionMode::Passthrough => Some(raw.to_string()),
                ResolutionMode::Strict => None,
            };
        };

        match source.resolutions(&self.taxon, raw) {
            Ok(mut matches) if matches.len() == 1 => {
                let id = matches.remove(0);
                self.resolved.insert(raw.to_string(), id.clone());
                Some(id)
            }
            Ok(matches) => {
                warn!(
                    symbol = raw,
                    count = matches.len(),
                    "failed to resolve gene to one identifier, ignoring gene"
                );
                self.unresolvable.insert(raw.to_string());
                None
            }
            Err(err) => {
                // dictionary errors are not cached: a later call may succeed
                warn!(symbol = raw, error = %err, "symbol dictionary query failed");
                None
            }
        }
    }
}

/// TSV-backed symbol dictionary: one `taxon <TAB> symbol <TAB> primary_id`
/// entry per line. Repeated (taxon, symbol) lines record ambiguity.
pub struct FileSymbolSource {
    entries: HashMap<(String, String), Vec<String>>,
    taxa: HashSet<String>,
}

impl FileSymbolSource {
    pub fn load(path: &Path) -> Result<Self, EtlError> {
        let content = fs::read_to_string(path).map_err(|err| {
            EtlError::SymbolDictionary(format!("{}: {err}", path.display()))
        })?;

        let mut entries: HashMap<(String, String), Vec<String>> = HashMap::new();
        let mut taxa = HashSet::new();
        for (number, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.split('\t');
            let (Some(taxon), Some(symbol), Some(primary)) =
                (fields.next(), fields.next(), fields.next())
            else {
                return Err(EtlError::SymbolDictionary(format!(
                    "{}: line {} has fewer than 3 fields",
                    path.display(),
                    number + 1
                )));
            };
            taxa.insert(taxon.to_string());
            entries
                .entry((taxon.to_string(), symbol.to_string()))
                .or_default()
                .push(primary.to_string());
        }

        Ok(Self { entries, taxa })
    }
}

impl SymbolSource for FileSymbolSource {
    fn has_taxon(&self, taxon: &str) -> bool {
        self.taxa.contains(taxon)
    }

    fn resolutions(&self, taxon: &str, symbol: &str) -> Result<Vec<String>, EtlError> {
        Ok(self
            .entries
            .get(&(taxon.to_string(), symbol.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}
