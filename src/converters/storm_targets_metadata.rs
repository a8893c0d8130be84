use std::collections::HashMap;

use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::{Table, attr_if_present};

const TARGETS_FILE: &str = "storm_targets.csv";
const CATEGORIES_FILE: &str = "storm_targets_categories.csv";

const GENE: usize = 0;
const MODIFICATION: usize = 8;
const TYPE_ABBREVIATION: usize = 9;
const NOTES: usize = 10;

/// Target list plus a category legend. A target row only survives when its
/// category abbreviation appears in the legend.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut categories = HashMap::new();
    let mut legend = Table::csv(dir.file(CATEGORIES_FILE)?)?;
    for row in legend.rows() {
        let row = row?;
        let abbreviation = row.get(0).unwrap_or("").trim();
        let name = row.get(1).unwrap_or("").trim();
        if abbreviation.is_empty() || name.is_empty() {
            continue;
        }
        categories
            .entry(abbreviation.to_string())
            .or_insert_with(|| name.to_string());
    }

    let mut table = Table::csv(dir.file(TARGETS_FILE)?)?;
    let mut stored = 0u64;
    let mut skipped = 0u64;

    for row in table.rows() {
        let row = row?;
        let abbreviation = row.get(TYPE_ABBREVIATION).unwrap_or("").trim();
        let Some(type_name) = categories.get(abbreviation) else {
            skipped += 1;
            continue;
        };
        let symbol = row.get(GENE).unwrap_or("").trim();
        if symbol.is_empty() {
            skipped += 1;
            continue;
        }
        let Some(gene) = run.gene(symbol)? else {
            skipped += 1;
            continue;
        };

        let mut target = Item::new("STORMTarget");
        target.set_reference("gene", gene);
        target.set_attribute("TypeAbbreviation", abbreviation);
        target.set_attribute("TypeName", type_name);
        attr_if_present(
            &mut target,
            "Modification",
            row.get(MODIFICATION).map(str::trim).filter(|v| !v.is_empty()),
        );
        attr_if_present(
            &mut target,
            "Notes",
            row.get(NOTES).map(str::trim).filter(|v| !v.is_empty()),
        );
        run.store(target)?;
        stored += 1;
    }

    info!(stored, skipped, categories = categories.len(), "finished targets metadata");
    Ok(())
}
