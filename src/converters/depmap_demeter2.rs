use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemRef, ItemSink};
use crate::run::Run;
use crate::table::{Table, is_float};

const SCORES_FILE: &str = "D2_combined_gene_dep_scores.csv";

/// DEMETER2 dependency scores. Transposed relative to the other DepMap
/// matrices: one row per gene, one column per CCLE-named cell line.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::csv(dir.file(SCORES_FILE)?)?;
    let cell_line_names: Vec<String> = table
        .headers()
        .iter()
        .skip(1)
        .map(|header| header.trim().to_string())
        .collect();

    let mut cell_lines = Interner::new();
    let mut stored = 0u64;

    for row in table.rows() {
        let row = row?;
        let symbol = super::gene_token(row.get(0).unwrap_or(""));
        if symbol.is_empty() {
            continue;
        }
        let Some(gene) = run.gene(symbol)? else {
            continue;
        };

        for (offset, ccle_name) in cell_line_names.iter().enumerate() {
            let Some(value) = row.get(offset + 1).map(str::trim) else {
                continue;
            };
            if ccle_name.is_empty() || value.is_empty() || !is_float(value) {
                continue;
            }
            let cell_line = ccle_cell_line(run, &mut cell_lines, ccle_name)?;
            let mut record = Item::new("DEMETER2Dependency");
            record.set_reference("CCLEName", cell_line);
            record.set_reference("gene", gene);
            record.set_attribute("DepMapDEMETER2DependencyValue", value);
            run.store(record)?;
            stored += 1;
        }
    }

    info!(
        stored,
        cell_lines = cell_line_names.len(),
        "finished DEMETER2 dependency matrix"
    );
    Ok(())
}

/// This matrix names cell lines by CCLE name rather than DepMap identifier.
fn ccle_cell_line<S: ItemSink>(
    run: &mut Run<S>,
    cell_lines: &mut Interner,
    ccle_name: &str,
) -> Result<ItemRef, EtlError> {
    cell_lines.get_or_create(ccle_name, run.sink_mut(), || {
        let mut item = Item::new("CellLine");
        item.set_attribute("CCLEname", ccle_name);
        item
    })
}
