use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::Table;

const EXPRESSION_FILE: &str = "CCLE_expression_full.csv";

/// Expression matrix, one row per cell line and one gene per column.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::csv(dir.file(EXPRESSION_FILE)?)?;
    let genes: Vec<String> = table
        .headers()
        .iter()
        .skip(1)
        .map(|header| super::gene_token(header).to_string())
        .collect();

    let mut cell_lines = Interner::new();
    let mut stored = 0u64;

    for row in table.rows() {
        let row = row?;
        let Some(depmap_id) = row.get(0).map(str::trim).filter(|id| !id.is_empty()) else {
            continue;
        };
        let cell_line = super::cell_line(run, &mut cell_lines, depmap_id)?;

        for (offset, symbol) in genes.iter().enumerate() {
            let Some(value) = row.get(offset + 1).map(str::trim) else {
                continue;
            };
            if symbol.is_empty() || value.is_empty() {
                continue;
            }
            let Some(gene) = run.gene(symbol)? else {
                continue;
            };
            let mut record = Item::new("DepMapExpression");
            record.set_reference("DepMapID", cell_line);
            record.set_reference("gene", gene);
            record.set_attribute("value", value);
            run.store(record)?;
            stored += 1;
        }
    }

    info!(stored, genes = genes.len(), "finished expression matrix");
    Ok(())
}
