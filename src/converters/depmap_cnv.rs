use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::{Table, is_float};

const CN_FILE: &str = "CCLE_gene_cn.csv";

/// Gene-level copy number. One row per cell line, one column per gene;
/// every numeric cell stands alone, so a bad cell skips only itself.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::csv(dir.file(CN_FILE)?)?;
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
            if symbol.is_empty() || value.is_empty() || !is_float(value) {
                continue;
            }
            let Some(gene) = run.gene(symbol)? else {
                continue;
            };
            let mut record = Item::new("DepMapCopyNumber");
            record.set_reference("cellLine", cell_line);
            record.set_reference("gene", gene);
            record.set_attribute("DepmapCnvValue", value);
            run.store(record)?;
            stored += 1;
        }
    }

    info!(stored, genes = genes.len(), "finished copy number matrix");
    Ok(())
}
