use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemRef, ItemSink};
use crate::run::Run;
use crate::table::{Table, is_float};

const QUANT_FILE: &str = "protein_quant_current_normalized.csv";

// Leading columns carry protein annotation; quantitation columns start here.
const QUANT_START: usize = 48;

const PROTEIN_ID: usize = 0;
const GENE_SYMBOL: usize = 1;
const UNIPROT_ID: usize = 4;

/// Normalized protein quantitation per cell line. Column headers carry the
/// CCLE name with a `_Ten` plex suffix that is stripped before interning.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::csv(dir.file(QUANT_FILE)?)?;
    let cell_line_names: Vec<String> = table
        .headers()
        .iter()
        .skip(QUANT_START)
        .map(|header| {
            header
                .split("_Ten")
                .next()
                .unwrap_or("")
                .trim()
                .to_string()
        })
        .collect();

    let mut cell_lines = Interner::new();
    let mut stored = 0u64;

    for row in table.rows() {
        let row = row?;
        let symbol = row.get(GENE_SYMBOL).unwrap_or("").trim();
        if symbol.is_empty() {
            continue;
        }
        let Some(gene) = run.gene(symbol)? else {
            continue;
        };
        let protein_id = row.get(PROTEIN_ID).unwrap_or("").trim();
        let uniprot_id = row.get(UNIPROT_ID).unwrap_or("").trim();
        if protein_id.is_empty() || uniprot_id.is_empty() {
            continue;
        }

        for (offset, ccle_name) in cell_line_names.iter().enumerate() {
            let Some(value) = row.get(QUANT_START + offset).map(str::trim) else {
                continue;
            };
            if ccle_name.is_empty() || value.is_empty() || !is_float(value) {
                continue;
            }
            let cell_line = ccle_cell_line(run, &mut cell_lines, ccle_name)?;
            let mut record = Item::new("DepMapProteomics");
            record.set_reference("cellLine", cell_line);
            record.set_reference("gene", gene);
            record.set_attribute("ProteinID", protein_id);
            record.set_attribute("ProteinUniprotID", uniprot_id);
            record.set_attribute("ProteinQuantitation", value);
            run.store(record)?;
            stored += 1;
        }
    }

    info!(stored, "finished proteomics matrix");
    Ok(())
}

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
