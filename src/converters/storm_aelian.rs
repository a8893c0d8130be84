use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::Table;

const MARKERS_FILE: &str = "WTA_markers_after_guide_enrichment_no_threshold.csv";

// Seurat marker output has a blank rowname header, so columns are positional.
const MARKER: usize = 0;
const P_VAL: usize = 1;
const AVG_LOG2_FC: usize = 2;
const P_VAL_ADJ: usize = 5;
const IDENT: usize = 6;

/// Single-cell guide-enrichment markers. Each row links two genes: the
/// marker and the perturbed target it was called against.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::csv(dir.file(MARKERS_FILE)?)?;

    let mut stored = 0u64;
    let mut skipped = 0u64;

    for row in table.rows() {
        let row = row?;
        let field = |index: usize| row.get(index).map(str::trim).filter(|v| !v.is_empty());

        let (Some(marker), Some(p_val), Some(avg_log2_fc), Some(p_val_adj), Some(ident)) = (
            field(MARKER),
            field(P_VAL),
            field(AVG_LOG2_FC),
            field(P_VAL_ADJ),
            field(IDENT),
        ) else {
            skipped += 1;
            continue;
        };

        let Some(marker_gene) = run.gene(marker)? else {
            skipped += 1;
            continue;
        };
        let Some(ident_gene) = run.gene(ident)? else {
            skipped += 1;
            continue;
        };

        let mut record = Item::new("StormAelianData");
        record.set_reference("marker", marker_gene);
        record.set_reference("ident", ident_gene);
        record.set_attribute("p_val", p_val);
        record.set_attribute("avg_log2FC", avg_log2_fc);
        record.set_attribute("p_val_adj", p_val_adj);
        run.store(record)?;
        stored += 1;
    }

    info!(stored, skipped, "finished guide-enrichment markers");
    Ok(())
}
