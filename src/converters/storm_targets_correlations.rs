use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::{Table, attr_if_float, attr_if_present};

const GENE_1: usize = 0;
const GENE_2: usize = 1;
const NSIZE: usize = 2;
const CORRELATION: usize = 3;
const PVALUE: usize = 4;
const FDR: usize = 5;

/// Pairwise gene correlations. Each immediate subdirectory is one
/// experiment type and every CSV inside it contributes rows tagged with
/// that type.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut stored = 0u64;
    let mut skipped = 0u64;

    let subdirs: Vec<(String, std::path::PathBuf)> = dir
        .subdirs()
        .map(|(name, path)| (name.to_string(), path.to_path_buf()))
        .collect();

    for (experiment_type, path) in subdirs {
        let subdir = DataDir::scan(&path)?;
        for (_, file) in subdir.files_with_extension("csv") {
            let mut table = Table::csv(file)?;
            for row in table.rows() {
                let row = row?;
                let gene1 = super::gene_token(row.get(GENE_1).unwrap_or(""));
                let gene2 = super::gene_token(row.get(GENE_2).unwrap_or(""));
                if gene1.is_empty() || gene2.is_empty() {
                    skipped += 1;
                    continue;
                }
                let Some(first) = run.gene(gene1)? else {
                    skipped += 1;
                    continue;
                };
                let Some(second) = run.gene(gene2)? else {
                    skipped += 1;
                    continue;
                };

                let field =
                    |index: usize| row.get(index).map(str::trim).filter(|v| !v.is_empty());
                let mut record = Item::new("STORMTargetCorrelations");
                record.set_reference("gene1", first);
                record.set_reference("gene2", second);
                record.set_attribute("experimentType", experiment_type.as_str());
                attr_if_present(&mut record, "nsize", field(NSIZE));
                attr_if_float(&mut record, "correlation", field(CORRELATION));
                attr_if_float(&mut record, "pvalue", field(PVALUE));
                attr_if_float(&mut record, "fdr", field(FDR));
                run.store(record)?;
                stored += 1;
            }
        }
    }

    info!(stored, skipped, "finished target correlations");
    Ok(())
}
