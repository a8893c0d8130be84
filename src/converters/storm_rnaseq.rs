use std::path::Path;

use tracing::{info, warn};

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::experiment::{ExperimentConfig, ExperimentContext, store_metadata};
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::{ColumnMap, Table, attr_if_float};

const GENE_COUNTS_FILE: &str = "salmon.merged.gene_counts.tsv";

const DESEQ2_COLUMNS: &[&str] = &[
    "ensembl",
    "baseMean",
    "log2FoldChange",
    "lfcSE",
    "stat",
    "pvalue",
    "padj",
];
const ENSEMBL: usize = 0;
const BASE_MEAN: usize = 1;
const LOG2_FOLD_CHANGE: usize = 2;
const LFC_SE: usize = 3;
const STAT: usize = 4;
const PVALUE: usize = 5;
const PADJ: usize = 6;

/// Differential-expression experiments. Every `.json` file in the data
/// directory describes experiments whose DESeq2 comparisons and gene
/// counts live in a subdirectory named after the experiment's short name.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut configs: Vec<(String, ExperimentConfig)> = Vec::new();
    for (name, path) in dir.files_with_extension("json") {
        for config in ExperimentConfig::read_ndjson(path)? {
            configs.push((name.to_string(), config));
        }
    }

    for (config_file, config) in configs {
        let short_name = config.experiment.short_name.clone();
        let context = store_metadata(run, &config, "RNASeqExperiment")?;

        let experiment_dir = match dir.subdir(&short_name) {
            Ok(subdir) => subdir,
            Err(_) => {
                warn!(
                    experiment = short_name.as_str(),
                    config = config_file.as_str(),
                    "no data directory for experiment"
                );
                continue;
            }
        };

        for comparison in &config.comparisons {
            let file_name = format!("{}_DESeq2.tsv", comparison.label());
            let Some(path) = experiment_dir.optional_file(&file_name) else {
                warn!(file = file_name.as_str(), "comparison table not found");
                continue;
            };
            process_comparison(
                run,
                &context,
                path,
                &comparison.treatment.name,
                &comparison.control.name,
            )?;
        }

        match experiment_dir.optional_file(GENE_COUNTS_FILE) {
            Some(path) => process_gene_counts(run, &context, path)?,
            None => warn!(
                experiment = short_name.as_str(),
                "gene counts table not found"
            ),
        }
    }

    Ok(())
}

fn process_comparison<S: ItemSink>(
    run: &mut Run<S>,
    context: &ExperimentContext,
    path: &Path,
    treatment: &str,
    control: &str,
) -> Result<(), EtlError> {
    let (Some(&treatment_ref), Some(&control_ref)) = (
        context.conditions.get(treatment),
        context.conditions.get(control),
    ) else {
        warn!(treatment, control, "comparison names unknown conditions");
        return Ok(());
    };

    let mut table = Table::tsv(path)?;
    let columns = ColumnMap::resolve(table.headers(), DESEQ2_COLUMNS, table.file())?;
    let mut stored = 0u64;

    for row in table.rows() {
        let row = row?;
        let Some(ensembl) = columns.get(&row, ENSEMBL) else {
            continue;
        };
        // Versioned Ensembl ids resolve on the bare accession.
        let accession = ensembl.split('.').next().unwrap_or(ensembl);
        let Some(gene) = run.gene(accession)? else {
            continue;
        };

        let mut record = Item::new("RNASeqExperimentComparison");
        record.set_reference("gene", gene);
        record.set_reference("treatment", treatment_ref);
        record.set_reference("control", control_ref);
        attr_if_float(&mut record, "baseMean", columns.get(&row, BASE_MEAN));
        attr_if_float(
            &mut record,
            "log2FoldChange",
            columns.get(&row, LOG2_FOLD_CHANGE),
        );
        attr_if_float(&mut record, "lfcSE", columns.get(&row, LFC_SE));
        attr_if_float(&mut record, "stat", columns.get(&row, STAT));
        attr_if_float(&mut record, "pvalue", columns.get(&row, PVALUE));
        attr_if_float(&mut record, "padj", columns.get(&row, PADJ));
        record.set_reference("experiment", context.experiment);
        run.store(record)?;
        stored += 1;
    }

    info!(stored, treatment, control, "finished DESeq2 comparison");
    Ok(())
}

/// Salmon gene counts: gene id, gene name, then one column per run.
fn process_gene_counts<S: ItemSink>(
    run: &mut Run<S>,
    context: &ExperimentContext,
    path: &Path,
) -> Result<(), EtlError> {
    let mut table = Table::tsv(path)?;
    let runs: Vec<String> = table
        .headers()
        .iter()
        .skip(2)
        .map(|header| header.trim().to_string())
        .collect();

    let mut stored = 0u64;
    for row in table.rows() {
        let row = row?;
        let symbol = row.get(1).unwrap_or("").trim();
        if symbol.is_empty() {
            continue;
        }
        let Some(gene) = run.gene(symbol)? else {
            continue;
        };

        for (offset, run_name) in runs.iter().enumerate() {
            if run_name.is_empty() {
                continue;
            }
            let Some(count) = row.get(offset + 2).map(str::trim) else {
                continue;
            };
            let mut record = Item::new("RNASeqExperimentGeneCount");
            record.set_reference("gene", gene);
            record.set_attribute("run", run_name.as_str());
            attr_if_float(&mut record, "count", Some(count));
            record.set_reference("experiment", context.experiment);
            run.store(record)?;
            stored += 1;
        }
    }

    info!(stored, runs = runs.len(), "finished gene counts");
    Ok(())
}
