use std::path::Path;

use tracing::{info, warn};

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::experiment::{ExperimentConfig, ExperimentContext, store_metadata};
use crate::item::{Item, ItemRef, ItemSink};
use crate::run::Run;
use crate::table::{Table, attr_if_float, attr_if_present};

const NANOCOMPORE_FILE: &str = "out_nanocompore_results.tsv";
const INSIG_FILE: &str = "insigResults.csv";
const SIG_FILE: &str = "sigResultsOrderedByLFC.csv";
const TRANSCRIPT_COUNTS_FILE: &str = "masterTranscriptCounts.txt";

/// Direct-RNA sequencing experiments. Each comparison owns a subdirectory
/// `<treatment>_vs_<control>` under the experiment's directory holding the
/// nanocompore output and the DESeq2-style significance tables.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut configs: Vec<ExperimentConfig> = Vec::new();
    for (_, path) in dir.files_with_extension("json") {
        configs.extend(ExperimentConfig::read_ndjson(path)?);
    }

    for config in configs {
        let short_name = config.experiment.short_name.clone();
        let context = store_metadata(run, &config, "NanoporeExperiment")?;

        let experiment_dir = match dir.subdir(&short_name) {
            Ok(subdir) => subdir,
            Err(_) => {
                warn!(
                    experiment = short_name.as_str(),
                    "no data directory for experiment"
                );
                continue;
            }
        };

        for comparison in &config.comparisons {
            let label = comparison.label();
            let comparison_dir = match experiment_dir.subdir(&label) {
                Ok(subdir) => subdir,
                Err(_) => {
                    warn!(comparison = label.as_str(), "comparison directory not found");
                    continue;
                }
            };
            let sides = (
                comparison.treatment.name.as_str(),
                comparison.control.name.as_str(),
            );
            let (Some(&treatment), Some(&control)) = (
                context.conditions.get(sides.0),
                context.conditions.get(sides.1),
            ) else {
                warn!(comparison = label.as_str(), "comparison names unknown conditions");
                continue;
            };

            if let Some(path) = comparison_dir.optional_file(NANOCOMPORE_FILE) {
                process_nanocompore(run, &context, path, treatment, control)?;
            } else {
                warn!(comparison = label.as_str(), "nanocompore results not found");
            }
            if let Some(path) = comparison_dir.optional_file(INSIG_FILE) {
                process_results(run, &context, path, treatment, control, "NanoporeExperimentInsigResults")?;
            } else {
                warn!(comparison = label.as_str(), "insignificant results not found");
            }
            if let Some(path) = comparison_dir.optional_file(SIG_FILE) {
                process_results(run, &context, path, treatment, control, "NanoporeExperimentSigResults")?;
            } else {
                warn!(comparison = label.as_str(), "significant results not found");
            }
            if let Some(path) = comparison_dir.optional_file(TRANSCRIPT_COUNTS_FILE) {
                process_transcript_counts(run, &context, path, treatment, control)?;
            } else {
                warn!(comparison = label.as_str(), "transcript counts not found");
            }
        }
    }

    Ok(())
}

/// Nanocompore positional layout.
const NC_POS: usize = 0;
const NC_REF_ID: usize = 3;
const NC_REF_KMER: usize = 5;
const NC_GMM_ANOVA_PVALUE: usize = 6;
const NC_GMM_LOGIT_PVALUE: usize = 7;
const NC_KS_DWELL_PVALUE: usize = 8;
const NC_KS_INTENSITY_PVALUE: usize = 9;
const NC_GMM_COV_TYPE: usize = 10;
const NC_GMM_N_CLUST: usize = 11;
const NC_CLUSTER_COUNTS: usize = 12;
const NC_ANOVA_DELTA_LOGIT: usize = 13;
const NC_LOGIT_LOR: usize = 14;

fn process_nanocompore<S: ItemSink>(
    run: &mut Run<S>,
    context: &ExperimentContext,
    path: &Path,
    treatment: ItemRef,
    control: ItemRef,
) -> Result<(), EtlError> {
    let mut table = Table::tsv(path)?;
    let mut stored = 0u64;

    for row in table.rows() {
        let row = row?;
        let field = |index: usize| row.get(index).map(str::trim).filter(|v| !v.is_empty());

        let mut record = Item::new("NanoporeExperimentNanocompore");
        record.set_reference("treatment", treatment);
        record.set_reference("control", control);
        attr_if_float(&mut record, "pos", field(NC_POS));

        // The reference id packs transcript and gene symbol into a
        // pipe-separated GENCODE identifier.
        if let Some(ref_id) = field(NC_REF_ID) {
            let mut parts = ref_id.split('|');
            let transcript = parts.nth(4).unwrap_or("");
            let symbol = parts.next().unwrap_or("");
            if !symbol.is_empty() {
                if let Some(gene) = run.gene(symbol)? {
                    record.set_reference("gene", gene);
                }
            }
            if !transcript.is_empty() {
                record.set_attribute("transcript", transcript);
            }
            record.set_attribute("ref_id", ref_id);
        }

        attr_if_present(&mut record, "ref_kmer", field(NC_REF_KMER));
        attr_if_present(&mut record, "GMM_cov_type", field(NC_GMM_COV_TYPE));
        attr_if_present(&mut record, "cluster_counts", field(NC_CLUSTER_COUNTS));
        attr_if_float(&mut record, "GMM_anova_pvalue", field(NC_GMM_ANOVA_PVALUE));
        attr_if_float(&mut record, "GMM_logit_pvalue", field(NC_GMM_LOGIT_PVALUE));
        attr_if_float(&mut record, "KS_dwell_pvalue", field(NC_KS_DWELL_PVALUE));
        attr_if_float(&mut record, "KS_intensity_pvalue", field(NC_KS_INTENSITY_PVALUE));
        attr_if_float(&mut record, "GMM_n_clust", field(NC_GMM_N_CLUST));
        attr_if_float(&mut record, "Anova_delta_logit", field(NC_ANOVA_DELTA_LOGIT));
        attr_if_float(&mut record, "Logit_LOR", field(NC_LOGIT_LOR));
        record.set_reference("experiment", context.experiment);
        run.store(record)?;
        stored += 1;
    }

    info!(stored, file = %path.display(), "finished nanocompore results");
    Ok(())
}

/// DESeq2-style significance tables, significant and insignificant alike.
const RES_TRANSCRIPT: usize = 1;
const RES_BASE_MEAN: usize = 2;
const RES_LOG2_FOLD_CHANGE: usize = 3;
const RES_LFC_SE: usize = 4;
const RES_STAT: usize = 5;
const RES_PVALUE: usize = 6;
const RES_PADJ: usize = 7;
const RES_FOLD_CHANGE: usize = 8;
const RES_REPLICATES: usize = 9;

fn process_results<S: ItemSink>(
    run: &mut Run<S>,
    context: &ExperimentContext,
    path: &Path,
    treatment: ItemRef,
    control: ItemRef,
    class: &str,
) -> Result<(), EtlError> {
    let mut table = Table::csv(path)?;
    let mut stored = 0u64;

    for row in table.rows() {
        let row = row?;
        let field = |index: usize| row.get(index).map(str::trim).filter(|v| !v.is_empty());
        let Some(transcript) = field(RES_TRANSCRIPT) else {
            continue;
        };

        let mut record = Item::new(class);
        record.set_reference("treatment", treatment);
        record.set_reference("control", control);
        set_transcript_gene(run, &mut record, transcript)?;
        attr_if_float(&mut record, "baseMean", field(RES_BASE_MEAN));
        attr_if_float(&mut record, "log2FoldChange", field(RES_LOG2_FOLD_CHANGE));
        attr_if_float(&mut record, "lfcSE", field(RES_LFC_SE));
        attr_if_float(&mut record, "stat", field(RES_STAT));
        attr_if_float(&mut record, "pvalue", field(RES_PVALUE));
        attr_if_float(&mut record, "padj", field(RES_PADJ));
        attr_if_float(&mut record, "FoldChange", field(RES_FOLD_CHANGE));
        set_replicates(&mut record, |index| field(RES_REPLICATES + index));
        record.set_reference("experiment", context.experiment);
        run.store(record)?;
        stored += 1;
    }

    info!(stored, class, file = %path.display(), "finished nanopore results");
    Ok(())
}

fn process_transcript_counts<S: ItemSink>(
    run: &mut Run<S>,
    context: &ExperimentContext,
    path: &Path,
    treatment: ItemRef,
    control: ItemRef,
) -> Result<(), EtlError> {
    let mut table = Table::tsv(path)?;
    let mut stored = 0u64;

    for row in table.rows() {
        let row = row?;
        let field = |index: usize| row.get(index).map(str::trim).filter(|v| !v.is_empty());
        let Some(transcript) = field(0) else {
            continue;
        };

        let mut record = Item::new("NanoporeExperimentTranscriptCounts");
        record.set_reference("treatment", treatment);
        record.set_reference("control", control);
        set_transcript_gene(run, &mut record, transcript)?;
        set_replicates(&mut record, |index| field(1 + index));
        record.set_reference("experiment", context.experiment);
        run.store(record)?;
        stored += 1;
    }

    info!(stored, file = %path.display(), "finished transcript counts");
    Ok(())
}

/// Transcript names carry the gene symbol before the first dash; the gene
/// reference is best-effort and never skips the record.
fn set_transcript_gene<S: ItemSink>(
    run: &mut Run<S>,
    record: &mut Item,
    transcript: &str,
) -> Result<(), EtlError> {
    let symbol = transcript.split('-').next().unwrap_or("");
    if !symbol.is_empty() {
        if let Some(gene) = run.gene(symbol)? {
            record.set_reference("gene", gene);
        }
    }
    record.set_attribute("transcript", transcript);
    Ok(())
}

/// Barcode columns map to two control and two treatment replicates.
fn set_replicates<'r>(record: &mut Item, field: impl Fn(usize) -> Option<&'r str>) {
    attr_if_float(record, "ControlReplicate1", field(0));
    attr_if_float(record, "ControlReplicate2", field(1));
    attr_if_float(record, "TreatmentReplicate1", field(2));
    attr_if_float(record, "TreatmentReplicate2", field(3));
}
