use std::fs;

use storm_etl::converters::Source;
use storm_etl::dir::DataDir;
use storm_etl::genes::GeneCatalog;
use storm_etl::item::MemorySink;
use storm_etl::resolver::{GeneResolver, ResolutionMode};
use storm_etl::run::Run;

fn passthrough_run() -> Run<MemorySink> {
    let resolver = GeneResolver::new("9606", None, ResolutionMode::Passthrough);
    Run::new(MemorySink::new(), GeneCatalog::new(resolver), "9606")
}

#[test]
fn rnaseq_experiment_loads_comparisons_and_gene_counts() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("experiments.json"),
        r#"{"experiment":{"short name":"expA","project":"epitranscriptomics"},"conditions":{"treated":{"treatments":["STM2457"]},"control":{}},"comparisons":[{"treatment":{"name":"treated"},"control":{"name":"control"}}]}"#,
    )
    .unwrap();

    let exp_dir = temp.path().join("expA");
    fs::create_dir(&exp_dir).unwrap();
    fs::write(
        exp_dir.join("treated_vs_control_DESeq2.tsv"),
        "ensembl\tbaseMean\tlog2FoldChange\tlfcSE\tstat\tpvalue\tpadj\n\
         ENSG00000141510.11\t120.5\t1.8\t0.2\t5.1\t0.00001\t0.0004\n\
         ENSG00000012048.20\t80.0\t-0.5\t0.1\t-2.0\tNA\tNA\n",
    )
    .unwrap();
    fs::write(
        exp_dir.join("salmon.merged.gene_counts.tsv"),
        "gene_id\tgene_name\tSRR001\tSRR002\n\
         ENSG00000141510\tTP53\t101.5\tNA\n",
    )
    .unwrap();

    let mut run = passthrough_run();
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::StormRnaseq.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    assert_eq!(sink.count("RNASeqExperimentMetadata"), 1);
    assert_eq!(sink.count("RNASeqExperimentCondition"), 2);

    let comparisons = sink.of_class("RNASeqExperimentComparison");
    assert_eq!(comparisons.len(), 2);
    assert_eq!(comparisons[0].attribute("padj"), Some("0.0004"));
    // Non-numeric DESeq2 statistics are left off the record, not fatal.
    assert!(comparisons[1].attribute("pvalue").is_none());
    assert!(comparisons[0].reference("experiment").is_some());
    assert!(comparisons[0].reference("treatment").is_some());

    // The versioned Ensembl id resolves on the bare accession.
    let genes = sink.of_class("Gene");
    assert!(genes
        .iter()
        .any(|gene| gene.attribute("primaryIdentifier") == Some("ENSG00000141510")));

    let counts = sink.of_class("RNASeqExperimentGeneCount");
    assert_eq!(counts.len(), 2);
    assert_eq!(counts[0].attribute("run"), Some("SRR001"));
    assert_eq!(counts[0].attribute("count"), Some("101.5"));
    assert!(counts[1].attribute("count").is_none());
}

#[test]
fn rnaseq_experiment_without_data_directory_keeps_metadata() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("experiments.json"),
        r#"{"experiment":{"short name":"ghost"},"conditions":{"a":{}},"comparisons":[]}"#,
    )
    .unwrap();

    let mut run = passthrough_run();
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::StormRnaseq.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    assert_eq!(sink.count("RNASeqExperimentMetadata"), 1);
    assert_eq!(sink.count("RNASeqExperimentComparison"), 0);
}

#[test]
fn nanopore_comparison_reads_significant_results() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("experiments.json"),
        r#"{"experiment":{"short name":"nano1"},"conditions":{"ko":{},"wt":{}},"comparisons":[{"treatment":{"name":"ko"},"control":{"name":"wt"}}]}"#,
    )
    .unwrap();

    let comparison_dir = temp.path().join("nano1").join("ko_vs_wt");
    fs::create_dir_all(&comparison_dir).unwrap();
    fs::write(
        comparison_dir.join("sigResultsOrderedByLFC.csv"),
        ",transcript,baseMean,log2FoldChange,lfcSE,stat,pvalue,padj,FoldChange,b1,b2,b3,b4\n\
         1,TP53-201,100.0,1.5,0.2,4.0,0.001,0.002,2.8,10,12,9,11\n",
    )
    .unwrap();

    let mut run = passthrough_run();
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::StormNanopore.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    assert_eq!(sink.count("NanoporeExperimentMetadata"), 1);
    let results = sink.of_class("NanoporeExperimentSigResults");
    assert_eq!(results.len(), 1);

    let result = results[0];
    assert_eq!(result.attribute("transcript"), Some("TP53-201"));
    assert_eq!(result.attribute("FoldChange"), Some("2.8"));
    assert_eq!(result.attribute("ControlReplicate1"), Some("10"));
    assert_eq!(result.attribute("TreatmentReplicate2"), Some("11"));
    // The gene symbol before the dash resolves to a gene reference.
    assert!(result.reference("gene").is_some());

    // The missing nanocompore and count files are skipped, not fatal.
    assert_eq!(sink.count("NanoporeExperimentNanocompore"), 0);
    assert_eq!(sink.count("NanoporeExperimentTranscriptCounts"), 0);
}
