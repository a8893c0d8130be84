use std::fs;
use std::path::Path;

use storm_etl::converters::Source;
use storm_etl::dir::DataDir;
use storm_etl::genes::GeneCatalog;
use storm_etl::item::MemorySink;
use storm_etl::resolver::{FileSymbolSource, GeneResolver, ResolutionMode};
use storm_etl::run::Run;

const MUTATION_HEADER: &str = "Hugo_Symbol,Chromosome,Start_position,End_position,Strand,\
Variant_Classification,Variant_Type,Genome_Change,Annotation_Transcript,isDeleterious,\
isTCGAhotspot,TCGAhsCnt,isCOSMIChotspot,COSMIChsCnt,Variant_annotation,DepMap_ID";

fn dictionary_run(dictionary: &Path) -> Run<MemorySink> {
    let source = FileSymbolSource::load(dictionary).unwrap();
    let resolver = GeneResolver::new("9606", Some(Box::new(source)), ResolutionMode::Strict);
    Run::new(MemorySink::new(), GeneCatalog::new(resolver), "9606")
}

fn passthrough_run() -> Run<MemorySink> {
    let resolver = GeneResolver::new("9606", None, ResolutionMode::Passthrough);
    Run::new(MemorySink::new(), GeneCatalog::new(resolver), "9606")
}

#[test]
fn mutation_row_with_resolvable_gene_emits_one_record() {
    let temp = tempfile::tempdir().unwrap();
    let dictionary = temp.path().join("symbols.tsv");
    fs::write(&dictionary, "9606\tTP53\tENSG00000141510\n").unwrap();

    fs::write(
        temp.path().join("CCLE_mutations.csv"),
        format!(
            "{MUTATION_HEADER}\n\
             TP53,17,7675000,7675100,+,Missense_Mutation,SNP,g.chr17:7675088C>T,\
             ENST00000269305,True,True,44,True,112,damaging,ACH-000001\n"
        ),
    )
    .unwrap();

    let mut run = dictionary_run(&dictionary);
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::DepmapCcleMutations.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    assert_eq!(sink.count("CellLine"), 1);
    assert_eq!(sink.count("Gene"), 1);
    assert_eq!(sink.count("DepMapMutations"), 1);

    let gene = sink.of_class("Gene")[0];
    assert_eq!(gene.attribute("primaryIdentifier"), Some("ENSG00000141510"));
    assert!(gene.reference("organism").is_some());

    let mutation = sink.of_class("DepMapMutations")[0];
    assert_eq!(mutation.attribute("Chromosome"), Some("17"));
    assert_eq!(mutation.attribute("VariantClassification"), Some("Missense_Mutation"));
    assert!(mutation.reference("cellLine").is_some());
    assert!(mutation.reference("gene").is_some());
}

#[test]
fn ambiguous_gene_keeps_cell_line_but_drops_mutations() {
    let temp = tempfile::tempdir().unwrap();
    let dictionary = temp.path().join("symbols.tsv");
    // Two candidates for the same symbol make it permanently unresolvable.
    fs::write(
        &dictionary,
        "9606\tDUP1\tENSG00000000001\n9606\tDUP1\tENSG00000000002\n",
    )
    .unwrap();

    fs::write(
        temp.path().join("CCLE_mutations.csv"),
        format!(
            "{MUTATION_HEADER}\n\
             DUP1,1,100,200,+,Silent,SNP,g.chr1:150A>G,ENST1,False,False,0,False,0,other,ACH-000002\n\
             DUP1,1,300,400,+,Silent,SNP,g.chr1:350A>G,ENST1,False,False,0,False,0,other,ACH-000002\n"
        ),
    )
    .unwrap();

    let mut run = dictionary_run(&dictionary);
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::DepmapCcleMutations.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    assert_eq!(sink.count("CellLine"), 1);
    assert_eq!(sink.count("Gene"), 0);
    assert_eq!(sink.count("DepMapMutations"), 0);
}

#[test]
fn copy_number_matrix_skips_only_the_bad_cell() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("CCLE_gene_cn.csv"),
        ",TP53 (7157),BRCA1 (672)\n\
         ACH-000001,1.5,NA\n\
         ACH-000002,0.8,2.5\n",
    )
    .unwrap();

    let mut run = passthrough_run();
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::DepmapCnv.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    assert_eq!(sink.count("CellLine"), 2);
    // The NA cell is dropped; the three numeric cells all land.
    assert_eq!(sink.count("DepMapCopyNumber"), 3);

    let values: Vec<&str> = sink
        .of_class("DepMapCopyNumber")
        .iter()
        .filter_map(|item| item.attribute("DepmapCnvValue"))
        .collect();
    assert_eq!(values, vec!["1.5", "0.8", "2.5"]);
}

#[test]
fn unresolvable_column_gene_keeps_the_other_columns() {
    let temp = tempfile::tempdir().unwrap();
    let dictionary = temp.path().join("symbols.tsv");
    fs::write(
        &dictionary,
        "9606\tTP53\tENSG00000141510\n\
         9606\tDUP1\tENSG00000000001\n\
         9606\tDUP1\tENSG00000000002\n",
    )
    .unwrap();

    fs::write(
        temp.path().join("CCLE_gene_cn.csv"),
        ",TP53 (7157),DUP1 (999)\n\
         ACH-000001,1.5,2.0\n\
         ACH-000002,0.7,0.9\n",
    )
    .unwrap();

    let mut run = dictionary_run(&dictionary);
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::DepmapCnv.convert(&mut run, &dir).unwrap();

    // The ambiguous column loses its cells; the resolvable column keeps
    // every numeric cell in both rows.
    let sink = run.into_sink();
    assert_eq!(sink.count("Gene"), 1);
    assert_eq!(sink.count("DepMapCopyNumber"), 2);
    let values: Vec<&str> = sink
        .of_class("DepMapCopyNumber")
        .iter()
        .filter_map(|item| item.attribute("DepmapCnvValue"))
        .collect();
    assert_eq!(values, vec!["1.5", "0.7"]);
}

#[test]
fn missing_input_file_fails_the_run() {
    let temp = tempfile::tempdir().unwrap();
    let mut run = passthrough_run();
    let dir = DataDir::scan(temp.path()).unwrap();

    let result = Source::DepmapCnv.convert(&mut run, &dir);
    assert!(result.is_err());
}
