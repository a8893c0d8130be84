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
fn dgidb_loads_catalogue_then_interactions() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("drugs.tsv"),
        "drug_name\tchembl_id\tdrug_claim_source\n\
         IMATINIB\tCHEMBL941\tTTD\n",
    )
    .unwrap();
    fs::write(
        temp.path().join("interactions.tsv"),
        "gene_name\tinteraction_types\tdrug_chembl_id\tPMIDs\n\
         ABL1\tinhibitor\tCHEMBL941\t11423618\n\
         KIT\tinhibitor\tCHEMBL999\t\n\
         \tinhibitor\tCHEMBL941\t123\n",
    )
    .unwrap();

    let mut run = passthrough_run();
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::Dgidb.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    // CHEMBL941 from the catalogue, CHEMBL999 as a minimal record.
    assert_eq!(sink.count("Drug"), 2);
    assert_eq!(sink.count("DrugInteraction"), 2);
    assert_eq!(sink.count("Publication"), 1);

    let catalogued = sink
        .of_class("Drug")
        .into_iter()
        .find(|drug| drug.attribute("primaryIdentifier") == Some("CHEMBL941"))
        .unwrap();
    assert_eq!(catalogued.attribute("name"), Some("IMATINIB"));

    let minimal = sink
        .of_class("Drug")
        .into_iter()
        .find(|drug| drug.attribute("primaryIdentifier") == Some("CHEMBL999"))
        .unwrap();
    assert!(minimal.attribute("name").is_none());

    let interactions = sink.of_class("DrugInteraction");
    assert!(interactions[0].reference("publication").is_some());
    assert!(interactions[1].reference("publication").is_none());
}

fn association_line(symbol: &str, disease: &str, labels: &str, overall: f64) -> String {
    format!(
        r#"{{"target":{{"gene_info":{{"symbol":"{symbol}"}}}},"association_score":{{"overall":{overall},"datatypes":{{"literature":0.1,"rna_expression":0.2,"genetic_association":0.3,"somatic_mutation":0.4,"known_drug":0.5,"animal_model":0.6,"affected_pathway":0.7}}}},"evidence_count":{{"datatypes":{{"literature":1.0,"rna_expression":2.0,"genetic_association":3.0,"somatic_mutation":4.0,"known_drug":5.0,"animal_model":6.0,"affected_pathway":7.0}}}},"disease":{{"id":"{disease}","efo_info":{{"therapeutic_area":{{"labels":[{labels}]}}}}}}}}"#
    )
}

#[test]
fn opentargets_deduplicates_therapeutic_areas_per_disease() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("disease_list.csv"),
        "EFO_0000222,acute myeloid leukemia\n",
    )
    .unwrap();

    let associations = [
        association_line("TP53", "EFO_0000222", r#""blood","cancer""#, 0.9),
        association_line("KRAS", "EFO_0000222", r#""blood""#, 0.4),
    ]
    .join("\n");
    fs::write(temp.path().join("association_data.json"), associations).unwrap();

    let mut run = passthrough_run();
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::Opentargets.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    assert_eq!(sink.count("Disease"), 1);
    assert_eq!(sink.count("OpenTargetsAssociation"), 2);
    // "blood" appears in both lines but is related to the disease once.
    assert_eq!(sink.count("DiseaseTherapeuticAreaRelation"), 2);

    let association = sink.of_class("OpenTargetsAssociation")[0];
    assert_eq!(association.attribute("overallAssociationScore"), Some("0.9"));
    assert_eq!(association.attribute("knownDrugCount"), Some("5"));
    assert!(association.reference("disease").is_some());
}

#[test]
fn tcga_samples_default_missing_columns_to_not_specified() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(
        temp.path().join("TCGA_phenotype_denseDataOnlyDownload.tsv"),
        "sample\tsample_type_id\tsample_type\t_primary_disease\n\
         TCGA-AB-0001-03\t3\tPrimary Blood Derived Cancer\tacute myeloid leukemia\n\
         TCGA-AB-0002-03\t\t\t\n",
    )
    .unwrap();

    let mut run = passthrough_run();
    let dir = DataDir::scan(temp.path()).unwrap();
    Source::TcgaSampleMetadata.convert(&mut run, &dir).unwrap();

    let sink = run.into_sink();
    let samples = sink.of_class("TCGASample");
    assert_eq!(samples.len(), 2);
    assert_eq!(samples[0].attribute("SampleType"), Some("Primary Blood Derived Cancer"));
    assert_eq!(samples[1].attribute("SampleTypeID"), Some("Not specified"));
    assert_eq!(samples[1].attribute("PrimaryDisease"), Some("Not specified"));
}
