use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemRef, ItemSink};
use crate::run::Run;
use crate::table::{ColumnMap, Table, attr_if_present};

const DRUGS_FILE: &str = "drugs.tsv";
const INTERACTIONS_FILE: &str = "interactions.tsv";

const DRUG_COLUMNS: &[&str] = &["drug_name", "chembl_id", "drug_claim_source"];
const DRUG_NAME: usize = 0;
const DRUG_CHEMBL: usize = 1;
const DRUG_SOURCE: usize = 2;

const INTERACTION_COLUMNS: &[&str] = &[
    "gene_name",
    "interaction_types",
    "drug_chembl_id",
    "PMIDs",
];
const GENE_NAME: usize = 0;
const INTERACTION_TYPE: usize = 1;
const INTERACTION_CHEMBL: usize = 2;
const PMIDS: usize = 3;

/// Drug-gene interactions. The drug catalogue loads first so interactions
/// can reference fully described drugs; an interaction naming a drug the
/// catalogue missed still gets a minimal record keyed by ChEMBL id.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut drugs = Interner::new();
    let mut publications = Interner::new();

    let mut catalogued = 0u64;
    let mut drugs_table = Table::tsv(dir.file(DRUGS_FILE)?)?;
    let drug_columns = ColumnMap::resolve(drugs_table.headers(), DRUG_COLUMNS, drugs_table.file())?;
    for row in drugs_table.rows() {
        let row = row?;
        let Some(chembl_id) = drug_columns.get(&row, DRUG_CHEMBL) else {
            continue;
        };
        let name = drug_columns.get(&row, DRUG_NAME);
        let source = drug_columns.get(&row, DRUG_SOURCE);
        drugs.get_or_create(chembl_id, run.sink_mut(), || {
            let mut drug = Item::new("Drug");
            drug.set_attribute("primaryIdentifier", chembl_id);
            attr_if_present(&mut drug, "name", name);
            attr_if_present(&mut drug, "source", source);
            drug
        })?;
        catalogued += 1;
    }

    let mut stored = 0u64;
    let mut table = Table::tsv(dir.file(INTERACTIONS_FILE)?)?;
    let columns = ColumnMap::resolve(table.headers(), INTERACTION_COLUMNS, table.file())?;
    for row in table.rows() {
        let row = row?;
        let Some(symbol) = columns.get(&row, GENE_NAME) else {
            continue;
        };
        let Some(chembl_id) = columns.get(&row, INTERACTION_CHEMBL) else {
            continue;
        };
        let Some(interaction_type) = columns.get(&row, INTERACTION_TYPE) else {
            continue;
        };
        let Some(gene) = run.gene(symbol)? else {
            continue;
        };
        let drug = minimal_drug(run, &mut drugs, chembl_id)?;

        let mut interaction = Item::new("DrugInteraction");
        interaction.set_reference("gene", gene);
        interaction.set_reference("drug", drug);
        interaction.set_attribute("type", interaction_type);
        if let Some(pubmed_id) = columns.get(&row, PMIDS) {
            let publication = publication(run, &mut publications, pubmed_id)?;
            interaction.set_reference("publication", publication);
        }
        run.store(interaction)?;
        stored += 1;
    }

    info!(catalogued, stored, "finished drug-gene interactions");
    Ok(())
}

fn minimal_drug<S: ItemSink>(
    run: &mut Run<S>,
    drugs: &mut Interner,
    chembl_id: &str,
) -> Result<ItemRef, EtlError> {
    drugs.get_or_create(chembl_id, run.sink_mut(), || {
        let mut drug = Item::new("Drug");
        drug.set_attribute("primaryIdentifier", chembl_id);
        drug
    })
}

fn publication<S: ItemSink>(
    run: &mut Run<S>,
    publications: &mut Interner,
    pubmed_id: &str,
) -> Result<ItemRef, EtlError> {
    publications.get_or_create(pubmed_id, run.sink_mut(), || {
        let mut publication = Item::new("Publication");
        publication.set_attribute("pubMedId", pubmed_id);
        publication
    })
}
