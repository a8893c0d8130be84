use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::{ColumnMap, Table, attr_if_present};

const ASSOCIATIONS_FILE: &str = "curated_gene_disease_associations.tsv";

const COLUMNS: &[&str] = &[
    "geneSymbol",
    "diseaseId",
    "diseaseName",
    "diseaseType",
    "score",
];
const GENE_SYMBOL: usize = 0;
const DISEASE_ID: usize = 1;
const DISEASE_NAME: usize = 2;
const DISEASE_TYPE: usize = 3;
const SCORE: usize = 4;

/// Curated gene-disease associations. The disease record is interned as
/// soon as the row names it, even when the gene later fails to resolve.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::tsv(dir.file(ASSOCIATIONS_FILE)?)?;
    let columns = ColumnMap::resolve(table.headers(), COLUMNS, table.file())?;

    let mut diseases = Interner::new();
    let mut stored = 0u64;
    let mut skipped = 0u64;

    for row in table.rows() {
        let row = row?;
        let Some(disease_id) = columns.get(&row, DISEASE_ID) else {
            skipped += 1;
            continue;
        };
        let name = columns.get(&row, DISEASE_NAME);
        let disease_type = columns.get(&row, DISEASE_TYPE);
        let disease = diseases.get_or_create(disease_id, run.sink_mut(), || {
            let mut disease = Item::new("Disease");
            disease.set_attribute("primaryIdentifier", disease_id);
            disease.set_attribute("diseaseId", disease_id);
            attr_if_present(&mut disease, "name", name);
            attr_if_present(&mut disease, "diseaseType", disease_type);
            disease
        })?;

        let Some(symbol) = columns.get(&row, GENE_SYMBOL) else {
            skipped += 1;
            continue;
        };
        let Some(gene) = run.gene(symbol)? else {
            skipped += 1;
            continue;
        };

        let mut association = Item::new("DiseaseAssociation");
        association.set_reference("gene", gene);
        association.set_reference("disease", disease);
        attr_if_present(&mut association, "associationScore", columns.get(&row, SCORE));
        run.store(association)?;
        stored += 1;
    }

    info!(stored, skipped, "finished disease associations");
    Ok(())
}
