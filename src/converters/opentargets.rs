use std::collections::{HashMap, HashSet};
use std::io::BufRead;

use serde::Deserialize;
use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemRef, ItemSink};
use crate::run::Run;
use crate::table::Table;

const DISEASES_FILE: &str = "disease_list.csv";
const ASSOCIATIONS_FILE: &str = "association_data.json";

#[derive(Deserialize)]
struct Association {
    target: Target,
    association_score: AssociationScore,
    evidence_count: EvidenceCount,
    disease: Disease,
}

#[derive(Deserialize)]
struct Target {
    gene_info: GeneInfo,
}

#[derive(Deserialize)]
struct GeneInfo {
    symbol: String,
}

#[derive(Deserialize)]
struct AssociationScore {
    overall: f64,
    datatypes: DataTypeValues,
}

#[derive(Deserialize)]
struct EvidenceCount {
    datatypes: DataTypeValues,
}

#[derive(Deserialize)]
struct DataTypeValues {
    literature: f64,
    rna_expression: f64,
    genetic_association: f64,
    somatic_mutation: f64,
    known_drug: f64,
    animal_model: f64,
    affected_pathway: f64,
}

#[derive(Deserialize)]
struct Disease {
    id: String,
    efo_info: EfoInfo,
}

#[derive(Deserialize)]
struct EfoInfo {
    therapeutic_area: TherapeuticArea,
}

#[derive(Deserialize)]
struct TherapeuticArea {
    #[serde(default)]
    labels: Vec<String>,
}

/// Gene-disease association scores. The disease list loads first; the
/// association stream is newline-delimited JSON, one association per line.
/// Therapeutic-area relations are emitted once per disease and label, and
/// go in before the gene gate so an unresolvable gene does not lose them.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut diseases = Interner::new();

    let mut table = Table::csv(dir.file(DISEASES_FILE)?)?;
    for row in table.rows() {
        let row = row?;
        let Some(disease_id) = row.get(0).map(str::trim).filter(|id| !id.is_empty()) else {
            continue;
        };
        let name = row.get(1).unwrap_or("").trim();
        diseases.get_or_create(disease_id, run.sink_mut(), || {
            let mut disease = Item::new("Disease");
            disease.set_attribute("primaryIdentifier", disease_id);
            disease.set_attribute("diseaseId", disease_id);
            disease.set_attribute("diseaseName", name);
            disease.set_attribute("diseaseType", "NA");
            disease
        })?;
    }

    let associations_path = dir.file(ASSOCIATIONS_FILE)?;
    let file_label = associations_path.display().to_string();
    let reader = std::fs::File::open(associations_path).map_err(|err| EtlError::Json {
        file: file_label.clone(),
        message: err.to_string(),
    })?;

    let mut seen_areas: HashMap<String, HashSet<String>> = HashMap::new();
    let mut stored = 0u64;

    for line in std::io::BufReader::new(reader).lines() {
        let line = line.map_err(|err| EtlError::Json {
            file: file_label.clone(),
            message: err.to_string(),
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let association: Association =
            serde_json::from_str(&line).map_err(|err| EtlError::Json {
                file: file_label.clone(),
                message: err.to_string(),
            })?;

        let disease_id = association.disease.id.as_str();
        let disease = minimal_disease(run, &mut diseases, disease_id)?;

        let seen = seen_areas.entry(disease_id.to_string()).or_default();
        for label in &association.disease.efo_info.therapeutic_area.labels {
            if !seen.insert(label.clone()) {
                continue;
            }
            let mut relation = Item::new("DiseaseTherapeuticAreaRelation");
            relation.set_reference("disease", disease);
            relation.set_attribute("therapeuticArea", label);
            run.store(relation)?;
        }

        let Some(gene) = run.gene(&association.target.gene_info.symbol)? else {
            continue;
        };

        let scores = &association.association_score.datatypes;
        let counts = &association.evidence_count.datatypes;
        let mut record = Item::new("OpenTargetsAssociation");
        record.set_reference("gene", gene);
        record.set_reference("disease", disease);
        record.set_attribute(
            "overallAssociationScore",
            association.association_score.overall.to_string(),
        );
        record.set_attribute("literatureScore", scores.literature.to_string());
        record.set_attribute("rnaExpressionScore", scores.rna_expression.to_string());
        record.set_attribute(
            "geneticAssociationScore",
            scores.genetic_association.to_string(),
        );
        record.set_attribute("somaticMutationScore", scores.somatic_mutation.to_string());
        record.set_attribute("knownDrugScore", scores.known_drug.to_string());
        record.set_attribute("animalModelScore", scores.animal_model.to_string());
        record.set_attribute("affectedPathwayScore", scores.affected_pathway.to_string());
        record.set_attribute("literatureCount", counts.literature.to_string());
        record.set_attribute("rnaExpressionCount", counts.rna_expression.to_string());
        record.set_attribute(
            "geneticAssociationCount",
            counts.genetic_association.to_string(),
        );
        record.set_attribute("somaticMutationCount", counts.somatic_mutation.to_string());
        record.set_attribute("knownDrugCount", counts.known_drug.to_string());
        record.set_attribute("animalModelCount", counts.animal_model.to_string());
        record.set_attribute("affectedPathwayCount", counts.affected_pathway.to_string());
        run.store(record)?;
        stored += 1;
    }

    info!(stored, diseases = diseases.len(), "finished associations");
    Ok(())
}

fn minimal_disease<S: ItemSink>(
    run: &mut Run<S>,
    diseases: &mut Interner,
    disease_id: &str,
) -> Result<ItemRef, EtlError> {
    diseases.get_or_create(disease_id, run.sink_mut(), || {
        let mut disease = Item::new("Disease");
        disease.set_attribute("primaryIdentifier", disease_id);
        disease.set_attribute("diseaseId", disease_id);
        disease
    })
}
