//! Experiment description files shared by the RNA-Seq and Nanopore sources.
//!
//! Each `.json` file in the data directory is newline-delimited JSON, one
//! experiment per line. The description names the materials, treatments and
//! conditions of the experiment and lists the treatment-vs-control
//! comparisons whose result tables live in a subdirectory named after the
//! experiment's short name.

use std::collections::{BTreeMap, HashMap};
use std::io::BufRead;
use std::path::Path;

use serde::Deserialize;
use tracing::warn;

use crate::error::EtlError;
use crate::item::{Item, ItemRef, ItemSink};
use crate::run::Run;
use crate::table::{attr_if_float, attr_if_present};

#[derive(Debug, Deserialize)]
pub struct ExperimentConfig {
    pub experiment: ExperimentMeta,
    #[serde(default)]
    pub materials: BTreeMap<String, Material>,
    #[serde(default)]
    pub treatments: BTreeMap<String, Treatment>,
    #[serde(default)]
    pub conditions: BTreeMap<String, Condition>,
    #[serde(default)]
    pub comparisons: Vec<Comparison>,
}

#[derive(Debug, Deserialize)]
pub struct ExperimentMeta {
    pub name: Option<String>,
    #[serde(rename = "short name")]
    pub short_name: String,
    pub project: Option<String>,
    #[serde(rename = "contact person")]
    pub contact_person: Option<String>,
    pub date: Option<String>,
    pub sequencing: Option<String>,
    pub provider: Option<String>,
    #[serde(rename = "Dotmatics reference")]
    pub dotmatics_reference: Option<String>,
}

/// A material is keyed by exactly one of its type markers.
#[derive(Debug, Deserialize)]
pub struct Material {
    #[serde(rename = "cell line")]
    pub cell_line: Option<MaterialDetails>,
    pub tumour: Option<MaterialDetails>,
    pub tissue: Option<MaterialDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub struct MaterialDetails {
    pub name: Option<String>,
    pub tissue: Option<String>,
    pub species: Option<String>,
    #[serde(rename = "primary disease")]
    pub primary_disease: Option<String>,
    #[serde(rename = "disease subtype")]
    pub disease_subtype: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Treatment {
    pub inhibitor: Option<TreatmentDetails>,
    #[serde(rename = "knock-down")]
    pub knock_down: Option<TreatmentDetails>,
    pub untargeted: Option<TreatmentDetails>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TreatmentDetails {
    pub name: Option<String>,
    #[serde(rename = "target gene")]
    pub target_gene: Option<String>,
    #[serde(rename = "Dotmatics reference")]
    pub dotmatics_reference: Option<String>,
    pub dose: Option<String>,
    pub concentration: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    #[serde(rename = "time point")]
    pub time_point: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Condition {
    pub material: Option<String>,
    #[serde(default)]
    pub samples: BTreeMap<String, serde_json::Value>,
    #[serde(default)]
    pub treatments: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct Comparison {
    pub treatment: NamedSide,
    pub control: NamedSide,
}

#[derive(Debug, Deserialize)]
pub struct NamedSide {
    pub name: String,
}

impl Comparison {
    pub fn label(&self) -> String {
        format!("{}_vs_{}", self.treatment.name, self.control.name)
    }
}

impl ExperimentConfig {
    /// Parse one newline-delimited JSON file, one experiment per line.
    pub fn read_ndjson(path: &Path) -> Result<Vec<Self>, EtlError> {
        let file = path.display().to_string();
        let reader = std::fs::File::open(path).map_err(|err| EtlError::Json {
            file: file.clone(),
            message: err.to_string(),
        })?;
        let mut configs = Vec::new();
        for line in std::io::BufReader::new(reader).lines() {
            let line = line.map_err(|err| EtlError::Json {
                file: file.clone(),
                message: err.to_string(),
            })?;
            if line.trim().is_empty() {
                continue;
            }
            let config = serde_json::from_str(&line).map_err(|err| EtlError::Json {
                file: file.clone(),
                message: err.to_string(),
            })?;
            configs.push(config);
        }
        Ok(configs)
    }
}

/// Stored handles the result-table passes refer back to.
pub struct ExperimentContext {
    pub experiment: ItemRef,
    pub conditions: HashMap<String, ItemRef>,
}

/// Store the experiment record and its materials, treatments and conditions.
/// `class_prefix` distinguishes the RNA-Seq and Nanopore record families.
///
/// The experiment record goes in first so every child can carry its
/// reference from the start.
pub fn store_metadata<S: ItemSink>(
    run: &mut Run<S>,
    config: &ExperimentConfig,
    class_prefix: &str,
) -> Result<ExperimentContext, EtlError> {
    let meta = &config.experiment;
    let mut item = Item::new(format!("{class_prefix}Metadata"));
    attr_if_present(&mut item, "name", meta.name.as_deref());
    item.set_attribute("shortName", &meta.short_name);
    attr_if_present(&mut item, "project", meta.project.as_deref());
    attr_if_present(&mut item, "contactPerson", meta.contact_person.as_deref());
    attr_if_present(&mut item, "date", meta.date.as_deref());
    attr_if_present(&mut item, "sequencing", meta.sequencing.as_deref());
    attr_if_present(&mut item, "provider", meta.provider.as_deref());
    attr_if_present(
        &mut item,
        "dotmaticsReference",
        meta.dotmatics_reference.as_deref(),
    );
    let experiment = run.store(item)?;

    let mut materials = HashMap::new();
    for (name, material) in &config.materials {
        let (material_type, details) = match material {
            Material {
                cell_line: Some(details),
                ..
            } => ("cell line", details),
            Material {
                tumour: Some(details),
                ..
            } => ("tumour", details),
            Material {
                tissue: Some(details),
                ..
            } => ("tissue", details),
            _ => {
                warn!(material = name.as_str(), "material has no recognised type");
                continue;
            }
        };
        let mut item = Item::new(format!("{class_prefix}Material"));
        item.set_attribute("materialType", material_type);
        attr_if_present(&mut item, "name", details.name.as_deref());
        attr_if_present(&mut item, "tissue", details.tissue.as_deref());
        attr_if_present(&mut item, "species", details.species.as_deref());
        attr_if_present(&mut item, "primaryDisease", details.primary_disease.as_deref());
        attr_if_present(&mut item, "diseaseSubtype", details.disease_subtype.as_deref());
        item.set_reference("experiment", experiment);
        materials.insert(name.clone(), run.store(item)?);
    }

    for (name, treatment) in &config.treatments {
        let (treatment_type, details) = match treatment {
            Treatment {
                inhibitor: Some(details),
                ..
            } => ("inhibitor", details),
            Treatment {
                knock_down: Some(details),
                ..
            } => ("knock-down", details),
            Treatment {
                untargeted: Some(details),
                ..
            } => ("untargeted", details),
            _ => {
                warn!(treatment = name.as_str(), "treatment has no recognised type");
                continue;
            }
        };
        let mut item = Item::new(format!("{class_prefix}Treatment"));
        item.set_attribute("treatmentType", treatment_type);
        item.set_attribute("name", name);
        attr_if_present(&mut item, "targetGene", details.target_gene.as_deref());
        attr_if_present(
            &mut item,
            "dotmaticsReference",
            details.dotmatics_reference.as_deref(),
        );
        // Inhibitors declare a dose, the other types a concentration; both
        // land in the same attribute and only when numeric.
        let amount = details.dose.as_deref().or(details.concentration.as_deref());
        attr_if_float(&mut item, "dose_concentration", amount);
        attr_if_present(&mut item, "type", details.kind.as_deref());
        attr_if_present(&mut item, "timePoint", details.time_point.as_deref());
        item.set_reference("experiment", experiment);
        run.store(item)?;
    }

    let mut conditions = HashMap::new();
    for (name, condition) in &config.conditions {
        let mut item = Item::new(format!("{class_prefix}Condition"));
        item.set_attribute("name", name);
        if !condition.treatments.is_empty() {
            item.set_attribute("treatments", condition.treatments.join(", "));
        }
        if !condition.samples.is_empty() {
            let samples: Vec<&str> = condition.samples.keys().map(String::as_str).collect();
            item.set_attribute("samples", samples.join(", "));
        }
        if let Some(material) = condition.material.as_deref() {
            if let Some(handle) = materials.get(material) {
                item.set_reference("material", *handle);
            } else {
                warn!(
                    condition = name.as_str(),
                    material, "condition names an unknown material"
                );
            }
        }
        item.set_reference("experiment", experiment);
        conditions.insert(name.clone(), run.store(item)?);
    }

    Ok(ExperimentContext {
        experiment,
        conditions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genes::GeneCatalog;
    use crate::item::MemorySink;
    use crate::resolver::{GeneResolver, ResolutionMode};

    const CONFIG_LINE: &str = r#"{
        "experiment": {
            "name": "METTL3 inhibition time course",
            "short name": "mettl3-tc",
            "project": "epitranscriptomics",
            "contact person": "Jane Doe",
            "date": "2021-06-01",
            "sequencing": "Illumina",
            "provider": "in-house",
            "Dotmatics reference": "DM-001"
        },
        "materials": {
            "MOLM-13": {"cell line": {"name": "MOLM-13", "tissue": "blood", "species": "human"}}
        },
        "treatments": {
            "STM2457": {"inhibitor": {"target gene": "METTL3", "dose": "1.5", "time point": "24h"}},
            "DMSO": {"untargeted": {"concentration": "vehicle"}}
        },
        "conditions": {
            "treated": {"material": "MOLM-13", "samples": {"s1": {}, "s2": {}}, "treatments": ["STM2457"]},
            "control": {"material": "missing-material", "samples": {"s3": {}}, "treatments": ["DMSO"]}
        },
        "comparisons": [
            {"treatment": {"name": "treated"}, "control": {"name": "control"}}
        ]
    }"#;

    fn test_run() -> Run<MemorySink> {
        let resolver = GeneResolver::new("9606", None, ResolutionMode::Passthrough);
        Run::new(MemorySink::new(), GeneCatalog::new(resolver), "9606")
    }

    fn parse_line() -> ExperimentConfig {
        let line = CONFIG_LINE.replace('\n', " ");
        serde_json::from_str(&line).unwrap()
    }

    #[test]
    fn parses_one_experiment_per_line() {
        let config = parse_line();
        assert_eq!(config.experiment.short_name, "mettl3-tc");
        assert_eq!(config.materials.len(), 1);
        assert_eq!(config.treatments.len(), 2);
        assert_eq!(config.comparisons[0].label(), "treated_vs_control");
    }

    #[test]
    fn stores_metadata_with_experiment_references() {
        let mut run = test_run();
        let config = parse_line();
        let context = store_metadata(&mut run, &config, "RNASeqExperiment").unwrap();

        let sink = run.into_sink();
        assert_eq!(sink.count("RNASeqExperimentMetadata"), 1);
        assert_eq!(sink.count("RNASeqExperimentMaterial"), 1);
        assert_eq!(sink.count("RNASeqExperimentTreatment"), 2);
        assert_eq!(sink.count("RNASeqExperimentCondition"), 2);

        let treated = context.conditions["treated"];
        let condition = sink.item(treated);
        assert_eq!(condition.attribute("samples"), Some("s1, s2"));
        assert_eq!(
            condition.reference("experiment"),
            Some(context.experiment)
        );
        assert!(condition.reference("material").is_some());

        // Unknown material name leaves the reference unset.
        let control = sink.item(context.conditions["control"]);
        assert!(control.reference("material").is_none());
    }

    #[test]
    fn non_numeric_dose_is_dropped() {
        let mut run = test_run();
        let config = parse_line();
        store_metadata(&mut run, &config, "NanoporeExperiment").unwrap();

        let sink = run.into_sink();
        let treatments = sink.of_class("NanoporeExperimentTreatment");
        let inhibitor = treatments
            .iter()
            .find(|item| item.attribute("treatmentType") == Some("inhibitor"))
            .unwrap();
        assert_eq!(inhibitor.attribute("dose_concentration"), Some("1.5"));
        let untargeted = treatments
            .iter()
            .find(|item| item.attribute("treatmentType") == Some("untargeted"))
            .unwrap();
        assert!(untargeted.attribute("dose_concentration").is_none());
    }
}
