use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemRef, ItemSink};
use crate::run::Run;
use crate::table::{Table, is_integer};

const MUTATION_FILE: &str = "mc3.v0.2.8.PUBLIC.nonsilentGene.xena";

/// Binary non-silent mutation matrix: one row per gene, one column per
/// TCGA sample. Only integer cells count as calls.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::tsv(dir.file(MUTATION_FILE)?)?;
    let samples: Vec<String> = table
        .headers()
        .iter()
        .skip(1)
        .map(|header| header.trim().to_string())
        .collect();

    let mut interned_samples = Interner::new();
    let mut stored = 0u64;

    for row in table.rows() {
        let row = row?;
        let symbol = row.get(0).unwrap_or("").trim();
        if symbol.is_empty() {
            continue;
        }
        let Some(gene) = run.gene(symbol)? else {
            continue;
        };

        for (offset, sample_id) in samples.iter().enumerate() {
            let Some(value) = row.get(offset + 1).map(str::trim) else {
                continue;
            };
            if sample_id.is_empty() || value.is_empty() || !is_integer(value) {
                continue;
            }
            let sample = tcga_sample(run, &mut interned_samples, sample_id)?;
            let mut record = Item::new("TCGAMutation");
            record.set_reference("gene", gene);
            record.set_reference("sampleID", sample);
            record.set_attribute("TcgaSomaticMutationValue", value);
            run.store(record)?;
            stored += 1;
        }
    }

    info!(stored, samples = samples.len(), "finished TCGA mutation matrix");
    Ok(())
}

fn tcga_sample<S: ItemSink>(
    run: &mut Run<S>,
    samples: &mut Interner,
    sample_id: &str,
) -> Result<ItemRef, EtlError> {
    samples.get_or_create(sample_id, run.sink_mut(), || {
        let mut sample = Item::new("TCGASample");
        sample.set_attribute("SampleID", sample_id);
        sample
    })
}
