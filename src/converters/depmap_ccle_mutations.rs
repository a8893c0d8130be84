use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::intern::Interner;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::{ColumnMap, Table, attr_or_not_specified};

const MUTATIONS_FILE: &str = "CCLE_mutations.csv";

const COLUMNS: &[&str] = &[
    "Hugo_Symbol",
    "Chromosome",
    "Start_position",
    "End_position",
    "Strand",
    "Variant_Classification",
    "Variant_Type",
    "Genome_Change",
    "Annotation_Transcript",
    "isDeleterious",
    "isTCGAhotspot",
    "TCGAhsCnt",
    "isCOSMIChotspot",
    "COSMIChsCnt",
    "Variant_annotation",
    "DepMap_ID",
];

const SYMBOL: usize = 0;
const CHROMOSOME: usize = 1;
const START: usize = 2;
const END: usize = 3;
const STRAND: usize = 4;
const CLASSIFICATION: usize = 5;
const VARIANT_TYPE: usize = 6;
const GENOME_CHANGE: usize = 7;
const TRANSCRIPT: usize = 8;
const DELETERIOUS: usize = 9;
const TCGA_HOTSPOT: usize = 10;
const TCGA_COUNT: usize = 11;
const COSMIC_HOTSPOT: usize = 12;
const COSMIC_COUNT: usize = 13;
const ANNOTATION: usize = 14;
const DEPMAP_ID: usize = 15;

/// Per-cell-line somatic mutation calls. A row needs a cell line and a
/// resolvable gene; every descriptive column falls back to "Not specified".
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::csv(dir.file(MUTATIONS_FILE)?)?;
    let columns = ColumnMap::resolve(table.headers(), COLUMNS, table.file())?;

    let mut cell_lines = Interner::new();
    let mut stored = 0u64;
    let mut skipped = 0u64;

    for row in table.rows() {
        let row = row?;

        let Some(depmap_id) = columns.get(&row, DEPMAP_ID) else {
            skipped += 1;
            continue;
        };
        let cell_line = super::cell_line(run, &mut cell_lines, depmap_id)?;

        let Some(symbol) = columns.get(&row, SYMBOL) else {
            skipped += 1;
            continue;
        };
        let Some(gene) = run.gene(symbol)? else {
            skipped += 1;
            continue;
        };

        let mut mutation = Item::new("DepMapMutations");
        mutation.set_reference("cellLine", cell_line);
        mutation.set_reference("gene", gene);
        attr_or_not_specified(&mut mutation, "Chromosome", columns.get(&row, CHROMOSOME));
        attr_or_not_specified(&mut mutation, "Start", columns.get(&row, START));
        attr_or_not_specified(&mut mutation, "End", columns.get(&row, END));
        attr_or_not_specified(&mut mutation, "Strand", columns.get(&row, STRAND));
        attr_or_not_specified(
            &mut mutation,
            "VariantClassification",
            columns.get(&row, CLASSIFICATION),
        );
        attr_or_not_specified(&mut mutation, "VariantType", columns.get(&row, VARIANT_TYPE));
        attr_or_not_specified(
            &mut mutation,
            "GenomeChange",
            columns.get(&row, GENOME_CHANGE),
        );
        attr_or_not_specified(
            &mut mutation,
            "AnnotationTranscript",
            columns.get(&row, TRANSCRIPT),
        );
        attr_or_not_specified(
            &mut mutation,
            "isDeleterious",
            columns.get(&row, DELETERIOUS),
        );
        attr_or_not_specified(
            &mut mutation,
            "isTCGAhotspot",
            columns.get(&row, TCGA_HOTSPOT),
        );
        attr_or_not_specified(&mut mutation, "TCGAhsCnt", columns.get(&row, TCGA_COUNT));
        attr_or_not_specified(
            &mut mutation,
            "isCOSMIChotspot",
            columns.get(&row, COSMIC_HOTSPOT),
        );
        attr_or_not_specified(&mut mutation, "COSMIChsCnt", columns.get(&row, COSMIC_COUNT));
        attr_or_not_specified(
            &mut mutation,
            "VariantAnnotation",
            columns.get(&row, ANNOTATION),
        );
        run.store(mutation)?;
        stored += 1;
    }

    info!(stored, skipped, "finished CCLE mutations");
    Ok(())
}
