use csv::StringRecord;
use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::{Table, attr_if_float, attr_if_present, is_float};

const ANALYSES_FILE: &str = "DepMap_RME_results_with_outliers.csv";

const GENE: usize = 0;

/// Column offsets for one screen's block within the combined results row.
struct Screen {
    name: &'static str,
    median: usize,
    effect_fraction: usize,
    common_essential: usize,
    skewed_lrt: usize,
    outliers: usize,
}

const SCREENS: &[Screen] = &[
    Screen {
        name: "broad",
        median: 6,
        effect_fraction: 7,
        common_essential: 8,
        skewed_lrt: 9,
        outliers: 24,
    },
    Screen {
        name: "sanger",
        median: 10,
        effect_fraction: 11,
        common_essential: 12,
        skewed_lrt: 13,
        outliers: 31,
    },
    Screen {
        name: "shrna",
        median: 14,
        effect_fraction: 15,
        common_essential: 16,
        skewed_lrt: 17,
        outliers: 38,
    },
];

// Cross-screen comparison columns, repeated on every emitted record.
const CROSS_SCREEN: &[(&str, usize)] = &[
    ("broadSangerCor", 18),
    ("broadSangerDiff", 19),
    ("broadShrnaCor", 20),
    ("broadShrnaDiff", 21),
    ("sangerShrnaCor", 22),
    ("sangerShrnaDiff", 23),
];

/// Combined essentiality results across the Broad, Sanger and shRNA
/// screens. One record per gene and screen whose median is numeric.
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::csv(dir.file(ANALYSES_FILE)?)?;
    let mut stored = 0u64;
    let mut skipped = 0u64;

    for row in table.rows() {
        let row = row?;
        let symbol = row.get(GENE).unwrap_or("").trim();
        if symbol.is_empty() {
            skipped += 1;
            continue;
        }
        let Some(gene) = run.gene(symbol)? else {
            skipped += 1;
            continue;
        };

        for screen in SCREENS {
            let Some(median) = field(&row, screen.median) else {
                continue;
            };
            if !is_float(median) {
                continue;
            }
            let mut record = Item::new("STORMTargetAnalyses");
            record.set_reference("gene", gene);
            record.set_attribute("screen", screen.name);
            record.set_attribute("median", median);
            attr_if_float(&mut record, "effectFraction", field(&row, screen.effect_fraction));
            attr_if_float(
                &mut record,
                "commonEssential",
                field(&row, screen.common_essential),
            );
            attr_if_float(&mut record, "skewedLrt", field(&row, screen.skewed_lrt));
            emit_outliers(&mut record, &row, screen.outliers);
            for (name, index) in CROSS_SCREEN {
                attr_if_float(&mut record, name, field(&row, *index));
            }
            run.store(record)?;
            stored += 1;
        }
    }

    info!(stored, skipped, "finished target analyses");
    Ok(())
}

fn field<'r>(row: &'r StringRecord, index: usize) -> Option<&'r str> {
    row.get(index).map(str::trim).filter(|value| !value.is_empty())
}

/// Seven-column outlier block: count, mean z-score, cell lines, top
/// lineage, lineage count, lineage p-value, lineage q-value.
fn emit_outliers(record: &mut Item, row: &StringRecord, start: usize) {
    attr_if_present(record, "outliersCount", field(row, start));
    attr_if_float(record, "outliersMeanZscore", field(row, start + 1));
    attr_if_present(record, "outliersCellLines", field(row, start + 2));
    attr_if_present(record, "outliersTopLineage", field(row, start + 3));
    attr_if_present(record, "outliersLineageCount", field(row, start + 4));
    attr_if_float(record, "outliersLineagePvalue", field(row, start + 5));
    attr_if_float(record, "outliersLineageQvalue", field(row, start + 6));
}
