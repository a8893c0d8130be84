use tracing::info;

use crate::dir::DataDir;
use crate::error::EtlError;
use crate::item::{Item, ItemSink};
use crate::run::Run;
use crate::table::{ColumnMap, Table, attr_or_not_specified};

const SAMPLE_INFO_FILE: &str = "TCGA_phenotype_denseDataOnlyDownload.tsv";

const COLUMNS: &[&str] = &["sample", "sample_type_id", "sample_type", "_primary_disease"];
const SAMPLE_ID: usize = 0;
const SAMPLE_TYPE_ID: usize = 1;
const SAMPLE_TYPE: usize = 2;
const PRIMARY_DISEASE: usize = 3;

/// TCGA sample phenotypes. The sample identifier is the only mandatory
/// column; the descriptive ones default to "Not specified".
pub fn run<S: ItemSink>(run: &mut Run<S>, dir: &DataDir) -> Result<(), EtlError> {
    let mut table = Table::tsv(dir.file(SAMPLE_INFO_FILE)?)?;
    let columns = ColumnMap::resolve(table.headers(), COLUMNS, table.file())?;

    let mut stored = 0u64;
    for row in table.rows() {
        let row = row?;
        let Some(sample_id) = columns.get(&row, SAMPLE_ID) else {
            continue;
        };
        let mut sample = Item::new("TCGASample");
        sample.set_attribute("SampleID", sample_id);
        attr_or_not_specified(&mut sample, "SampleTypeID", columns.get(&row, SAMPLE_TYPE_ID));
        attr_or_not_specified(&mut sample, "SampleType", columns.get(&row, SAMPLE_TYPE));
        attr_or_not_specified(
            &mut sample,
            "PrimaryDisease",
            columns.get(&row, PRIMARY_DISEASE),
        );
        run.store(sample)?;
        stored += 1;
    }

    info!(stored, "finished TCGA sample metadata");
    Ok(())
}
