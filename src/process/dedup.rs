use crate::error::{PipelineError, Result};
use crate::process::Stage;
use arrow::{
    array::BooleanArray,
    compute::filter_record_batch,
    record_batch::RecordBatch,
    row::{RowConverter, SortField},
};
use std::collections::HashSet;
use tracing::info;

const STAGE: &str = "remove_duplicates";

/// Keeps the first occurrence of every row that is equal across all columns.
pub struct DropDuplicates;

/// One flag per row: `true` for the first occurrence, `false` for repeats.
pub fn first_occurrences(batch: &RecordBatch) -> Result<Vec<bool>> {
    if batch.num_columns() == 0 {
        return Ok(vec![true; batch.num_rows()]);
    }

    let fields = batch
        .schema()
        .fields()
        .iter()
        .map(|f| SortField::new(f.data_type().clone()))
        .collect();
    let converter = RowConverter::new(fields).map_err(|e| PipelineError::arrow(STAGE, e))?;
    let rows = converter
        .convert_columns(batch.columns())
        .map_err(|e| PipelineError::arrow(STAGE, e))?;

    let mut seen = HashSet::with_capacity(rows.num_rows());
    Ok(rows.iter().map(|row| seen.insert(row)).collect())
}

impl Stage for DropDuplicates {
    fn name(&self) -> &str {
        STAGE
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let keep = first_occurrences(&batch)?;
        let duplicates = keep.iter().filter(|k| !**k).count();
        info!(duplicates, "duplicates found");

        if duplicates == 0 {
            info!(duplicates = 0, "after dropping duplicates");
            return Ok(batch);
        }

        let out = filter_record_batch(&batch, &BooleanArray::from(keep))
            .map_err(|e| PipelineError::arrow(STAGE, e))?;
        let remaining = first_occurrences(&out)?.iter().filter(|k| !**k).count();
        info!(duplicates = remaining, rows = out.num_rows(), "after dropping duplicates");
        Ok(out)
    }
}
