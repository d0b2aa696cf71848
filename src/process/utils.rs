use crate::error::{PipelineError, Result};
use arrow::{
    array::{Array, ArrayRef, AsArray, StringArray},
    compute::cast,
    datatypes::{DataType, Field, Schema},
    record_batch::RecordBatch,
    util::display::array_value_to_string,
};
use std::sync::Arc;

/// Trim whitespace + strip outer quotes if present.
pub fn clean_str(raw: &str) -> &str {
    let trimmed = raw.trim();
    if trimmed.starts_with('"') && trimmed.ends_with('"') && trimmed.len() >= 2 {
        trimmed[1..trimmed.len() - 1].trim()
    } else {
        trimmed
    }
}

pub fn has_column(batch: &RecordBatch, name: &str) -> bool {
    batch.schema().column_with_name(name).is_some()
}

/// Look up `name`, failing with `MissingColumn` on behalf of `stage`.
pub fn column<'a>(stage: &str, batch: &'a RecordBatch, name: &str) -> Result<&'a ArrayRef> {
    batch
        .column_by_name(name)
        .ok_or_else(|| PipelineError::missing(stage, name))
}

/// Fetch `name` rendered as Utf8, whatever its stored type.
pub fn text_column(stage: &str, batch: &RecordBatch, name: &str) -> Result<StringArray> {
    let arr = column(stage, batch, name)?;
    let utf8 = cast(arr, &DataType::Utf8).map_err(|e| PipelineError::arrow(stage, e))?;
    Ok(utf8.as_string::<i32>().clone())
}

/// Printable form of one cell, used in error messages.
pub fn cell_text(arr: &dyn Array, row: usize) -> String {
    if arr.is_null(row) {
        return "null".to_string();
    }
    array_value_to_string(arr, row).unwrap_or_else(|_| format!("<{}>", arr.data_type()))
}

/// Assign `array` to column `name`: an existing column is replaced in place,
/// a new one is appended after the last column.
pub fn with_column(
    stage: &str,
    batch: &RecordBatch,
    name: &str,
    array: ArrayRef,
) -> Result<RecordBatch> {
    let schema = batch.schema();
    let mut fields: Vec<Field> = schema.fields().iter().map(|f| f.as_ref().clone()).collect();
    let mut columns = batch.columns().to_vec();
    let field = Field::new(name, array.data_type().clone(), true);

    match schema.index_of(name) {
        Ok(idx) => {
            fields[idx] = field;
            columns[idx] = array;
        }
        Err(_) => {
            fields.push(field);
            columns.push(array);
        }
    }

    let schema = Schema::new_with_metadata(fields, schema.metadata().clone());
    RecordBatch::try_new(Arc::new(schema), columns).map_err(|e| PipelineError::arrow(stage, e))
}
