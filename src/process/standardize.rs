use crate::error::{PipelineError, Result};
use crate::process::convert::to_truncated_int;
use crate::process::schema::REMAINING_LEASE;
use crate::process::utils::{column, has_column, with_column};
use crate::process::Stage;
use arrow::{
    array::{Array, ArrayRef, AsArray, StringArray},
    compute::cast,
    datatypes::DataType,
    record_batch::RecordBatch,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::sync::Arc;
use tracing::info;

const LEASE_YEARS_PATTERN: &str = r"(\d+)\s*years?";

static LEASE_YEARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(LEASE_YEARS_PATTERN).expect("lease pattern compiles"));

/// Truncating Int64 cast of a single column; a no-op when the column is absent.
pub struct StandardizeInteger {
    column: &'static str,
    name: String,
}

impl StandardizeInteger {
    pub fn new(column: &'static str) -> Self {
        Self {
            column,
            name: format!("standardize_{column}"),
        }
    }
}

impl Stage for StandardizeInteger {
    fn name(&self) -> &str {
        &self.name
    }

    fn applies_to(&self, batch: &RecordBatch) -> bool {
        has_column(batch, self.column)
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        if !self.applies_to(&batch) {
            return Ok(batch);
        }
        let arr = column(&self.name, &batch, self.column)?;
        info!(column = self.column, dtype = %arr.data_type(), "datatype before converting");
        let ints = to_truncated_int(&self.name, self.column, arr)?;
        let out = with_column(&self.name, &batch, self.column, Arc::new(ints))?;
        info!(column = self.column, dtype = %DataType::Int64, "datatype after converting");
        Ok(out)
    }
}

/// Reduce a free-text lease like "61 years 04 months" to its year count.
/// Text without "year" (any case) is returned unchanged; `None` when the
/// text mentions a year but carries no count.
pub fn lease_years(raw: &str) -> Option<&str> {
    if !raw.to_lowercase().contains("year") {
        return Some(raw);
    }
    LEASE_YEARS
        .captures(raw)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

/// Parses textual `remaining_lease` values down to whole years, then casts
/// the column to Int64. Months are dropped.
pub struct StandardizeRemainingLease;

impl StandardizeRemainingLease {
    const NAME: &'static str = "standardize_remaining_lease";

    fn extract_years(arr: &ArrayRef) -> Result<ArrayRef> {
        let text = cast(arr, &DataType::Utf8).map_err(|e| PipelineError::arrow(Self::NAME, e))?;
        let text = text.as_string::<i32>();

        let mut out: Vec<Option<&str>> = Vec::with_capacity(text.len());
        for (row, value) in text.iter().enumerate() {
            match value {
                Some(raw) => {
                    let years = lease_years(raw).ok_or_else(|| PipelineError::Parse {
                        stage: Self::NAME.to_string(),
                        column: REMAINING_LEASE.to_string(),
                        row,
                        value: raw.to_string(),
                        pattern: LEASE_YEARS_PATTERN,
                    })?;
                    out.push(Some(years));
                }
                None => out.push(None),
            }
        }
        Ok(Arc::new(StringArray::from(out)))
    }
}

impl Stage for StandardizeRemainingLease {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn applies_to(&self, batch: &RecordBatch) -> bool {
        has_column(batch, REMAINING_LEASE)
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        if !self.applies_to(&batch) {
            return Ok(batch);
        }
        let arr = column(Self::NAME, &batch, REMAINING_LEASE)?;
        info!(column = REMAINING_LEASE, dtype = %arr.data_type(), "datatype before converting");

        let values = match arr.data_type() {
            DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => Self::extract_years(arr)?,
            _ => arr.clone(),
        };
        let ints = to_truncated_int(Self::NAME, REMAINING_LEASE, &values)?;
        let out = with_column(Self::NAME, &batch, REMAINING_LEASE, Arc::new(ints))?;

        info!(column = REMAINING_LEASE, dtype = %DataType::Int64, "datatype after converting");
        Ok(out)
    }
}
