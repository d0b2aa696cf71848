// src/process/derive.rs
//
// Stages that add computed columns: month split, lease, area, storey and psf.

use crate::error::{PipelineError, Result};
use crate::process::convert::{to_f64_values, to_truncated_int, truncate_f64};
use crate::process::date_parser::parse_year_month;
use crate::process::schema::{
    FLOOR_AREA_SQFT, FLOOR_AREA_SQM, LEASE_COMMENCE_DATE, MONTH, MONTH_ONLY, PSF, PSF_TEMP,
    REMAINING_LEASE, RESALE_PRICE, STOREY_MAX, STOREY_MIN, STOREY_RANGE, YEAR_ONLY,
};
use crate::process::utils::{cell_text, column, text_column, with_column};
use crate::process::Stage;
use arrow::{
    array::{Array, AsArray, Date32Array, Float64Array, Int64Array},
    datatypes::{DataType, Date32Type},
    record_batch::RecordBatch,
};
use chrono::{Datelike, NaiveDate};
use std::sync::Arc;
use tracing::info;

/// Length of a fresh lease, in years.
pub const LEASE_TERM_YEARS: i64 = 99;

/// Square feet in one square metre.
pub const SQFT_PER_SQM: f64 = 10.7639;

/// Parses `month` as a year-month, rewrites it as a date and adds
/// `month_only` / `year_only`.
pub struct SplitMonth;

impl SplitMonth {
    const NAME: &'static str = "split_year_and_month";

    fn parse_dates(batch: &RecordBatch) -> Result<Vec<NaiveDate>> {
        let arr = column(Self::NAME, batch, MONTH)?;
        let date_error = |row: usize| PipelineError::DateParse {
            stage: Self::NAME.to_string(),
            column: MONTH.to_string(),
            row,
            value: cell_text(arr.as_ref(), row),
        };

        // already split on a previous run
        if arr.data_type() == &DataType::Date32 {
            return arr
                .as_primitive::<Date32Type>()
                .iter()
                .enumerate()
                .map(|(row, v)| v.map(Date32Type::to_naive_date).ok_or_else(|| date_error(row)))
                .collect();
        }

        let text = text_column(Self::NAME, batch, MONTH)?;
        text.iter()
            .enumerate()
            .map(|(row, v)| v.and_then(parse_year_month).ok_or_else(|| date_error(row)))
            .collect()
    }
}

impl Stage for SplitMonth {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let dates = Self::parse_dates(&batch)?;

        let month = Date32Array::from_iter_values(dates.iter().map(|d| Date32Type::from_naive_date(*d)));
        let month_only = Int64Array::from_iter_values(dates.iter().map(|d| d.month() as i64));
        let year_only = Int64Array::from_iter_values(dates.iter().map(|d| d.year() as i64));

        let out = with_column(Self::NAME, &batch, MONTH, Arc::new(month))?;
        let out = with_column(Self::NAME, &out, MONTH_ONLY, Arc::new(month_only))?;
        with_column(Self::NAME, &out, YEAR_ONLY, Arc::new(year_only))
    }
}

/// `remaining_lease = 99 - (year_only - lease_commence_date)`.
/// Meant to be wrapped in `DeriveIfAbsent` so a supplied lease wins.
pub struct DeriveRemainingLease;

impl DeriveRemainingLease {
    const NAME: &'static str = "create_remaining_lease";
}

impl Stage for DeriveRemainingLease {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let years = to_truncated_int(Self::NAME, YEAR_ONLY, column(Self::NAME, &batch, YEAR_ONLY)?)?;
        let commenced = to_truncated_int(
            Self::NAME,
            LEASE_COMMENCE_DATE,
            column(Self::NAME, &batch, LEASE_COMMENCE_DATE)?,
        )?;

        let remaining = Int64Array::from_iter_values(
            years
                .values()
                .iter()
                .zip(commenced.values().iter())
                .map(|(year, start)| LEASE_TERM_YEARS - (year - start)),
        );
        let out = with_column(Self::NAME, &batch, REMAINING_LEASE, Arc::new(remaining))?;
        info!(column = REMAINING_LEASE, "column added");
        Ok(out)
    }
}

/// `floor_area_sqft = truncate(floor_area_sqm * 10.7639)`.
pub struct DeriveFloorAreaSqft {
    sqft_per_sqm: f64,
}

impl DeriveFloorAreaSqft {
    const NAME: &'static str = "create_floor_area_sqft";

    pub fn new(sqft_per_sqm: f64) -> Self {
        Self { sqft_per_sqm }
    }
}

impl Default for DeriveFloorAreaSqft {
    fn default() -> Self {
        Self::new(SQFT_PER_SQM)
    }
}

impl Stage for DeriveFloorAreaSqft {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let sqm = column(Self::NAME, &batch, FLOOR_AREA_SQM)?;
        let areas = to_f64_values(Self::NAME, FLOOR_AREA_SQM, sqm)?;

        let mut sqft = Vec::with_capacity(areas.len());
        for (row, area) in areas.into_iter().enumerate() {
            let v = truncate_f64(area * self.sqft_per_sqm).ok_or_else(|| {
                PipelineError::TypeConversion {
                    stage: Self::NAME.to_string(),
                    column: FLOOR_AREA_SQM.to_string(),
                    row,
                    value: cell_text(sqm.as_ref(), row),
                    target: "int64",
                }
            })?;
            sqft.push(v);
        }

        with_column(Self::NAME, &batch, FLOOR_AREA_SQFT, Arc::new(Int64Array::from(sqft)))
    }
}

/// Splits `"<min> TO <max>"` into `storey_min` / `storey_max`.
pub struct SplitStoreyRange;

impl SplitStoreyRange {
    const NAME: &'static str = "split_storey_range";

    fn format_error(row: usize, value: &str, reason: &'static str) -> PipelineError {
        PipelineError::Format {
            stage: Self::NAME.to_string(),
            column: STOREY_RANGE.to_string(),
            row,
            value: value.to_string(),
            reason,
        }
    }

    fn bounds(row: usize, raw: &str) -> Result<(i64, i64)> {
        let tokens: Vec<&str> = raw.split_whitespace().collect();
        if tokens.len() < 3 {
            return Err(Self::format_error(row, raw, "expected `<min> TO <max>`"));
        }
        let parse = |token: &str| {
            token
                .parse::<i64>()
                .map_err(|_| Self::format_error(row, raw, "storey bound is not an integer"))
        };
        Ok((parse(tokens[0])?, parse(tokens[2])?))
    }
}

impl Stage for SplitStoreyRange {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let ranges = text_column(Self::NAME, &batch, STOREY_RANGE)?;

        let mut mins = Vec::with_capacity(ranges.len());
        let mut maxs = Vec::with_capacity(ranges.len());
        for (row, value) in ranges.iter().enumerate() {
            let raw = value.ok_or_else(|| Self::format_error(row, "null", "missing value"))?;
            let (lo, hi) = Self::bounds(row, raw)?;
            mins.push(lo);
            maxs.push(hi);
        }

        let out = with_column(Self::NAME, &batch, STOREY_MIN, Arc::new(Int64Array::from(mins)))?;
        with_column(Self::NAME, &out, STOREY_MAX, Arc::new(Int64Array::from(maxs)))
    }
}

/// Round to two decimals, ties to even.
fn round_2dp(v: f64) -> f64 {
    (v * 100.0).round_ties_even() / 100.0
}

/// `psf_temp = round(price / sqft * 100, 2)`, `psf = truncate(psf_temp) / 100`.
pub struct DerivePsf;

impl DerivePsf {
    const NAME: &'static str = "create_psf";

    /// Returns `(psf_temp, psf)`, or `None` when the result is not finite.
    pub fn compute(price: f64, sqft: f64) -> Option<(f64, f64)> {
        let psf_temp = round_2dp(price / sqft * 100.0);
        let psf = truncate_f64(psf_temp)? as f64 / 100.0;
        Some((psf_temp, psf))
    }
}

impl Stage for DerivePsf {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let price_arr = column(Self::NAME, &batch, RESALE_PRICE)?;
        let prices = to_f64_values(Self::NAME, RESALE_PRICE, price_arr)?;
        let areas = to_f64_values(
            Self::NAME,
            FLOOR_AREA_SQFT,
            column(Self::NAME, &batch, FLOOR_AREA_SQFT)?,
        )?;

        let mut temps = Vec::with_capacity(prices.len());
        let mut psfs = Vec::with_capacity(prices.len());
        for (row, (price, sqft)) in prices.into_iter().zip(areas).enumerate() {
            if sqft == 0.0 {
                return Err(PipelineError::Division {
                    stage: Self::NAME.to_string(),
                    column: FLOOR_AREA_SQFT.to_string(),
                    row,
                });
            }
            let (temp, psf) =
                Self::compute(price, sqft).ok_or_else(|| PipelineError::TypeConversion {
                    stage: Self::NAME.to_string(),
                    column: RESALE_PRICE.to_string(),
                    row,
                    value: cell_text(price_arr.as_ref(), row),
                    target: "int64",
                })?;
            temps.push(temp);
            psfs.push(psf);
        }

        let out = with_column(Self::NAME, &batch, PSF_TEMP, Arc::new(Float64Array::from(temps)))?;
        with_column(Self::NAME, &out, PSF, Arc::new(Float64Array::from(psfs)))
    }
}
