use crate::error::{PipelineError, Result};
use crate::process::utils::{cell_text, clean_str};
use arrow::{
    array::{Array, ArrayRef, AsArray, Float64Array, Int64Array},
    compute::cast,
    datatypes::{DataType, Float64Type, Int64Type},
};

fn conversion_error(
    stage: &str,
    column: &str,
    arr: &dyn Array,
    row: usize,
    target: &'static str,
) -> PipelineError {
    PipelineError::TypeConversion {
        stage: stage.to_string(),
        column: column.to_string(),
        row,
        value: cell_text(arr, row),
        target,
    }
}

/// Drop the fractional part; `None` for NaN, infinities and values outside i64.
pub fn truncate_f64(v: f64) -> Option<i64> {
    if !v.is_finite() {
        return None;
    }
    let t = v.trunc();
    if t < i64::MIN as f64 || t >= i64::MAX as f64 {
        return None;
    }
    Some(t as i64)
}

/// Parse an integer or decimal literal, truncating toward zero.
pub fn parse_truncated(raw: &str) -> Option<i64> {
    let s = clean_str(raw);
    s.parse::<i64>()
        .ok()
        .or_else(|| s.parse::<f64>().ok().and_then(truncate_f64))
}

/// Cast any integer, float or numeric-text column to Int64, discarding
/// fractional parts. Nulls and non-numeric values are conversion errors.
pub fn to_truncated_int(stage: &str, column: &str, arr: &ArrayRef) -> Result<Int64Array> {
    let dt = arr.data_type();

    if dt.is_integer() {
        // out-of-range values (large u64) come back as nulls and are rejected below
        let ints = cast(arr, &DataType::Int64).map_err(|e| PipelineError::arrow(stage, e))?;
        let ints = ints.as_primitive::<Int64Type>();
        if let Some(row) = (0..ints.len()).find(|&i| ints.is_null(i)) {
            return Err(conversion_error(stage, column, arr.as_ref(), row, "int64"));
        }
        return Ok(ints.clone());
    }

    if dt.is_floating() {
        let floats = cast(arr, &DataType::Float64).map_err(|e| PipelineError::arrow(stage, e))?;
        let floats = floats.as_primitive::<Float64Type>();
        let mut out = Vec::with_capacity(floats.len());
        for (row, v) in floats.iter().enumerate() {
            match v.and_then(truncate_f64) {
                Some(i) => out.push(i),
                None => return Err(conversion_error(stage, column, arr.as_ref(), row, "int64")),
            }
        }
        return Ok(Int64Array::from(out));
    }

    match dt {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = cast(arr, &DataType::Utf8).map_err(|e| PipelineError::arrow(stage, e))?;
            let text = text.as_string::<i32>();
            let mut out = Vec::with_capacity(text.len());
            for (row, v) in text.iter().enumerate() {
                match v.and_then(parse_truncated) {
                    Some(i) => out.push(i),
                    None => {
                        return Err(conversion_error(stage, column, arr.as_ref(), row, "int64"))
                    }
                }
            }
            Ok(Int64Array::from(out))
        }
        _ if arr.is_empty() => Ok(Int64Array::from(Vec::<i64>::new())),
        _ => Err(conversion_error(stage, column, arr.as_ref(), 0, "int64")),
    }
}

/// Read a numeric (or numeric-text) column as f64 values. Nulls are errors.
pub fn to_f64_values(stage: &str, column: &str, arr: &ArrayRef) -> Result<Vec<f64>> {
    let dt = arr.data_type();

    if dt.is_numeric() {
        let floats = cast(arr, &DataType::Float64).map_err(|e| PipelineError::arrow(stage, e))?;
        let floats: &Float64Array = floats.as_primitive::<Float64Type>();
        return floats
            .iter()
            .enumerate()
            .map(|(row, v)| {
                v.ok_or_else(|| conversion_error(stage, column, arr.as_ref(), row, "float64"))
            })
            .collect();
    }

    match dt {
        DataType::Utf8 | DataType::LargeUtf8 | DataType::Utf8View => {
            let text = cast(arr, &DataType::Utf8).map_err(|e| PipelineError::arrow(stage, e))?;
            text.as_string::<i32>()
                .iter()
                .enumerate()
                .map(|(row, v)| {
                    v.and_then(|s| clean_str(s).parse::<f64>().ok())
                        .ok_or_else(|| {
                            conversion_error(stage, column, arr.as_ref(), row, "float64")
                        })
                })
                .collect()
        }
        _ if arr.is_empty() => Ok(Vec::new()),
        _ => Err(conversion_error(stage, column, arr.as_ref(), 0, "float64")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{StringArray, UInt8Array};
    use std::sync::Arc;

    #[test]
    fn floats_truncate_toward_zero() -> anyhow::Result<()> {
        let arr: ArrayRef = Arc::new(Float64Array::from(vec![250000.9, 45.7, -1.5]));
        let out = to_truncated_int("t", "c", &arr)?;
        assert_eq!(out.values().to_vec(), vec![250000, 45, -1]);
        Ok(())
    }

    #[test]
    fn integer_types_widen() -> anyhow::Result<()> {
        let arr: ArrayRef = Arc::new(UInt8Array::from(vec![1, 255]));
        let out = to_truncated_int("t", "c", &arr)?;
        assert_eq!(out.values().to_vec(), vec![1, 255]);
        Ok(())
    }

    #[test]
    fn numeric_text_is_parsed() -> anyhow::Result<()> {
        let arr: ArrayRef = Arc::new(StringArray::from(vec!["61", " 70 ", "\"45.9\""]));
        let out = to_truncated_int("t", "c", &arr)?;
        assert_eq!(out.values().to_vec(), vec![61, 70, 45]);
        Ok(())
    }

    #[test]
    fn non_numeric_text_reports_row_and_value() {
        let arr: ArrayRef = Arc::new(StringArray::from(vec!["12", "abc"]));
        let err = to_truncated_int("standardise_resale_price", "resale_price", &arr).unwrap_err();
        match err {
            PipelineError::TypeConversion {
                stage,
                column,
                row,
                value,
                ..
            } => {
                assert_eq!(stage, "standardise_resale_price");
                assert_eq!(column, "resale_price");
                assert_eq!(row, 1);
                assert_eq!(value, "abc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn nan_and_null_are_rejected() {
        let nan: ArrayRef = Arc::new(Float64Array::from(vec![1.0, f64::NAN]));
        assert!(to_truncated_int("t", "c", &nan).is_err());

        let null: ArrayRef = Arc::new(Float64Array::from(vec![Some(1.0), None]));
        assert!(to_truncated_int("t", "c", &null).is_err());
        assert!(to_f64_values("t", "c", &null).is_err());
    }
}
