//! Column names of the resale-transaction schema, plus the read schema the
//! loader forces onto inferred CSV types.

use arrow::datatypes::{DataType, Field, Schema};

pub const MONTH: &str = "month";
pub const MONTH_ONLY: &str = "month_only";
pub const YEAR_ONLY: &str = "year_only";
pub const TOWN: &str = "town";
pub const BLOCK: &str = "block";
pub const STREET_NAME: &str = "street_name";
pub const STOREY_RANGE: &str = "storey_range";
pub const STOREY_MIN: &str = "storey_min";
pub const STOREY_MAX: &str = "storey_max";
pub const FLOOR_AREA_SQM: &str = "floor_area_sqm";
pub const FLOOR_AREA_SQFT: &str = "floor_area_sqft";
pub const LEASE_COMMENCE_DATE: &str = "lease_commence_date";
pub const REMAINING_LEASE: &str = "remaining_lease";
pub const RESALE_PRICE: &str = "resale_price";
pub const PSF_TEMP: &str = "psf_temp";
pub const PSF: &str = "psf";
pub const ADDRESS: &str = "address";
pub const ROAD: &str = "road";

/// Columns every input table must carry. `remaining_lease` is optional.
pub const REQUIRED_COLUMNS: &[&str] = &[
    MONTH,
    TOWN,
    BLOCK,
    STREET_NAME,
    STOREY_RANGE,
    FLOOR_AREA_SQM,
    LEASE_COMMENCE_DATE,
    RESALE_PRICE,
];

/// Columns that stay text even when every sample looks numeric
/// (blocks like "309", months like "1990-01", leases like "61 years").
pub const TEXT_COLUMNS: &[&str] = &[MONTH, TOWN, BLOCK, STREET_NAME, STOREY_RANGE, REMAINING_LEASE];

/// Measured columns read as floats whatever the inferred type, so a
/// decimal anywhere in the file parses. They are truncated to integers later.
pub const FLOAT_COLUMNS: &[&str] = &[FLOOR_AREA_SQM, RESALE_PRICE];

/// Required columns absent from `schema`, in declaration order.
pub fn missing_required(schema: &Schema) -> Vec<&'static str> {
    REQUIRED_COLUMNS
        .iter()
        .copied()
        .filter(|name| schema.column_with_name(name).is_none())
        .collect()
}

/// Build the read schema from an inferred one: text columns are forced to
/// Utf8, measured columns to Float64, everything else keeps its inferred
/// type. All fields nullable.
pub fn read_schema(inferred: &Schema) -> Schema {
    let fields: Vec<Field> = inferred
        .fields()
        .iter()
        .map(|f| {
            let name = f.name().as_str();
            let dt = if TEXT_COLUMNS.contains(&name) {
                DataType::Utf8
            } else if FLOAT_COLUMNS.contains(&name) {
                DataType::Float64
            } else {
                f.data_type().clone()
            };
            Field::new(f.name(), dt, true)
        })
        .collect();
    Schema::new(fields)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_schema_forces_text_columns() {
        let inferred = Schema::new(vec![
            Field::new(MONTH, DataType::Date32, false),
            Field::new(BLOCK, DataType::Int64, false),
            Field::new(RESALE_PRICE, DataType::Float64, false),
            Field::new(REMAINING_LEASE, DataType::Int64, false),
            Field::new(FLOOR_AREA_SQM, DataType::Int64, false),
            Field::new(LEASE_COMMENCE_DATE, DataType::Int64, false),
        ]);
        let schema = read_schema(&inferred);
        assert_eq!(schema.field(0).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(1).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(2).data_type(), &DataType::Float64);
        assert_eq!(schema.field(3).data_type(), &DataType::Utf8);
        assert_eq!(schema.field(4).data_type(), &DataType::Float64);
        assert_eq!(schema.field(5).data_type(), &DataType::Int64);
        assert!(schema.fields().iter().all(|f| f.is_nullable()));
    }

    #[test]
    fn reports_missing_required_columns() {
        let schema = Schema::new(vec![
            Field::new(MONTH, DataType::Utf8, true),
            Field::new(TOWN, DataType::Utf8, true),
        ]);
        let missing = missing_required(&schema);
        assert_eq!(missing.len(), REQUIRED_COLUMNS.len() - 2);
        assert_eq!(missing[0], BLOCK);
    }
}
