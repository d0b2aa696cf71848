use crate::error::Result;
use crate::process::abbreviations::Abbreviations;
use crate::process::schema::{ADDRESS, BLOCK, ROAD, STREET_NAME, TOWN};
use crate::process::utils::{column, text_column, with_column};
use crate::process::Stage;
use arrow::{array::StringArray, record_batch::RecordBatch};
use std::sync::Arc;
use tracing::debug;

/// Builds `address` from the raw block and street, prefixes `block` with
/// "B-" and copies `street_name` into `road`. `address` is computed before
/// the block is rewritten.
pub struct DeriveAddress;

impl DeriveAddress {
    const NAME: &'static str = "create_address_block_road_town";
}

impl Stage for DeriveAddress {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        let blocks = text_column(Self::NAME, &batch, BLOCK)?;
        let streets = text_column(Self::NAME, &batch, STREET_NAME)?;
        // town is carried as-is but must be present
        column(Self::NAME, &batch, TOWN)?;

        let address: StringArray = blocks
            .iter()
            .zip(streets.iter())
            .map(|(block, street)| Some(format!("{} {}", block?, street?)))
            .collect();
        let prefixed: StringArray = blocks
            .iter()
            .map(|block| block.map(|b| format!("B-{b}")))
            .collect();

        let out = with_column(Self::NAME, &batch, ADDRESS, Arc::new(address))?;
        let out = with_column(Self::NAME, &out, BLOCK, Arc::new(prefixed))?;
        with_column(Self::NAME, &out, ROAD, Arc::new(streets))
    }
}

/// Expands street abbreviations token by token in `address` and `road`.
pub struct ExpandAbbreviations {
    abbreviations: Abbreviations,
}

impl ExpandAbbreviations {
    const NAME: &'static str = "expand_road_address_abbreviations";

    pub fn new(abbreviations: Abbreviations) -> Self {
        Self { abbreviations }
    }

    fn expand_column(&self, batch: &RecordBatch, name: &str) -> Result<RecordBatch> {
        let text = text_column(Self::NAME, batch, name)?;
        let expanded: StringArray = text
            .iter()
            .map(|v| v.map(|s| self.abbreviations.expand(s)))
            .collect();
        debug!(column = name, entries = self.abbreviations.len(), "abbreviations expanded");
        with_column(Self::NAME, batch, name, Arc::new(expanded))
    }
}

impl Stage for ExpandAbbreviations {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        // both columns must exist before either is rewritten
        column(Self::NAME, &batch, ADDRESS)?;
        column(Self::NAME, &batch, ROAD)?;

        let out = self.expand_column(&batch, ADDRESS)?;
        self.expand_column(&out, ROAD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PipelineError;
    use arrow::array::{ArrayRef, AsArray, Int64Array};

    fn texts(batch: &RecordBatch, name: &str) -> Vec<Option<String>> {
        batch
            .column_by_name(name)
            .expect("column")
            .as_string::<i32>()
            .iter()
            .map(|v| v.map(str::to_string))
            .collect()
    }

    fn raw() -> RecordBatch {
        RecordBatch::try_from_iter(vec![
            (
                "town",
                Arc::new(StringArray::from(vec!["ANG MO KIO", "QUEENSTOWN"])) as ArrayRef,
            ),
            ("block", Arc::new(StringArray::from(vec!["123", "5"])) as ArrayRef),
            (
                "street_name",
                Arc::new(StringArray::from(vec![Some("ANG MO KIO AVE 3"), None])) as ArrayRef,
            ),
        ])
        .expect("fixture")
    }

    #[test]
    fn address_uses_block_before_prefix() -> anyhow::Result<()> {
        let out = DeriveAddress.apply(raw())?;
        assert_eq!(
            texts(&out, "address"),
            vec![Some("123 ANG MO KIO AVE 3".to_string()), None]
        );
        assert_eq!(
            texts(&out, "block"),
            vec![Some("B-123".to_string()), Some("B-5".to_string())]
        );
        assert_eq!(texts(&out, "road"), texts(&out, "street_name"));
        assert_eq!(texts(&out, "town"), texts(&raw(), "town"));
        // block keeps its position, new columns are appended
        assert_eq!(out.schema().field(1).name(), "block");
        assert_eq!(out.schema().field(3).name(), "address");
        assert_eq!(out.schema().field(4).name(), "road");
        Ok(())
    }

    #[test]
    fn numeric_blocks_are_rendered_as_text() -> anyhow::Result<()> {
        let batch = RecordBatch::try_from_iter(vec![
            ("town", Arc::new(StringArray::from(vec!["BEDOK"])) as ArrayRef),
            ("block", Arc::new(Int64Array::from(vec![309])) as ArrayRef),
            ("street_name", Arc::new(StringArray::from(vec!["BEDOK NTH RD"])) as ArrayRef),
        ])?;
        let out = DeriveAddress.apply(batch)?;
        assert_eq!(texts(&out, "block"), vec![Some("B-309".to_string())]);
        assert_eq!(texts(&out, "address"), vec![Some("309 BEDOK NTH RD".to_string())]);
        Ok(())
    }

    #[test]
    fn town_is_required() {
        let batch = raw();
        let without_town = batch.project(&[1, 2]).expect("projection");
        let err = DeriveAddress.apply(without_town).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingColumn { ref column, .. } if column == "town"
        ));
    }

    #[test]
    fn expansion_rewrites_address_and_road() -> anyhow::Result<()> {
        let derived = DeriveAddress.apply(raw())?;
        let stage = ExpandAbbreviations::new(Abbreviations::default());
        let out = stage.apply(derived)?;
        assert_eq!(
            texts(&out, "address"),
            vec![Some("123 ANG MO KIO AVENUE 3".to_string()), None]
        );
        assert_eq!(
            texts(&out, "road"),
            vec![Some("ANG MO KIO AVENUE 3".to_string()), None]
        );
        // street_name itself is untouched
        assert_eq!(
            texts(&out, "street_name"),
            vec![Some("ANG MO KIO AVE 3".to_string()), None]
        );
        assert_eq!(stage.apply(out.clone())?, out);
        Ok(())
    }

    #[test]
    fn expansion_requires_derived_columns() {
        let err = ExpandAbbreviations::new(Abbreviations::default())
            .apply(raw())
            .unwrap_err();
        assert!(matches!(
            err,
            PipelineError::MissingColumn { ref column, .. } if column == "address"
        ));
    }
}
