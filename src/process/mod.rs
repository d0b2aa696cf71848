// src/process/mod.rs
pub mod abbreviations;
pub mod address;
pub mod convert;
pub mod date_parser;
pub mod dedup;
pub mod derive;
pub mod schema;
pub mod standardize;
pub mod utils;

use crate::error::Result;
use arrow::record_batch::RecordBatch;
use serde::Serialize;
use std::time::Instant;
use tracing::{debug, info};

pub use abbreviations::Abbreviations;
pub use address::{DeriveAddress, ExpandAbbreviations};
pub use dedup::DropDuplicates;
pub use derive::{DeriveFloorAreaSqft, DerivePsf, DeriveRemainingLease, SplitMonth, SplitStoreyRange};
pub use standardize::{StandardizeInteger, StandardizeRemainingLease};

/// One named table transform. Stages hold only immutable configuration.
pub trait Stage {
    fn name(&self) -> &str;

    /// Whether the stage has anything to do for this table. Stages that
    /// return `false` are skipped by the pipeline and are no-ops when
    /// applied directly.
    fn applies_to(&self, _batch: &RecordBatch) -> bool {
        true
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch>;
}

/// Runs `inner` only while `column` is missing from the table, so a column
/// that is already present is never derived twice.
pub struct DeriveIfAbsent<S> {
    column: &'static str,
    inner: S,
}

impl<S: Stage> DeriveIfAbsent<S> {
    pub fn new(column: &'static str, inner: S) -> Self {
        Self { column, inner }
    }
}

impl<S: Stage> Stage for DeriveIfAbsent<S> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn applies_to(&self, batch: &RecordBatch) -> bool {
        !utils::has_column(batch, self.column) && self.inner.applies_to(batch)
    }

    fn apply(&self, batch: RecordBatch) -> Result<RecordBatch> {
        if !self.applies_to(&batch) {
            return Ok(batch);
        }
        self.inner.apply(batch)
    }
}

/// Outcome of one stage within a run.
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    pub stage: String,
    pub rows_in: usize,
    pub rows_out: usize,
    pub added_columns: Vec<String>,
    pub skipped: bool,
    pub elapsed_ms: f64,
}

/// Per-stage summary of a whole pipeline run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PipelineReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub elapsed_ms: f64,
    pub stages: Vec<StageReport>,
}

/// Ordered list of stages; each stage's output is the next one's input.
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    /// An empty pipeline; add stages with [`Pipeline::with_stage`].
    pub fn new() -> Self {
        Self { stages: Vec::new() }
    }

    pub fn with_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// The full resale cleaning sequence.
    pub fn resale(abbreviations: Abbreviations) -> Self {
        Self::new()
            .with_stage(DropDuplicates)
            .with_stage(StandardizeInteger::new(schema::RESALE_PRICE))
            .with_stage(StandardizeInteger::new(schema::FLOOR_AREA_SQM))
            .with_stage(SplitMonth)
            .with_stage(DeriveIfAbsent::new(
                schema::REMAINING_LEASE,
                DeriveRemainingLease,
            ))
            .with_stage(StandardizeRemainingLease)
            .with_stage(DeriveFloorAreaSqft::default())
            .with_stage(SplitStoreyRange)
            .with_stage(DerivePsf)
            .with_stage(DeriveIfAbsent::new(schema::ADDRESS, DeriveAddress))
            .with_stage(ExpandAbbreviations::new(abbreviations))
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order. The first failing stage aborts the run.
    pub fn run(&self, batch: RecordBatch) -> Result<RecordBatch> {
        self.run_with_report(batch).map(|(batch, _)| batch)
    }

    #[tracing::instrument(level = "info", skip_all, fields(rows = batch.num_rows(), stages = self.stages.len()))]
    pub fn run_with_report(&self, batch: RecordBatch) -> Result<(RecordBatch, PipelineReport)> {
        let start = Instant::now();
        let mut report = PipelineReport {
            rows_in: batch.num_rows(),
            ..Default::default()
        };

        let mut current = batch;
        for stage in &self.stages {
            let stage_start = Instant::now();
            let rows_in = current.num_rows();
            let before = current.schema();

            let skipped = !stage.applies_to(&current);
            if skipped {
                debug!(stage = stage.name(), "skipped");
            } else {
                current = stage.apply(current)?;
            }

            let added_columns: Vec<String> = current
                .schema()
                .fields()
                .iter()
                .filter(|f| before.column_with_name(f.name()).is_none())
                .map(|f| f.name().clone())
                .collect();

            report.stages.push(StageReport {
                stage: stage.name().to_string(),
                rows_in,
                rows_out: current.num_rows(),
                added_columns,
                skipped,
                elapsed_ms: stage_start.elapsed().as_secs_f64() * 1000.0,
            });
        }

        report.rows_out = current.num_rows();
        report.elapsed_ms = start.elapsed().as_secs_f64() * 1000.0;
        info!(
            rows_in = report.rows_in,
            rows_out = report.rows_out,
            elapsed = ?start.elapsed(),
            "pipeline finished"
        );
        Ok((current, report))
    }
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::resale(Abbreviations::default())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::{init_test_logging, raw_batch};
    use super::*;
    use crate::error::PipelineError;
    use arrow::array::{Array, AsArray, StringArray};
    use arrow::datatypes::{DataType, Float64Type, Int64Type};
    use arrow::record_batch::RecordBatch;
    use std::sync::Arc;

    fn ints(batch: &RecordBatch, name: &str) -> Vec<i64> {
        batch
            .column_by_name(name)
            .unwrap_or_else(|| panic!("column {name}"))
            .as_primitive::<Int64Type>()
            .values()
            .to_vec()
    }

    fn texts(batch: &RecordBatch, name: &str) -> Vec<String> {
        batch
            .column_by_name(name)
            .unwrap_or_else(|| panic!("column {name}"))
            .as_string::<i32>()
            .iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect()
    }

    #[test]
    fn resale_pipeline_cleans_scenario_rows() -> anyhow::Result<()> {
        init_test_logging();
        let out = Pipeline::default().run(raw_batch())?;

        assert_eq!(ints(&out, "storey_min"), vec![1, 10]);
        assert_eq!(ints(&out, "storey_max"), vec![3, 12]);
        assert_eq!(ints(&out, "floor_area_sqm"), vec![45, 100]);
        // area is truncated to 45 before conversion: 45 * 10.7639 = 484.3755
        assert_eq!(ints(&out, "floor_area_sqft"), vec![484, 1076]);
        assert_eq!(ints(&out, "resale_price"), vec![250000, 232000]);
        assert_eq!(ints(&out, "year_only"), vec![1990, 1999]);
        assert_eq!(ints(&out, "month_only"), vec![1, 12]);
        assert_eq!(ints(&out, "remaining_lease"), vec![89, 75]);
        assert_eq!(texts(&out, "block"), vec!["B-123", "B-309"]);
        assert_eq!(
            texts(&out, "address"),
            vec!["123 ANG MO KIO AVENUE 3", "309 JALAN BUKIT MERAH"]
        );
        assert_eq!(
            texts(&out, "road"),
            vec!["ANG MO KIO AVENUE 3", "JALAN BUKIT MERAH"]
        );
        assert_eq!(
            out.column_by_name("month").map(|c| c.data_type().clone()),
            Some(DataType::Date32)
        );

        let psf = out
            .column_by_name("psf")
            .expect("psf")
            .as_primitive::<Float64Type>();
        assert_eq!(psf.value(1), 215.61);
        Ok(())
    }

    #[test]
    fn rerunning_on_own_output_changes_nothing() -> anyhow::Result<()> {
        let pipeline = Pipeline::default();
        let once = pipeline.run(raw_batch())?;
        let twice = pipeline.run(once.clone())?;
        assert_eq!(once, twice);
        Ok(())
    }

    #[test]
    fn report_lists_every_stage_and_skips() -> anyhow::Result<()> {
        let pipeline = Pipeline::default();
        let (_, first) = pipeline.run_with_report(raw_batch())?;
        assert_eq!(first.stages.len(), pipeline.stage_names().len());
        assert_eq!(first.rows_in, 2);
        assert_eq!(first.rows_out, 2);

        let lease = first
            .stages
            .iter()
            .find(|s| s.stage == "create_remaining_lease")
            .expect("lease stage");
        assert!(!lease.skipped);
        assert_eq!(lease.added_columns, vec!["remaining_lease".to_string()]);

        let (again, _) = pipeline.run_with_report(raw_batch())?;
        let (_, second) = pipeline.run_with_report(again)?;
        let address = second
            .stages
            .iter()
            .find(|s| s.stage == "create_address_block_road_town")
            .expect("address stage");
        assert!(address.skipped);
        Ok(())
    }

    #[test]
    fn failing_stage_aborts_the_run() {
        let batch = raw_batch();
        let bad = utils::with_column(
            "test",
            &batch,
            "storey_range",
            Arc::new(StringArray::from(vec!["01 TO 03", "10-12"])),
        )
        .expect("fixture");

        let err = Pipeline::default().run(bad).unwrap_err();
        assert!(matches!(err, PipelineError::Format { .. }));
        assert_eq!(err.stage(), "split_storey_range");
    }

    #[test]
    fn empty_pipeline_is_identity() -> anyhow::Result<()> {
        let batch = raw_batch();
        let out = Pipeline::new().run(batch.clone())?;
        assert_eq!(out, batch);
        Ok(())
    }

    #[test]
    fn derive_if_absent_leaves_existing_column() -> anyhow::Result<()> {
        let stage = DeriveIfAbsent::new("address", DeriveAddress);
        let batch = utils::with_column(
            "test",
            &raw_batch(),
            "address",
            Arc::new(StringArray::from(vec!["kept", "kept"])),
        )?;
        assert!(!stage.applies_to(&batch));
        let out = stage.apply(batch.clone())?;
        assert_eq!(out, batch);
        assert_eq!(out.column_by_name("address").map(|c| c.null_count()), Some(0));
        Ok(())
    }
}
