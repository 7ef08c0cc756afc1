//! End-to-end cleaning run.
//!
//! # Stage order
//!
//! 1. **pre_transform** - caller and entity pre-transforms, in order
//! 2. **columns** - add declared columns missing from the frame, drop undeclared ones
//! 3. **normalize** - per-row, per-column validation via [`RowNormalizer`]
//! 4. **uniqueness** - row-key and unique-column checks via [`UniquenessIndex`]
//!
//! The input frame is never mutated. Structural failures abort the run with a
//! [`PipelineError`]; data defects are recorded in the returned report.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use clean_model::{
    Frame, Issue, IssueBuffer, IssueCategory, IssueReport, KeyFn, PipelineError, PipelineOptions,
    RuleSet, Value,
};
use clean_transform::PreTransform;
use clean_validate::{FieldValidator, NormalizedRow, RowNormalizer, UniquenessIndex};
use polars::prelude::DataFrame;
use tracing::{debug, info, info_span};

use crate::entity::EntityDescriptor;

/// Cooperative cancellation shared between a host and running pipelines.
///
/// Polled between rows; a cancelled run returns [`PipelineError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Cleaned frame plus the frozen issue report.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub frame: Frame,
    pub report: IssueReport,
    /// Input indices of the rows in `frame`, in output order.
    pub kept_rows: Vec<usize>,
    /// Input indices of dropped rows, ascending.
    pub dropped_rows: Vec<usize>,
}

/// Composes pre-transforms, normalization, and uniqueness into one run.
#[derive(Default)]
pub struct Pipeline {
    options: PipelineOptions,
    transforms: Vec<Arc<dyn PreTransform>>,
    cancellation: Option<CancellationFlag>,
}

impl Pipeline {
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            transforms: Vec::new(),
            cancellation: None,
        }
    }

    /// Append a pre-transform; transforms run in insertion order.
    pub fn with_transform<T>(mut self, transform: T) -> Self
    where
        T: PreTransform + 'static,
    {
        self.transforms.push(Arc::new(transform));
        self
    }

    pub fn with_shared_transform(mut self, transform: Arc<dyn PreTransform>) -> Self {
        self.transforms.push(transform);
        self
    }

    pub fn with_cancellation(mut self, flag: CancellationFlag) -> Self {
        self.cancellation = Some(flag);
        self
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    /// Names of the configured pre-transforms, in execution order.
    pub fn transform_names(&self) -> Vec<&str> {
        self.transforms.iter().map(|t| t.name()).collect()
    }

    /// Clean `frame` against `rules`.
    pub fn run(&self, frame: &Frame, rules: &RuleSet) -> Result<PipelineOutput, PipelineError> {
        self.execute(frame, rules, rules.initialize_output_info(), Vec::new(), None)
    }

    /// Clean a Polars DataFrame against `rules`.
    pub fn run_dataframe(
        &self,
        df: &DataFrame,
        rules: &RuleSet,
    ) -> Result<PipelineOutput, PipelineError> {
        let frame = Frame::from_polars(df)?;
        self.run(&frame, rules)
    }

    /// Clean `frame` as the entity described by `entity`.
    ///
    /// The entity's own pre-transforms run before the pipeline's, and its
    /// key function decides row identity.
    pub fn run_entity(
        &self,
        entity: &EntityDescriptor,
        frame: &Frame,
    ) -> Result<PipelineOutput, PipelineError> {
        let rules = entity.rule_set()?;
        let seed = (entity.initialize_output_info)(&rules);
        let key_fn: KeyFn = Arc::new(entity.key_of);
        let entity_transforms: Vec<Arc<dyn PreTransform>> = (entity.pre_transforms)()
            .into_iter()
            .map(Arc::from)
            .collect();
        self.execute(frame, &rules, seed, entity_transforms, Some(key_fn))
    }

    fn execute(
        &self,
        input: &Frame,
        rules: &RuleSet,
        mut issues: IssueBuffer,
        entity_transforms: Vec<Arc<dyn PreTransform>>,
        key_fn: Option<KeyFn>,
    ) -> Result<PipelineOutput, PipelineError> {
        let span = info_span!("pipeline", entity = %rules.entity(), input_rows = input.height());
        let _guard = span.enter();
        let start = Instant::now();

        let transforms: Vec<Arc<dyn PreTransform>> = entity_transforms
            .into_iter()
            .chain(self.transforms.iter().cloned())
            .collect();
        let mut frame = info_span!("pre_transform")
            .in_scope(|| self.apply_transforms(input, &transforms, &mut issues))?;

        self.reconcile_columns(&mut frame, rules, &mut issues)?;

        let (normalized, mut dropped_rows) = info_span!("normalize")
            .in_scope(|| self.normalize(&frame, rules, &mut issues))?;

        let (kept, uniqueness_dropped) = info_span!("uniqueness")
            .in_scope(|| self.enforce_uniqueness(normalized, rules, key_fn, &mut issues))?;
        dropped_rows.extend(uniqueness_dropped);
        dropped_rows.sort_unstable();

        let kept_rows: Vec<usize> = kept.iter().map(|row| row.index).collect();
        let mut frame = Frame::with_columns(rules.columns())?;
        for row in kept {
            frame.push_row(row.values)?;
        }
        let report = issues.freeze();

        info!(
            output_rows = frame.height(),
            dropped_rows = dropped_rows.len(),
            issues = report.total(),
            errors = report.error_count(),
            duration_ms = start.elapsed().as_millis(),
            "pipeline complete"
        );

        Ok(PipelineOutput {
            frame,
            report,
            kept_rows,
            dropped_rows,
        })
    }

    fn check_cancelled(&self) -> Result<(), PipelineError> {
        match &self.cancellation {
            Some(flag) if flag.is_cancelled() => Err(PipelineError::Cancelled),
            _ => Ok(()),
        }
    }

    fn apply_transforms(
        &self,
        input: &Frame,
        transforms: &[Arc<dyn PreTransform>],
        issues: &mut IssueBuffer,
    ) -> Result<Frame, PipelineError> {
        let mut frame = input.clone();
        if transforms.is_empty() {
            return Ok(frame);
        }
        let bucket = self.options.transform_bucket();
        issues.register(bucket.clone());

        for transform in transforms {
            self.check_cancelled()?;
            let name = transform.name();
            let output = transform.apply(&frame).map_err(|err| {
                PipelineError::InvalidTransformOutput {
                    transform: name.to_string(),
                    message: err.to_string(),
                }
            })?;
            if output.frame.height() != frame.height() {
                return Err(PipelineError::InvalidTransformOutput {
                    transform: name.to_string(),
                    message: format!(
                        "changed the row count from {} to {}",
                        frame.height(),
                        output.frame.height()
                    ),
                });
            }
            debug!(transform = name, issues = output.issues.len(), "pre-transform applied");
            issues.extend(output.issues.into_iter().map(|issue| {
                Issue {
                    category: bucket.clone(),
                    ..issue
                }
                .with_severity(self.options.transform_severity)
            }));
            frame = output.frame;
        }
        Ok(frame)
    }

    fn reconcile_columns(
        &self,
        frame: &mut Frame,
        rules: &RuleSet,
        issues: &mut IssueBuffer,
    ) -> Result<(), PipelineError> {
        let mut added = 0usize;
        for (column, rule) in rules.fields() {
            if frame.has_column(column) {
                continue;
            }
            let fill = rule.default_value();
            frame.add_column(column, fill.clone())?;
            issues.push(
                Issue::new(IssueCategory::MissingColumns, column)
                    .with_observed(Value::Null)
                    .with_expected(format!(
                        "column of {}, filled with {fill}",
                        rule.type_description()
                    )),
            );
            debug!(column, "missing column added");
            added += 1;
        }

        let unknown: Vec<String> = frame
            .columns()
            .iter()
            .filter(|column| !rules.contains(column))
            .cloned()
            .collect();
        for column in &unknown {
            if self.options.record_unknown_columns {
                issues.push(
                    Issue::new(IssueCategory::UnknownColumns, column.clone())
                        .with_expected("column declared by the rule set"),
                );
            }
            frame.drop_column(column);
            debug!(column = %column, "unknown column dropped");
        }

        info!(added, dropped = unknown.len(), "columns reconciled");
        Ok(())
    }

    fn normalize(
        &self,
        frame: &Frame,
        rules: &RuleSet,
        issues: &mut IssueBuffer,
    ) -> Result<(Vec<NormalizedRow>, Vec<usize>), PipelineError> {
        let validator = FieldValidator::new().with_trim(self.options.trim_strings);
        let normalizer = RowNormalizer::new(rules).with_validator(validator);
        let mut normalized = Vec::with_capacity(frame.height());
        let mut dropped = Vec::new();

        for (index, row) in frame.rows().iter().enumerate() {
            self.check_cancelled()?;
            match normalizer.normalize(index, row, issues) {
                Some(row) => normalized.push(row),
                None => dropped.push(index),
            }
        }

        info!(rows = normalized.len(), dropped = dropped.len(), "rows normalized");
        Ok((normalized, dropped))
    }

    fn enforce_uniqueness(
        &self,
        rows: Vec<NormalizedRow>,
        rules: &RuleSet,
        key_fn: Option<KeyFn>,
        issues: &mut IssueBuffer,
    ) -> Result<(Vec<NormalizedRow>, Vec<usize>), PipelineError> {
        let mut index = UniquenessIndex::new(rules);
        if let Some(key_fn) = key_fn {
            index = index.with_key_fn(key_fn);
        }
        let mut kept = Vec::with_capacity(rows.len());
        let mut dropped = Vec::new();

        for mut row in rows {
            self.check_cancelled()?;
            if index.admit(&mut row, issues) {
                kept.push(row);
            } else {
                dropped.push(row.index);
            }
        }

        info!(kept = kept.len(), dropped = dropped.len(), "uniqueness enforced");
        Ok((kept, dropped))
    }
}
