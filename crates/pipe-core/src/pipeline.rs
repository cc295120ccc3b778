//! Pipeline composition.
//!
//! The composer threads a deferred plan through a fixed stage order:
//!
//! 1. `check_expected_cols` against the raw input
//! 2. `validate`: valid/invalid split (invalid rows are terminal)
//! 3. `add_hash_col`, `add_process_cols` on valid rows
//! 4. pre-transform statistics
//! 5. `normalise_str_cols`, `deduplicate_rows`, `unnest_df_cols`,
//!    `filter_df`, `fill_nulls_per_col`, `recast_df_cols`, `clip_df_cols`,
//!    `derive_new_cols`, `rename_df_cols`, `nest_df_cols`, `drop_df_cols`,
//!    `pipe_custom_transformations`
//! 6. post-transform statistics
//!
//! Nothing is executed while composing; only schemas are resolved.

use pipe_model::{ConfigError, Result, RunConfig, RunContext};
use pipe_transform::{
    CustomTransformRegistry, DeriveFn, add_hash_col, add_process_cols, clip_df_cols,
    deduplicate_rows, derive_new_cols, describe, drop_df_cols, fill_nulls_per_col, filter_df,
    nest_df_cols, normalise_str_cols, pipe_custom_transformations, recast_df_cols,
    rename_df_cols, unnest_df_cols,
};
use pipe_validate::{Rule, RuleSet, ValidationOutcome, check_expected_cols, validate};
use polars::prelude::LazyFrame;
use tracing::{debug, info_span};

/// The four deferred outputs of one composed pipeline.
#[derive(Clone)]
pub struct ComposedPlan {
    /// Valid rows after every transformation stage.
    pub transformed: LazyFrame,
    /// Rejected rows with `error_reason`.
    pub invalid: LazyFrame,
    /// Statistics over valid rows before transformation.
    pub pre_stats: LazyFrame,
    /// Statistics over valid rows after transformation.
    pub post_stats: LazyFrame,
}

impl ComposedPlan {
    /// Optimized logical plan of the transformed output.
    pub fn explain(&self) -> Result<String> {
        Ok(self.transformed.explain(true)?)
    }
}

/// A configured pipeline, checked eagerly and ready to compose.
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: RunConfig,
    ctx: RunContext,
    rules: RuleSet,
    registry: CustomTransformRegistry,
}

impl Pipeline {
    /// Build a pipeline, failing on any configuration error before data is read.
    ///
    /// Checks rule syntax, filter syntax, derive function names and
    /// arguments, and that every configured custom transformation is
    /// registered.
    pub fn new(
        config: RunConfig,
        ctx: RunContext,
        registry: CustomTransformRegistry,
    ) -> Result<Self> {
        config.check()?;
        if ctx.process_name != config.process_name {
            return Err(ConfigError::invalid_field(
                "process_name",
                format!(
                    "run context is for '{}' but the configuration is for '{}'",
                    ctx.process_name, config.process_name
                ),
            )
            .into());
        }

        let rules = RuleSet::from_optional(config.validation.as_ref())?;
        RuleSet::from_optional(config.transformations.filter_exprs.as_ref())?;
        for (column, spec) in config.transformations.new_col_map.iter().flatten() {
            DeriveFn::lookup(&spec.fn_name, column)?.build(&spec.fn_kwargs)?;
        }
        if let Some(specs) = &config.custom_transformations {
            registry.check(specs)?;
        }

        debug!(
            process = %config.process_name,
            rules = rules.len(),
            custom = registry.names().count(),
            "Pipeline configured"
        );
        Ok(Self {
            config,
            ctx,
            rules,
            registry,
        })
    }

    /// Add a programmatic validation rule.
    pub fn with_rule(mut self, rule: Rule) -> Result<Self> {
        self.rules.add(rule)?;
        Ok(self)
    }

    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Compose the full stage sequence over `source`.
    pub fn compose(&self, source: LazyFrame) -> Result<ComposedPlan> {
        let span = info_span!("compose", process = %self.config.process_name);
        let _guard = span.enter();

        let mut source = source;
        check_expected_cols(
            &mut source,
            self.config.expected_cols.as_deref(),
            &self.rules,
        )?;

        let ValidationOutcome { valid, invalid } = validate(source, &self.rules)?;
        let stamped = add_process_cols(add_hash_col(valid)?, &self.ctx);
        let pre_stats = describe(stamped.clone())?;

        let transformed = self.apply_stages(stamped)?;
        let post_stats = describe(transformed.clone())?;

        Ok(ComposedPlan {
            transformed,
            invalid,
            pre_stats,
            post_stats,
        })
    }

    fn apply_stages(&self, lf: LazyFrame) -> Result<LazyFrame> {
        let t = &self.config.transformations;
        let lf = normalise_str_cols(lf)?;
        let lf = deduplicate_rows(lf, t.deduplicate.as_ref())?;
        let lf = unnest_df_cols(lf, t.unnest_cols.as_deref())?;
        let lf = filter_df(lf, t.filter_exprs.as_ref())?;
        let lf = fill_nulls_per_col(lf, t.fill_map.as_ref())?;
        let lf = recast_df_cols(lf, t.recast_map.as_ref())?;
        let lf = clip_df_cols(lf, t.clip_map.as_ref())?;
        let lf = derive_new_cols(lf, t.new_col_map.as_ref())?;
        let lf = rename_df_cols(lf, t.rename_map.as_ref())?;
        let lf = nest_df_cols(lf, t.nest_cols.as_ref())?;
        let lf = drop_df_cols(lf, t.drop_cols.as_deref())?;
        pipe_custom_transformations(
            lf,
            self.config.custom_transformations.as_deref(),
            &self.registry,
        )
    }
}
