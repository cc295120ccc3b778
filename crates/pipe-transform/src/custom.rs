//! Caller-supplied transformations.
//!
//! The caller registers named transformations; the configuration chooses
//! which to run, in order, with which keyword arguments. Names are checked
//! against the registry before any plan is extended.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use pipe_model::{ConfigError, CustomTransformSpec, Kwargs, PipelineError, Result};
use polars::prelude::{LazyFrame, PolarsResult};
use tracing::{debug, info};

/// A named transformation over a deferred plan.
pub trait CustomTransform: Send + Sync {
    fn apply(&self, lf: LazyFrame, kwargs: &Kwargs) -> PolarsResult<LazyFrame>;
}

impl<F> CustomTransform for F
where
    F: Fn(LazyFrame, &Kwargs) -> PolarsResult<LazyFrame> + Send + Sync,
{
    fn apply(&self, lf: LazyFrame, kwargs: &Kwargs) -> PolarsResult<LazyFrame> {
        self(lf, kwargs)
    }
}

/// Name to transformation map supplied by the caller.
#[derive(Clone, Default)]
pub struct CustomTransformRegistry {
    transforms: BTreeMap<String, Arc<dyn CustomTransform>>,
}

impl CustomTransformRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a transformation, replacing any previous one with the same name.
    pub fn register(&mut self, name: impl Into<String>, transform: impl CustomTransform + 'static) {
        self.transforms.insert(name.into(), Arc::new(transform));
    }

    pub fn with(mut self, name: impl Into<String>, transform: impl CustomTransform + 'static) -> Self {
        self.register(name, transform);
        self
    }

    pub fn contains(&self, name: &str) -> bool {
        self.transforms.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.transforms.keys().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// Fail on the first configured name that is not registered.
    pub fn check(&self, specs: &[CustomTransformSpec]) -> std::result::Result<(), ConfigError> {
        match specs.iter().find(|spec| !self.contains(&spec.name)) {
            Some(spec) => Err(ConfigError::UnknownCustomTransform {
                name: spec.name.clone(),
                registered: self.names().collect::<Vec<_>>().join(", "),
            }),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for CustomTransformRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CustomTransformRegistry")
            .field("names", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Apply configured custom transformations in list order.
pub fn pipe_custom_transformations(
    lf: LazyFrame,
    specs: Option<&[CustomTransformSpec]>,
    registry: &CustomTransformRegistry,
) -> Result<LazyFrame> {
    let Some(specs) = specs else {
        debug!("No custom transformations provided");
        return Ok(lf);
    };
    registry.check(specs)?;

    let mut lf = lf;
    for spec in specs {
        let Some(transform) = registry.transforms.get(&spec.name) else {
            continue;
        };
        info!(transform = %spec.name, "Applying custom transformation");
        lf = transform
            .apply(lf, &spec.kwargs)
            .map_err(|e| PipelineError::CustomTransform {
                name: spec.name.clone(),
                message: e.to_string(),
            })?;
    }
    Ok(lf)
}
