//! Run errors.

use pipe_model::PipelineError;
use thiserror::Error;

/// Failure of a chunked run: either the pipeline or the sink.
#[derive(Debug, Error)]
pub enum RunError<E>
where
    E: std::error::Error + 'static,
{
    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    /// The sink could not persist an artifact.
    #[error("failed to persist {artifact}")]
    Sink {
        artifact: String,
        #[source]
        source: E,
    },
}

impl<E> RunError<E>
where
    E: std::error::Error + 'static,
{
    pub fn sink(artifact: impl Into<String>, source: E) -> Self {
        Self::Sink {
            artifact: artifact.into(),
            source,
        }
    }
}
