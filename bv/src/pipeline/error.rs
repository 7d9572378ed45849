//! Pipeline error types

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::cache::StageKey;
use crate::llm::CompletionError;
use crate::provider::FetchError;

/// Triggerable pipeline stages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Fetch,
    Analyze,
    GenerateExample,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Fetch => "fetch",
            Stage::Analyze => "analyze",
            Stage::GenerateExample => "generate example",
        }
    }

    /// Stage that fills a cache slot
    pub fn producing(key: StageKey) -> Stage {
        match key {
            StageKey::CompanyInfo | StageKey::Posts => Stage::Fetch,
            StageKey::PostsAnalysis => Stage::Analyze,
            StageKey::ExampleGeneration => Stage::GenerateExample,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn producer_of(key: &StageKey) -> Stage {
    Stage::producing(*key)
}

/// Failure reported by an external client
#[derive(Debug, Clone, Error)]
pub enum UpstreamError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

impl UpstreamError {
    /// Short machine-readable reason of the underlying failure
    pub fn reason(&self) -> &'static str {
        match self {
            UpstreamError::Fetch(e) => e.reason(),
            UpstreamError::Completion(e) => e.reason(),
        }
    }
}

/// Errors returned by a stage trigger
///
/// Neither variant ever leaves a partial write behind in the session cache.
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("Cannot {stage}: no {missing} yet, run {} first", producer_of(.missing))]
    MissingPrerequisite { stage: Stage, missing: StageKey },

    #[error("{stage} failed: {source}")]
    UpstreamFailure {
        stage: Stage,
        #[source]
        source: UpstreamError,
    },
}

impl PipelineError {
    pub(crate) fn upstream(stage: Stage, source: impl Into<UpstreamError>) -> Self {
        PipelineError::UpstreamFailure {
            stage,
            source: source.into(),
        }
    }

    /// Stage that raised the error
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::MissingPrerequisite { stage, .. } | PipelineError::UpstreamFailure { stage, .. } => *stage,
        }
    }

    /// Short machine-readable reason
    pub fn reason(&self) -> &'static str {
        match self {
            PipelineError::MissingPrerequisite { .. } => "missing_prerequisite",
            PipelineError::UpstreamFailure { source, .. } => source.reason(),
        }
    }

    /// True when the provider or the gateway asked the operator to back off
    pub fn is_rate_limited(&self) -> bool {
        match self {
            PipelineError::UpstreamFailure {
                source: UpstreamError::Fetch(e),
                ..
            } => e.is_rate_limit(),
            PipelineError::UpstreamFailure {
                source: UpstreamError::Completion(e),
                ..
            } => e.is_rate_limit(),
            PipelineError::MissingPrerequisite { .. } => false,
        }
    }

    /// Suggested wait before retrying, when the provider sent one
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            PipelineError::UpstreamFailure {
                source: UpstreamError::Fetch(e),
                ..
            } => e.retry_after(),
            _ => None,
        }
    }
}
