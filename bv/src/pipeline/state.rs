//! Pipeline progress derived from the stage cache

use std::fmt;

use serde::Serialize;

use crate::cache::{StageCache, StageKey};

/// How far a session has progressed
///
/// Never stored: always computed from which cache slots are populated, so it
/// cannot drift from the cache. Transitions only move forward; logout is the
/// only way back to `Empty`. A successful fetch stores both the profile and
/// the posts, so `InfoFetched` is only seen on a cache filled by hand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum PipelineState {
    Empty,
    InfoFetched,
    PostsFetched,
    Analyzed,
    ExampleGenerated,
}

impl PipelineState {
    pub fn of(cache: &StageCache) -> Self {
        if cache.contains(StageKey::ExampleGeneration) {
            PipelineState::ExampleGenerated
        } else if cache.contains(StageKey::PostsAnalysis) {
            PipelineState::Analyzed
        } else if cache.contains(StageKey::Posts) {
            PipelineState::PostsFetched
        } else if cache.contains(StageKey::CompanyInfo) {
            PipelineState::InfoFetched
        } else {
            PipelineState::Empty
        }
    }

    pub fn can_analyze(&self) -> bool {
        *self >= PipelineState::PostsFetched
    }

    pub fn can_generate_example(&self) -> bool {
        *self >= PipelineState::Analyzed
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PipelineState::Empty => "empty",
            PipelineState::InfoFetched => "company info fetched",
            PipelineState::PostsFetched => "posts fetched",
            PipelineState::Analyzed => "analyzed",
            PipelineState::ExampleGenerated => "example generated",
        };
        write!(f, "{}", name)
    }
}
