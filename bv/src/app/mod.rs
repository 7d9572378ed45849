//! Event dispatch
//!
//! The [`App`] turns one operator [`Event`] into at most one pipeline trigger
//! and answers with a [`RenderModel`] built from the session's cache.

mod events;
mod state;

pub use events::Event;
pub use state::{Action, Notice, NoticeLevel, RenderModel, Section};

use tracing::debug;

use crate::cache::{StageCache, StageKey};
use crate::pipeline::{Pipeline, PipelineError, PipelineState, StageOutcome, Trigger, UpstreamError};
use crate::session::Session;

/// Dispatches events against a pipeline
pub struct App {
    pipeline: Pipeline,
}

impl App {
    pub fn new(pipeline: Pipeline) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Handle one event and describe the resulting session
    ///
    /// Runs to completion before returning; the caller holds the session
    /// exclusively for the duration.
    pub async fn handle_event(&self, session: &mut Session, event: Event) -> RenderModel {
        debug!(?event, session = %session.id(), "App::handle_event: called");
        let mut notices = Vec::new();

        match event.trigger() {
            Some(trigger) => {
                let notice = match self.pipeline.run_stage(trigger.clone(), session).await {
                    Ok(outcome) => success_notice(&trigger, &outcome, session.cache()),
                    Err(e) => failure_notice(&e),
                };
                notices.push(notice);
            }
            None => {
                if let Event::SubmitUrl(_) = event {
                    notices.push(Notice::warning("Enter a company URL to fetch"));
                }
            }
        }

        self.render(session, notices)
    }

    /// Build the render model for the session's current cache
    pub fn render(&self, session: &Session, mut notices: Vec<Notice>) -> RenderModel {
        debug!(session = %session.id(), "App::render: called");
        let cache = session.cache();
        let state = PipelineState::of(cache);

        let (digest, competitors) = match self.pipeline.summarize(cache) {
            Some(d) => {
                let competitors = d.competitors.clone();
                match self.pipeline.render_digest(&d) {
                    Ok(text) => (Some(text), competitors),
                    Err(e) => {
                        notices.push(Notice::error(format!("Could not render company digest: {}", e)));
                        (None, competitors)
                    }
                }
            }
            None => (None, Vec::new()),
        };

        let mut actions = vec![Action::SubmitUrl];
        if state.can_analyze() {
            actions.push(Action::Analyze);
        }
        if state.can_generate_example() {
            actions.push(Action::GenerateExample);
        }

        RenderModel {
            state,
            session_started_at: session.started_at(),
            company_url: session.company_url().map(str::to_string),
            notices,
            digest,
            competitors,
            analysis: section(cache, StageKey::PostsAnalysis, cache.posts_analysis()),
            example: section(cache, StageKey::ExampleGeneration, cache.example_post()),
            actions,
        }
    }
}

fn section(cache: &StageCache, key: StageKey, text: Option<&str>) -> Option<Section> {
    let entry = cache.entry(key)?;
    text.map(|t| Section {
        text: t.to_string(),
        stale: cache.is_stale(key),
        stored_at: entry.stored_at,
    })
}

fn success_notice(trigger: &Trigger, outcome: &StageOutcome, cache: &StageCache) -> Notice {
    match (trigger, outcome) {
        (_, StageOutcome::NoContent) => Notice::warning("No post content available to analyze"),
        (Trigger::Fetch { .. }, StageOutcome::Stored(_)) => {
            let name = cache.company_info().map(|p| p.display_name()).unwrap_or_default();
            let count = cache.posts().map(|p| p.len()).unwrap_or(0);
            Notice::success(format!("Fetched {} ({} posts)", name, count))
        }
        (Trigger::Analyze, StageOutcome::Stored(_)) => Notice::success("Posts analyzed"),
        (Trigger::GenerateExample, StageOutcome::Stored(_)) => Notice::success("Example post generated"),
    }
}

fn failure_notice(err: &PipelineError) -> Notice {
    match err {
        PipelineError::MissingPrerequisite { .. } => Notice::warning(err.to_string()),
        PipelineError::UpstreamFailure {
            source: UpstreamError::Completion(e),
            ..
        } if e.is_rate_limit() => Notice::error(format!("{}. The gateway is rate limiting, wait before retrying", err)),
        _ => Notice::error(err.to_string()),
    }
}
