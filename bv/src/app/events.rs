//! Operator events
//!
//! Everything the operator can do to a session arrives as one of these. The
//! driver translates key presses or command lines into an [`Event`] and hands
//! it to [`super::App::handle_event`].

use crate::pipeline::Trigger;

/// An operator action
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// A company URL was entered; fetches its profile and posts
    SubmitUrl(String),
    /// Analyze the fetched posts
    Analyze,
    /// Generate an example post from the analysis
    GenerateExample,
    /// Redraw from the cache without running anything
    Refresh,
}

impl Event {
    /// Pipeline trigger for this event, if it runs a stage
    ///
    /// Blank URLs produce no trigger.
    pub fn trigger(&self) -> Option<Trigger> {
        match self {
            Event::SubmitUrl(url) => {
                let url = url.trim();
                (!url.is_empty()).then(|| Trigger::Fetch {
                    company_url: url.to_string(),
                })
            }
            Event::Analyze => Some(Trigger::Analyze),
            Event::GenerateExample => Some(Trigger::GenerateExample),
            Event::Refresh => None,
        }
    }
}
