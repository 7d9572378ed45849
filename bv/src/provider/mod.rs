//! Company-data provider client
//!
//! Fetches company profiles and recent posts and normalizes every failure
//! into a [`FetchError`].

use std::sync::Arc;

use tracing::debug;

pub mod client;
mod error;
mod http;
mod types;

pub use client::CompanyDataProvider;
pub use error::FetchError;
pub use http::RapidApiProvider;
pub use types::{CompanyProfile, Engagement, NOT_AVAILABLE, Post, PostCollection, PostLimits, SimilarOrganization};

use crate::config::ProviderConfig;

/// Create the provider client from configuration
pub fn create_provider(config: &ProviderConfig, api_key: &str) -> Result<Arc<dyn CompanyDataProvider>, FetchError> {
    debug!(base_url = %config.base_url, "create_provider: called");
    Ok(Arc::new(RapidApiProvider::from_config(config, api_key)?))
}
