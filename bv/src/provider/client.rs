//! CompanyDataProvider trait definition

use async_trait::async_trait;

use super::{CompanyProfile, FetchError, PostCollection, PostLimits};

/// Source of company profiles and posts
///
/// Implementations only perform the network call and normalize its failure;
/// they never touch session state.
#[async_trait]
pub trait CompanyDataProvider: Send + Sync {
    /// Fetch the company profile behind `company_url`
    ///
    /// The URL is passed through untouched; rejecting malformed URLs is the
    /// provider's job.
    async fn fetch_profile(&self, company_url: &str) -> Result<CompanyProfile, FetchError>;

    /// Fetch the company's recent posts
    async fn fetch_posts(&self, company_url: &str, limits: &PostLimits) -> Result<PostCollection, FetchError>;
}
