//! Company digest
//!
//! A pure projection of the cached profile and posts. It is recomputed on
//! every view and never cached.

use serde::Serialize;

use crate::cache::StageCache;
use crate::provider::{CompanyProfile, NOT_AVAILABLE, PostCollection, SimilarOrganization};

/// Human-readable view of the fetched company data
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Digest {
    pub name: String,
    pub industry: String,
    pub founded: String,
    pub employees: String,
    pub headquarters: String,
    pub website: String,
    pub followers: String,
    pub description: String,
    pub competitors: Vec<SimilarOrganization>,
    pub has_posts: bool,
    pub post_count: usize,
    pub posts_with_text: usize,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

impl Digest {
    /// Project a profile and optional posts into display strings
    pub fn new(profile: &CompanyProfile, posts: Option<&PostCollection>) -> Self {
        let engagement = posts.map(PostCollection::engagement).unwrap_or_default();
        Self {
            name: profile.display_name().to_string(),
            industry: or_marker(profile.industry.clone()),
            founded: or_marker(profile.founded_year.map(|y| y.to_string())),
            employees: or_marker(profile.employee_count.map(group_thousands)),
            headquarters: or_marker(profile.headquarters.clone()),
            website: or_marker(profile.website.clone()),
            followers: or_marker(profile.follower_count.map(group_thousands)),
            description: or_marker(profile.description.clone()),
            competitors: profile.similar_organizations.clone(),
            has_posts: posts.is_some(),
            post_count: posts.map(PostCollection::len).unwrap_or(0),
            posts_with_text: posts.map(|p| p.iter().filter(|post| post.content().is_some()).count()).unwrap_or(0),
            likes: engagement.likes,
            comments: engagement.comments,
            shares: engagement.shares,
        }
    }

    /// Digest of the session's cached data, if a fetch has succeeded
    pub fn from_cache(cache: &StageCache) -> Option<Self> {
        cache.company_info().map(|profile| Self::new(profile, cache.posts()))
    }
}

fn or_marker(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
