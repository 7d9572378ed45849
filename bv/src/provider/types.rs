//! Company profile and post records
//!
//! Provider documents are loosely typed: field names drift between API
//! revisions and numbers sometimes arrive as strings. Every record here is
//! built by probing a list of candidate keys and coercing leniently, so an
//! absent or oddly typed field becomes `None` instead of a decode failure.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use super::FetchError;

/// Marker rendered for any absent profile field
pub const NOT_AVAILABLE: &str = "Not available";

/// Post/comment/repost counts requested from the posts endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PostLimits {
    pub posts: u32,
    pub comments: u32,
    pub reposts: u32,
}

impl Default for PostLimits {
    fn default() -> Self {
        Self {
            posts: 30,
            comments: 10,
            reposts: 5,
        }
    }
}

/// An organization listed as similar to the profiled company
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimilarOrganization {
    pub name: String,
    pub url: Option<String>,
}

/// Company profile as returned by the provider
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyProfile {
    pub name: Option<String>,
    pub industry: Option<String>,
    pub founded_year: Option<i64>,
    pub employee_count: Option<u64>,
    pub headquarters: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub follower_count: Option<u64>,
    pub similar_organizations: Vec<SimilarOrganization>,
}

impl CompanyProfile {
    /// Build a profile from a provider response document
    ///
    /// The record may be wrapped in a `data` or `response` envelope. Anything
    /// other than a JSON object at the record position is a decode failure.
    pub fn from_document(doc: &Value) -> Result<Self, FetchError> {
        debug!("CompanyProfile::from_document: called");
        let obj = unwrap_envelope(doc)
            .as_object()
            .ok_or_else(|| FetchError::Decode("company profile is not a JSON object".to_string()))?;

        let profile = Self {
            name: first_string(obj, &["name", "company_name", "companyName", "title"]),
            industry: first_string(obj, &["industry", "industries", "industryName"]),
            founded_year: first_year(obj, &["founded", "founded_year", "foundedOn", "year_founded"]),
            employee_count: first_count(obj, &["employee_count", "employeeCount", "staffCount", "employees"]),
            headquarters: first_location(obj, &["headquarters", "headquarter", "hq", "hq_full_address"]),
            description: first_string(obj, &["description", "about", "tagline"]),
            website: first_string(obj, &["website", "websiteUrl", "company_website", "url"]),
            follower_count: first_count(obj, &["follower_count", "followerCount", "followers"]),
            similar_organizations: similar_organizations(obj),
        };
        debug!(name = ?profile.name, similar = profile.similar_organizations.len(), "CompanyProfile::from_document: parsed");
        Ok(profile)
    }

    /// Display name, or the not-available marker
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(NOT_AVAILABLE)
    }
}

/// A single company post
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub text: Option<String>,
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
    pub url: Option<String>,
}

impl Post {
    /// Post with text and no engagement
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Object(obj) => Self {
                text: first_string(obj, &["postText", "text", "commentary", "content"]),
                likes: first_count(obj, &["likes", "numLikes", "totalReactionCount", "reactions"]).unwrap_or(0),
                comments: first_count(obj, &["comments", "numComments", "commentsCount"]).unwrap_or(0),
                shares: first_count(obj, &["shares", "reposts", "numShares", "repostsCount"]).unwrap_or(0),
                url: first_string(obj, &["postUrl", "post_url", "url"]),
            },
            Value::String(s) => Self::with_text(s.clone()),
            _ => Self::default(),
        }
    }

    /// Text if it has any non-whitespace content
    pub fn content(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.trim().is_empty())
    }
}

/// Totals over a post collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Engagement {
    pub likes: u64,
    pub comments: u64,
    pub shares: u64,
}

/// Posts in provider return order (most recent first, not guaranteed)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostCollection {
    pub posts: Vec<Post>,
}

impl PostCollection {
    pub fn new(posts: Vec<Post>) -> Self {
        Self { posts }
    }

    /// Build a collection from a provider response document
    ///
    /// Accepts a bare array or an array under `response`, `data` or `posts`.
    pub fn from_document(doc: &Value) -> Result<Self, FetchError> {
        debug!("PostCollection::from_document: called");
        let items = match doc {
            Value::Array(items) => items,
            Value::Object(obj) => ["response", "data", "posts"]
                .iter()
                .find_map(|k| obj.get(*k).and_then(Value::as_array))
                .ok_or_else(|| FetchError::Decode("posts response has no post list".to_string()))?,
            _ => return Err(FetchError::Decode("posts response is not a JSON object".to_string())),
        };

        let posts: Vec<Post> = items.iter().map(Post::from_value).collect();
        debug!(count = posts.len(), "PostCollection::from_document: parsed");
        Ok(Self { posts })
    }

    pub fn len(&self) -> usize {
        self.posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Post> {
        self.posts.iter()
    }

    /// Post texts joined by a blank line
    ///
    /// Missing and whitespace-only texts are skipped, so `["A", "", "C"]`
    /// joins to `"A\n\nC"`. Returns an empty string when no post has content.
    pub fn joined_text(&self) -> String {
        self.posts.iter().filter_map(Post::content).collect::<Vec<_>>().join("\n\n")
    }

    pub fn engagement(&self) -> Engagement {
        self.posts.iter().fold(Engagement::default(), |acc, p| Engagement {
            likes: acc.likes.saturating_add(p.likes),
            comments: acc.comments.saturating_add(p.comments),
            shares: acc.shares.saturating_add(p.shares),
        })
    }
}

fn unwrap_envelope(doc: &Value) -> &Value {
    if let Value::Object(obj) = doc {
        for key in ["data", "response"] {
            if let Some(inner) = obj.get(key).filter(|v| v.is_object()) {
                return inner;
            }
        }
    }
    doc
}

fn first_string(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| obj.get(*k).and_then(as_text))
}

fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Array(items) => {
            let parts: Vec<String> = items.iter().filter_map(as_text).collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        Value::Object(obj) => first_string(obj, &["name", "title", "value"]),
        _ => None,
    }
}

fn first_count(obj: &Map<String, Value>, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|k| obj.get(*k).and_then(as_count))
}

fn as_count(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().replace(',', "").parse().ok(),
        _ => None,
    }
}

fn first_year(obj: &Map<String, Value>, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        Value::Object(inner) => inner.get("year").and_then(Value::as_i64),
        _ => None,
    })
}

fn first_location(obj: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|k| match obj.get(*k)? {
        Value::Object(inner) => {
            let parts: Vec<String> = ["line1", "city", "geographicArea", "region", "country"]
                .iter()
                .filter_map(|f| inner.get(*f).and_then(as_text))
                .collect();
            if parts.is_empty() { None } else { Some(parts.join(", ")) }
        }
        other => as_text(other),
    })
}

fn similar_organizations(obj: &Map<String, Value>) -> Vec<SimilarOrganization> {
    let Some(items) = ["similar_companies", "similarOrganizations", "similar_organizations", "affiliated_companies"]
        .iter()
        .find_map(|k| obj.get(*k).and_then(Value::as_array))
    else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| match item {
            Value::String(name) if !name.trim().is_empty() => Some(SimilarOrganization {
                name: name.trim().to_string(),
                url: None,
            }),
            Value::Object(o) => first_string(o, &["name", "title", "company_name"]).map(|name| SimilarOrganization {
                name,
                url: first_string(o, &["url", "link", "linkedin_url"]),
            }),
            _ => None,
        })
        .collect()
}
