//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Five-point posts analysis instruction
pub const ANALYZE: &str = include_str!("../../prompts/analyze.pmt");

/// Style-matching prompt and sample post instruction
pub const EXAMPLE: &str = include_str!("../../prompts/example.pmt");

/// Company digest layout
pub const DIGEST: &str = include_str!("../../prompts/digest.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "analyze" => Some(ANALYZE),
        "example" => Some(EXAMPLE),
        "digest" => Some(DIGEST),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
