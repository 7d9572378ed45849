//! Prompt Template System
//!
//! Loads the stage instructions and the company digest template.
//!
//! Template loading chain:
//! 1. `{prompts-dir}/{name}.pmt` (user override, when configured)
//! 2. Embedded fallback in code
//!
//! Templates use Handlebars syntax for variable substitution.

pub mod embedded;
mod loader;

pub use loader::PromptLoader;
