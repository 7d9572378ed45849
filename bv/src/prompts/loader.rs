//! Prompt Loader
//!
//! Loads prompt templates from the override directory or falls back to the
//! embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory
    override_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that prefers templates found in `dir`
    pub fn new(dir: Option<&Path>) -> Self {
        debug!(?dir, "PromptLoader::new: called");
        let override_dir = dir.filter(|d| d.is_dir()).map(Path::to_path_buf);
        if dir.is_some() && override_dir.is_none() {
            tracing::warn!("Prompt override directory not found, using embedded prompts");
        }

        Self {
            hbs: Self::engine(),
            override_dir,
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            override_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Output goes to a terminal or an LLM, never to HTML
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. Override: `{dir}/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref dir) = self.override_dir {
            let path = dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read prompt {}: {}", path.display(), e));
            }
        }

        embedded::get_embedded(name)
            .map(str::to_string)
            .ok_or_else(|| eyre!("Prompt template not found: {}", name))
    }

    /// Render a template with the given context
    pub fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        debug!(%template_name, "PromptLoader::render: called");
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// Instruction for the Analyze stage
    pub fn analysis_instruction(&self) -> Result<String> {
        self.load_template("analyze").map(|s| s.trim().to_string())
    }

    /// Instruction for the Generate Example stage
    pub fn example_instruction(&self) -> Result<String> {
        self.load_template("example").map(|s| s.trim().to_string())
    }
}
