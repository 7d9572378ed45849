//! brandvoice - company post-style analysis
//!
//! brandvoice fetches a company's profile and recent posts from a
//! company-data provider, asks an LLM gateway to characterize how the company
//! writes, and then drafts a prompt plus an example post in the same voice.
//!
//! # Core Concepts
//!
//! - **Explicit stages**: fetch, analyze and generate-example only run when
//!   the operator triggers them
//! - **Per-session cache**: every stage result lives in the session that
//!   produced it and disappears at logout
//! - **No partial writes**: a failed stage leaves the cache exactly as it was
//! - **No retries**: every failure is reported once and waits for the operator
//!
//! # Modules
//!
//! - [`provider`] - Company-data provider client
//! - [`llm`] - LLM client trait and chat-completions implementation
//! - [`cache`] - Per-session stage cache
//! - [`pipeline`] - Stage orchestration and the company digest
//! - [`session`] - Login and session lifetime
//! - [`app`] - Event dispatch and render model
//! - [`repl`] - Interactive driver
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod app;
pub mod cache;
pub mod cli;
pub mod config;
pub mod llm;
pub mod pipeline;
pub mod prompts;
pub mod provider;
pub mod repl;
pub mod session;

// Re-export commonly used types
pub use app::{App, Event, RenderModel};
pub use cache::{StageCache, StageKey, StageResult};
pub use config::{Config, Credentials};
pub use llm::{CompletionError, LlmClient, OpenAIClient};
pub use pipeline::{Pipeline, PipelineError, PipelineState, StageOutcome, Trigger};
pub use prompts::PromptLoader;
pub use provider::{CompanyDataProvider, CompanyProfile, FetchError, PostCollection, RapidApiProvider};
pub use session::{AuthError, Authenticator, Session};
