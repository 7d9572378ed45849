//! Stage orchestration
//!
//! The [`Pipeline`] runs one stage per trigger against a session's cache:
//!
//! - **Fetch**: profile, then posts. Both must succeed before either is
//!   stored.
//! - **Analyze**: needs cached posts. Sends the joined post text with the
//!   analysis instruction and stores the reply.
//! - **Generate example**: needs a cached analysis. Sends it with the example
//!   instruction and stores the reply.
//!
//! The company digest is a projection of cached data, recomputed on every
//! view. A failed stage returns an error and leaves every slot as it was.
//! Nothing is retried.

use std::sync::Arc;

use eyre::{Context, Result};
use tracing::{debug, info, warn};

mod error;
mod state;
mod summary;

pub use error::{PipelineError, Stage, UpstreamError};
pub use state::PipelineState;
pub use summary::Digest;

use crate::cache::{StageCache, StageKey, StageResult};
use crate::config::{Config, Credentials};
use crate::llm::{self, LlmClient};
use crate::prompts::PromptLoader;
use crate::provider::{self, CompanyDataProvider, CompanyProfile, PostLimits};
use crate::session::Session;

/// An explicit request to run one stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Fetch { company_url: String },
    Analyze,
    GenerateExample,
}

impl Trigger {
    pub fn stage(&self) -> Stage {
        match self {
            Trigger::Fetch { .. } => Stage::Fetch,
            Trigger::Analyze => Stage::Analyze,
            Trigger::GenerateExample => Stage::GenerateExample,
        }
    }
}

/// What a successful trigger did to the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StageOutcome {
    /// These slots were overwritten
    Stored(Vec<StageKey>),
    /// The cached posts carry no text; nothing was sent and nothing stored
    NoContent,
}

/// Runs pipeline stages against session caches
pub struct Pipeline {
    provider: Arc<dyn CompanyDataProvider>,
    llm: Arc<dyn LlmClient>,
    prompts: PromptLoader,
    analysis_instruction: String,
    example_instruction: String,
    limits: PostLimits,
    role: String,
    max_tokens: u32,
}

impl Pipeline {
    /// Build a pipeline around existing clients
    ///
    /// Loads both stage instructions and test-renders the digest template up
    /// front, so a broken prompt override fails here and not mid-session.
    pub fn new(provider: Arc<dyn CompanyDataProvider>, llm: Arc<dyn LlmClient>, prompts: PromptLoader) -> Result<Self> {
        debug!("Pipeline::new: called");
        let analysis_instruction = prompts.analysis_instruction()?;
        let example_instruction = prompts.example_instruction()?;
        prompts
            .render("digest", &Digest::new(&CompanyProfile::default(), None))
            .context("Digest template does not render")?;

        Ok(Self {
            provider,
            llm,
            prompts,
            analysis_instruction,
            example_instruction,
            limits: PostLimits::default(),
            role: llm::DEFAULT_ROLE.to_string(),
            max_tokens: llm::DEFAULT_MAX_TOKENS,
        })
    }

    /// Build the provider and gateway clients from configuration
    pub fn from_config(config: &Config, credentials: &Credentials) -> Result<Self> {
        debug!("Pipeline::from_config: called");
        let provider = provider::create_provider(&config.provider, &credentials.provider_key)
            .context("Failed to create provider client")?;
        let llm = llm::create_client(&config.llm, &credentials.gateway_key).context("Failed to create LLM client")?;
        let prompts = PromptLoader::new(config.prompts_dir.as_deref());

        Ok(Self::new(provider, llm, prompts)?
            .with_limits(config.provider.limits)
            .with_role(&config.llm.role)
            .with_max_tokens(config.llm.max_tokens))
    }

    pub fn with_limits(mut self, limits: PostLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = role.into();
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Run one stage to completion
    ///
    /// On success the stage's own slots are overwritten and nothing else is
    /// touched. On failure the cache is exactly as it was.
    pub async fn run_stage(&self, trigger: Trigger, session: &mut Session) -> Result<StageOutcome, PipelineError> {
        let stage = trigger.stage();
        debug!(%stage, session = %session.id(), "Pipeline::run_stage: called");

        let result = match trigger {
            Trigger::Fetch { company_url } => self.fetch(&company_url, session).await,
            Trigger::Analyze => self.analyze(session).await,
            Trigger::GenerateExample => self.generate_example(session).await,
        };

        match &result {
            Ok(outcome) => info!(%stage, ?outcome, "Stage finished"),
            Err(e) if e.is_rate_limited() => warn!(%stage, retry_after = ?e.retry_after(), "Stage rate limited: {}", e),
            Err(e) => warn!(%stage, reason = e.reason(), "Stage failed: {}", e),
        }
        result
    }

    /// Fetch profile and posts for `company_url`
    pub async fn fetch(&self, company_url: &str, session: &mut Session) -> Result<StageOutcome, PipelineError> {
        debug!(%company_url, "Pipeline::fetch: called");
        let profile = self
            .provider
            .fetch_profile(company_url)
            .await
            .map_err(|e| PipelineError::upstream(Stage::Fetch, e))?;
        let posts = self
            .provider
            .fetch_posts(company_url, &self.limits)
            .await
            .map_err(|e| PipelineError::upstream(Stage::Fetch, e))?;
        debug!(posts = posts.len(), "Pipeline::fetch: both calls succeeded");

        // Posts open the new generation; the profile is stamped with it
        let cache = session.cache_mut();
        cache.put(StageResult::Posts(posts));
        cache.put(StageResult::CompanyInfo(profile));
        session.set_company_url(company_url);

        Ok(StageOutcome::Stored(vec![StageKey::CompanyInfo, StageKey::Posts]))
    }

    /// Analyze the cached posts
    pub async fn analyze(&self, session: &mut Session) -> Result<StageOutcome, PipelineError> {
        debug!("Pipeline::analyze: called");
        let posts = session.cache().posts().ok_or(PipelineError::MissingPrerequisite {
            stage: Stage::Analyze,
            missing: StageKey::Posts,
        })?;

        let text = posts.joined_text();
        if text.is_empty() {
            debug!(posts = posts.len(), "Pipeline::analyze: no post text");
            return Ok(StageOutcome::NoContent);
        }

        let analysis = llm::complete_with_context(
            &self.llm,
            &text,
            &self.analysis_instruction,
            &self.role,
            self.max_tokens,
        )
        .await
        .map_err(|e| PipelineError::upstream(Stage::Analyze, e))?;

        session.cache_mut().put(StageResult::PostsAnalysis(analysis));
        Ok(StageOutcome::Stored(vec![StageKey::PostsAnalysis]))
    }

    /// Generate a style-matching prompt and example post from the cached analysis
    pub async fn generate_example(&self, session: &mut Session) -> Result<StageOutcome, PipelineError> {
        debug!("Pipeline::generate_example: called");
        let analysis = session
            .cache()
            .posts_analysis()
            .ok_or(PipelineError::MissingPrerequisite {
                stage: Stage::GenerateExample,
                missing: StageKey::PostsAnalysis,
            })?
            .to_string();

        let example = llm::complete_with_context(
            &self.llm,
            &analysis,
            &self.example_instruction,
            &self.role,
            self.max_tokens,
        )
        .await
        .map_err(|e| PipelineError::upstream(Stage::GenerateExample, e))?;

        session.cache_mut().put(StageResult::ExampleGeneration(example));
        Ok(StageOutcome::Stored(vec![StageKey::ExampleGeneration]))
    }

    /// Digest of the cached company data, if any has been fetched
    pub fn summarize(&self, cache: &StageCache) -> Option<Digest> {
        Digest::from_cache(cache)
    }

    /// Render a digest through the `digest` template
    pub fn render_digest(&self, digest: &Digest) -> Result<String> {
        debug!(name = %digest.name, "Pipeline::render_digest: called");
        self.prompts.render("digest", digest).map(|s| s.trim_end().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthConfig;
    use crate::llm::client::mock::MockLlmClient;
    use crate::llm::{CompletionError, CompletionResponse, Message};
    use crate::provider::client::mock::ScriptedProvider;
    use crate::provider::{FetchError, Post, PostCollection};
    use crate::session::Authenticator;
    use proptest::prelude::*;
    use std::time::Duration;

    const URL: &str = "https://www.linkedin.com/company/acme";

    fn session() -> Session {
        Authenticator::new(&AuthConfig::default()).login("tester", "").unwrap()
    }

    fn pipeline(provider: &Arc<ScriptedProvider>, llm: &Arc<MockLlmClient>) -> Pipeline {
        Pipeline::new(provider.clone(), llm.clone(), PromptLoader::embedded_only()).unwrap()
    }

    fn profile(name: &str) -> CompanyProfile {
        CompanyProfile {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    fn posts(texts: &[&str]) -> PostCollection {
        PostCollection::new(texts.iter().map(|t| Post::with_text(*t)).collect())
    }

    fn snapshot(cache: &StageCache) -> Vec<Option<StageResult>> {
        StageKey::ALL.iter().map(|k| cache.get(*k).cloned()).collect()
    }

    async fn fetched_session() -> Session {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_profile(Ok(profile("Acme"))).push_posts(Ok(posts(&["A", "", "C"])));
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let mut session = session();
        pipeline(&provider, &llm)
            .run_stage(
                Trigger::Fetch {
                    company_url: URL.to_string(),
                },
                &mut session,
            )
            .await
            .unwrap();
        session
    }

    #[tokio::test]
    async fn test_fetch_success_populates_info_and_posts_only() {
        let session = fetched_session().await;

        assert_eq!(session.cache().populated(), vec![StageKey::CompanyInfo, StageKey::Posts]);
        assert_eq!(PipelineState::of(session.cache()), PipelineState::PostsFetched);
        assert_eq!(session.company_url(), Some(URL));
        assert_eq!(session.cache().company_info().unwrap().display_name(), "Acme");
    }

    #[tokio::test]
    async fn test_fetch_posts_rate_limited_leaves_cache_unchanged() {
        let mut session = fetched_session().await;
        let before = snapshot(session.cache());

        let provider = Arc::new(ScriptedProvider::new());
        provider.push_profile(Ok(profile("Other"))).push_posts(Err(FetchError::RateLimited {
            retry_after: Some(Duration::from_secs(60)),
        }));
        let llm = Arc::new(MockLlmClient::new(vec![]));

        let err = pipeline(&provider, &llm)
            .run_stage(
                Trigger::Fetch {
                    company_url: "https://www.linkedin.com/company/other".to_string(),
                },
                &mut session,
            )
            .await
            .unwrap_err();

        assert!(err.is_rate_limited());
        assert_eq!(err.retry_after(), Some(Duration::from_secs(60)));
        assert_eq!(snapshot(session.cache()), before);
        assert_eq!(session.company_url(), Some(URL));
    }

    #[tokio::test]
    async fn test_fetch_profile_failure_skips_posts_call() {
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_profile(Err(FetchError::HttpStatus {
            status: 404,
            message: "no such company".to_string(),
        }));
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let mut session = session();

        let err = pipeline(&provider, &llm).fetch(URL, &mut session).await.unwrap_err();

        assert_eq!(err.reason(), "http_status");
        assert_eq!(provider.profile_calls(), 1);
        assert_eq!(provider.posts_calls(), 0);
        assert!(session.cache().is_empty());
        assert!(session.company_url().is_none());
    }

    #[tokio::test]
    async fn test_analyze_joins_posts_after_instruction() {
        let mut session = fetched_session().await;
        let provider = Arc::new(ScriptedProvider::new());
        let llm = Arc::new(MockLlmClient::with_texts(&["formal tone"]));
        let pipeline = pipeline(&provider, &llm);

        let outcome = pipeline.run_stage(Trigger::Analyze, &mut session).await.unwrap();

        assert_eq!(outcome, StageOutcome::Stored(vec![StageKey::PostsAnalysis]));
        assert_eq!(session.cache().posts_analysis(), Some("formal tone"));
        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let expected = format!("{}\n\nA\n\nC", pipeline.analysis_instruction);
        assert_eq!(requests[0].messages, vec![Message::user(expected)]);
        assert!(requests[0].system_prompt.contains("expert analyst"));
    }

    #[tokio::test]
    async fn test_generate_example_without_analysis_makes_no_call() {
        let mut session = fetched_session().await;
        let provider = Arc::new(ScriptedProvider::new());
        let llm = Arc::new(MockLlmClient::with_texts(&["unused"]));
        let before = snapshot(session.cache());

        let err = pipeline(&provider, &llm)
            .run_stage(Trigger::GenerateExample, &mut session)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            PipelineError::MissingPrerequisite {
                stage: Stage::GenerateExample,
                missing: StageKey::PostsAnalysis,
            }
        ));
        assert_eq!(llm.call_count(), 0);
        assert_eq!(snapshot(session.cache()), before);
    }

    #[tokio::test]
    async fn test_analyze_without_posts_makes_no_call() {
        let provider = Arc::new(ScriptedProvider::new());
        let llm = Arc::new(MockLlmClient::with_texts(&["unused"]));
        let mut session = session();

        let err = pipeline(&provider, &llm).analyze(&mut session).await.unwrap_err();

        assert_eq!(err.reason(), "missing_prerequisite");
        assert_eq!(llm.call_count(), 0);
        assert_eq!(provider.profile_calls() + provider.posts_calls(), 0);
    }

    #[tokio::test]
    async fn test_analyze_timeout_keeps_previous_analysis() {
        let mut session = fetched_session().await;
        let provider = Arc::new(ScriptedProvider::new());
        let llm = Arc::new(MockLlmClient::new(vec![
            Ok(CompletionResponse::text("first analysis")),
            Err(CompletionError::Timeout(Duration::from_secs(30))),
        ]));
        let pipeline = pipeline(&provider, &llm);

        pipeline.analyze(&mut session).await.unwrap();
        let err = pipeline.analyze(&mut session).await.unwrap_err();

        assert_eq!(err.reason(), "timeout");
        assert_eq!(err.stage(), Stage::Analyze);
        assert_eq!(session.cache().posts_analysis(), Some("first analysis"));
    }

    #[tokio::test]
    async fn test_blank_posts_yield_no_content() {
        let provider = Arc::new(ScriptedProvider::new());
        provider
            .push_profile(Ok(profile("Quiet")))
            .push_posts(Ok(PostCollection::new(vec![Post::with_text("  "), Post::default()])));
        let llm = Arc::new(MockLlmClient::with_texts(&["unused"]));
        let pipeline = pipeline(&provider, &llm);
        let mut session = session();

        pipeline.fetch(URL, &mut session).await.unwrap();
        let outcome = pipeline.analyze(&mut session).await.unwrap();

        assert_eq!(outcome, StageOutcome::NoContent);
        assert_eq!(llm.call_count(), 0);
        assert!(session.cache().posts_analysis().is_none());
    }

    #[tokio::test]
    async fn test_rerun_overwrites_only_own_slot() {
        let mut session = fetched_session().await;
        let provider = Arc::new(ScriptedProvider::new());
        let llm = Arc::new(MockLlmClient::with_texts(&["analysis", "example one", "example two"]));
        let pipeline = pipeline(&provider, &llm);

        pipeline.analyze(&mut session).await.unwrap();
        pipeline.generate_example(&mut session).await.unwrap();
        let analysis_before = session.cache().posts_analysis().map(str::to_string);
        pipeline.generate_example(&mut session).await.unwrap();

        assert_eq!(session.cache().example_post(), Some("example two"));
        assert_eq!(session.cache().posts_analysis().map(str::to_string), analysis_before);
        assert_eq!(PipelineState::of(session.cache()), PipelineState::ExampleGenerated);

        // Example request carries the analysis as its subject text
        let requests = llm.requests();
        assert_eq!(
            requests[1].messages,
            vec![Message::user(format!("{}\n\nanalysis", pipeline.example_instruction))]
        );
    }

    #[tokio::test]
    async fn test_refetch_keeps_downstream_but_marks_it_stale() {
        let mut session = fetched_session().await;
        let provider = Arc::new(ScriptedProvider::new());
        provider.push_profile(Ok(profile("Acme"))).push_posts(Ok(posts(&["new post"])));
        let llm = Arc::new(MockLlmClient::with_texts(&["analysis"]));
        let pipeline = pipeline(&provider, &llm);

        pipeline.analyze(&mut session).await.unwrap();
        pipeline.fetch(URL, &mut session).await.unwrap();

        assert_eq!(session.cache().posts_analysis(), Some("analysis"));
        assert!(session.cache().is_stale(StageKey::PostsAnalysis));
    }

    #[test]
    fn test_summarize_is_not_cached() {
        let provider = Arc::new(ScriptedProvider::new());
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let pipeline = pipeline(&provider, &llm);
        let mut cache = StageCache::new();
        assert!(pipeline.summarize(&cache).is_none());

        cache.put(StageResult::CompanyInfo(profile("Acme")));
        cache.put(StageResult::Posts(posts(&["a", "b"])));
        let before = snapshot(&cache);
        let digest = pipeline.summarize(&cache).unwrap();
        let text = pipeline.render_digest(&digest).unwrap();

        assert!(text.starts_with("Acme"));
        assert!(text.contains("Industry:       Not available"));
        assert!(text.contains("Posts fetched:  2 (2 with text)"));
        assert_eq!(snapshot(&cache), before);
    }

    #[test]
    fn test_render_digest_lists_competitors() {
        let provider = Arc::new(ScriptedProvider::new());
        let llm = Arc::new(MockLlmClient::new(vec![]));
        let pipeline = pipeline(&provider, &llm);
        let mut acme = profile("Acme");
        acme.similar_organizations = vec![crate::provider::SimilarOrganization {
            name: "Globex".to_string(),
            url: Some("https://www.linkedin.com/company/globex".to_string()),
        }];

        let text = pipeline.render_digest(&Digest::new(&acme, None)).unwrap();
        assert!(text.contains("Similar organizations:"));
        assert!(text.contains("- Globex (https://www.linkedin.com/company/globex)"));
        assert!(!text.contains("Posts fetched"));
    }

    #[derive(Debug, Clone, Copy)]
    enum Step {
        Fetch { profile_ok: bool, posts_ok: bool },
        Analyze { ok: bool },
        Generate { ok: bool },
    }

    fn step_strategy() -> impl Strategy<Value = Step> {
        prop_oneof![
            (any::<bool>(), any::<bool>()).prop_map(|(profile_ok, posts_ok)| Step::Fetch { profile_ok, posts_ok }),
            any::<bool>().prop_map(|ok| Step::Analyze { ok }),
            any::<bool>().prop_map(|ok| Step::Generate { ok }),
        ]
    }

    fn owned_keys(stage: Stage) -> &'static [StageKey] {
        match stage {
            Stage::Fetch => &[StageKey::CompanyInfo, StageKey::Posts],
            Stage::Analyze => &[StageKey::PostsAnalysis],
            Stage::GenerateExample => &[StageKey::ExampleGeneration],
        }
    }

    async fn run_step(step: Step, n: usize, session: &mut Session) -> (Stage, bool) {
        let provider = Arc::new(ScriptedProvider::new());
        let llm = match step {
            Step::Fetch { profile_ok, posts_ok } => {
                provider.push_profile(if profile_ok {
                    Ok(profile(&format!("company {}", n)))
                } else {
                    Err(FetchError::Transport("refused".to_string()))
                });
                provider.push_posts(if posts_ok {
                    Ok(posts(&[&format!("post {}", n)]))
                } else {
                    Err(FetchError::RateLimited { retry_after: None })
                });
                Arc::new(MockLlmClient::new(vec![]))
            }
            Step::Analyze { ok } | Step::Generate { ok } => Arc::new(MockLlmClient::new(vec![if ok {
                Ok(CompletionResponse::text(format!("reply {}", n)))
            } else {
                Err(CompletionError::MalformedResponse("empty".to_string()))
            }])),
        };
        let trigger = match step {
            Step::Fetch { .. } => Trigger::Fetch {
                company_url: URL.to_string(),
            },
            Step::Analyze { .. } => Trigger::Analyze,
            Step::Generate { .. } => Trigger::GenerateExample,
        };
        let stage = trigger.stage();
        let ok = pipeline(&provider, &llm).run_stage(trigger, session).await.is_ok();
        (stage, ok)
    }

    proptest! {
        #[test]
        fn prop_slots_only_change_after_own_stage_succeeds(steps in proptest::collection::vec(step_strategy(), 1..12)) {
            let rt = tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap();
            let mut session = session();

            for (n, step) in steps.into_iter().enumerate() {
                let before = snapshot(session.cache());
                let (stage, ok) = rt.block_on(run_step(step, n, &mut session));
                let after = snapshot(session.cache());

                for (i, key) in StageKey::ALL.iter().enumerate() {
                    if before[i] != after[i] {
                        prop_assert!(ok, "{} changed after failed {}", key, stage);
                        prop_assert!(owned_keys(stage).contains(key), "{} changed by {}", key, stage);
                    }
                }
                if !ok {
                    prop_assert_eq!(&before, &after);
                }
            }
        }
    }
}
