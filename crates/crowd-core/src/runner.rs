//! Agent Runner
//!
//! Drives one agent against its current model and keeps the bookkeeping for
//! that execution: whether a run is in flight, when it started and the last
//! successful result.
//!
//! `run` takes `&mut self`, so a runner can only execute one generation at a
//! time. Share a runner between tasks by putting it behind a mutex, and use
//! [`AgentRunner::status`] to observe the running flag without the lock.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::agent::Agent;
use crate::error::{AgentError, Result};
use crate::factory::ModelFactory;
use crate::provider::{ModelAdapter, Parameters, merge_parameters};
use crate::result::AgentResult;
use crate::tool::ToolContext;

/// Shared view of a runner's running flag
#[derive(Clone, Debug, Default)]
pub struct RunStatus(Arc<AtomicBool>);

impl RunStatus {
    pub fn is_running(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    fn begin(&self) -> RunningGuard {
        self.0.store(true, Ordering::Release);
        RunningGuard(Arc::clone(&self.0))
    }
}

/// Clears the running flag when the run ends, fails or is cancelled
struct RunningGuard(Arc<AtomicBool>);

impl Drop for RunningGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Runner for executing an agent
pub struct AgentRunner {
    agent: Agent,
    factory: Arc<ModelFactory>,
    model: Arc<dyn ModelAdapter>,
    last_result: Option<AgentResult>,
    status: RunStatus,
    start_time: Option<DateTime<Utc>>,
}

impl AgentRunner {
    /// Create a runner, resolving the agent's model through the factory
    pub fn new(agent: Agent, factory: Arc<ModelFactory>) -> Result<Self> {
        let model =
            factory.get_model(&agent.provider, &agent.model_name, agent.api_key.as_deref())?;

        Ok(Self {
            agent,
            factory,
            model,
            last_result: None,
            status: RunStatus::default(),
            start_time: None,
        })
    }

    /// Run the agent on a prompt.
    ///
    /// `overrides` are merged over the agent's stored parameters. On failure
    /// the error is returned unchanged and the previous result is kept.
    pub async fn run(&mut self, prompt: &str, overrides: Parameters) -> Result<AgentResult> {
        let model = Arc::clone(&self.model);
        let parameters = merge_parameters(&self.agent.parameters, overrides);

        info!(
            agent = %self.agent.name,
            model = %model.full_name(),
            "Running agent"
        );

        let _running = self.status.begin();
        self.start_time = Some(Utc::now());

        let content = model.generate(prompt, &parameters).await.inspect_err(|e| {
            warn!(
                agent = %self.agent.name,
                model = %model.full_name(),
                error = %e,
                "Generation failed"
            );
        })?;

        let result = AgentResult {
            content,
            model: model.full_name(),
            timestamp: Utc::now(),
            prompt: prompt.to_string(),
            parameters,
        };
        self.last_result = Some(result.clone());
        Ok(result)
    }

    /// Like [`AgentRunner::run`], cancelling the model call after `limit`
    pub async fn run_with_timeout(
        &mut self,
        prompt: &str,
        overrides: Parameters,
        limit: Duration,
    ) -> Result<AgentResult> {
        let agent = self.agent.name.clone();
        tokio::time::timeout(limit, self.run(prompt, overrides))
            .await
            .unwrap_or_else(|_| {
                warn!(agent = %agent, ?limit, "Generation timed out");
                Err(AgentError::Timeout(limit))
            })
    }

    /// Check if the agent is currently running
    pub fn is_running(&self) -> bool {
        self.status.is_running()
    }

    /// Handle that observes the running flag
    pub fn status(&self) -> RunStatus {
        self.status.clone()
    }

    /// Switch to another model, keeping the agent record in sync.
    ///
    /// The last result is left untouched. On error neither the model nor the
    /// agent record change.
    pub fn set_model(
        &mut self,
        provider: &str,
        model_name: &str,
        api_key: Option<String>,
    ) -> Result<()> {
        let model = self.factory.get_model(provider, model_name, api_key.as_deref())?;

        info!(
            agent = %self.agent.name,
            from = %self.model.full_name(),
            to = %model.full_name(),
            "Switched model"
        );

        self.model = model;
        self.agent.provider = provider.to_string();
        self.agent.model_name = model_name.to_string();
        self.agent.api_key = api_key;
        Ok(())
    }

    /// Save the last result as indented JSON
    pub fn save_result(&self, path: impl AsRef<Path>) -> Result<()> {
        let result = self.last_result.as_ref().ok_or(AgentError::NoResult)?;
        result.save(path.as_ref())?;
        info!(agent = %self.agent.name, path = %path.as_ref().display(), "Saved result");
        Ok(())
    }

    /// Last successful result, if any
    pub fn last_result(&self) -> Option<&AgentResult> {
        self.last_result.as_ref()
    }

    /// When the most recent run started
    pub fn start_time(&self) -> Option<DateTime<Utc>> {
        self.start_time
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn model(&self) -> &Arc<dyn ModelAdapter> {
        &self.model
    }

    /// Context for a tool invoked on behalf of this agent
    pub fn tool_context(&self) -> ToolContext {
        ToolContext::new(&self.agent.name, self.model.full_name())
            .with_parameters(self.agent.parameters.clone())
    }
}

impl std::fmt::Debug for AgentRunner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentRunner")
            .field("agent", &self.agent)
            .field("model", &self.model.full_name())
            .field("running", &self.is_running())
            .field("start_time", &self.start_time)
            .field("has_result", &self.last_result.is_some())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::scripted_factory;
    use serde_json::json;

    fn runner(provider: &str, model: &str) -> AgentRunner {
        let agent = Agent::new("tester", provider, model);
        AgentRunner::new(agent, Arc::new(scripted_factory())).unwrap()
    }

    #[test]
    fn test_new_resolves_model() {
        let runner = runner("openai", "gpt-4o");
        assert_eq!(runner.model().full_name(), "openai/gpt-4o");
        assert!(!runner.is_running());
        assert!(runner.last_result().is_none());
        assert!(runner.start_time().is_none());
    }

    #[test]
    fn test_new_with_unknown_provider_fails() {
        let agent = Agent::new("tester", "cohere", "command-r");
        let err = AgentRunner::new(agent, Arc::new(scripted_factory())).unwrap_err();
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn test_run_stores_result() {
        let mut runner = runner("anthropic", "claude-3-haiku");
        let before = Utc::now();
        let result = runner.run("hi", Parameters::new()).await.unwrap();
        let after = Utc::now();

        assert_eq!(result.content, "anthropic/claude-3-haiku: hi");
        assert_eq!(result.model, "anthropic/claude-3-haiku");
        assert_eq!(result.prompt, "hi");
        assert!(result.timestamp >= before && result.timestamp <= after);

        assert!(!runner.is_running());
        assert_eq!(runner.last_result(), Some(&result));
        let started = runner.start_time().unwrap();
        assert!(started >= before && started <= result.timestamp);
    }

    #[tokio::test]
    async fn test_call_site_parameters_override_agent_parameters() {
        let agent = Agent::new("tester", "openai", "params-echo")
            .with_parameter("temperature", json!(0.2))
            .with_parameter("max_tokens", json!(256));
        let mut runner = AgentRunner::new(agent, Arc::new(scripted_factory())).unwrap();

        let mut overrides = Parameters::new();
        overrides.insert("temperature".into(), json!(0.9));
        let result = runner.run("hi", overrides).await.unwrap();

        let seen: Parameters = serde_json::from_str(&result.content).unwrap();
        assert_eq!(seen["temperature"], json!(0.9));
        assert_eq!(seen["max_tokens"], json!(256));
        assert_eq!(result.parameters, seen);
        assert_eq!(runner.agent().parameters["temperature"], json!(0.2));
    }

    #[tokio::test]
    async fn test_failed_run_resets_state_and_keeps_last_result() {
        let mut runner = runner("groq", "llama3");
        let first = runner.run("first", Parameters::new()).await.unwrap();

        runner.set_model("groq", "fail-llama", None).unwrap();
        let err = runner.run("second", Parameters::new()).await.unwrap_err();

        assert!(err.is_generation());
        assert!(!runner.is_running());
        assert_eq!(runner.last_result(), Some(&first));

        // still usable
        runner.set_model("groq", "llama3", None).unwrap();
        let third = runner.run("third", Parameters::new()).await.unwrap();
        assert_eq!(third.content, "groq/llama3: third");
    }

    #[tokio::test]
    async fn test_failed_first_run_leaves_no_result() {
        let mut runner = runner("gemini", "fail-pro");
        assert!(runner.run("hi", Parameters::new()).await.is_err());
        assert!(runner.last_result().is_none());
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_status_reports_running_during_generation() {
        let mut runner = runner("openai", "slow-gpt");
        let status = runner.status();
        assert!(!status.is_running());

        let observer = tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(200)).await;
            status.is_running()
        });

        runner.run("hi", Parameters::new()).await.unwrap();
        assert!(observer.await.unwrap());
        assert!(!runner.is_running());
    }

    #[tokio::test]
    async fn test_run_with_timeout_cancels_and_resets() {
        let mut runner = runner("openai", "gpt-4o");
        let previous = runner.run("ok", Parameters::new()).await.unwrap();

        runner.set_model("openai", "slow-gpt", None).unwrap();
        let err = runner
            .run_with_timeout("hi", Parameters::new(), Duration::from_millis(50))
            .await
            .unwrap_err();

        assert!(matches!(err, AgentError::Timeout(_)));
        assert!(!runner.is_running());
        assert_eq!(runner.last_result(), Some(&previous));
    }

    #[tokio::test]
    async fn test_run_with_timeout_within_limit() {
        let mut runner = runner("openai", "gpt-4o");
        let result = runner
            .run_with_timeout("hi", Parameters::new(), Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(result.content, "openai/gpt-4o: hi");
    }

    #[tokio::test]
    async fn test_set_model_switches_adapter_and_agent() {
        let factory = Arc::new(scripted_factory());
        let agent = Agent::new("tester", "openai", "gpt-4o");
        let mut runner = AgentRunner::new(agent, Arc::clone(&factory)).unwrap();
        runner.run("hi", Parameters::new()).await.unwrap();

        runner
            .set_model("anthropic", "claude-3-opus", Some("sk-explicit".into()))
            .unwrap();

        assert_eq!(runner.agent().provider, "anthropic");
        assert_eq!(runner.agent().model_name, "claude-3-opus");
        assert_eq!(runner.agent().api_key.as_deref(), Some("sk-explicit"));
        // swapping does not clear the previous result
        assert_eq!(runner.last_result().unwrap().model, "openai/gpt-4o");

        let result = runner.run("hi", Parameters::new()).await.unwrap();
        assert_eq!(result.model, "anthropic/claude-3-opus");

        let cached = factory
            .get_model("anthropic", "claude-3-opus", Some("sk-explicit"))
            .unwrap();
        assert!(Arc::ptr_eq(runner.model(), &cached));
    }

    #[test]
    fn test_set_model_failure_changes_nothing() {
        let mut runner = runner("openai", "gpt-4o");
        let err = runner.set_model("unknown", "x", None).unwrap_err();
        assert!(err.is_configuration());
        assert_eq!(runner.agent().provider, "openai");
        assert_eq!(runner.model().full_name(), "openai/gpt-4o");
    }

    #[test]
    fn test_save_before_run_fails() {
        let runner = runner("openai", "gpt-4o");
        let dir = tempfile::tempdir().unwrap();
        let err = runner.save_result(dir.path().join("r.json")).unwrap_err();
        assert!(matches!(err, AgentError::NoResult));
    }

    #[tokio::test]
    async fn test_save_after_run_round_trips() {
        let agent =
            Agent::new("tester", "openai", "gpt-4o").with_parameter("temperature", json!(0.5));
        let mut runner = AgentRunner::new(agent, Arc::new(scripted_factory())).unwrap();
        runner.run("hello", Parameters::new()).await.unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("r.json");
        runner.save_result(&path).unwrap();

        let loaded = AgentResult::load(&path).unwrap();
        assert_eq!(Some(&loaded), runner.last_result());
    }

    #[test]
    fn test_tool_context_from_agent() {
        let agent = Agent::new("planner", "gemini", "gemini-pro")
            .with_parameter("top_k", json!(40));
        let runner = AgentRunner::new(agent, Arc::new(scripted_factory())).unwrap();

        let ctx = runner.tool_context();
        assert_eq!(ctx.agent_name, "planner");
        assert_eq!(ctx.model_name, "gemini/gemini-pro");
        assert_eq!(ctx.parameters["top_k"], json!(40));
    }
}
