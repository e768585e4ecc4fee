//! The agent reasoning loop implementation.

use std::sync::Arc;

use fixloop_config::AppConfig;
use fixloop_core::message::{Conversation, Message};
use fixloop_core::provider::{Provider, ProviderRequest, ToolChoice};
use fixloop_tools::ToolExecutor;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::termination::{DefaultTerminationPolicy, TerminationPolicy, TerminationReason, TurnOutcome};

/// Default step budget.
pub const DEFAULT_MAX_STEPS: u32 = 3;

/// Where the loop is in its state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopPhase {
    AwaitingModel,
    ExecutingTool,
    Terminated,
}

/// The mutable state of one run. Created per run, returned when it ends.
#[derive(Debug, Clone, Serialize)]
pub struct LoopState {
    /// Completed turns
    pub step: u32,
    pub max_steps: u32,
    pub conversation: Conversation,
    pub phase: LoopPhase,
    pub terminated: bool,
    pub reason: Option<TerminationReason>,
    /// Model requests issued so far
    pub model_calls: u32,
    /// Tool executions performed so far
    pub tool_calls: u32,
}

impl LoopState {
    pub fn new(conversation: Conversation, max_steps: u32) -> Self {
        Self {
            step: 0,
            max_steps,
            conversation,
            phase: LoopPhase::AwaitingModel,
            terminated: false,
            reason: None,
            model_calls: 0,
            tool_calls: 0,
        }
    }

    fn terminate(&mut self, reason: TerminationReason) {
        self.phase = LoopPhase::Terminated;
        self.terminated = true;
        self.reason = Some(reason);
    }

    /// The last assistant text, if the model said anything.
    pub fn final_reply(&self) -> Option<&str> {
        self.conversation
            .messages()
            .iter()
            .rev()
            .find(|m| m.role == fixloop_core::message::Role::Assistant && !m.content.trim().is_empty())
            .map(|m| m.content.as_str())
    }
}

/// Drives model turns and tool execution until a stop condition fires.
pub struct AgentLoop {
    /// The LLM provider to use
    provider: Arc<dyn Provider>,

    /// The model to use
    model: String,

    /// Temperature setting
    temperature: f32,

    /// Default max tokens per response
    max_tokens: Option<u32>,

    /// Resolves and runs the model's tool calls
    executor: ToolExecutor,

    /// Step budget
    max_steps: u32,

    policy: Box<dyn TerminationPolicy>,
}

impl AgentLoop {
    /// Create a new agent loop.
    pub fn new(
        provider: Arc<dyn Provider>,
        model: impl Into<String>,
        temperature: f32,
        executor: ToolExecutor,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            max_tokens: None,
            executor,
            max_steps: DEFAULT_MAX_STEPS,
            policy: Box::new(DefaultTerminationPolicy),
        }
    }

    /// Create an agent loop with model, sampling and budget taken from config.
    pub fn from_config(provider: Arc<dyn Provider>, config: &AppConfig, executor: ToolExecutor) -> Self {
        Self::new(
            provider,
            config.provider.model.clone(),
            config.provider.temperature,
            executor,
        )
        .with_max_tokens(config.provider.max_tokens)
        .with_max_steps(config.agent.max_steps)
    }

    /// Set the step budget. A budget of zero is treated as one.
    pub fn with_max_steps(mut self, max: u32) -> Self {
        self.max_steps = max.max(1);
        self
    }

    /// Set the default max tokens per LLM response.
    pub fn with_max_tokens(mut self, max: Option<u32>) -> Self {
        self.max_tokens = max;
        self
    }

    /// Replace the stop rules applied after each tool turn.
    pub fn with_policy(mut self, policy: Box<dyn TerminationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Run the loop over a seeded conversation until it terminates.
    ///
    /// Each turn:
    /// 1. Sends the full conversation and tool catalog (`tool_choice = auto`)
    /// 2. Stops if the reply has no tool call
    /// 3. Otherwise executes the *first* tool call only and appends the
    ///    assistant message (trimmed to that call) plus the tool result
    /// 4. Asks the termination policy whether to stop
    ///
    /// Model failures propagate; tool failures are fed back as text.
    pub async fn run(&self, conversation: Conversation) -> Result<LoopState, fixloop_core::Error> {
        let mut state = LoopState::new(conversation, self.max_steps);
        let tool_definitions = self.executor.registry().definitions();

        info!(
            model = %self.model,
            max_steps = state.max_steps,
            tools = ?self.executor.registry().names(),
            "Starting agent loop"
        );

        while !state.terminated {
            state.phase = LoopPhase::AwaitingModel;
            debug!(step = state.step + 1, max_steps = state.max_steps, "Requesting model decision");

            let request = ProviderRequest {
                model: self.model.clone(),
                messages: state.conversation.messages().to_vec(),
                temperature: self.temperature,
                max_tokens: self.max_tokens,
                tools: tool_definitions.clone(),
                tool_choice: ToolChoice::Auto,
            };

            let response = self.provider.complete(request).await?;
            state.model_calls += 1;
            let mut message = response.message;

            let Some(call) = message.tool_calls.first().cloned() else {
                if !message.content.trim().is_empty() {
                    state.conversation.append(message)?;
                }
                state.step += 1;
                state.terminate(TerminationReason::ModelDeclinedTools);
                break;
            };

            if message.tool_calls.len() > 1 {
                warn!(
                    requested = message.tool_calls.len(),
                    kept = %call.name,
                    "Model requested several tools; executing only the first"
                );
                message.tool_calls.truncate(1);
            }

            state.phase = LoopPhase::ExecutingTool;
            let result = self.executor.execute(&call).await;
            state.tool_calls += 1;

            state.conversation.append(message)?;
            state
                .conversation
                .append(Message::tool_result(&call.id, &result.output))?;
            state.step += 1;

            info!(
                step = state.step,
                tool = %call.name,
                success = result.success,
                "Turn completed"
            );

            let outcome = TurnOutcome {
                tool_name: &call.name,
                result: &result,
            };
            let decision = self.policy.decide(&state, &outcome).or_else(|| {
                // The budget holds whatever the policy says.
                (state.step >= state.max_steps).then_some(TerminationReason::StepBudgetExhausted)
            });
            if let Some(reason) = decision {
                state.terminate(reason);
            }
        }

        info!(
            steps = state.step,
            model_calls = state.model_calls,
            reason = %state.reason.map(|r| r.as_str()).unwrap_or("none"),
            "Agent loop finished"
        );

        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::*;
    use async_trait::async_trait;
    use fixloop_core::message::Role;
    use fixloop_core::tool::{ToolKind, ToolRegistry};
    use fixloop_tools::{TestRunner, ToolContext};
    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FixedRunner {
        output: &'static str,
        runs: AtomicUsize,
    }

    #[async_trait]
    impl TestRunner for FixedRunner {
        async fn run(&self, _workdir: &Path) -> String {
            self.runs.fetch_add(1, Ordering::SeqCst);
            self.output.to_string()
        }
    }

    fn runner(output: &'static str) -> Arc<FixedRunner> {
        Arc::new(FixedRunner {
            output,
            runs: AtomicUsize::new(0),
        })
    }

    fn agent(
        provider: Arc<SequentialMockProvider>,
        root: &Path,
        registry: ToolRegistry,
        runner: Arc<FixedRunner>,
    ) -> AgentLoop {
        let executor = ToolExecutor::new(registry, ToolContext::new(root, runner));
        AgentLoop::new(provider, "mock-model", 0.0, executor)
    }

    fn seeded() -> Conversation {
        Conversation::seeded("You fix bugs.", "Fix add()")
    }

    #[tokio::test]
    async fn text_reply_ends_run_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::single_text("Nothing to do."));
        let agent = agent(provider.clone(), dir.path(), ToolRegistry::standard(), runner("ok"));

        let state = agent.run(seeded()).await.unwrap();

        assert_eq!(state.reason, Some(TerminationReason::ModelDeclinedTools));
        assert_eq!(state.phase, LoopPhase::Terminated);
        assert_eq!(state.model_calls, 1);
        assert_eq!(state.tool_calls, 0);
        // System + User + Assistant
        assert_eq!(state.conversation.len(), 3);
        assert_eq!(state.final_reply(), Some("Nothing to do."));
    }

    #[tokio::test]
    async fn read_then_decline_takes_two_model_calls() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("target_code.py"), "def add(a, b):\n    return a - b\n").unwrap();

        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![make_tool_call("call_1", "read_file", serde_json::json!({"path": "target_code.py"}))],
            "Let me look at the code.",
            "The bug is the minus sign.",
        ));
        let registry = ToolRegistry::with_tools([ToolKind::ReadFile, ToolKind::WriteFile]);
        let agent = agent(provider.clone(), dir.path(), registry, runner("ok"));

        let state = agent.run(seeded()).await.unwrap();

        assert_eq!(state.reason, Some(TerminationReason::ModelDeclinedTools));
        assert_eq!(provider.call_count(), 2);
        assert_eq!(state.tool_calls, 1);

        let messages = state.conversation.messages();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[2].role, Role::Assistant);
        assert_eq!(messages[3].role, Role::Tool);
        assert_eq!(messages[3].tool_call_id.as_deref(), Some("call_1"));
        assert!(messages[3].content.contains("return a - b"));

        // The second request saw the tool result and only the registered tools.
        let requests = provider.requests();
        assert_eq!(requests[1].messages.len(), 4);
        let names: Vec<&str> = requests[0].tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["read_file", "write_file"]);
        assert_eq!(requests[0].tool_choice, ToolChoice::Auto);
    }

    #[tokio::test]
    async fn failing_tests_exhaust_budget() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![make_tool_call("t1", "run_tests", serde_json::json!({}))], ""),
            make_tool_call_response(vec![make_tool_call("t2", "run_tests", serde_json::json!({}))], ""),
            make_tool_call_response(vec![make_tool_call("t3", "run_tests", serde_json::json!({}))], ""),
        ]));
        let tests = runner("1 FAILED, 2 passed");
        let agent = agent(provider.clone(), dir.path(), ToolRegistry::standard(), tests.clone())
            .with_max_steps(3);

        let state = agent.run(seeded()).await.unwrap();

        assert_eq!(state.reason, Some(TerminationReason::StepBudgetExhausted));
        assert_eq!(state.step, 3);
        assert_eq!(provider.call_count(), 3);
        assert_eq!(tests.runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn passing_tests_stop_early() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(
                vec![make_tool_call("w1", "write_file", serde_json::json!({"path": "a.py", "content": "x = 1\n"}))],
                "",
            ),
            make_tool_call_response(vec![make_tool_call("t1", "run_tests", serde_json::json!({}))], ""),
        ]));
        let agent = agent(provider.clone(), dir.path(), ToolRegistry::standard(), runner("4 passed in 0.01s"))
            .with_max_steps(5);

        let state = agent.run(seeded()).await.unwrap();

        assert_eq!(state.reason, Some(TerminationReason::TestsPassed));
        assert_eq!(state.step, 2);
        assert_eq!(provider.call_count(), 2);
        assert_eq!(std::fs::read_to_string(dir.path().join("a.py")).unwrap(), "x = 1\n");
    }

    #[tokio::test]
    async fn only_first_tool_call_is_executed() {
        let dir = tempfile::tempdir().unwrap();
        let tests = runner("FAILED");
        let provider = Arc::new(SequentialMockProvider::tool_then_answer(
            vec![
                make_tool_call("w1", "write_file", serde_json::json!({"path": "first.py", "content": "1"})),
                make_tool_call("w2", "write_file", serde_json::json!({"path": "second.py", "content": "2"})),
                make_tool_call("t1", "run_tests", serde_json::json!({})),
            ],
            "",
            "done",
        ));
        let agent = agent(provider, dir.path(), ToolRegistry::standard(), tests.clone());

        let state = agent.run(seeded()).await.unwrap();

        assert!(dir.path().join("first.py").exists());
        assert!(!dir.path().join("second.py").exists());
        assert_eq!(tests.runs.load(Ordering::SeqCst), 0);
        assert_eq!(state.tool_calls, 1);

        let assistant = &state.conversation.messages()[2];
        assert_eq!(assistant.tool_calls.len(), 1);
        assert_eq!(assistant.tool_calls[0].id, "w1");
    }

    #[tokio::test]
    async fn tool_errors_are_fed_back_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![make_tool_call("c1", "delete_repo", serde_json::json!({}))], ""),
            make_tool_call_response(vec![make_tool_call("c2", "read_file", serde_json::json!({"path": "missing.py"}))], ""),
            make_text_response("I give up."),
        ]));
        let agent = agent(provider.clone(), dir.path(), ToolRegistry::standard(), runner("ok"));

        let state = agent.run(seeded()).await.unwrap();

        let messages = state.conversation.messages();
        assert_eq!(messages[3].content, "Unknown tool: delete_repo");
        assert!(messages[5].content.starts_with("Error: File error on missing.py"));
        assert_eq!(state.reason, Some(TerminationReason::ModelDeclinedTools));
        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn empty_text_reply_is_not_recorded() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::single_text("  "));
        let agent = agent(provider, dir.path(), ToolRegistry::standard(), runner("ok"));

        let state = agent.run(seeded()).await.unwrap();
        assert_eq!(state.conversation.len(), 2);
        assert_eq!(state.final_reply(), None);
    }

    #[tokio::test]
    async fn from_config_applies_model_and_budget() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.provider.model = "tiny-model".into();
        config.agent.max_steps = 1;
        let provider = Arc::new(SequentialMockProvider::new(vec![make_tool_call_response(
            vec![make_tool_call("r1", "run_tests", serde_json::json!({}))],
            "",
        )]));
        let executor = ToolExecutor::new(
            ToolRegistry::standard(),
            ToolContext::new(dir.path(), runner("FAILED")),
        );
        let agent = AgentLoop::from_config(provider.clone(), &config, executor);

        let state = agent.run(seeded()).await.unwrap();
        assert_eq!(state.reason, Some(TerminationReason::StepBudgetExhausted));
        assert_eq!(provider.requests()[0].model, "tiny-model");
    }

    #[tokio::test]
    async fn provider_errors_propagate() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![]));
        let agent = agent(provider, dir.path(), ToolRegistry::standard(), runner("ok"));

        let err = agent.run(seeded()).await.unwrap_err();
        assert!(matches!(err, fixloop_core::Error::Provider(_)));
    }

    struct NeverStop;

    impl TerminationPolicy for NeverStop {
        fn decide(&self, _state: &LoopState, _outcome: &TurnOutcome<'_>) -> Option<TerminationReason> {
            None
        }
    }

    #[tokio::test]
    async fn budget_holds_under_custom_policy() {
        let dir = tempfile::tempdir().unwrap();
        let provider = Arc::new(SequentialMockProvider::new(vec![
            make_tool_call_response(vec![make_tool_call("t1", "run_tests", serde_json::json!({}))], ""),
            make_tool_call_response(vec![make_tool_call("t2", "run_tests", serde_json::json!({}))], ""),
        ]));
        let agent = agent(provider.clone(), dir.path(), ToolRegistry::standard(), runner("all passed"))
            .with_max_steps(2)
            .with_policy(Box::new(NeverStop));

        let state = agent.run(seeded()).await.unwrap();
        assert_eq!(state.reason, Some(TerminationReason::StepBudgetExhausted));
        assert_eq!(provider.call_count(), 2);
    }
}
