//! Stop conditions for the agent loop.
//!
//! The loop itself stops when the model answers without a tool call. After
//! every executed tool turn it asks a `TerminationPolicy` whether to stop;
//! swapping the policy changes the stop rules without touching the loop.

use fixloop_core::tool::{ToolKind, ToolResult};
use serde::{Deserialize, Serialize};

use crate::loop_runner::LoopState;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TerminationReason {
    /// The model replied without requesting a tool
    ModelDeclinedTools,
    /// The step budget ran out
    StepBudgetExhausted,
    /// `run_tests` output carried no failure marker
    TestsPassed,
}

impl TerminationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            TerminationReason::ModelDeclinedTools => "model declined tools",
            TerminationReason::StepBudgetExhausted => "step budget exhausted",
            TerminationReason::TestsPassed => "tests passed",
        }
    }
}

impl std::fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened in the turn that just completed.
#[derive(Debug, Clone, Copy)]
pub struct TurnOutcome<'a> {
    /// Tool name as requested by the model
    pub tool_name: &'a str,
    pub result: &'a ToolResult,
}

impl TurnOutcome<'_> {
    /// True when `run_tests` actually ran (it was registered and dispatched).
    pub fn ran_tests(&self) -> bool {
        self.tool_name == ToolKind::RunTests.name() && self.result.success
    }
}

pub trait TerminationPolicy: Send + Sync {
    /// Called once after each executed tool turn, with `state.step` already
    /// counting that turn. `Some` ends the run.
    fn decide(&self, state: &LoopState, outcome: &TurnOutcome<'_>) -> Option<TerminationReason>;
}

/// Case-insensitive "failed" check on test output.
///
/// This is a plain substring rule: a test *named* `test_not_failed` also
/// counts as a failure.
pub fn tests_passed(output: &str) -> bool {
    !output.to_lowercase().contains("failed")
}

/// Stop only when the step budget is used up.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepBudgetPolicy;

impl TerminationPolicy for StepBudgetPolicy {
    fn decide(&self, state: &LoopState, _outcome: &TurnOutcome<'_>) -> Option<TerminationReason> {
        (state.step >= state.max_steps).then_some(TerminationReason::StepBudgetExhausted)
    }
}

/// Stop early when the tests pass, otherwise when the budget is used up.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTerminationPolicy;

impl TerminationPolicy for DefaultTerminationPolicy {
    fn decide(&self, state: &LoopState, outcome: &TurnOutcome<'_>) -> Option<TerminationReason> {
        if outcome.ran_tests() && tests_passed(&outcome.result.output) {
            return Some(TerminationReason::TestsPassed);
        }
        StepBudgetPolicy.decide(state, outcome)
    }
}
