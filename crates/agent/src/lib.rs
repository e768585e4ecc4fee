//! The agent loop: model turns, tool execution and stopping.
//!
//! Each run follows a **Decide → Act → Observe** cycle:
//!
//! 1. **Seed** the conversation (system prompt + task framing the issue)
//! 2. **Send to LLM** with the registered tool catalog
//! 3. **If a tool call**: execute the first one, append the result, ask the
//!    termination policy, loop back to step 2
//! 4. **If text only**: stop
//!
//! Suggest mode is the tool-less variant: one completion, no loop.

pub mod loop_runner;
pub mod prompt;
pub mod suggest;
pub mod termination;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use loop_runner::{AgentLoop, DEFAULT_MAX_STEPS, LoopPhase, LoopState};
pub use prompt::{suggest_prompt, system_prompt, task_prompt};
pub use suggest::{strip_code_fence, suggest_fix};
pub use termination::{
    DefaultTerminationPolicy, StepBudgetPolicy, TerminationPolicy, TerminationReason, TurnOutcome, tests_passed,
};
