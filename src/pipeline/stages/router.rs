//! Entry stage: mode detection and prompt-type classification.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::evaluator::{EvalMode, PromptType};
use crate::improver::title_case;
use crate::pipeline::state::{EvaluationState, StatePatch};

const SYSTEM_PROMPT_SIGNALS: &[&str] = &[
    "system prompt",
    "system message",
    "system instruction",
    "evaluate my system",
    "evaluate this system",
];

const CONTINUATION_SIGNALS: &[&str] = &[
    "as discussed",
    "as mentioned",
    "based on the above",
    "from earlier",
    "your previous response",
    "the code you wrote",
    "your output",
    "the results above",
    "what you said",
    "the example above",
    "now make",
    "now add",
    "now change",
    "now create",
    "now update",
    "can you also",
    "also add",
    "also change",
    "also include",
    "follow up",
    "following up",
    "continuing from",
    "based on our",
    "based on your",
    "from our last",
];

const ANAPHORIC_PHRASES: &[&str] = &["the code", "the output"];

/// Prompts up to this many words are checked for anaphoric references.
const SHORT_PROMPT_WORDS: usize = 30;

static ANAPHORIC_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\b(?:it|this|that|these|those)\b").unwrap());

pub fn detect_mode(input_text: &str, expected_outcome: Option<&str>, requested: EvalMode) -> EvalMode {
    let lower = input_text.to_lowercase();
    if requested == EvalMode::SystemPrompt
        || expected_outcome.is_some()
        || SYSTEM_PROMPT_SIGNALS.iter().any(|s| lower.contains(s))
    {
        EvalMode::SystemPrompt
    } else {
        EvalMode::Prompt
    }
}

/// `Continuation` when the text refers back to an earlier exchange.
pub fn detect_prompt_type(input_text: &str) -> PromptType {
    let lower = input_text.to_lowercase();
    if CONTINUATION_SIGNALS.iter().any(|s| lower.contains(s)) {
        return PromptType::Continuation;
    }

    let short = input_text.split_whitespace().count() <= SHORT_PROMPT_WORDS;
    let anaphoric =
        ANAPHORIC_WORD.is_match(input_text) || ANAPHORIC_PHRASES.iter().any(|p| lower.contains(p));
    if short && anaphoric {
        PromptType::Continuation
    } else {
        PromptType::Initial
    }
}

pub fn route(state: &EvaluationState) -> StatePatch {
    let mode = detect_mode(&state.input_text, state.expected_outcome.as_deref(), state.mode);
    let prompt_type = detect_prompt_type(&state.input_text);
    log::info!(
        "Routing {} evaluation (phase={}, prompt_type={:?})",
        mode.as_str(),
        state.phase.as_str(),
        prompt_type
    );

    StatePatch {
        mode: Some(mode),
        prompt_type: Some(prompt_type),
        ..StatePatch::message(format!(
            "Detected mode: **{}** Evaluation",
            title_case(&mode.as_str().replace('_', " "))
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_prompt_detection() {
        assert_eq!(
            detect_mode("Please review my System Prompt below", None, EvalMode::Prompt),
            EvalMode::SystemPrompt
        );
        assert_eq!(detect_mode("Write a poem", Some("a poem"), EvalMode::Prompt), EvalMode::SystemPrompt);
        assert_eq!(detect_mode("Write a poem", None, EvalMode::SystemPrompt), EvalMode::SystemPrompt);
        assert_eq!(detect_mode("Write a poem", None, EvalMode::Prompt), EvalMode::Prompt);
    }

    #[test]
    fn test_continuation_signals() {
        assert_eq!(detect_prompt_type("Now add error handling to the parser"), PromptType::Continuation);
        assert_eq!(detect_prompt_type("Make it shorter"), PromptType::Continuation);
        assert_eq!(detect_prompt_type("Fix the output formatting"), PromptType::Continuation);
        assert_eq!(detect_prompt_type("Write me something about dogs"), PromptType::Initial);
    }

    #[test]
    fn test_anaphora_in_long_prompt_is_initial() {
        let long = format!("{} Summarize this.", "word ".repeat(40));
        assert_eq!(detect_prompt_type(&long), PromptType::Initial);
        // "item" must not match the whole word "it".
        assert_eq!(detect_prompt_type("List every item"), PromptType::Initial);
    }

    #[test]
    fn test_route_patch() {
        let state = EvaluationState::new("Evaluate this system prompt: You are a helpful bot.");
        let patch = route(&state);
        assert_eq!(patch.mode, Some(EvalMode::SystemPrompt));
        assert_eq!(patch.summary(), "Detected mode: **System Prompt** Evaluation");
    }
}
