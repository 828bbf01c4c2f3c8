//! Instruction rendering.
//!
//! Templates are tera sources in [`templates`]; stages fill a
//! [`tera::Context`] and call [`render`]. Task-type specific fragments
//! (analysis subject, improvement guidance, judge focus) live here.

pub mod templates;

use tera::{Context, Tera};

use crate::evaluator::criteria;
use crate::evaluator::errors::EvaluatorError;
use crate::evaluator::{EvalMode, PromptType, TaskType};

/// Render a one-off template without autoescaping.
pub fn render(template: &str, context: &Context) -> Result<String, EvaluatorError> {
    Tera::one_off(template, context, false).map_err(|e| EvaluatorError::Configuration {
        message: format!("template rendering failed: {}", e),
    })
}

fn analysis_subject(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::General => "a prompt",
        TaskType::EmailWriting => "an email-writing prompt",
        TaskType::Summarization => "a summarization prompt",
        TaskType::CodingTask => "a coding-task prompt",
        TaskType::ExamInterview => "an exam or interview question-generation prompt",
        TaskType::LinkedinPost => "a LinkedIn post prompt",
    }
}

/// Task-specific advice appended to the improvement instructions.
pub fn improvement_guidance(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::General => "",
        TaskType::EmailWriting => {
            "For email prompts, make recipient, relationship, purpose, tone, length and the call to action explicit."
        }
        TaskType::Summarization => {
            "For summarization prompts, pin down the source, audience, target length, coverage priorities and fidelity requirements."
        }
        TaskType::CodingTask => {
            "For coding prompts, specify language and versions, inputs and outputs, error handling, tests and constraints on dependencies."
        }
        TaskType::ExamInterview => {
            "For exam and interview prompts, define the skills assessed, difficulty, question formats, scoring rubric and fairness rules."
        }
        TaskType::LinkedinPost => {
            "For LinkedIn prompts, define the author's voice, the opening hook, the audience, the value delivered and platform formatting."
        }
    }
}

fn judge_focus(task_type: TaskType) -> &'static str {
    match task_type {
        TaskType::General => "",
        TaskType::EmailWriting => "Judge the output as an email a real recipient would receive.",
        TaskType::Summarization => "Judge the output as a summary: penalise claims that are not in the source.",
        TaskType::CodingTask => "Judge the output as code a reviewer would merge.",
        TaskType::ExamInterview => "Judge the output as assessment material a candidate would face.",
        TaskType::LinkedinPost => "Judge the output as a post published on LinkedIn.",
    }
}

/// Instructions for the structural analysis call.
pub fn analysis_instructions(
    task_type: TaskType,
    mode: EvalMode,
    use_cot: bool,
    extra_context: &str,
) -> Result<String, EvaluatorError> {
    let mut ctx = Context::new();
    ctx.insert("subject", analysis_subject(task_type));
    ctx.insert("criteria", &criteria::describe(task_type));
    ctx.insert("context", extra_context);
    let template = match mode {
        EvalMode::Prompt => templates::ANALYSIS,
        EvalMode::SystemPrompt => templates::SYSTEM_PROMPT_ANALYSIS,
    };
    let body = render(template, &ctx)?;
    Ok(if use_cot {
        format!("{}{}", templates::COT_PREAMBLE, body)
    } else {
        body
    })
}

/// Guidance for the rewrite depending on whether the prompt stands alone.
pub fn prompt_type_guidance(prompt_type: PromptType, task_type: TaskType) -> String {
    let base = match prompt_type {
        PromptType::Initial => templates::PROMPT_TYPE_INITIAL,
        PromptType::Continuation => templates::PROMPT_TYPE_CONTINUATION,
    };
    let extra = improvement_guidance(task_type);
    if extra.is_empty() {
        base.to_string()
    } else {
        format!("{}\n\n{}", base, extra)
    }
}

pub fn improvement_instructions(
    extra_context: &str,
    guidance: &str,
    improvements_only: bool,
) -> Result<String, EvaluatorError> {
    let mut ctx = Context::new();
    ctx.insert("context", extra_context);
    ctx.insert("guidance", guidance);
    ctx.insert("improvements_only", &improvements_only);
    render(templates::IMPROVEMENT, &ctx)
}

/// Instructions for judging one output with the task type's dimensions.
pub fn judge_instructions(task_type: TaskType) -> Result<String, EvaluatorError> {
    let dimensions: Vec<&str> = criteria::fallback_output_dimensions(task_type)
        .iter()
        .map(|(name, _)| *name)
        .collect();
    let mut ctx = Context::new();
    ctx.insert("dimensions", &dimensions);
    ctx.insert("focus", judge_focus(task_type));
    render(templates::OUTPUT_JUDGE, &ctx)
}

pub fn judge_input(prompt: &str, output: &str) -> Result<String, EvaluatorError> {
    let mut ctx = Context::new();
    ctx.insert("prompt", prompt);
    ctx.insert("output", output);
    render(templates::OUTPUT_JUDGE_INPUT, &ctx)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_instructions_keep_json_braces() {
        let text = analysis_instructions(TaskType::General, EvalMode::Prompt, false, "").unwrap();
        assert!(text.contains(r#""tcrei_flags": {"task": <bool>"#));
        assert!(text.contains("### TASK"));
        assert!(!text.contains("{% raw %}"));
        assert!(!text.starts_with("Before scoring"));
    }

    #[test]
    fn test_analysis_instructions_with_preamble_and_context() {
        let text = analysis_instructions(
            TaskType::CodingTask,
            EvalMode::SystemPrompt,
            true,
            "## Lessons from Previous Evaluations",
        )
        .unwrap();
        assert!(text.starts_with("Before scoring"));
        assert!(text.contains("SYSTEM PROMPT"));
        assert!(text.contains("## Lessons from Previous Evaluations"));
    }

    #[test]
    fn test_values_are_not_escaped() {
        let mut ctx = Context::new();
        ctx.insert("prompt", "<task>a & b</task>");
        ctx.insert("output", "{{ not a tag }}");
        let text = render(templates::OUTPUT_JUDGE_INPUT, &ctx).unwrap();
        assert!(text.contains("<task>a & b</task>"));
        assert!(text.contains("{{ not a tag }}"));
    }

    #[test]
    fn test_judge_instructions_list_task_dimensions() {
        let text = judge_instructions(TaskType::EmailWriting).unwrap();
        assert!(text.contains("- tone_appropriateness\n"));
        assert!(text.contains("real recipient"));
    }

    #[test]
    fn test_improvement_instructions_modes() {
        let full = improvement_instructions("", "guide", false).unwrap();
        assert!(full.contains(r#""rewritten_prompt": "<complete rewritten prompt>""#));
        let only = improvement_instructions("", "guide", true).unwrap();
        assert!(only.contains(r#""rewritten_prompt": null"#));
    }

    #[test]
    fn test_prompt_type_guidance_appends_task_advice() {
        let text = prompt_type_guidance(PromptType::Continuation, TaskType::EmailWriting);
        assert!(text.starts_with("The prompt continues"));
        assert!(text.contains("call to action"));
        assert_eq!(
            prompt_type_guidance(PromptType::Initial, TaskType::General),
            templates::PROMPT_TYPE_INITIAL
        );
    }
}
