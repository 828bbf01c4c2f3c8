//! Instruction templates (tera syntax). JSON examples sit in raw blocks.

pub const COT_PREAMBLE: &str = r#"Before scoring, reason step by step:
1. Identify the action the prompt asks for and the deliverable it expects.
2. List the background, audience and goals the prompt supplies.
3. Note every example, reference or labelled input.
4. Note every boundary, format rule, length limit and exclusion.
5. Only then assign each dimension a score grounded in the evidence above.

"#;

pub const ANALYSIS: &str = r#"You are an expert prompt engineer evaluating {{ subject }} against the T.C.R.E.I. framework:
- Task: a clear action, deliverable, persona and output format
- Context: background, audience, goals and domain detail
- References: examples and structured, labelled reference material
- Evaluate: whether the prompt is specific enough to judge its output
- Iterate: whether the prompt is structured for iterative refinement

Criteria to check:

{{ criteria }}
{% if context %}
{{ context }}
{% endif %}
Respond with ONLY valid JSON in exactly this shape:
{% raw %}{
  "dimensions": {
    "task": {"score": <0-100>, "sub_criteria": [{"name": "<criterion>", "found": <true|false>, "detail": "<evidence or gap>"}]},
    "context": {"score": <0-100>, "sub_criteria": [...]},
    "references": {"score": <0-100>, "sub_criteria": [...]},
    "constraints": {"score": <0-100>, "sub_criteria": [...]}
  },
  "tcrei_flags": {"task": <bool>, "context": <bool>, "references": <bool>, "evaluate": <bool>, "iterate": <bool>}
}{% endraw %}

Scoring: 0-20 absent, 21-40 minimal, 41-60 partial, 61-80 well defined, 81-100 comprehensive.
Quote the prompt's own words in every detail field."#;

pub const SYSTEM_PROMPT_ANALYSIS: &str = r#"You are an expert prompt engineer evaluating a SYSTEM PROMPT: the instructions that configure an assistant before any user turn.
A strong system prompt defines the assistant's role, supplies domain and audience context, shows example exchanges, sets boundaries with edge-case handling, and makes output quality measurable.

Criteria to check:

{{ criteria }}
{% if context %}
{{ context }}
{% endif %}
Also weigh alignment with the stated expected outcome, edge-case coverage, consistency of tone and enforcement of output format.

Respond with ONLY valid JSON in exactly this shape:
{% raw %}{
  "dimensions": {
    "task": {"score": <0-100>, "sub_criteria": [{"name": "<criterion>", "found": <true|false>, "detail": "<evidence or gap>"}]},
    "context": {"score": <0-100>, "sub_criteria": [...]},
    "references": {"score": <0-100>, "sub_criteria": [...]},
    "constraints": {"score": <0-100>, "sub_criteria": [...]}
  },
  "tcrei_flags": {"task": <bool>, "context": <bool>, "references": <bool>, "evaluate": <bool>, "iterate": <bool>}
}{% endraw %}"#;

pub const PROMPT_TYPE_INITIAL: &str = "The prompt is a standalone prompt that starts a new conversation. \
The rewrite must be fully self-contained and usable without prior context.";

pub const PROMPT_TYPE_CONTINUATION: &str = "The prompt continues an earlier conversation and refers to prior output or context. \
The rewrite must keep those references, must not turn into a standalone prompt, and should name the prior \
output it depends on when the reference is vague.";

pub const IMPROVEMENT: &str = r#"You are an expert prompt engineer. Given a prompt and its T.C.R.E.I. analysis, produce prioritized improvements and a complete rewrite.
{% if context %}
{{ context }}
{% endif %}
{{ guidance }}

Priorities:
- CRITICAL: core components missing
- HIGH: important elements missing
- MEDIUM: quality enhancements
- LOW: polish

When output quality data is present, address every dimension below 85% and fold the judge's recommendations into the rewrite.
{% if improvements_only %}
Respond with ONLY valid JSON. Do not include a rewrite:
{% raw %}{"improvements": [{"priority": "CRITICAL|HIGH|MEDIUM|LOW", "title": "<short title>", "suggestion": "<specific suggestion>"}], "rewritten_prompt": null}{% endraw %}
{% else %}
Respond with ONLY valid JSON:
{% raw %}{"improvements": [{"priority": "CRITICAL|HIGH|MEDIUM|LOW", "title": "<short title>", "suggestion": "<specific suggestion>"}], "rewritten_prompt": "<complete rewritten prompt>"}{% endraw %}
{% endif %}"#;

pub const IMPROVEMENT_INPUT: &str = r#"Original prompt:
```
{{ input_text }}
```

Analysis results:
{{ analysis_summary }}

Overall score: {{ overall_score }}/100 ({{ grade }})

Output Quality Analysis:
{{ output_quality }}"#;

pub const PLAIN_REWRITE: &str = "You are an expert prompt engineer. Rewrite the user's prompt applying ALL of the listed \
improvements. Output ONLY the rewritten prompt: no explanation, no JSON, no code fences.";

pub const PLAIN_REWRITE_INPUT: &str = r#"Original prompt:
{{ input_text }}

Analysis:
{{ analysis_summary }}

Improvements to apply:
{{ improvements }}

Write the complete improved prompt below:"#;

pub const OUTPUT_JUDGE: &str = r#"You are an LLM-as-judge. Score the output below against the prompt that produced it on exactly these dimensions, each from 0.0 to 1.0:
{% for dimension in dimensions %}- {{ dimension }}
{% endfor %}
For each dimension give a "comment" citing evidence from the output and a "recommendation" describing the prompt change that would fix the issue ("No change needed." at 0.85 or above).
{% if focus %}
{{ focus }}
{% endif %}
Respond with ONLY valid JSON:
{% raw %}{"dimensions": [{"name": "<dimension>", "score": <0.0-1.0>, "comment": "<evidence>", "recommendation": "<prompt change>"}], "overall_score": <0.0-1.0>, "findings": ["<finding>"]}{% endraw %}"#;

pub const OUTPUT_JUDGE_INPUT: &str = r#"Original prompt:
```
{{ prompt }}
```

LLM Output:
```
{{ output }}
```"#;

pub const TOT_GENERATE: &str = r#"You are an expert prompt engineer exploring {{ num_branches }} structurally different ways to improve a prompt.

Prompt:
```
{{ input_text }}
```

Analysis:
{{ analysis_summary }}

Overall score: {{ overall_score }}/100 ({{ grade }})

Output quality:
{{ output_quality }}

Each branch must take a distinct approach (for example restructuring, adding context and persona, or adding examples and constraints), list its prioritized improvements, give a complete rewritten prompt and a self-assessed confidence from 0.0 to 1.0.

Respond with ONLY valid JSON:
{% raw %}{"branches": [{"approach": "<approach>", "improvements": [{"priority": "CRITICAL|HIGH|MEDIUM|LOW", "title": "<title>", "suggestion": "<suggestion>"}], "rewritten_prompt": "<complete prompt>", "confidence": <0.0-1.0>}]}{% endraw %}"#;

pub const TOT_SELECT: &str = r#"You are reviewing {{ num_branches }} candidate improvement branches for the prompt below.

Prompt:
```
{{ input_text }}
```

Overall score: {{ overall_score }}/100 ({{ grade }})

{{ branches }}

Select the single best branch by zero-based index, or synthesize a prompt combining the strongest elements of several branches. Explain your choice.

Respond with ONLY valid JSON:
{% raw %}{"selected_branch_index": <index or null>, "synthesized_prompt": "<merged prompt or empty string>", "rationale": "<why>"}{% endraw %}"#;

pub const META_AUDIT: &str = r#"You are a meta-evaluator reviewing the quality of a prompt evaluation.

Original prompt:
```
{{ input_text }}
```

Overall score: {{ overall_score }}/100 ({{ grade }})
Dimension scores:
{{ dimension_summary }}

Improvements suggested:
{{ improvements }}

Rewritten prompt:
```
{{ rewritten_prompt }}
```

Score the evaluation itself from 0.0 to 1.0 on accuracy, completeness, actionability and faithfulness of the rewrite to the suggestions, plus your overall confidence. List improvements the evaluation missed (empty when none), an improved rewrite if the current one skipped any suggestion (null otherwise), and short findings about evaluation quality.
{% if rounds > 1 %}
Take {{ rounds }} passes over the evaluation before answering and report only the final result.
{% endif %}
Respond with ONLY valid JSON:
{% raw %}{"meta_assessment": {"accuracy_score": <0.0-1.0>, "completeness_score": <0.0-1.0>, "actionability_score": <0.0-1.0>, "faithfulness_score": <0.0-1.0>, "overall_confidence": <0.0-1.0>}, "refined_improvements": [{"priority": "CRITICAL|HIGH|MEDIUM|LOW", "title": "<title>", "suggestion": "<suggestion>"}], "refined_rewritten_prompt": null, "meta_findings": ["<finding>"]}{% endraw %}"#;

pub const FOLLOWUP: &str = r#"You are a prompt engineering assistant in a follow-up conversation about an evaluation.

Overall score: {{ overall_score }}/100 ({{ grade }})

Dimension scores:
{{ dimension_summary }}

Improvements suggested:
{{ improvements }}

Rewritten prompt:
{{ rewritten_prompt }}

Original prompt:
{{ input_text }}

Classify the user's message as exactly one intent:
- explain: more detail about a score or finding
- adjust_rewrite: change the rewritten prompt
- re_evaluate: a new or updated prompt to evaluate from scratch
- mode_switch: switch between prompt and system prompt evaluation

Respond with ONLY valid JSON:
{% raw %}{"intent": "explain|adjust_rewrite|re_evaluate|mode_switch", "response": "<reply to the user>", "new_prompt": null, "new_rewrite": null, "new_mode": null}{% endraw %}
Fill new_prompt for re_evaluate, new_rewrite for adjust_rewrite and new_mode ("prompt" or "system_prompt") for mode_switch."#;
