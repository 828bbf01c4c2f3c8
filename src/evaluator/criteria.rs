//! Criterion catalogs per task type.
//!
//! Each catalog lists, for the four scored dimensions, the sub-criteria the
//! analyzer asks the model to detect. Catalogs are static data consumed
//! read-only when building analysis instructions.

use super::TaskType;

/// One detectable sub-criterion of a rubric dimension.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Criterion {
    pub name: &'static str,
    pub description: &'static str,
    pub detection_hint: &'static str,
    pub weight: f64,
}

/// Catalog for one task type, keyed by dimension in report order.
pub type Catalog = [(&'static str, &'static [Criterion]); 4];

/// Criterion catalog for `task_type`.
pub fn catalog(task_type: TaskType) -> Catalog {
    let (task, context, references, constraints) = match task_type {
        TaskType::General => (GENERAL_TASK, GENERAL_CONTEXT, GENERAL_REFERENCES, GENERAL_CONSTRAINTS),
        TaskType::EmailWriting => (EMAIL_TASK, EMAIL_CONTEXT, EMAIL_REFERENCES, EMAIL_CONSTRAINTS),
        TaskType::Summarization => (
            SUMMARIZATION_TASK,
            SUMMARIZATION_CONTEXT,
            SUMMARIZATION_REFERENCES,
            SUMMARIZATION_CONSTRAINTS,
        ),
        TaskType::CodingTask => (CODING_TASK, CODING_CONTEXT, CODING_REFERENCES, CODING_CONSTRAINTS),
        TaskType::ExamInterview => (EXAM_TASK, EXAM_CONTEXT, EXAM_REFERENCES, EXAM_CONSTRAINTS),
        TaskType::LinkedinPost => (
            LINKEDIN_TASK,
            LINKEDIN_CONTEXT,
            LINKEDIN_REFERENCES,
            LINKEDIN_CONSTRAINTS,
        ),
    };
    [
        ("task", task),
        ("context", context),
        ("references", references),
        ("constraints", constraints),
    ]
}

/// Markdown rendering of a catalog, one `### DIMENSION` section per dimension.
pub fn describe(task_type: TaskType) -> String {
    catalog(task_type)
        .iter()
        .map(|(dimension, criteria)| {
            let lines: Vec<String> = criteria
                .iter()
                .map(|c| format!("  - {}: {} (hint: {})", c.name, c.description, c.detection_hint))
                .collect();
            format!("### {}\n{}", dimension.to_uppercase(), lines.join("\n"))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Output-judge dimensions used when judging degrades, with their fallback comment.
pub fn fallback_output_dimensions(task_type: TaskType) -> &'static [(&'static str, &'static str)] {
    match task_type {
        TaskType::General => &[
            ("relevance", "Could not evaluate relevance."),
            ("coherence", "Could not evaluate coherence."),
            ("completeness", "Could not evaluate completeness."),
            ("instruction_following", "Could not evaluate instruction following."),
            ("hallucination_risk", "Could not evaluate hallucination risk."),
        ],
        TaskType::EmailWriting => &[
            ("tone_appropriateness", "Could not evaluate tone appropriateness."),
            ("professional_email_structure", "Could not evaluate email structure."),
            ("audience_fit", "Could not evaluate audience fit."),
            ("purpose_achievement", "Could not evaluate purpose achievement."),
            ("conciseness_clarity", "Could not evaluate conciseness and clarity."),
        ],
        TaskType::Summarization => &[
            ("information_accuracy", "Could not evaluate information accuracy."),
            ("logical_structure", "Could not evaluate logical structure."),
            ("key_information_coverage", "Could not evaluate key information coverage."),
            ("source_fidelity", "Could not evaluate source fidelity."),
            ("conciseness_precision", "Could not evaluate conciseness and precision."),
        ],
        TaskType::CodingTask => &[
            ("code_correctness", "Could not evaluate code correctness."),
            ("code_quality", "Could not evaluate code quality."),
            ("requirements_coverage", "Could not evaluate requirements coverage."),
            ("error_handling_security", "Could not evaluate error handling and security."),
            ("maintainability", "Could not evaluate maintainability."),
        ],
        TaskType::ExamInterview => &[
            ("question_quality", "Could not evaluate question quality."),
            ("assessment_coverage", "Could not evaluate assessment coverage."),
            ("difficulty_calibration", "Could not evaluate difficulty calibration."),
            ("rubric_completeness", "Could not evaluate rubric completeness."),
            ("fairness_objectivity", "Could not evaluate fairness and objectivity."),
        ],
        TaskType::LinkedinPost => &[
            ("professional_tone_authenticity", "Could not evaluate professional tone and authenticity."),
            ("hook_scroll_stopping_power", "Could not evaluate hook and scroll-stopping power."),
            ("audience_engagement_potential", "Could not evaluate audience engagement potential."),
            ("value_delivery_expertise", "Could not evaluate value delivery and expertise showcase."),
            ("linkedin_platform_optimization", "Could not evaluate LinkedIn platform optimization."),
        ],
    }
}

// ---------------------------------------------------------------------------
// Catalog data
// ---------------------------------------------------------------------------

const GENERAL_TASK: &[Criterion] = &[
    Criterion {
        name: "clear_action_verb",
        description: "The prompt contains a clear, imperative action verb that specifies what to do",
        detection_hint: "Look for verbs like: write, create, draft, list, summarize, analyze, generate, build, design, explain, compare, evaluate",
        weight: 0.25,
    },
    Criterion {
        name: "specific_deliverable",
        description: "The prompt specifies exactly what output is expected (not vague like 'something about X')",
        detection_hint: "Check for specific nouns: article, report, list, table, email, script, summary, plan, guide, presentation",
        weight: 0.3,
    },
    Criterion {
        name: "persona_defined",
        description: "The prompt assigns a persona or expertise level to the AI",
        detection_hint: "Look for patterns: 'You are a...', 'Act as a...', 'As a...', 'You're a...', 'From the perspective of...'",
        weight: 0.25,
    },
    Criterion {
        name: "output_format_specified",
        description: "The prompt specifies the desired output format",
        detection_hint: "Look for: bullet list, numbered list, table, paragraph, JSON, markdown, email format, specific word/page count",
        weight: 0.2,
    },
];

const GENERAL_CONTEXT: &[Criterion] = &[
    Criterion {
        name: "background_provided",
        description: "The prompt includes background information or situational context",
        detection_hint: "Look for: reasons, motivations, project descriptions, 'because', 'the situation is', 'I'm working on'",
        weight: 0.25,
    },
    Criterion {
        name: "audience_defined",
        description: "The prompt specifies who the output is for",
        detection_hint: "Look for: 'for beginners', 'aimed at executives', 'for my team', 'targeting developers', specific audience names",
        weight: 0.25,
    },
    Criterion {
        name: "goals_stated",
        description: "The prompt explains the purpose or goal of the output",
        detection_hint: "Look for: 'the goal is', 'I want to achieve', 'this will be used for', 'to help with', objective statements",
        weight: 0.25,
    },
    Criterion {
        name: "domain_specificity",
        description: "The prompt includes domain-specific details that narrow the scope",
        detection_hint: "Look for: industry terms, specific technologies, geographic scope, time periods, specialized vocabulary",
        weight: 0.25,
    },
];

const GENERAL_REFERENCES: &[Criterion] = &[
    Criterion {
        name: "examples_included",
        description: "The prompt includes examples of expected output or input/output pairs",
        detection_hint: "Look for: 'for example', 'like this', 'here's an example', sample text, quoted examples",
        weight: 0.4,
    },
    Criterion {
        name: "structured_references",
        description: "References are structured with XML tags, headings, or clear delimiters",
        detection_hint: "Look for: XML tags (<example>), markdown headings, labeled sections, 'Reference 1:', numbered examples",
        weight: 0.3,
    },
    Criterion {
        name: "reference_labeling",
        description: "References are clearly introduced with transitional phrases",
        detection_hint: "Look for: 'Refer to these materials', 'Use the following examples', 'Based on this', 'Reference the'",
        weight: 0.3,
    },
];

const GENERAL_CONSTRAINTS: &[Criterion] = &[
    Criterion {
        name: "scope_boundaries",
        description: "The prompt defines clear boundaries on what to include or focus on",
        detection_hint: "Look for: 'only include', 'focus on', 'limited to', 'specific to', geographic/temporal/topical boundaries",
        weight: 0.25,
    },
    Criterion {
        name: "format_constraints",
        description: "The prompt specifies formatting restrictions beyond basic format",
        detection_hint: "Look for: 'use headers', 'no jargon', 'plain language', 'technical writing style', tone requirements",
        weight: 0.25,
    },
    Criterion {
        name: "length_limits",
        description: "The prompt specifies length or size constraints",
        detection_hint: "Look for: word count, page count, number of items, 'brief', 'concise', 'comprehensive', 'in X words'",
        weight: 0.25,
    },
    Criterion {
        name: "exclusions_defined",
        description: "The prompt explicitly states what to exclude or avoid",
        detection_hint: "Look for: 'do not include', 'avoid', 'exclude', 'should not', 'don't mention', 'leave out'",
        weight: 0.25,
    },
];

const EMAIL_TASK: &[Criterion] = &[
    Criterion {
        name: "email_action_specified",
        description: "The prompt specifies the type of email action: write, reply, follow up, draft, forward, or compose",
        detection_hint: "Look for verbs: write an email, draft a reply, compose a follow-up, respond to, send a message, craft an email",
        weight: 0.25,
    },
    Criterion {
        name: "tone_style_defined",
        description: "The prompt specifies the desired tone and writing style for the email (formal, casual, persuasive, empathetic, urgent, diplomatic)",
        detection_hint: "Look for: 'formal tone', 'casual', 'friendly but professional', 'empathetic', 'direct', 'persuasive', 'apologetic', 'warm', 'firm but polite'",
        weight: 0.3,
    },
    Criterion {
        name: "email_purpose_clear",
        description: "The prompt clearly states what the email should accomplish: inform, request, persuade, apologize, confirm, introduce, follow up",
        detection_hint: "Look for: 'to request', 'to inform them about', 'asking for', 'to apologize', 'to schedule', 'to follow up on', 'to confirm'",
        weight: 0.25,
    },
    Criterion {
        name: "email_structure_specified",
        description: "The prompt specifies email structural elements: subject line, greeting style, closing, signature, or overall format",
        detection_hint: "Look for: 'include a subject line', 'professional greeting', 'sign off with', 'include a call to action', 'bullet points in the body', 'keep it to one paragraph'",
        weight: 0.2,
    },
];

const EMAIL_CONTEXT: &[Criterion] = &[
    Criterion {
        name: "recipient_defined",
        description: "The prompt specifies who will receive the email: their role, relationship to the sender, or name",
        detection_hint: "Look for: 'to my manager', 'to the client', 'to the team', 'to a potential employer', 'to the HR department', specific names or titles",
        weight: 0.3,
    },
    Criterion {
        name: "sender_context_provided",
        description: "The prompt provides context about the sender's role, relationship, or situation",
        detection_hint: "Look for: 'I am a...', 'as the project lead', 'I recently...', 'our company...', 'my role is...', context about the sender's position",
        weight: 0.25,
    },
    Criterion {
        name: "situation_background",
        description: "The prompt includes the background situation that prompted the email: what happened, what's needed, or the current status",
        detection_hint: "Look for: 'regarding the...', 'after our meeting about...', 'following up on...', 'in response to...', 'the deadline is...', 'the project is...'",
        weight: 0.25,
    },
    Criterion {
        name: "relationship_dynamic",
        description: "The prompt indicates the formality level or relationship dynamic between sender and recipient",
        detection_hint: "Look for: 'first-time contact', 'we have worked together', 'reporting to them', 'they are a new hire', 'long-standing client', 'cold outreach'",
        weight: 0.2,
    },
];

const EMAIL_REFERENCES: &[Criterion] = &[
    Criterion {
        name: "email_examples_provided",
        description: "The prompt includes example emails, previous correspondence, or sample tone to emulate",
        detection_hint: "Look for: 'here is a previous email', 'like this example', 'in the style of', pasted email threads, quoted text, 'similar to this email I sent'",
        weight: 0.4,
    },
    Criterion {
        name: "key_points_listed",
        description: "The prompt lists specific points, data, or topics that must be included in the email body",
        detection_hint: "Look for: numbered lists of points to cover, 'mention these points', 'include the following information', specific data points, names, dates, figures",
        weight: 0.35,
    },
    Criterion {
        name: "prior_thread_context",
        description: "The prompt provides context from prior email exchanges or conversation history that the email should reference",
        detection_hint: "Look for: 'they previously said...', 'in their last email...', 'we discussed...', 'the original thread was about...', forwarded content",
        weight: 0.25,
    },
];

const EMAIL_CONSTRAINTS: &[Criterion] = &[
    Criterion {
        name: "length_brevity",
        description: "The prompt specifies email length constraints: brief, concise, one paragraph, under N sentences, or detailed",
        detection_hint: "Look for: 'keep it brief', 'one paragraph', 'under 5 sentences', 'concise', 'detailed', 'short and direct', specific word/sentence count",
        weight: 0.25,
    },
    Criterion {
        name: "formality_level",
        description: "The prompt explicitly constrains the formality level: professional, semi-formal, casual, or specifies what to avoid",
        detection_hint: "Look for: 'professional language', 'no slang', 'avoid jargon', 'semi-formal', 'casual tone', 'corporate language', 'avoid being too stiff'",
        weight: 0.25,
    },
    Criterion {
        name: "content_exclusions",
        description: "The prompt states what to avoid or exclude from the email: certain topics, phrases, information, or emotional tones",
        detection_hint: "Look for: 'do not mention...', 'avoid bringing up...', 'don't sound desperate', 'no excuses', 'don't blame', 'avoid technical jargon', 'skip the pleasantries'",
        weight: 0.25,
    },
    Criterion {
        name: "call_to_action_specified",
        description: "The prompt specifies what action the recipient should take after reading, or what the desired next step is",
        detection_hint: "Look for: 'ask them to...', 'request a meeting', 'they should reply with...', 'prompt them to approve', 'end with a question', 'include next steps'",
        weight: 0.25,
    },
];

const SUMMARIZATION_TASK: &[Criterion] = &[
    Criterion {
        name: "content_scope_specified",
        description: "The prompt specifies WHICH content to summarize — a portion of a document, a specific sub-topic, or the entire source. Google best practice: 'Specify which content you want the gen AI tool to summarize, such as a portion of a document or a specific sub topic'",
        detection_hint: "Look for: 'summarize the findings section', 'summarize pages 5-10', 'summarize the entire report', 'focus on the methodology', 'condense the key arguments', 'distill the conclusions'. Also: summarize, condense, abstract, distill, recap, shorten, boil down",
        weight: 0.25,
    },
    Criterion {
        name: "format_and_tone_defined",
        description: "The prompt specifies the desired format (bullet points, paragraph, table) AND the tone or reading level. Google best practice: 'Include the desired format of the summary, such as bullet points, as well as the length and tone of the summary you want'",
        detection_hint: "Look for FORMAT: 'bullet points', 'numbered list', 'paragraph form', 'table', 'executive summary', 'abstract', 'TL;DR', 'key takeaways'. Look for TONE: 'formal', 'casual', 'technical', 'plain language', 'fit a 9th grade reading level', 'non-technical', 'professional'",
        weight: 0.3,
    },
    Criterion {
        name: "output_length_specified",
        description: "The prompt specifies the desired length of the summary: word count, sentence count, paragraph count, or relative reduction ratio",
        detection_hint: "Look for: 'in 200 words', '3-5 sentences', 'one paragraph', 'reduce to 10%', 'half the length', 'under 500 words', 'keep it brief', 'comprehensive overview', specific counts",
        weight: 0.25,
    },
    Criterion {
        name: "persona_or_reading_level",
        description: "The prompt assigns a persona or target reading level for the output. Google best practice: 'Add a persona, such as asking for the output to fit a 9th grade reading level'",
        detection_hint: "Look for: 'as an analyst', 'act as a technical writer', 'as a researcher', 'you are an executive assistant', 'from the perspective of a...', 'at a 9th grade reading level', 'for a non-expert', 'for a specialist'",
        weight: 0.2,
    },
];

const SUMMARIZATION_CONTEXT: &[Criterion] = &[
    Criterion {
        name: "source_document_described",
        description: "The prompt describes the source document: its type, title, subject, length, or origin — giving the gen AI enough context to understand what it is processing",
        detection_hint: "Look for: 'this research paper', 'the following article', 'a 50-page report', 'meeting transcript', 'legal document', 'email thread', 'PDF report', document titles, subject descriptions, page/word counts",
        weight: 0.3,
    },
    Criterion {
        name: "audience_for_summary",
        description: "The prompt specifies who will read the summary and their background or expertise level, so the gen AI can calibrate vocabulary, depth, and detail",
        detection_hint: "Look for: 'for executives', 'for a non-technical audience', 'for the board', 'for students', 'for my manager', 'for a 9th grader', target reader descriptions",
        weight: 0.25,
    },
    Criterion {
        name: "summary_purpose",
        description: "The prompt explains what the summary is for or why it is being created. Google best practice: 'Add additional context about what the summary is for or why you're creating it. This helps a gen AI tool anchor its response to something tangible'",
        detection_hint: "Look for: 'for a decision', 'as a briefing', 'for quick reference', 'literature review', 'to share with the team', 'to prepare for a meeting', 'to get the gist of', 'to extract insights from', 'so I can understand the key points'",
        weight: 0.25,
    },
    Criterion {
        name: "domain_specificity",
        description: "The prompt includes domain-specific context such as industry terms, specialized vocabulary, or field-specific requirements that anchor the summary to the right domain",
        detection_hint: "Look for: industry jargon, technical terms, legal terminology, medical vocabulary, financial concepts, academic discipline references, field-specific abbreviations",
        weight: 0.2,
    },
];

const SUMMARIZATION_REFERENCES: &[Criterion] = &[
    Criterion {
        name: "source_material_provided",
        description: "The prompt includes, attaches, or clearly references the source text that needs to be summarized. Without the source material, the gen AI cannot produce an accurate summary",
        detection_hint: "Look for: pasted text, 'the following document', 'attached file', 'the text below', 'here is the article', quoted source material, large blocks of text to summarize",
        weight: 0.45,
    },
    Criterion {
        name: "example_summary_with_source",
        description: "The prompt includes an example summary paired with the document it summarizes, so the gen AI knows what approach to take. Google best practice: 'Consider adding both the summary and the document it's summarizing as a reference so the tool knows what approach to take'",
        detection_hint: "Look for: 'here is an example summary', 'like this summary of...', 'in this style', sample output paired with its source, 'similar to how this was summarized', a reference summary alongside the original",
        weight: 0.3,
    },
    Criterion {
        name: "key_sections_identified",
        description: "The prompt identifies which parts of the source to focus on or prioritize in the summary, helping the gen AI allocate attention to the most important content",
        detection_hint: "Look for: 'focus on the methodology', 'prioritize the findings', 'emphasize the conclusions', 'skip the introduction', 'concentrate on chapters 3-5', section references, topic priorities",
        weight: 0.25,
    },
];

const SUMMARIZATION_CONSTRAINTS: &[Criterion] = &[
    Criterion {
        name: "length_word_limits",
        description: "The prompt specifies hard length constraints for the summary output. Google iterate guidance: adjust the length if the summary isn't working for you",
        detection_hint: "Look for: 'maximum 300 words', 'no more than 5 bullet points', 'keep under one page', 'exactly 3 paragraphs', specific word/sentence limits, 'brief', 'concise'",
        weight: 0.25,
    },
    Criterion {
        name: "inclusion_requirements",
        description: "The prompt specifies key findings, statistics, names, or facts that must be included in the summary to ensure nothing critical is lost during condensation",
        detection_hint: "Look for: 'must include the key findings', 'include all statistics', 'mention the authors', 'retain the main conclusions', 'preserve the numbers', required elements",
        weight: 0.25,
    },
    Criterion {
        name: "hallucination_safeguards",
        description: "The prompt includes instructions to prevent hallucinations and misinterpretations — critical for summarization of large inputs. Google best practice: 'Large amounts of text can increase the chance of misinterpretations, irrelevant chains of thought, or even hallucinations'",
        detection_hint: "Look for: 'no added interpretation', 'faithful to the source', 'do not editorialize', 'stick to the facts', 'objective summary', 'no opinion', 'do not fabricate', 'only use information from the source', 'cross-reference with the original'",
        weight: 0.25,
    },
    Criterion {
        name: "exclusion_constraints",
        description: "The prompt specifies sections, details, or types of information to omit from the summary. Google iterate guidance: ask the tool to 'adjust specific details about the output that aren't working for you'",
        detection_hint: "Look for: 'exclude the appendix', 'skip the bibliography', 'omit technical details', 'leave out examples', 'do not include anecdotes', 'avoid jargon', 'no references section'",
        weight: 0.25,
    },
];

const CODING_TASK: &[Criterion] = &[
    Criterion {
        name: "programming_language_specified",
        description: "The prompt specifies which programming language, framework, or technology stack to use",
        detection_hint: "Look for: 'in Python', 'using TypeScript', 'React component', 'Node.js', 'SQL query', 'Rust', 'Go', 'Java', 'C++', specific framework names, library references",
        weight: 0.25,
    },
    Criterion {
        name: "requirements_clarity",
        description: "The prompt clearly describes what the code should do — its functional requirements, inputs, outputs, and behavior",
        detection_hint: "Look for: 'function that takes X and returns Y', 'endpoint that accepts', 'script that reads', 'class that manages', input/output specifications, expected behavior descriptions, user stories",
        weight: 0.3,
    },
    Criterion {
        name: "architecture_guidance",
        description: "The prompt provides guidance on code structure, design patterns, or architectural approach",
        detection_hint: "Look for: 'use MVC pattern', 'implement as a class', 'create a REST API', 'use dependency injection', 'follow repository pattern', 'microservice', 'monolith', 'event-driven', module structure hints",
        weight: 0.25,
    },
    Criterion {
        name: "code_quality_standards",
        description: "The prompt specifies coding standards, style guidelines, or quality expectations",
        detection_hint: "Look for: 'follow PEP 8', 'use type hints', 'add docstrings', 'write clean code', 'SOLID principles', 'DRY', 'include comments', 'production-ready', 'well-documented', 'idiomatic'",
        weight: 0.2,
    },
];

const CODING_CONTEXT: &[Criterion] = &[
    Criterion {
        name: "project_context_provided",
        description: "The prompt describes the project or application the code will be part of",
        detection_hint: "Look for: 'for a web app', 'part of a data pipeline', 'in our e-commerce platform', 'for a CLI tool', 'mobile app', project descriptions, application context",
        weight: 0.25,
    },
    Criterion {
        name: "technical_constraints_specified",
        description: "The prompt specifies technical constraints such as runtime environment, dependencies, or compatibility requirements",
        detection_hint: "Look for: 'Python 3.11+', 'must run on AWS Lambda', 'compatible with PostgreSQL', 'no external dependencies', 'browser-compatible', version requirements, platform constraints",
        weight: 0.25,
    },
    Criterion {
        name: "target_developer_audience",
        description: "The prompt indicates the skill level or role of the developer who will use or maintain the code",
        detection_hint: "Look for: 'for junior developers', 'senior-level code', 'beginner-friendly', 'for the team', 'maintainable by non-experts', 'production team', skill level references",
        weight: 0.25,
    },
    Criterion {
        name: "existing_codebase_context",
        description: "The prompt references existing code, APIs, or systems that the new code must integrate with",
        detection_hint: "Look for: 'integrate with our existing', 'extend the current', 'compatible with the existing API', 'add to the module', code snippets, import references, existing function/class names",
        weight: 0.25,
    },
];

const CODING_REFERENCES: &[Criterion] = &[
    Criterion {
        name: "code_examples_provided",
        description: "The prompt includes code examples, snippets, or pseudocode showing the expected approach or output format",
        detection_hint: "Look for: code blocks, 'like this example', pseudocode, sample function signatures, expected output examples, 'similar to this code', interface definitions",
        weight: 0.4,
    },
    Criterion {
        name: "api_documentation_referenced",
        description: "The prompt references API documentation, library docs, or technical specifications",
        detection_hint: "Look for: 'per the API docs', 'according to the specification', 'following the OpenAPI schema', 'as documented in', URL references to documentation, RFC references",
        weight: 0.3,
    },
    Criterion {
        name: "test_expectations_defined",
        description: "The prompt specifies test cases, expected outputs, or testing requirements",
        detection_hint: "Look for: 'should pass these tests', 'expected output for input X is Y', 'include unit tests', 'test cases', 'edge cases to handle', 'given-when-then', assertion examples",
        weight: 0.3,
    },
];

const CODING_CONSTRAINTS: &[Criterion] = &[
    Criterion {
        name: "error_handling_requirements",
        description: "The prompt specifies how errors, edge cases, and invalid inputs should be handled",
        detection_hint: "Look for: 'handle errors gracefully', 'raise ValueError for', 'return None on failure', 'try/except', 'validate input', 'edge cases', 'graceful degradation', error response formats",
        weight: 0.25,
    },
    Criterion {
        name: "security_considerations",
        description: "The prompt addresses security concerns such as input validation, authentication, or data sanitization",
        detection_hint: "Look for: 'sanitize input', 'prevent SQL injection', 'validate user input', 'authentication required', 'CORS policy', 'rate limiting', 'encrypt', 'secure', OWASP references",
        weight: 0.25,
    },
    Criterion {
        name: "performance_requirements",
        description: "The prompt specifies performance expectations such as time complexity, memory limits, or throughput targets",
        detection_hint: "Look for: 'O(n) time complexity', 'handle 1M records', 'response under 200ms', 'memory efficient', 'optimize for speed', 'batch processing', 'async', 'concurrent', performance benchmarks",
        weight: 0.25,
    },
    Criterion {
        name: "scope_exclusions",
        description: "The prompt explicitly states what to exclude, avoid, or not implement",
        detection_hint: "Look for: 'do not implement', 'exclude authentication', 'no database logic', 'avoid using', 'don't add logging', 'skip the UI', 'out of scope', 'leave out'",
        weight: 0.25,
    },
];

const EXAM_TASK: &[Criterion] = &[
    Criterion {
        name: "assessment_objective_defined",
        description: "The prompt clearly defines what the exam or interview should assess — knowledge, skills, competencies, or aptitude",
        detection_hint: "Look for: 'assess knowledge of', 'test understanding of', 'evaluate ability to', 'measure competency in', 'gauge proficiency', learning objectives, assessment goals",
        weight: 0.25,
    },
    Criterion {
        name: "question_design_specified",
        description: "The prompt specifies the type and format of questions to generate — multiple choice, open-ended, scenario-based, coding challenges, behavioral",
        detection_hint: "Look for: 'multiple choice questions', 'open-ended', 'scenario-based', 'behavioral questions', 'STAR format', 'coding challenge', 'case study', 'true/false', 'fill in the blank', question type specifications",
        weight: 0.3,
    },
    Criterion {
        name: "difficulty_calibration",
        description: "The prompt specifies the difficulty level or distribution of questions (beginner, intermediate, advanced, or a mix)",
        detection_hint: "Look for: 'beginner level', 'advanced difficulty', 'mix of easy and hard', 'senior-level', 'entry-level', 'progressive difficulty', 'Bloom's taxonomy', difficulty percentages or distributions",
        weight: 0.25,
    },
    Criterion {
        name: "rubric_or_scoring_defined",
        description: "The prompt requests a scoring rubric, answer key, or evaluation criteria for the generated questions",
        detection_hint: "Look for: 'include an answer key', 'scoring rubric', 'point values', 'grading criteria', 'model answers', 'expected responses', 'evaluation criteria', 'pass/fail threshold'",
        weight: 0.2,
    },
];

const EXAM_CONTEXT: &[Criterion] = &[
    Criterion {
        name: "candidate_profile_defined",
        description: "The prompt describes the target candidate — their experience level, background, role being assessed, or expected knowledge base",
        detection_hint: "Look for: 'for junior developers', 'senior marketing candidates', 'medical students', 'new graduates', 'experienced professionals', candidate descriptions, role specifications, experience level",
        weight: 0.3,
    },
    Criterion {
        name: "assessment_context_provided",
        description: "The prompt provides context about the assessment setting — hiring, certification, classroom, training, or performance review",
        detection_hint: "Look for: 'for a job interview', 'certification exam', 'classroom quiz', 'annual review', 'training assessment', 'screening test', 'final exam', assessment purpose and setting",
        weight: 0.25,
    },
    Criterion {
        name: "subject_domain_specified",
        description: "The prompt specifies the subject area, topic, or domain the assessment should cover",
        detection_hint: "Look for: subject names, 'covering data structures', 'about machine learning', 'on project management', 'regarding compliance', topic lists, curriculum references, specific technical domains",
        weight: 0.25,
    },
    Criterion {
        name: "time_constraints_defined",
        description: "The prompt specifies time limits for the assessment or individual questions",
        detection_hint: "Look for: '60-minute exam', '5 minutes per question', 'time-boxed', 'timed assessment', 'allotted time', duration specifications, pacing guidance",
        weight: 0.2,
    },
];

const EXAM_REFERENCES: &[Criterion] = &[
    Criterion {
        name: "sample_questions_provided",
        description: "The prompt includes sample questions, past exam examples, or question templates to follow",
        detection_hint: "Look for: 'like this example question', 'similar to', sample Q&A pairs, question templates, 'in the style of', past exam references, example format demonstrations",
        weight: 0.4,
    },
    Criterion {
        name: "source_material_referenced",
        description: "The prompt references textbooks, courses, documentation, or knowledge bases the questions should draw from",
        detection_hint: "Look for: 'based on chapter 5', 'from the AWS Solutions Architect guide', 'per the curriculum', 'reference material', textbook names, course syllabi, official documentation",
        weight: 0.3,
    },
    Criterion {
        name: "assessment_standards_referenced",
        description: "The prompt references established assessment standards, frameworks, or methodologies",
        detection_hint: "Look for: 'Bloom's taxonomy', 'competency-based', 'ABET standards', 'Common Core aligned', 'ISO certification requirements', assessment frameworks, educational standards",
        weight: 0.3,
    },
];

const EXAM_CONSTRAINTS: &[Criterion] = &[
    Criterion {
        name: "fairness_and_bias_safeguards",
        description: "The prompt includes instructions to ensure questions are fair, unbiased, and accessible",
        detection_hint: "Look for: 'avoid cultural bias', 'gender-neutral', 'accessible language', 'no trick questions', 'fair assessment', 'inclusive', 'avoid stereotypes', 'equitable', ADA compliance references",
        weight: 0.25,
    },
    Criterion {
        name: "anti_cheating_measures",
        description: "The prompt addresses question uniqueness, randomization, or measures to prevent cheating",
        detection_hint: "Look for: 'unique questions', 'randomize order', 'question pool', 'not easily searchable', 'original questions', 'proctoring considerations', 'plagiarism-resistant', 'varied versions'",
        weight: 0.25,
    },
    Criterion {
        name: "format_and_structure_constraints",
        description: "The prompt specifies structural requirements — number of questions, sections, point distribution, or time allocation",
        detection_hint: "Look for: '20 questions', 'divided into 3 sections', '10 points each', 'total of 100 points', 'Section A: multiple choice', structural layout, question count, point values",
        weight: 0.25,
    },
    Criterion {
        name: "content_exclusions",
        description: "The prompt explicitly states topics, question types, or approaches to exclude",
        detection_hint: "Look for: 'do not include', 'avoid questions about', 'exclude memorization-only', 'no gotcha questions', 'skip advanced topics', 'don't test on', content boundaries",
        weight: 0.25,
    },
];

const LINKEDIN_TASK: &[Criterion] = &[
    Criterion {
        name: "post_objective_defined",
        description: "The prompt specifies the type of LinkedIn post to create: thought leadership, industry insight, personal story, how-to, announcement, or commentary",
        detection_hint: "Look for: 'thought leadership post', 'share an insight about', 'personal story about', 'how-to post', 'announce', 'commentary on', 'opinion piece', 'career lesson', 'industry trend'",
        weight: 0.3,
    },
    Criterion {
        name: "writing_voice_specified",
        description: "The prompt specifies the desired writing voice or style: authoritative, conversational, storytelling, data-driven, provocative, or inspirational",
        detection_hint: "Look for: 'authoritative tone', 'conversational', 'storytelling style', 'data-driven', 'provocative', 'inspirational', 'authentic voice', 'first-person', 'contrarian take', 'warm and approachable'",
        weight: 0.25,
    },
    Criterion {
        name: "content_format_specified",
        description: "The prompt specifies the content format: text post, carousel outline, poll, article, listicle, or story-based post",
        detection_hint: "Look for: 'text post', 'carousel', 'poll', 'article', 'listicle', 'numbered list', 'story format', 'single image post', 'thread-style', 'short-form', 'long-form'",
        weight: 0.25,
    },
    Criterion {
        name: "call_to_action_defined",
        description: "The prompt specifies what action the audience should take: comment, share, visit a link, engage with a question, or tag someone",
        detection_hint: "Look for: 'ask a question at the end', 'encourage comments', 'invite sharing', 'link to', 'tag someone', 'call to action', 'engagement question', 'what do you think?', 'agree or disagree?'",
        weight: 0.2,
    },
];

const LINKEDIN_CONTEXT: &[Criterion] = &[
    Criterion {
        name: "target_audience_specified",
        description: "The prompt specifies who the post is targeting: industry, role, seniority level, or professional community",
        detection_hint: "Look for: 'targeting HR leaders', 'for CTOs', 'aimed at marketers', 'startup founders', 'mid-career professionals', 'C-suite', 'hiring managers', 'developers', specific industry or role names",
        weight: 0.3,
    },
    Criterion {
        name: "author_identity_defined",
        description: "The prompt establishes the author's professional brand, expertise area, or credibility basis",
        detection_hint: "Look for: 'I am a VP of', 'as a 10-year veteran', 'from my experience as', 'my background in', 'our company specializes in', 'thought leader in', professional title or credentials",
        weight: 0.25,
    },
    Criterion {
        name: "industry_topic_context",
        description: "The prompt provides context about industry trends, news hooks, or seasonal relevance that make the post timely",
        detection_hint: "Look for: 'recent trend in', 'following the news about', 'this quarter', 'in light of', 'the current state of', 'emerging topic', 'hot debate about', references to current events or industry shifts",
        weight: 0.25,
    },
    Criterion {
        name: "platform_awareness",
        description: "The prompt shows awareness of LinkedIn's platform mechanics: algorithm preferences, hashtag strategy, engagement patterns, or timing",
        detection_hint: "Look for: 'LinkedIn algorithm', 'hashtags', 'engagement', 'visibility', 'first 2 lines', 'hook', 'line breaks', 'emoji usage', 'posting time', 'dwell time', platform-specific formatting guidance",
        weight: 0.2,
    },
];

const LINKEDIN_REFERENCES: &[Criterion] = &[
    Criterion {
        name: "inspiration_posts_provided",
        description: "The prompt includes example posts, style references, or viral post templates to emulate",
        detection_hint: "Look for: 'like this post', 'in the style of', 'similar to', example post text, 'viral post format', 'here is an example', referenced LinkedIn influencers or post styles",
        weight: 0.4,
    },
    Criterion {
        name: "data_statistics_referenced",
        description: "The prompt references specific data points, research, case studies, or statistics to ground the post in credibility",
        detection_hint: "Look for: 'cite the study', 'according to', 'research shows', 'data from', 'statistics', 'case study', 'survey results', 'report by', specific numbers or percentages",
        weight: 0.3,
    },
    Criterion {
        name: "expertise_basis_specified",
        description: "The prompt specifies the personal experience, company data, or credibility anchors that support the post's authority",
        detection_hint: "Look for: 'from my experience', 'I have seen', 'our team found', 'in my 15 years', 'based on our company data', 'lessons I learned', 'mistakes I made', personal anecdotes or proprietary insights",
        weight: 0.3,
    },
];

const LINKEDIN_CONSTRAINTS: &[Criterion] = &[
    Criterion {
        name: "length_formatting_constraints",
        description: "The prompt specifies character or word limits, hook requirements for the first 2 lines, line break formatting, or paragraph length",
        detection_hint: "Look for: 'under 1300 characters', 'keep it concise', 'hook in the first 2 lines', 'short paragraphs', 'one sentence per line', 'line breaks between paragraphs', word or character count limits, 'above the fold'",
        weight: 0.3,
    },
    Criterion {
        name: "tone_boundaries",
        description: "The prompt sets tone boundaries: professional yet authentic, no hard selling, no clickbait, or specific emotional range",
        detection_hint: "Look for: 'professional but authentic', 'no hard selling', 'avoid clickbait', 'genuine tone', 'not preachy', 'humble', 'avoid bragging', 'no corporate jargon', 'vulnerable but professional', tone restrictions",
        weight: 0.25,
    },
    Criterion {
        name: "content_exclusions",
        description: "The prompt explicitly states what to avoid: competitor mentions, controversial topics, confidential information, or sensitive subjects",
        detection_hint: "Look for: 'do not mention competitors', 'avoid politics', 'no confidential information', 'exclude', 'stay away from', 'do not name', 'avoid controversial', content boundaries",
        weight: 0.2,
    },
    Criterion {
        name: "hashtag_mention_requirements",
        description: "The prompt specifies hashtag count, placement, or @mention requirements for the post",
        detection_hint: "Look for: 'include 3-5 hashtags', 'niche hashtags', 'relevant hashtags', 'hashtag placement', '@mention', 'tag the company', 'branded hashtag', hashtag count or strategy",
        weight: 0.25,
    },
];

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
