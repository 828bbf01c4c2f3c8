//! Adaptive chunking for long, multi-section prompts.
//!
//! Section boundaries come from markdown headings and XML-style tags; text
//! without them is split on blank lines. Undersized chunks are folded
//! forward into their successor. Per-chunk analyses are merged by
//! [`aggregate::aggregate`].

pub mod aggregate;
pub mod pool;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

pub use aggregate::aggregate;
pub use pool::{run_bounded, CHUNK_CONCURRENCY};

/// Estimated-token count at which a prompt is analyzed in chunks.
pub const CHUNK_THRESHOLD_TOKENS: usize = 2000;

/// Chunks below this estimate are merged into the following chunk.
pub const MIN_CHUNK_TOKENS: usize = 50;

const CHARS_PER_TOKEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkType {
    Task,
    Context,
    Examples,
    Constraints,
    Instructions,
    General,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PromptChunk {
    pub content: String,
    pub chunk_type: ChunkType,
    /// Position in text order; aggregation keys results by it.
    pub index: usize,
    /// Byte offset into the trimmed input.
    pub offset: usize,
    pub token_estimate: usize,
}

impl PromptChunk {
    fn new(content: String, chunk_type: ChunkType, offset: usize) -> Self {
        let token_estimate = estimate_tokens(&content);
        Self {
            content,
            chunk_type,
            index: 0,
            offset,
            token_estimate,
        }
    }
}

// ---------------------------------------------------------------------------
// Section detection
// ---------------------------------------------------------------------------

/// Compile one of the fixed section patterns below.
fn section_regex(source: &str) -> Regex {
    Regex::new(source).unwrap()
}

/// Checked in order; at a shared offset the first pattern wins.
static SECTION_PATTERNS: Lazy<Vec<(Regex, ChunkType)>> = Lazy::new(|| {
    vec![
        (section_regex(r"(?im)^#{1,3}\s+.*task"), ChunkType::Task),
        (section_regex(r"(?im)^#{1,3}\s+.*context"), ChunkType::Context),
        (section_regex(r"(?im)^#{1,3}\s+.*example"), ChunkType::Examples),
        (section_regex(r"(?im)^#{1,3}\s+.*constraint"), ChunkType::Constraints),
        (section_regex(r"(?im)^#{1,3}\s+.*instruction"), ChunkType::Instructions),
        (section_regex(r"(?im)^#{1,3}\s+.*requirement"), ChunkType::Constraints),
        (section_regex(r"(?im)^#{1,3}\s+.*reference"), ChunkType::Examples),
        (section_regex(r"(?m)^#{1,3}\s+\S"), ChunkType::General),
        (section_regex(r"(?i)<task>"), ChunkType::Task),
        (section_regex(r"(?i)<context>"), ChunkType::Context),
        (section_regex(r"(?i)<example"), ChunkType::Examples),
        (section_regex(r"(?i)<constraint"), ChunkType::Constraints),
        (section_regex(r"(?i)<instruction"), ChunkType::Instructions),
        (section_regex(r"(?i)<reference"), ChunkType::Examples),
    ]
});

static PARAGRAPH_BREAK: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n\s*\n").unwrap());

/// Rough token count: one token per four characters, never below 1.
pub fn estimate_tokens(text: &str) -> usize {
    (text.chars().count() / CHARS_PER_TOKEN).max(1)
}

pub fn should_chunk(text: &str) -> bool {
    should_chunk_at(text, CHUNK_THRESHOLD_TOKENS)
}

pub fn should_chunk_at(text: &str, threshold: usize) -> bool {
    estimate_tokens(text) >= threshold
}

/// Section boundaries as `(byte offset, type)`, sorted and unique by offset.
pub fn detect_sections(text: &str) -> Vec<(usize, ChunkType)> {
    let mut sections: Vec<(usize, ChunkType)> = Vec::new();
    for (regex, chunk_type) in SECTION_PATTERNS.iter() {
        for m in regex.find_iter(text) {
            if !sections.iter().any(|(offset, _)| *offset == m.start()) {
                sections.push((m.start(), *chunk_type));
            }
        }
    }
    sections.sort_by_key(|(offset, _)| *offset);
    sections
}

// ---------------------------------------------------------------------------
// Splitting
// ---------------------------------------------------------------------------

/// Split a prompt into chunks in text order. Empty input gives no chunks.
pub fn chunk_prompt(text: &str) -> Vec<PromptChunk> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let sections = detect_sections(text);
    let chunks = if sections.is_empty() {
        split_paragraphs(text)
    } else {
        split_sections(text, &sections)
    };
    merge_small_chunks(chunks, MIN_CHUNK_TOKENS)
}

fn split_sections(text: &str, sections: &[(usize, ChunkType)]) -> Vec<PromptChunk> {
    let mut chunks = Vec::new();

    let first = sections[0].0;
    if first > 0 {
        let preamble = text[..first].trim();
        if !preamble.is_empty() {
            chunks.push(PromptChunk::new(preamble.to_string(), ChunkType::General, 0));
        }
    }

    for (i, (offset, chunk_type)) in sections.iter().enumerate() {
        let end = sections.get(i + 1).map(|(next, _)| *next).unwrap_or(text.len());
        let content = text[*offset..end].trim();
        if !content.is_empty() {
            chunks.push(PromptChunk::new(content.to_string(), *chunk_type, *offset));
        }
    }
    chunks
}

fn split_paragraphs(text: &str) -> Vec<PromptChunk> {
    let mut chunks = Vec::new();
    let mut start = 0;
    let mut push = |start: usize, end: usize| {
        let content = text[start..end].trim();
        if !content.is_empty() {
            chunks.push(PromptChunk::new(content.to_string(), ChunkType::General, start));
        }
    };
    for m in PARAGRAPH_BREAK.find_iter(text) {
        push(start, m.start());
        start = m.end();
    }
    push(start, text.len());
    chunks
}

/// Fold every chunk under `min_tokens` into the chunk after it, repeating
/// until no undersized chunk has a successor. Merges never go backwards;
/// the merged chunk keeps the earlier offset and takes the later type.
pub fn merge_small_chunks(mut chunks: Vec<PromptChunk>, min_tokens: usize) -> Vec<PromptChunk> {
    loop {
        let mut merged: Vec<PromptChunk> = Vec::with_capacity(chunks.len());
        let mut changed = false;
        let mut iter = chunks.into_iter().peekable();

        while let Some(current) = iter.next() {
            if current.token_estimate < min_tokens {
                if let Some(next) = iter.next() {
                    let content = format!("{}\n\n{}", current.content, next.content);
                    merged.push(PromptChunk::new(content, next.chunk_type, current.offset));
                    changed = true;
                    continue;
                }
            }
            merged.push(current);
        }

        chunks = merged;
        if !changed || chunks.len() <= 1 {
            break;
        }
    }

    for (index, chunk) in chunks.iter_mut().enumerate() {
        chunk.index = index;
    }
    chunks
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
