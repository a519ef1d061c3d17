//! Context assembly: turning retrieved chunks into a bounded context block.

use ragmill_index::ScoredChunk;

use crate::error::{PipelineError, Result};

/// One chunk's contribution to the context block.
///
/// `text` is usually the chunk's full text; the final segment may be
/// truncated to fit the character budget.
#[derive(Debug, Clone)]
pub struct ContextSegment {
    /// The text that actually entered the context (possibly truncated).
    pub text: String,
    /// The retrieved chunk this segment came from, for source attribution.
    pub chunk: ScoredChunk,
}

/// An ordered, size-bounded block of context ready for prompting.
#[derive(Debug, Clone, Default)]
pub struct ContextBlock {
    pub segments: Vec<ContextSegment>,
}

impl ContextBlock {
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Total characters of chunk text in the block.
    pub fn char_count(&self) -> usize {
        self.segments.iter().map(|s| s.text.chars().count()).sum()
    }
}

/// Assemble retrieved chunks into a context block of at most
/// `max_context_chars` characters of chunk text.
///
/// Chunks arrive ranked; assembly keeps that order. Identical texts are
/// deduplicated (first occurrence wins), then chunks are appended greedily
/// until the budget runs out. The chunk that crosses the budget is truncated
/// to fit exactly rather than dropped, so the highest-ranked chunks always
/// win over exhaustive coverage. If the very first chunk alone exceeds the
/// budget it is truncated to the budget. Truncation counts characters, never
/// splitting a UTF-8 sequence.
pub fn assemble(retrieved: &[ScoredChunk], max_context_chars: usize) -> Result<ContextBlock> {
    if max_context_chars == 0 {
        return Err(PipelineError::invalid_parameter(
            "max_context_chars must be > 0",
        ));
    }

    let mut seen = std::collections::HashSet::new();
    let mut segments = Vec::new();
    let mut used = 0usize;

    for scored in retrieved {
        if !seen.insert(scored.chunk.text.clone()) {
            continue;
        }

        let len = scored.chunk.text.chars().count();
        let remaining = max_context_chars - used;

        if len <= remaining {
            segments.push(ContextSegment {
                text: scored.chunk.text.clone(),
                chunk: scored.clone(),
            });
            used += len;
            if used == max_context_chars {
                break;
            }
        } else {
            // Budget crossed: truncate this chunk to what remains and stop.
            // `remaining` is nonzero here, since an exact fill breaks above.
            let truncated: String = scored.chunk.text.chars().take(remaining).collect();
            segments.push(ContextSegment {
                text: truncated,
                chunk: scored.clone(),
            });
            break;
        }
    }

    Ok(ContextBlock { segments })
}
