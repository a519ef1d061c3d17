//! Overlapping sliding-window text chunking for semantic retrieval.
//!
//! Documents arrive as plain text plus provenance metadata (where the text
//! came from and what kind of source it was). [`TextSplitter`] cuts that text
//! into [`DraftChunk`]s: fixed-size character windows that overlap by a
//! configurable amount so that sentences straddling a window edge are fully
//! contained in at least one chunk. Draft chunks carry no id and no
//! embedding; both are assigned later when the chunks are inserted into the
//! vector index.
//!
//! # Window placement
//!
//! Windows are `chunk_size` characters wide and advance by
//! `chunk_size - overlap` (the stride), always starting at fixed multiples of
//! the stride. The *end* of a window prefers to back up to the nearest
//! whitespace within a small lookback so words are not cut in half; the
//! lookback never exceeds the overlap, so any characters trimmed from one
//! window's tail are still covered by the next window. With `overlap == 0`
//! every cut is a hard cut.
//!
//! ```
//! use ragmill_chunk::{SourceKind, TextSplitter};
//!
//! let splitter = TextSplitter::new(512, 100).unwrap();
//! let text = "x".repeat(1024);
//! let chunks = splitter.split(&text, "sample.pdf", SourceKind::Pdf);
//!
//! // stride 412: windows start at 0, 412, 824
//! assert_eq!(chunks.len(), 3);
//! assert_eq!(chunks[0].text.len(), 512);
//! assert_eq!(chunks[2].text.len(), 200);
//! assert_eq!(chunks[2].chunk_index, 2);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{ChunkError, Result};

/// Maximum number of characters the end of a window may back up in search of
/// a whitespace boundary. The effective lookback is the smaller of this and
/// the configured overlap.
const BOUNDARY_LOOKBACK: usize = 64;

/// The kind of source a chunk's text was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Text extracted from an uploaded PDF document.
    Pdf,
    /// Text scraped from a web page.
    Web,
}

impl SourceKind {
    /// Stable string form used for storage and display.
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::Pdf => "pdf",
            SourceKind::Web => "web",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = ChunkError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pdf" => Ok(SourceKind::Pdf),
            "web" => Ok(SourceKind::Web),
            other => Err(ChunkError::InvalidParameter {
                message: format!("unknown source kind: {other}"),
            }),
        }
    }
}

/// A plain-text document with provenance metadata, ready for chunking.
///
/// Extraction (PDF parsing, HTML scraping) happens upstream; by the time text
/// reaches this crate it is a string plus a source name and kind, regardless
/// of which extractor produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// The full extracted text.
    pub text: String,
    /// Name or URL identifying where the text came from.
    pub source: String,
    /// What kind of source produced the text.
    pub source_kind: SourceKind,
}

impl Document {
    pub fn new(text: impl Into<String>, source: impl Into<String>, source_kind: SourceKind) -> Self {
        Self {
            text: text.into(),
            source: source.into(),
            source_kind,
        }
    }
}

/// A chunk of source text before embedding and storage.
///
/// `chunk_index` is contiguous per source starting at 0, in emission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftChunk {
    /// The chunk's text content.
    pub text: String,
    /// Name or URL of the originating source.
    pub source: String,
    /// Kind of the originating source.
    pub source_kind: SourceKind,
    /// Position of this chunk within its source, starting at 0.
    pub chunk_index: usize,
}

/// Splits text into overlapping fixed-size chunks.
///
/// Splitting is pure and deterministic: the same `(text, chunk_size,
/// overlap)` always produces the same chunk sequence.
#[derive(Debug, Clone)]
pub struct TextSplitter {
    chunk_size: usize,
    overlap: usize,
}

impl TextSplitter {
    /// Create a splitter with the given window size and overlap, both in
    /// characters.
    ///
    /// # Errors
    ///
    /// Returns [`ChunkError::InvalidParameter`] if `chunk_size` is zero or
    /// `overlap >= chunk_size` (the window would never advance).
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        if chunk_size == 0 {
            return Err(ChunkError::InvalidParameter {
                message: "chunk_size must be greater than zero".into(),
            });
        }
        if overlap >= chunk_size {
            return Err(ChunkError::InvalidParameter {
                message: format!("overlap ({overlap}) must be smaller than chunk_size ({chunk_size})"),
            });
        }
        Ok(Self { chunk_size, overlap })
    }

    /// The configured window size in characters.
    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// The configured overlap in characters.
    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split `text` into draft chunks tagged with the given provenance.
    ///
    /// Empty or whitespace-only input yields no chunks. Every character of
    /// non-trivial input appears in at least one chunk.
    pub fn split(&self, text: &str, source: &str, source_kind: SourceKind) -> Vec<DraftChunk> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, plus the end of the text, so
        // windows measured in characters can slice on valid UTF-8 boundaries.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let n_chars = bounds.len() - 1;

        let stride = self.chunk_size - self.overlap;
        let lookback = BOUNDARY_LOOKBACK.min(self.overlap);

        let mut chunks = Vec::new();
        let mut start = 0;
        while start < n_chars {
            let end = (start + self.chunk_size).min(n_chars);
            let cut = self.adjust_cut(text, &bounds, start, end, n_chars, lookback);

            chunks.push(DraftChunk {
                text: text[bounds[start]..bounds[cut]].to_string(),
                source: source.to_string(),
                source_kind,
                chunk_index: chunks.len(),
            });

            start += stride;
        }

        chunks
    }

    /// Split a [`Document`], taking provenance from its metadata.
    pub fn split_document(&self, document: &Document) -> Vec<DraftChunk> {
        self.split(&document.text, &document.source, document.source_kind)
    }

    /// Back the window end up to just after the nearest whitespace within the
    /// lookback, when the cut would otherwise land inside a word. Window
    /// starts are never moved, so trimmed characters are re-covered by the
    /// next window's overlap.
    fn adjust_cut(
        &self,
        text: &str,
        bounds: &[usize],
        start: usize,
        end: usize,
        n_chars: usize,
        lookback: usize,
    ) -> usize {
        if lookback == 0 || end == n_chars {
            return end;
        }

        let char_at = |i: usize| text[bounds[i]..bounds[i + 1]].chars().next().unwrap();

        // Already at a boundary: the last kept char or the first dropped char
        // is whitespace.
        if char_at(end - 1).is_whitespace() || char_at(end).is_whitespace() {
            return end;
        }

        let floor = end.saturating_sub(lookback).max(start + 1);
        let mut cut = end - 1;
        while cut > floor {
            if char_at(cut - 1).is_whitespace() {
                return cut;
            }
            cut -= 1;
        }

        // No boundary within the lookback: hard cut.
        end
    }
}
