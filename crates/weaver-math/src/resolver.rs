//! Span resolution: turns overlapping candidates into one segment sequence.
//!
//! Candidates are accepted in priority order (`\[..\]`, `$$..$$`, `\(..\)`,
//! `$..$`). A candidate is accepted only if its range is free; the first
//! accepted range wins every overlap, including ties at the same start. Block
//! forms go first so that a single `$` inside a block body cannot be taken for
//! an inline boundary.

use std::ops::Range;

use smol_str::SmolStr;

use crate::config::MathConfig;
use crate::scanner::find_candidates;
use crate::types::{Candidate, Segment, TextRun};

/// Scan `text` with the default configuration.
///
/// Returns segments covering `0..text.len()` exactly. Text without any
/// resolvable math comes back as a single text segment.
pub fn scan(text: &str) -> Vec<Segment> {
    scan_with(text, &MathConfig::default())
}

/// Scan `text` with an explicit configuration.
pub fn scan_with(text: &str, config: &MathConfig) -> Vec<Segment> {
    resolve(text, find_candidates(text, config))
}

/// Scan a text run. Verbatim runs are never matched.
pub fn scan_run(run: &TextRun<'_>, config: &MathConfig) -> Vec<Segment> {
    if run.in_excluded_region {
        return vec![plain(run.text, 0..run.text.len())];
    }
    scan_with(run.text, config)
}

/// Pick non-overlapping candidates by priority.
///
/// Returned candidates are sorted by start offset.
pub fn select(mut candidates: Vec<Candidate>) -> Vec<Candidate> {
    // Stable: within a kind, leftmost order from the scanner is kept.
    candidates.sort_by_key(|c| c.kind.priority());

    let mut occupied: Vec<Range<usize>> = Vec::with_capacity(candidates.len());
    let mut accepted = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if let Some(taken) = occupied.iter().find(|r| candidate.overlaps(r)) {
            tracing::trace!(
                target: "weaver::math",
                kind = ?candidate.kind,
                range = ?candidate.range,
                blocked_by = ?taken,
                "candidate rejected"
            );
            continue;
        }
        occupied.push(candidate.range.clone());
        accepted.push(candidate);
    }

    accepted.sort_by_key(|c| c.range.start);
    accepted
}

/// Resolve candidates against `text` into a gap-free segment sequence.
pub fn resolve(text: &str, candidates: Vec<Candidate>) -> Vec<Segment> {
    let accepted = select(candidates);
    if accepted.is_empty() {
        return vec![plain(text, 0..text.len())];
    }

    let mut segments = Vec::with_capacity(accepted.len() * 2 + 1);
    let mut cursor = 0;
    for candidate in accepted {
        debug_assert!(candidate.range.start >= cursor, "accepted candidates overlap");
        debug_assert!(candidate.range.end <= text.len(), "candidate outside text");
        if candidate.range.start > cursor {
            segments.push(plain(text, cursor..candidate.range.start));
        }
        cursor = candidate.range.end;
        segments.push(Segment::Math {
            span: candidate.to_span(),
            kind: candidate.kind,
            range: candidate.range,
        });
    }
    if cursor < text.len() {
        segments.push(plain(text, cursor..text.len()));
    }

    tracing::trace!(
        target: "weaver::math",
        text_len = text.len(),
        segments = segments.len(),
        "resolved text run"
    );
    segments
}

fn plain(text: &str, range: Range<usize>) -> Segment {
    Segment::Text {
        text: SmolStr::new(&text[range.clone()]),
        range,
    }
}
