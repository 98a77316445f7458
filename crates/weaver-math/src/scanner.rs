//! Delimiter scanning.
//!
//! Each [`DelimiterKind`] is matched independently with leftmost, non-overlapping
//! semantics. The compiled patterns are immutable and shared; every call
//! iterates with its own match state, so repeated scans never influence each other.
//!
//! `$` and `$$` share one left-to-right pass over unescaped `$` runs:
//!
//! - A run of two or more `$` opens display math on its last two `$`. The
//!   display closes at the first two `$` of the next run that has at least two.
//!   A `$$` with no such run after it is literal text.
//! - A single `$` opens inline math. It closes at the next `$`, provided the
//!   content has no newline. A pending inline also closes on the first `$` of a
//!   longer run glued to the content (`$a$$b$`), and the rest of that run is
//!   scanned again from there.

use std::sync::LazyLock;

use regex::Regex;
use smol_str::SmolStr;

use crate::config::MathConfig;
use crate::types::{Candidate, DelimiterKind};

/// `\[ ... \]`, content may span lines.
static BLOCK_BRACKET_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\[(.*?)\\\]").expect("block bracket pattern"));

/// `\( ... \)`, content up to the nearest `\)`.
static INLINE_PAREN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\\\((.*?)\\\)").expect("inline paren pattern"));

/// Clean matched content: strip invisible characters, then trim.
///
/// Returns `None` when nothing is left.
pub fn clean_content(content: &str, strip_chars: &[char]) -> Option<SmolStr> {
    let cleaned: String = content.chars().filter(|c| !strip_chars.contains(c)).collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(SmolStr::new(trimmed))
    }
}

/// Find all candidates of one kind, leftmost first.
///
/// Unterminated openers produce nothing. A match whose content is empty after
/// cleaning is not a candidate, and scanning resumes inside it instead of
/// skipping the whole match.
pub fn candidates_for(kind: DelimiterKind, text: &str, strip_chars: &[char]) -> Vec<Candidate> {
    match kind {
        DelimiterKind::BlockBracket => {
            pattern_candidates(&BLOCK_BRACKET_RE, kind, text, strip_chars)
        }
        DelimiterKind::InlineParen => {
            pattern_candidates(&INLINE_PAREN_RE, kind, text, strip_chars)
        }
        DelimiterKind::BlockDollar | DelimiterKind::InlineDollar => {
            scan_dollars(text, strip_chars)
                .candidates
                .into_iter()
                .filter(|c| c.kind == kind)
                .collect()
        }
    }
}

/// Whether `text` has a `$$` that no later `$$` closes.
///
/// Stored text uses this to keep display math with blank lines in one block.
pub fn has_unclosed_display(text: &str) -> bool {
    text.contains("$$") && scan_dollars(text, &[]).unclosed_display
}

fn pattern_candidates(
    re: &Regex,
    kind: DelimiterKind,
    text: &str,
    strip_chars: &[char],
) -> Vec<Candidate> {
    let mut found = Vec::new();
    let mut pos = 0;
    while pos < text.len() {
        let Some(caps) = re.captures_at(text, pos) else {
            break;
        };
        let (Some(whole), Some(content)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        match clean_content(content.as_str(), strip_chars) {
            Some(raw_latex) => {
                found.push(Candidate {
                    range: whole.range(),
                    kind,
                    raw_latex,
                });
                pos = whole.end();
            }
            None => {
                let opener = text[whole.start()..].chars().next().map_or(1, char::len_utf8);
                pos = whole.start() + opener;
            }
        }
    }
    found
}

/// Unescaped runs of `$` as `(offset, length)`.
///
/// A backslash escapes the next character, so `\$` never starts a run.
fn dollar_runs(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut runs = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'$' => {
                let len = bytes[i..].iter().take_while(|b| **b == b'$').count();
                runs.push((i, len));
                i += len;
            }
            _ => i += 1,
        }
    }
    runs
}

#[derive(Debug, Default)]
struct DollarScan {
    /// Display and inline candidates in text order.
    candidates: Vec<Candidate>,
    unclosed_display: bool,
}

fn scan_dollars(text: &str, strip_chars: &[char]) -> DollarScan {
    let runs = dollar_runs(text);
    let mut scan = DollarScan::default();
    let mut inline_open: Option<usize> = None;
    let mut k = 0;
    // `$` of `runs[k]` already taken by an earlier step.
    let mut used = 0;

    while k < runs.len() {
        let (offset, len) = runs[k];
        let at = offset + used;
        let left = len - used;

        if let Some(open) = inline_open.take() {
            match inline_candidate(text, open, at, strip_chars) {
                Some(candidate) if left == 1 || follows_content(text, at) => {
                    scan.candidates.push(candidate);
                    used += 1;
                    if used == len {
                        k += 1;
                        used = 0;
                    }
                    continue;
                }
                None if left == 1 => {
                    // The closer may still open the next span.
                    inline_open = Some(at);
                    k += 1;
                    used = 0;
                    continue;
                }
                _ => {}
            }
        }

        if left == 1 {
            inline_open = Some(at);
            k += 1;
            used = 0;
            continue;
        }

        let opener = offset + len - 2;
        let Some(close_k) = (k + 1..runs.len()).find(|&j| runs[j].1 >= 2) else {
            scan.unclosed_display = true;
            k += 1;
            used = 0;
            continue;
        };
        let (close, close_len) = runs[close_k];
        k = close_k;
        used = 0;
        if let Some(raw_latex) = clean_content(&text[opener + 2..close], strip_chars) {
            scan.candidates.push(Candidate {
                range: opener..close + 2,
                kind: DelimiterKind::BlockDollar,
                raw_latex,
            });
            used = 2;
            if used == close_len {
                k += 1;
                used = 0;
            }
        }
        // An empty display leaves its closer to be scanned as an opener.
    }
    scan
}

/// Inline math from the `$` at `open` to the `$` at `close`.
fn inline_candidate(
    text: &str,
    open: usize,
    close: usize,
    strip_chars: &[char],
) -> Option<Candidate> {
    let content = &text[open + 1..close];
    if content.contains('\n') {
        return None;
    }
    Some(Candidate {
        range: open..close + 1,
        kind: DelimiterKind::InlineDollar,
        raw_latex: clean_content(content, strip_chars)?,
    })
}

/// The byte before `at` is not whitespace.
fn follows_content(text: &str, at: usize) -> bool {
    text[..at].chars().next_back().is_some_and(|c| !c.is_whitespace())
}

/// Find candidates for every enabled kind, in priority order.
///
/// Candidates of different kinds may overlap; see [`crate::resolver`].
pub fn find_candidates(text: &str, config: &MathConfig) -> Vec<Candidate> {
    // Cheap reject: every delimiter contains either `$` or `\`.
    if !text.contains(['$', '\\']) {
        return Vec::new();
    }

    DelimiterKind::PRIORITY
        .into_iter()
        .filter(|kind| config.is_enabled(*kind))
        .flat_map(|kind| candidates_for(kind, text, &config.strip_chars))
        .collect()
}
