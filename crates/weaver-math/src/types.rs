//! Core math types: delimiter kinds, scan candidates, math spans and resolved segments.
//!
//! These types are framework-agnostic. Offsets are byte offsets into the scanned
//! text, so they can be used to slice the scanned `&str` directly.

use std::fmt;
use std::ops::Range;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

/// One of the four recognized delimiter syntaxes.
///
/// Variants are declared in resolution priority order, highest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DelimiterKind {
    /// `\[ ... \]`
    BlockBracket,
    /// `$$ ... $$`
    BlockDollar,
    /// `\( ... \)`
    InlineParen,
    /// `$ ... $`
    InlineDollar,
}

impl DelimiterKind {
    /// All kinds, highest resolution priority first.
    pub const PRIORITY: [DelimiterKind; 4] = [
        DelimiterKind::BlockBracket,
        DelimiterKind::BlockDollar,
        DelimiterKind::InlineParen,
        DelimiterKind::InlineDollar,
    ];

    /// Opening delimiter text.
    pub fn open(self) -> &'static str {
        match self {
            DelimiterKind::BlockBracket => r"\[",
            DelimiterKind::BlockDollar => "$$",
            DelimiterKind::InlineParen => r"\(",
            DelimiterKind::InlineDollar => "$",
        }
    }

    /// Closing delimiter text.
    pub fn close(self) -> &'static str {
        match self {
            DelimiterKind::BlockBracket => r"\]",
            DelimiterKind::BlockDollar => "$$",
            DelimiterKind::InlineParen => r"\)",
            DelimiterKind::InlineDollar => "$",
        }
    }

    /// Whether this is a block-level (line spanning) form.
    pub fn spans_lines(self) -> bool {
        matches!(self, DelimiterKind::BlockBracket | DelimiterKind::BlockDollar)
    }

    /// Display mode implied by this delimiter.
    pub fn display_mode(self) -> bool {
        self.spans_lines()
    }

    /// Position in [`DelimiterKind::PRIORITY`]; lower wins.
    pub fn priority(self) -> usize {
        self as usize
    }

    /// Whether this form is still produced by the serializer.
    ///
    /// `\(..\)` and `\[..\]` are accepted on parse only.
    pub fn is_canonical(self) -> bool {
        matches!(self, DelimiterKind::BlockDollar | DelimiterKind::InlineDollar)
    }
}

/// A tentative match of one delimiter kind against a text run.
///
/// Candidates of different kinds may overlap; the resolver arbitrates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Byte range of the whole match, delimiters included.
    pub range: Range<usize>,
    pub kind: DelimiterKind,
    /// Delimiter-stripped, cleaned and trimmed content.
    pub raw_latex: SmolStr,
}

impl Candidate {
    /// Check whether this candidate shares any byte with `other`.
    pub fn overlaps(&self, other: &Range<usize>) -> bool {
        self.range.start < other.end && other.start < self.range.end
    }

    /// Convert into the resolved math span.
    pub fn to_span(&self) -> MathSpan {
        MathSpan::new(self.raw_latex.clone(), self.kind.display_mode())
    }
}

/// A recognized equation: latex source plus display mode.
///
/// This is the only scan product that survives into a document tree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MathSpan {
    pub latex: SmolStr,
    pub display_mode: bool,
}

impl MathSpan {
    pub fn new(latex: impl Into<SmolStr>, display_mode: bool) -> Self {
        Self {
            latex: latex.into(),
            display_mode,
        }
    }

    /// Inline (`$...$`) math.
    pub fn inline(latex: impl Into<SmolStr>) -> Self {
        Self::new(latex, false)
    }

    /// Display (`$$...$$`) math.
    pub fn display(latex: impl Into<SmolStr>) -> Self {
        Self::new(latex, true)
    }

    pub fn is_empty(&self) -> bool {
        self.latex.is_empty()
    }
}

impl fmt::Display for MathSpan {
    /// Writes the canonical delimiter form. See [`crate::serialize`].
    ///
    /// Display latex that starts or ends with `$` gets a space on that side,
    /// so the `$` is not read as part of the `$$` delimiter.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.display_mode {
            return write!(f, "${}$", self.latex);
        }
        let lead = if self.latex.starts_with('$') { " " } else { "" };
        let trail = if self.latex.ends_with('$') { " " } else { "" };
        write!(f, "$${lead}{}{trail}$$", self.latex)
    }
}

/// One piece of a resolved text run.
///
/// A scan yields segments that cover the run end to end with no gaps
/// and no overlaps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Unmatched literal text.
    Text { text: SmolStr, range: Range<usize> },
    /// A resolved equation and the delimiter it was written with.
    Math {
        span: MathSpan,
        kind: DelimiterKind,
        range: Range<usize>,
    },
}

impl Segment {
    /// Byte range in the scanned text.
    pub fn range(&self) -> Range<usize> {
        match self {
            Segment::Text { range, .. } | Segment::Math { range, .. } => range.clone(),
        }
    }

    pub fn is_math(&self) -> bool {
        matches!(self, Segment::Math { .. })
    }

    pub fn as_math(&self) -> Option<&MathSpan> {
        match self {
            Segment::Math { span, .. } => Some(span),
            Segment::Text { .. } => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Segment::Text { text, .. } => Some(text),
            Segment::Math { .. } => None,
        }
    }
}

/// A string from one inline context, with its verbatim flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextRun<'a> {
    pub text: &'a str,
    /// True inside code blocks and inline code.
    pub in_excluded_region: bool,
}

impl<'a> TextRun<'a> {
    pub fn new(text: &'a str) -> Self {
        Self {
            text,
            in_excluded_region: false,
        }
    }

    pub fn verbatim(text: &'a str) -> Self {
        Self {
            text,
            in_excluded_region: true,
        }
    }
}
