//! Document tree contract between the math core and a host editor.
//!
//! The host owns the real document. It exposes its text leaves in document
//! order (with enough ancestor context to flag verbatim regions) and applies
//! a [`ReplacementPlan`] as one atomic mutation. [`crate::MathDocument`] is
//! the in-memory reference implementation.

use std::ops::Range;

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::types::{MathSpan, TextRun};

/// Address of an inline node: block index, then position within the block.
///
/// Ordering is document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LeafId {
    pub block: usize,
    pub index: usize,
}

impl LeafId {
    pub fn new(block: usize, index: usize) -> Self {
        Self { block, index }
    }

    /// First position of a block.
    pub fn block_start(block: usize) -> Self {
        Self { block, index: 0 }
    }
}

/// Half-open range of leaves, `start..end` in document order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeafRange {
    pub start: LeafId,
    pub end: LeafId,
}

impl LeafRange {
    pub fn new(start: LeafId, end: LeafId) -> Self {
        Self { start, end }
    }

    /// Just one leaf.
    pub fn single(leaf: LeafId) -> Self {
        Self {
            start: leaf,
            end: LeafId::new(leaf.block, leaf.index + 1),
        }
    }

    /// Every leaf of the given blocks.
    pub fn blocks(blocks: Range<usize>) -> Self {
        Self {
            start: LeafId::block_start(blocks.start),
            end: LeafId::block_start(blocks.end),
        }
    }

    pub fn contains(&self, leaf: LeafId) -> bool {
        self.start <= leaf && leaf < self.end
    }

    pub fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

/// Formatting marks carried by text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "href")]
pub enum Mark {
    Bold,
    Italic,
    Strike,
    /// Inline code. Text with this mark is verbatim.
    Code,
    Link(SmolStr),
}

/// An inline node: the only two shapes the math core reads or writes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum InlineNode {
    Text {
        text: SmolStr,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        marks: Vec<Mark>,
    },
    Math(MathSpan),
}

impl InlineNode {
    pub fn text(text: impl Into<SmolStr>) -> Self {
        InlineNode::Text {
            text: text.into(),
            marks: Vec::new(),
        }
    }

    pub fn marked(text: impl Into<SmolStr>, marks: Vec<Mark>) -> Self {
        InlineNode::Text {
            text: text.into(),
            marks,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            InlineNode::Text { text, .. } => Some(text),
            InlineNode::Math(_) => None,
        }
    }

    pub fn as_math(&self) -> Option<&MathSpan> {
        match self {
            InlineNode::Math(span) => Some(span),
            InlineNode::Text { .. } => None,
        }
    }

    pub fn marks(&self) -> &[Mark] {
        match self {
            InlineNode::Text { marks, .. } => marks,
            InlineNode::Math(_) => &[],
        }
    }
}

/// A text leaf as seen by the segment builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextLeaf {
    pub id: LeafId,
    pub text: SmolStr,
    pub marks: Vec<Mark>,
    /// Some ancestor (or the leaf's own mark) is a code region.
    pub in_excluded_region: bool,
}

impl TextLeaf {
    pub fn run(&self) -> TextRun<'_> {
        TextRun {
            text: &self.text,
            in_excluded_region: self.in_excluded_region,
        }
    }
}

/// Replace one leaf with a sequence of nodes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafReplacement {
    pub leaf: LeafId,
    pub nodes: Vec<InlineNode>,
}

/// Every leaf replacement of one pass, applied as a single mutation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplacementPlan {
    replacements: Vec<LeafReplacement>,
}

impl ReplacementPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, replacement: LeafReplacement) {
        self.replacements.push(replacement);
    }

    pub fn is_empty(&self) -> bool {
        self.replacements.is_empty()
    }

    pub fn len(&self) -> usize {
        self.replacements.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LeafReplacement> {
        self.replacements.iter()
    }

    /// Number of math nodes the plan inserts.
    pub fn math_count(&self) -> usize {
        self.replacements
            .iter()
            .flat_map(|r| r.nodes.iter())
            .filter(|n| matches!(n, InlineNode::Math(_)))
            .count()
    }

    /// Replacements ordered last leaf first.
    ///
    /// Applying in this order keeps every pending [`LeafId`] valid, since a
    /// splice only shifts the leaves after it.
    pub fn into_reverse_order(mut self) -> Vec<LeafReplacement> {
        self.replacements.sort_by(|a, b| b.leaf.cmp(&a.leaf));
        self.replacements
    }
}

/// What the math core needs from a host document.
pub trait DocumentTree {
    /// Text leaves in document order, limited to `scope` when given.
    fn text_leaves(&self, scope: Option<LeafRange>) -> Vec<TextLeaf>;

    /// The inline node at `leaf`, if any.
    fn node(&self, leaf: LeafId) -> Option<&InlineNode>;

    /// Whether `block` exists and holds no inline nodes.
    fn is_empty_block(&self, block: usize) -> bool;

    /// Whether `leaf` sits in a code block or carries the code mark.
    fn in_excluded_region(&self, leaf: LeafId) -> bool;

    /// Apply all replacements as one mutation (one undo step).
    ///
    /// Every leaf in the plan must exist, except the first position of an
    /// empty block, which is an insert. An empty plan must not mutate.
    fn apply_replacements(&mut self, plan: ReplacementPlan);
}

/// Marker attached to a host mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Mutation {
    /// The mutation inserted pasted content.
    pub paste: bool,
    /// Leaves touched by the mutation; `None` means the whole document.
    pub scope: Option<LeafRange>,
}

impl Mutation {
    pub fn paste(scope: LeafRange) -> Self {
        Self {
            paste: true,
            scope: Some(scope),
        }
    }

    pub fn edit(scope: LeafRange) -> Self {
        Self {
            paste: false,
            scope: Some(scope),
        }
    }
}
