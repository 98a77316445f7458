//! In-memory block document implementing [`DocumentTree`].
//!
//! This is the reference host: a flat list of blocks, each holding inline
//! nodes. Code blocks and `Code`-marked text are verbatim regions. Every
//! mutation records one snapshot in the document's [`History`].

use serde::{Deserialize, Serialize};
use smol_str::SmolStr;

use crate::config::MathConfig;
use crate::error::CommandError;
use crate::history::{History, UndoManager};
use crate::storage;
use crate::tree::{
    DocumentTree, InlineNode, LeafId, LeafRange, Mark, Mutation, ReplacementPlan, TextLeaf,
};
use crate::types::MathSpan;

/// Block-level node kinds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "type")]
pub enum BlockKind {
    Paragraph,
    Heading {
        level: u8,
    },
    /// Verbatim. Never scanned for math.
    CodeBlock {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<SmolStr>,
    },
}

impl BlockKind {
    pub fn is_verbatim(&self) -> bool {
        matches!(self, BlockKind::CodeBlock { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub kind: BlockKind,
    #[serde(default)]
    pub inlines: Vec<InlineNode>,
}

impl Block {
    pub fn paragraph(inlines: Vec<InlineNode>) -> Self {
        Self {
            kind: BlockKind::Paragraph,
            inlines,
        }
    }

    pub fn heading(level: u8, inlines: Vec<InlineNode>) -> Self {
        Self {
            kind: BlockKind::Heading { level },
            inlines,
        }
    }

    /// A code block holding `text` as a single leaf. An empty language is none.
    pub fn code(language: &str, text: String) -> Self {
        let inlines = if text.is_empty() {
            Vec::new()
        } else {
            vec![InlineNode::text(text)]
        };
        Self {
            kind: BlockKind::CodeBlock {
                language: (!language.is_empty()).then(|| SmolStr::new(language)),
            },
            inlines,
        }
    }

    /// Concatenated text content, math as raw latex.
    pub fn plain_text(&self) -> String {
        self.inlines
            .iter()
            .map(|node| match node {
                InlineNode::Text { text, .. } => text.as_str(),
                InlineNode::Math(span) => span.latex.as_str(),
            })
            .collect()
    }
}

/// A block document with snapshot undo.
#[derive(Debug, Clone)]
pub struct MathDocument {
    blocks: Vec<Block>,
    history: History<Vec<Block>>,
    config: MathConfig,
    revision: u64,
}

impl Default for MathDocument {
    fn default() -> Self {
        Self::with_config(Vec::new(), &MathConfig::default())
    }
}

impl MathDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_blocks(blocks: Vec<Block>) -> Self {
        Self::with_config(blocks, &MathConfig::default())
    }

    pub fn with_config(blocks: Vec<Block>, config: &MathConfig) -> Self {
        Self {
            blocks,
            history: History::new(config.history_depth),
            config: config.clone(),
            revision: 0,
        }
    }

    /// Load stored text. Math stays as delimiter text until hydrated.
    pub fn from_text(text: &str) -> Self {
        Self::from_blocks(storage::parse_blocks(text))
    }

    pub fn from_text_with(text: &str, config: &MathConfig) -> Self {
        Self::with_config(storage::parse_blocks_with(text, config), config)
    }

    /// Canonical stored text.
    pub fn to_text(&self) -> String {
        storage::write_blocks(&self.blocks)
    }

    /// Block text content joined by blank lines, no delimiters or markup.
    pub fn plain_text(&self) -> String {
        self.blocks
            .iter()
            .map(Block::plain_text)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn config(&self) -> &MathConfig {
        &self.config
    }

    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }

    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    /// Bumped on every mutation, including undo and redo.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Undo steps currently available.
    pub fn history_depth(&self) -> usize {
        self.history.depth()
    }

    /// Every math node in document order.
    pub fn math_spans(&self) -> Vec<(LeafId, &MathSpan)> {
        self.blocks
            .iter()
            .enumerate()
            .flat_map(|(b, block)| {
                block
                    .inlines
                    .iter()
                    .enumerate()
                    .filter_map(move |(i, node)| Some((LeafId::new(b, i), node.as_math()?)))
            })
            .collect()
    }

    /// Type `text` into a text leaf at byte `offset`.
    ///
    /// An empty block accepts an insert at its first position.
    pub fn insert_text(
        &mut self,
        leaf: LeafId,
        offset: usize,
        text: &str,
    ) -> Result<Mutation, CommandError> {
        self.splice_text(leaf, offset, text)?;
        Ok(Mutation::edit(LeafRange::single(leaf)))
    }

    /// Paste plain text into a text leaf.
    ///
    /// Invisible placeholder characters are stripped before insertion.
    pub fn paste_text(
        &mut self,
        leaf: LeafId,
        offset: usize,
        text: &str,
    ) -> Result<Mutation, CommandError> {
        let cleaned = self.clean_pasted_text(text);
        self.splice_text(leaf, offset, &cleaned)?;
        Ok(Mutation::paste(LeafRange::single(leaf)))
    }

    /// Paste stored text as new blocks before block `at` (clamped to the end).
    pub fn paste_blocks(&mut self, at: usize, text: &str) -> Mutation {
        let cleaned = self.clean_pasted_text(text);
        let pasted = storage::parse_blocks_with(&cleaned, &self.config);
        let at = at.min(self.blocks.len());
        let count = pasted.len();

        self.record();
        self.blocks.splice(at..at, pasted);
        tracing::debug!(target: "weaver::math", at, count, "pasted blocks");
        Mutation::paste(LeafRange::blocks(at..at + count))
    }

    /// Strip invisible placeholder characters from pasted content.
    pub fn clean_pasted_text(&self, text: &str) -> String {
        self.config.strip_invisible(text)
    }

    fn splice_text(&mut self, leaf: LeafId, offset: usize, text: &str) -> Result<(), CommandError> {
        let unknown = CommandError::UnknownLeaf {
            block: leaf.block,
            index: leaf.index,
        };
        let block = self.blocks.get(leaf.block).ok_or(unknown.clone())?;

        if block.inlines.is_empty() && leaf.index == 0 {
            if offset != 0 {
                return Err(CommandError::InvalidSelection {
                    start: offset,
                    end: offset,
                });
            }
            self.record();
            self.blocks[leaf.block].inlines.push(InlineNode::text(text));
            return Ok(());
        }

        let current = match block.inlines.get(leaf.index) {
            Some(InlineNode::Text { text, .. }) => text,
            Some(InlineNode::Math(_)) => {
                return Err(CommandError::InvalidSelection {
                    start: offset,
                    end: offset,
                });
            }
            None => return Err(unknown),
        };
        if !current.is_char_boundary(offset) {
            return Err(CommandError::InvalidSelection {
                start: offset,
                end: offset,
            });
        }

        let updated = format!("{}{}{}", &current[..offset], text, &current[offset..]);
        self.record();
        if let InlineNode::Text { text, .. } = &mut self.blocks[leaf.block].inlines[leaf.index] {
            *text = SmolStr::from(updated);
        }
        Ok(())
    }

    fn record(&mut self) {
        self.history.record(self.blocks.clone());
        self.revision += 1;
    }
}

impl DocumentTree for MathDocument {
    fn text_leaves(&self, scope: Option<LeafRange>) -> Vec<TextLeaf> {
        let mut leaves = Vec::new();
        for (b, block) in self.blocks.iter().enumerate() {
            let verbatim = block.kind.is_verbatim();
            for (i, node) in block.inlines.iter().enumerate() {
                let id = LeafId::new(b, i);
                if scope.is_some_and(|s| !s.contains(id)) {
                    continue;
                }
                if let InlineNode::Text { text, marks } = node {
                    leaves.push(TextLeaf {
                        id,
                        text: text.clone(),
                        marks: marks.clone(),
                        in_excluded_region: verbatim || marks.contains(&Mark::Code),
                    });
                }
            }
        }
        leaves
    }

    fn node(&self, leaf: LeafId) -> Option<&InlineNode> {
        self.blocks.get(leaf.block)?.inlines.get(leaf.index)
    }

    fn is_empty_block(&self, block: usize) -> bool {
        self.blocks.get(block).is_some_and(|b| b.inlines.is_empty())
    }

    fn in_excluded_region(&self, leaf: LeafId) -> bool {
        let Some(block) = self.blocks.get(leaf.block) else {
            return false;
        };
        block.kind.is_verbatim()
            || block
                .inlines
                .get(leaf.index)
                .is_some_and(|node| node.marks().contains(&Mark::Code))
    }

    fn apply_replacements(&mut self, plan: ReplacementPlan) {
        if plan.is_empty() {
            return;
        }

        self.record();
        let mut touched = Vec::new();
        for replacement in plan.into_reverse_order() {
            let LeafId { block, index } = replacement.leaf;
            // An empty block takes an insert at its first position.
            let target = self.blocks.get(block).and_then(|b| match b.inlines.len() {
                0 if index == 0 => Some(0..0),
                len if index < len => Some(index..index + 1),
                _ => None,
            });
            debug_assert!(
                target.is_some(),
                "replacement for missing leaf {:?}",
                replacement.leaf
            );
            let Some(target) = target else {
                tracing::warn!(
                    target: "weaver::math",
                    leaf = ?replacement.leaf,
                    "dropping replacement for missing leaf"
                );
                continue;
            };
            self.blocks[block].inlines.splice(target, replacement.nodes);
            touched.push(block);
        }

        touched.dedup();
        for block in touched {
            merge_adjacent_text(&mut self.blocks[block].inlines);
        }
    }
}

impl UndoManager for MathDocument {
    fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    fn undo(&mut self) -> bool {
        let undone = self.history.undo(&mut self.blocks);
        if undone {
            self.revision += 1;
        }
        undone
    }

    fn redo(&mut self) -> bool {
        let redone = self.history.redo(&mut self.blocks);
        if redone {
            self.revision += 1;
        }
        redone
    }

    fn clear_history(&mut self) {
        self.history.clear();
    }
}

/// Join neighbouring text nodes with identical marks and drop empty ones.
fn merge_adjacent_text(inlines: &mut Vec<InlineNode>) {
    let mut merged: Vec<InlineNode> = Vec::with_capacity(inlines.len());
    for node in inlines.drain(..) {
        if let InlineNode::Text { text, marks } = &node {
            if text.is_empty() {
                continue;
            }
            if let Some(InlineNode::Text {
                text: prev,
                marks: prev_marks,
            }) = merged.last_mut()
            {
                if *prev_marks == *marks {
                    *prev = SmolStr::from(format!("{prev}{text}"));
                    continue;
                }
            }
        }
        merged.push(node);
    }
    *inlines = merged;
}
