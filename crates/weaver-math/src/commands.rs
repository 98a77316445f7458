//! Structured math commands: insert, convert, unwrap, edit, input rules.
//!
//! Every command is generic over [`DocumentTree`] and goes through
//! [`DocumentTree::apply_replacements`], so each one is a single undo step.
//! Commands fail with a [`CommandError`] instead of mutating when they can't
//! apply; callers usually treat that as a no-op.

use std::ops::Range;

use smol_str::SmolStr;

use crate::error::CommandError;
use crate::tree::{DocumentTree, InlineNode, LeafId, LeafReplacement, ReplacementPlan};
use crate::types::MathSpan;

/// A byte range within one text leaf. A collapsed range is a cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextSelection {
    pub leaf: LeafId,
    pub range: Range<usize>,
}

impl TextSelection {
    pub fn new(leaf: LeafId, range: Range<usize>) -> Self {
        Self { leaf, range }
    }

    pub fn cursor(leaf: LeafId, offset: usize) -> Self {
        Self {
            leaf,
            range: offset..offset,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.range.is_empty()
    }
}

/// Strip a `$$...$$` or `$...$` wrapper from user-supplied latex.
///
/// A `$$` wrapper forces display mode; otherwise `display_mode` applies
/// (inline when `None`). The result is trimmed.
pub fn strip_wrapper(latex: &str, display_mode: Option<bool>) -> MathSpan {
    if latex.len() >= 4 && latex.starts_with("$$") && latex.ends_with("$$") {
        return MathSpan::display(latex[2..latex.len() - 2].trim());
    }
    let inner = if latex.len() >= 2 && latex.starts_with('$') && latex.ends_with('$') {
        &latex[1..latex.len() - 1]
    } else {
        latex
    };
    MathSpan::new(inner.trim(), display_mode.unwrap_or(false))
}

/// Replace `selection` with a math node holding `latex`.
///
/// Returns the id of the new math node.
pub fn set_latex<D>(
    doc: &mut D,
    selection: &TextSelection,
    latex: &str,
    display_mode: Option<bool>,
) -> Result<LeafId, CommandError>
where
    D: DocumentTree + ?Sized,
{
    if latex.is_empty() {
        return Err(CommandError::EmptyLatex);
    }
    let span = strip_wrapper(latex, display_mode);
    if span.is_empty() {
        return Err(CommandError::EmptyLatex);
    }
    replace_with_math(doc, selection, span)
}

/// Turn the selected text itself into math.
pub fn convert_selection<D>(doc: &mut D, selection: &TextSelection) -> Result<LeafId, CommandError>
where
    D: DocumentTree + ?Sized,
{
    if selection.is_collapsed() {
        return Err(CommandError::EmptySelection);
    }
    let text = selected_text(&*doc, selection)?;
    set_latex(doc, selection, &text, None)
}

/// Replace a math node with its raw latex as plain text.
///
/// Returns the latex that was unwrapped.
pub fn unset_latex<D>(doc: &mut D, leaf: LeafId) -> Result<SmolStr, CommandError>
where
    D: DocumentTree + ?Sized,
{
    let span = math_at(&*doc, leaf)?.clone();
    let nodes = if span.is_empty() {
        Vec::new()
    } else {
        vec![InlineNode::text(span.latex.clone())]
    };
    apply_one(doc, leaf, nodes);
    tracing::debug!(target: "weaver::math", ?leaf, "unset latex");
    Ok(span.latex)
}

/// Edit a math node's latex and, optionally, its display mode.
///
/// Empty latex is allowed here; an empty node is a fresh equation awaiting input.
pub fn update_math<D>(
    doc: &mut D,
    leaf: LeafId,
    latex: &str,
    display_mode: Option<bool>,
) -> Result<(), CommandError>
where
    D: DocumentTree + ?Sized,
{
    let current = math_at(&*doc, leaf)?;
    let span = MathSpan::new(latex.trim(), display_mode.unwrap_or(current.display_mode));
    if &span == current {
        return Ok(());
    }
    apply_one(doc, leaf, vec![InlineNode::Math(span)]);
    Ok(())
}

/// What a typed-delimiter input rule matched in the text before the cursor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRuleMatch {
    /// Byte range to replace, ending at the cursor.
    pub range: Range<usize>,
    pub span: MathSpan,
}

/// Match the input rules against the text preceding the cursor.
///
/// - `$$latex$$` just closed: display math.
/// - `$$` plus one whitespace char as the whole leaf: an empty display node.
/// - `$latex$` just closed, on one line: inline math.
pub fn match_input_rule(before: &str) -> Option<InputRuleMatch> {
    if let Some(head) = before.strip_suffix("$$") {
        let start = head.rfind("$$")?;
        let latex = head[start + 2..].trim();
        if latex.is_empty() {
            return None;
        }
        return Some(InputRuleMatch {
            range: start..before.len(),
            span: MathSpan::display(latex),
        });
    }

    if let Some(rest) = before.strip_prefix("$$") {
        let mut chars = rest.chars();
        if chars.next().is_some_and(char::is_whitespace) && chars.next().is_none() {
            return Some(InputRuleMatch {
                range: 0..before.len(),
                span: MathSpan::display(""),
            });
        }
    }

    let head = before.strip_suffix('$')?;
    let start = head.rfind('$')?;
    let content = &head[start + 1..];
    if content.contains('\n') {
        return None;
    }
    let latex = content.trim();
    if latex.is_empty() {
        return None;
    }
    Some(InputRuleMatch {
        range: start..before.len(),
        span: MathSpan::inline(latex),
    })
}

/// Run the input rules for a cursor at byte `cursor` in a text leaf.
///
/// Returns the new math node, or `None` when no rule matched or the leaf is
/// verbatim.
pub fn apply_input_rule<D>(
    doc: &mut D,
    leaf: LeafId,
    cursor: usize,
) -> Result<Option<LeafId>, CommandError>
where
    D: DocumentTree + ?Sized,
{
    if doc.in_excluded_region(leaf) {
        return Ok(None);
    }
    let text = text_at(&*doc, leaf)?;
    if !text.is_char_boundary(cursor) {
        return Err(CommandError::InvalidSelection {
            start: cursor,
            end: cursor,
        });
    }
    let Some(rule) = match_input_rule(&text[..cursor]) else {
        return Ok(None);
    };

    tracing::trace!(
        target: "weaver::math",
        ?leaf,
        display = rule.span.display_mode,
        "input rule matched"
    );
    let selection = TextSelection::new(leaf, rule.range);
    replace_with_math(doc, &selection, rule.span).map(Some)
}

fn replace_with_math<D>(
    doc: &mut D,
    selection: &TextSelection,
    span: MathSpan,
) -> Result<LeafId, CommandError>
where
    D: DocumentTree + ?Sized,
{
    let leaf = selection.leaf;
    if doc.in_excluded_region(leaf) {
        return Err(CommandError::ExcludedRegion);
    }
    let (text, marks) = match doc.node(leaf) {
        Some(InlineNode::Text { text, marks }) => (text.clone(), marks.clone()),
        Some(InlineNode::Math(_)) => {
            return Err(CommandError::InvalidSelection {
                start: selection.range.start,
                end: selection.range.end,
            });
        }
        None if leaf.index == 0 && doc.is_empty_block(leaf.block) => {
            (SmolStr::default(), Vec::new())
        }
        None => return Err(unknown(leaf)),
    };
    let range = checked_range(&text, &selection.range)?;

    let mut nodes = Vec::with_capacity(3);
    if range.start > 0 {
        nodes.push(InlineNode::marked(&text[..range.start], marks.clone()));
    }
    let math_index = leaf.index + nodes.len();
    nodes.push(InlineNode::Math(span.clone()));
    if range.end < text.len() {
        nodes.push(InlineNode::marked(&text[range.end..], marks));
    }

    apply_one(doc, leaf, nodes);
    Ok(locate_math(&*doc, LeafId::new(leaf.block, math_index), &span))
}

/// Find an inserted math node after the host merged text around it.
///
/// A prefix merged into the previous sibling moves the node back by one.
fn locate_math<D>(doc: &D, expected: LeafId, span: &MathSpan) -> LeafId
where
    D: DocumentTree + ?Sized,
{
    let shifted = LeafId::new(expected.block, expected.index.saturating_sub(1));
    [expected, shifted]
        .into_iter()
        .find(|id| doc.node(*id).and_then(InlineNode::as_math) == Some(span))
        .unwrap_or(expected)
}

fn apply_one<D>(doc: &mut D, leaf: LeafId, nodes: Vec<InlineNode>)
where
    D: DocumentTree + ?Sized,
{
    let mut plan = ReplacementPlan::new();
    plan.push(LeafReplacement { leaf, nodes });
    doc.apply_replacements(plan);
}

fn checked_range(text: &str, range: &Range<usize>) -> Result<Range<usize>, CommandError> {
    let valid = range.start <= range.end
        && text.is_char_boundary(range.start)
        && text.is_char_boundary(range.end);
    if !valid {
        return Err(CommandError::InvalidSelection {
            start: range.start,
            end: range.end,
        });
    }
    Ok(range.clone())
}

fn selected_text<D>(doc: &D, selection: &TextSelection) -> Result<String, CommandError>
where
    D: DocumentTree + ?Sized,
{
    let text = text_at(doc, selection.leaf)?;
    let range = checked_range(&text, &selection.range)?;
    Ok(text[range].to_string())
}

fn text_at<D>(doc: &D, leaf: LeafId) -> Result<SmolStr, CommandError>
where
    D: DocumentTree + ?Sized,
{
    match doc.node(leaf) {
        Some(InlineNode::Text { text, .. }) => Ok(text.clone()),
        Some(InlineNode::Math(_)) => Err(CommandError::InvalidSelection { start: 0, end: 0 }),
        None => Err(unknown(leaf)),
    }
}

fn math_at<D>(doc: &D, leaf: LeafId) -> Result<&MathSpan, CommandError>
where
    D: DocumentTree + ?Sized,
{
    match doc.node(leaf) {
        Some(InlineNode::Math(span)) => Ok(span),
        Some(_) => Err(CommandError::NotMath),
        None => Err(unknown(leaf)),
    }
}

fn unknown(leaf: LeafId) -> CommandError {
    CommandError::UnknownLeaf {
        block: leaf.block,
        index: leaf.index,
    }
}
