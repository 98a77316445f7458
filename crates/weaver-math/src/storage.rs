//! Canonical text storage: loading blocks from stored text and writing them back.
//!
//! The format is the minimal markdown subset the math core needs to know about:
//! paragraphs separated by blank lines, ATX headings, fenced code blocks and
//! backtick inline code. Math stays as delimiter text on load and is hydrated
//! afterwards; on save every math node goes through [`crate::serialize`].
//!
//! A paragraph or heading with an unclosed `$$` keeps absorbing lines, blank
//! ones included, as long as a closing `$$` follows, so display math with
//! line breaks stays in one block.

use std::ops::Range;

use smol_str::SmolStr;

use crate::config::MathConfig;
use crate::document::{Block, BlockKind};
use crate::legacy::find_legacy_math;
use crate::resolver::scan_with;
use crate::scanner::has_unclosed_display;
use crate::serialize::serialize;
use crate::tree::{InlineNode, Mark};
use crate::types::Segment;

const FENCE: &str = "```";

/// Split stored text into blocks.
pub fn parse_blocks(text: &str) -> Vec<Block> {
    parse_blocks_with(text, &MathConfig::default())
}

/// Split stored text into blocks, recognizing math per `config`.
pub fn parse_blocks_with(text: &str, config: &MathConfig) -> Vec<Block> {
    let lines: Vec<&str> = text
        .split('\n')
        .map(|l| l.strip_suffix('\r').unwrap_or(l))
        .collect();
    let mut blocks = Vec::new();
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];
        if line.trim().is_empty() {
            i += 1;
            continue;
        }

        let trimmed = line.trim_start();
        if let Some(info) = trimmed.strip_prefix(FENCE) {
            let mut body = Vec::new();
            i += 1;
            while i < lines.len() && !lines[i].trim_start().starts_with(FENCE) {
                body.push(lines[i]);
                i += 1;
            }
            // Skip the closing fence; an unclosed fence runs to the end.
            i += 1;
            blocks.push(Block::code(info.trim(), body.join("\n")));
            continue;
        }

        if let Some((level, first)) = heading(trimmed) {
            let mut content = vec![first];
            i += 1;
            while i < lines.len() && display_continues(&content, &lines[i..]) {
                content.push(lines[i]);
                i += 1;
            }
            let inlines = parse_inlines_with(&content.join("\n"), config);
            blocks.push(Block::heading(level, inlines));
            continue;
        }

        let mut para: Vec<&str> = Vec::new();
        while i < lines.len() {
            let line = lines[i];
            let breaks = line.trim().is_empty() || (!para.is_empty() && starts_block(line));
            if breaks && !display_continues(&para, &lines[i..]) {
                break;
            }
            para.push(line);
            i += 1;
        }
        blocks.push(Block::paragraph(parse_inlines_with(&para.join("\n"), config)));
    }

    blocks
}

/// `block` holds a `$$` still waiting for a closer somewhere in `rest`.
fn display_continues(block: &[&str], rest: &[&str]) -> bool {
    rest.iter().any(|l| l.contains("$$")) && has_unclosed_display(&block.join("\n"))
}

/// Split paragraph text into inline nodes.
///
/// Backtick spans become `Code`-marked text, legacy math markup becomes math
/// nodes, everything else stays plain text for hydration to pick up.
pub fn parse_inlines(text: &str) -> Vec<InlineNode> {
    parse_inlines_with(text, &MathConfig::default())
}

pub fn parse_inlines_with(text: &str, config: &MathConfig) -> Vec<InlineNode> {
    let mut nodes = Vec::new();
    let mut cursor = 0;
    for legacy in find_legacy_math(text) {
        split_code(&text[cursor..legacy.range.start], config, &mut nodes);
        if !legacy.span.is_empty() {
            nodes.push(InlineNode::Math(legacy.span));
        }
        cursor = legacy.range.end;
    }
    split_code(&text[cursor..], config, &mut nodes);
    nodes
}

/// Cut backtick code spans out of `rest`.
///
/// Whichever starts first wins between a code span and a math expression, so
/// backticks inside latex stay part of the math.
fn split_code(mut rest: &str, config: &MathConfig, nodes: &mut Vec<InlineNode>) {
    while let Some((open, close)) = code_span(rest) {
        if let Some(math) = first_math(rest, config).filter(|m| m.start < open) {
            push_plain(nodes, &rest[..math.end]);
            rest = &rest[math.end..];
            continue;
        }
        push_plain(nodes, &rest[..open]);
        let code = &rest[open + 1..close];
        if code.is_empty() {
            push_plain(nodes, "``");
        } else {
            nodes.push(InlineNode::marked(code, vec![Mark::Code]));
        }
        rest = &rest[close + 1..];
    }
    push_plain(nodes, rest);
}

/// Byte offsets of the first backtick pair.
fn code_span(text: &str) -> Option<(usize, usize)> {
    let open = text.find('`')?;
    let close = open + 1 + text[open + 1..].find('`')?;
    Some((open, close))
}

fn first_math(text: &str, config: &MathConfig) -> Option<Range<usize>> {
    scan_with(text, config)
        .into_iter()
        .find(Segment::is_math)
        .map(|s| s.range())
}

/// Append unmarked text, merging with a preceding unmarked text node.
fn push_plain(nodes: &mut Vec<InlineNode>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(InlineNode::Text { text: prev, marks }) = nodes.last_mut() {
        if marks.is_empty() {
            *prev = SmolStr::from(format!("{prev}{text}"));
            return;
        }
    }
    nodes.push(InlineNode::text(text));
}

fn heading(line: &str) -> Option<(u8, &str)> {
    let level = line.bytes().take_while(|b| *b == b'#').count();
    if !(1..=6).contains(&level) {
        return None;
    }
    let rest = &line[level..];
    if rest.is_empty() {
        return Some((level as u8, ""));
    }
    rest.strip_prefix(' ').map(|r| (level as u8, r.trim_end()))
}

fn starts_block(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with(FENCE) || heading(trimmed).is_some()
}

/// Write blocks back to canonical text.
pub fn write_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(write_block)
        .collect::<Vec<_>>()
        .join("\n\n")
}

fn write_block(block: &Block) -> String {
    match &block.kind {
        BlockKind::Paragraph => write_inlines(&block.inlines),
        BlockKind::Heading { level } => {
            format!("{} {}", "#".repeat(*level as usize), write_inlines(&block.inlines))
        }
        BlockKind::CodeBlock { language } => {
            let body: String = block.inlines.iter().filter_map(InlineNode::as_text).collect();
            let lang = language.as_deref().unwrap_or("");
            if body.is_empty() {
                format!("{FENCE}{lang}\n{FENCE}")
            } else {
                format!("{FENCE}{lang}\n{body}\n{FENCE}")
            }
        }
    }
}

/// Write inline nodes, math in canonical form.
pub fn write_inlines(nodes: &[InlineNode]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            InlineNode::Text { text, marks } if marks.contains(&Mark::Code) => {
                out.push('`');
                out.push_str(text);
                out.push('`');
            }
            InlineNode::Text { text, .. } => out.push_str(text),
            InlineNode::Math(span) => out.push_str(&serialize(span)),
        }
    }
    out
}
