//! weaver-math: LaTeX math delimiters in rich-text documents.
//!
//! This crate provides:
//! - `scanner` / `resolver` - find `$..$`, `$$..$$`, `\(..\)`, `\[..\]` spans
//!   in plain text and resolve overlaps by delimiter priority
//! - `serialize` - canonical `$` / `$$` output, idempotent under rescanning
//! - `DocumentTree` trait for host documents, with `MathDocument` as the
//!   in-memory implementation
//! - `Hydrator` - converts delimiter text to math nodes on load and paste
//! - `commands` - set/unset/update latex and typed-delimiter input rules
//! - `legacy` - reader for the old `<span data-type="math">` markup

pub mod builder;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod history;
pub mod hydrate;
pub mod legacy;
pub mod resolver;
pub mod scanner;
pub mod serialize;
pub mod storage;
pub mod tree;
pub mod types;

pub use builder::{build_plan, segments_to_nodes};
pub use commands::{
    InputRuleMatch, TextSelection, apply_input_rule, convert_selection, match_input_rule,
    set_latex, unset_latex, update_math,
};
pub use config::MathConfig;
pub use document::{Block, BlockKind, MathDocument};
pub use error::{CommandError, MathError};
pub use history::{History, UndoManager};
pub use hydrate::{HydrationOutcome, HydrationTrigger, Hydrator, load_document};
pub use legacy::{find_legacy_math, normalize_legacy_markup};
pub use resolver::{scan, scan_with};
pub use serialize::{normalize_text, serialize, serialize_segments};
pub use smol_str::SmolStr;
pub use tree::{
    DocumentTree, InlineNode, LeafId, LeafRange, LeafReplacement, Mark, Mutation,
    ReplacementPlan, TextLeaf,
};
pub use types::{Candidate, DelimiterKind, MathSpan, Segment, TextRun};
