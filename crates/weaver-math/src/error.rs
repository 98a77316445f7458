//! Error types for weaver-math.
//!
//! Scanning and serialization never fail: malformed delimiters stay literal
//! text and latex is opaque. Errors only come from configuration loading and
//! from structured commands that callers may want to no-op on.

use miette::Diagnostic;

/// Main error type for weaver-math operations
#[derive(thiserror::Error, Debug, Diagnostic)]
pub enum MathError {
    /// Config could not be (de)serialized
    #[error("invalid math configuration: {0}")]
    #[diagnostic(code(weaver_math::config))]
    Config(#[from] serde_json::Error),

    /// A structured command was rejected
    #[error(transparent)]
    #[diagnostic(transparent)]
    Command(#[from] CommandError),
}

/// Why a structured command did nothing.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq, Diagnostic)]
#[non_exhaustive]
pub enum CommandError {
    #[error("latex is empty")]
    #[diagnostic(code(weaver_math::command::empty_latex))]
    EmptyLatex,

    #[error("selection is empty")]
    #[diagnostic(code(weaver_math::command::empty_selection))]
    EmptySelection,

    #[error("math cannot be inserted inside code")]
    #[diagnostic(
        code(weaver_math::command::excluded_region),
        help("code blocks and inline code are never converted to math")
    )]
    ExcludedRegion,

    #[error("selection {start}..{end} is not valid for this node")]
    #[diagnostic(code(weaver_math::command::invalid_selection))]
    InvalidSelection { start: usize, end: usize },

    #[error("node is not a math node")]
    #[diagnostic(code(weaver_math::command::not_math))]
    NotMath,

    #[error("no node at block {block}, index {index}")]
    #[diagnostic(code(weaver_math::command::unknown_leaf))]
    UnknownLeaf { block: usize, index: usize },
}
