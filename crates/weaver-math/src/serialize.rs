//! Canonical serialization.
//!
//! Math is always written as `$latex$` or `$$latex$$`. The latex is written
//! verbatim with no escaping; re-extracting it is the scanner's job. The one
//! exception is a space between `$$` and display latex that begins or ends
//! with `$`, which the scanner trims away again. Legacy
//! `\(..\)`, `\[..\]` and structured markup forms all normalize through here.

use crate::config::MathConfig;
use crate::resolver::scan_with;
use crate::types::{MathSpan, Segment};

/// Write a math span in canonical delimiter form.
pub fn serialize(span: &MathSpan) -> String {
    span.to_string()
}

/// Write a segment sequence back to text, math in canonical form.
pub fn serialize_segments(segments: &[Segment]) -> String {
    let mut out = String::new();
    for segment in segments {
        match segment {
            Segment::Text { text, .. } => out.push_str(text),
            Segment::Math { span, .. } => out.push_str(&serialize(span)),
        }
    }
    out
}

/// Rewrite every recognized math expression in `text` to canonical form.
///
/// Usable without any document, e.g. to normalize stored documents
/// server-side. Idempotent for inputs whose latex round-trips.
pub fn normalize_text(text: &str) -> String {
    normalize_text_with(text, &MathConfig::default())
}

pub fn normalize_text_with(text: &str, config: &MathConfig) -> String {
    serialize_segments(&scan_with(text, config))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::scan;

    #[test]
    fn test_serialize_inline() {
        assert_eq!(serialize(&MathSpan::inline("a^2+b^2")), "$a^2+b^2$");
    }

    #[test]
    fn test_serialize_display() {
        assert_eq!(serialize(&MathSpan::display(r"\frac{a}{b}")), r"$$\frac{a}{b}$$");
    }

    #[test]
    fn test_serialize_is_verbatim() {
        let span = MathSpan::display("a $ b\n\nc");
        assert_eq!(serialize(&span), "$$a $ b\n\nc$$");
    }

    #[test]
    fn test_serialize_pads_dollar_edges() {
        assert_eq!(serialize(&MathSpan::display("a $")), "$$a $ $$");
        assert_eq!(serialize(&MathSpan::display("$b")), "$$ $b$$");
        assert_eq!(serialize(&MathSpan::inline("c")), "$c$");
    }

    #[test]
    fn test_adjacent_math_normalizes_losslessly() {
        let once = normalize_text(r"\(a\)\(b\)");
        assert_eq!(once, "$a$$b$");
        assert_eq!(normalize_text(&once), once);
        let math: Vec<_> = scan(&once)
            .iter()
            .filter_map(|s| s.as_math().cloned())
            .collect();
        assert_eq!(math, vec![MathSpan::inline("a"), MathSpan::inline("b")]);

        let once = normalize_text(r"\(a\)\[b\]");
        assert_eq!(once, "$a$$$b$$");
        assert_eq!(normalize_text(&once), once);
    }

    #[test]
    fn test_serialize_rescans_to_same_span() {
        let span = MathSpan::inline("a^2+b^2");
        let text = serialize(&span);
        assert_eq!(serialize(&span), text);
        let segments = scan(&text);
        assert_eq!(segments.len(), 1);
        assert_eq!(segments[0].as_math(), Some(&span));
    }

    #[test]
    fn test_normalize_legacy_delimiters() {
        assert_eq!(
            normalize_text(r"see \( x \) and \[ y \] here"),
            "see $x$ and $$y$$ here"
        );
    }

    #[test]
    fn test_normalize_trims_inside_delimiters() {
        assert_eq!(normalize_text("$ x $ and $$\n y \n$$"), "$x$ and $$y$$");
    }

    #[test]
    fn test_normalize_leaves_plain_text() {
        let text = "costs $5, or `code`, or \\(unterminated";
        assert_eq!(normalize_text(text), text);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = normalize_text(r"\(a\) $$b$$ \[c\] $d$");
        assert_eq!(once, "$a$ $$b$$ $$c$$ $d$");
        assert_eq!(normalize_text(&once), once);
        let math = scan(&once).iter().filter(|s| s.is_math()).count();
        assert_eq!(math, 4);
    }
}
