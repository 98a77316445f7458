//! Reader for the deprecated structured math markup.
//!
//! Older documents stored equations as
//! `<span data-type="math" data-latex="..." data-display-mode="true"></span>`,
//! sometimes wrapped in `<eq>` (inline) or `<eqn>` (block). Some writers used
//! bare `latex` / `displayMode` attributes instead. These are read into
//! [`MathSpan`]s here and are only ever written back in canonical form.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::serialize::serialize;
use crate::types::MathSpan;

/// An opening `<span ...>` tag.
static SPAN_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<span\b([^>]*)>").expect("span open pattern"));

/// Any span tag, opening or closing.
static SPAN_TAG_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<span\b[^>]*>|</span\s*>").expect("span tag pattern"));

const WRAPPERS: [(&str, &str); 2] = [("<eq>", "</eq>"), ("<eqn>", "</eqn>")];

/// `name="value"` attribute pairs.
static ATTR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"([A-Za-z][A-Za-z0-9_-]*)\s*=\s*"([^"]*)""#).expect("attribute pattern")
});

/// A legacy math element found in markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMath {
    /// Byte range of the element, wrapper included.
    pub range: Range<usize>,
    pub span: MathSpan,
}

/// Read a math span from the attribute text of a `<span ...>` tag.
///
/// Returns `None` when the element is not `data-type="math"`.
pub fn span_from_attributes(attrs: &str) -> Option<MathSpan> {
    let mut is_math = false;
    let mut data_latex = None;
    let mut bare_latex = None;
    let mut display_mode = false;

    for caps in ATTR_RE.captures_iter(attrs) {
        let value = &caps[2];
        match &caps[1] {
            "data-type" => is_math = value == "math",
            "data-latex" => data_latex = Some(decode_entities(value)),
            "latex" => bare_latex = Some(decode_entities(value)),
            "data-display-mode" | "displayMode" => display_mode |= value == "true",
            _ => {}
        }
    }

    if !is_math {
        return None;
    }
    let latex = data_latex
        .filter(|l| !l.is_empty())
        .or(bare_latex)
        .unwrap_or_default();
    Some(MathSpan::new(latex, display_mode))
}

/// Find every legacy math element in `markup`, in document order.
///
/// Math spans nested inside other markup spans are found too.
pub fn find_legacy_math(markup: &str) -> Vec<LegacyMath> {
    if !markup.contains("<span") {
        return Vec::new();
    }

    let mut found = Vec::new();
    let mut pos = 0;
    while let Some(caps) = SPAN_OPEN_RE.captures_at(markup, pos) {
        let (Some(tag), Some(attrs)) = (caps.get(0), caps.get(1)) else {
            break;
        };
        pos = tag.end();
        let Some(span) = span_from_attributes(attrs.as_str()) else {
            continue;
        };
        let Some(end) = closing_tag_end(markup, tag.end()) else {
            continue;
        };
        found.push(LegacyMath {
            range: with_wrapper(markup, tag.start()..end),
            span,
        });
        pos = end;
    }
    found
}

/// End of the `</span>` closing a span whose opening tag ends at `from`.
fn closing_tag_end(markup: &str, from: usize) -> Option<usize> {
    let mut depth = 1usize;
    for tag in SPAN_TAG_RE.find_iter(&markup[from..]) {
        if tag.as_str().starts_with("</") {
            depth -= 1;
            if depth == 0 {
                return Some(from + tag.end());
            }
        } else {
            depth += 1;
        }
    }
    None
}

/// Widen `range` over a surrounding `<eq>` or `<eqn>` pair.
fn with_wrapper(markup: &str, range: Range<usize>) -> Range<usize> {
    let before = markup[..range.start].trim_end();
    let after = &markup[range.end..];
    let after_trimmed = after.trim_start();
    WRAPPERS
        .iter()
        .find(|(open, close)| before.ends_with(open) && after_trimmed.starts_with(close))
        .map_or(range, |(open, close)| {
            before.len() - open.len()..markup.len() - after_trimmed.len() + close.len()
        })
}

/// Rewrite legacy math elements to canonical delimiter text.
///
/// Elements with empty latex are dropped. Everything else is copied through.
pub fn normalize_legacy_markup(markup: &str) -> String {
    let found = find_legacy_math(markup);
    if found.is_empty() {
        return markup.to_string();
    }

    let mut out = String::with_capacity(markup.len());
    let mut cursor = 0;
    for legacy in found {
        out.push_str(&markup[cursor..legacy.range.start]);
        if !legacy.span.is_empty() {
            out.push_str(&serialize(&legacy.span));
        }
        cursor = legacy.range.end;
    }
    out.push_str(&markup[cursor..]);
    out
}

/// Decode the entities legacy writers produced when escaping attributes.
fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_attributes() {
        let span = span_from_attributes(
            r#" data-type="math" data-latex="E=mc^2" data-display-mode="true""#,
        );
        assert_eq!(span, Some(MathSpan::display("E=mc^2")));
    }

    #[test]
    fn test_bare_attribute_fallback() {
        let span = span_from_attributes(r#"latex="x" displayMode="true" data-type="math""#);
        assert_eq!(span, Some(MathSpan::display("x")));
    }

    #[test]
    fn test_non_math_span_ignored() {
        assert_eq!(span_from_attributes(r#"class="highlight""#), None);
        assert!(find_legacy_math(r#"<span class="x">$a$</span>"#).is_empty());
    }

    #[test]
    fn test_entities_decoded() {
        let span = span_from_attributes(
            r#"data-type="math" data-latex="a &lt; b &amp;&amp; c &gt; &quot;d&quot;""#,
        );
        assert_eq!(span, Some(MathSpan::inline(r#"a < b && c > "d""#)));
    }

    #[test]
    fn test_amp_decoded_last() {
        let span = span_from_attributes(r#"data-type="math" data-latex="&amp;lt;""#);
        assert_eq!(span, Some(MathSpan::inline("&lt;")));
    }

    #[test]
    fn test_wrapped_elements() {
        let markup = concat!(
            r#"<p>a <eq><span data-type="math" data-latex="x" data-display-mode="false"></span></eq> b</p>"#,
            r#"<eqn><span data-type="math" data-latex="y" data-display-mode="true"></span></eqn>"#
        );
        let found = find_legacy_math(markup);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].span, MathSpan::inline("x"));
        assert!(markup[found[0].range.clone()].starts_with("<eq>"));
        assert_eq!(found[1].span, MathSpan::display("y"));
        assert!(markup[found[1].range.clone()].ends_with("</eqn>"));
    }

    #[test]
    fn test_math_nested_in_styling_span() {
        let markup = r#"<span class="hl">see <span data-type="math" data-latex="x"></span></span>"#;
        let found = find_legacy_math(markup);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].span, MathSpan::inline("x"));
        assert_eq!(
            normalize_legacy_markup(markup),
            r#"<span class="hl">see $x$</span>"#
        );
    }

    #[test]
    fn test_inner_markup_does_not_end_element() {
        let markup = r#"<span data-type="math" data-latex="y"><span>y</span></span> after"#;
        assert_eq!(normalize_legacy_markup(markup), "$y$ after");
    }

    #[test]
    fn test_normalize_legacy_markup() {
        let markup = r#"Energy: <span data-type="math" data-latex="E=mc^2"></span> and <span data-type="math" data-latex="\sum x" data-display-mode="true"></span>"#;
        assert_eq!(
            normalize_legacy_markup(markup),
            r"Energy: $E=mc^2$ and $$\sum x$$"
        );
    }

    #[test]
    fn test_normalize_drops_empty_latex() {
        let markup = r#"a<span data-type="math" data-latex=""></span>b"#;
        assert_eq!(normalize_legacy_markup(markup), "ab");
    }

    #[test]
    fn test_normalize_without_markup_is_identity() {
        let text = "plain $x$ text";
        assert_eq!(normalize_legacy_markup(text), text);
    }
}
