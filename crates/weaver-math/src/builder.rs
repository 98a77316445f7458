//! Segment building: turns a document's text leaves into a replacement plan.
//!
//! The tree is only read here. Every leaf that resolves to at least one math
//! span gets a full replacement (text pieces keep the leaf's marks); all other
//! leaves are left alone. Applying the plan is the host's job.

use crate::config::MathConfig;
use crate::resolver::scan_run;
use crate::tree::{DocumentTree, InlineNode, LeafRange, LeafReplacement, Mark, ReplacementPlan};
use crate::types::Segment;

/// Build the replacement plan for `scope` (or the whole document).
///
/// Leaves are visited in document order, so math nodes keep the left to
/// right order of their source text.
pub fn build_plan<D>(doc: &D, scope: Option<LeafRange>, config: &MathConfig) -> ReplacementPlan
where
    D: DocumentTree + ?Sized,
{
    let mut plan = ReplacementPlan::new();
    for leaf in doc.text_leaves(scope) {
        if leaf.in_excluded_region {
            tracing::trace!(target: "weaver::math", leaf = ?leaf.id, "skipping verbatim leaf");
            continue;
        }

        let segments = scan_run(&leaf.run(), config);
        if !segments.iter().any(Segment::is_math) {
            continue;
        }

        plan.push(LeafReplacement {
            leaf: leaf.id,
            nodes: segments_to_nodes(segments, &leaf.marks),
        });
    }

    tracing::debug!(
        target: "weaver::math",
        leaves = plan.len(),
        math = plan.math_count(),
        "built replacement plan"
    );
    plan
}

/// Convert resolved segments into inline nodes.
///
/// Text pieces inherit `marks`; math nodes carry none.
pub fn segments_to_nodes(segments: Vec<Segment>, marks: &[Mark]) -> Vec<InlineNode> {
    segments
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Text { text, .. } if text.is_empty() => None,
            Segment::Text { text, .. } => Some(InlineNode::marked(text, marks.to_vec())),
            Segment::Math { span, .. } => Some(InlineNode::Math(span)),
        })
        .collect()
}
