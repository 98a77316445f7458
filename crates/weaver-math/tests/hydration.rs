use insta::assert_snapshot;
use weaver_math::{
    Block, CommandError, DocumentTree, HydrationOutcome, HydrationTrigger, Hydrator, InlineNode,
    LeafId, Mark, MathConfig, MathDocument, MathSpan, TextSelection, UndoManager,
    convert_selection, load_document, set_latex, unset_latex, update_math,
};

const STORED: &str = r#"# Notes on $E=mc^2$

Energy \( E \) relates to mass, see $$\sum_{i=1}^n m_i$$ for the total.

Use `$not math$` in code.

```tex
$also not math$
```

$$
\begin{align}
first \\

second
\end{align}
$$

Legacy: <span data-type="math" data-latex="x^2" data-display-mode="false"></span> done."#;

#[test]
fn load_hydrates_everything_but_code() {
    let (doc, hydrator) = load_document(STORED, &MathConfig::default());
    assert!(hydrator.is_loaded());

    let spans: Vec<_> = doc.math_spans().into_iter().map(|(_, s)| s.clone()).collect();
    assert_eq!(
        spans,
        vec![
            MathSpan::inline("E=mc^2"),
            MathSpan::inline("E"),
            MathSpan::display(r"\sum_{i=1}^n m_i"),
            MathSpan::display("\\begin{align}\nfirst \\\\\n\nsecond\n\\end{align}"),
            MathSpan::inline("x^2"),
        ]
    );

    let code_leaves: Vec<_> = doc
        .text_leaves(None)
        .into_iter()
        .filter(|l| l.in_excluded_region)
        .map(|l| l.text.to_string())
        .collect();
    assert_eq!(code_leaves, vec!["$not math$", "$also not math$"]);
}

#[test]
fn save_writes_canonical_form() {
    let (doc, _) = load_document(STORED, &MathConfig::default());
    assert_snapshot!(doc.to_text(), @r#"
    # Notes on $E=mc^2$

    Energy $E$ relates to mass, see $$\sum_{i=1}^n m_i$$ for the total.

    Use `$not math$` in code.

    ```tex
    $also not math$
    ```

    $$\begin{align}
    first \\

    second
    \end{align}$$

    Legacy: $x^2$ done.
    "#);
}

#[test]
fn save_load_save_is_stable() {
    let (first, _) = load_document(STORED, &MathConfig::default());
    let saved = first.to_text();
    let (second, _) = load_document(&saved, &MathConfig::default());
    assert_eq!(second.to_text(), saved);
    assert_eq!(second.math_spans(), first.math_spans());
}

fn reload(doc: &MathDocument) -> MathDocument {
    load_document(&doc.to_text(), &MathConfig::default()).0
}

fn math_of(doc: &MathDocument) -> Vec<MathSpan> {
    doc.math_spans().into_iter().map(|(_, s)| s.clone()).collect()
}

#[test]
fn adjacent_math_nodes_reload() {
    let shapes = [
        vec![MathSpan::inline("a"), MathSpan::inline("b")],
        vec![MathSpan::inline("a"), MathSpan::display("b")],
        vec![MathSpan::display("a"), MathSpan::inline("b")],
        vec![MathSpan::inline("a"), MathSpan::inline("b"), MathSpan::inline("c")],
    ];
    for shape in shapes {
        let inlines = shape.iter().cloned().map(InlineNode::Math).collect();
        let doc = MathDocument::from_blocks(vec![
            Block::paragraph(inlines),
            Block::paragraph(vec![InlineNode::text("after")]),
            Block::paragraph(vec![InlineNode::Math(MathSpan::display("z"))]),
        ]);
        let reloaded = reload(&doc);
        assert_eq!(reloaded.blocks().len(), 3, "blocks of {:?}", doc.to_text());
        assert_eq!(math_of(&reloaded), math_of(&doc), "spans of {:?}", doc.to_text());
        assert_eq!(reloaded.to_text(), doc.to_text());
    }
}

#[test]
fn display_latex_with_dollar_edges_reloads() {
    let doc = MathDocument::from_blocks(vec![Block::paragraph(vec![
        InlineNode::Math(MathSpan::display("a $")),
        InlineNode::text(" and "),
        InlineNode::Math(MathSpan::display("$b")),
    ])]);
    assert_eq!(doc.to_text(), "$$a $ $$ and $$ $b$$");
    assert_eq!(math_of(&reload(&doc)), math_of(&doc));
}

#[test]
fn heading_math_with_line_break_reloads() {
    let (mut doc, _) = load_document("# Title $x$\n\nbody", &MathConfig::default());
    update_math(&mut doc, LeafId::new(0, 1), "a \\\\\nb", Some(true)).unwrap();

    let reloaded = reload(&doc);
    assert_eq!(reloaded.blocks().len(), 2);
    assert_eq!(math_of(&reloaded), vec![MathSpan::display("a \\\\\nb")]);
    assert_eq!(reloaded.to_text(), doc.to_text());
}

#[test]
fn backticks_inside_latex_stay_math() {
    let stored = "quote $\\text{`a' or `b'}$ then `code`";
    let (doc, _) = load_document(stored, &MathConfig::default());
    assert_eq!(math_of(&doc), vec![MathSpan::inline("\\text{`a' or `b'}")]);
    assert_eq!(doc.to_text(), stored);
}

#[test]
fn insert_math_into_empty_paragraph() {
    let mut doc = MathDocument::from_blocks(vec![Block::paragraph(Vec::new())]);
    let cursor = TextSelection::cursor(LeafId::new(0, 0), 0);
    let id = set_latex(&mut doc, &cursor, "x^2", None).unwrap();
    assert_eq!(doc.node(id), Some(&InlineNode::Math(MathSpan::inline("x^2"))));
    assert_eq!(doc.to_text(), "$x^2$");

    assert!(doc.undo());
    assert!(doc.blocks()[0].inlines.is_empty());
}

#[test]
fn load_is_one_undo_step() {
    let (mut doc, _) = load_document("$a$ and $b$\n\n$$c$$", &MathConfig::default());
    assert_eq!(doc.math_spans().len(), 3);
    assert_eq!(doc.history_depth(), 1);

    assert!(doc.undo());
    assert!(doc.math_spans().is_empty());
    assert_eq!(doc.to_text(), "$a$ and $b$\n\n$$c$$");
}

#[test]
fn hydration_without_math_leaves_no_history() {
    let (doc, hydrator) = load_document("nothing to see\n\n`$x$`", &MathConfig::default());
    assert!(hydrator.is_loaded());
    assert!(!doc.can_undo());
    assert_eq!(doc.revision(), 0);
}

#[test]
fn paste_is_hydrated_typing_is_not() {
    let (mut doc, mut hydrator) = load_document("start", &MathConfig::default());

    let typed = doc.insert_text(LeafId::new(0, 0), 5, " $t$").unwrap();
    assert_eq!(hydrator.hydrate_after(&mut doc, &typed), HydrationOutcome::Skipped);

    let pasted = doc
        .paste_text(LeafId::new(0, 0), 0, "\u{200B}$p$\u{FFFC} ")
        .unwrap();
    let outcome = hydrator.hydrate_after(&mut doc, &pasted);
    assert_eq!(
        outcome,
        HydrationOutcome::Applied {
            trigger: HydrationTrigger::Paste,
            leaves: 1,
            math: 2
        }
    );
    // The whole touched leaf is rescanned, so the typed span comes along.
    assert_eq!(doc.to_text(), "$p$ start $t$");
}

#[test]
fn paste_scope_excludes_other_blocks() {
    let mut doc = MathDocument::from_text("$keep$");
    let mut hydrator = Hydrator::default();

    let mutation = doc.paste_blocks(1, "pasted $x$\n\n```\n$y$\n```");
    let outcome = hydrator.hydrate_after(&mut doc, &mutation);
    assert_eq!(outcome.math_count(), 1);
    assert_eq!(doc.blocks()[0].inlines, vec![InlineNode::text("$keep$")]);
    assert_eq!(
        doc.blocks()[1].inlines,
        vec![InlineNode::text("pasted "), InlineNode::Math(MathSpan::inline("x"))]
    );
    assert_eq!(doc.blocks()[2].inlines, vec![InlineNode::text("$y$")]);
}

#[test]
fn marks_survive_hydration() {
    let mut doc = MathDocument::from_blocks(vec![Block::paragraph(vec![
        InlineNode::marked("bold $b$ text", vec![Mark::Bold]),
    ])]);
    Hydrator::default().hydrate_on_load(&mut doc);
    assert_eq!(
        doc.blocks()[0].inlines,
        vec![
            InlineNode::marked("bold ", vec![Mark::Bold]),
            InlineNode::Math(MathSpan::inline("b")),
            InlineNode::marked(" text", vec![Mark::Bold]),
        ]
    );
}

#[test]
fn commands_round_trip_through_storage() {
    let (mut doc, _) = load_document("area is pi r^2 here", &MathConfig::default());
    let id = convert_selection(&mut doc, &TextSelection::new(LeafId::new(0, 0), 8..14)).unwrap();
    assert_eq!(doc.to_text(), "area is $pi r^2$ here");

    let latex = unset_latex(&mut doc, id).unwrap();
    assert_eq!(latex, "pi r^2");
    assert_eq!(doc.to_text(), "area is pi r^2 here");

    assert!(doc.undo());
    assert_eq!(doc.to_text(), "area is $pi r^2$ here");
}

#[test]
fn commands_refuse_code() {
    let (mut doc, _) = load_document("```\nfn x() {}\n```", &MathConfig::default());
    let err = set_latex(
        &mut doc,
        &TextSelection::cursor(LeafId::new(0, 0), 0),
        "x",
        None,
    )
    .unwrap_err();
    assert_eq!(err, CommandError::ExcludedRegion);
    assert!(!doc.can_undo());
}

#[test]
fn canonical_only_config_leaves_legacy_delimiters() {
    let config = MathConfig::from_json(r#"{"delimiters": ["blockDollar", "inlineDollar"]}"#)
        .unwrap();
    let (doc, _) = load_document(r"\(a\) and $b$", &config);
    assert_eq!(doc.math_spans().len(), 1);
    assert_eq!(doc.to_text(), r"\(a\) and $b$");
}
