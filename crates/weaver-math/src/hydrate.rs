//! Hydration controller: decides when to turn delimiter text into math nodes.
//!
//! Two triggers exist. On load, the whole document is hydrated exactly once.
//! After a mutation, only paste mutations are hydrated, limited to the pasted
//! range; ordinary typing is left to the input rules.
//!
//! A pass borrows the document mutably for its whole duration, so a trigger
//! can never fire while another pass is still applying its plan.

use crate::builder::build_plan;
use crate::config::MathConfig;
use crate::document::MathDocument;
use crate::tree::{DocumentTree, LeafRange, Mutation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationTrigger {
    Load,
    Paste,
}

/// Result of a hydration request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HydrationOutcome {
    /// The trigger did not apply: not a paste, or load already ran.
    Skipped,
    /// A pass ran and found nothing to convert. The document is untouched.
    Unchanged,
    /// A pass replaced `leaves` text leaves, inserting `math` math nodes.
    Applied {
        trigger: HydrationTrigger,
        leaves: usize,
        math: usize,
    },
}

impl HydrationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, HydrationOutcome::Applied { .. })
    }

    /// Math nodes inserted by the pass.
    pub fn math_count(&self) -> usize {
        match self {
            HydrationOutcome::Applied { math, .. } => *math,
            _ => 0,
        }
    }
}

/// Per-document hydration state.
#[derive(Debug, Clone, Default)]
pub struct Hydrator {
    config: MathConfig,
    loaded: bool,
}

impl Hydrator {
    pub fn new(config: MathConfig) -> Self {
        Self {
            config,
            loaded: false,
        }
    }

    pub fn config(&self) -> &MathConfig {
        &self.config
    }

    /// Whether the load pass already ran.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Hydrate the whole document after it was loaded.
    ///
    /// Only the first call runs a pass.
    pub fn hydrate_on_load<D>(&mut self, doc: &mut D) -> HydrationOutcome
    where
        D: DocumentTree + ?Sized,
    {
        if self.loaded {
            tracing::trace!(target: "weaver::math", "load hydration already ran");
            return HydrationOutcome::Skipped;
        }
        self.loaded = true;
        self.run(doc, HydrationTrigger::Load, None)
    }

    /// Hydrate after a host mutation, if it was a paste.
    pub fn hydrate_after<D>(&mut self, doc: &mut D, mutation: &Mutation) -> HydrationOutcome
    where
        D: DocumentTree + ?Sized,
    {
        if !mutation.paste {
            return HydrationOutcome::Skipped;
        }
        if mutation.scope.is_some_and(|s| s.is_empty()) {
            return HydrationOutcome::Unchanged;
        }
        self.run(doc, HydrationTrigger::Paste, mutation.scope)
    }

    fn run<D>(
        &self,
        doc: &mut D,
        trigger: HydrationTrigger,
        scope: Option<LeafRange>,
    ) -> HydrationOutcome
    where
        D: DocumentTree + ?Sized,
    {
        let plan = build_plan(&*doc, scope, &self.config);
        if plan.is_empty() {
            tracing::trace!(target: "weaver::math", ?trigger, "nothing to hydrate");
            return HydrationOutcome::Unchanged;
        }

        let leaves = plan.len();
        let math = plan.math_count();
        doc.apply_replacements(plan);
        tracing::debug!(target: "weaver::math", ?trigger, leaves, math, "hydrated math");
        HydrationOutcome::Applied {
            trigger,
            leaves,
            math,
        }
    }
}

/// Load stored text and hydrate it in one go.
///
/// The load pass is kept as the document's first undo step.
pub fn load_document(text: &str, config: &MathConfig) -> (MathDocument, Hydrator) {
    let mut doc = MathDocument::from_text_with(text, config);
    let mut hydrator = Hydrator::new(config.clone());
    hydrator.hydrate_on_load(&mut doc);
    (doc, hydrator)
}
