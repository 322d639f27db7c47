//! Facebook Reels section removal.
//!
//! Reels modules carry no stable marker, so they are found structurally.
//! Three strategies run in order on every invocation:
//!
//! 1. **Direct child**: feed children whose text mentions "Reels".
//! 2. **Labeled ancestor**: the feed unit holding an element whose whole text
//!    is "Reels", for units nested below the feed's direct children.
//! 3. **Sized card**: a large `dir="auto"` box under the main landmark whose
//!    text starts with "Reels", resolved to its enclosing card.
//!
//! A strategy that fails or finds no landmark is skipped; the others still run.
//! The third strategy is approximate and may pick the wrong card if the
//! layout nests sections differently.

use crate::config::FilterConfig;
use crate::dom::Dom;
use crate::error::DomError;
use crate::filter::patterns;
use crate::filter::sweeper::remove_element;
use serde::{Deserialize, Serialize};
use tracing::debug;

const REELS_LABEL: &str = "Reels";
const FEED_SELECTOR: &str = r#"[role="feed"]"#;
const MAIN_SELECTOR: &str = r#"[role="main"]"#;
const LABEL_SELECTOR: &str = "span, div, a, h1, h2, h3, h4";
const TEXT_BOX_SELECTOR: &str = r#"div[dir="auto"]"#;
const ARTICLE_SELECTOR: &str = r#"div[role="article"]"#;

/// Result of one strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrategyOutcome {
    Removed(usize),
    /// Landmark missing or nothing qualified.
    NotApplicable,
    Failed(DomError),
}

impl StrategyOutcome {
    pub fn removed(&self) -> usize {
        match self {
            StrategyOutcome::Removed(n) => *n,
            _ => 0,
        }
    }

    fn from_count(count: usize) -> Self {
        if count == 0 {
            StrategyOutcome::NotApplicable
        } else {
            StrategyOutcome::Removed(count)
        }
    }
}

/// Sections removed per strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReelsReport {
    pub direct_children: usize,
    pub labeled_ancestors: usize,
    pub sized_cards: usize,
}

impl ReelsReport {
    pub fn total(&self) -> usize {
        self.direct_children + self.labeled_ancestors + self.sized_cards
    }

    pub fn merge(&mut self, other: &ReelsReport) {
        self.direct_children += other.direct_children;
        self.labeled_ancestors += other.labeled_ancestors;
        self.sized_cards += other.sized_cards;
    }
}

/// Run all three strategies under `root`. Does nothing off Facebook.
pub fn remove_reels_sections<D: Dom>(
    dom: &mut D,
    root: D::Node,
    config: &FilterConfig,
) -> ReelsReport {
    if !patterns::is_facebook(dom.location()) {
        return ReelsReport::default();
    }

    let direct = remove_direct_children(dom, root);
    let labeled = remove_labeled_ancestor(dom, root);
    let sized = remove_sized_card(dom, root, config);

    for (strategy, outcome) in [
        ("direct_children", &direct),
        ("labeled_ancestor", &labeled),
        ("sized_card", &sized),
    ] {
        if let StrategyOutcome::Failed(e) = outcome {
            debug!(strategy, error = %e, "reels strategy skipped");
        }
    }

    ReelsReport {
        direct_children: direct.removed(),
        labeled_ancestors: labeled.removed(),
        sized_cards: sized.removed(),
    }
}

/// Remove every direct child of the feed whose text contains "Reels".
pub fn remove_direct_children<D: Dom>(dom: &mut D, root: D::Node) -> StrategyOutcome {
    let feed = match dom.query_first(root, FEED_SELECTOR) {
        Ok(Some(feed)) => feed,
        Ok(None) => return StrategyOutcome::NotApplicable,
        Err(e) => return StrategyOutcome::Failed(e),
    };

    let mut removed = 0;
    for child in dom.children(feed).into_iter().rev() {
        if dom.text_content(child).contains(REELS_LABEL) && remove_element(dom, child) {
            removed += 1;
        }
    }
    StrategyOutcome::from_count(removed)
}

/// Remove the feed unit enclosing the first element labelled exactly "Reels".
pub fn remove_labeled_ancestor<D: Dom>(dom: &mut D, root: D::Node) -> StrategyOutcome {
    let feed = match dom.query_first(root, FEED_SELECTOR) {
        Ok(Some(feed)) => feed,
        Ok(None) => return StrategyOutcome::NotApplicable,
        Err(e) => return StrategyOutcome::Failed(e),
    };
    let labels = match dom.query_all(root, LABEL_SELECTOR) {
        Ok(labels) => labels,
        Err(e) => return StrategyOutcome::Failed(e),
    };

    for label in labels {
        if dom.text_content(label).trim() != REELS_LABEL || !dom.contains(feed, label) {
            continue;
        }
        if let Some(unit) = feed_unit(dom, feed, label) {
            if remove_element(dom, unit) {
                return StrategyOutcome::Removed(1);
            }
        }
    }
    StrategyOutcome::NotApplicable
}

/// The ancestor-or-self of `node` whose parent is `feed`.
fn feed_unit<D: Dom>(dom: &D, feed: D::Node, node: D::Node) -> Option<D::Node> {
    let mut current = node;
    loop {
        let parent = dom.parent(current)?;
        if parent == feed {
            return Some(current);
        }
        current = parent;
    }
}

/// Remove the card around the first large text box that starts with "Reels".
pub fn remove_sized_card<D: Dom>(
    dom: &mut D,
    root: D::Node,
    config: &FilterConfig,
) -> StrategyOutcome {
    let main = match dom.query_first(root, MAIN_SELECTOR) {
        Ok(Some(main)) => main,
        Ok(None) => return StrategyOutcome::NotApplicable,
        Err(e) => return StrategyOutcome::Failed(e),
    };
    let boxes = match dom.query_all(main, TEXT_BOX_SELECTOR) {
        Ok(boxes) => boxes,
        Err(e) => return StrategyOutcome::Failed(e),
    };

    for text_box in boxes {
        let text = dom.text_content(text_box);
        if !text.contains(REELS_LABEL) {
            continue;
        }
        if dom
            .rendered_size(text_box)
            .is_under(config.min_card_width, config.min_card_height)
        {
            continue;
        }
        if text.split_whitespace().next() != Some(REELS_LABEL) {
            continue;
        }

        let card = match enclosing_card(dom, main, text_box, config) {
            Ok(card) => card,
            Err(e) => return StrategyOutcome::Failed(e),
        };
        if card != main && dom.parent(card).is_some() && remove_element(dom, card) {
            return StrategyOutcome::Removed(1);
        }
    }
    StrategyOutcome::NotApplicable
}

/// Closest article ancestor, else the first ancestor below `main` that
/// reaches the size thresholds, else the box itself.
fn enclosing_card<D: Dom>(
    dom: &D,
    main: D::Node,
    text_box: D::Node,
    config: &FilterConfig,
) -> Result<D::Node, DomError> {
    if let Some(article) = dom.closest(text_box, ARTICLE_SELECTOR)? {
        return Ok(article);
    }

    let mut ancestor = dom.parent(text_box);
    while let Some(node) = ancestor {
        if node == main
            || !dom
                .rendered_size(node)
                .is_under(config.min_card_width, config.min_card_height)
        {
            break;
        }
        ancestor = dom.parent(node);
    }

    Ok(match ancestor {
        Some(node) if node != main => node,
        _ => text_box,
    })
}
