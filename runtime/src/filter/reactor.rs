//! React to nodes inserted after the initial sweep.
//!
//! Each non-empty mutation batch becomes one local task. The task yields once
//! before touching the tree so removal never happens inside mutation delivery.

use crate::config::FilterConfig;
use crate::dom::{Dom, MutationBatch};
use crate::filter::classifier::{classify_iframe, classify_site_container};
use crate::filter::patterns;
use crate::filter::reels;
use crate::filter::sweeper::{remove_element, sweep, SweepReport};
use std::cell::RefCell;
use std::rc::Rc;
use tokio::task::JoinSet;
use tokio_stream::{Stream, StreamExt};
use tracing::{debug, trace};

/// Added nodes of one observer delivery, in record order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingBatch<N> {
    nodes: Vec<N>,
}

impl<N> PendingBatch<N> {
    pub fn collect(batch: MutationBatch<N>) -> Self {
        Self {
            nodes: batch.into_iter().flat_map(|r| r.added_nodes).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn nodes(&self) -> &[N] {
        &self.nodes
    }
}

/// Remove or sweep each top-level added node.
///
/// A node that is itself video-bearing is removed without descending;
/// any other element has its subtree swept. Non-elements are skipped.
pub fn process_added_nodes<D: Dom>(
    dom: &mut D,
    nodes: &[D::Node],
    config: &FilterConfig,
) -> SweepReport {
    let mut report = SweepReport::default();

    for &node in nodes {
        if !dom.is_element(node) {
            continue;
        }

        if dom.tag_name(node).as_deref() == Some("video") {
            if remove_element(dom, node) {
                report.videos += 1;
            }
            continue;
        }
        if classify_iframe(dom, node).is_match() {
            if remove_element(dom, node) {
                report.iframes += 1;
            }
            continue;
        }
        if classify_site_container(dom, node).is_match() {
            if remove_element(dom, node) {
                report.containers += 1;
            }
            continue;
        }

        let swept = sweep(dom, node, config);
        report.merge(&swept);
    }

    report
}

/// Process one batch, then rerun the Reels heuristics over the whole body,
/// since unrelated insertions can restructure a Reels section.
pub fn process_batch<D: Dom>(
    dom: &mut D,
    batch: &PendingBatch<D::Node>,
    config: &FilterConfig,
) -> SweepReport {
    let mut report = process_added_nodes(dom, batch.nodes(), config);

    if patterns::is_facebook(dom.location()) {
        if let Some(body) = dom.body() {
            let reels = reels::remove_reels_sections(dom, body, config);
            report.reels.merge(&reels);
        }
    }

    report
}

/// Consumes mutation batches for one document.
pub struct ChangeReactor<D: Dom> {
    dom: Rc<RefCell<D>>,
    config: Rc<FilterConfig>,
}

impl<D> ChangeReactor<D>
where
    D: Dom + 'static,
    D::Node: 'static,
{
    pub fn new(dom: Rc<RefCell<D>>, config: Rc<FilterConfig>) -> Self {
        Self { dom, config }
    }

    /// Handle batches until the stream ends, then wait for the scheduled
    /// passes and return what they removed.
    ///
    /// Spawns with `spawn_local`, so it must be polled inside a `LocalSet`.
    pub async fn run<S>(self, mut batches: S) -> SweepReport
    where
        S: Stream<Item = MutationBatch<D::Node>> + Unpin,
    {
        let mut total = SweepReport::default();
        let mut passes = JoinSet::new();

        while let Some(batch) = batches.next().await {
            let pending = PendingBatch::collect(batch);
            if pending.is_empty() {
                trace!("mutation batch without added nodes");
                continue;
            }

            let dom = Rc::clone(&self.dom);
            let config = Rc::clone(&self.config);
            passes.spawn_local(async move {
                tokio::task::yield_now().await;
                let report = process_batch(&mut *dom.borrow_mut(), &pending, &config);
                if report.total() > 0 {
                    debug!(
                        added = pending.len(),
                        removed = report.total(),
                        "processed mutation batch"
                    );
                }
                report
            });

            while let Some(done) = passes.try_join_next() {
                if let Ok(report) = done {
                    total.merge(&report);
                }
            }
        }

        while let Some(done) = passes.join_next().await {
            if let Ok(report) = done {
                total.merge(&report);
            }
        }

        debug!(removed = total.total(), "mutation stream ended");
        total
    }
}
