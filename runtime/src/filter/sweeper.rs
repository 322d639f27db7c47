//! Remove every video-bearing element under a subtree.

use crate::config::FilterConfig;
use crate::dom::Dom;
use crate::filter::classifier::classify_iframe;
use crate::filter::patterns::{self, FACEBOOK_VIDEO_SELECTORS};
use crate::filter::reels::{self, ReelsReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Elements removed by one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReport {
    pub videos: usize,
    pub iframes: usize,
    /// Facebook video containers matched by selector.
    pub containers: usize,
    pub reels: ReelsReport,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.videos + self.iframes + self.containers + self.reels.total()
    }

    pub fn merge(&mut self, other: &SweepReport) {
        self.videos += other.videos;
        self.iframes += other.iframes;
        self.containers += other.containers;
        self.reels.merge(&other.reels);
    }
}

/// Detach `node` from its parent. A node without a parent is left alone.
pub fn remove_element<D: Dom>(dom: &mut D, node: D::Node) -> bool {
    let removed = dom.remove(node);
    if removed {
        trace!(node = ?node, tag = ?dom.tag_name(node), "removed element");
    }
    removed
}

/// Remove videos, video iframes and (on Facebook) video containers and Reels
/// sections under `root`. Running it again on the pruned tree removes nothing.
pub fn sweep<D: Dom>(dom: &mut D, root: D::Node, config: &FilterConfig) -> SweepReport {
    let mut report = SweepReport::default();

    for video in query_or_skip(dom, root, "video") {
        if remove_element(dom, video) {
            report.videos += 1;
        }
    }

    let view: &D = dom;
    let frames: Vec<D::Node> = query_or_skip(view, root, "iframe")
        .into_iter()
        .filter(|frame| classify_iframe(view, *frame).is_match())
        .collect();
    for frame in frames {
        if remove_element(dom, frame) {
            report.iframes += 1;
        }
    }

    if patterns::is_facebook(dom.location()) {
        for selector in FACEBOOK_VIDEO_SELECTORS {
            for node in query_or_skip(dom, root, selector) {
                if remove_element(dom, node) {
                    report.containers += 1;
                }
            }
        }
        report.reels = reels::remove_reels_sections(dom, root, config);
    }

    report
}

fn query_or_skip<D: Dom>(dom: &D, root: D::Node, selector: &str) -> Vec<D::Node> {
    match dom.query_all(root, selector) {
        Ok(nodes) => nodes,
        Err(e) => {
            debug!(selector, error = %e, "skipping selector");
            Vec::new()
        }
    }
}
