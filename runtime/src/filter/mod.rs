//! Video suppression engine: classification, sweeping, Facebook Reels
//! heuristics and the mutation reactor, plus the per-page driver tying
//! them together.

pub mod classifier;
pub mod patterns;
pub mod reactor;
pub mod reels;
pub mod sweeper;

pub use classifier::{is_video_bearing, Verdict};
pub use reactor::ChangeReactor;
pub use reels::{remove_reels_sections, ReelsReport};
pub use sweeper::{remove_element, sweep, SweepReport};

use crate::config::FilterConfig;
use crate::dom::{Dom, ReadyState};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{debug, info};
use url::Url;

/// How a page run ended.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterOutcome {
    /// The page was a single-reel view and was sent to the home page.
    Redirected(Url),
    /// The document never produced a root element.
    NoDocument,
    /// The observer was disconnected. Carries everything removed by the
    /// initial sweep and the mutation passes.
    Detached(SweepReport),
}

/// Sweep the whole document once.
pub fn sweep_page<D: Dom>(dom: &mut D, config: &FilterConfig) -> SweepReport {
    match dom.document_element() {
        Some(root) => sweep(dom, root, config),
        None => SweepReport::default(),
    }
}

/// Runs the filter over one page load.
pub struct VideoFilter<D: Dom> {
    dom: Rc<RefCell<D>>,
    config: Rc<FilterConfig>,
}

impl<D> VideoFilter<D>
where
    D: Dom + 'static,
    D::Node: 'static,
{
    pub fn new(dom: Rc<RefCell<D>>, config: FilterConfig) -> Self {
        Self {
            dom,
            config: Rc::new(config),
        }
    }

    /// Redirect check, initial sweep once content has loaded, late-render
    /// Reels re-checks, then mutation handling until the observer goes away.
    ///
    /// Must run inside a `tokio::task::LocalSet`.
    pub async fn run(self) -> FilterOutcome {
        let redirect = patterns::reel_redirect_target(self.dom.borrow().location());
        if let Some(target) = redirect {
            info!(to = %target, "single reel view, redirecting");
            self.dom.borrow_mut().replace_location(target.clone());
            return FilterOutcome::Redirected(target);
        }

        let loaded = {
            let mut dom = self.dom.borrow_mut();
            (dom.ready_state() == ReadyState::Loading).then(|| dom.content_loaded())
        };
        if let Some(loaded) = loaded {
            if loaded.await.is_err() {
                debug!("document dropped before content loaded");
                return FilterOutcome::NoDocument;
            }
        }

        let (root, initial) = {
            let mut dom = self.dom.borrow_mut();
            let Some(root) = dom.body().or_else(|| dom.document_element()) else {
                return FilterOutcome::NoDocument;
            };
            let report = sweep_page(&mut *dom, &self.config);
            info!(url = %dom.location(), removed = report.total(), "initial sweep");
            (root, report)
        };

        self.schedule_late_render_checks(root);

        let stream = self.dom.borrow_mut().observe(root);
        let reactor = ChangeReactor::new(Rc::clone(&self.dom), Rc::clone(&self.config));
        let mut total = reactor.run(stream).await;
        total.merge(&initial);
        FilterOutcome::Detached(total)
    }

    /// Spawn the delayed Reels re-checks. Returns how many were scheduled;
    /// none off Facebook.
    fn schedule_late_render_checks(&self, root: D::Node) -> usize {
        if !patterns::is_facebook(self.dom.borrow().location()) {
            return 0;
        }
        for delay in self.config.late_render_delays.iter().copied() {
            let dom = Rc::clone(&self.dom);
            let config = Rc::clone(&self.config);
            tokio::task::spawn_local(async move {
                tokio::time::sleep(delay).await;
                let report = remove_reels_sections(&mut *dom.borrow_mut(), root, &config);
                debug!(
                    delay_ms = delay.as_millis() as u64,
                    removed = report.total(),
                    "late render check"
                );
            });
        }
        self.config.late_render_delays.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;
    use tokio::task::LocalSet;

    fn filter(location: &str) -> VideoFilter<HtmlDocument> {
        let doc = HtmlDocument::parse(
            "<html><body><div role=\"feed\"></div></body></html>",
            Url::parse(location).unwrap(),
        );
        VideoFilter::new(Rc::new(RefCell::new(doc)), FilterConfig::default())
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_checks_only_on_facebook() {
        LocalSet::new()
            .run_until(async {
                let fb = filter("https://www.facebook.com/");
                let body = fb.dom.borrow().body().unwrap();
                assert_eq!(fb.schedule_late_render_checks(body), 2);

                let other = filter("https://news.example.com/");
                let body = other.dom.borrow().body().unwrap();
                assert_eq!(other.schedule_late_render_checks(body), 0);
            })
            .await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_delay_list_schedules_nothing() {
        LocalSet::new()
            .run_until(async {
                let doc = HtmlDocument::parse(
                    "<html><body></body></html>",
                    Url::parse("https://www.facebook.com/").unwrap(),
                );
                let config = FilterConfig {
                    late_render_delays: Vec::new(),
                    ..FilterConfig::default()
                };
                let fb = VideoFilter::new(Rc::new(RefCell::new(doc)), config);
                let body = fb.dom.borrow().body().unwrap();
                assert_eq!(fb.schedule_late_render_checks(body), 0);
            })
            .await;
    }
}
