//! Decide whether an element presents playable video.

use crate::dom::Dom;
use crate::error::DomError;
use crate::filter::patterns::{self, FACEBOOK_VIDEO_SELECTORS};
use tracing::debug;

/// Outcome of one classification check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    Matched,
    NotApplicable,
    /// The check could not be completed. Treated as no match.
    Failed(DomError),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Matched)
    }
}

/// Classify `node` with every rule that applies on the current page.
pub fn classify<D: Dom>(dom: &D, node: D::Node) -> Verdict {
    match dom.tag_name(node).as_deref() {
        None => Verdict::NotApplicable,
        Some("video") => Verdict::Matched,
        Some("iframe") => match classify_iframe(dom, node) {
            Verdict::Matched => Verdict::Matched,
            _ => classify_site_container(dom, node),
        },
        Some(_) => classify_site_container(dom, node),
    }
}

pub fn is_video_bearing<D: Dom>(dom: &D, node: D::Node) -> bool {
    classify(dom, node).is_match()
}

/// The iframe's absolute source, or `None` when it has no usable one.
///
/// `src` wins over `data-src` unless empty; `about:` sources are
/// placeholders. When the source cannot be resolved against the base URL the
/// raw value is returned.
pub fn iframe_source<D: Dom>(dom: &D, node: D::Node) -> Option<String> {
    let src = dom
        .attr(node, "src")
        .filter(|s| !s.is_empty())
        .or_else(|| dom.attr(node, "data-src"))
        .filter(|s| !s.is_empty())?;
    if src.starts_with("about:") {
        return None;
    }

    match dom.base_url().join(&src) {
        Ok(resolved) => Some(resolved.to_string()),
        Err(e) => {
            debug!(src = %src, error = %e, "iframe source did not resolve, matching raw value");
            Some(src)
        }
    }
}

/// Whether `node` is an iframe embedding a known video host.
pub fn classify_iframe<D: Dom>(dom: &D, node: D::Node) -> Verdict {
    if dom.tag_name(node).as_deref() != Some("iframe") {
        return Verdict::NotApplicable;
    }
    match iframe_source(dom, node) {
        Some(url) if patterns::is_video_url(&url) => Verdict::Matched,
        _ => Verdict::NotApplicable,
    }
}

/// Whether `node` matches a Facebook video container selector. Off Facebook
/// this never applies.
///
/// A selector that fails is skipped; the verdict is `Failed` only when no
/// selector matched and at least one failed.
pub fn classify_site_container<D: Dom>(dom: &D, node: D::Node) -> Verdict {
    if !patterns::is_facebook(dom.location()) {
        return Verdict::NotApplicable;
    }
    match_any_selector(dom, node, FACEBOOK_VIDEO_SELECTORS)
}

fn match_any_selector<D: Dom>(dom: &D, node: D::Node, selectors: &[&str]) -> Verdict {
    if !dom.is_element(node) {
        return Verdict::NotApplicable;
    }

    let mut failure = None;
    for selector in selectors {
        match dom.matches(node, selector) {
            Ok(true) => return Verdict::Matched,
            Ok(false) => {}
            Err(e) => {
                debug!(selector, error = %e, "container selector failed");
                failure.get_or_insert(e);
            }
        }
    }

    match failure {
        Some(e) => Verdict::Failed(e),
        None => Verdict::NotApplicable,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::HtmlDocument;
    use url::Url;

    fn doc_at(location: &str, body: &str) -> HtmlDocument {
        HtmlDocument::parse(
            &format!("<html><head></head><body>{body}</body></html>"),
            Url::parse(location).unwrap(),
        )
    }

    fn first(d: &HtmlDocument, selector: &str) -> ego_tree::NodeId {
        d.query_first(d.body().unwrap(), selector).unwrap().unwrap()
    }

    #[test]
    fn test_video_is_always_video_bearing() {
        let d = doc_at("https://example.com/", "<video src=\"a.mp4\"></video>");
        assert_eq!(classify(&d, first(&d, "video")), Verdict::Matched);
    }

    #[test]
    fn test_iframe_hosts() {
        let d = doc_at(
            "https://example.com/",
            r#"<iframe id="yt" src="https://www.youtube.com/embed/xyz"></iframe>
               <iframe id="page" src="https://example.com/page"></iframe>"#,
        );
        assert!(is_video_bearing(&d, first(&d, "#yt")));
        assert!(!is_video_bearing(&d, first(&d, "#page")));
    }

    #[test]
    fn test_iframe_source_resolution() {
        let d = doc_at(
            "https://www.youtube.com/watch?v=1",
            r#"<iframe id="rel" src="/embed/abc"></iframe>
               <iframe id="lazy" src="" data-src="//player.vimeo.com/video/9"></iframe>
               <iframe id="blank" src="about:blank"></iframe>
               <iframe id="none"></iframe>"#,
        );
        assert_eq!(
            iframe_source(&d, first(&d, "#rel")).as_deref(),
            Some("https://www.youtube.com/embed/abc")
        );
        assert_eq!(
            iframe_source(&d, first(&d, "#lazy")).as_deref(),
            Some("https://player.vimeo.com/video/9")
        );
        assert_eq!(iframe_source(&d, first(&d, "#blank")), None);
        assert_eq!(iframe_source(&d, first(&d, "#none")), None);
        assert_eq!(classify_iframe(&d, first(&d, "#none")), Verdict::NotApplicable);
    }

    #[test]
    fn test_unresolvable_source_matches_raw_value() {
        let mut d = doc_at("https://example.com/", "");
        let body = d.body().unwrap();
        let added = d
            .append_html(body, r#"<iframe src="https://www.youtube.com:99999/embed/x"></iframe>"#)
            .unwrap();
        assert_eq!(
            iframe_source(&d, added[0]).as_deref(),
            Some("https://www.youtube.com:99999/embed/x")
        );
        assert!(is_video_bearing(&d, added[0]));
    }

    #[test]
    fn test_site_container_only_on_facebook() {
        let body = r#"<div data-video-id="42"></div><div data-pagelet="FeedVideo_1"></div>"#;

        let fb = doc_at("https://www.facebook.com/", body);
        assert!(is_video_bearing(&fb, first(&fb, "[data-video-id]")));
        assert!(is_video_bearing(&fb, first(&fb, "[data-pagelet]")));

        let other = doc_at("https://example.com/", body);
        assert_eq!(
            classify(&other, first(&other, "[data-video-id]")),
            Verdict::NotApplicable
        );
    }

    #[test]
    fn test_broken_selector_is_failed_not_no_match() {
        let d = doc_at("https://www.facebook.com/", r#"<div data-x="1"></div>"#);
        let div = first(&d, "div");
        assert!(matches!(
            match_any_selector(&d, div, &["div[", "[data-y]"]),
            Verdict::Failed(DomError::InvalidSelector { .. })
        ));
        assert_eq!(match_any_selector(&d, div, &["div[", "[data-x]"]), Verdict::Matched);
        assert_eq!(match_any_selector(&d, div, &["[data-y]"]), Verdict::NotApplicable);
    }

    #[test]
    fn test_text_nodes_are_not_applicable() {
        let mut d = doc_at("https://www.facebook.com/", "");
        let body = d.body().unwrap();
        let added = d.append_html(body, "just text").unwrap();
        assert_eq!(added.len(), 1);
        assert_eq!(classify(&d, added[0]), Verdict::NotApplicable);
        assert_eq!(classify(&d, d.document_element().unwrap()), Verdict::NotApplicable);
    }
}
