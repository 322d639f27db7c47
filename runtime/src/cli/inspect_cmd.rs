//! `reel-sweeper inspect <url>`: show how the filter treats a page URL and,
//! optionally, an iframe source embedded on it.

use crate::cli::output::{self, Styled};
use crate::dom::{Dom, HtmlDocument};
use crate::filter::classifier::{classify_iframe, iframe_source};
use crate::filter::patterns;
use anyhow::{Context, Result};
use serde::Serialize;
use url::Url;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Inspection {
    pub url: String,
    pub facebook: bool,
    pub redirect_to: Option<String>,
    pub iframe: Option<IframeInspection>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IframeInspection {
    pub src: String,
    pub resolved: Option<String>,
    pub video: bool,
}

/// Classify `url`, and `iframe_src` as if embedded on that page.
pub fn inspect(url: &Url, iframe_src: Option<&str>) -> Inspection {
    let iframe = iframe_src.map(|src| {
        let mut doc = HtmlDocument::parse("<html><body></body></html>", url.clone());
        let markup = format!(r#"<iframe src="{}"></iframe>"#, escape_attr(src));
        let frame = doc
            .body()
            .and_then(|body| doc.append_html(body, &markup).ok())
            .and_then(|added| added.first().copied());
        IframeInspection {
            src: src.to_string(),
            resolved: frame.and_then(|f| iframe_source(&doc, f)),
            video: frame.is_some_and(|f| classify_iframe(&doc, f).is_match()),
        }
    });

    Inspection {
        url: url.to_string(),
        facebook: patterns::is_facebook(url),
        redirect_to: patterns::reel_redirect_target(url).map(|u| u.to_string()),
        iframe,
    }
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}

/// Run the inspect command.
pub fn run(url: &str, iframe_src: Option<&str>) -> Result<()> {
    let location = Url::parse(url).with_context(|| format!("invalid page URL: {url}"))?;
    let report = inspect(&location, iframe_src);

    if output::is_json() {
        output::print_json(&serde_json::to_value(&report)?);
        return Ok(());
    }
    if output::is_quiet() {
        return Ok(());
    }

    let s = Styled::new();
    eprintln!("  {}", s.bold(&report.url));
    let site = if report.facebook {
        s.yellow("facebook (reels heuristics on)")
    } else {
        s.dim("generic")
    };
    output::print_check(s.info_sym(), "site", &site);
    match &report.redirect_to {
        Some(target) => output::print_check(s.warn_sym(), "redirect", target),
        None => output::print_check(s.ok_sym(), "redirect", "none"),
    }
    if let Some(frame) = &report.iframe {
        let verdict = if frame.video {
            s.yellow("video embed (removed)")
        } else {
            s.green("kept")
        };
        output::print_check(s.info_sym(), "iframe", &verdict);
        output::print_check(
            s.info_sym(),
            "resolved src",
            frame.resolved.as_deref().unwrap_or("(none)"),
        );
    }

    Ok(())
}
