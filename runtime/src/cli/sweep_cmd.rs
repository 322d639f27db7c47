//! `reel-sweeper sweep <file> --url <url>`: strip videos from a saved page.

use crate::cli::output::{self, Styled};
use crate::config::FilterConfig;
use crate::dom::{Dom, HtmlDocument};
use crate::filter::{patterns, sweep_page, SweepReport};
use anyhow::{Context, Result};
use std::path::Path;
use url::Url;

/// What happened to one page.
#[derive(Debug, Clone, PartialEq)]
pub enum SweepResult {
    /// Single-reel page; nothing was processed.
    Redirected(Url),
    Swept { html: String, report: SweepReport },
}

/// Treat `html` as the page served at `location` and sweep it once.
pub fn sweep_html(html: &str, location: Url, config: &FilterConfig) -> SweepResult {
    let mut doc = HtmlDocument::parse(html, location);
    if let Some(target) = patterns::reel_redirect_target(doc.location()) {
        doc.replace_location(target.clone());
        return SweepResult::Redirected(target);
    }

    let report = sweep_page(&mut doc, config);
    SweepResult::Swept {
        html: doc.to_html(),
        report,
    }
}

/// Run the sweep command.
pub fn run(
    file: &Path,
    url: &str,
    output_path: Option<&Path>,
    config: &FilterConfig,
) -> Result<()> {
    let location = Url::parse(url).with_context(|| format!("invalid page URL: {url}"))?;
    let html = std::fs::read_to_string(file)
        .with_context(|| format!("failed to read {}", file.display()))?;

    let s = Styled::new();
    match sweep_html(&html, location, config) {
        SweepResult::Redirected(target) => {
            if output::is_json() {
                output::print_json(&serde_json::json!({
                    "url": url,
                    "redirected_to": target.as_str(),
                }));
            } else if !output::is_quiet() {
                eprintln!("  {} Single reel page, would redirect to {target}", s.warn_sym());
            }
        }
        SweepResult::Swept { html, report } => {
            match output_path {
                Some(path) => std::fs::write(path, &html)
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None if !output::is_json() => println!("{html}"),
                None => {}
            }

            if output::is_json() {
                let mut value = serde_json::json!({
                    "url": url,
                    "removed": serde_json::to_value(report)?,
                    "total": report.total(),
                });
                if output_path.is_none() {
                    value["html"] = serde_json::Value::String(html);
                }
                output::print_json(&value);
            } else if !output::is_quiet() {
                print_summary(&s, &report);
            }
        }
    }

    Ok(())
}

fn print_summary(s: &Styled, report: &SweepReport) {
    let sym = if report.total() > 0 { s.ok_sym() } else { s.info_sym() };
    eprintln!("  {sym} Removed {} element(s)", s.bold(&report.total().to_string()));
    output::print_check(s.info_sym(), "videos", &report.videos.to_string());
    output::print_check(s.info_sym(), "iframes", &report.iframes.to_string());
    output::print_check(s.info_sym(), "containers", &report.containers.to_string());
    output::print_check(
        s.info_sym(),
        "reels sections",
        &report.reels.total().to_string(),
    );
}
