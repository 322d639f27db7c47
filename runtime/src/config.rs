//! Filter tuning: Reels card size thresholds and late-render re-check delays.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::warn;

/// Minimum rendered width of a Reels card, in CSS pixels.
pub const DEFAULT_MIN_CARD_WIDTH: f64 = 400.0;
/// Minimum rendered height of a Reels card, in CSS pixels.
pub const DEFAULT_MIN_CARD_HEIGHT: f64 = 200.0;
/// Delays after startup at which the Reels heuristics run again.
pub const DEFAULT_LATE_RENDER_DELAYS_MS: &[u64] = &[500, 2000];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterConfig {
    pub min_card_width: f64,
    pub min_card_height: f64,
    pub late_render_delays: Vec<Duration>,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            min_card_width: DEFAULT_MIN_CARD_WIDTH,
            min_card_height: DEFAULT_MIN_CARD_HEIGHT,
            late_render_delays: DEFAULT_LATE_RENDER_DELAYS_MS
                .iter()
                .map(|ms| Duration::from_millis(*ms))
                .collect(),
        }
    }
}

impl FilterConfig {
    /// Defaults overridden by `REEL_SWEEPER_MIN_CARD_WIDTH`,
    /// `REEL_SWEEPER_MIN_CARD_HEIGHT` and `REEL_SWEEPER_LATE_DELAYS_MS`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(raw) = lookup("REEL_SWEEPER_MIN_CARD_WIDTH") {
            match parse_px(&raw) {
                Some(v) => config.min_card_width = v,
                None => warn!(value = %raw, "ignoring malformed REEL_SWEEPER_MIN_CARD_WIDTH"),
            }
        }
        if let Some(raw) = lookup("REEL_SWEEPER_MIN_CARD_HEIGHT") {
            match parse_px(&raw) {
                Some(v) => config.min_card_height = v,
                None => warn!(value = %raw, "ignoring malformed REEL_SWEEPER_MIN_CARD_HEIGHT"),
            }
        }
        if let Some(raw) = lookup("REEL_SWEEPER_LATE_DELAYS_MS") {
            match parse_delays(&raw) {
                Some(delays) => config.late_render_delays = delays,
                None => warn!(value = %raw, "ignoring malformed REEL_SWEEPER_LATE_DELAYS_MS"),
            }
        }

        config
    }
}

fn parse_px(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite() && *v >= 0.0)
}

/// Comma-separated milliseconds; an empty string disables the re-checks.
fn parse_delays(raw: &str) -> Option<Vec<Duration>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<u64>().ok().map(Duration::from_millis))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = FilterConfig::default();
        assert_eq!(config.min_card_width, 400.0);
        assert_eq!(config.min_card_height, 200.0);
        assert_eq!(
            config.late_render_delays,
            vec![Duration::from_millis(500), Duration::from_millis(2000)]
        );
    }

    #[test]
    fn test_env_overrides() {
        let config = FilterConfig::from_lookup(lookup(&[
            ("REEL_SWEEPER_MIN_CARD_WIDTH", "320"),
            ("REEL_SWEEPER_LATE_DELAYS_MS", "100, 250,1000"),
        ]));
        assert_eq!(config.min_card_width, 320.0);
        assert_eq!(config.min_card_height, 200.0);
        assert_eq!(config.late_render_delays.len(), 3);
        assert_eq!(config.late_render_delays[1], Duration::from_millis(250));
    }

    #[test]
    fn test_malformed_values_keep_defaults() {
        let config = FilterConfig::from_lookup(lookup(&[
            ("REEL_SWEEPER_MIN_CARD_HEIGHT", "tall"),
            ("REEL_SWEEPER_LATE_DELAYS_MS", "500,soon"),
        ]));
        assert_eq!(config, FilterConfig::default());
    }

    #[test]
    fn test_empty_delays_disable_rechecks() {
        let config = FilterConfig::from_lookup(lookup(&[("REEL_SWEEPER_LATE_DELAYS_MS", "")]));
        assert!(config.late_render_delays.is_empty());
    }
}
