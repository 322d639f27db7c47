//! Constant match tables: video-host URL patterns, Facebook container
//! selectors and site detection.

use regex::Regex;
use std::sync::LazyLock;
use url::Url;

/// Iframe sources (host or path) that carry video players.
const VIDEO_IFRAME_PATTERN_SOURCES: &[&str] = &[
    r"facebook\.com/watch",
    r"facebook\.com/video",
    r"fb\.watch",
    r"fbcdn\.net.*video",
    r"youtube\.com",
    r"youtube\.com/embed",
    r"youtu\.be",
    r"vimeo\.com",
    r"player\.vimeo\.com",
    r"twitch\.tv",
    r"player\.twitch\.tv",
    r"dailymotion\.com",
    r"embed\.dailymotion\.com",
];

/// Structural containers for video and Reels content on Facebook.
pub const FACEBOOK_VIDEO_SELECTORS: &[&str] = &[
    "[data-video-id]",
    r#"[data-pagelet*="Video"]"#,
    r#"[data-pagelet="VideoReels"]"#,
    r#"[data-ad-preview="video"]"#,
    "div[data-video-count]",
];

/// Where single-reel pages are sent instead.
pub const FACEBOOK_HOME: &str = "https://www.facebook.com/";

static VIDEO_IFRAME_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    VIDEO_IFRAME_PATTERN_SOURCES
        .iter()
        .map(|p| Regex::new(&format!("(?i){p}")).unwrap())
        .collect()
});

static FACEBOOK_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^https?://(www\.)?(facebook|fb|m\.facebook)\.com").unwrap()
});

static REEL_PATH_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)/reel/").unwrap());

/// The compiled iframe URL pattern set.
pub fn video_iframe_patterns() -> &'static [Regex] {
    &VIDEO_IFRAME_PATTERNS
}

/// Whether a resolved iframe source points at a known video host.
pub fn is_video_url(url: &str) -> bool {
    video_iframe_patterns().iter().any(|re| re.is_match(url))
}

/// Whether the page belongs to Facebook.
pub fn is_facebook(url: &Url) -> bool {
    FACEBOOK_URL_RE.is_match(url.as_str())
}

/// Home page to load instead of a single-reel view, if `url` is one.
pub fn reel_redirect_target(url: &Url) -> Option<Url> {
    if is_facebook(url) && REEL_PATH_RE.is_match(url.path()) {
        Url::parse(FACEBOOK_HOME).ok()
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_all_patterns_compile() {
        assert_eq!(video_iframe_patterns().len(), VIDEO_IFRAME_PATTERN_SOURCES.len());
    }

    #[test]
    fn test_video_urls() {
        assert!(is_video_url("https://www.youtube.com/embed/xyz"));
        assert!(is_video_url("https://youtu.be/abc"));
        assert!(is_video_url("https://PLAYER.VIMEO.COM/video/123"));
        assert!(is_video_url("https://player.twitch.tv/?channel=x"));
        assert!(is_video_url("https://www.dailymotion.com/embed/video/x1"));
        assert!(is_video_url("https://scontent.fbcdn.net/v/t42/video.mp4"));
        assert!(is_video_url("https://fb.watch/abc/"));
        assert!(!is_video_url("https://example.com/page"));
        assert!(!is_video_url("https://www.facebook.com/plugins/post.php"));
    }

    #[test]
    fn test_facebook_detection() {
        assert!(is_facebook(&url("https://www.facebook.com/")));
        assert!(is_facebook(&url("https://facebook.com/groups/1")));
        assert!(is_facebook(&url("https://m.facebook.com/home.php")));
        assert!(is_facebook(&url("http://fb.com/x")));
        assert!(!is_facebook(&url("https://web.facebook.com/")));
        assert!(!is_facebook(&url("https://example.com/facebook.com")));
    }

    #[test]
    fn test_reel_redirect() {
        assert_eq!(
            reel_redirect_target(&url("https://www.facebook.com/reel/123456")).unwrap().as_str(),
            FACEBOOK_HOME
        );
        assert!(reel_redirect_target(&url("https://m.facebook.com/REEL/9")).is_some());
        assert!(reel_redirect_target(&url("https://www.facebook.com/reels/")).is_none());
        assert!(reel_redirect_target(&url("https://www.facebook.com/watch")).is_none());
        assert!(reel_redirect_target(&url("https://example.com/reel/1")).is_none());
    }
}
