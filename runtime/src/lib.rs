//! reel-sweeper: strip video players, video embeds and Facebook Reels
//! sections from a page's DOM, both at load and as content is inserted.
//!
//! The engine talks to the page only through the [`dom::Dom`] trait.
//! [`dom::HtmlDocument`] implements it over a parsed HTML tree.

pub mod cli;
pub mod config;
pub mod dom;
pub mod error;
pub mod filter;

pub use config::FilterConfig;
pub use dom::{Dom, HtmlDocument};
pub use error::DomError;
pub use filter::{sweep_page, FilterOutcome, SweepReport, VideoFilter};
