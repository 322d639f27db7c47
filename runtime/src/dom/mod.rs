//! Page access layer: the `Dom` capability the filter runs against.
//!
//! The filter never touches a global document. Everything it reads or mutates
//! goes through [`Dom`], which bundles the slice of `document` and `window`
//! the filter needs: tree queries, element removal, mutation observation,
//! the content-loaded signal and location replacement.

pub mod html;

pub use html::HtmlDocument;

use crate::error::DomError;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use url::Url;

/// Loading state of the document, mirroring `document.readyState`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReadyState {
    /// The parser is still building the tree.
    Loading,
    /// The tree is complete; subresources may still be loading.
    Interactive,
    /// Everything has loaded.
    Complete,
}

/// Rendered box size of an element in CSS pixels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// True when either dimension is under its threshold.
    pub fn is_under(&self, min_width: f64, min_height: f64) -> bool {
        self.width < min_width || self.height < min_height
    }
}

/// One child-list change: `added_nodes` were inserted under `target`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationRecord<N> {
    pub target: N,
    pub added_nodes: Vec<N>,
}

/// All records delivered by one observer notification.
pub type MutationBatch<N> = Vec<MutationRecord<N>>;

/// Stream of mutation batches for one observer. Ends when the observer is
/// disconnected or the document is dropped.
pub type MutationStream<N> = UnboundedReceiverStream<MutationBatch<N>>;

/// Sending half held by a document for each registered observer.
pub type MutationSender<N> = mpsc::UnboundedSender<MutationBatch<N>>;

/// Resolves once the document has finished parsing.
pub type ContentLoaded = oneshot::Receiver<()>;

/// Document and window access for the filter.
///
/// Handles are plain `Copy` values; a handle may outlive its node's
/// attachment to the tree, so every operation must tolerate detached nodes.
pub trait Dom {
    /// Handle to a node of this document.
    type Node: Copy + Eq + Debug;

    /// Current page location (`window.location.href`).
    fn location(&self) -> &Url;

    /// Base URL relative references resolve against (`document.baseURI`).
    fn base_url(&self) -> Url;

    fn ready_state(&self) -> ReadyState;

    /// Receiver that fires when the document finishes parsing. Fires
    /// immediately when the document is no longer loading.
    fn content_loaded(&mut self) -> ContentLoaded;

    /// The root element (`document.documentElement`).
    fn document_element(&self) -> Option<Self::Node>;

    fn body(&self) -> Option<Self::Node>;

    fn is_element(&self, node: Self::Node) -> bool;

    /// Lowercase local name for elements, `None` for anything else.
    fn tag_name(&self, node: Self::Node) -> Option<String>;

    fn attr(&self, node: Self::Node, name: &str) -> Option<String>;

    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Element children in document order.
    fn children(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Concatenated text of the node and its descendants.
    fn text_content(&self, node: Self::Node) -> String;

    /// Rendered size. Nodes without layout report zero.
    fn rendered_size(&self, node: Self::Node) -> Size;

    /// Descendants of `root` (excluding `root`) matching `selector`, in
    /// document order.
    fn query_all(&self, root: Self::Node, selector: &str) -> Result<Vec<Self::Node>, DomError>;

    /// Whether `node` itself matches `selector`.
    fn matches(&self, node: Self::Node, selector: &str) -> Result<bool, DomError>;

    /// Detach `node` from its parent. Returns `false` when it had no parent.
    fn remove(&mut self, node: Self::Node) -> bool;

    /// Replace the current navigation (`location.replace`).
    fn replace_location(&mut self, url: Url);

    /// Register a child-list observer over the subtree rooted at `root`.
    fn observe(&mut self, root: Self::Node) -> MutationStream<Self::Node>;

    fn query_first(
        &self,
        root: Self::Node,
        selector: &str,
    ) -> Result<Option<Self::Node>, DomError> {
        Ok(self.query_all(root, selector)?.into_iter().next())
    }

    /// Inclusive containment, like `Node.contains`.
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Nearest inclusive ancestor matching `selector`, like `Element.closest`.
    fn closest(&self, node: Self::Node, selector: &str) -> Result<Option<Self::Node>, DomError> {
        let mut current = Some(node);
        while let Some(n) = current {
            if self.is_element(n) && self.matches(n, selector)? {
                return Ok(Some(n));
            }
            current = self.parent(n);
        }
        Ok(None)
    }
}
