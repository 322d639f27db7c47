//! `Dom` implementation over a parsed HTML tree.
//!
//! Backed by `scraper::Html`, whose `ego_tree` arena gives stable node ids
//! that stay valid after a node is detached. There is no layout engine, so
//! rendered sizes come from inline `style` or `width`/`height` attributes.

use super::{
    ContentLoaded, Dom, MutationBatch, MutationRecord, MutationSender, MutationStream, ReadyState,
    Size,
};
use crate::error::DomError;
use ego_tree::{NodeId, NodeRef};
use regex::Regex;
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::LazyLock;
use tokio::sync::{mpsc, oneshot};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{debug, info};
use url::Url;

static STYLE_WIDTH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*width\s*:\s*([0-9]+(?:\.[0-9]+)?)px").unwrap()
});

static STYLE_HEIGHT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:^|;)\s*height\s*:\s*([0-9]+(?:\.[0-9]+)?)px").unwrap()
});

struct Observer {
    root: NodeId,
    tx: MutationSender<NodeId>,
}

/// A live, mutable HTML document.
pub struct HtmlDocument {
    html: Html,
    location: Url,
    ready_state: ReadyState,
    loaded_waiters: Vec<oneshot::Sender<()>>,
    observers: Vec<Observer>,
    pending_records: Vec<MutationRecord<NodeId>>,
    redirected_to: Option<Url>,
}

impl HtmlDocument {
    /// Parse a complete document served from `location`.
    pub fn parse(html: &str, location: Url) -> Self {
        Self {
            html: Html::parse_document(html),
            location,
            ready_state: ReadyState::Complete,
            loaded_waiters: Vec::new(),
            observers: Vec::new(),
            pending_records: Vec::new(),
            redirected_to: None,
        }
    }

    /// An empty document whose parser has not produced any content yet.
    pub fn loading(location: Url) -> Self {
        Self {
            html: Html::new_document(),
            location,
            ready_state: ReadyState::Loading,
            loaded_waiters: Vec::new(),
            observers: Vec::new(),
            pending_records: Vec::new(),
            redirected_to: None,
        }
    }

    /// Install the parsed tree and fire content-loaded.
    pub fn finish_loading(&mut self, html: &str) {
        self.html = Html::parse_document(html);
        self.ready_state = ReadyState::Interactive;
        for waiter in self.loaded_waiters.drain(..) {
            let _ = waiter.send(());
        }
        debug!(url = %self.location, "content loaded");
    }

    /// Parse `fragment` and append its top-level nodes to `parent`.
    ///
    /// The insertion is queued as one mutation record; observers see it on
    /// the next [`flush_mutations`](Self::flush_mutations).
    pub fn append_html(&mut self, parent: NodeId, fragment: &str) -> Result<Vec<NodeId>, DomError> {
        if self.node(parent).is_none() {
            return Err(DomError::NoSuchNode);
        }

        let fragment = Html::parse_fragment(fragment);
        let mut added = Vec::new();
        for child in fragment.root_element().children() {
            let id = self.graft(parent, child).ok_or(DomError::NoSuchNode)?;
            added.push(id);
        }

        if !added.is_empty() {
            self.pending_records.push(MutationRecord {
                target: parent,
                added_nodes: added.clone(),
            });
        }
        Ok(added)
    }

    /// Deliver every queued record as one batch to each observer whose root
    /// contains the record's target. Returns the number of observers notified.
    pub fn flush_mutations(&mut self) -> usize {
        let records = std::mem::take(&mut self.pending_records);
        if records.is_empty() {
            return 0;
        }

        self.observers.retain(|o| !o.tx.is_closed());

        let mut notified = 0;
        for observer in &self.observers {
            let batch: MutationBatch<NodeId> = records
                .iter()
                .filter(|r| self.contains(observer.root, r.target))
                .cloned()
                .collect();
            if batch.is_empty() {
                continue;
            }
            if observer.tx.send(batch).is_ok() {
                notified += 1;
            }
        }
        notified
    }

    /// Drop every observer, ending their streams.
    pub fn disconnect_observers(&mut self) {
        self.observers.clear();
    }

    /// Where `replace_location` sent the page, if anywhere.
    pub fn redirected_to(&self) -> Option<&Url> {
        self.redirected_to.as_ref()
    }

    /// Serialize the current tree.
    pub fn to_html(&self) -> String {
        self.html.html()
    }

    fn node(&self, id: NodeId) -> Option<NodeRef<'_, Node>> {
        self.html.tree.get(id)
    }

    fn graft(&mut self, parent: NodeId, source: NodeRef<'_, Node>) -> Option<NodeId> {
        let id = self
            .html
            .tree
            .get_mut(parent)?
            .append(source.value().clone())
            .id();
        for child in source.children() {
            self.graft(id, child)?;
        }
        Some(id)
    }

    fn first_child_named(&self, parent: NodeId, name: &str) -> Option<NodeId> {
        self.node(parent)?
            .children()
            .find(|n| {
                n.value()
                    .as_element()
                    .is_some_and(|e| e.name().eq_ignore_ascii_case(name))
            })
            .map(|n| n.id())
    }
}

fn parse_selector(selector: &str) -> Result<Selector, DomError> {
    Selector::parse(selector).map_err(|e| DomError::InvalidSelector {
        selector: selector.to_string(),
        reason: e.to_string(),
    })
}

fn style_px(style: &str, re: &Regex) -> Option<f64> {
    re.captures(style)?.get(1)?.as_str().parse().ok()
}

fn attr_px(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").parse().ok()
}

impl Dom for HtmlDocument {
    type Node = NodeId;

    fn location(&self) -> &Url {
        &self.location
    }

    fn base_url(&self) -> Url {
        self.document_element()
            .and_then(|root| self.query_first(root, "base[href]").ok().flatten())
            .and_then(|base| self.attr(base, "href"))
            .and_then(|href| self.location.join(&href).ok())
            .unwrap_or_else(|| self.location.clone())
    }

    fn ready_state(&self) -> ReadyState {
        self.ready_state
    }

    fn content_loaded(&mut self) -> ContentLoaded {
        let (tx, rx) = oneshot::channel();
        if self.ready_state == ReadyState::Loading {
            self.loaded_waiters.push(tx);
        } else {
            let _ = tx.send(());
        }
        rx
    }

    fn document_element(&self) -> Option<NodeId> {
        self.html
            .tree
            .root()
            .children()
            .find(|n| n.value().is_element())
            .map(|n| n.id())
    }

    fn body(&self) -> Option<NodeId> {
        self.first_child_named(self.document_element()?, "body")
    }

    fn is_element(&self, node: NodeId) -> bool {
        self.node(node).is_some_and(|n| n.value().is_element())
    }

    fn tag_name(&self, node: NodeId) -> Option<String> {
        self.node(node)?
            .value()
            .as_element()
            .map(|e| e.name().to_ascii_lowercase())
    }

    fn attr(&self, node: NodeId, name: &str) -> Option<String> {
        self.node(node)?
            .value()
            .as_element()?
            .attr(name)
            .map(String::from)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node)?.parent().map(|p| p.id())
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        match self.node(node) {
            Some(n) => n
                .children()
                .filter(|c| c.value().is_element())
                .map(|c| c.id())
                .collect(),
            None => Vec::new(),
        }
    }

    fn text_content(&self, node: NodeId) -> String {
        let mut text = String::new();
        if let Some(n) = self.node(node) {
            for descendant in n.descendants() {
                if let Some(t) = descendant.value().as_text() {
                    text.push_str(t);
                }
            }
        }
        text
    }

    fn rendered_size(&self, node: NodeId) -> Size {
        let Some(element) = self.node(node).and_then(|n| n.value().as_element()) else {
            return Size::default();
        };
        let style = element.attr("style").unwrap_or("");
        let width = style_px(style, &STYLE_WIDTH_RE)
            .or_else(|| element.attr("width").and_then(attr_px))
            .unwrap_or(0.0);
        let height = style_px(style, &STYLE_HEIGHT_RE)
            .or_else(|| element.attr("height").and_then(attr_px))
            .unwrap_or(0.0);
        Size::new(width, height)
    }

    fn query_all(&self, root: NodeId, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let parsed = parse_selector(selector)?;
        let root = self.node(root).ok_or(DomError::NoSuchNode)?;
        Ok(root
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .filter(|el| parsed.matches(el))
            .map(|el| el.id())
            .collect())
    }

    fn matches(&self, node: NodeId, selector: &str) -> Result<bool, DomError> {
        let parsed = parse_selector(selector)?;
        let node = self.node(node).ok_or(DomError::NoSuchNode)?;
        Ok(ElementRef::wrap(node).is_some_and(|el| parsed.matches(&el)))
    }

    fn remove(&mut self, node: NodeId) -> bool {
        if self.parent(node).is_none() {
            return false;
        }
        match self.html.tree.get_mut(node) {
            Some(mut n) => {
                n.detach();
                true
            }
            None => false,
        }
    }

    fn replace_location(&mut self, url: Url) {
        info!(from = %self.location, to = %url, "replacing location");
        self.redirected_to = Some(url);
    }

    fn observe(&mut self, root: NodeId) -> MutationStream<NodeId> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.observers.push(Observer { root, tx });
        UnboundedReceiverStream::new(rx)
    }
}
