//! DOM host abstraction.
//!
//! The modal only talks to the document through [`DomHost`], so the same
//! controller drives the browser (`WebDom`) and the in-memory document used by
//! tests and headless callers (`MemoryDom`).
//!
//! Listener and timer handles follow RAII: dropping a listener unbinds it,
//! dropping a timer cancels it.

pub mod memory;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use memory::{MemoryDom, MemoryListener, MemoryTimer, NodeId};
#[cfg(target_arch = "wasm32")]
pub use web::{WebDom, WebListener};

use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DomError {
    #[error("no document available")]
    NoDocument,
    #[error("document has no <{0}> element")]
    MissingElement(&'static str),
    #[error("unsupported selector `{0}`")]
    InvalidSelector(String),
    #[error("node is not part of this document")]
    UnknownNode,
    #[error("javascript error: {0}")]
    Js(String),
}

/// DOM events the modal listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ListenerKind {
    Click,
    KeyDown,
}

impl ListenerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListenerKind::Click => "click",
            ListenerKind::KeyDown => "keydown",
        }
    }
}

/// What a listener saw.
#[derive(Debug, Clone, PartialEq)]
pub struct DomEvent<N> {
    pub kind: ListenerKind,
    pub target: N,
    /// `KeyboardEvent.key` for key events.
    pub key: Option<String>,
}

/// What a listener wants done with the event after it ran.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFlow {
    #[default]
    Continue,
    PreventDefault,
    /// Prevent default and stop propagation.
    Consume,
}

impl EventFlow {
    pub fn prevents_default(&self) -> bool {
        matches!(self, EventFlow::PreventDefault | EventFlow::Consume)
    }

    pub fn stops_propagation(&self) -> bool {
        matches!(self, EventFlow::Consume)
    }
}

pub type DomHandler<N> = Box<dyn FnMut(&DomEvent<N>) -> EventFlow>;

/// Document operations the modal needs.
pub trait DomHost: Clone + 'static {
    type Node: Clone + PartialEq + fmt::Debug + 'static;
    /// Unbinds its listener when dropped.
    type Listener: 'static;
    /// Cancels its callback when dropped.
    type Timer: 'static;

    fn body(&self) -> Result<Self::Node, DomError>;
    fn head(&self) -> Result<Self::Node, DomError>;
    /// The `<html>` element.
    fn root(&self) -> Result<Self::Node, DomError>;

    fn create_element(&self, tag: &str) -> Result<Self::Node, DomError>;
    fn set_attribute(&self, node: &Self::Node, name: &str, value: &str) -> Result<(), DomError>;
    fn remove_attribute(&self, node: &Self::Node, name: &str) -> Result<(), DomError>;
    fn attribute(&self, node: &Self::Node, name: &str) -> Option<String>;
    fn set_style(&self, node: &Self::Node, property: &str, value: &str) -> Result<(), DomError>;
    fn set_text(&self, node: &Self::Node, text: &str) -> Result<(), DomError>;

    fn add_class(&self, node: &Self::Node, class: &str) -> Result<(), DomError>;
    fn remove_class(&self, node: &Self::Node, class: &str) -> Result<(), DomError>;
    fn has_class(&self, node: &Self::Node, class: &str) -> bool;

    fn append_child(&self, parent: &Self::Node, child: &Self::Node) -> Result<(), DomError>;
    /// Moves `node` to be the next sibling of `reference`.
    fn insert_after(&self, reference: &Self::Node, node: &Self::Node) -> Result<(), DomError>;
    /// Removes `node` from its parent; a detached node is left alone.
    fn detach(&self, node: &Self::Node);

    fn focus(&self, node: &Self::Node);
    fn scroll_to_top(&self, node: &Self::Node);

    /// Matching elements in document order.
    fn query_all(&self, selector: &str) -> Result<Vec<Self::Node>, DomError>;
    /// Closest inclusive ancestor of `target` matching `selector`, strictly inside `boundary`.
    fn closest_within(
        &self,
        target: &Self::Node,
        selector: &str,
        boundary: &Self::Node,
    ) -> Result<Option<Self::Node>, DomError>;

    fn listen(
        &self,
        node: &Self::Node,
        kind: ListenerKind,
        handler: DomHandler<Self::Node>,
    ) -> Result<Self::Listener, DomError>;

    /// Dispatches a bubbling, cancelable custom event.
    ///
    /// Returns `false` when a listener prevented its default.
    fn dispatch(&self, node: &Self::Node, event: &str, detail: Option<&str>) -> bool;

    fn set_timeout(&self, millis: u32, callback: Box<dyn FnOnce()>) -> Self::Timer;
}
