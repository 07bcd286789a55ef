//! In-memory document with a virtual clock.
//!
//! Supports the subset of the DOM the modal uses: element trees, attributes,
//! class lists, inline styles, focus, bubbling click/keydown listeners,
//! cancelable custom events and timers driven by [`MemoryDom::advance`].
//! Focus changes notify `focusin`/`focusout` listeners registered with
//! [`MemoryDom::on_custom`] synchronously, as browsers do; moving or removing
//! the subtree holding focus fires `focusout` first.
//! Selectors are limited to comma separated compounds of `tag`, `.class`
//! and `#id`.

use super::{DomError, DomEvent, DomHandler, DomHost, EventFlow, ListenerKind};
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

#[derive(Debug, Default)]
struct NodeData {
    tag: String,
    attributes: BTreeMap<String, String>,
    classes: Vec<String>,
    styles: BTreeMap<String, String>,
    text: String,
    scroll_top: i32,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

struct ListenerEntry {
    id: u64,
    node: NodeId,
    kind: ListenerKind,
    handler: Rc<RefCell<DomHandler<NodeId>>>,
}

type CustomHandler = Rc<dyn Fn(Option<&str>) -> bool>;

struct CustomEntry {
    id: u64,
    node: NodeId,
    event: String,
    handler: CustomHandler,
}

struct TimerEntry {
    id: u64,
    due: u64,
    callback: Box<dyn FnOnce()>,
}

/// A custom event as recorded at dispatch time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub node: NodeId,
    pub event: String,
    pub detail: Option<String>,
}

struct Document {
    nodes: Vec<NodeData>,
    root: NodeId,
    head: NodeId,
    body: NodeId,
    focused: Option<NodeId>,
    listeners: Vec<ListenerEntry>,
    custom: Vec<CustomEntry>,
    dispatched: Vec<Dispatched>,
    timers: Vec<TimerEntry>,
    next_handle: u64,
    now: u64,
}

impl Document {
    fn new() -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
            head: NodeId(0),
            body: NodeId(0),
            focused: None,
            listeners: Vec::new(),
            custom: Vec::new(),
            dispatched: Vec::new(),
            timers: Vec::new(),
            next_handle: 1,
            now: 0,
        };
        doc.root = doc.alloc("html");
        doc.head = doc.alloc("head");
        doc.body = doc.alloc("body");
        let (root, head, body) = (doc.root, doc.head, doc.body);
        // Fresh nodes cannot form a cycle.
        let _ = doc.append(root, head);
        let _ = doc.append(root, body);
        doc
    }

    fn alloc(&mut self, tag: &str) -> NodeId {
        self.nodes.push(NodeData {
            tag: tag.to_ascii_lowercase(),
            ..NodeData::default()
        });
        NodeId(self.nodes.len() - 1)
    }

    fn handle(&mut self) -> u64 {
        let id = self.next_handle;
        self.next_handle += 1;
        id
    }

    fn node(&self, id: NodeId) -> Result<&NodeData, DomError> {
        self.nodes.get(id.0).ok_or(DomError::UnknownNode)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut NodeData, DomError> {
        self.nodes.get_mut(id.0).ok_or(DomError::UnknownNode)
    }

    /// `id` first, root last.
    fn ancestors_inclusive(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            path.push(node);
            current = self.nodes.get(node.0).and_then(|n| n.parent);
        }
        path
    }

    fn unlink(&mut self, id: NodeId) {
        let Some(parent) = self.nodes.get(id.0).and_then(|n| n.parent) else {
            return;
        };
        self.nodes[parent.0].children.retain(|c| *c != id);
        self.nodes[id.0].parent = None;
    }

    fn append(&mut self, parent: NodeId, child: NodeId) -> Result<(), DomError> {
        self.node(child)?;
        self.node(parent)?;
        if self.ancestors_inclusive(parent).contains(&child) {
            return Err(DomError::Js("HierarchyRequestError".to_string()));
        }
        self.unlink(child);
        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);
        Ok(())
    }

    fn insert_after(&mut self, reference: NodeId, node: NodeId) -> Result<(), DomError> {
        self.node(node)?;
        let Some(parent) = self.node(reference)?.parent else {
            // Like ChildNode.after(), a parentless reference is a no-op.
            return Ok(());
        };
        if node == reference {
            return Ok(());
        }
        if self.ancestors_inclusive(parent).contains(&node) {
            return Err(DomError::Js("HierarchyRequestError".to_string()));
        }
        self.unlink(node);
        let siblings = &mut self.nodes[parent.0].children;
        let index = siblings
            .iter()
            .position(|c| *c == reference)
            .map_or(siblings.len(), |i| i + 1);
        siblings.insert(index, node);
        self.nodes[node.0].parent = Some(parent);
        Ok(())
    }

    fn matches(&self, id: NodeId, selector: &[Compound]) -> bool {
        let Some(node) = self.nodes.get(id.0) else {
            return false;
        };
        selector.iter().any(|compound| compound.matches(node))
    }

    /// Custom handlers for `event` from `node` up to the root.
    fn custom_handlers(&self, node: NodeId, event: &str) -> Vec<CustomHandler> {
        self.ancestors_inclusive(node)
            .iter()
            .flat_map(|n| {
                self.custom
                    .iter()
                    .filter(move |c| c.node == *n && c.event == event)
                    .map(|c| Rc::clone(&c.handler))
            })
            .collect()
    }

    fn descendants(&self, from: NodeId, out: &mut Vec<NodeId>) {
        out.push(from);
        for child in &self.nodes[from.0].children {
            self.descendants(*child, out);
        }
    }

    fn write_outline(&self, id: NodeId, out: &mut String) {
        let node = &self.nodes[id.0];
        let _ = write!(out, "<{}", node.tag);
        for (name, value) in &node.attributes {
            let _ = write!(out, " {name}=\"{value}\"");
        }
        if !node.classes.is_empty() {
            let _ = write!(out, " class=\"{}\"", node.classes.join(" "));
        }
        if !node.styles.is_empty() {
            let style: Vec<String> = node
                .styles
                .iter()
                .map(|(k, v)| format!("{k}: {v}"))
                .collect();
            let _ = write!(out, " style=\"{}\"", style.join("; "));
        }
        out.push('>');
        out.push_str(&node.text);
        for child in &node.children {
            self.write_outline(*child, out);
        }
        let _ = write!(out, "</{}>", node.tag);
    }
}

#[derive(Debug, Default, PartialEq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
}

impl Compound {
    fn matches(&self, node: &NodeData) -> bool {
        self.tag.as_deref().map_or(true, |tag| tag == node.tag)
            && self
                .id
                .as_deref()
                .map_or(true, |id| node.attributes.get("id").map(String::as_str) == Some(id))
            && self.classes.iter().all(|c| node.classes.contains(c))
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn parse_compound(part: &str) -> Option<Compound> {
    let is_marker = |c: char| c == '.' || c == '#';
    let mut compound = Compound::default();

    let tag_end = part.find(is_marker).unwrap_or(part.len());
    let tag = &part[..tag_end];
    if !tag.chars().all(is_name_char) {
        return None;
    }
    if !tag.is_empty() {
        compound.tag = Some(tag.to_ascii_lowercase());
    }

    let mut rest = &part[tag_end..];
    while let Some(marker) = rest.chars().next() {
        let body = &rest[1..];
        let end = body.find(is_marker).unwrap_or(body.len());
        let name = &body[..end];
        if name.is_empty() || !name.chars().all(is_name_char) {
            return None;
        }
        if marker == '.' {
            compound.classes.push(name.to_string());
        } else {
            compound.id = Some(name.to_string());
        }
        rest = &body[end..];
    }
    Some(compound)
}

fn parse_selector(selector: &str) -> Result<Vec<Compound>, DomError> {
    let invalid = || DomError::InvalidSelector(selector.to_string());
    let compounds = selector
        .split(',')
        .map(str::trim)
        .map(|part| {
            if part.is_empty() {
                None
            } else {
                parse_compound(part)
            }
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(invalid)?;
    if compounds.is_empty() {
        return Err(invalid());
    }
    Ok(compounds)
}

/// Shared handle to an in-memory document; clones see the same tree.
#[derive(Clone)]
pub struct MemoryDom {
    doc: Rc<RefCell<Document>>,
}

impl Default for MemoryDom {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryDom {
    pub fn new() -> Self {
        Self {
            doc: Rc::new(RefCell::new(Document::new())),
        }
    }

    /// Creates a `tag` element and appends it to `parent`.
    pub fn append_new(&self, parent: NodeId, tag: &str) -> NodeId {
        let mut doc = self.doc.borrow_mut();
        let id = doc.alloc(tag);
        // A fresh node has no children, so appending cannot fail on a known parent.
        let _ = doc.append(parent, id);
        id
    }

    /// Virtual time in milliseconds.
    pub fn now(&self) -> u64 {
        self.doc.borrow().now
    }

    /// Moves the clock forward, running due timers in order.
    pub fn advance(&self, millis: u64) {
        let target = self.now() + millis;
        loop {
            let callback = {
                let mut doc = self.doc.borrow_mut();
                let next = doc
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.due <= target)
                    .min_by_key(|(_, t)| (t.due, t.id))
                    .map(|(i, _)| i);
                match next {
                    Some(index) => {
                        let entry = doc.timers.remove(index);
                        doc.now = entry.due;
                        entry.callback
                    }
                    None => break,
                }
            };
            callback();
        }
        self.doc.borrow_mut().now = target;
    }

    /// Runs `focusin`/`focusout` listeners without recording a dispatch.
    fn notify_focus(&self, node: NodeId, event: &str) {
        let handlers = self.doc.borrow().custom_handlers(node, event);
        for handler in handlers {
            handler(None);
        }
    }

    /// Drops focus when it sits inside `subtree`, firing `focusout` while the
    /// node is still attached.
    fn release_focus_within(&self, subtree: NodeId) {
        let lost = {
            let doc = self.doc.borrow();
            let lost = doc
                .focused
                .filter(|focused| doc.ancestors_inclusive(*focused).contains(&subtree));
            lost
        };
        if let Some(lost) = lost {
            self.notify_focus(lost, "focusout");
            let mut doc = self.doc.borrow_mut();
            if doc.focused == Some(lost) {
                doc.focused = None;
            }
        }
    }

    pub fn pending_timers(&self) -> usize {
        self.doc.borrow().timers.len()
    }

    /// Clicks `target`; returns whether the default action was prevented.
    pub fn click(&self, target: NodeId) -> bool {
        self.fire(DomEvent {
            kind: ListenerKind::Click,
            target,
            key: None,
        })
    }

    /// Presses `key` on `target`; returns whether the default action was prevented.
    pub fn key_down(&self, target: NodeId, key: &str) -> bool {
        self.fire(DomEvent {
            kind: ListenerKind::KeyDown,
            target,
            key: Some(key.to_string()),
        })
    }

    fn fire(&self, event: DomEvent<NodeId>) -> bool {
        let path = self.doc.borrow().ancestors_inclusive(event.target);
        let mut prevented = false;
        for node in path {
            let handlers: Vec<_> = self
                .doc
                .borrow()
                .listeners
                .iter()
                .filter(|l| l.node == node && l.kind == event.kind)
                .map(|l| Rc::clone(&l.handler))
                .collect();
            let mut stopped = false;
            for handler in handlers {
                let Ok(mut handler) = handler.try_borrow_mut() else {
                    continue;
                };
                let flow: EventFlow = (&mut **handler)(&event);
                prevented |= flow.prevents_default();
                stopped |= flow.stops_propagation();
            }
            if stopped {
                break;
            }
        }
        prevented
    }

    /// Listens for custom events named `event` on `node` (and bubbling from below).
    ///
    /// Returning `false` from `handler` prevents the default.
    pub fn on_custom<F>(&self, node: NodeId, event: &str, handler: F) -> MemoryListener
    where
        F: Fn(Option<&str>) -> bool + 'static,
    {
        let mut doc = self.doc.borrow_mut();
        let id = doc.handle();
        doc.custom.push(CustomEntry {
            id,
            node,
            event: event.to_string(),
            handler: Rc::new(handler),
        });
        MemoryListener {
            id,
            doc: Rc::downgrade(&self.doc),
        }
    }

    pub fn dispatched(&self) -> Vec<Dispatched> {
        self.doc.borrow().dispatched.clone()
    }

    pub fn dispatched_names(&self) -> Vec<String> {
        self.doc
            .borrow()
            .dispatched
            .iter()
            .map(|d| d.event.clone())
            .collect()
    }

    pub fn clear_dispatched(&self) {
        self.doc.borrow_mut().dispatched.clear();
    }

    /// Click and keydown listeners currently bound.
    pub fn listener_count(&self) -> usize {
        self.doc.borrow().listeners.len()
    }

    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.doc.borrow().nodes.get(node.0).and_then(|n| n.parent)
    }

    pub fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.doc
            .borrow()
            .nodes
            .get(node.0)
            .map(|n| n.children.clone())
            .unwrap_or_default()
    }

    pub fn classes(&self, node: NodeId) -> Vec<String> {
        self.doc
            .borrow()
            .nodes
            .get(node.0)
            .map(|n| n.classes.clone())
            .unwrap_or_default()
    }

    pub fn style(&self, node: NodeId, property: &str) -> Option<String> {
        self.doc
            .borrow()
            .nodes
            .get(node.0)
            .and_then(|n| n.styles.get(property).cloned())
    }

    pub fn text(&self, node: NodeId) -> String {
        self.doc
            .borrow()
            .nodes
            .get(node.0)
            .map(|n| n.text.clone())
            .unwrap_or_default()
    }

    pub fn tag(&self, node: NodeId) -> String {
        self.doc
            .borrow()
            .nodes
            .get(node.0)
            .map(|n| n.tag.clone())
            .unwrap_or_default()
    }

    pub fn focused(&self) -> Option<NodeId> {
        self.doc.borrow().focused
    }

    pub fn scroll_top(&self, node: NodeId) -> i32 {
        self.doc
            .borrow()
            .nodes
            .get(node.0)
            .map_or(0, |n| n.scroll_top)
    }

    pub fn set_scroll_top(&self, node: NodeId, value: i32) {
        if let Some(n) = self.doc.borrow_mut().nodes.get_mut(node.0) {
            n.scroll_top = value;
        }
    }

    pub fn is_connected(&self, node: NodeId) -> bool {
        let doc = self.doc.borrow();
        doc.ancestors_inclusive(node).last() == Some(&doc.root)
    }

    pub fn element_by_id(&self, id: &str) -> Option<NodeId> {
        self.query_all(&format!("#{id}"))
            .ok()
            .and_then(|found| found.into_iter().next())
    }

    /// Serialized markup of the whole document, attributes in name order.
    pub fn outline(&self) -> String {
        let doc = self.doc.borrow();
        let mut out = String::new();
        doc.write_outline(doc.root, &mut out);
        out
    }
}

/// Bound listener; dropping it unbinds.
pub struct MemoryListener {
    id: u64,
    doc: Weak<RefCell<Document>>,
}

impl Drop for MemoryListener {
    fn drop(&mut self) {
        let Some(doc) = self.doc.upgrade() else {
            return;
        };
        // Handlers are dropped after the borrow ends; they may own other handles.
        let removed = match doc.try_borrow_mut() {
            Ok(mut doc) => {
                let listeners: Vec<_> = extract(&mut doc.listeners, |l| l.id == self.id);
                let custom: Vec<_> = extract(&mut doc.custom, |c| c.id == self.id);
                Some((listeners, custom))
            }
            Err(_) => None,
        };
        drop(removed);
    }
}

/// Scheduled callback; dropping it cancels.
pub struct MemoryTimer {
    id: u64,
    doc: Weak<RefCell<Document>>,
}

impl Drop for MemoryTimer {
    fn drop(&mut self) {
        let Some(doc) = self.doc.upgrade() else {
            return;
        };
        let removed = match doc.try_borrow_mut() {
            Ok(mut doc) => Some(extract(&mut doc.timers, |t| t.id == self.id)),
            Err(_) => None,
        };
        drop(removed);
    }
}

fn extract<T>(items: &mut Vec<T>, mut pred: impl FnMut(&T) -> bool) -> Vec<T> {
    let mut taken = Vec::new();
    let mut index = 0;
    while index < items.len() {
        if pred(&items[index]) {
            taken.push(items.remove(index));
        } else {
            index += 1;
        }
    }
    taken
}

impl DomHost for MemoryDom {
    type Node = NodeId;
    type Listener = MemoryListener;
    type Timer = MemoryTimer;

    fn body(&self) -> Result<NodeId, DomError> {
        Ok(self.doc.borrow().body)
    }

    fn head(&self) -> Result<NodeId, DomError> {
        Ok(self.doc.borrow().head)
    }

    fn root(&self) -> Result<NodeId, DomError> {
        Ok(self.doc.borrow().root)
    }

    fn create_element(&self, tag: &str) -> Result<NodeId, DomError> {
        if tag.is_empty() || !tag.chars().all(is_name_char) {
            return Err(DomError::Js(format!("InvalidCharacterError: `{tag}`")));
        }
        Ok(self.doc.borrow_mut().alloc(tag))
    }

    fn set_attribute(&self, node: &NodeId, name: &str, value: &str) -> Result<(), DomError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.node_mut(*node)?;
        if name == "class" {
            data.classes = value.split_whitespace().map(str::to_string).collect();
        } else {
            data.attributes.insert(name.to_string(), value.to_string());
        }
        Ok(())
    }

    fn remove_attribute(&self, node: &NodeId, name: &str) -> Result<(), DomError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.node_mut(*node)?;
        if name == "class" {
            data.classes.clear();
        } else {
            data.attributes.remove(name);
        }
        Ok(())
    }

    fn attribute(&self, node: &NodeId, name: &str) -> Option<String> {
        let doc = self.doc.borrow();
        let data = doc.node(*node).ok()?;
        if name == "class" {
            return (!data.classes.is_empty()).then(|| data.classes.join(" "));
        }
        data.attributes.get(name).cloned()
    }

    fn set_style(&self, node: &NodeId, property: &str, value: &str) -> Result<(), DomError> {
        let mut doc = self.doc.borrow_mut();
        doc.node_mut(*node)?
            .styles
            .insert(property.to_string(), value.to_string());
        Ok(())
    }

    fn set_text(&self, node: &NodeId, text: &str) -> Result<(), DomError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.node_mut(*node)?;
        data.text = text.to_string();
        Ok(())
    }

    fn add_class(&self, node: &NodeId, class: &str) -> Result<(), DomError> {
        let mut doc = self.doc.borrow_mut();
        let data = doc.node_mut(*node)?;
        if !data.classes.iter().any(|c| c == class) {
            data.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&self, node: &NodeId, class: &str) -> Result<(), DomError> {
        let mut doc = self.doc.borrow_mut();
        doc.node_mut(*node)?.classes.retain(|c| c != class);
        Ok(())
    }

    fn has_class(&self, node: &NodeId, class: &str) -> bool {
        self.doc
            .borrow()
            .node(*node)
            .map_or(false, |n| n.classes.iter().any(|c| c == class))
    }

    fn append_child(&self, parent: &NodeId, child: &NodeId) -> Result<(), DomError> {
        self.release_focus_within(*child);
        self.doc.borrow_mut().append(*parent, *child)
    }

    fn insert_after(&self, reference: &NodeId, node: &NodeId) -> Result<(), DomError> {
        self.release_focus_within(*node);
        self.doc.borrow_mut().insert_after(*reference, *node)
    }

    fn detach(&self, node: &NodeId) {
        self.release_focus_within(*node);
        self.doc.borrow_mut().unlink(*node);
    }

    fn focus(&self, node: &NodeId) {
        let previous = {
            let mut doc = self.doc.borrow_mut();
            if doc.node(*node).is_err() || doc.focused == Some(*node) {
                return;
            }
            doc.focused.replace(*node)
        };
        if let Some(previous) = previous {
            self.notify_focus(previous, "focusout");
        }
        self.notify_focus(*node, "focusin");
    }

    fn scroll_to_top(&self, node: &NodeId) {
        self.set_scroll_top(*node, 0);
    }

    fn query_all(&self, selector: &str) -> Result<Vec<NodeId>, DomError> {
        let compounds = parse_selector(selector)?;
        let doc = self.doc.borrow();
        let mut all = Vec::new();
        doc.descendants(doc.root, &mut all);
        Ok(all
            .into_iter()
            .filter(|id| doc.matches(*id, &compounds))
            .collect())
    }

    fn closest_within(
        &self,
        target: &NodeId,
        selector: &str,
        boundary: &NodeId,
    ) -> Result<Option<NodeId>, DomError> {
        let compounds = parse_selector(selector)?;
        let doc = self.doc.borrow();
        let path = doc.ancestors_inclusive(*target);
        let Some(limit) = path.iter().position(|n| n == boundary) else {
            return Ok(None);
        };
        Ok(path[..limit]
            .iter()
            .copied()
            .find(|id| doc.matches(*id, &compounds)))
    }

    fn listen(
        &self,
        node: &NodeId,
        kind: ListenerKind,
        handler: DomHandler<NodeId>,
    ) -> Result<MemoryListener, DomError> {
        let mut doc = self.doc.borrow_mut();
        doc.node(*node)?;
        let id = doc.handle();
        doc.listeners.push(ListenerEntry {
            id,
            node: *node,
            kind,
            handler: Rc::new(RefCell::new(handler)),
        });
        Ok(MemoryListener {
            id,
            doc: Rc::downgrade(&self.doc),
        })
    }

    fn dispatch(&self, node: &NodeId, event: &str, detail: Option<&str>) -> bool {
        let handlers: Vec<CustomHandler> = {
            let mut doc = self.doc.borrow_mut();
            doc.dispatched.push(Dispatched {
                node: *node,
                event: event.to_string(),
                detail: detail.map(str::to_string),
            });
            let handlers = doc.custom_handlers(*node, event);
            handlers
        };
        handlers
            .into_iter()
            .fold(true, |proceed, handler| handler(detail) && proceed)
    }

    fn set_timeout(&self, millis: u32, callback: Box<dyn FnOnce()>) -> MemoryTimer {
        let mut doc = self.doc.borrow_mut();
        let id = doc.handle();
        let due = doc.now + u64::from(millis);
        doc.timers.push(TimerEntry { id, due, callback });
        MemoryTimer {
            id,
            doc: Rc::downgrade(&self.doc),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_document_skeleton() {
        let dom = MemoryDom::new();
        let root = dom.root().unwrap();
        assert_eq!(dom.tag(root), "html");
        assert_eq!(
            dom.children(root),
            vec![dom.head().unwrap(), dom.body().unwrap()]
        );
        assert_eq!(dom.outline(), "<html><head></head><body></body></html>");
    }

    #[test]
    fn test_insert_after_and_detach() {
        let dom = MemoryDom::new();
        let body = dom.body().unwrap();
        let a = dom.append_new(body, "p");
        let b = dom.append_new(body, "p");
        let c = dom.create_element("span").unwrap();
        dom.insert_after(&a, &c).unwrap();
        assert_eq!(dom.children(body), vec![a, c, b]);

        dom.insert_after(&b, &a).unwrap();
        assert_eq!(dom.children(body), vec![c, b, a]);

        dom.detach(&c);
        assert_eq!(dom.children(body), vec![b, a]);
        assert!(!dom.is_connected(c));
        assert_eq!(dom.parent(c), None);
    }

    #[test]
    fn test_append_rejects_cycles() {
        let dom = MemoryDom::new();
        let body = dom.body().unwrap();
        let outer = dom.append_new(body, "div");
        let inner = dom.append_new(outer, "div");
        assert!(dom.append_child(&inner, &outer).is_err());
    }

    #[test]
    fn test_selectors() {
        let dom = MemoryDom::new();
        let body = dom.body().unwrap();
        let a = dom.append_new(body, "div");
        dom.add_class(&a, "card").unwrap();
        dom.add_class(&a, "wide").unwrap();
        let b = dom.append_new(a, "button");
        dom.set_attribute(&b, "id", "go").unwrap();

        assert_eq!(dom.query_all(".card").unwrap(), vec![a]);
        assert_eq!(dom.query_all("div.card.wide").unwrap(), vec![a]);
        assert!(dom.query_all("span.card").unwrap().is_empty());
        assert_eq!(dom.query_all("#go, .card").unwrap(), vec![a, b]);
        assert_eq!(dom.element_by_id("go"), Some(b));
        assert!(matches!(
            dom.query_all("div > p"),
            Err(DomError::InvalidSelector(_))
        ));
        assert!(dom.query_all("").is_err());
    }

    #[test]
    fn test_closest_within_respects_boundary() {
        let dom = MemoryDom::new();
        let body = dom.body().unwrap();
        let outside = dom.append_new(body, "div");
        dom.add_class(&outside, "hit").unwrap();
        let boundary = dom.append_new(outside, "section");
        let inner = dom.append_new(boundary, "span");

        assert_eq!(dom.closest_within(&inner, ".hit", &boundary).unwrap(), None);
        dom.add_class(&inner, "hit").unwrap();
        assert_eq!(
            dom.closest_within(&inner, ".hit", &boundary).unwrap(),
            Some(inner)
        );
        assert_eq!(dom.closest_within(&outside, ".hit", &boundary).unwrap(), None);
    }

    #[test]
    fn test_click_bubbles_until_consumed() {
        let dom = MemoryDom::new();
        let body = dom.body().unwrap();
        let outer = dom.append_new(body, "div");
        let inner = dom.append_new(outer, "button");
        let seen = Rc::new(Cell::new(0));

        let counter = Rc::clone(&seen);
        let _outer = dom
            .listen(
                &outer,
                ListenerKind::Click,
                Box::new(move |_| {
                    counter.set(counter.get() + 10);
                    EventFlow::Continue
                }),
            )
            .unwrap();
        let counter = Rc::clone(&seen);
        let inner_listener = dom
            .listen(
                &inner,
                ListenerKind::Click,
                Box::new(move |event| {
                    assert_eq!(event.target, inner);
                    counter.set(counter.get() + 1);
                    EventFlow::Consume
                }),
            )
            .unwrap();

        assert!(dom.click(inner));
        assert_eq!(seen.get(), 1);

        drop(inner_listener);
        assert!(!dom.click(inner));
        assert_eq!(seen.get(), 11);
        assert_eq!(dom.listener_count(), 1);
    }

    #[test]
    fn test_custom_events_can_be_cancelled() {
        let dom = MemoryDom::new();
        let body = dom.body().unwrap();
        let node = dom.append_new(body, "div");
        assert!(dom.dispatch(&node, "apfmBeforeOpen", None));

        let _veto = dom.on_custom(body, "apfmBeforeOpen", |_| false);
        assert!(!dom.dispatch(&node, "apfmBeforeOpen", None));
        assert!(dom.dispatch(&node, "apfmOpen", Some("x")));
        assert_eq!(
            dom.dispatched().last(),
            Some(&Dispatched {
                node,
                event: "apfmOpen".into(),
                detail: Some("x".into())
            })
        );
    }

    #[test]
    fn test_focus_changes_notify_listeners() {
        let dom = MemoryDom::new();
        let body = dom.body().unwrap();
        let panel = dom.append_new(body, "div");
        let field = dom.append_new(panel, "input");
        let other = dom.append_new(body, "button");
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        let _in = dom.on_custom(body, "focusin", move |_| {
            l.borrow_mut().push("in");
            true
        });
        let l = Rc::clone(&log);
        let reader = dom.clone();
        let _out = dom.on_custom(body, "focusout", move |_| {
            // Listeners may read the document while focus moves.
            l.borrow_mut().push(if reader.focused().is_some() { "out" } else { "out-none" });
            true
        });

        dom.focus(&field);
        dom.focus(&field);
        dom.focus(&other);
        assert_eq!(*log.borrow(), vec!["in", "out", "in"]);

        dom.focus(&field);
        log.borrow_mut().clear();
        dom.append_child(&body, &panel).unwrap();
        assert_eq!(*log.borrow(), vec!["out"]);
        assert_eq!(dom.focused(), None);

        dom.focus(&field);
        dom.detach(&other);
        assert_eq!(dom.focused(), Some(field));
        dom.detach(&panel);
        assert_eq!(dom.focused(), None);
        assert!(dom.dispatched().is_empty());
    }

    #[test]
    fn test_timers_run_in_order_and_cancel_on_drop() {
        let dom = MemoryDom::new();
        let log = Rc::new(RefCell::new(Vec::new()));

        let l = Rc::clone(&log);
        let _late = dom.set_timeout(300, Box::new(move || l.borrow_mut().push("late")));
        let l = Rc::clone(&log);
        let _early = dom.set_timeout(100, Box::new(move || l.borrow_mut().push("early")));
        let l = Rc::clone(&log);
        let cancelled = dom.set_timeout(50, Box::new(move || l.borrow_mut().push("cancelled")));
        drop(cancelled);

        dom.advance(99);
        assert!(log.borrow().is_empty());
        dom.advance(1);
        assert_eq!(*log.borrow(), vec!["early"]);
        dom.advance(1000);
        assert_eq!(*log.borrow(), vec!["early", "late"]);
        assert_eq!(dom.now(), 1100);
        assert_eq!(dom.pending_timers(), 0);
    }
}
