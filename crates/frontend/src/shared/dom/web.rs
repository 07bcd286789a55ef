//! Browser host backed by `web-sys`.

use super::{DomError, DomEvent, DomHandler, DomHost, ListenerKind};
use gloo_timers::callback::Timeout;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CustomEvent, CustomEventInit, Document, Element, HtmlElement, KeyboardEvent};

fn js_error(value: JsValue) -> DomError {
    DomError::Js(value.as_string().unwrap_or_else(|| format!("{value:?}")))
}

#[derive(Clone, Default)]
pub struct WebDom;

impl WebDom {
    pub fn new() -> Self {
        Self
    }

    fn document(&self) -> Result<Document, DomError> {
        web_sys::window()
            .and_then(|w| w.document())
            .ok_or(DomError::NoDocument)
    }
}

/// Event listener bound through `addEventListener`; removed on drop.
pub struct WebListener {
    target: Element,
    kind: &'static str,
    closure: Closure<dyn FnMut(web_sys::Event)>,
}

impl Drop for WebListener {
    fn drop(&mut self) {
        let _ = self
            .target
            .remove_event_listener_with_callback(self.kind, self.closure.as_ref().unchecked_ref());
    }
}

impl DomHost for WebDom {
    type Node = Element;
    type Listener = WebListener;
    type Timer = Timeout;

    fn body(&self) -> Result<Element, DomError> {
        self.document()?
            .body()
            .map(Element::from)
            .ok_or(DomError::MissingElement("body"))
    }

    fn head(&self) -> Result<Element, DomError> {
        self.document()?
            .head()
            .map(Element::from)
            .ok_or(DomError::MissingElement("head"))
    }

    fn root(&self) -> Result<Element, DomError> {
        self.document()?
            .document_element()
            .ok_or(DomError::MissingElement("html"))
    }

    fn create_element(&self, tag: &str) -> Result<Element, DomError> {
        self.document()?.create_element(tag).map_err(js_error)
    }

    fn set_attribute(&self, node: &Element, name: &str, value: &str) -> Result<(), DomError> {
        node.set_attribute(name, value).map_err(js_error)
    }

    fn remove_attribute(&self, node: &Element, name: &str) -> Result<(), DomError> {
        node.remove_attribute(name).map_err(js_error)
    }

    fn attribute(&self, node: &Element, name: &str) -> Option<String> {
        node.get_attribute(name)
    }

    fn set_style(&self, node: &Element, property: &str, value: &str) -> Result<(), DomError> {
        match node.dyn_ref::<HtmlElement>() {
            Some(element) => element
                .style()
                .set_property(property, value)
                .map_err(js_error),
            None => Err(DomError::Js(format!("<{}> has no inline style", node.tag_name()))),
        }
    }

    fn set_text(&self, node: &Element, text: &str) -> Result<(), DomError> {
        node.set_text_content(Some(text));
        Ok(())
    }

    fn add_class(&self, node: &Element, class: &str) -> Result<(), DomError> {
        node.class_list().add_1(class).map_err(js_error)
    }

    fn remove_class(&self, node: &Element, class: &str) -> Result<(), DomError> {
        node.class_list().remove_1(class).map_err(js_error)
    }

    fn has_class(&self, node: &Element, class: &str) -> bool {
        node.class_list().contains(class)
    }

    fn append_child(&self, parent: &Element, child: &Element) -> Result<(), DomError> {
        parent.append_child(child).map(|_| ()).map_err(js_error)
    }

    fn insert_after(&self, reference: &Element, node: &Element) -> Result<(), DomError> {
        reference.after_with_node_1(node).map_err(js_error)
    }

    fn detach(&self, node: &Element) {
        node.remove();
    }

    fn focus(&self, node: &Element) {
        if let Some(element) = node.dyn_ref::<HtmlElement>() {
            if let Err(e) = element.focus() {
                log::warn!("focus failed: {:?}", e);
            }
        }
    }

    fn scroll_to_top(&self, node: &Element) {
        node.set_scroll_top(0);
    }

    fn query_all(&self, selector: &str) -> Result<Vec<Element>, DomError> {
        let list = self
            .document()?
            .query_selector_all(selector)
            .map_err(|_| DomError::InvalidSelector(selector.to_string()))?;
        Ok((0..list.length())
            .filter_map(|i| list.get(i))
            .filter_map(|node| node.dyn_into::<Element>().ok())
            .collect())
    }

    fn closest_within(
        &self,
        target: &Element,
        selector: &str,
        boundary: &Element,
    ) -> Result<Option<Element>, DomError> {
        let found = target
            .closest(selector)
            .map_err(|_| DomError::InvalidSelector(selector.to_string()))?;
        Ok(found.filter(|el| {
            let node: &web_sys::Node = el;
            el != boundary && boundary.contains(Some(node))
        }))
    }

    fn listen(
        &self,
        node: &Element,
        kind: ListenerKind,
        mut handler: DomHandler<Element>,
    ) -> Result<WebListener, DomError> {
        let closure = Closure::wrap(Box::new(move |event: web_sys::Event| {
            let Some(target) = event.target().and_then(|t| t.dyn_into::<Element>().ok()) else {
                return;
            };
            let key = event.dyn_ref::<KeyboardEvent>().map(KeyboardEvent::key);
            let flow = handler(&DomEvent { kind, target, key });
            if flow.prevents_default() {
                event.prevent_default();
            }
            if flow.stops_propagation() {
                event.stop_propagation();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);

        node.add_event_listener_with_callback(kind.as_str(), closure.as_ref().unchecked_ref())
            .map_err(js_error)?;

        Ok(WebListener {
            target: node.clone(),
            kind: kind.as_str(),
            closure,
        })
    }

    fn dispatch(&self, node: &Element, event: &str, detail: Option<&str>) -> bool {
        let init = CustomEventInit::new();
        init.set_bubbles(true);
        init.set_cancelable(true);
        if let Some(detail) = detail {
            init.set_detail(&JsValue::from_str(detail));
        }
        let custom = match CustomEvent::new_with_event_init_dict(event, &init) {
            Ok(custom) => custom,
            Err(e) => {
                log::warn!("cannot create {} event: {:?}", event, e);
                return true;
            }
        };
        node.dispatch_event(&custom).unwrap_or(true)
    }

    fn set_timeout(&self, millis: u32, callback: Box<dyn FnOnce()>) -> Timeout {
        Timeout::new(millis, callback)
    }
}
