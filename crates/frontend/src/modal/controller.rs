//! Modal controller: moves a content node into a fullscreen overlay and drives
//! the open/close state machine.
//!
//! Logical states are closed and open. `Opening` and `Closing` only mark the
//! window in which an animation class is set and one timer is pending; every
//! transition settles that timer first, so classes never leak across calls.

use super::handlers::{EventContext, Handler, HandlerTable, ModalOptions};
use super::registry::RegistryShared;
use crate::shared::dom::{DomError, DomEvent, DomHost, EventFlow, ListenerKind};
use modal_contracts::markup::{
    self, CLEARFIX_CLASS, CLOSE_BUTTON_CLASS, CLOSING_CLASS, CONTAINER_CLASS,
    DEFAULT_CLOSE_CLASS, OPENING_CLASS, OPEN_CLASS, PLACEHOLDER_CLASS, WRAPPER_CLASS,
};
use modal_contracts::{
    LifecycleEvent, MethodError, ModalSettings, OptionKey, OptionValue, SettingsError,
    SettingsPatch, Verdict,
};
use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModalError {
    #[error("modal has been destroyed")]
    Destroyed,
    #[error(transparent)]
    Dom(#[from] DomError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Method(#[from] MethodError),
    #[error("invalid arguments for {0}")]
    InvalidArguments(&'static str),
}

/// Result of an `open()`/`close()` request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Started,
    /// Already in (or moving to) the requested state.
    Unchanged,
    /// A before-handler vetoed it.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Closed,
    Opening,
    Open,
    Closing,
}

impl Phase {
    /// True from a successful `open()` until the close animation ends.
    pub fn is_shown(&self) -> bool {
        !matches!(self, Phase::Closed)
    }
}

#[derive(Clone)]
struct Nodes<N> {
    content: N,
    container: N,
    wrapper: N,
    close_button: N,
    placeholder: N,
}

struct ModalState<H: DomHost> {
    host: H,
    registry: Weak<RegistryShared<H>>,
    container_id: String,
    nodes: Nodes<H::Node>,
    settings: ModalSettings,
    handlers: HandlerTable,
    head_css: Option<H::Node>,
    listeners: Vec<H::Listener>,
    timer: Option<H::Timer>,
    phase: Phase,
    destroyed: bool,
}

impl<H: DomHost> ModalState<H> {
    fn acquire_root(&self) -> Result<(), DomError> {
        match self.registry.upgrade() {
            Some(registry) => registry.acquire_root(&self.host),
            None => self.host.add_class(&self.host.root()?, OPEN_CLASS),
        }
    }

    fn release_root(&self) -> Result<(), DomError> {
        match self.registry.upgrade() {
            Some(registry) => registry.release_root(&self.host),
            None => self.host.remove_class(&self.host.root()?, OPEN_CLASS),
        }
    }

    fn warn(&self, what: &str, result: Result<(), DomError>) {
        warn_dom(&self.container_id, what, result);
    }
}

fn warn_dom(container_id: &str, what: &str, result: Result<(), DomError>) {
    if let Err(e) = result {
        log::warn!("{container_id}: {what} failed: {e}");
    }
}

/// Handle to one bound modal; clones refer to the same instance.
pub struct FullscreenModal<H: DomHost> {
    state: Rc<RefCell<ModalState<H>>>,
}

impl<H: DomHost> Clone for FullscreenModal<H> {
    fn clone(&self) -> Self {
        Self {
            state: Rc::clone(&self.state),
        }
    }
}

impl<H: DomHost> fmt::Debug for FullscreenModal<H> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("FullscreenModal")
            .field("container_id", &state.container_id)
            .field("phase", &state.phase)
            .field("destroyed", &state.destroyed)
            .finish()
    }
}

type WeakState<H> = Weak<RefCell<ModalState<H>>>;

fn upgrade<H: DomHost>(weak: &WeakState<H>) -> Option<FullscreenModal<H>> {
    weak.upgrade().map(|state| FullscreenModal { state })
}

fn report(action: &str, result: Result<Transition, ModalError>) {
    match result {
        Ok(transition) => log::debug!("{action} -> {transition:?}"),
        Err(e) => log::warn!("{action} ignored: {e}"),
    }
}

impl<H: DomHost> FullscreenModal<H> {
    /// Builds the overlay markup and relocates `content` into it.
    ///
    /// Events, listeners and auto-open happen in [`Self::start`], once the
    /// registry knows the instance.
    pub(crate) fn build(
        host: H,
        registry: Weak<RegistryShared<H>>,
        content: &H::Node,
        options: ModalOptions,
        index: u64,
    ) -> Result<Self, ModalError> {
        let ModalOptions { settings, handlers } = options;
        let container_id = markup::container_id(index);

        let container = host.create_element("div")?;
        host.add_class(&container, CONTAINER_CLASS)?;
        host.set_attribute(&container, "id", &container_id)?;
        host.set_style(&container, "background-color", &settings.background_color)?;

        let wrapper = host.create_element("div")?;
        host.add_class(&wrapper, WRAPPER_CLASS)?;
        host.add_class(&wrapper, CLEARFIX_CLASS)?;

        let close_button = host.create_element("div")?;
        host.add_class(&close_button, CLOSE_BUTTON_CLASS)?;
        host.add_class(&close_button, DEFAULT_CLOSE_CLASS)?;
        if !settings.show_close_button {
            host.set_style(&close_button, "display", "none")?;
        }

        host.append_child(&wrapper, &close_button)?;
        host.append_child(&container, &wrapper)?;
        host.append_child(&host.body()?, &container)?;

        // Marks the original position so destroy() can put the content back.
        let placeholder = host.create_element("div")?;
        host.add_class(&placeholder, PLACEHOLDER_CLASS)?;
        host.insert_after(content, &placeholder)?;
        host.append_child(&wrapper, content)?;
        host.set_attribute(content, "tabindex", "-1")?;

        log::debug!("{container_id}: bound");

        Ok(Self {
            state: Rc::new(RefCell::new(ModalState {
                host,
                registry,
                container_id,
                nodes: Nodes {
                    content: content.clone(),
                    container,
                    wrapper,
                    close_button,
                    placeholder,
                },
                settings,
                handlers,
                head_css: None,
                listeners: Vec::new(),
                timer: None,
                phase: Phase::Closed,
                destroyed: false,
            })),
        })
    }

    pub(crate) fn start(&self) -> Result<(), ModalError> {
        self.update_head_css()?;
        self.bind_listeners()?;
        if self.state.borrow().settings.auto_open {
            self.open()?;
        }
        Ok(())
    }

    pub fn same_instance(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }

    pub fn container_id(&self) -> String {
        self.state.borrow().container_id.clone()
    }

    pub fn content(&self) -> H::Node {
        self.state.borrow().nodes.content.clone()
    }

    pub fn container(&self) -> H::Node {
        self.state.borrow().nodes.container.clone()
    }

    pub fn wrapper(&self) -> H::Node {
        self.state.borrow().nodes.wrapper.clone()
    }

    pub fn close_button(&self) -> H::Node {
        self.state.borrow().nodes.close_button.clone()
    }

    pub fn placeholder(&self) -> H::Node {
        self.state.borrow().nodes.placeholder.clone()
    }

    /// The injected transition `<style>` node, if any.
    pub fn head_css(&self) -> Option<H::Node> {
        self.state.borrow().head_css.clone()
    }

    pub fn phase(&self) -> Phase {
        self.state.borrow().phase
    }

    pub fn is_open(&self) -> bool {
        self.phase().is_shown()
    }

    pub fn is_destroyed(&self) -> bool {
        self.state.borrow().destroyed
    }

    fn ensure_alive(&self) -> Result<(), ModalError> {
        if self.is_destroyed() {
            Err(ModalError::Destroyed)
        } else {
            Ok(())
        }
    }

    /// Runs the callback then the DOM event for `event`.
    ///
    /// No borrow is held while either runs, so handlers may call back into the modal.
    fn emit(&self, event: LifecycleEvent, css: Option<&str>) -> Verdict {
        let (host, content, handler) = {
            let state = self.state.borrow();
            (
                state.host.clone(),
                state.nodes.content.clone(),
                state.handlers.get(event),
            )
        };
        let callback = handler.map_or(Verdict::Proceed, |handler| {
            handler(&EventContext { event, css })
        });
        let dom = Verdict::from(host.dispatch(&content, event.dom_event_name(), css));
        if event.is_cancellable() {
            callback.and(dom)
        } else {
            Verdict::Proceed
        }
    }

    pub fn open(&self) -> Result<Transition, ModalError> {
        self.ensure_alive()?;
        if matches!(self.phase(), Phase::Opening | Phase::Open) {
            return Ok(Transition::Unchanged);
        }
        if self.emit(LifecycleEvent::BeforeOpen, None).is_cancel() {
            log::debug!("{}: open cancelled", self.container_id());
            return Ok(Transition::Cancelled);
        }

        // Focus runs page listeners synchronously, so it happens after the borrow ends.
        let (host, container, content) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            if state.destroyed {
                return Err(ModalError::Destroyed);
            }
            let host = state.host.clone();
            let container = state.nodes.container.clone();
            match state.phase {
                Phase::Opening | Phase::Open => return Ok(Transition::Unchanged),
                Phase::Closing => {
                    // Reverse a running close; the root class is still held.
                    state.timer = None;
                    state.warn("remove closing class", host.remove_class(&container, CLOSING_CLASS));
                }
                Phase::Closed => {
                    state.warn("mark document open", state.acquire_root());
                }
            }

            state.warn("add open class", host.add_class(&container, OPEN_CLASS));
            state.warn("add opening class", host.add_class(&container, OPENING_CLASS));
            state.phase = Phase::Opening;

            let weak = Rc::downgrade(&self.state);
            state.timer = Some(host.set_timeout(
                state.settings.animation_duration,
                Box::new(move || {
                    if let Some(modal) = upgrade(&weak) {
                        modal.finish_opening();
                    }
                }),
            ));
            log::debug!("{}: opening", state.container_id);
            (host, container, state.nodes.content.clone())
        };
        host.scroll_to_top(&container);
        host.focus(&content);

        self.emit(LifecycleEvent::Open, None);
        Ok(Transition::Started)
    }

    fn finish_opening(&self) {
        let mut state = self.state.borrow_mut();
        if state.destroyed || state.phase != Phase::Opening {
            return;
        }
        let result = state.host.remove_class(&state.nodes.container, OPENING_CLASS);
        state.warn("remove opening class", result);
        state.phase = Phase::Open;
        log::debug!("{}: open", state.container_id);
    }

    pub fn close(&self) -> Result<Transition, ModalError> {
        self.ensure_alive()?;
        if matches!(self.phase(), Phase::Closed | Phase::Closing) {
            return Ok(Transition::Unchanged);
        }
        if self.emit(LifecycleEvent::BeforeClose, None).is_cancel() {
            log::debug!("{}: close cancelled", self.container_id());
            return Ok(Transition::Cancelled);
        }

        {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            if state.destroyed {
                return Err(ModalError::Destroyed);
            }
            let host = state.host.clone();
            let container = state.nodes.container.clone();
            match state.phase {
                Phase::Closed | Phase::Closing => return Ok(Transition::Unchanged),
                Phase::Opening => {
                    state.timer = None;
                    state.warn("remove opening class", host.remove_class(&container, OPENING_CLASS));
                }
                Phase::Open => {}
            }

            state.warn("add closing class", host.add_class(&container, CLOSING_CLASS));
            state.warn("remove open class", host.remove_class(&container, OPEN_CLASS));
            state.phase = Phase::Closing;

            let weak = Rc::downgrade(&self.state);
            state.timer = Some(host.set_timeout(
                state.settings.animation_duration,
                Box::new(move || {
                    if let Some(modal) = upgrade(&weak) {
                        modal.finish_closing();
                    }
                }),
            ));
            log::debug!("{}: closing", state.container_id);
        }

        self.emit(LifecycleEvent::Close, None);
        Ok(Transition::Started)
    }

    fn finish_closing(&self) {
        let mut state = self.state.borrow_mut();
        if state.destroyed || state.phase != Phase::Closing {
            return;
        }
        let result = state.host.remove_class(&state.nodes.container, CLOSING_CLASS);
        state.warn("remove closing class", result);
        state.warn("mark document closed", state.release_root());
        state.phase = Phase::Closed;
        log::debug!("{}: closed", state.container_id);
    }

    /// Cancels the pending timer and strips every state class at once.
    ///
    /// Returns whether the modal was shown.
    fn force_closed(&self) -> bool {
        let mut guard = self.state.borrow_mut();
        let state = &mut *guard;
        state.timer = None;
        if !state.phase.is_shown() {
            return false;
        }
        let host = state.host.clone();
        for class in [OPEN_CLASS, OPENING_CLASS, CLOSING_CLASS] {
            state.warn("remove state class", host.remove_class(&state.nodes.container, class));
        }
        state.warn("mark document closed", state.release_root());
        state.phase = Phase::Closed;
        true
    }

    /// Tears the instance down and restores the content to its original place.
    pub fn destroy(&self) -> Result<(), ModalError> {
        self.ensure_alive()?;
        self.emit(LifecycleEvent::Destroy, None);
        if self.is_destroyed() {
            return Ok(());
        }

        if self.force_closed() {
            self.emit(LifecycleEvent::Close, None);
            if self.is_destroyed() {
                return Ok(());
            }
            // A close handler may have reopened it.
            self.force_closed();
        }

        let listeners = std::mem::take(&mut self.state.borrow_mut().listeners);
        drop(listeners);

        self.remove_head_css();
        if self.is_destroyed() {
            return Ok(());
        }

        // Marked destroyed before the tree moves: moving focused content fires
        // focusout listeners, which must see a finished instance.
        let (host, container_id, nodes, registry, handlers) = {
            let mut guard = self.state.borrow_mut();
            let state = &mut *guard;
            state.destroyed = true;
            (
                state.host.clone(),
                state.container_id.clone(),
                state.nodes.clone(),
                state.registry.clone(),
                std::mem::take(&mut state.handlers),
            )
        };
        // Handlers may hold clones of this handle.
        drop(handlers);

        warn_dom(
            &container_id,
            "restore content",
            host.insert_after(&nodes.placeholder, &nodes.content),
        );
        host.detach(&nodes.placeholder);
        warn_dom(
            &container_id,
            "remove tabindex",
            host.remove_attribute(&nodes.content, "tabindex"),
        );
        host.detach(&nodes.container);
        log::debug!("{container_id}: destroyed");

        if let Some(registry) = registry.upgrade() {
            registry.unregister(self);
        }
        Ok(())
    }

    fn update_head_css(&self) -> Result<(), ModalError> {
        self.remove_head_css();
        let (host, css) = {
            let state = self.state.borrow();
            (
                state.host.clone(),
                markup::transition_css(&state.container_id, state.settings.animation_duration),
            )
        };
        let style = host.create_element("style")?;
        host.set_attribute(&style, "type", "text/css")?;
        host.set_text(&style, &css)?;
        host.append_child(&host.head()?, &style)?;
        self.state.borrow_mut().head_css = Some(style);

        self.emit(LifecycleEvent::UpdateHeadCss, Some(&css));
        Ok(())
    }

    fn remove_head_css(&self) {
        let (host, style) = {
            let mut state = self.state.borrow_mut();
            (state.host.clone(), state.head_css.take())
        };
        if let Some(style) = style {
            host.detach(&style);
            self.emit(LifecycleEvent::RemoveHeadCss, None);
        }
    }

    fn bind_listeners(&self) -> Result<(), ModalError> {
        let (host, content, container, open_selector, close_selector) = {
            let state = self.state.borrow();
            (
                state.host.clone(),
                state.nodes.content.clone(),
                state.nodes.container.clone(),
                state.settings.open_selector.clone(),
                state.settings.close_selector.clone(),
            )
        };
        let mut listeners = Vec::new();

        if let Some(selector) = open_selector {
            for trigger in host.query_all(&selector)? {
                let weak = Rc::downgrade(&self.state);
                listeners.push(host.listen(
                    &trigger,
                    ListenerKind::Click,
                    Box::new(move |_: &DomEvent<H::Node>| {
                        if let Some(modal) = upgrade(&weak) {
                            report("open", modal.open());
                        }
                        EventFlow::Consume
                    }),
                )?);
            }
        }

        if let Some(selector) = close_selector {
            // Fail at bind time rather than on every click.
            host.query_all(&selector)?;
            let weak = Rc::downgrade(&self.state);
            let lookup = host.clone();
            let boundary = container.clone();
            listeners.push(host.listen(
                &container,
                ListenerKind::Click,
                Box::new(move |event: &DomEvent<H::Node>| {
                    match lookup.closest_within(&event.target, &selector, &boundary) {
                        Ok(Some(_)) => {
                            if let Some(modal) = upgrade(&weak) {
                                report("close", modal.close());
                            }
                            EventFlow::Consume
                        }
                        Ok(None) => EventFlow::Continue,
                        Err(e) => {
                            log::warn!("close selector: {e}");
                            EventFlow::Continue
                        }
                    }
                }),
            )?);
        }

        let weak = Rc::downgrade(&self.state);
        listeners.push(host.listen(
            &content,
            ListenerKind::KeyDown,
            Box::new(move |event: &DomEvent<H::Node>| {
                let Some(modal) = upgrade(&weak) else {
                    return EventFlow::Continue;
                };
                // Shortcuts are inactive while closed.
                if !modal.is_open() || event.key.as_deref() != Some("Escape") {
                    return EventFlow::Continue;
                }
                report("close", modal.close());
                EventFlow::PreventDefault
            }),
        )?);

        self.state.borrow_mut().listeners = listeners;
        Ok(())
    }

    /// Copy of the current settings.
    pub fn settings(&self) -> Result<ModalSettings, ModalError> {
        self.ensure_alive()?;
        Ok(self.state.borrow().settings.clone())
    }

    /// One setting by its option name; unknown names read as `None`.
    pub fn option(&self, key: &str) -> Result<Option<OptionValue>, ModalError> {
        self.ensure_alive()?;
        Ok(key
            .parse::<OptionKey>()
            .ok()
            .map(|key| self.state.borrow().settings.get(key)))
    }

    pub fn set_option(&self, key: &str, value: impl Into<OptionValue>) -> Result<(), ModalError> {
        self.ensure_alive()?;
        let key: OptionKey = key.parse()?;
        let value = value.into();
        self.change_settings(|settings| settings.set(key, value))
    }

    pub fn set_options(&self, patch: SettingsPatch) -> Result<(), ModalError> {
        self.ensure_alive()?;
        if patch.is_empty() {
            return Ok(());
        }
        log::debug!("{}: set {:?}", self.container_id(), patch.keys());
        self.change_settings(|settings| {
            settings.apply(patch);
            Ok(())
        })
    }

    /// Applies `change`, then refreshes what derives from the settings.
    ///
    /// Only the transition stylesheet is rebuilt; markup and listeners keep
    /// the values they were bound with.
    fn change_settings<F>(&self, change: F) -> Result<(), ModalError>
    where
        F: FnOnce(&mut ModalSettings) -> Result<(), SettingsError>,
    {
        let duration_changed = {
            let mut state = self.state.borrow_mut();
            let before = state.settings.animation_duration;
            change(&mut state.settings)?;
            state.settings.animation_duration != before
        };
        if duration_changed {
            self.update_head_css()?;
        }
        Ok(())
    }

    /// Sets the `on<Event>` callback for `event`, replacing any previous one.
    pub fn on<F>(&self, event: LifecycleEvent, handler: F) -> Result<(), ModalError>
    where
        F: Fn(&EventContext<'_>) -> Verdict + 'static,
    {
        self.set_handler(event, Rc::new(handler))
    }

    pub fn set_handler(&self, event: LifecycleEvent, handler: Handler) -> Result<(), ModalError> {
        self.ensure_alive()?;
        let previous = {
            let mut state = self.state.borrow_mut();
            let previous = state.handlers.remove(event);
            state.handlers.set_handler(event, handler);
            previous
        };
        drop(previous);
        Ok(())
    }

    pub fn off(&self, event: LifecycleEvent) -> Result<(), ModalError> {
        self.ensure_alive()?;
        let removed = self.state.borrow_mut().handlers.remove(event);
        drop(removed);
        Ok(())
    }
}
