use modal_contracts::{LifecycleEvent, ModalSettings, Verdict};
use std::fmt;
use std::rc::Rc;

/// Passed to a lifecycle callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventContext<'a> {
    pub event: LifecycleEvent,
    /// Stylesheet text for `UpdateHeadCss`.
    pub css: Option<&'a str>,
}

pub type Handler = Rc<dyn Fn(&EventContext<'_>) -> Verdict>;

/// One callback slot per lifecycle event.
#[derive(Clone, Default)]
pub struct HandlerTable {
    slots: [Option<Handler>; LifecycleEvent::ALL.len()],
}

fn slot(event: LifecycleEvent) -> usize {
    event as usize
}

impl HandlerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set<F>(&mut self, event: LifecycleEvent, handler: F)
    where
        F: Fn(&EventContext<'_>) -> Verdict + 'static,
    {
        self.slots[slot(event)] = Some(Rc::new(handler));
    }

    pub fn set_handler(&mut self, event: LifecycleEvent, handler: Handler) {
        self.slots[slot(event)] = Some(handler);
    }

    pub fn remove(&mut self, event: LifecycleEvent) -> Option<Handler> {
        self.slots[slot(event)].take()
    }

    pub fn get(&self, event: LifecycleEvent) -> Option<Handler> {
        self.slots[slot(event)].clone()
    }

    pub fn contains(&self, event: LifecycleEvent) -> bool {
        self.slots[slot(event)].is_some()
    }
}

impl fmt::Debug for HandlerTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bound: Vec<_> = LifecycleEvent::ALL
            .into_iter()
            .filter(|e| self.contains(*e))
            .map(|e| e.callback_name())
            .collect();
        f.debug_struct("HandlerTable").field("bound", &bound).finish()
    }
}

/// Settings plus callbacks, as given when binding a node.
#[derive(Clone, Debug, Default)]
pub struct ModalOptions {
    pub settings: ModalSettings,
    pub handlers: HandlerTable,
}

impl ModalOptions {
    pub fn new(settings: ModalSettings) -> Self {
        Self {
            settings,
            handlers: HandlerTable::default(),
        }
    }

    pub fn on<F>(mut self, event: LifecycleEvent, handler: F) -> Self
    where
        F: Fn(&EventContext<'_>) -> Verdict + 'static,
    {
        self.handlers.set(event, handler);
        self
    }
}

impl From<ModalSettings> for ModalOptions {
    fn from(settings: ModalSettings) -> Self {
        Self::new(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots_are_independent() {
        let mut table = HandlerTable::new();
        table.set(LifecycleEvent::BeforeOpen, |_| Verdict::Cancel);
        assert!(table.contains(LifecycleEvent::BeforeOpen));
        assert!(!table.contains(LifecycleEvent::BeforeClose));

        let ctx = EventContext {
            event: LifecycleEvent::BeforeOpen,
            css: None,
        };
        let handler = table.get(LifecycleEvent::BeforeOpen).unwrap();
        assert_eq!(handler(&ctx), Verdict::Cancel);

        assert!(table.remove(LifecycleEvent::BeforeOpen).is_some());
        assert!(table.get(LifecycleEvent::BeforeOpen).is_none());
    }

    #[test]
    fn test_every_event_has_a_slot() {
        let mut table = HandlerTable::new();
        for event in LifecycleEvent::ALL {
            table.set(event, |_| Verdict::Proceed);
        }
        assert!(LifecycleEvent::ALL.into_iter().all(|e| table.contains(e)));
        for event in LifecycleEvent::ALL {
            assert!(table.remove(event).is_some());
        }
        assert!(!LifecycleEvent::ALL.into_iter().any(|e| table.contains(e)));
    }
}
