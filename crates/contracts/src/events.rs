use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed set of lifecycle moments a modal reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleEvent {
    BeforeOpen,
    Open,
    BeforeClose,
    Close,
    Destroy,
    UpdateHeadCss,
    RemoveHeadCss,
}

impl LifecycleEvent {
    pub const ALL: [LifecycleEvent; 7] = [
        LifecycleEvent::BeforeOpen,
        LifecycleEvent::Open,
        LifecycleEvent::BeforeClose,
        LifecycleEvent::Close,
        LifecycleEvent::Destroy,
        LifecycleEvent::UpdateHeadCss,
        LifecycleEvent::RemoveHeadCss,
    ];

    /// Option key of the callback slot, e.g. `onBeforeOpen`.
    pub fn callback_name(&self) -> &'static str {
        match self {
            LifecycleEvent::BeforeOpen => "onBeforeOpen",
            LifecycleEvent::Open => "onOpen",
            LifecycleEvent::BeforeClose => "onBeforeClose",
            LifecycleEvent::Close => "onClose",
            LifecycleEvent::Destroy => "onDestroy",
            LifecycleEvent::UpdateHeadCss => "onUpdateHeadCss",
            LifecycleEvent::RemoveHeadCss => "onRemoveHeadCss",
        }
    }

    /// Namespaced DOM event type, e.g. `apfmBeforeOpen`.
    pub fn dom_event_name(&self) -> &'static str {
        match self {
            LifecycleEvent::BeforeOpen => "apfmBeforeOpen",
            LifecycleEvent::Open => "apfmOpen",
            LifecycleEvent::BeforeClose => "apfmBeforeClose",
            LifecycleEvent::Close => "apfmClose",
            LifecycleEvent::Destroy => "apfmDestroy",
            LifecycleEvent::UpdateHeadCss => "apfmUpdateHeadCss",
            LifecycleEvent::RemoveHeadCss => "apfmRemoveHeadCss",
        }
    }

    /// Only the `before-*` events can veto a transition.
    pub fn is_cancellable(&self) -> bool {
        matches!(self, LifecycleEvent::BeforeOpen | LifecycleEvent::BeforeClose)
    }

    pub fn from_callback_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.callback_name() == name)
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dom_event_name())
    }
}

/// Outcome of running the handlers of one lifecycle event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Verdict {
    #[default]
    Proceed,
    Cancel,
}

impl Verdict {
    pub fn is_cancel(&self) -> bool {
        *self == Verdict::Cancel
    }

    /// `Cancel` wins over `Proceed`.
    pub fn and(self, other: Verdict) -> Verdict {
        if self.is_cancel() || other.is_cancel() {
            Verdict::Cancel
        } else {
            Verdict::Proceed
        }
    }
}

impl From<bool> for Verdict {
    /// `false` cancels, mirroring a handler that returns `false`.
    fn from(proceed: bool) -> Self {
        if proceed {
            Verdict::Proceed
        } else {
            Verdict::Cancel
        }
    }
}
