//! Host-independent data of the fullscreen modal: settings, lifecycle events,
//! method names and generated markup.

pub mod events;
pub mod markup;
pub mod methods;
pub mod settings;

pub use events::{LifecycleEvent, Verdict};
pub use methods::{MethodError, ModalMethod};
pub use settings::{ModalSettings, OptionKey, OptionValue, SettingsError, SettingsPatch};
