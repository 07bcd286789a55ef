//! Turns an existing element into a fullscreen modal overlay.
//!
//! [`ModalRegistry`] binds content nodes to [`FullscreenModal`] instances over
//! any [`DomHost`]; in the browser the `ApFullscreenModal` class exported by
//! `bindings` does the same through `web-sys`.

pub mod modal;
pub mod shared;

#[cfg(target_arch = "wasm32")]
pub mod bindings;

pub use modal::{
    CallOutput, EventContext, FullscreenModal, HandlerTable, ModalError, ModalOptions,
    ModalRegistry, Phase, Transition,
};
pub use modal_contracts::{LifecycleEvent, ModalSettings, OptionValue, SettingsPatch, Verdict};
pub use shared::dom::{DomHost, MemoryDom};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::wasm_bindgen;

#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() {
    // initializes logging using the `log` crate
    _ = console_log::init_with_level(log::Level::Debug);
    console_error_panic_hook::set_once();
}
