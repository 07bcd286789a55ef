pub mod controller;
pub mod dispatch;
pub mod handlers;
pub mod registry;

pub use controller::{FullscreenModal, ModalError, Phase, Transition};
pub use dispatch::CallOutput;
pub use handlers::{EventContext, Handler, HandlerTable, ModalOptions};
pub use registry::ModalRegistry;
