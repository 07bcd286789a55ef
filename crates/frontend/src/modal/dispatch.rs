//! Name-based method calls, the way page scripts address a bound element.

use super::controller::{FullscreenModal, ModalError};
use super::registry::ModalRegistry;
use crate::shared::dom::DomHost;
use modal_contracts::{ModalMethod, ModalSettings, OptionValue};

#[derive(Debug, Clone, PartialEq)]
pub enum CallOutput {
    Nothing,
    Bool(bool),
    Value(OptionValue),
    Settings(ModalSettings),
}

impl<H: DomHost> FullscreenModal<H> {
    /// Calls a public method by name.
    ///
    /// `option` takes `[]`, `[key]` or `[key, value]`.
    pub fn invoke(&self, method: &str, args: &[OptionValue]) -> Result<CallOutput, ModalError> {
        match method.parse::<ModalMethod>()? {
            ModalMethod::Open => self.open().map(|_| CallOutput::Nothing),
            ModalMethod::Close => self.close().map(|_| CallOutput::Nothing),
            ModalMethod::IsOpen => Ok(CallOutput::Bool(self.is_open())),
            ModalMethod::Destroy => self.destroy().map(|_| CallOutput::Nothing),
            ModalMethod::Option => match args {
                [] => self.settings().map(CallOutput::Settings),
                [OptionValue::Text(key)] => Ok(CallOutput::Value(
                    self.option(key)?.unwrap_or(OptionValue::Null),
                )),
                [OptionValue::Text(key), value] => self
                    .set_option(key, value.clone())
                    .map(|_| CallOutput::Nothing),
                _ => Err(ModalError::InvalidArguments(ModalMethod::Option.as_str())),
            },
        }
    }
}

impl<H: DomHost> ModalRegistry<H> {
    /// Calls `method` on the modal bound to `content`; `None` when nothing is bound.
    pub fn invoke(
        &self,
        content: &H::Node,
        method: &str,
        args: &[OptionValue],
    ) -> Option<Result<CallOutput, ModalError>> {
        self.get(content).map(|modal| modal.invoke(method, args))
    }
}
