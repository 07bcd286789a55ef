//! JavaScript surface.
//!
//! ```js
//! const modal = new ApFullscreenModal(element, { animationDuration: 300, onBeforeOpen: () => false });
//! modal.call("open");
//! ```

use crate::modal::{EventContext, FullscreenModal, Handler, ModalError, ModalOptions, ModalRegistry};
use crate::shared::dom::WebDom;
use js_sys::{Array, Function, Object, Reflect};
use modal_contracts::{
    LifecycleEvent, ModalMethod, ModalSettings, OptionKey, OptionValue, SettingsPatch, Verdict,
};
use serde::Serialize;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::Element;

thread_local! {
    static REGISTRY: ModalRegistry<WebDom> = ModalRegistry::new(WebDom::new());
}

fn to_js(e: ModalError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(Into::into)
}

/// Wraps a JS callback; it runs with the content element as `this`, and
/// returning `false` cancels a before-event.
fn js_handler(function: Function, this: Element) -> Handler {
    Rc::new(move |ctx: &EventContext<'_>| {
        let arg = ctx.css.map_or(JsValue::UNDEFINED, JsValue::from_str);
        match function.call1(&this, &arg) {
            Ok(result) if result.as_bool() == Some(false) => Verdict::Cancel,
            Ok(_) => Verdict::Proceed,
            Err(e) => {
                log::warn!("{} threw: {:?}", ctx.event.callback_name(), e);
                Verdict::Proceed
            }
        }
    })
}

type Callbacks = Vec<(LifecycleEvent, Handler)>;

/// Splits a JS options object into data settings and `on<Event>` callbacks.
///
/// Unknown keys and `undefined` values are skipped, so a partial options
/// object only touches what it names.
fn split_options(content: &Element, options: &JsValue) -> Result<(SettingsPatch, Callbacks), JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok((SettingsPatch::default(), Vec::new()));
    }
    let object: &Object = options
        .dyn_ref()
        .ok_or_else(|| JsValue::from_str("options must be an object"))?;

    let data = Object::new();
    let mut callbacks = Vec::new();
    for key in Object::keys(object).iter() {
        let Some(name) = key.as_string() else {
            continue;
        };
        let value = Reflect::get(object, &key)?;
        // An undefined value leaves the option as it was.
        if value.is_undefined() {
            continue;
        }
        if let Some(event) = LifecycleEvent::from_callback_name(&name) {
            match value.dyn_into::<Function>() {
                Ok(function) => callbacks.push((event, js_handler(function, content.clone()))),
                Err(_) => log::warn!("{name} is not a function; ignored"),
            }
        } else if name.parse::<OptionKey>().is_ok() {
            Reflect::set(&data, &key, &value)?;
        } else {
            log::warn!("unknown option `{name}` ignored");
        }
    }

    let patch: SettingsPatch = serde_wasm_bindgen::from_value(data.into())?;
    Ok((patch, callbacks))
}

#[wasm_bindgen(js_name = ApFullscreenModal)]
pub struct JsFullscreenModal {
    modal: FullscreenModal<WebDom>,
}

#[wasm_bindgen(js_class = ApFullscreenModal)]
impl JsFullscreenModal {
    /// Binds `element`; an element that is already bound keeps its modal and options.
    #[wasm_bindgen(constructor)]
    pub fn new(element: Element, options: JsValue) -> Result<JsFullscreenModal, JsValue> {
        let (patch, callbacks) = split_options(&element, &options)?;
        let mut modal_options = ModalOptions::new(ModalSettings::default().with_patch(patch));
        for (event, handler) in callbacks {
            modal_options.handlers.set_handler(event, handler);
        }
        let modal = REGISTRY
            .with(|registry| registry.bind(&element, modal_options))
            .map_err(to_js)?;
        Ok(Self { modal })
    }

    /// The modal bound to `element`, if any.
    #[wasm_bindgen(js_name = forElement)]
    pub fn for_element(element: &Element) -> Option<JsFullscreenModal> {
        REGISTRY
            .with(|registry| registry.get(element))
            .map(|modal| Self { modal })
    }

    pub fn open(&self) -> Result<(), JsValue> {
        self.modal.open().map(|_| ()).map_err(to_js)
    }

    pub fn close(&self) -> Result<(), JsValue> {
        self.modal.close().map(|_| ()).map_err(to_js)
    }

    #[wasm_bindgen(js_name = isOpen)]
    pub fn is_open(&self) -> bool {
        self.modal.is_open()
    }

    /// `option()` reads all settings, `option(key)` one, `option(key, value)`
    /// and `option({...})` write.
    pub fn option(&self, key: JsValue, value: JsValue) -> Result<JsValue, JsValue> {
        if key.is_undefined() || key.is_null() {
            return to_js_value(&self.modal.settings().map_err(to_js)?);
        }

        let Some(name) = key.as_string() else {
            let (patch, callbacks) = split_options(&self.modal.content(), &key)?;
            for (event, handler) in callbacks {
                self.modal.set_handler(event, handler).map_err(to_js)?;
            }
            self.modal.set_options(patch).map_err(to_js)?;
            return Ok(JsValue::UNDEFINED);
        };

        if value.is_undefined() {
            return match self.modal.option(&name).map_err(to_js)? {
                Some(value) => to_js_value(&value),
                None => Ok(JsValue::NULL),
            };
        }

        if let Some(event) = LifecycleEvent::from_callback_name(&name) {
            let result = match value.dyn_into::<Function>() {
                Ok(function) => self
                    .modal
                    .set_handler(event, js_handler(function, self.modal.content())),
                Err(_) => self.modal.off(event),
            };
            result.map_err(to_js)?;
            return Ok(JsValue::UNDEFINED);
        }

        let value: OptionValue = serde_wasm_bindgen::from_value(value)?;
        self.modal.set_option(&name, value).map_err(to_js)?;
        Ok(JsValue::UNDEFINED)
    }

    pub fn destroy(&self) -> Result<(), JsValue> {
        self.modal.destroy().map_err(to_js)
    }

    /// Name-based dispatch. Private (`_`-prefixed) and unknown names are
    /// ignored and yield `undefined`.
    pub fn call(&self, method: &str, args: Array) -> JsValue {
        let method = match method.parse::<ModalMethod>() {
            Ok(method) => method,
            Err(e) => {
                log::warn!("{}", ModalError::from(e));
                return JsValue::UNDEFINED;
            }
        };
        let result = match method {
            ModalMethod::Open => self.open().map(|_| JsValue::UNDEFINED),
            ModalMethod::Close => self.close().map(|_| JsValue::UNDEFINED),
            ModalMethod::IsOpen => Ok(JsValue::from_bool(self.is_open())),
            ModalMethod::Option => self.option(args.get(0), args.get(1)),
            ModalMethod::Destroy => self.destroy().map(|_| JsValue::UNDEFINED),
        };
        result.unwrap_or_else(|e| {
            log::warn!("{} failed: {:?}", method.as_str(), e);
            JsValue::UNDEFINED
        })
    }
}
