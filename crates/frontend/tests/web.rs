#![cfg(target_arch = "wasm32")]

use fullscreen_modal::bindings::JsFullscreenModal;
use fullscreen_modal::shared::dom::WebDom;
use fullscreen_modal::{DomHost, ModalRegistry, ModalSettings};
use js_sys::{Array, Function, Object, Reflect};
use wasm_bindgen::JsValue;
use wasm_bindgen_test::*;
use web_sys::Element;

wasm_bindgen_test_configure!(run_in_browser);

fn attached_div(id: &str) -> Element {
    let dom = WebDom::new();
    let content = dom.create_element("div").unwrap();
    dom.set_attribute(&content, "id", id).unwrap();
    dom.append_child(&dom.body().unwrap(), &content).unwrap();
    content
}

fn options(entries: &[(&str, JsValue)]) -> JsValue {
    let object = Object::new();
    for (key, value) in entries {
        Reflect::set(&object, &JsValue::from_str(key), value).unwrap();
    }
    object.into()
}

fn no_args() -> Array {
    Array::new()
}

#[wasm_bindgen_test]
fn test_bind_open_destroy_in_browser() {
    let dom = WebDom::new();
    let content = attached_div("browser-dialog");

    let registry = ModalRegistry::new(dom.clone());
    let modal = registry.bind(&content, ModalSettings::default()).unwrap();
    assert!(dom.has_class(&modal.container(), "apfm-container"));
    assert!(modal.head_css().is_some());

    modal.open().unwrap();
    assert!(modal.is_open());
    assert!(dom.has_class(&dom.root().unwrap(), "apfm-open"));

    modal.destroy().unwrap();
    assert!(!dom.has_class(&dom.root().unwrap(), "apfm-open"));
    assert!(modal.head_css().is_none());
    assert!(registry.is_empty());
    dom.detach(&content);
}

#[wasm_bindgen_test]
fn test_callback_returning_false_cancels_open() {
    let content = attached_div("js-veto");
    let veto = Function::new_no_args("return false;");
    let modal = JsFullscreenModal::new(content.clone(), options(&[("onBeforeOpen", veto.into())]))
        .unwrap();

    modal.open().unwrap();
    assert!(!modal.is_open());

    modal.option("onBeforeOpen".into(), JsValue::NULL).unwrap();
    modal.open().unwrap();
    assert!(modal.is_open());
    modal.destroy().unwrap();
    content.remove();
}

#[wasm_bindgen_test]
fn test_non_function_callbacks_and_unknown_keys_are_ignored() {
    let content = attached_div("js-lenient");
    let modal = JsFullscreenModal::new(
        content.clone(),
        options(&[
            ("onOpen", JsValue::from_f64(5.0)),
            ("foo", JsValue::from_f64(1.0)),
            ("closeSelector", JsValue::UNDEFINED),
            ("animationDuration", JsValue::from_f64(10.0)),
        ]),
    )
    .unwrap();

    assert_eq!(
        modal.option("animationDuration".into(), JsValue::UNDEFINED).unwrap(),
        JsValue::from_f64(10.0)
    );
    assert_eq!(
        modal.option("closeSelector".into(), JsValue::UNDEFINED).unwrap(),
        JsValue::from_str(".close-modal")
    );
    modal.open().unwrap();
    assert!(modal.is_open());
    modal.destroy().unwrap();
    content.remove();
}

#[wasm_bindgen_test]
fn test_option_call_shapes() {
    let content = attached_div("js-options");
    let modal = JsFullscreenModal::new(content.clone(), JsValue::UNDEFINED).unwrap();

    let all = modal.option(JsValue::UNDEFINED, JsValue::UNDEFINED).unwrap();
    assert_eq!(
        Reflect::get(&all, &"animationDuration".into()).unwrap(),
        JsValue::from_f64(200.0)
    );

    modal
        .option("animationDuration".into(), JsValue::from_f64(50.0))
        .unwrap();
    assert_eq!(
        modal.option("animationDuration".into(), JsValue::UNDEFINED).unwrap(),
        JsValue::from_f64(50.0)
    );
    assert!(modal.option("nope".into(), JsValue::UNDEFINED).unwrap().is_null());

    modal
        .option(options(&[("autoOpen", JsValue::TRUE)]), JsValue::UNDEFINED)
        .unwrap();
    assert_eq!(
        modal.option("autoOpen".into(), JsValue::UNDEFINED).unwrap(),
        JsValue::TRUE
    );

    let mark = Function::new_no_args("this.setAttribute('data-opened', 'yes');");
    modal.option("onOpen".into(), mark.into()).unwrap();
    modal.open().unwrap();
    assert_eq!(content.get_attribute("data-opened").as_deref(), Some("yes"));

    modal.destroy().unwrap();
    content.remove();
}

#[wasm_bindgen_test]
fn test_call_ignores_private_and_unknown_names() {
    let content = attached_div("js-call");
    let modal = JsFullscreenModal::new(content.clone(), JsValue::UNDEFINED).unwrap();

    assert!(modal.call("_init", no_args()).is_undefined());
    assert!(modal.call("toggle", no_args()).is_undefined());
    assert_eq!(modal.call("isOpen", no_args()), JsValue::FALSE);
    assert!(modal.call("open", no_args()).is_undefined());
    assert_eq!(modal.call("isOpen", no_args()), JsValue::TRUE);

    modal.call("destroy", no_args());
    assert!(JsFullscreenModal::for_element(&content).is_none());
    content.remove();
}

#[wasm_bindgen_test]
fn test_binding_an_element_twice_keeps_the_first_instance() {
    let content = attached_div("js-twice");
    let first = JsFullscreenModal::new(
        content.clone(),
        options(&[("animationDuration", JsValue::from_f64(10.0))]),
    )
    .unwrap();
    let second = JsFullscreenModal::new(
        content.clone(),
        options(&[("animationDuration", JsValue::from_f64(999.0))]),
    )
    .unwrap();

    assert_eq!(
        second.option("animationDuration".into(), JsValue::UNDEFINED).unwrap(),
        JsValue::from_f64(10.0)
    );
    second.open().unwrap();
    assert!(first.is_open());
    assert!(JsFullscreenModal::for_element(&content).is_some());

    first.destroy().unwrap();
    assert!(second.destroy().is_err());
    content.remove();
}
