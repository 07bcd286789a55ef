//! A page with two dialogs driven through the public API only.

use fullscreen_modal::shared::dom::NodeId;
use fullscreen_modal::{
    CallOutput, DomHost, LifecycleEvent, MemoryDom, ModalOptions, ModalRegistry, ModalSettings,
    OptionValue, SettingsPatch, Verdict,
};
use pretty_assertions::assert_eq;
use std::cell::RefCell;
use std::rc::Rc;

struct Page {
    dom: MemoryDom,
    newsletter: NodeId,
    newsletter_link: NodeId,
    terms: NodeId,
    terms_dismiss: NodeId,
    show_terms: NodeId,
}

fn page() -> Page {
    let dom = MemoryDom::new();
    let body = dom.body().unwrap();
    let main = dom.append_new(body, "main");

    let show_terms = dom.append_new(main, "button");
    dom.add_class(&show_terms, "show-terms").unwrap();

    let newsletter = dom.append_new(main, "aside");
    dom.set_attribute(&newsletter, "id", "newsletter").unwrap();
    let newsletter_link = dom.append_new(newsletter, "a");
    dom.add_class(&newsletter_link, "close-modal").unwrap();

    let terms = dom.append_new(main, "section");
    dom.set_attribute(&terms, "id", "terms").unwrap();
    let terms_dismiss = dom.append_new(terms, "button");
    dom.add_class(&terms_dismiss, "dismiss").unwrap();

    Page {
        dom,
        newsletter,
        newsletter_link,
        terms,
        terms_dismiss,
        show_terms,
    }
}

#[test]
fn test_two_dialogs_share_one_document() {
    let p = page();
    let pristine = p.dom.outline();
    let registry = ModalRegistry::new(p.dom.clone());

    let opened = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&opened);
    let _listener = p
        .dom
        .on_custom(p.dom.body().unwrap(), "apfmOpen", move |_| {
            sink.borrow_mut().push("open");
            true
        });

    let newsletter = registry
        .bind(&p.newsletter, ModalSettings::default())
        .unwrap();
    let terms_settings = ModalSettings::default().with_patch(
        SettingsPatch::from_json(
            r#"{"openSelector":".show-terms","closeSelector":".dismiss","showCloseButton":false,"animationDuration":120}"#,
        )
        .unwrap(),
    );
    let terms = registry.bind(&p.terms, terms_settings).unwrap();

    assert_eq!(registry.len(), 2);
    assert_eq!(newsletter.container_id(), "apfm-container-0");
    assert_eq!(terms.container_id(), "apfm-container-1");
    assert!(p.dom.element_by_id("apfm-container-1").is_some());

    p.dom.click(p.show_terms);
    assert!(terms.is_open());
    assert!(!newsletter.is_open());
    newsletter.open().unwrap();
    assert_eq!(registry.shown(), 2);
    assert_eq!(*opened.borrow(), vec!["open", "open"]);

    p.dom.click(p.terms_dismiss);
    p.dom.advance(120);
    assert!(!terms.is_open());
    assert!(p.dom.has_class(&p.dom.root().unwrap(), "apfm-open"));

    p.dom.click(p.newsletter_link);
    p.dom.advance(200);
    assert!(!newsletter.is_open());
    assert!(!p.dom.has_class(&p.dom.root().unwrap(), "apfm-open"));
    assert_eq!(p.dom.pending_timers(), 0);

    newsletter.destroy().unwrap();
    terms.destroy().unwrap();
    assert!(registry.is_empty());
    assert_eq!(p.dom.outline(), pristine);
    assert_eq!(p.dom.listener_count(), 0);
}

#[test]
fn test_guarded_dialog_lifecycle() {
    let p = page();
    let registry = ModalRegistry::new(p.dom.clone());
    let accepted = Rc::new(RefCell::new(false));
    let log = Rc::new(RefCell::new(Vec::new()));

    let gate = Rc::clone(&accepted);
    let before_close_log = Rc::clone(&log);
    let close_log = Rc::clone(&log);
    let options = ModalOptions::new(ModalSettings::default())
        .on(LifecycleEvent::BeforeClose, move |ctx| {
            before_close_log
                .borrow_mut()
                .push(ctx.event.callback_name());
            Verdict::from(*gate.borrow())
        })
        .on(LifecycleEvent::Close, move |ctx| {
            close_log.borrow_mut().push(ctx.event.callback_name());
            Verdict::Proceed
        });
    let terms = registry.bind(&p.terms, options).unwrap();

    assert_eq!(
        registry.invoke(&p.terms, "open", &[]).unwrap().unwrap(),
        CallOutput::Nothing
    );
    assert!(p.dom.key_down(p.terms_dismiss, "Escape"));
    p.dom.advance(200);
    assert!(terms.is_open());

    *accepted.borrow_mut() = true;
    p.dom.key_down(p.terms_dismiss, "Escape");
    p.dom.advance(200);
    assert!(!terms.is_open());
    assert_eq!(
        *log.borrow(),
        vec!["onBeforeClose", "onBeforeClose", "onClose"]
    );

    assert_eq!(
        registry
            .invoke(&p.terms, "option", &["autoOpen".into()])
            .unwrap()
            .unwrap(),
        CallOutput::Value(OptionValue::Bool(false))
    );
    assert!(registry.invoke(&p.newsletter, "open", &[]).is_none());
}
