//! Edit dialogs bound to the page's form elements

use crate::dom::{describe, element, log_error, set_display};
use panel::{FormField, ModalController, ModalIds, ModalKind, ModalSurface};
use std::cell::{Cell, RefCell};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, Event, HtmlElement, HtmlInputElement};

thread_local! {
    static MODALS: RefCell<Option<ModalController<DomModals>>> = const { RefCell::new(None) };
    static CLICK_INSTALLED: Cell<bool> = const { Cell::new(false) };
}

/// Dialogs and form fields of the current document
pub struct DomModals {
    document: Document,
    ids: ModalIds,
}

impl DomModals {
    pub fn new(document: Document, ids: ModalIds) -> Self {
        Self { document, ids }
    }

    fn field_id(&self, field: FormField) -> &str {
        match field {
            FormField::UrlOriginal => &self.ids.url_original,
            FormField::UrlName => &self.ids.url_name,
            FormField::UrlValue => &self.ids.url_value,
            FormField::PdfOriginal => &self.ids.pdf_original,
            FormField::PdfNew => &self.ids.pdf_new,
        }
    }

    /// Dialog whose container is exactly `target`
    pub fn backdrop_of(&self, target: &Element) -> Option<ModalKind> {
        self.ids.kind_of(&target.id())
    }
}

impl ModalSurface for DomModals {
    type Error = JsValue;

    fn fill(&mut self, field: FormField, value: &str) -> Result<(), JsValue> {
        element::<HtmlInputElement>(&self.document, self.field_id(field))?.set_value(value);
        Ok(())
    }

    fn set_visible(&mut self, modal: ModalKind, visible: bool) -> Result<(), JsValue> {
        let container = element::<HtmlElement>(&self.document, self.ids.container(modal))?;
        set_display(&container, if visible { "flex" } else { "none" })
    }
}

/// Bind the dialogs to `document` and close them on backdrop clicks
pub fn install(document: &Document, ids: ModalIds) -> Result<(), JsValue> {
    MODALS.with(|m| {
        *m.borrow_mut() = Some(ModalController::new(DomModals::new(document.clone(), ids)));
    });

    if CLICK_INSTALLED.with(|c| c.replace(true)) {
        return Ok(());
    }

    let window = web_sys::window().ok_or("No window")?;
    let click_closure = Closure::wrap(Box::new(move |event: Event| {
        let target = event.target().and_then(|t| t.dyn_into::<Element>().ok());

        MODALS.with(|m| {
            if let Some(ref mut modals) = *m.borrow_mut() {
                let backdrop = target.as_ref().and_then(|t| modals.surface().backdrop_of(t));
                if let Err(e) = modals.on_click(backdrop) {
                    log_error(&format!("closing modal failed: {}", describe(&e)));
                }
            }
        });
    }) as Box<dyn Fn(Event)>);

    window.add_event_listener_with_callback("click", click_closure.as_ref().unchecked_ref())?;
    click_closure.forget();

    Ok(())
}

fn with_modals<F>(f: F) -> Result<(), JsValue>
where
    F: FnOnce(&mut ModalController<DomModals>) -> Result<(), JsValue>,
{
    MODALS.with(|m| match m.borrow_mut().as_mut() {
        Some(modals) => f(modals),
        None => Err(JsValue::from_str("modals not initialized")),
    })
}

pub fn open_url(name: &str, url: &str) -> Result<(), JsValue> {
    with_modals(|modals| modals.open_url_modal(name, url))
}

pub fn open_pdf(filename: &str) -> Result<(), JsValue> {
    with_modals(|modals| modals.open_pdf_modal(filename))
}
