//! Table filtering over real `<tbody>` elements

use crate::dom::element;
use panel::{filter_and_sort, Collate, FilterSummary, SortMode, TableBody, TableSpec};
use std::cmp::Ordering;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlElement, HtmlInputElement, HtmlSelectElement};

/// Name collation through `String.prototype.localeCompare`
pub struct LocaleCollator;

impl Collate for LocaleCollator {
    fn compare(&self, a: &str, b: &str) -> Ordering {
        js_sys::JsString::from(a)
            .locale_compare(b, &js_sys::Array::new(), &js_sys::Object::new())
            .cmp(&0)
    }
}

/// A table body located through its descriptor
pub struct DomTable<'a> {
    body: Element,
    spec: &'a TableSpec,
}

impl<'a> DomTable<'a> {
    pub fn locate(document: &Document, spec: &'a TableSpec) -> Result<Self, JsValue> {
        let selector = spec.body_selector();
        let body = document
            .query_selector(&selector)?
            .ok_or_else(|| JsValue::from_str(&format!("missing table body: {}", selector)))?;
        Ok(Self { body, spec })
    }
}

impl TableBody for DomTable<'_> {
    type Row = HtmlElement;
    type Error = JsValue;

    fn rows(&self) -> Result<Vec<HtmlElement>, JsValue> {
        let list = self.body.query_selector_all("tr")?;
        let mut rows = Vec::with_capacity(list.length() as usize);
        for i in 0..list.length() {
            if let Some(node) = list.get(i) {
                rows.push(node.dyn_into::<HtmlElement>()?);
            }
        }
        Ok(rows)
    }

    fn name(&self, row: &HtmlElement) -> Result<Option<String>, JsValue> {
        let Some(cell) = row.query_selector(&self.spec.name_selector)? else {
            return Ok(None);
        };
        let text = match cell.dyn_into::<HtmlElement>() {
            Ok(cell) => cell.inner_text(),
            Err(cell) => cell.text_content().unwrap_or_default(),
        };
        Ok(Some(text))
    }

    fn index_marker(&self, row: &HtmlElement) -> Option<String> {
        row.get_attribute(&self.spec.index_attribute)
    }

    fn set_visible(&mut self, row: &HtmlElement, visible: bool) -> Result<(), JsValue> {
        row.style()
            .set_property("display", if visible { "" } else { "none" })
    }

    fn append(&mut self, row: &HtmlElement) -> Result<(), JsValue> {
        self.body.append_child(row)?;
        Ok(())
    }
}

/// Read a table's search and sort controls and apply them
pub fn refresh(document: &Document, spec: &TableSpec) -> Result<FilterSummary, JsValue> {
    let query = element::<HtmlInputElement>(document, &spec.search_input)?.value();
    let sort = element::<HtmlSelectElement>(document, &spec.sort_select)?;
    let mode = SortMode::from_value(&sort.value());

    let mut table = DomTable::locate(document, spec)?;
    filter_and_sort(&mut table, &query, mode, &LocaleCollator)
}
