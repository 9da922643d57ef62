//! Edit dialogs for URL and PDF entries

/// Modal dialogs known to the dashboard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModalKind {
    Log,
    Url,
    Pdf,
}

impl ModalKind {
    pub fn all() -> [ModalKind; 3] {
        [ModalKind::Log, ModalKind::Url, ModalKind::Pdf]
    }
}

/// Form fields filled when a dialog opens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    /// Hidden field keeping the URL being edited
    UrlOriginal,
    UrlName,
    UrlValue,
    /// Hidden field keeping the filename being renamed
    PdfOriginal,
    PdfNew,
}

/// Where the controller writes form values and toggles dialogs
pub trait ModalSurface {
    type Error;

    fn fill(&mut self, field: FormField, value: &str) -> Result<(), Self::Error>;

    fn set_visible(&mut self, modal: ModalKind, visible: bool) -> Result<(), Self::Error>;
}

/// Name shown for editing: the filename without its trailing `.pdf`
pub fn pdf_display_name(filename: &str) -> &str {
    filename.strip_suffix(".pdf").unwrap_or(filename)
}

/// Opens and closes the edit dialogs
pub struct ModalController<S> {
    surface: S,
    open: Option<ModalKind>,
}

impl<S: ModalSurface> ModalController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            open: None,
        }
    }

    /// Dialog most recently opened through this controller, if still open
    pub fn open_modal(&self) -> Option<ModalKind> {
        self.open
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Populate the URL form and show its dialog
    pub fn open_url_modal(&mut self, name: &str, url: &str) -> Result<(), S::Error> {
        self.surface.fill(FormField::UrlOriginal, url)?;
        self.surface.fill(FormField::UrlName, name)?;
        self.surface.fill(FormField::UrlValue, url)?;
        self.surface.set_visible(ModalKind::Url, true)?;
        self.open = Some(ModalKind::Url);
        Ok(())
    }

    /// Populate the rename form and show its dialog
    pub fn open_pdf_modal(&mut self, filename: &str) -> Result<(), S::Error> {
        self.surface.fill(FormField::PdfOriginal, filename)?;
        self.surface
            .fill(FormField::PdfNew, pdf_display_name(filename))?;
        self.surface.set_visible(ModalKind::Pdf, true)?;
        self.open = Some(ModalKind::Pdf);
        Ok(())
    }

    /// Handle a page click. `backdrop` is the dialog whose container was the
    /// exact click target, `None` for any other element (including dialog
    /// content). Returns whether a dialog was hidden.
    pub fn on_click(&mut self, backdrop: Option<ModalKind>) -> Result<bool, S::Error> {
        let Some(kind) = backdrop else {
            return Ok(false);
        };

        self.surface.set_visible(kind, false)?;
        if self.open == Some(kind) {
            self.open = None;
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ModalIds;
    use std::collections::HashMap;
    use std::convert::Infallible;

    #[derive(Default)]
    struct Form {
        fields: HashMap<FormField, String>,
        visible: HashMap<ModalKind, bool>,
    }

    impl ModalSurface for Form {
        type Error = Infallible;

        fn fill(&mut self, field: FormField, value: &str) -> Result<(), Infallible> {
            self.fields.insert(field, value.to_string());
            Ok(())
        }

        fn set_visible(&mut self, modal: ModalKind, visible: bool) -> Result<(), Infallible> {
            self.visible.insert(modal, visible);
            Ok(())
        }
    }

    impl Form {
        fn field(&self, field: FormField) -> &str {
            self.fields.get(&field).map(String::as_str).unwrap_or("")
        }

        fn is_visible(&self, modal: ModalKind) -> bool {
            self.visible.get(&modal).copied().unwrap_or(false)
        }
    }

    #[test]
    fn test_open_url_modal() {
        let mut modals = ModalController::new(Form::default());
        modals.open_url_modal("Example", "http://x.com").unwrap();

        let form = modals.surface();
        assert_eq!(form.field(FormField::UrlName), "Example");
        assert_eq!(form.field(FormField::UrlOriginal), "http://x.com");
        assert_eq!(form.field(FormField::UrlValue), "http://x.com");
        assert!(form.is_visible(ModalKind::Url));
        assert_eq!(modals.open_modal(), Some(ModalKind::Url));
    }

    #[test]
    fn test_open_pdf_modal_strips_extension() {
        let mut modals = ModalController::new(Form::default());
        modals.open_pdf_modal("report.pdf").unwrap();

        let form = modals.surface();
        assert_eq!(form.field(FormField::PdfOriginal), "report.pdf");
        assert_eq!(form.field(FormField::PdfNew), "report");
        assert!(form.is_visible(ModalKind::Pdf));
    }

    #[test]
    fn test_pdf_display_name() {
        assert_eq!(pdf_display_name("report.pdf"), "report");
        assert_eq!(pdf_display_name("notes.txt"), "notes.txt");
        // Only the final extension goes
        assert_eq!(pdf_display_name("a.pdf.backup.pdf"), "a.pdf.backup");
        assert_eq!(pdf_display_name("draft.pdf.old"), "draft.pdf.old");
        assert_eq!(pdf_display_name("SCAN.PDF"), "SCAN.PDF");
    }

    #[test]
    fn test_backdrop_click_hides() {
        let mut modals = ModalController::new(Form::default());
        modals.open_url_modal("a", "b").unwrap();

        assert!(modals.on_click(Some(ModalKind::Url)).unwrap());
        assert!(!modals.surface().is_visible(ModalKind::Url));
        assert_eq!(modals.open_modal(), None);
    }

    #[test]
    fn test_click_resolved_from_target_id() {
        let ids = ModalIds::default();
        let mut modals = ModalController::new(Form::default());
        modals.open_url_modal("a", "b").unwrap();

        assert!(!modals.on_click(ids.kind_of("edit_url_name")).unwrap());
        assert!(!modals.on_click(ids.kind_of("")).unwrap());
        assert!(modals.surface().is_visible(ModalKind::Url));

        assert!(modals.on_click(ids.kind_of("urlModal")).unwrap());
        assert!(!modals.surface().is_visible(ModalKind::Url));
    }

    #[test]
    fn test_content_click_keeps_modal() {
        let mut modals = ModalController::new(Form::default());
        modals.open_pdf_modal("x.pdf").unwrap();

        assert!(!modals.on_click(None).unwrap());
        assert!(modals.surface().is_visible(ModalKind::Pdf));
        assert_eq!(modals.open_modal(), Some(ModalKind::Pdf));
    }

    #[test]
    fn test_log_backdrop_closes_without_tracking() {
        let mut modals = ModalController::new(Form::default());
        modals.open_pdf_modal("x.pdf").unwrap();

        // The log dialog is opened by the page itself
        assert!(modals.on_click(Some(ModalKind::Log)).unwrap());
        assert!(!modals.surface().is_visible(ModalKind::Log));
        assert_eq!(modals.open_modal(), Some(ModalKind::Pdf));
    }
}
