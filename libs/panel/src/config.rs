//! Page contract and text configuration

use crate::modal::ModalKind;
use crate::PanelError;
use serde::{Deserialize, Serialize};

/// Descriptor locating one filterable table on the page
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSpec {
    /// Short kind used by page handlers (e.g. "pdf")
    pub kind: String,
    /// Id of the search text input
    pub search_input: String,
    /// Id of the sort selector
    pub sort_select: String,
    /// Id of the table element
    pub table: String,
    /// Selector of the cell holding the row's display name
    pub name_selector: String,
    /// Attribute carrying the row's insertion index
    pub index_attribute: String,
}

impl TableSpec {
    /// Build the descriptor following the `{kind}Search` / `{kind}Sort` /
    /// `{kind}Table` naming convention
    pub fn for_kind(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            search_input: format!("{}Search", kind),
            sort_select: format!("{}Sort", kind),
            table: format!("{}Table", kind),
            name_selector: ".searchable-name".to_string(),
            index_attribute: "data-index".to_string(),
        }
    }

    /// CSS selector of the table body
    pub fn body_selector(&self) -> String {
        format!("#{} tbody", self.table)
    }
}

/// Element ids used by the modal controller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModalIds {
    pub log_modal: String,
    pub url_modal: String,
    pub pdf_modal: String,
    pub url_original: String,
    pub url_name: String,
    pub url_value: String,
    pub pdf_original: String,
    pub pdf_new: String,
}

impl Default for ModalIds {
    fn default() -> Self {
        Self {
            log_modal: "logModal".to_string(),
            url_modal: "urlModal".to_string(),
            pdf_modal: "pdfModal".to_string(),
            url_original: "edit_url_original".to_string(),
            url_name: "edit_url_name".to_string(),
            url_value: "edit_url_value".to_string(),
            pdf_original: "edit_pdf_original".to_string(),
            pdf_new: "edit_pdf_new".to_string(),
        }
    }
}

impl ModalIds {
    /// Id of the dialog container
    pub fn container(&self, modal: ModalKind) -> &str {
        match modal {
            ModalKind::Log => &self.log_modal,
            ModalKind::Url => &self.url_modal,
            ModalKind::Pdf => &self.pdf_modal,
        }
    }

    /// Dialog whose container carries exactly this id. Elements inside a
    /// dialog have other ids (or none), so they never match.
    pub fn kind_of(&self, id: &str) -> Option<ModalKind> {
        if id.is_empty() {
            return None;
        }
        ModalKind::all()
            .into_iter()
            .find(|kind| self.container(*kind) == id)
    }
}

/// Element ids and data attributes used by the training console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleIds {
    pub train_button: String,
    pub terminal_container: String,
    pub terminal_output: String,
    pub finish_button: String,
    /// Attribute on the train button holding the stream URL
    pub stream_url_attribute: String,
    /// Attribute on the train button holding the completion URL
    pub complete_url_attribute: String,
}

impl Default for ConsoleIds {
    fn default() -> Self {
        Self {
            train_button: "btnTrain".to_string(),
            terminal_container: "terminalContainer".to_string(),
            terminal_output: "terminalOutput".to_string(),
            finish_button: "btnFinish".to_string(),
            stream_url_attribute: "data-stream-url".to_string(),
            complete_url_attribute: "data-complete-url".to_string(),
        }
    }
}

/// User-facing text of the training console
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsoleLabels {
    /// Train button while a run is in progress
    pub training: String,
    /// Train button after a lost connection
    pub retry: String,
    /// Train button once the server acknowledged completion
    pub completed: String,
    /// Placeholder shown while the stream connects
    pub connecting: String,
    /// Warning appended when the connection is lost
    pub connection_lost: String,
    /// Text announcing that every process finished; also the idempotence marker
    pub all_done: String,
    /// Separator written before the final line
    pub separator: String,
    pub expected_close: String,
    pub stream_error: String,
    pub ack_error: String,
}

impl Default for ConsoleLabels {
    fn default() -> Self {
        Self {
            training: "⏳ Entrenando...".to_string(),
            retry: "Reintentar".to_string(),
            completed: "Entrenamiento Completo".to_string(),
            connecting: "Iniciando conexión...".to_string(),
            connection_lost:
                "⚠️ La conexión se perdió. Si ves mensajes de éxito arriba, ignora esto."
                    .to_string(),
            all_done: "Todos los procesos completados".to_string(),
            separator: "==========================================".to_string(),
            expected_close: "Cierre de conexión esperado.".to_string(),
            stream_error: "Error de SSE".to_string(),
            ack_error: "Error actualizando estado final".to_string(),
        }
    }
}

/// How stream payloads are interpreted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StreamRules {
    /// Payload that ends the stream
    pub close_sentinel: String,
    /// Any payload containing one of these marks the run as successful
    pub success_markers: Vec<String>,
}

impl Default for StreamRules {
    fn default() -> Self {
        Self {
            close_sentinel: "close".to_string(),
            success_markers: vec!["Entrenamiento exitoso".to_string(), "FINALIZADO".to_string()],
        }
    }
}

impl StreamRules {
    /// Whether the payload is the end-of-stream sentinel
    pub fn is_close(&self, data: &str) -> bool {
        data == self.close_sentinel
    }

    /// Whether the payload announces a successful run
    pub fn is_success(&self, data: &str) -> bool {
        self.success_markers.iter().any(|m| data.contains(m.as_str()))
    }
}

/// Everything the training console needs, passed in at construction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleConfig {
    /// Server-sent event stream to follow
    pub stream_url: String,
    /// Endpoint notified with a POST once the run completes
    pub complete_url: String,
    #[serde(default)]
    pub labels: ConsoleLabels,
    #[serde(default)]
    pub rules: StreamRules,
}

impl ConsoleConfig {
    /// Create a console configuration with default labels and rules
    pub fn new(stream_url: impl Into<String>, complete_url: impl Into<String>) -> Self {
        Self {
            stream_url: stream_url.into(),
            complete_url: complete_url.into(),
            labels: ConsoleLabels::default(),
            rules: StreamRules::default(),
        }
    }
}

/// Page-wide configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    pub tables: Vec<TableSpec>,
    pub modals: ModalIds,
    pub console: ConsoleIds,
    pub labels: ConsoleLabels,
    pub rules: StreamRules,
}

impl Default for PanelConfig {
    fn default() -> Self {
        Self {
            tables: vec![TableSpec::for_kind("pdf"), TableSpec::for_kind("url")],
            modals: ModalIds::default(),
            console: ConsoleIds::default(),
            labels: ConsoleLabels::default(),
            rules: StreamRules::default(),
        }
    }
}

impl PanelConfig {
    /// Parse a configuration, falling back to defaults for missing sections
    pub fn from_json(json: &str) -> Result<Self, PanelError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Look up a table descriptor by kind
    pub fn table(&self, kind: &str) -> Result<&TableSpec, PanelError> {
        self.tables
            .iter()
            .find(|t| t.kind == kind)
            .ok_or_else(|| PanelError::UnknownTable(kind.to_string()))
    }

    /// Console configuration for the given endpoints, sharing this page's text
    pub fn console_config(&self, stream_url: &str, complete_url: &str) -> ConsoleConfig {
        ConsoleConfig {
            stream_url: stream_url.to_string(),
            complete_url: complete_url.to_string(),
            labels: self.labels.clone(),
            rules: self.rules.clone(),
        }
    }
}
