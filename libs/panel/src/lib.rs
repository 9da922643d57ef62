//! Admin Dashboard Panel
//!
//! DOM-free core of the administration dashboard. Every browser concern is
//! reached through a small trait so the behavior can be driven from tests
//! or from the `web-sys` binding alike.

mod config;
mod modal;
mod table;
mod terminal;
mod training;

pub use config::{
    ConsoleConfig, ConsoleIds, ConsoleLabels, ModalIds, PanelConfig, StreamRules, TableSpec,
};
pub use modal::{pdf_display_name, FormField, ModalController, ModalKind, ModalSurface};
pub use table::{
    filter_and_sort, parse_index, CaseFold, Collate, FilterSummary, MemoryRow, MemoryTable,
    SortMode, TableBody,
};
pub use terminal::{Terminal, TerminalLine, Tone, LINE_PREFIX};
pub use training::{
    ConsoleEffect, LogLevel, ReadyState, RunCounter, SessionState, TrainButton,
    TrainingSession,
};

/// Error type for panel operations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PanelError {
    /// Configuration could not be parsed
    Config(String),
    /// No table is registered under the requested kind
    UnknownTable(String),
}

impl std::fmt::Display for PanelError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PanelError::Config(e) => write!(f, "Invalid panel configuration: {}", e),
            PanelError::UnknownTable(kind) => write!(f, "Unknown table: {}", kind),
        }
    }
}

impl std::error::Error for PanelError {}

impl From<serde_json::Error> for PanelError {
    fn from(e: serde_json::Error) -> Self {
        PanelError::Config(e.to_string())
    }
}
