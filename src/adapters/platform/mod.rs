//! Platform abstraction layer (trait-based)

pub mod traits;

pub use traits::{
    ActivityLogger, DataExportProvider, ExportFormat, ExportRequest, ProjectRegistry,
    SettingsStore,
};
