//! Domain models and types for Tabula.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Strongly-typed identifiers** ([`ProjectId`], [`EventId`])
//! - **Domain models** ([`Project`], [`ProjectInfo`], [`DataDictionary`], [`FieldDescriptor`])
//! - **Error types** ([`TabulaError`], [`ProviderError`])
//! - **Result type alias** ([`Result`])
//!
//! # Type Safety
//!
//! Identifiers use the newtype pattern so a project id can never be passed
//! where an event id is expected:
//!
//! ```rust
//! use tabula::domain::{EventId, ProjectId};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let project_id = ProjectId::new("12")?;
//! let event_id = EventId::new("baseline_arm_1")?;
//!
//! // let wrong: ProjectId = event_id;  // Compile error!
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod dictionary;
pub mod errors;
pub mod ids;
pub mod project;
pub mod result;

// Re-export commonly used types for convenience
pub use dictionary::{DataDictionary, FieldDescriptor};
pub use errors::{ProviderError, TabulaError};
pub use ids::{EventId, ProjectId};
pub use project::{Project, ProjectInfo};
pub use result::Result;
