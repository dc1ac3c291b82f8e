//! Core business logic for Tabula.
//!
//! # Modules
//!
//! - [`plan`] - Field partition planning and event resolution
//! - [`export`] - Run orchestration, filesystem sink, summaries
//! - [`retention`] - Pruning of old rolling files
//! - [`context`] - Shared "current project" selection
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tabula::adapters::memory::InMemoryPlatform;
//! use tabula::core::export::{ExportCoordinator, JobContext};
//!
//! # async fn example() -> tabula::domain::Result<()> {
//! let platform = Arc::new(InMemoryPlatform::new());
//! let coordinator = ExportCoordinator::from_platform(platform);
//!
//! let outcome = coordinator.run(&JobContext::new("Export Data Files")).await?;
//! println!("{outcome}");
//! # Ok(())
//! # }
//! ```

pub mod context;
pub mod export;
pub mod plan;
pub mod retention;
