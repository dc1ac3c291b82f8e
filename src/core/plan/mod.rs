//! Field partition planning and event resolution
//!
//! - [`partition`] decides which columns belong in each per-form export
//! - [`events`] decides which event rows belong in each per-form export

pub mod events;
pub mod partition;

pub use events::{resolve_form_events, EventFormMap, FormEventIndex};
pub use partition::{
    completion_column, FieldPartitionPlan, FieldPartitionPlanner, FormPlan, PhiPolicy,
    EVENT_NAME_COLUMN, REPEAT_INSTANCE_COLUMN, REPEAT_INSTRUMENT_COLUMN,
};
