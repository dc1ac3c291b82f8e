//! Field partition planning
//!
//! Decides which columns go into each per-form export. Every form's column
//! list has the same shape:
//!
//! ```text
//! record_id, [redcap_event_name], redcap_repeat_instance, redcap_repeat_instrument,
//! <eligible form fields...>, <form>_completed
//! ```
//!
//! The event-name column is present only for longitudinal projects. Columns
//! are unique within a form; the record-identifier field usually also belongs
//! to the first form and is kept only once, at the front.

use crate::domain::dictionary::{DataDictionary, FieldDescriptor};
use crate::domain::Result;
use serde::Serialize;

/// Event-name column present in longitudinal exports
pub const EVENT_NAME_COLUMN: &str = "redcap_event_name";

/// Repeat-instance column present in every form export
pub const REPEAT_INSTANCE_COLUMN: &str = "redcap_repeat_instance";

/// Repeat-instrument column present in every form export
pub const REPEAT_INSTRUMENT_COLUMN: &str = "redcap_repeat_instrument";

/// Suffix of a form's completion-status column
pub const COMPLETION_SUFFIX: &str = "_completed";

/// Completion-status column for a form
pub fn completion_column(form_name: &str) -> String {
    format!("{form_name}{COMPLETION_SUFFIX}")
}

/// PHI gating policy
///
/// A field is exported when it is not PHI-sensitive, or when both the system
/// and the project have opted in to PHI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PhiPolicy {
    /// System-wide PHI opt-in
    pub system_phi: bool,

    /// Project-level PHI opt-in
    pub project_phi: bool,
}

impl PhiPolicy {
    /// Create a policy from the two opt-in flags
    pub fn new(system_phi: bool, project_phi: bool) -> Self {
        Self {
            system_phi,
            project_phi,
        }
    }

    /// True when PHI fields are exported
    pub fn includes_phi(&self) -> bool {
        self.system_phi && self.project_phi
    }

    /// Whether a field may be exported under this policy
    pub fn permits(&self, field: &FieldDescriptor) -> bool {
        self.includes_phi() || !field.identifier
    }
}

/// Column plan for a single form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormPlan {
    /// Form name
    pub form_name: String,

    /// Ordered, duplicate-free export columns
    pub columns: Vec<String>,
}

/// Column plan for every form of a project, in dictionary order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldPartitionPlan {
    record_id_field: String,
    forms: Vec<FormPlan>,
}

impl FieldPartitionPlan {
    /// Record-identifier field shared by every form
    pub fn record_id_field(&self) -> &str {
        &self.record_id_field
    }

    /// Form plans in dictionary order
    pub fn forms(&self) -> &[FormPlan] {
        &self.forms
    }

    /// Plan for a single form
    pub fn get(&self, form_name: &str) -> Option<&FormPlan> {
        self.forms.iter().find(|f| f.form_name == form_name)
    }

    /// Columns for a single form
    pub fn columns_for(&self, form_name: &str) -> Option<&[String]> {
        self.get(form_name).map(|f| f.columns.as_slice())
    }

    /// Number of forms
    pub fn len(&self) -> usize {
        self.forms.len()
    }

    /// True when the plan has no forms
    pub fn is_empty(&self) -> bool {
        self.forms.is_empty()
    }

    /// Union of every form's columns, first occurrence wins
    ///
    /// This is the column set of a filtered "all data" export: the same
    /// fields as the form files, with the PHI exclusions already applied.
    pub fn all_columns(&self) -> Vec<String> {
        let mut columns = Vec::new();
        for form in &self.forms {
            for column in &form.columns {
                push_unique(&mut columns, column);
            }
        }
        columns
    }
}

/// Builds [`FieldPartitionPlan`]s under a fixed PHI policy
#[derive(Debug, Clone, Copy)]
pub struct FieldPartitionPlanner {
    policy: PhiPolicy,
}

impl FieldPartitionPlanner {
    /// Create a planner
    pub fn new(policy: PhiPolicy) -> Self {
        Self { policy }
    }

    /// PHI policy in effect
    pub fn policy(&self) -> PhiPolicy {
        self.policy
    }

    /// Plan the per-form columns of a project
    ///
    /// # Errors
    ///
    /// Returns `TabulaError::Metadata` if the dictionary is empty, since
    /// there is then no record-identifier field.
    pub fn plan(&self, dictionary: &DataDictionary, longitudinal: bool) -> Result<FieldPartitionPlan> {
        let record_id_field = dictionary.record_id_field()?.to_string();

        // Every form gets an entry, even if all of its fields are excluded.
        let mut eligible: Vec<(String, Vec<&str>)> = dictionary
            .form_names()
            .into_iter()
            .map(|form| (form.to_string(), Vec::new()))
            .collect();

        for field in dictionary.fields() {
            if !self.policy.permits(field) {
                continue;
            }
            if let Some((_, fields)) = eligible
                .iter_mut()
                .find(|(form, _)| *form == field.form_name)
            {
                fields.push(&field.field_name);
            }
        }

        let forms = eligible
            .into_iter()
            .map(|(form_name, fields)| {
                let columns = form_columns(&record_id_field, &form_name, &fields, longitudinal);
                FormPlan { form_name, columns }
            })
            .collect();

        Ok(FieldPartitionPlan {
            record_id_field,
            forms,
        })
    }
}

fn form_columns(
    record_id_field: &str,
    form_name: &str,
    fields: &[&str],
    longitudinal: bool,
) -> Vec<String> {
    let completion = completion_column(form_name);
    let mut columns = Vec::with_capacity(fields.len() + 5);

    push_unique(&mut columns, record_id_field);
    if longitudinal {
        push_unique(&mut columns, EVENT_NAME_COLUMN);
    }
    push_unique(&mut columns, REPEAT_INSTANCE_COLUMN);
    push_unique(&mut columns, REPEAT_INSTRUMENT_COLUMN);

    for field in fields {
        // Completion status always goes last.
        if *field != completion {
            push_unique(&mut columns, field);
        }
    }

    push_unique(&mut columns, &completion);
    columns
}

fn push_unique(columns: &mut Vec<String>, column: &str) {
    if !columns.iter().any(|c| c == column) {
        columns.push(column.to_string());
    }
}
