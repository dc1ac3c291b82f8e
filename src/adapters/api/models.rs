//! Wire models for the data export API

use crate::adapters::platform::ExportRequest;
use crate::core::plan::EventFormMap;
use crate::domain::ids::EventId;
use crate::domain::{ProjectInfo, Result, TabulaError};
use serde::{Deserialize, Deserializer};

/// Event name reported for classic (non-longitudinal) projects
pub const CLASSIC_EVENT_NAME: &str = "event_1_arm_1";

/// Response to `content=project`
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectResponse {
    pub project_title: String,

    #[serde(default, deserialize_with = "deserialize_api_flag")]
    pub is_longitudinal: bool,
}

impl From<ProjectResponse> for ProjectInfo {
    fn from(response: ProjectResponse) -> Self {
        ProjectInfo::new(response.project_title, response.is_longitudinal)
    }
}

/// One row of `content=formEventMapping`
#[derive(Debug, Clone, Deserialize)]
pub struct FormEventMappingEntry {
    pub unique_event_name: String,
    pub form: String,
}

/// One row of `content=instrument`
#[derive(Debug, Clone, Deserialize)]
pub struct InstrumentEntry {
    pub instrument_name: String,

    #[serde(default)]
    pub instrument_label: String,
}

/// Error payload the API returns alongside 4xx/5xx statuses
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// The API encodes booleans as 0/1, "0"/"1" or true/false
fn deserialize_api_flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Int(i64),
        Text(String),
    }

    Ok(match Option::<Flag>::deserialize(deserializer)? {
        Some(Flag::Bool(b)) => b,
        Some(Flag::Int(i)) => i != 0,
        Some(Flag::Text(s)) => matches!(s.trim(), "1" | "true"),
        None => false,
    })
}

fn event_id(name: &str) -> Result<EventId> {
    EventId::new(name).map_err(TabulaError::Metadata)
}

/// Build the event map of a longitudinal project, preserving API order
pub fn event_form_map_from_mapping(entries: Vec<FormEventMappingEntry>) -> Result<EventFormMap> {
    let mut map = EventFormMap::new();
    for entry in entries {
        map.insert(event_id(&entry.unique_event_name)?, [entry.form]);
    }
    Ok(map)
}

/// A classic project collects every instrument at its one event
pub fn classic_event_form_map(instruments: Vec<InstrumentEntry>) -> Result<EventFormMap> {
    let forms = instruments.into_iter().map(|i| i.instrument_name);
    Ok(EventFormMap::new().with_event(event_id(CLASSIC_EVENT_NAME)?, forms))
}

/// Form parameters of a metadata call
pub fn content_params(content: &str) -> Vec<(String, String)> {
    vec![
        ("content".to_string(), content.to_string()),
        ("format".to_string(), "json".to_string()),
    ]
}

/// Form parameters of a records export
pub fn record_params(request: &ExportRequest) -> Vec<(String, String)> {
    let mut params = vec![
        ("content".to_string(), "record".to_string()),
        ("format".to_string(), request.format.as_str().to_string()),
        ("type".to_string(), "flat".to_string()),
        ("rawOrLabel".to_string(), "raw".to_string()),
    ];

    if let Some(columns) = &request.columns {
        params.extend(
            columns
                .iter()
                .enumerate()
                .map(|(i, column)| (format!("fields[{i}]"), column.clone())),
        );
    }

    if let Some(events) = &request.events {
        params.extend(
            events
                .iter()
                .enumerate()
                .map(|(i, event)| (format!("events[{i}]"), event.as_str().to_string())),
        );
    }

    if let Some(logic) = &request.filter_logic {
        params.push(("filterLogic".to_string(), logic.clone()));
    }

    params
}
