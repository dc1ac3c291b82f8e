//! Domain identifier types with validation
//!
//! Newtype wrappers for platform identifiers. Each type keeps ids from being
//! mixed up and rejects empty values at construction.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Project identifier newtype wrapper
///
/// An opaque key assigned by the platform. Usually numeric, but it is kept
/// as a string since the export layer never does arithmetic on it.
///
/// # Examples
///
/// ```
/// use tabula::domain::ids::ProjectId;
/// use std::str::FromStr;
///
/// let project_id = ProjectId::from_str("42").unwrap();
/// assert_eq!(project_id.as_str(), "42");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ProjectId(String);

impl ProjectId {
    /// Creates a new ProjectId from a string
    ///
    /// Returns `Err` if the id is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Project ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the project ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for ProjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for ProjectId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Event identifier newtype wrapper
///
/// Identifies an event in a longitudinal project's timeline, e.g.
/// `baseline_arm_1`. Classic projects use a single implicit event.
///
/// # Examples
///
/// ```
/// use tabula::domain::ids::EventId;
/// use std::str::FromStr;
///
/// let event_id = EventId::from_str("baseline_arm_1").unwrap();
/// assert_eq!(event_id.to_string(), "baseline_arm_1");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(String);

impl EventId {
    /// Creates a new EventId from a string
    ///
    /// Returns `Err` if the id is empty or only whitespace.
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Event ID cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the event ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EventId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for EventId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_id_valid() {
        let id = ProjectId::new("17").unwrap();
        assert_eq!(id.as_str(), "17");
        assert_eq!(id.to_string(), "17");
        assert_eq!(id.into_inner(), "17".to_string());
    }

    #[test]
    fn test_project_id_empty() {
        assert!(ProjectId::new("").is_err());
        assert!(ProjectId::new("   ").is_err());
    }

    #[test]
    fn test_event_id_valid() {
        let id = EventId::from_str("event_1_arm_1").unwrap();
        assert_eq!(id.as_ref(), "event_1_arm_1");
    }

    #[test]
    fn test_event_id_empty() {
        assert!(EventId::from_str("").is_err());
    }

    #[test]
    fn test_project_id_serialization() {
        let id = ProjectId::new("42").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"42\"");

        let back: ProjectId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }
}
