//! Event resolution
//!
//! The platform reports which forms are collected at each event. Exports work
//! the other way round: for each form we need the events whose rows belong in
//! that form's file. A form that no event collects resolves to an empty list
//! and is skipped by the exporter, so instruments removed from every event
//! (but still present in the dictionary) never produce an event-less file.

use crate::domain::ids::EventId;
use std::collections::HashMap;

/// Ordered mapping from event to the forms collected at that event
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFormMap {
    entries: Vec<(EventId, Vec<String>)>,
}

impl EventFormMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add forms for an event, appending to the event's list if it already exists
    pub fn insert<I, S>(&mut self, event: EventId, forms: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let forms = forms.into_iter().map(Into::into);
        match self.entries.iter_mut().find(|(id, _)| *id == event) {
            Some((_, existing)) => existing.extend(forms),
            None => self.entries.push((event, forms.collect())),
        }
    }

    /// Builder-style variant of [`EventFormMap::insert`]
    pub fn with_event<I, S>(mut self, event: EventId, forms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.insert(event, forms);
        self
    }

    /// Events in insertion order with their forms
    pub fn entries(&self) -> &[(EventId, Vec<String>)] {
        &self.entries
    }

    /// Number of events
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no events are defined
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Invert into a form -> events index
    pub fn invert(&self) -> FormEventIndex {
        let mut events_by_form: HashMap<String, Vec<EventId>> = HashMap::new();
        for (event, forms) in &self.entries {
            for form in forms {
                let events = events_by_form.entry(form.clone()).or_default();
                if !events.contains(event) {
                    events.push(event.clone());
                }
            }
        }
        FormEventIndex { events_by_form }
    }
}

/// Mapping from form name to the events it is collected in
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormEventIndex {
    events_by_form: HashMap<String, Vec<EventId>>,
}

impl FormEventIndex {
    /// Events for a form, in event order; empty when the form is in no event
    pub fn events_for(&self, form_name: &str) -> &[EventId] {
        self.events_by_form
            .get(form_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// True when the form is collected in at least one event
    pub fn is_active(&self, form_name: &str) -> bool {
        !self.events_for(form_name).is_empty()
    }
}

/// Resolve the form -> events index for an event -> forms map
pub fn resolve_form_events(map: &EventFormMap) -> FormEventIndex {
    map.invert()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(id: &str) -> EventId {
        EventId::new(id).unwrap()
    }

    #[test]
    fn test_invert_preserves_event_order() {
        let map = EventFormMap::new()
            .with_event(event("baseline_arm_1"), ["demographics", "vitals"])
            .with_event(event("week_4_arm_1"), ["vitals"])
            .with_event(event("week_8_arm_1"), ["vitals", "labs"]);

        let index = map.invert();

        assert_eq!(index.events_for("demographics"), &[event("baseline_arm_1")]);
        assert_eq!(
            index.events_for("vitals"),
            &[
                event("baseline_arm_1"),
                event("week_4_arm_1"),
                event("week_8_arm_1")
            ]
        );
        assert_eq!(index.events_for("labs"), &[event("week_8_arm_1")]);
    }

    #[test]
    fn test_form_in_no_event_is_inactive() {
        let map = EventFormMap::new().with_event(event("event_1"), ["demographics"]);
        let index = resolve_form_events(&map);

        assert!(index.is_active("demographics"));
        assert!(!index.is_active("retired_form"));
        assert!(index.events_for("retired_form").is_empty());
    }

    #[test]
    fn test_duplicate_form_listing_does_not_duplicate_event() {
        let map = EventFormMap::new().with_event(event("event_1"), ["vitals", "vitals"]);
        let index = map.invert();

        assert_eq!(index.events_for("vitals"), &[event("event_1")]);
    }

    #[test]
    fn test_insert_same_event_twice_extends_forms() {
        let mut map = EventFormMap::new();
        map.insert(event("event_1"), ["demographics"]);
        map.insert(event("event_1"), ["vitals"]);

        assert_eq!(map.len(), 1);
        assert_eq!(map.entries()[0].1, vec!["demographics", "vitals"]);
    }

    #[test]
    fn test_empty_map() {
        let map = EventFormMap::new();
        assert!(map.is_empty());
        assert!(!map.invert().is_active("anything"));
    }
}
