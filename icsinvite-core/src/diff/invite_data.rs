use crate::email::canonicalize_by_guess;
use crate::event::{Attendee, Event};

/// Decides whether a change between two snapshots is worth telling attendees
/// about. Attendee additions and removals are handled separately by
/// [`AttendeeDiff`](super::AttendeeDiff) and must not count here.
pub trait InviteDataComparator: Send + Sync {
    fn has_updated_invite_data(
        &self,
        new: &Event,
        old: &Event,
        has_modified_date_times: Option<bool>,
    ) -> bool;
}

/// Compares the fields that end up in a REQUEST body.
#[derive(Debug, Clone, Copy, Default)]
pub struct InviteFieldComparator;

impl InviteDataComparator for InviteFieldComparator {
    fn has_updated_invite_data(
        &self,
        new: &Event,
        old: &Event,
        has_modified_date_times: Option<bool>,
    ) -> bool {
        // A caller-supplied flag overrides the start/end comparison
        let date_times_changed =
            has_modified_date_times.unwrap_or_else(|| new.start != old.start || new.end != old.end);

        date_times_changed
            || normalized(&new.summary) != normalized(&old.summary)
            || normalized_opt(&new.description) != normalized_opt(&old.description)
            || normalized_opt(&new.location) != normalized_opt(&old.location)
            || new.recurrence != old.recurrence
            || organizer_key(new.organizer.as_ref()) != organizer_key(old.organizer.as_ref())
    }
}

fn normalized(value: &str) -> &str {
    value.trim()
}

fn normalized_opt(value: &Option<String>) -> &str {
    value.as_deref().map(str::trim).unwrap_or_default()
}

fn organizer_key(organizer: Option<&Attendee>) -> Option<String> {
    organizer.map(|o| canonicalize_by_guess(&o.email))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{EventStatus, EventTime};
    use chrono::{TimeZone, Utc};

    fn make_event() -> Event {
        Event {
            uid: "data@test".to_string(),
            summary: "Planning".to_string(),
            description: None,
            location: Some("Room 1".to_string()),
            start: EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 3, 20, 15, 0, 0).unwrap()),
            end: EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 3, 20, 16, 0, 0).unwrap()),
            status: EventStatus::Confirmed,
            recurrence: None,
            recurrence_id: None,
            organizer: Some(Attendee::new("boss@example.com")),
            attendees: vec![Attendee::new("a@example.com")],
            updated: None,
            sequence: None,
        }
    }

    #[test]
    fn test_identical_events_have_no_update() {
        let event = make_event();
        assert!(!InviteFieldComparator.has_updated_invite_data(&event, &event, None));
    }

    #[test]
    fn test_attendee_changes_are_ignored() {
        let old = make_event();
        let mut new = make_event();
        new.attendees.push(Attendee::new("b@example.com"));

        assert!(!InviteFieldComparator.has_updated_invite_data(&new, &old, None));
    }

    #[test]
    fn test_moved_start_is_an_update() {
        let old = make_event();
        let mut new = make_event();
        new.start = EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 3, 20, 14, 0, 0).unwrap());

        assert!(InviteFieldComparator.has_updated_invite_data(&new, &old, None));
    }

    #[test]
    fn test_explicit_date_time_flag_wins() {
        let old = make_event();
        let mut new = make_event();
        new.start = EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 3, 20, 14, 0, 0).unwrap());

        assert!(!InviteFieldComparator.has_updated_invite_data(&new, &old, Some(false)));
        assert!(InviteFieldComparator.has_updated_invite_data(&old, &old, Some(true)));
    }

    #[test]
    fn test_whitespace_and_missing_location_are_equivalent() {
        let mut old = make_event();
        old.location = None;
        let mut new = make_event();
        new.location = Some("  ".to_string());
        new.summary = " Planning ".to_string();

        assert!(!InviteFieldComparator.has_updated_invite_data(&new, &old, None));
    }

    #[test]
    fn test_organizer_alias_is_not_an_update() {
        let mut old = make_event();
        old.organizer = Some(Attendee::new("boss.man@gmail.com"));
        let mut new = make_event();
        new.organizer = Some(Attendee::new("BossMan@gmail.com").with_name("Boss"));

        assert!(!InviteFieldComparator.has_updated_invite_data(&new, &old, None));
    }
}
