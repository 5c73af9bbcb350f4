//! Reading event snapshots back out of ICS documents.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use icalendar::parser::{Component, Property, read_calendar, unfold};

use crate::event::{Attendee, Event, EventStatus, EventTime, ParticipationStatus, Recurrence};

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Parse the first VEVENT of an ICS document. Returns `None` when there is
/// no VEVENT or it lacks a UID or a readable DTSTART.
pub fn parse_event(content: &str) -> Option<Event> {
    let unfolded = unfold(content);
    let calendar = read_calendar(&unfolded).ok()?;
    let vevent = calendar.components.iter().find(|c| c.name == "VEVENT")?;

    let uid = text(vevent, "UID")?;
    let start = vevent.find_prop("DTSTART").and_then(time_value)?;
    // A missing DTEND makes the event instantaneous
    let end = match vevent.find_prop("DTEND") {
        Some(prop) => time_value(prop)?,
        None => start.clone(),
    };

    let status = match text(vevent, "STATUS").as_deref() {
        Some("TENTATIVE") => EventStatus::Tentative,
        Some("CANCELLED") => EventStatus::Cancelled,
        _ => EventStatus::Confirmed,
    };

    let recurrence = text(vevent, "RRULE").map(|rrule| Recurrence {
        rrule,
        exdates: all_props(vevent, "EXDATE")
            .flat_map(time_values)
            .collect(),
    });

    Some(Event {
        uid,
        summary: text(vevent, "SUMMARY").unwrap_or_else(|| "(No title)".to_string()),
        description: text(vevent, "DESCRIPTION"),
        location: text(vevent, "LOCATION"),
        start,
        end,
        status,
        recurrence,
        recurrence_id: vevent.find_prop("RECURRENCE-ID").and_then(time_value),
        organizer: vevent.find_prop("ORGANIZER").map(person),
        attendees: all_props(vevent, "ATTENDEE").map(person).collect(),
        updated: text(vevent, "LAST-MODIFIED").and_then(|v| utc_value(&v)),
        sequence: text(vevent, "SEQUENCE").and_then(|v| v.trim().parse().ok()),
    })
}

fn text(component: &Component<'_>, name: &str) -> Option<String> {
    component.find_prop(name).map(|p| p.val.to_string())
}

fn all_props<'c>(
    component: &'c Component<'c>,
    name: &'c str,
) -> impl Iterator<Item = &'c Property<'c>> + 'c {
    component.properties.iter().filter(move |p| p.name.as_ref() == name)
}

fn param<'p>(prop: &'p Property<'_>, key: &str) -> Option<&'p str> {
    prop.params
        .iter()
        .find(|p| p.key.as_ref() == key)
        .and_then(|p| p.val.as_ref())
        .map(|v| v.as_ref())
}

/// A DTSTART-like property holding a single value.
fn time_value(prop: &Property<'_>) -> Option<EventTime> {
    time_values(prop).into_iter().next()
}

/// Every value of a date or date-time property, honoring TZID and
/// VALUE=DATE. EXDATE may carry a comma-separated list.
fn time_values(prop: &Property<'_>) -> Vec<EventTime> {
    let tzid = param(prop, "TZID");
    let is_date = param(prop, "VALUE") == Some("DATE");

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .filter_map(|v| {
            if is_date || v.len() == 8 {
                return NaiveDate::parse_from_str(v, DATE_FORMAT)
                    .ok()
                    .map(EventTime::Date);
            }
            if v.ends_with('Z') {
                return utc_value(v).map(EventTime::DateTimeUtc);
            }
            let datetime = NaiveDateTime::parse_from_str(v, DATE_TIME_FORMAT).ok()?;
            Some(match tzid {
                Some(tzid) => EventTime::DateTimeZoned {
                    datetime,
                    tzid: tzid.to_string(),
                },
                None => EventTime::DateTimeFloating(datetime),
            })
        })
        .collect()
}

fn utc_value(value: &str) -> Option<DateTime<Utc>> {
    NaiveDateTime::parse_from_str(value.trim().trim_end_matches('Z'), DATE_TIME_FORMAT)
        .ok()
        .map(|dt| dt.and_utc())
}

/// ORGANIZER or ATTENDEE, with the mailto: scheme stripped.
fn person(prop: &Property<'_>) -> Attendee {
    let value = prop.val.as_ref();
    let email = match value.get(..7) {
        Some(scheme) if scheme.eq_ignore_ascii_case("mailto:") => &value[7..],
        _ => value,
    };

    Attendee {
        name: param(prop, "CN").map(str::to_string),
        email: email.to_string(),
        response_status: param(prop, "PARTSTAT").and_then(ParticipationStatus::from_ics_str),
    }
}
