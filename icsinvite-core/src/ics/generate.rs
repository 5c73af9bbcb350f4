//! iTIP message generation.

use icalendar::{Calendar, Component, EventLike, Property, ValueType};

use crate::error::InviteResult;
use crate::event::{Attendee, Event, EventStatus, EventTime};
use crate::ics::{IcsMethod, VTimezone};

/// Extra inputs for building a message.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions<'a> {
    /// VTIMEZONE blocks to embed ahead of the VEVENT
    pub vtimezones: &'a [VTimezone],
    /// Attendees to put in the body instead of the event's own list
    pub attendees_to: Option<&'a [Attendee]>,
}

/// Builds the body of an iTIP message for an event snapshot.
pub trait IcsBuilder: Send + Sync {
    fn build(
        &self,
        method: IcsMethod,
        prod_id: &str,
        event: &Event,
        options: &BuildOptions<'_>,
    ) -> InviteResult<String>;
}

/// [`IcsBuilder`] backed by the icalendar crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct IcalendarBuilder;

impl IcsBuilder for IcalendarBuilder {
    fn build(
        &self,
        method: IcsMethod,
        prod_id: &str,
        event: &Event,
        options: &BuildOptions<'_>,
    ) -> InviteResult<String> {
        let attendees = options.attendees_to.unwrap_or(event.attendees.as_slice());

        let mut vevent = icalendar::Event::new();
        vevent.uid(&event.uid).summary(&event.summary);

        // Falls back to now only when the snapshot has no LAST-MODIFIED
        let stamp = event.updated.unwrap_or_else(chrono::Utc::now);
        vevent.add_property("DTSTAMP", stamp.format("%Y%m%dT%H%M%SZ").to_string());
        if let Some(sequence) = event.sequence {
            vevent.add_property("SEQUENCE", sequence.to_string());
        }

        vevent.append_property(time_property("DTSTART", &event.start));
        vevent.append_property(time_property("DTEND", &event.end));
        if let Some(recurrence_id) = &event.recurrence_id {
            vevent.append_property(time_property("RECURRENCE-ID", recurrence_id));
        }

        match method {
            IcsMethod::Request => request_details(&mut vevent, event),
            // Only a cancel addressed to everyone cancels the event itself
            IcsMethod::Cancel if attendees.len() == event.attendees.len() => {
                vevent.add_property("STATUS", "CANCELLED");
            }
            IcsMethod::Cancel | IcsMethod::Reply => {}
        }

        if let Some(organizer) = &event.organizer {
            vevent.append_property(person_property("ORGANIZER", organizer));
        }
        for attendee in attendees {
            let mut prop = person_property("ATTENDEE", attendee);
            if method == IcsMethod::Request {
                prop.add_parameter("RSVP", "TRUE");
            }
            vevent.append_multi_property(prop);
        }

        let calendar = Calendar::new().push(vevent.done()).done();

        Ok(finish_message(
            &calendar.to_string(),
            method,
            prod_id,
            options.vtimezones,
        ))
    }
}

/// Fields only a REQUEST carries.
fn request_details(vevent: &mut icalendar::Event, event: &Event) {
    if let Some(description) = &event.description {
        vevent.description(description);
    }
    if let Some(location) = &event.location {
        vevent.location(location);
    }

    let status = match event.status {
        // implied default
        EventStatus::Confirmed => None,
        EventStatus::Tentative => Some("TENTATIVE"),
        EventStatus::Cancelled => Some("CANCELLED"),
    };
    if let Some(status) = status {
        vevent.add_property("STATUS", status);
    }

    if let Some(recurrence) = &event.recurrence {
        vevent.add_property("RRULE", &recurrence.rrule);
        for exdate in &recurrence.exdates {
            vevent.append_multi_property(time_property("EXDATE", exdate));
        }
    }
}

/// Post-process the icalendar crate's output into an iTIP message:
/// - PRODID replaced and METHOD added right after it
/// - CALSCALE:GREGORIAN dropped (it's the default)
/// - VTIMEZONE blocks inserted before the VEVENT
fn finish_message(ics: &str, method: IcsMethod, prod_id: &str, vtimezones: &[VTimezone]) -> String {
    let mut message = String::with_capacity(ics.len());
    let mut push_line = |line: &str| {
        message.push_str(line);
        message.push_str("\r\n");
    };
    let mut timezones_written = false;

    for line in ics.lines() {
        if line.starts_with("PRODID:") {
            push_line(&format!("PRODID:{prod_id}"));
            push_line(&format!("METHOD:{method}"));
            continue;
        }
        if line == "CALSCALE:GREGORIAN" {
            continue;
        }
        if line == "BEGIN:VEVENT" && !timezones_written {
            vtimezones
                .iter()
                .flat_map(|tz| tz.body.lines())
                .for_each(&mut push_line);
            timezones_written = true;
        }
        push_line(line);
    }

    message
}

/// Date or date-time property with its VALUE/TZID parameter.
fn time_property(name: &str, time: &EventTime) -> Property {
    let mut prop = Property::new(name, time.to_ics_string());
    match time {
        EventTime::Date(_) => {
            prop.append_parameter(ValueType::Date);
        }
        EventTime::DateTimeZoned { tzid, .. } => {
            prop.add_parameter("TZID", tzid);
        }
        EventTime::DateTimeUtc(_) | EventTime::DateTimeFloating(_) => {}
    }
    prop
}

fn person_property(name: &str, person: &Attendee) -> Property {
    let mut prop = Property::new(name, format!("mailto:{}", person.email));
    if let Some(cn) = &person.name {
        prop.add_parameter("CN", cn);
    }
    if let Some(partstat) = person.response_status {
        prop.add_parameter("PARTSTAT", partstat.as_ics_str());
    }
    prop
}
