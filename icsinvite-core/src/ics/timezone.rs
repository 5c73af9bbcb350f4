//! VTIMEZONE resolution for outgoing messages.

use async_trait::async_trait;
use chrono::{NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;

use crate::error::{InviteError, InviteResult};
use crate::event::{Event, EventTime};

/// A serialized VTIMEZONE component
#[derive(Debug, Clone, PartialEq)]
pub struct VTimezone {
    pub tzid: String,
    /// `BEGIN:VTIMEZONE` through `END:VTIMEZONE`, CRLF separated
    pub body: String,
}

/// Resolves the VTIMEZONE components an event's date-times refer to.
#[async_trait]
pub trait TimezoneResolver: Send + Sync {
    async fn resolve(&self, event: &Event) -> InviteResult<Vec<VTimezone>>;
}

/// Builds VTIMEZONEs from the IANA database bundled with chrono-tz.
///
/// Each zone gets a single observance pinned to the UTC offset in force at
/// the event's start.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChronoTzResolver;

#[async_trait]
impl TimezoneResolver for ChronoTzResolver {
    async fn resolve(&self, event: &Event) -> InviteResult<Vec<VTimezone>> {
        let reference = reference_time(&event.start);

        event
            .tzids()
            .into_iter()
            .map(|tzid| {
                let tz: Tz = tzid
                    .parse()
                    .map_err(|_| InviteError::Timezone(format!("unknown timezone '{tzid}'")))?;
                Ok::<_, InviteError>(build_vtimezone(tzid, tz, &reference))
            })
            .collect()
    }
}

fn reference_time(start: &EventTime) -> NaiveDateTime {
    match start {
        EventTime::Date(d) => d.and_time(chrono::NaiveTime::default()),
        EventTime::DateTimeUtc(dt) => dt.naive_utc(),
        EventTime::DateTimeFloating(dt) => *dt,
        EventTime::DateTimeZoned { datetime, .. } => *datetime,
    }
}

fn build_vtimezone(tzid: &str, tz: Tz, reference: &NaiveDateTime) -> VTimezone {
    // Local times inside a DST gap have no offset; fall back to reading the
    // reference as UTC
    let offset = tz
        .offset_from_local_datetime(reference)
        .earliest()
        .map(|o| o.fix())
        .unwrap_or_else(|| tz.offset_from_utc_datetime(reference).fix());
    let utc_offset = format_utc_offset(offset.local_minus_utc());

    let body = format!(
        "BEGIN:VTIMEZONE\r\n\
TZID:{tzid}\r\n\
BEGIN:STANDARD\r\n\
DTSTART:19700101T000000\r\n\
TZOFFSETFROM:{utc_offset}\r\n\
TZOFFSETTO:{utc_offset}\r\n\
END:STANDARD\r\n\
END:VTIMEZONE\r\n"
    );

    VTimezone {
        tzid: tzid.to_string(),
        body,
    }
}

/// Seconds east of UTC as `+HHMM`/`-HHMM`
fn format_utc_offset(seconds: i32) -> String {
    let sign = if seconds < 0 { '-' } else { '+' };
    let seconds = seconds.unsigned_abs();
    format!("{sign}{:02}{:02}", seconds / 3600, seconds % 3600 / 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventStatus;
    use chrono::NaiveDate;

    fn zoned(tzid: &str, month: u32) -> EventTime {
        EventTime::DateTimeZoned {
            datetime: NaiveDate::from_ymd_opt(2025, month, 20)
                .unwrap()
                .and_hms_opt(15, 0, 0)
                .unwrap(),
            tzid: tzid.to_string(),
        }
    }

    fn make_event(start: EventTime, end: EventTime) -> Event {
        Event {
            uid: "tz@test".to_string(),
            summary: "Zoned".to_string(),
            description: None,
            location: None,
            start,
            end,
            status: EventStatus::Confirmed,
            recurrence: None,
            recurrence_id: None,
            organizer: None,
            attendees: vec![],
            updated: None,
            sequence: None,
        }
    }

    #[test]
    fn test_format_utc_offset() {
        assert_eq!(format_utc_offset(3600), "+0100");
        assert_eq!(format_utc_offset(-5 * 3600), "-0500");
        assert_eq!(format_utc_offset(5 * 3600 + 1800), "+0530");
        assert_eq!(format_utc_offset(0), "+0000");
    }

    #[tokio::test]
    async fn test_resolves_offset_in_force_at_start() {
        let winter = make_event(zoned("Europe/Zurich", 1), zoned("Europe/Zurich", 1));
        let summer = make_event(zoned("Europe/Zurich", 7), zoned("Europe/Zurich", 7));

        let winter_tz = ChronoTzResolver.resolve(&winter).await.unwrap();
        let summer_tz = ChronoTzResolver.resolve(&summer).await.unwrap();

        assert_eq!(winter_tz.len(), 1);
        assert!(winter_tz[0].body.contains("TZOFFSETTO:+0100"), "{}", winter_tz[0].body);
        assert!(summer_tz[0].body.contains("TZOFFSETTO:+0200"), "{}", summer_tz[0].body);
    }

    #[tokio::test]
    async fn test_one_vtimezone_per_distinct_zone() {
        let event = make_event(zoned("Europe/Zurich", 3), zoned("America/New_York", 3));

        let vtimezones = ChronoTzResolver.resolve(&event).await.unwrap();

        let tzids: Vec<&str> = vtimezones.iter().map(|v| v.tzid.as_str()).collect();
        assert_eq!(tzids, vec!["Europe/Zurich", "America/New_York"]);
    }

    #[tokio::test]
    async fn test_all_day_event_needs_no_vtimezone() {
        let start = EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
        let event = make_event(start.clone(), start);

        assert!(ChronoTzResolver.resolve(&event).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_zone_is_an_error() {
        let event = make_event(zoned("Mars/Olympus", 3), zoned("Mars/Olympus", 3));

        let err = ChronoTzResolver.resolve(&event).await.unwrap_err();
        assert!(matches!(err, InviteError::Timezone(_)), "got {err:?}");
    }
}
