//! Event snapshot types.
//!
//! An [`Event`] is an immutable picture of a calendar event at one point in
//! time. The planner compares two of them (before and after a save) and the
//! dispatcher turns them into iTIP messages.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

/// A calendar event snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub uid: String,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub status: EventStatus,

    /// RRULE and EXDATEs for master events
    pub recurrence: Option<Recurrence>,
    /// Original start of an overridden instance (RECURRENCE-ID)
    pub recurrence_id: Option<EventTime>,

    /// Event organizer
    pub organizer: Option<Attendee>,
    /// Event attendees, in the order they appear in the event
    pub attendees: Vec<Attendee>,

    /// Last modification timestamp (LAST-MODIFIED)
    pub updated: Option<DateTime<Utc>>,
    /// Revision sequence number (SEQUENCE)
    pub sequence: Option<i64>,
}

impl Event {
    pub fn has_attendees(&self) -> bool {
        !self.attendees.is_empty()
    }

    /// Every TZID referenced by the event's date-time properties, deduplicated
    /// in order of first appearance.
    pub fn tzids(&self) -> Vec<&str> {
        let recurrence_times = self
            .recurrence
            .iter()
            .flat_map(|r| r.exdates.iter());

        let mut tzids: Vec<&str> = Vec::new();
        for time in [&self.start, &self.end]
            .into_iter()
            .chain(self.recurrence_id.iter())
            .chain(recurrence_times)
        {
            if let Some(tzid) = time.tzid() {
                if !tzids.contains(&tzid) {
                    tzids.push(tzid);
                }
            }
        }
        tzids
    }
}

/// An event attendee (also used for the organizer)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    /// Display name (CN)
    pub name: Option<String>,
    /// Email address, without the mailto: prefix
    pub email: String,
    /// PARTSTAT
    pub response_status: Option<ParticipationStatus>,
}

impl Attendee {
    pub fn new(email: impl Into<String>) -> Self {
        Attendee {
            name: None,
            email: email.into(),
            response_status: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Display name, falling back to the raw email
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.email)
    }
}

/// Attendee participation status (PARTSTAT)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParticipationStatus {
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
    Delegated,
}

impl ParticipationStatus {
    pub fn as_ics_str(&self) -> &'static str {
        match self {
            ParticipationStatus::NeedsAction => "NEEDS-ACTION",
            ParticipationStatus::Accepted => "ACCEPTED",
            ParticipationStatus::Declined => "DECLINED",
            ParticipationStatus::Tentative => "TENTATIVE",
            ParticipationStatus::Delegated => "DELEGATED",
        }
    }

    pub fn from_ics_str(s: &str) -> Option<Self> {
        match s.to_ascii_uppercase().as_str() {
            "NEEDS-ACTION" => Some(ParticipationStatus::NeedsAction),
            "ACCEPTED" => Some(ParticipationStatus::Accepted),
            "DECLINED" => Some(ParticipationStatus::Declined),
            "TENTATIVE" => Some(ParticipationStatus::Tentative),
            "DELEGATED" => Some(ParticipationStatus::Delegated),
            _ => None,
        }
    }
}

impl FromStr for ParticipationStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('_', "-");
        ParticipationStatus::from_ics_str(&normalized)
            .ok_or_else(|| format!("unknown participation status '{s}'"))
    }
}

impl fmt::Display for ParticipationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ics_str())
    }
}

/// Recurrence rule for a master event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurrence {
    pub rrule: String,
    pub exdates: Vec<EventTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventTime {
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    pub fn is_all_day(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// TZID of a zoned date-time. UTC identifiers don't count.
    pub fn tzid(&self) -> Option<&str> {
        match self {
            EventTime::DateTimeZoned { tzid, .. } if !is_utc_tzid(tzid) => Some(tzid),
            _ => None,
        }
    }

    /// Value part of the ICS property, e.g. `20250320T150000Z`
    pub fn to_ics_string(&self) -> String {
        match self {
            EventTime::Date(d) => d.format("%Y%m%d").to_string(),
            EventTime::DateTimeUtc(dt) => dt.format("%Y%m%dT%H%M%SZ").to_string(),
            EventTime::DateTimeFloating(dt) => dt.format("%Y%m%dT%H%M%S").to_string(),
            EventTime::DateTimeZoned { datetime, .. } => {
                datetime.format("%Y%m%dT%H%M%S").to_string()
            }
        }
    }
}

impl fmt::Display for EventTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EventTime::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            EventTime::DateTimeUtc(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M UTC")),
            EventTime::DateTimeFloating(dt) => write!(f, "{}", dt.format("%Y-%m-%d %H:%M")),
            EventTime::DateTimeZoned { datetime, tzid } => {
                write!(f, "{} ({})", datetime.format("%Y-%m-%d %H:%M"), tzid)
            }
        }
    }
}

fn is_utc_tzid(tzid: &str) -> bool {
    matches!(tzid.to_ascii_uppercase().as_str(), "UTC" | "Z" | "ETC/UTC" | "GMT")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Confirmed,
    Tentative,
    Cancelled,
}
