//! Email subject lines for iTIP messages.

use crate::event::{Event, EventTime};
use crate::ics::IcsMethod;

pub trait SubjectGenerator: Send + Sync {
    /// `is_new_invitation` distinguishes a first REQUEST to a recipient from
    /// an update to someone already invited. Other methods ignore it.
    fn subject(&self, method: IcsMethod, event: &Event, is_new_invitation: bool) -> String;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSubjects;

impl SubjectGenerator for DefaultSubjects {
    fn subject(&self, method: IcsMethod, event: &Event, is_new_invitation: bool) -> String {
        let start = format_start(&event.start);
        match method {
            IcsMethod::Request if is_new_invitation => {
                format!("Invitation for an event starting on {start}")
            }
            IcsMethod::Request => format!("Update for an event starting on {start}"),
            IcsMethod::Cancel => format!("Cancellation of an event starting on {start}"),
            IcsMethod::Reply => format!("Re: Invitation for an event starting on {start}"),
        }
    }
}

const DATE_FORMAT: &str = "%A %B %-d, %Y";
const DATE_TIME_FORMAT: &str = "%A %B %-d, %Y at %-I:%M %p";

/// e.g. "Thursday March 20, 2025" or "Thursday March 20, 2025 at 3:00 PM (UTC)"
fn format_start(start: &EventTime) -> String {
    match start {
        EventTime::Date(d) => d.format(DATE_FORMAT).to_string(),
        EventTime::DateTimeUtc(dt) => format!("{} (UTC)", dt.format(DATE_TIME_FORMAT)),
        EventTime::DateTimeFloating(dt) => dt.format(DATE_TIME_FORMAT).to_string(),
        EventTime::DateTimeZoned { datetime, tzid } => {
            format!("{} ({})", datetime.format(DATE_TIME_FORMAT), tzid)
        }
    }
}
