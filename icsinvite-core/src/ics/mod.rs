//! iCalendar message generation and parsing.
//!
//! Messages follow RFC 5546 (iTIP): a VCALENDAR carrying a METHOD, the
//! VTIMEZONEs it references, and a single VEVENT.

mod generate;
mod parse;
mod timezone;

use std::fmt;

use serde::{Deserialize, Serialize};

pub use generate::{BuildOptions, IcalendarBuilder, IcsBuilder};
pub use parse::parse_event;
pub use timezone::{ChronoTzResolver, TimezoneResolver, VTimezone};

/// iTIP method of an outgoing message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum IcsMethod {
    Request,
    Cancel,
    Reply,
}

impl IcsMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            IcsMethod::Request => "REQUEST",
            IcsMethod::Cancel => "CANCEL",
            IcsMethod::Reply => "REPLY",
        }
    }
}

impl fmt::Display for IcsMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
