//! Mail recipients and the send-preference lookups that gate them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::email::EmailCanonicalizer;
use crate::event::Attendee;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub address: String,
    pub name: String,
}

impl Recipient {
    pub fn new(address: impl Into<String>, name: impl Into<String>) -> Self {
        Recipient {
            address: address.into(),
            name: name.into(),
        }
    }
}

impl From<&Attendee> for Recipient {
    fn from(attendee: &Attendee) -> Self {
        Recipient::new(&attendee.email, attendee.display_name())
    }
}

/// Outcome of resolving how to send to one address.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SendPreferences {
    #[serde(default)]
    pub encrypt: bool,
    #[serde(default)]
    pub sign: bool,
    /// Set when preferences could not be resolved; the address must be skipped
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SendPreferences {
    pub fn failed(reason: impl Into<String>) -> Self {
        SendPreferences {
            error: Some(reason.into()),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContactEmail {
    pub contact_id: String,
    pub email: String,
    pub name: String,
}

pub type SendPreferencesMap = HashMap<String, SendPreferences>;
pub type ContactEmailsMap = HashMap<String, ContactEmail>;

/// Keep the attendees we can safely send to.
///
/// An attendee is dropped when the entry for its raw email (or, failing
/// that, its canonical email) carries an error. Unknown addresses are kept.
pub fn filter_sendable(
    attendees: &[Attendee],
    send_preferences: &SendPreferencesMap,
    canonicalizer: &dyn EmailCanonicalizer,
) -> Vec<Recipient> {
    attendees
        .iter()
        .filter(|attendee| {
            let prefs = send_preferences.get(&attendee.email).or_else(|| {
                send_preferences.get(&canonicalizer.canonicalize(&attendee.email))
            });
            !prefs.is_some_and(|p| p.error.is_some())
        })
        .map(Recipient::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::GuessCanonicalizer;

    #[test]
    fn test_filter_drops_errored_and_keeps_unknown() {
        let attendees = vec![
            Attendee::new("ok@example.com").with_name("Ok"),
            Attendee::new("broken@example.com"),
            Attendee::new("unknown@example.com"),
        ];
        let mut prefs = SendPreferencesMap::new();
        prefs.insert("ok@example.com".to_string(), SendPreferences::default());
        prefs.insert(
            "broken@example.com".to_string(),
            SendPreferences::failed("no valid key"),
        );

        let recipients = filter_sendable(&attendees, &prefs, &GuessCanonicalizer);

        assert_eq!(
            recipients,
            vec![
                Recipient::new("ok@example.com", "Ok"),
                Recipient::new("unknown@example.com", "unknown@example.com"),
            ]
        );
    }

    #[test]
    fn test_filter_falls_back_to_canonical_key() {
        let attendees = vec![Attendee::new("Jane.Doe@gmail.com")];
        let mut prefs = SendPreferencesMap::new();
        prefs.insert("janedoe@gmail.com".to_string(), SendPreferences::failed("bad"));

        assert!(filter_sendable(&attendees, &prefs, &GuessCanonicalizer).is_empty());
    }

    #[test]
    fn test_filter_sends_to_raw_address() {
        let attendees = vec![Attendee::new("Jane.Doe+x@gmail.com")];
        let recipients = filter_sendable(&attendees, &SendPreferencesMap::new(), &GuessCanonicalizer);

        assert_eq!(recipients[0].address, "Jane.Doe+x@gmail.com");
    }
}
