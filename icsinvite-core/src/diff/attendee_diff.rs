use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::email::EmailCanonicalizer;
use crate::event::Attendee;

/// Attendees added and removed between two versions of an event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendeeDiff {
    pub added: Vec<Attendee>,
    pub removed: Vec<Attendee>,
}

impl AttendeeDiff {
    /// Compare attendee lists by canonical email.
    ///
    /// Both outputs keep the order of their input list and are not
    /// deduplicated. An attendee whose display name changed but whose
    /// canonical email didn't is neither added nor removed.
    pub fn between(
        new: &[Attendee],
        old: &[Attendee],
        canonicalizer: &dyn EmailCanonicalizer,
    ) -> Self {
        let new_emails = canonical_set(new, canonicalizer);
        let old_emails = canonical_set(old, canonicalizer);

        let added = new
            .iter()
            .filter(|a| !old_emails.contains(&canonicalizer.canonicalize(&a.email)))
            .cloned()
            .collect();
        let removed = old
            .iter()
            .filter(|a| !new_emails.contains(&canonicalizer.canonicalize(&a.email)))
            .cloned()
            .collect();

        AttendeeDiff { added, removed }
    }

    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

pub(crate) fn canonical_set(attendees: &[Attendee], canonicalizer: &dyn EmailCanonicalizer) -> HashSet<String> {
    attendees
        .iter()
        .map(|a| canonicalizer.canonicalize(&a.email))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::email::GuessCanonicalizer;

    fn emails(attendees: &[Attendee]) -> Vec<&str> {
        attendees.iter().map(|a| a.email.as_str()).collect()
    }

    #[test]
    fn test_diff_detects_added_and_removed_in_input_order() {
        let old = vec![
            Attendee::new("a@example.com"),
            Attendee::new("b@example.com"),
            Attendee::new("c@example.com"),
        ];
        let new = vec![
            Attendee::new("e@example.com"),
            Attendee::new("a@example.com"),
            Attendee::new("d@example.com"),
        ];

        let diff = AttendeeDiff::between(&new, &old, &GuessCanonicalizer);

        assert_eq!(emails(&diff.added), vec!["e@example.com", "d@example.com"]);
        assert_eq!(emails(&diff.removed), vec!["b@example.com", "c@example.com"]);
    }

    #[test]
    fn test_diff_matches_aliases_of_the_same_person() {
        let old = vec![Attendee::new("john.doe@gmail.com")];
        let new = vec![Attendee::new("JohnDoe+team@GMAIL.com")];

        let diff = AttendeeDiff::between(&new, &old, &GuessCanonicalizer);

        assert!(diff.is_empty(), "aliases should be the same attendee: {diff:?}");
    }

    #[test]
    fn test_display_name_change_is_not_a_diff() {
        let old = vec![Attendee::new("a@example.com").with_name("A")];
        let new = vec![Attendee::new("a@example.com").with_name("Alice")];

        let diff = AttendeeDiff::between(&new, &old, &GuessCanonicalizer);

        assert!(diff.is_empty());
    }

    #[test]
    fn test_duplicates_are_kept() {
        let old = vec![];
        let new = vec![
            Attendee::new("a@example.com"),
            Attendee::new("A@example.com"),
        ];

        let diff = AttendeeDiff::between(&new, &old, &GuessCanonicalizer);

        assert_eq!(diff.added.len(), 2);
        assert!(diff.removed.is_empty());
    }
}
