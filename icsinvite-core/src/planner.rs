//! Resolves the effective invite action for a save or delete operation.
//!
//! The planner is total: every combination of snapshots maps to an action,
//! `InviteActionKind::None` included. It never mutates its input.

use tracing::debug;

use crate::action::{AttendeeDelta, InviteAction, InviteActionKind};
use crate::address::{AddressStatusOracle, StatusOracle};
use crate::diff::{AttendeeDiff, InviteDataComparator, InviteFieldComparator};
use crate::email::{EmailCanonicalizer, GuessCanonicalizer};
use crate::event::Event;

pub struct InvitePlanner {
    canonicalizer: Box<dyn EmailCanonicalizer>,
    comparator: Box<dyn InviteDataComparator>,
    oracle: Box<dyn AddressStatusOracle>,
}

impl Default for InvitePlanner {
    fn default() -> Self {
        InvitePlanner {
            canonicalizer: Box::new(GuessCanonicalizer),
            comparator: Box::new(InviteFieldComparator),
            oracle: Box::new(StatusOracle),
        }
    }
}

impl InvitePlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_canonicalizer(mut self, canonicalizer: impl EmailCanonicalizer + 'static) -> Self {
        self.canonicalizer = Box::new(canonicalizer);
        self
    }

    pub fn with_comparator(mut self, comparator: impl InviteDataComparator + 'static) -> Self {
        self.comparator = Box::new(comparator);
        self
    }

    pub fn with_oracle(mut self, oracle: impl AddressStatusOracle + 'static) -> Self {
        self.oracle = Box::new(oracle);
        self
    }

    /// Plan the messages for saving `new` over `old` (absent when creating).
    ///
    /// Only `SendInvitation` is resolved here; every other kind is returned
    /// as is.
    pub fn plan_save(
        &self,
        action: &InviteAction,
        new: &Event,
        old: Option<&Event>,
        has_modified_date_times: Option<bool>,
    ) -> InviteAction {
        if action.kind != InviteActionKind::SendInvitation {
            return action.clone();
        }

        let has_new_attendees = new.has_attendees();

        let Some(old) = old else {
            if !has_new_attendees {
                debug!(uid = %new.uid, "new event without attendees, nothing to send");
                return action.with_kind(InviteActionKind::None);
            }
            // Creation: everyone gets the full invitation, no diff
            return action.clone();
        };

        let has_old_attendees = old.has_attendees();
        if !has_new_attendees && !has_old_attendees {
            debug!(uid = %new.uid, "no attendees before or after, nothing to send");
            return action.with_kind(InviteActionKind::None);
        }

        let diff = AttendeeDiff::between(&new.attendees, &old.attendees, &*self.canonicalizer);
        let has_removed_all_attendees =
            !diff.removed.is_empty() && diff.removed.len() == old.attendees.len();
        let has_attendee_changes = !diff.is_empty();
        let delta = AttendeeDelta {
            added: diff.added,
            removed: diff.removed,
            has_removed_all_attendees,
        };

        if self
            .comparator
            .has_updated_invite_data(new, old, has_modified_date_times)
        {
            let kind = if has_old_attendees {
                InviteActionKind::SendUpdate
            } else {
                InviteActionKind::SendInvitation
            };
            debug!(
                uid = %new.uid,
                %kind,
                added = delta.added.len(),
                removed = delta.removed.len(),
                "invite data changed"
            );
            return action.with_delta(kind, delta);
        }

        if !has_attendee_changes {
            debug!(uid = %new.uid, "no invite-relevant change, nothing to send");
            return action.with_kind(InviteActionKind::None);
        }

        debug!(
            uid = %new.uid,
            added = delta.added.len(),
            removed = delta.removed.len(),
            "attendees changed"
        );
        action.with_delta(action.kind, delta)
    }

    /// Plan the messages for deleting `old` (or declining it).
    pub fn plan_delete(&self, action: &InviteAction, old: Option<&Event>) -> InviteAction {
        let has_attendees = old.is_some_and(Event::has_attendees);
        let disabled = action
            .self_address
            .as_ref()
            .is_some_and(|address| self.oracle.is_disabled(address));

        match action.kind {
            InviteActionKind::CancelInvitation if !has_attendees => {
                action.with_kind(InviteActionKind::None)
            }
            InviteActionKind::CancelInvitation if disabled => {
                action.with_kind(InviteActionKind::CancelDisabled)
            }
            InviteActionKind::DeclineInvitation if disabled => {
                action.with_kind(InviteActionKind::DeclineDisabled)
            }
            _ => action.clone(),
        }
    }
}
