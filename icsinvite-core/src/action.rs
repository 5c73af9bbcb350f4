//! Invite actions: what, if anything, must be communicated for one user
//! operation.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::address::SelfAddress;
use crate::event::{Attendee, ParticipationStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteActionKind {
    SendInvitation,
    SendUpdate,
    ChangeParticipation,
    DeclineInvitation,
    DeclineDisabled,
    CancelInvitation,
    CancelDisabled,
    None,
}

impl InviteActionKind {
    /// Whether dispatching this kind can produce network traffic.
    pub fn sends(&self) -> bool {
        !matches!(
            self,
            InviteActionKind::None
                | InviteActionKind::CancelDisabled
                | InviteActionKind::DeclineDisabled
        )
    }
}

impl fmt::Display for InviteActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InviteActionKind::SendInvitation => "send invitation",
            InviteActionKind::SendUpdate => "send update",
            InviteActionKind::ChangeParticipation => "change participation",
            InviteActionKind::DeclineInvitation => "decline invitation",
            InviteActionKind::DeclineDisabled => "decline (address disabled)",
            InviteActionKind::CancelInvitation => "cancel invitation",
            InviteActionKind::CancelDisabled => "cancel (address disabled)",
            InviteActionKind::None => "nothing to send",
        };
        f.write_str(label)
    }
}

/// Attendee changes attached to a resolved save action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttendeeDelta {
    pub added: Vec<Attendee>,
    pub removed: Vec<Attendee>,
    /// At least one attendee was removed and none of the old ones remain
    pub has_removed_all_attendees: bool,
}

impl AttendeeDelta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InviteAction {
    pub kind: InviteActionKind,
    pub self_address: Option<SelfAddress>,
    /// Position of the acting user in the event's attendee list (replies)
    pub self_attendee_index: Option<usize>,
    /// New participation status (replies)
    pub partstat: Option<ParticipationStatus>,
    /// Filled in by the save planner
    pub delta: Option<AttendeeDelta>,
}

impl InviteAction {
    pub fn new(kind: InviteActionKind, self_address: Option<SelfAddress>) -> Self {
        InviteAction {
            kind,
            self_address,
            self_attendee_index: None,
            partstat: None,
            delta: None,
        }
    }

    pub fn send_invitation(self_address: SelfAddress) -> Self {
        Self::new(InviteActionKind::SendInvitation, Some(self_address))
    }

    pub fn cancel_invitation(self_address: SelfAddress) -> Self {
        Self::new(InviteActionKind::CancelInvitation, Some(self_address))
    }

    pub fn decline_invitation(self_address: SelfAddress, self_attendee_index: usize) -> Self {
        InviteAction {
            self_attendee_index: Some(self_attendee_index),
            partstat: Some(ParticipationStatus::Declined),
            ..Self::new(InviteActionKind::DeclineInvitation, Some(self_address))
        }
    }

    pub fn change_participation(
        self_address: SelfAddress,
        self_attendee_index: usize,
        partstat: ParticipationStatus,
    ) -> Self {
        InviteAction {
            self_attendee_index: Some(self_attendee_index),
            partstat: Some(partstat),
            ..Self::new(InviteActionKind::ChangeParticipation, Some(self_address))
        }
    }

    /// Same action with a different kind. Turning into `None` drops the delta.
    pub fn with_kind(&self, kind: InviteActionKind) -> Self {
        let delta = match kind {
            InviteActionKind::None => None,
            _ => self.delta.clone(),
        };
        InviteAction {
            kind,
            delta,
            ..self.clone()
        }
    }

    pub fn with_delta(&self, kind: InviteActionKind, delta: AttendeeDelta) -> Self {
        InviteAction {
            kind,
            delta: Some(delta),
            ..self.clone()
        }
    }

    pub fn added_attendees(&self) -> &[Attendee] {
        self.delta.as_ref().map(|d| d.added.as_slice()).unwrap_or_default()
    }

    pub fn removed_attendees(&self) -> &[Attendee] {
        self.delta
            .as_ref()
            .map(|d| d.removed.as_slice())
            .unwrap_or_default()
    }
}
