use std::path::Path;

use anyhow::Result;

use icsinvite_core::{InviteAction, ParticipationStatus};

use super::{Session, execute, find_self_attendee, read_event};
use crate::SendArgs;

pub async fn run(event_path: &Path, partstat: ParticipationStatus, args: &SendArgs) -> Result<()> {
    let session = Session::load(args)?;
    let event = read_event(event_path)?;
    let address = session.self_address.clone();

    let Some(index) = find_self_attendee(&event, &address.email) else {
        anyhow::bail!(
            "{} is not an attendee of '{}', nothing to reply to",
            address.email,
            event.summary
        );
    };

    let action = InviteAction::change_participation(address, index, partstat);

    execute(&session, args, &action, Some(&event), None).await
}
