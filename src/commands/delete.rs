use std::path::Path;

use anyhow::Result;

use icsinvite_core::{InviteAction, InvitePlanner};

use super::{Session, execute, find_self_attendee, read_event};
use crate::SendArgs;

pub async fn run(old_path: &Path, decline: bool, args: &SendArgs) -> Result<()> {
    let session = Session::load(args)?;
    let old = read_event(old_path)?;
    let address = session.self_address.clone();

    let action = if decline {
        let Some(index) = find_self_attendee(&old, &address.email) else {
            anyhow::bail!(
                "{} is not an attendee of '{}', nothing to decline",
                address.email,
                old.summary
            );
        };
        InviteAction::decline_invitation(address, index)
    } else {
        InviteAction::cancel_invitation(address)
    };

    let action = InvitePlanner::new().plan_delete(&action, Some(&old));

    execute(&session, args, &action, Some(&old), Some(&old)).await
}
