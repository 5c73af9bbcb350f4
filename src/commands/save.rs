use std::path::Path;

use anyhow::Result;

use icsinvite_core::{InviteAction, InvitePlanner};

use super::{Session, execute, read_event};
use crate::SendArgs;

pub async fn run(
    new_path: &Path,
    old_path: Option<&Path>,
    modified_date_times: Option<bool>,
    args: &SendArgs,
) -> Result<()> {
    let session = Session::load(args)?;
    let new = read_event(new_path)?;
    let old = old_path.map(read_event).transpose()?;

    let action = InvitePlanner::new().plan_save(
        &InviteAction::send_invitation(session.self_address.clone()),
        &new,
        old.as_ref(),
        modified_date_times,
    );

    execute(&session, args, &action, Some(&new), old.as_ref()).await
}
