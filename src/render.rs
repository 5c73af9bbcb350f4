//! Colored terminal rendering for planned actions and dispatch reports.

use icsinvite_core::dispatch::{Branch, BranchOutcome};
use icsinvite_core::{Attendee, DispatchReport, InviteAction, InviteActionKind};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for InviteActionKind {
    fn render(&self) -> String {
        let label = self.to_string();
        match self {
            InviteActionKind::SendInvitation | InviteActionKind::ChangeParticipation => {
                label.green().to_string()
            }
            InviteActionKind::SendUpdate => label.yellow().to_string(),
            InviteActionKind::CancelInvitation | InviteActionKind::DeclineInvitation => {
                label.red().to_string()
            }
            InviteActionKind::CancelDisabled
            | InviteActionKind::DeclineDisabled
            | InviteActionKind::None => label.dimmed().to_string(),
        }
    }
}

fn render_attendee(attendee: &Attendee) -> String {
    match attendee.name {
        Some(ref name) => format!("{} <{}>", name, attendee.email),
        None => attendee.email.clone(),
    }
}

impl Render for InviteAction {
    fn render(&self) -> String {
        let mut lines = vec![format!("✉️  {}", self.kind.render())];

        if let Some(ref address) = self.self_address {
            lines.push(format!("   from {}", address.email).dimmed().to_string());
        }
        if let Some(partstat) = self.partstat {
            lines.push(format!("   as {}", partstat));
        }

        for attendee in self.added_attendees() {
            lines.push(format!("   {} {}", "+".green(), render_attendee(attendee).green()));
        }
        for attendee in self.removed_attendees() {
            lines.push(format!("   {} {}", "-".red(), render_attendee(attendee).red()));
        }
        if self.delta.as_ref().is_some_and(|d| d.has_removed_all_attendees) {
            lines.push("   (all attendees removed)".dimmed().to_string());
        }

        lines.join("\n")
    }
}

fn branch_label(branch: Branch) -> &'static str {
    match branch {
        Branch::Request => "REQUEST",
        Branch::Cancel => "CANCEL",
        Branch::Reply => "REPLY",
    }
}

impl Render for BranchOutcome {
    fn render(&self) -> String {
        let label = branch_label(self.branch);
        match self.error {
            Some(ref e) => format!("   {} {} {}", "✗".red(), label, e.to_string().red()),
            None => format!(
                "   {} {} {}",
                "✓".green(),
                label,
                format!("({} sent)", self.delivered).dimmed()
            ),
        }
    }
}

impl Render for DispatchReport {
    fn render(&self) -> String {
        if self.outcomes.is_empty() {
            return "   Nothing sent".dimmed().to_string();
        }

        self.outcomes
            .iter()
            .map(|outcome| outcome.render())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
