pub mod delete;
pub mod reply;
pub mod save;

use std::path::Path;

use anyhow::{Context, Result};
use owo_colors::OwoColorize;

use icsinvite_core::config::InviteConfig;
use icsinvite_core::email::{EmailCanonicalizer, GuessCanonicalizer};
use icsinvite_core::ics::parse_event;
use icsinvite_core::recipient::{ContactEmailsMap, SendPreferences, SendPreferencesMap};
use icsinvite_core::{DispatchRequest, Event, IcsDispatcher, InviteAction, SelfAddress};

use crate::SendArgs;
use crate::render::Render;

/// Loaded config plus the address this run acts as.
pub struct Session {
    pub config: InviteConfig,
    pub self_address: SelfAddress,
}

impl Session {
    pub fn load(args: &SendArgs) -> Result<Self> {
        Self::from_config(InviteConfig::load()?, args)
    }

    /// `--from` replaces the configured email but keeps its id and status.
    fn from_config(config: InviteConfig, args: &SendArgs) -> Result<Self> {
        let self_address = match (config.self_address(), &args.from) {
            (Some(address), Some(from)) => SelfAddress {
                email: from.clone(),
                display_name: None,
                ..address
            },
            (Some(address), None) => address,
            (None, Some(from)) => SelfAddress::new("default", from),
            (None, None) => anyhow::bail!(
                "No address to send from.\n\n\
                Add an [address] section to {}\n\
                or pass --from <EMAIL>",
                InviteConfig::config_path()?.display()
            ),
        };

        Ok(Session {
            config,
            self_address,
        })
    }
}

pub fn read_event(path: &Path) -> Result<Event> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Could not read {}", path.display()))?;
    parse_event(&content).with_context(|| format!("No VEVENT found in {}", path.display()))
}

/// Position of `email` in the event's attendee list, by canonical email.
pub fn find_self_attendee(event: &Event, email: &str) -> Option<usize> {
    let canonicalizer = GuessCanonicalizer;
    let needle = canonicalizer.canonicalize(email);
    event
        .attendees
        .iter()
        .position(|a| canonicalizer.canonicalize(&a.email) == needle)
}

fn send_preferences(args: &SendArgs) -> SendPreferencesMap {
    args.unsendable
        .iter()
        .map(|email| {
            (
                email.clone(),
                SendPreferences::failed("marked unsendable on the command line"),
            )
        })
        .collect()
}

/// Print the planned action, then dispatch it unless this is a dry run.
pub async fn execute(
    session: &Session,
    args: &SendArgs,
    action: &InviteAction,
    event: Option<&Event>,
    cancel_event: Option<&Event>,
) -> Result<()> {
    if args.json {
        println!("{}", serde_json::to_string_pretty(action)?);
    } else {
        println!("{}", action.render());
    }

    if args.dry_run || !action.kind.sends() {
        return Ok(());
    }

    let dispatcher = IcsDispatcher::new(&session.config.prod_id, session.config.transport()?);
    let send_preferences = send_preferences(args);
    let contact_emails = ContactEmailsMap::new();

    let report = dispatcher
        .dispatch(&DispatchRequest {
            action,
            event,
            cancel_event,
            send_preferences: &send_preferences,
            contact_emails: &contact_emails,
        })
        .await;

    if !args.json {
        println!("{}", report.render());
    }

    let failed = report.failures().count();
    if failed > 0 {
        anyhow::bail!("{failed} of {} branches failed", report.outcomes.len());
    }

    if report.delivered() > 0 && session.config.transport.is_none() {
        println!(
            "{}",
            format!("Queued in {}", session.config.outbox_path().display()).dimmed()
        );
    }

    Ok(())
}
