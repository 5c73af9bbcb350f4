mod commands;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use icsinvite_core::ParticipationStatus;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "icsinvite")]
#[command(about = "Plan and send calendar invitations for changed .ics events")]
struct Cli {
    /// Increase log output (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send invitations, updates and cancellations for a saved event
    Save {
        /// The event after the save (.ics)
        new: PathBuf,

        /// The event before the save, omitted for a new event
        #[arg(long)]
        old: Option<PathBuf>,

        /// The start/end changed (pass `false` to state they did not)
        #[arg(long, num_args = 0..=1, default_missing_value = "true")]
        modified_date_times: Option<bool>,

        #[command(flatten)]
        send: SendArgs,
    },
    /// Cancel a deleted event, or decline it as an attendee
    Delete {
        /// The event being deleted (.ics)
        old: PathBuf,

        /// Decline instead of cancelling
        #[arg(long)]
        decline: bool,

        #[command(flatten)]
        send: SendArgs,
    },
    /// Reply to the organizer with a new participation status
    Reply {
        /// The event being replied to (.ics)
        event: PathBuf,

        /// accepted, declined, tentative, needs-action or delegated
        #[arg(long)]
        partstat: ParticipationStatus,

        #[command(flatten)]
        send: SendArgs,
    },
}

/// Options shared by every command.
#[derive(Args, Clone)]
pub struct SendArgs {
    /// Send as this email instead of the configured address
    #[arg(long)]
    from: Option<String>,

    /// Treat this attendee as unreachable (repeatable)
    #[arg(long = "unsendable", value_name = "EMAIL")]
    unsendable: Vec<String>,

    /// Show the plan without sending anything
    #[arg(long)]
    dry_run: bool,

    /// Print the planned action as JSON
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Save {
            new,
            old,
            modified_date_times,
            send,
        } => commands::save::run(&new, old.as_deref(), modified_date_times, &send).await,
        Commands::Delete { old, decline, send } => {
            commands::delete::run(&old, decline, &send).await
        }
        Commands::Reply {
            event,
            partstat,
            send,
        } => commands::reply::run(&event, partstat, &send).await,
    }
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn modified_date_times(args: &[&str]) -> Option<bool> {
        let cli = Cli::try_parse_from(args).expect("arguments should parse");
        match cli.command {
            Commands::Save {
                modified_date_times,
                ..
            } => modified_date_times,
            _ => panic!("expected the save command"),
        }
    }

    #[test]
    fn test_modified_date_times_is_a_bare_flag() {
        assert_eq!(
            modified_date_times(&["icsinvite", "save", "new.ics", "--modified-date-times", "--dry-run"]),
            Some(true)
        );
        assert_eq!(
            modified_date_times(&["icsinvite", "save", "new.ics", "--modified-date-times"]),
            Some(true)
        );
    }

    #[test]
    fn test_modified_date_times_accepts_explicit_value() {
        assert_eq!(
            modified_date_times(&["icsinvite", "save", "new.ics", "--modified-date-times", "false"]),
            Some(false)
        );
        assert_eq!(modified_date_times(&["icsinvite", "save", "new.ics"]), None);
    }

    #[test]
    fn test_unsendable_is_repeatable() {
        let cli = Cli::try_parse_from([
            "icsinvite",
            "delete",
            "old.ics",
            "--unsendable",
            "a@example.com",
            "--unsendable",
            "b@example.com",
        ])
        .expect("arguments should parse");

        let Commands::Delete { send, decline, .. } = cli.command else {
            panic!("expected the delete command");
        };
        assert!(!decline);
        assert_eq!(send.unsendable, vec!["a@example.com", "b@example.com"]);
    }
}
