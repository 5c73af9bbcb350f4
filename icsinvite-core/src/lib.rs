//! Calendar invitation planning and ICS dispatch.
//!
//! Given the before and after snapshots of an event and the acting user's
//! address, this crate decides which iTIP messages (REQUEST, CANCEL, REPLY)
//! must go out and sends them:
//! - [`planner::InvitePlanner`] resolves the effective [`action::InviteAction`]
//! - [`dispatch::IcsDispatcher`] builds and sends the messages it calls for
//! - [`transport`] hands them to an outbox directory or an external sender

pub mod action;
pub mod address;
pub mod config;
pub mod diff;
pub mod dispatch;
pub mod email;
pub mod error;
pub mod event;
pub mod ics;
pub mod planner;
pub mod recipient;
pub mod subject;
pub mod transport;

pub use action::{AttendeeDelta, InviteAction, InviteActionKind};
pub use address::{AddressStatus, SelfAddress};
pub use dispatch::{Branch, DispatchReport, DispatchRequest, IcsDispatcher};
pub use error::{InviteError, InviteResult};
pub use event::*;
pub use planner::InvitePlanner;
