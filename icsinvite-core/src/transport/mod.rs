//! Delivery of iTIP messages.
//!
//! A [`Transport`] sends one message to a list of recipients. It owns any
//! timeout policy; the dispatcher enforces none.

mod outbox;
mod process;
pub mod protocol;

use async_trait::async_trait;
use serde::Serialize;

use crate::error::InviteResult;
use crate::ics::IcsMethod;
use crate::recipient::{ContactEmailsMap, Recipient, SendPreferencesMap};

pub use outbox::OutboxTransport;
pub use process::ProcessTransport;

/// Everything a transport needs to send one message.
#[derive(Debug, Clone, Serialize)]
pub struct SendIcsParams<'a> {
    pub method: IcsMethod,
    pub ics: &'a str,
    pub address_id: &'a str,
    pub from: &'a Recipient,
    pub to: &'a [Recipient],
    pub subject: &'a str,
    pub send_preferences: &'a SendPreferencesMap,
    pub contact_emails: &'a ContactEmailsMap,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one message. Errors are transport-level failures.
    async fn send(&self, params: &SendIcsParams<'_>) -> InviteResult<()>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Box<T> {
    async fn send(&self, params: &SendIcsParams<'_>) -> InviteResult<()> {
        (**self).send(params).await
    }
}
