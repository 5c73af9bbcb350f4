//! The acting (self) address and its send status.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressStatus {
    #[default]
    Enabled,
    Disabled,
}

/// The address the user is acting as when saving, deleting or replying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelfAddress {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub status: AddressStatus,
}

impl SelfAddress {
    pub fn new(id: impl Into<String>, email: impl Into<String>) -> Self {
        SelfAddress {
            id: id.into(),
            email: email.into(),
            display_name: None,
            status: AddressStatus::Enabled,
        }
    }

    pub fn disabled(mut self) -> Self {
        self.status = AddressStatus::Disabled;
        self
    }

    /// Display name, falling back to the email
    pub fn display_name(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.email)
    }
}

/// Decides whether an address may be used to send messages.
pub trait AddressStatusOracle: Send + Sync {
    fn is_disabled(&self, address: &SelfAddress) -> bool;
}

/// Reads the status carried on the address itself.
#[derive(Debug, Clone, Copy, Default)]
pub struct StatusOracle;

impl AddressStatusOracle for StatusOracle {
    fn is_disabled(&self, address: &SelfAddress) -> bool {
        address.status == AddressStatus::Disabled
    }
}
