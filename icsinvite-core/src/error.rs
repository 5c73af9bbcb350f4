//! Error types for invitation planning and dispatch.

use thiserror::Error;

/// Errors that can occur while building or sending invitation messages.
#[derive(Error, Debug)]
pub enum InviteError {
    #[error("Missing invitation data: {0}")]
    Precondition(String),

    #[error("Cannot send from a disabled address: {0}")]
    AddressDisabled(String),

    #[error("Send failed: {0}")]
    Send(String),

    #[error("Timezone error: {0}")]
    Timezone(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error("ICS generation error: {0}")]
    IcsGenerate(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Transport '{0}' not found in PATH")]
    TransportNotInstalled(String),

    #[error("Transport request timed out after {0}s")]
    TransportTimeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("{} sends failed: {}", .0.len(), join_errors(.0))]
    Multiple(Vec<InviteError>),
}

fn join_errors(errors: &[InviteError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type alias for invitation operations.
pub type InviteResult<T> = Result<T, InviteError>;
