//! Defines the JSON protocol used between icsinvite and external transport
//! binaries over stdin/stdout.

use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::transport::SendIcsParams;

pub trait TransportCommand: Serialize {
    type Response: DeserializeOwned;
    fn command() -> Command;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Command {
    SendIcs,
}

/// Request written to the transport's stdin.
#[derive(Debug, Serialize, Deserialize)]
pub struct Request {
    pub command: Command,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// Response read from the transport's stdout.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Response<T> {
    Success { data: T },
    Error { error: String },
}

impl TransportCommand for SendIcsParams<'_> {
    type Response = ();
    fn command() -> Command {
        Command::SendIcs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_parses_success_and_error() {
        let ok: Response<()> =
            serde_json::from_str(r#"{"status":"success","data":null}"#).unwrap();
        assert!(matches!(ok, Response::Success { .. }));

        let err: Response<()> =
            serde_json::from_str(r#"{"status":"error","error":"mailbox full"}"#).unwrap();
        match err {
            Response::Error { error } => assert_eq!(error, "mailbox full"),
            other => panic!("expected error, got {other:?}"),
        }
    }

    #[test]
    fn test_request_uses_snake_case_command() {
        let request = Request {
            command: Command::SendIcs,
            params: serde_json::json!({"subject": "hi"}),
        };
        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains(r#""command":"send_ics""#), "{json}");
    }
}
