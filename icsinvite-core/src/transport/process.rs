//! Transport subprocess protocol.
//!
//! Messages are handed to an external binary (`icsinvite-transport-<name>`,
//! e.g. an SMTP or mail-API sender) as JSON over stdin/stdout. Any
//! executable that speaks the protocol can be a transport; credentials stay
//! with the transport.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use tokio::io::AsyncWriteExt;
use tokio::process::Command as TokioCommand;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{InviteError, InviteResult};
use crate::transport::protocol::{Command, Request, Response, TransportCommand};
use crate::transport::{SendIcsParams, Transport};

pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct ProcessTransport {
    name: String,
    timeout: Duration,
}

impl ProcessTransport {
    pub fn new(name: impl Into<String>) -> Self {
        ProcessTransport {
            name: name.into(),
            timeout: DEFAULT_SEND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn binary_name(&self) -> String {
        format!("icsinvite-transport-{}", self.name)
    }

    fn binary_path(&self) -> InviteResult<PathBuf> {
        let binary_name = self.binary_name();
        which::which(&binary_name).map_err(|_| InviteError::TransportNotInstalled(binary_name))
    }

    /// Call a typed transport command and return the result.
    pub async fn call<C: TransportCommand>(&self, cmd: &C) -> InviteResult<C::Response> {
        timeout(self.timeout, self.call_raw(C::command(), cmd))
            .await
            .map_err(|_| InviteError::TransportTimeout(self.timeout.as_secs()))?
    }

    async fn call_raw<P: Serialize, R: DeserializeOwned>(
        &self,
        command: Command,
        params: &P,
    ) -> InviteResult<R> {
        let params = serde_json::to_value(params)
            .map_err(|e| InviteError::Serialization(e.to_string()))?;
        let request = Request { command, params };
        let request_json = serde_json::to_string(&request)
            .map_err(|e| InviteError::Serialization(e.to_string()))?;

        let binary_path = self.binary_path()?;
        debug!(transport = %binary_path.display(), ?command, "calling transport");

        let mut child = TokioCommand::new(&binary_path)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                InviteError::Send(format!("Failed to spawn {}: {}", binary_path.display(), e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| InviteError::Send("Transport stdin unavailable".into()))?;
        stdin
            .write_all(format!("{request_json}\n").as_bytes())
            .await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            return Err(InviteError::Send(format!(
                "Transport exited with status: {}",
                output.status.code().unwrap_or(-1)
            )));
        }

        parse_response(&String::from_utf8_lossy(&output.stdout))
    }
}

fn parse_response<R: DeserializeOwned>(response_str: &str) -> InviteResult<R> {
    if response_str.trim().is_empty() {
        return Err(InviteError::Send("Transport returned no response".into()));
    }

    let response: Response<R> = serde_json::from_str(response_str)
        .map_err(|e| InviteError::Send(format!("Failed to parse response: {}", e)))?;

    match response {
        Response::Success { data } => Ok(data),
        Response::Error { error } => Err(InviteError::Send(error)),
    }
}

#[async_trait]
impl Transport for ProcessTransport {
    async fn send(&self, params: &SendIcsParams<'_>) -> InviteResult<()> {
        self.call(params).await
    }
}
