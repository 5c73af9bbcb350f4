//! Transport that queues each message as a JSON envelope in a directory.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::error::{InviteError, InviteResult};
use crate::transport::{SendIcsParams, Transport};

#[derive(Debug, Clone)]
pub struct OutboxTransport {
    dir: PathBuf,
}

#[derive(Serialize)]
struct Envelope<'a> {
    id: String,
    queued_at: DateTime<Utc>,
    #[serde(flatten)]
    message: &'a SendIcsParams<'a>,
}

impl OutboxTransport {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        OutboxTransport { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Transport for OutboxTransport {
    async fn send(&self, params: &SendIcsParams<'_>) -> InviteResult<()> {
        tokio::fs::create_dir_all(&self.dir).await?;

        let id = Uuid::new_v4().to_string();
        let envelope = Envelope {
            id: id.clone(),
            queued_at: Utc::now(),
            message: params,
        };
        let content = serde_json::to_string_pretty(&envelope)
            .map_err(|e| InviteError::Serialization(e.to_string()))?;

        let path = self
            .dir
            .join(format!("{}-{}.json", params.method.as_str().to_lowercase(), id));
        tokio::fs::write(&path, content).await?;

        info!(
            path = %path.display(),
            method = %params.method,
            recipients = params.to.len(),
            "queued message in outbox"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::IcsMethod;
    use crate::recipient::{ContactEmailsMap, Recipient, SendPreferencesMap};

    #[tokio::test]
    async fn test_send_writes_one_envelope_per_message() {
        let dir = tempfile::tempdir().unwrap();
        let outbox = OutboxTransport::new(dir.path().join("outbox"));
        let from = Recipient::new("me@example.com", "Me");
        let to = vec![Recipient::new("a@example.com", "A")];
        let prefs = SendPreferencesMap::new();
        let contacts = ContactEmailsMap::new();

        let params = SendIcsParams {
            method: IcsMethod::Cancel,
            ics: "BEGIN:VCALENDAR\r\nEND:VCALENDAR\r\n",
            address_id: "addr-1",
            from: &from,
            to: &to,
            subject: "Cancellation",
            send_preferences: &prefs,
            contact_emails: &contacts,
        };
        outbox.send(&params).await.unwrap();
        outbox.send(&params).await.unwrap();

        let mut entries = std::fs::read_dir(outbox.dir())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect::<Vec<_>>();
        entries.sort();
        assert_eq!(entries.len(), 2, "each send is queued separately");

        let name = entries[0].file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("cancel-") && name.ends_with(".json"), "{name}");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&entries[0]).unwrap()).unwrap();
        assert_eq!(json["method"], "CANCEL");
        assert_eq!(json["subject"], "Cancellation");
        assert_eq!(json["to"][0]["address"], "a@example.com");
        assert_eq!(json["address_id"], "addr-1");
    }
}
