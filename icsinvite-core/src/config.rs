//! icsinvite configuration at ~/.config/icsinvite/config.toml

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, File};
use serde::Deserialize;

use crate::address::{AddressStatus, SelfAddress};
use crate::error::{InviteError, InviteResult};
use crate::transport::{OutboxTransport, ProcessTransport, Transport};

static DEFAULT_PROD_ID: &str = "-//icsinvite//EN";
static DEFAULT_OUTBOX_DIR: &str = "~/icsinvite/outbox";
static DEFAULT_SEND_TIMEOUT: &str = "10s";

fn default_prod_id() -> String {
    DEFAULT_PROD_ID.to_string()
}

fn default_outbox_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTBOX_DIR)
}

fn default_send_timeout() -> String {
    DEFAULT_SEND_TIMEOUT.to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct InviteConfig {
    #[serde(default = "default_prod_id")]
    pub prod_id: String,

    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,

    /// Name of an `icsinvite-transport-<name>` binary. Messages are queued
    /// in the outbox when unset.
    pub transport: Option<String>,

    #[serde(default = "default_send_timeout")]
    pub send_timeout: String,

    pub address: Option<AddressConfig>,
}

/// The address invitations are sent from.
#[derive(Debug, Deserialize, Clone)]
pub struct AddressConfig {
    pub id: String,
    pub email: String,
    pub display_name: Option<String>,
    #[serde(default)]
    pub disabled: bool,
}

impl From<&AddressConfig> for SelfAddress {
    fn from(address: &AddressConfig) -> Self {
        SelfAddress {
            id: address.id.clone(),
            email: address.email.clone(),
            display_name: address.display_name.clone(),
            status: if address.disabled {
                AddressStatus::Disabled
            } else {
                AddressStatus::Enabled
            },
        }
    }
}

impl InviteConfig {
    pub fn config_path() -> InviteResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| InviteError::Config("Could not determine config directory".into()))?
            .join("icsinvite");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the global config, writing a commented default file first if
    /// there is none.
    pub fn load() -> InviteResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    pub fn load_from(path: &Path) -> InviteResult<Self> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .build()
            .map_err(|e| InviteError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| InviteError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> InviteResult<()> {
        let contents = format!(
            "\
# icsinvite configuration

# PRODID written into every message:
# prod_id = \"{DEFAULT_PROD_ID}\"

# Where messages are queued when no transport is set:
# outbox_dir = \"{DEFAULT_OUTBOX_DIR}\"

# Send through the icsinvite-transport-<name> binary instead:
# transport = \"smtp\"
# send_timeout = \"{DEFAULT_SEND_TIMEOUT}\"

# The address you send from:
# [address]
# id = \"work\"
# email = \"you@example.com\"
# display_name = \"Your Name\"
# disabled = false
"
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                InviteError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| InviteError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }

    pub fn outbox_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.outbox_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn send_timeout(&self) -> InviteResult<Duration> {
        humantime::parse_duration(&self.send_timeout).map_err(|e| {
            InviteError::Config(format!("Invalid send_timeout '{}': {e}", self.send_timeout))
        })
    }

    pub fn self_address(&self) -> Option<SelfAddress> {
        self.address.as_ref().map(SelfAddress::from)
    }

    /// The configured transport, or the outbox when none is set.
    pub fn transport(&self) -> InviteResult<Box<dyn Transport>> {
        match self.transport {
            Some(ref name) => Ok(Box::new(
                ProcessTransport::new(name).with_timeout(self.send_timeout()?),
            )),
            None => Ok(Box::new(OutboxTransport::new(self.outbox_path()))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("icsinvite").join("config.toml");

        InviteConfig::create_default_config(&path).unwrap();
        let config = InviteConfig::load_from(&path).unwrap();

        assert_eq!(config.prod_id, "-//icsinvite//EN");
        assert_eq!(config.outbox_dir, PathBuf::from("~/icsinvite/outbox"));
        assert_eq!(config.send_timeout().unwrap(), Duration::from_secs(10));
        assert!(config.transport.is_none());
        assert!(config.self_address().is_none());
    }

    #[test]
    fn test_address_section() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "transport = \"smtp\"\nsend_timeout = \"1m 30s\"\n\n[address]\nid = \"work\"\nemail = \"me@example.com\"\ndisabled = true\n",
        )
        .unwrap();

        let config = InviteConfig::load_from(&path).unwrap();
        let address = config.self_address().unwrap();

        assert_eq!(address.id, "work");
        assert_eq!(address.display_name(), "me@example.com");
        assert_eq!(address.status, AddressStatus::Disabled);
        assert_eq!(config.transport.as_deref(), Some("smtp"));
        assert_eq!(config.send_timeout().unwrap(), Duration::from_secs(90));
    }

    #[test]
    fn test_bad_timeout_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "send_timeout = \"soon\"\n").unwrap();

        let config = InviteConfig::load_from(&path).unwrap();
        let err = config.send_timeout().unwrap_err();
        assert!(matches!(err, InviteError::Config(ref msg) if msg.contains("soon")), "{err:?}");
    }

    #[test]
    fn test_outbox_path_expands_tilde() {
        let config = InviteConfig {
            prod_id: default_prod_id(),
            outbox_dir: default_outbox_dir(),
            transport: None,
            send_timeout: default_send_timeout(),
            address: None,
        };
        let path = config.outbox_path();
        assert!(!path.to_string_lossy().starts_with('~'), "{}", path.display());
        assert!(path.ends_with("icsinvite/outbox"));
    }
}
