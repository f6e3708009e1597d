use std::sync::mpsc;
use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::daemon::{ConnectError, DaemonConnection};

pub(crate) const DEFAULT_DAEMON_PORT: u16 = 58846;

/// A configured daemon endpoint, credentials included. Only the registry and
/// the probe/activation paths ever see this type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HostRecord {
    pub(crate) host_id: String,
    pub(crate) address: String,
    pub(crate) port: u16,
    pub(crate) username: String,
    pub(crate) password: String,
}

impl HostRecord {
    pub(crate) fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    pub(crate) fn display(&self) -> HostEntry {
        HostEntry {
            host_id: self.host_id.clone(),
            address: self.address.clone(),
            port: self.port,
            username: self.username.clone(),
        }
    }
}

/// Credential-free projection of a [`HostRecord`] for rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct HostEntry {
    pub(crate) host_id: String,
    pub(crate) address: String,
    pub(crate) port: u16,
    pub(crate) username: String,
}

impl HostEntry {
    pub(crate) fn label(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct DaemonInfo {
    pub(crate) version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ReachabilityStatus {
    Online(DaemonInfo),
    Offline,
}

impl ReachabilityStatus {
    pub(crate) fn is_online(&self) -> bool {
        matches!(self, ReachabilityStatus::Online(_))
    }

    pub(crate) fn info(&self) -> Option<&DaemonInfo> {
        match self {
            ReachabilityStatus::Online(info) => Some(info),
            ReachabilityStatus::Offline => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoreFile {
    pub(crate) master: MasterConfig,
    pub(crate) hosts: Vec<StoredHost>,
    #[serde(default)]
    pub(crate) settings: Settings,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct MasterConfig {
    pub(crate) salt_b64: String,
    pub(crate) check: EncryptedBlob,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct EncryptedBlob {
    pub(crate) nonce: String,
    pub(crate) ciphertext: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StoredHost {
    pub(crate) host_id: String,
    pub(crate) address: String,
    pub(crate) port: u16,
    #[serde(default)]
    pub(crate) username: String,
    pub(crate) password: EncryptedBlob,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Settings {
    #[serde(default = "default_probe_timeout_secs")]
    pub(crate) probe_timeout_secs: u64,
    #[serde(default = "default_refresh_interval_secs")]
    pub(crate) refresh_interval_secs: u64,
    #[serde(default = "default_port")]
    pub(crate) default_port: u16,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            probe_timeout_secs: default_probe_timeout_secs(),
            refresh_interval_secs: default_refresh_interval_secs(),
            default_port: default_port(),
        }
    }
}

fn default_probe_timeout_secs() -> u64 {
    5
}

fn default_refresh_interval_secs() -> u64 {
    2
}

fn default_port() -> u16 {
    DEFAULT_DAEMON_PORT
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Mode {
    Normal,
    AddHost,
    ConfirmDelete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Screen {
    Hosts,
    Session,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Field {
    Hostname,
    Port,
    Username,
    Password,
}

impl Field {
    pub(crate) const ALL: [Field; 4] = [
        Field::Hostname,
        Field::Port,
        Field::Username,
        Field::Password,
    ];
}

#[derive(Debug, Clone)]
pub(crate) struct NewHostState {
    pub(crate) hostname: String,
    pub(crate) port: String,
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) active_field: Field,
}

impl NewHostState {
    pub(crate) fn with_port(port: u16) -> Self {
        Self {
            port: port.to_string(),
            ..Self::default()
        }
    }
}

impl Default for NewHostState {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            port: DEFAULT_DAEMON_PORT.to_string(),
            username: String::new(),
            password: String::new(),
            active_field: Field::Hostname,
        }
    }
}

/// The connection the user switched to. Owned by the app until the user
/// disconnects or quits.
pub(crate) struct ActiveSession {
    pub(crate) host: HostEntry,
    pub(crate) info: Option<DaemonInfo>,
    pub(crate) connection: Box<dyn DaemonConnection>,
    pub(crate) connected_at: SystemTime,
}

pub(crate) type ActivationResult =
    Result<(Box<dyn DaemonConnection>, Option<DaemonInfo>), ConnectError>;

/// A connection attempt running on a worker thread.
pub(crate) struct PendingActivation {
    pub(crate) host: HostEntry,
    pub(crate) endpoint: String,
    pub(crate) rx: mpsc::Receiver<ActivationResult>,
}

#[derive(Debug, Clone)]
pub(crate) enum AppAction {
    OpenSession,
}

#[derive(Debug, Clone)]
pub(crate) struct Notice {
    pub(crate) title: String,
    pub(crate) message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_drops_password() {
        let record = HostRecord {
            host_id: "abc".to_string(),
            address: "10.0.0.1".to_string(),
            port: 58846,
            username: "u".to_string(),
            password: "secret".to_string(),
        };
        let entry = record.display();
        assert_eq!(entry.label(), "10.0.0.1:58846");
        assert_eq!(entry.username, "u");
        assert_eq!(record.endpoint(), entry.label());
    }

    #[test]
    fn settings_fill_missing_fields() {
        let settings: Settings = serde_json::from_str(r#"{ "probe_timeout_secs": 9 }"#).unwrap();
        assert_eq!(settings.probe_timeout_secs, 9);
        assert_eq!(settings.refresh_interval_secs, 2);
        assert_eq!(settings.default_port, DEFAULT_DAEMON_PORT);
    }

    #[test]
    fn offline_status_has_no_info() {
        let online = ReachabilityStatus::Online(DaemonInfo {
            version: "2.0".to_string(),
        });
        assert!(online.is_online());
        assert_eq!(online.info().map(|info| info.version.as_str()), Some("2.0"));
        assert!(!ReachabilityStatus::Offline.is_online());
        assert!(ReachabilityStatus::Offline.info().is_none());
    }
}
