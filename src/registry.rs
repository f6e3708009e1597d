use std::path::PathBuf;

use crate::model::{HostEntry, HostRecord, Settings};
use crate::storage::{new_host_id, save_unlocked, UnlockedStore};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub(crate) enum ValidationError {
    #[error("Invalid hostname")]
    InvalidHostname,
    #[error("Invalid port. Must be an integer")]
    InvalidPort,
    #[error("Host details already in hostlist")]
    Duplicate,
}

#[derive(Debug, thiserror::Error)]
pub(crate) enum RegistryError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

pub(crate) trait HostRegistry {
    fn list_hosts(&self) -> Vec<HostRecord>;
    fn list_hosts_display(&self) -> Vec<HostEntry>;
    fn add_host(
        &mut self,
        address: &str,
        port: &str,
        username: &str,
        password: &str,
    ) -> Result<String, RegistryError>;
    fn remove_host(&mut self, host_id: &str) -> Result<bool, RegistryError>;

    fn find_host(&self, host_id: &str) -> Option<HostRecord> {
        self.list_hosts()
            .into_iter()
            .find(|host| host.host_id == host_id)
    }
}

pub(crate) fn validate_host_info(address: &str, port: &str) -> Result<(String, u16), ValidationError> {
    let address = address.trim();
    if address.is_empty() || address.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidHostname);
    }
    let port = port
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|port| *port != 0)
        .ok_or(ValidationError::InvalidPort)?;
    Ok((address.to_string(), port))
}

/// In-memory host list holding the ordering and validation rules.
#[derive(Debug, Clone, Default)]
pub(crate) struct HostList {
    hosts: Vec<HostRecord>,
}

impl HostList {
    pub(crate) fn new(hosts: Vec<HostRecord>) -> Self {
        Self { hosts }
    }

    fn insert(
        &mut self,
        address: &str,
        port: &str,
        username: &str,
        password: &str,
    ) -> Result<String, ValidationError> {
        let (address, port) = validate_host_info(address, port)?;
        let username = username.trim();
        if self
            .hosts
            .iter()
            .any(|host| host.address == address && host.port == port && host.username == username)
        {
            return Err(ValidationError::Duplicate);
        }
        let host_id = new_host_id();
        self.hosts.push(HostRecord {
            host_id: host_id.clone(),
            address,
            port,
            username: username.to_string(),
            password: password.to_string(),
        });
        Ok(host_id)
    }

    fn remove(&mut self, host_id: &str) -> Option<(usize, HostRecord)> {
        let index = self.hosts.iter().position(|host| host.host_id == host_id)?;
        Some((index, self.hosts.remove(index)))
    }
}

impl HostRegistry for HostList {
    fn list_hosts(&self) -> Vec<HostRecord> {
        self.hosts.clone()
    }

    fn list_hosts_display(&self) -> Vec<HostEntry> {
        self.hosts.iter().map(HostRecord::display).collect()
    }

    fn add_host(
        &mut self,
        address: &str,
        port: &str,
        username: &str,
        password: &str,
    ) -> Result<String, RegistryError> {
        Ok(self.insert(address, port, username, password)?)
    }

    fn remove_host(&mut self, host_id: &str) -> Result<bool, RegistryError> {
        Ok(self.remove(host_id).is_some())
    }
}

/// Host list persisted to the encrypted store file after every mutation.
pub(crate) struct StoredHostList {
    path: PathBuf,
    store: UnlockedStore,
    list: HostList,
}

impl StoredHostList {
    pub(crate) fn new(path: PathBuf, mut store: UnlockedStore) -> Self {
        let list = HostList::new(std::mem::take(&mut store.hosts));
        Self { path, store, list }
    }

    pub(crate) fn settings(&self) -> Settings {
        self.store.settings
    }

    fn persist(&mut self) -> anyhow::Result<()> {
        self.store.hosts = self.list.list_hosts();
        let result = save_unlocked(&self.path, &self.store);
        self.store.hosts.clear();
        result
    }
}

impl HostRegistry for StoredHostList {
    fn list_hosts(&self) -> Vec<HostRecord> {
        self.list.list_hosts()
    }

    fn list_hosts_display(&self) -> Vec<HostEntry> {
        self.list.list_hosts_display()
    }

    fn add_host(
        &mut self,
        address: &str,
        port: &str,
        username: &str,
        password: &str,
    ) -> Result<String, RegistryError> {
        let host_id = self.list.insert(address, port, username, password)?;
        if let Err(err) = self.persist() {
            self.list.remove(&host_id);
            return Err(err.into());
        }
        Ok(host_id)
    }

    fn remove_host(&mut self, host_id: &str) -> Result<bool, RegistryError> {
        let Some((index, removed)) = self.list.remove(host_id) else {
            return Ok(false);
        };
        if let Err(err) = self.persist() {
            self.list.hosts.insert(index, removed);
            return Err(err.into());
        }
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{create_master_from_password, load_store, temp_path, unlock_store, verify_master};

    #[test]
    fn add_host_rejects_non_numeric_port() {
        let mut list = HostList::default();
        let err = list.add_host("host", "not-a-port", "u", "p").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::InvalidPort)
        ));
        assert!(list.list_hosts().is_empty());
    }

    #[test]
    fn validate_host_info_checks_hostname_and_range() {
        assert_eq!(
            validate_host_info("  ", "58846"),
            Err(ValidationError::InvalidHostname)
        );
        assert_eq!(
            validate_host_info("my host", "58846"),
            Err(ValidationError::InvalidHostname)
        );
        assert_eq!(validate_host_info("h", "0"), Err(ValidationError::InvalidPort));
        assert_eq!(validate_host_info("h", "70000"), Err(ValidationError::InvalidPort));
        assert_eq!(
            validate_host_info(" h ", " 58846 "),
            Ok(("h".to_string(), 58846))
        );
    }

    #[test]
    fn add_host_rejects_duplicates() {
        let mut list = HostList::default();
        list.add_host("10.0.0.1", "58846", "u", "p").unwrap();
        let err = list.add_host("10.0.0.1", "58846", "u", "other").unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Validation(ValidationError::Duplicate)
        ));
        list.add_host("10.0.0.1", "58846", "v", "p").unwrap();
        assert_eq!(list.list_hosts().len(), 2);
    }

    #[test]
    fn display_list_keeps_order_without_credentials() {
        let mut list = HostList::default();
        let first = list.add_host("10.0.0.1", "58846", "u", "p").unwrap();
        let second = list.add_host("10.0.0.2", "58847", "u", "p").unwrap();
        let display = list.list_hosts_display();
        assert_eq!(display[0].host_id, first);
        assert_eq!(display[1].host_id, second);
        assert_eq!(display[1].port, 58847);
    }

    #[test]
    fn remove_host_reports_missing_ids() {
        let mut list = HostList::default();
        let id = list.add_host("10.0.0.1", "58846", "u", "p").unwrap();
        assert!(list.remove_host(&id).unwrap());
        assert!(!list.remove_host(&id).unwrap());
        assert!(list.find_host(&id).is_none());
    }

    #[test]
    fn stored_list_persists_mutations() {
        let path = temp_path("hostwatch-registry", "json");
        let (master, master_key) = create_master_from_password("master").unwrap();
        let store = UnlockedStore {
            master,
            master_key,
            hosts: vec![],
            settings: Settings::default(),
        };
        let mut registry = StoredHostList::new(path.clone(), store);
        let keep = registry.add_host("10.0.0.1", "58846", "u", "p1").unwrap();
        let gone = registry.add_host("10.0.0.2", "58846", "u", "p2").unwrap();
        assert!(registry.remove_host(&gone).unwrap());

        let stored = load_store(&path).unwrap();
        let key = verify_master(&stored.master, "master").unwrap();
        let reopened = unlock_store(stored, key).unwrap();
        assert_eq!(reopened.hosts.len(), 1);
        assert_eq!(reopened.hosts[0].host_id, keep);
        assert_eq!(reopened.hosts[0].password, "p1");
        let _ = std::fs::remove_file(&path);
    }
}
