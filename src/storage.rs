use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use base64::engine::general_purpose::STANDARD as Base64;
use base64::Engine;
use pbkdf2::pbkdf2_hmac;
use rand_core::OsRng;
use rand_core::TryRngCore;
use rpassword::prompt_password;
use sha2::Sha256;

use crate::model::{
    EncryptedBlob, HostRecord, MasterConfig, Settings, StoreFile, StoredHost, DEFAULT_DAEMON_PORT,
};

const APP_DIR: &str = "hostwatch";
const MASTER_CHECK: &str = "hostwatch-check";
const PBKDF2_ROUNDS: u32 = 100_000;

pub(crate) const DEFAULT_HOST_ADDRESS: &str = "127.0.0.1";
pub(crate) const DEFAULT_HOST_USER: &str = "localclient";

/// Everything the registry needs after the store has been unlocked.
pub(crate) struct UnlockedStore {
    pub(crate) master: MasterConfig,
    pub(crate) master_key: Vec<u8>,
    pub(crate) hosts: Vec<HostRecord>,
    pub(crate) settings: Settings,
}

pub(crate) fn config_path() -> Result<PathBuf> {
    app_file("hosts.json")
}

pub(crate) fn log_path() -> Result<PathBuf> {
    app_file("hostwatch.log")
}

fn app_file(name: &str) -> Result<PathBuf> {
    if let Some(mut dir) = dirs::config_dir() {
        dir.push(APP_DIR);
        dir.push(name);
        return Ok(dir);
    }
    let mut fallback = std::env::current_dir().context("current dir")?;
    fallback.push(format!("{APP_DIR}-{name}"));
    Ok(fallback)
}

pub(crate) fn load_or_init_store(path: &Path) -> Result<UnlockedStore> {
    if path.exists() {
        let store = load_store(path)?;
        let master_key = prompt_existing_master(&store.master)?;
        return unlock_store(store, master_key);
    }

    let (master, master_key) = setup_master()?;
    let unlocked = UnlockedStore {
        master,
        master_key,
        hosts: vec![default_host()],
        settings: Settings::default(),
    };
    save_unlocked(path, &unlocked)?;
    Ok(unlocked)
}

pub(crate) fn unlock_store(store: StoreFile, master_key: Vec<u8>) -> Result<UnlockedStore> {
    let hosts = store
        .hosts
        .into_iter()
        .map(|host| decrypt_host(host, &master_key))
        .collect::<Result<Vec<_>>>()?;
    Ok(UnlockedStore {
        master: store.master,
        master_key,
        hosts,
        settings: store.settings,
    })
}

pub(crate) fn save_unlocked(path: &Path, unlocked: &UnlockedStore) -> Result<()> {
    let store = StoreFile {
        master: unlocked.master.clone(),
        hosts: unlocked
            .hosts
            .iter()
            .map(|host| encrypt_host(host, &unlocked.master_key))
            .collect::<Result<Vec<_>>>()?,
        settings: unlocked.settings,
    };
    save_store(path, &store)
}

pub(crate) fn default_host() -> HostRecord {
    HostRecord {
        host_id: new_host_id(),
        address: DEFAULT_HOST_ADDRESS.to_string(),
        port: DEFAULT_DAEMON_PORT,
        username: DEFAULT_HOST_USER.to_string(),
        password: String::new(),
    }
}

pub(crate) fn new_host_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub(crate) fn load_store(path: &Path) -> Result<StoreFile> {
    let content = fs::read_to_string(path).context("read host file")?;
    let store = serde_json::from_str(&content).context("parse host file")?;
    Ok(store)
}

pub(crate) fn save_store(path: &Path, store: &StoreFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).context("create config dir")?;
    }
    let content = serde_json::to_string_pretty(store).context("serialize hosts")?;
    fs::write(path, content).context("write host file")?;
    Ok(())
}

pub(crate) fn prompt_existing_master(master: &MasterConfig) -> Result<Vec<u8>> {
    loop {
        let password = prompt_password("Master password: ").context("read master password")?;
        match verify_master(master, &password) {
            Ok(key) => return Ok(key),
            Err(_) => eprintln!("Invalid master password."),
        }
    }
}

pub(crate) fn verify_master(master: &MasterConfig, password: &str) -> Result<Vec<u8>> {
    let salt = Base64.decode(&master.salt_b64).context("decode salt")?;
    let key = derive_key(password, &salt);
    match decrypt_string(&master.check, &key) {
        Ok(check) if check == MASTER_CHECK => Ok(key),
        _ => anyhow::bail!("master password mismatch"),
    }
}

pub(crate) fn setup_master() -> Result<(MasterConfig, Vec<u8>)> {
    loop {
        let password = prompt_password("Set master password: ").context("read master password")?;
        let confirm = prompt_password("Confirm master password: ").context("read confirm password")?;
        if password != confirm {
            eprintln!("Passwords do not match.");
            continue;
        }
        if password.is_empty() {
            eprintln!("Master password cannot be empty.");
            continue;
        }
        return create_master_from_password(&password);
    }
}

pub(crate) fn create_master_from_password(password: &str) -> Result<(MasterConfig, Vec<u8>)> {
    let mut salt = [0u8; 16];
    let mut rng = OsRng;
    rng.try_fill_bytes(&mut salt)
        .map_err(|err| anyhow::anyhow!("random salt failed: {err:?}"))?;
    let key = derive_key(password, &salt);
    let check = encrypt_string(MASTER_CHECK, &key)?;
    let master = MasterConfig {
        salt_b64: Base64.encode(salt),
        check,
    };
    Ok((master, key))
}

pub(crate) fn derive_key(password: &str, salt: &[u8]) -> Vec<u8> {
    let mut key = vec![0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, PBKDF2_ROUNDS, &mut key);
    key
}

pub(crate) fn encrypt_string(plaintext: &str, key: &[u8]) -> Result<EncryptedBlob> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let mut nonce_bytes = [0u8; 12];
    let mut rng = OsRng;
    rng.try_fill_bytes(&mut nonce_bytes)
        .map_err(|err| anyhow::anyhow!("random nonce failed: {err:?}"))?;
    let nonce = Nonce::from_slice(&nonce_bytes);
    let ciphertext = cipher
        .encrypt(nonce, plaintext.as_bytes())
        .map_err(|err| anyhow::anyhow!("encrypt failed: {err:?}"))?;
    Ok(EncryptedBlob {
        nonce: Base64.encode(nonce_bytes),
        ciphertext: Base64.encode(ciphertext),
    })
}

pub(crate) fn decrypt_string(blob: &EncryptedBlob, key: &[u8]) -> Result<String> {
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key));
    let nonce_bytes = Base64.decode(&blob.nonce).context("decode nonce")?;
    let ciphertext = Base64
        .decode(&blob.ciphertext)
        .context("decode ciphertext")?;
    let nonce = Nonce::from_slice(&nonce_bytes);
    let plaintext = cipher
        .decrypt(nonce, ciphertext.as_ref())
        .map_err(|err| anyhow::anyhow!("decrypt failed: {err:?}"))?;
    let text = String::from_utf8(plaintext).context("decode utf8")?;
    Ok(text)
}

pub(crate) fn encrypt_host(host: &HostRecord, key: &[u8]) -> Result<StoredHost> {
    Ok(StoredHost {
        host_id: host.host_id.clone(),
        address: host.address.clone(),
        port: host.port,
        username: host.username.clone(),
        password: encrypt_string(&host.password, key)?,
    })
}

pub(crate) fn decrypt_host(host: StoredHost, key: &[u8]) -> Result<HostRecord> {
    let password = decrypt_string(&host.password, key)
        .with_context(|| format!("decrypt password for {}:{}", host.address, host.port))?;
    Ok(HostRecord {
        host_id: host.host_id,
        address: host.address,
        port: host.port,
        username: host.username,
        password,
    })
}

#[cfg(test)]
pub(crate) fn temp_path(prefix: &str, ext: &str) -> PathBuf {
    let mut base = std::env::temp_dir();
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    base.push(format!("{prefix}-{nanos}-{}.{ext}", new_host_id()));
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(password: &str) -> HostRecord {
        HostRecord {
            host_id: new_host_id(),
            address: "10.0.0.1".to_string(),
            port: 58846,
            username: "u".to_string(),
            password: password.to_string(),
        }
    }

    #[test]
    fn host_password_round_trips_through_store() {
        let path = temp_path("hostwatch-store", "json");
        let (master, key) = create_master_from_password("master").unwrap();
        let unlocked = UnlockedStore {
            master,
            master_key: key,
            hosts: vec![record("hunter2")],
            settings: Settings::default(),
        };
        save_unlocked(&path, &unlocked).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("hunter2"));

        let store = load_store(&path).unwrap();
        let key = verify_master(&store.master, "master").unwrap();
        let reopened = unlock_store(store, key).unwrap();
        assert_eq!(reopened.hosts, unlocked.hosts);
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn wrong_master_password_is_rejected() {
        let (master, _) = create_master_from_password("right").unwrap();
        assert!(verify_master(&master, "wrong").is_err());
        assert!(verify_master(&master, "right").is_ok());
    }

    #[test]
    fn default_host_targets_local_daemon() {
        let host = default_host();
        assert_eq!(host.address, DEFAULT_HOST_ADDRESS);
        assert_eq!(host.port, DEFAULT_DAEMON_PORT);
        assert_eq!(host.username, DEFAULT_HOST_USER);
        assert_eq!(host.host_id.len(), 32);
    }

    #[test]
    fn host_ids_are_unique() {
        assert_ne!(new_host_id(), new_host_id());
    }
}
