use crate::errors::ClientError;
use crate::models::Credential;
use serde::{Deserialize, Serialize};
use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tracing::{info, warn};

pub const AUTH_KEY: &str = "admin-auth";

/// String key/value storage scoped to one operator session.
pub trait SessionStorage: Send + Sync {
    fn get_item(&self, key: &str) -> Option<String>;
    fn set_item(&self, key: &str, value: String);
    fn remove_item(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemorySessionStorage {
    items: RwLock<HashMap<String, String>>,
}

impl SessionStorage for MemorySessionStorage {
    fn get_item(&self, key: &str) -> Option<String> {
        let items = self.items.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        items.get(key).cloned()
    }

    fn set_item(&self, key: &str, value: String) {
        let mut items = self.items.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        items.insert(key.to_string(), value);
    }

    fn remove_item(&self, key: &str) {
        let mut items = self.items.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        items.remove(key);
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoredAuth {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

impl StoredAuth {
    fn is_valid(&self) -> bool {
        self.authenticated && self.username.as_deref().is_some_and(|name| !name.is_empty())
    }
}

#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn SessionStorage>,
}

impl CredentialStore {
    pub fn new(storage: Arc<dyn SessionStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemorySessionStorage::default()))
    }

    pub fn save(&self, username: &str, password: &str) {
        let record = StoredAuth {
            authenticated: true,
            username: Some(username.to_string()),
            password: Some(password.to_string()),
        };
        match serde_json::to_string(&record) {
            Ok(json) => {
                self.storage.set_item(AUTH_KEY, json);
                info!(username, "admin session stored");
            }
            Err(err) => warn!("failed to encode admin session: {err}"),
        }
    }

    /// Returns the stored record if it is a valid session. Corrupt or invalid
    /// records are removed.
    pub fn load(&self) -> Option<StoredAuth> {
        let raw = self.storage.get_item(AUTH_KEY)?;
        match serde_json::from_str::<StoredAuth>(&raw) {
            Ok(record) if record.is_valid() => Some(record),
            Ok(_) => {
                warn!("admin session incomplete, clearing");
                self.clear();
                None
            }
            Err(err) => {
                warn!("admin session unreadable, clearing: {err}");
                self.clear();
                None
            }
        }
    }

    pub fn clear(&self) {
        self.storage.remove_item(AUTH_KEY);
    }

    pub fn username(&self) -> Option<String> {
        self.load().and_then(|record| record.username)
    }

    pub fn is_authenticated(&self) -> bool {
        self.load().is_some()
    }

    /// Credentials for a privileged call, loaded fresh from storage.
    pub fn require(&self) -> Result<Credential, ClientError> {
        let record = self.load().ok_or(ClientError::NotLoggedIn)?;
        match (record.username, record.password) {
            (Some(username), Some(password)) if !password.is_empty() => {
                Ok(Credential { username, password })
            }
            _ => {
                warn!("admin session has no password, re-login required");
                Err(ClientError::MissingPassword)
            }
        }
    }
}
