use keyring::{Entry, Error as KeyringError};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

const KEYRING_ACCOUNT: &str = "portal-session";
pub const KEYRING_FALLBACK_SERVICE: &str = "kr.hcms.portal";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

#[derive(Clone)]
pub struct SecretsManager {
    inner: Arc<SecretsInner>,
}

struct SecretsInner {
    /// `None` keeps tokens in memory only.
    keyring_service: Option<String>,
    session_cache: Mutex<Option<SessionTokens>>,
}

impl SecretsManager {
    /// Opens the keyring-backed store and warms the cache from it.
    pub fn initialize(service: &str) -> Result<Self, String> {
        let service = if service.trim().is_empty() {
            KEYRING_FALLBACK_SERVICE.to_string()
        } else {
            service.trim().to_string()
        };

        let manager = SecretsManager {
            inner: Arc::new(SecretsInner {
                keyring_service: Some(service),
                session_cache: Mutex::new(None),
            }),
        };

        let session = manager.load_session_from_store()?;
        *manager.cache() = session;

        Ok(manager)
    }

    pub fn in_memory() -> Self {
        SecretsManager {
            inner: Arc::new(SecretsInner {
                keyring_service: None,
                session_cache: Mutex::new(None),
            }),
        }
    }

    pub fn save_session(&self, access_token: &str, refresh_token: Option<&str>) -> Result<(), String> {
        let trimmed_token = access_token.trim();
        if trimmed_token.is_empty() {
            return Err("Access token must not be empty".into());
        }

        let session = SessionTokens {
            access_token: trimmed_token.to_string(),
            refresh_token: refresh_token
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty()),
        };

        self.persist_session(Some(&session))?;
        *self.cache() = Some(session);

        Ok(())
    }

    pub fn get_session(&self) -> Result<Option<SessionTokens>, String> {
        {
            let cache = self.cache();
            if cache.is_some() {
                return Ok(cache.clone());
            }
        }

        let session = self.load_session_from_store()?;
        *self.cache() = session.clone();
        Ok(session)
    }

    pub fn access_token(&self) -> Result<Option<String>, String> {
        Ok(self.get_session()?.map(|session| session.access_token))
    }

    pub fn clear_session(&self) -> Result<(), String> {
        self.persist_session(None)?;
        *self.cache() = None;
        Ok(())
    }

    fn cache(&self) -> MutexGuard<'_, Option<SessionTokens>> {
        self.inner
            .session_cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn load_session_from_store(&self) -> Result<Option<SessionTokens>, String> {
        let Some(entry) = self.session_entry()? else {
            return Ok(None);
        };
        match entry.get_password() {
            Ok(secret) => {
                let session = serde_json::from_str(&secret)
                    .map_err(|err| format!("Failed to decode stored session: {err}"))?;
                Ok(Some(session))
            }
            Err(KeyringError::NoEntry) => Ok(None),
            Err(err) => Err(format!("Failed to read session from keyring: {err}")),
        }
    }

    fn persist_session(&self, session: Option<&SessionTokens>) -> Result<(), String> {
        let Some(entry) = self.session_entry()? else {
            return Ok(());
        };
        match session {
            Some(data) => {
                let payload = serde_json::to_string(data)
                    .map_err(|err| format!("Failed to serialize session: {err}"))?;
                entry
                    .set_password(&payload)
                    .map_err(|err| format!("Failed to store session in keyring: {err}"))
            }
            None => match entry.delete_credential() {
                Ok(()) | Err(KeyringError::NoEntry) => Ok(()),
                Err(err) => Err(format!("Failed to delete session from keyring: {err}")),
            },
        }
    }

    fn session_entry(&self) -> Result<Option<Entry>, String> {
        match &self.inner.keyring_service {
            Some(service) => Entry::new(service, KEYRING_ACCOUNT)
                .map(Some)
                .map_err(|err| format!("Failed to open keyring entry: {err}")),
            None => Ok(None),
        }
    }
}
