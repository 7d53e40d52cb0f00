use crate::cache::Cache;
use crate::context::ContextName;
use log::debug;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    /// The context the token was issued for.
    pub context: ContextName,
    pub token: String,
}

/// Where the login token lives between requests.
pub trait TokenStore {
    fn load(&self) -> Option<String>;
    fn save(&self, token: &str) -> Result<(), crate::Error>;
    fn clear(&self) -> Result<(), crate::Error>;
}

/// Keeps the token in the file cache, next to the context it belongs to.
pub struct CachedTokenStore {
    cache: Cache,
    context: ContextName,
}

impl CachedTokenStore {
    pub fn new(cache: Cache, context: ContextName) -> Self {
        CachedTokenStore { cache, context }
    }
}

impl TokenStore for CachedTokenStore {
    fn load(&self) -> Option<String> {
        match self.cache.read::<AuthToken, _>(&self.context) {
            Ok(token) => Some(token.token),
            Err(error) => {
                debug!("No token for context {}: {error}", self.context);
                None
            }
        }
    }

    fn save(&self, token: &str) -> Result<(), crate::Error> {
        self.cache.write(&AuthToken {
            context: self.context.clone(),
            token: token.to_string(),
        })
    }

    fn clear(&self) -> Result<(), crate::Error> {
        self.cache.remove::<AuthToken, _>(&self.context)
    }
}

/// Forgets everything when dropped.
#[derive(Default)]
pub struct MemoryTokenStore {
    token: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn with_token(token: &str) -> Self {
        MemoryTokenStore {
            token: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn load(&self) -> Option<String> {
        self.token.lock().ok()?.clone()
    }

    fn save(&self, token: &str) -> Result<(), crate::Error> {
        if let Ok(mut stored) = self.token.lock() {
            *stored = Some(token.to_string());
        }

        Ok(())
    }

    fn clear(&self) -> Result<(), crate::Error> {
        if let Ok(mut stored) = self.token.lock() {
            *stored = None;
        }

        Ok(())
    }
}
