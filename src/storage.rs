use std::collections::HashMap;

use crate::space::Identity;

/// Key holding the last verified identity
pub const CURRENT_IDENTITY_KEY: &str = "current-user-id";

/// Key holding the per-identity verification flag
pub fn verified_key(identity: Identity) -> String {
    format!("{}-security-verified", identity.as_str())
}

/// Synchronous string key-value store scoped to one browser
///
/// Implementations never fail: an unavailable backend reads as absent and
/// ignores writes.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str);
    fn remove(&mut self, key: &str);
}

/// In-memory store, used by tests and when embedding the context directly
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a store from key/value pairs
    pub fn with_entries<'a>(pairs: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        MemoryStore {
            entries: pairs
                .into_iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) {
        self.entries.insert(key.to_string(), value.to_string());
    }

    fn remove(&mut self, key: &str) {
        self.entries.remove(key);
    }
}

#[cfg(feature = "web")]
pub use cookie_store::CookieStore;

#[cfg(feature = "web")]
mod cookie_store {
    use axum_extra::extract::cookie::{Cookie, CookieJar};

    use super::KeyValueStore;

    /// Store backed by the request's cookie jar
    ///
    /// Writes are recorded as jar deltas; hand the jar back in the response
    /// with [`CookieStore::into_jar`] so the browser persists them.
    #[derive(Debug, Default, Clone)]
    pub struct CookieStore {
        jar: CookieJar,
    }

    impl CookieStore {
        pub fn new(jar: CookieJar) -> Self {
            CookieStore { jar }
        }

        pub fn into_jar(self) -> CookieJar {
            self.jar
        }
    }

    impl KeyValueStore for CookieStore {
        fn get(&self, key: &str) -> Option<String> {
            self.jar.get(key).map(|cookie| cookie.value().to_string())
        }

        fn set(&mut self, key: &str, value: &str) {
            let cookie = Cookie::build((key.to_string(), value.to_string()))
                .path("/")
                .build();
            self.jar = std::mem::take(&mut self.jar).add(cookie);
        }

        fn remove(&mut self, key: &str) {
            let cookie = Cookie::build((key.to_string(), "")).path("/").build();
            self.jar = std::mem::take(&mut self.jar).remove(cookie);
        }
    }

}
