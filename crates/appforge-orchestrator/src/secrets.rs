//! Trust-on-first-use secret registry

use parking_lot::Mutex;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

/// Binds an identity to the first secret it presents
pub trait SecretRegistry: Send + Sync {
    /// Bind on first contact and accept; afterwards accept only the bound secret
    fn verify(&self, identity: &str, secret: &str) -> bool;
}

/// [`SecretRegistry`] over a mutex-guarded map
///
/// The lookup and the first-write binding happen under one lock, so two
/// concurrent first requests for an identity cannot both bind.
#[derive(Debug, Default)]
pub struct InMemorySecretRegistry {
    secrets: Mutex<HashMap<String, String>>,
}

impl InMemorySecretRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of bound identities
    pub fn len(&self) -> usize {
        self.secrets.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.secrets.lock().is_empty()
    }
}

impl SecretRegistry for InMemorySecretRegistry {
    fn verify(&self, identity: &str, secret: &str) -> bool {
        match self.secrets.lock().entry(identity.to_string()) {
            Entry::Vacant(entry) => {
                entry.insert(secret.to_string());
                tracing::info!("Bound secret for {}", identity);
                true
            }
            Entry::Occupied(entry) => {
                let matches = entry.get() == secret;
                if !matches {
                    tracing::warn!("Secret mismatch for {}", identity);
                }
                matches
            }
        }
    }
}
