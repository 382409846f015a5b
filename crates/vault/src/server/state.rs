//! Shared application state injected into every Axum handler.

use std::sync::Arc;

use card_core::{CardVault, MemoryKeyStore};

/// Application state shared across all request handlers.
///
/// [`CardVault`] is `Arc`-backed, so Axum can clone the state for each request
/// without copying the key or re-reading the store.
#[derive(Clone, Debug)]
pub struct AppState {
    /// Card field protection over the configured key store.
    pub vault: CardVault,
}

impl AppState {
    /// Create a new [`AppState`] around `vault`.
    pub fn new(vault: CardVault) -> Self {
        Self { vault }
    }
}

impl Default for AppState {
    /// Creates an [`AppState`] over an empty in-memory key store, suitable for tests.
    fn default() -> Self {
        Self::new(CardVault::new(Arc::new(MemoryKeyStore::new())))
    }
}
