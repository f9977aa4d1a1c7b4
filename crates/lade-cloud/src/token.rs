//! Copy-on-refresh access token storage.
//!
//! The cloud client holds an access token that may be refreshed by a
//! background credential rotator; token reads must be non-blocking and see
//! a consistent snapshot. `ArcSwap` gives readers a lock-free snapshot while
//! a rotator swaps in a fresh token without blocking in-flight requests.

// Layer 1: Standard library imports
use std::sync::Arc;

// Layer 2: Third-party crate imports
use arc_swap::ArcSwap;

// Layer 3: Internal module imports (none)

/// The bearer token and any metadata needed to decide when to refresh it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub bearer: String,
}

impl Token {
    #[must_use]
    pub fn new(bearer: impl Into<String>) -> Self {
        Self { bearer: bearer.into() }
    }
}

/// A shared, lock-free cell holding the current [`Token`].
///
/// Cloning is cheap (an `Arc` bump); every clone observes refreshes made
/// through any other clone.
#[derive(Debug, Clone)]
pub struct AccessToken {
    inner: Arc<ArcSwap<Token>>,
}

impl AccessToken {
    #[must_use]
    pub fn new(initial: Token) -> Self {
        Self { inner: Arc::new(ArcSwap::new(Arc::new(initial))) }
    }

    /// Returns the current token without blocking any concurrent
    /// [`AccessToken::refresh`] call.
    #[must_use]
    pub fn load(&self) -> Arc<Token> {
        self.inner.load_full()
    }

    /// Installs a new token. Readers that already loaded the previous value
    /// keep using it until their next `load` call.
    pub fn refresh(&self, new_token: Token) {
        self.inner.store(Arc::new(new_token));
    }
}
