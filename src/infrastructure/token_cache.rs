use crate::error::Result;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;

#[derive(Clone)]
struct CachedToken {
    value: String,
    expires_at: Instant,
}

/// Read-through cache for one access token.
///
/// Readers share the current token through an `RwLock`. On a miss, callers
/// queue on `generation` and re-check the slot once they hold it, so a burst
/// of concurrent misses produces exactly one call to the generator.
pub struct TokenCache {
    ttl: Duration,
    slot: RwLock<Option<CachedToken>>,
    generation: Mutex<()>,
}

impl TokenCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: RwLock::new(None),
            generation: Mutex::new(()),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    async fn current(&self) -> Option<String> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|t| t.expires_at > Instant::now())
            .map(|t| t.value.clone())
    }

    /// Returns the cached token, or generates, stores and returns a new one.
    /// A failing generator leaves the slot untouched.
    pub async fn get_or_generate<F>(&self, generate: F) -> Result<String>
    where
        F: FnOnce() -> Result<String>,
    {
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        let _generating = self.generation.lock().await;
        if let Some(token) = self.current().await {
            return Ok(token);
        }

        debug!(ttl_secs = self.ttl.as_secs(), "Generating payment hub access token");
        let value = generate()?;
        *self.slot.write().await = Some(CachedToken {
            value: value.clone(),
            expires_at: Instant::now() + self.ttl,
        });
        Ok(value)
    }

    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }
}
