//! Cancellation and the one-search-at-a-time guard.

use crate::error::MatchError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// A cancel flag shared between a front end and a running batch.
///
/// Once cancelled it stays cancelled; a new run gets a new token.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation. Takes effect before the next target is searched.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Serializes batch searches for a front end.
///
/// Starting a second search while one is running is refused rather than
/// interleaved.
#[derive(Debug, Default)]
pub struct SearchSession {
    running: AtomicBool,
    token: Mutex<CancellationToken>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a search as running and hand out a fresh cancellation token.
    pub fn begin(&self) -> Result<SearchGuard<'_>, MatchError> {
        self.running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| MatchError::SearchInProgress)?;

        let token = CancellationToken::new();
        *self.token.lock().unwrap_or_else(|e| e.into_inner()) = token.clone();

        Ok(SearchGuard {
            session: self,
            token,
        })
    }

    /// Cancel whatever search is running. A no-op when idle.
    pub fn cancel(&self) {
        self.token
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .cancel();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

/// Held for the duration of one search; releases the session on drop.
pub struct SearchGuard<'a> {
    session: &'a SearchSession,
    token: CancellationToken,
}

impl SearchGuard<'_> {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

impl Drop for SearchGuard<'_> {
    fn drop(&mut self) {
        self.session.running.store(false, Ordering::SeqCst);
    }
}
