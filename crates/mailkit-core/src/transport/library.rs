//! Process-wide transport library lifetime.

use std::fmt;
use std::sync::{Mutex, PoisonError};

/// Global state of a transport library, shared by every session using it.
///
/// The library is initialized when the first session is created and torn
/// down when the last one is dropped. Sessions hold a [`LibraryGuard`];
/// the counter is not reachable otherwise.
pub struct TransportLibrary {
    name: &'static str,
    live: Mutex<usize>,
    init: fn(),
    teardown: fn(),
}

impl TransportLibrary {
    /// Declares a library with its one-time init and teardown hooks.
    #[must_use]
    pub const fn new(name: &'static str, init: fn(), teardown: fn()) -> Self {
        Self {
            name,
            live: Mutex::new(0),
            init,
            teardown,
        }
    }

    /// Library name, for diagnostics.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Number of live sessions.
    #[must_use]
    pub fn live_sessions(&self) -> usize {
        *self.live.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn acquire(&'static self) -> LibraryGuard {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        if *live == 0 {
            tracing::debug!(library = self.name, "Initializing transport library");
            (self.init)();
        }
        *live += 1;
        LibraryGuard { library: self }
    }

    fn release(&self) {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);
        *live = live.saturating_sub(1);
        if *live == 0 {
            tracing::debug!(library = self.name, "Tearing down transport library");
            (self.teardown)();
        }
    }
}

impl fmt::Debug for TransportLibrary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransportLibrary")
            .field("name", &self.name)
            .field("live", &self.live_sessions())
            .finish_non_exhaustive()
    }
}

/// Keeps a [`TransportLibrary`] initialized while alive.
#[derive(Debug)]
pub struct LibraryGuard {
    library: &'static TransportLibrary,
}

impl Drop for LibraryGuard {
    fn drop(&mut self) {
        self.library.release();
    }
}
