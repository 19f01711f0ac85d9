//! Per-identity memoization of ingested and transformed documents.
//!
//! Each identity maps to one of two states:
//!
//! ```text
//! (absent) ──load──▶ InFlight(shared future) ──ok──▶ Ready(Arc<Transformed>)
//!                              │
//!                              └──err──▶ (absent)
//! ```
//!
//! Concurrent requests for an identity that is still loading await the same
//! shared future, so ingestion runs at most once per identity. A failed load
//! is dropped from the cache and every caller that joined it receives the
//! same [`IngestError`]; the next request starts over.
//!
//! The key is the identity alone. Callers that pass different bytes under an
//! identity that is already cached get the cached document.

use crate::error::IngestError;
use crate::pipeline::transform::Transformed;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

pub type LoadResult = Result<Arc<Transformed>, IngestError>;

type SharedLoad = Shared<BoxFuture<'static, LoadResult>>;

enum Entry {
    InFlight(SharedLoad),
    Ready(Arc<Transformed>),
}

#[derive(Default)]
pub struct DocumentCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl DocumentCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached document for `identity`, joining an in-flight load
    /// or starting one with `load`.
    ///
    /// `load` is only invoked when nothing is cached or loading.
    pub async fn get_or_load<F, Fut>(&self, identity: &str, load: F) -> LoadResult
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Transformed, IngestError>> + Send + 'static,
    {
        let pending = {
            let mut entries = self.lock();
            match entries.get(identity) {
                Some(Entry::Ready(doc)) => {
                    debug!(identity, "Cache hit");
                    return Ok(Arc::clone(doc));
                }
                Some(Entry::InFlight(pending)) => {
                    debug!(identity, "Joining in-flight load");
                    pending.clone()
                }
                None => {
                    debug!(identity, "Cache miss; loading");
                    let pending = load().map(|r| r.map(Arc::new)).boxed().shared();
                    entries.insert(identity.to_string(), Entry::InFlight(pending.clone()));
                    pending
                }
            }
        };

        let result = pending.clone().await;
        self.settle(identity, &pending, &result);
        result
    }

    /// Replace our in-flight entry with its outcome. Every joined caller
    /// runs this; only the first one to see its own future still in place
    /// changes anything.
    fn settle(&self, identity: &str, pending: &SharedLoad, result: &LoadResult) {
        let mut entries = self.lock();
        let ours = matches!(
            entries.get(identity),
            Some(Entry::InFlight(current)) if current.ptr_eq(pending)
        );
        if !ours {
            return;
        }
        match result {
            Ok(doc) => {
                entries.insert(identity.to_string(), Entry::Ready(Arc::clone(doc)));
            }
            Err(e) => {
                debug!(identity, error = %e, "Load failed; evicting");
                entries.remove(identity);
            }
        }
    }

    /// Whether a finished document is cached for `identity`.
    pub fn is_ready(&self, identity: &str) -> bool {
        matches!(self.lock().get(identity), Some(Entry::Ready(_)))
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Entry>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
