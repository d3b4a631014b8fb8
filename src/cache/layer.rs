//! Query cache that coalesces concurrent loads and supports tag invalidation.

use chrono::Utc;
use futures::future::{BoxFuture, FutureExt};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use super::traits::{CacheEntry, EntryState, QueryKey, Tag};
use crate::error::QueryError;

/// One key's bookkeeping. `generation` increases each time a loader is
/// started, and only the loader holding the current generation may settle.
struct Slot<V> {
  state: EntryState<V>,
  tags: Vec<Tag>,
  generation: u64,
  stale: bool,
  settled_at: Option<chrono::DateTime<Utc>>,
}

impl<V: Clone> Slot<V> {
  fn new(tags: Vec<Tag>) -> Self {
    Self {
      state: EntryState::Idle,
      tags,
      generation: 0,
      stale: false,
      settled_at: None,
    }
  }

  fn snapshot<K>(&self, key: K) -> CacheEntry<K, V> {
    CacheEntry {
      key,
      state: self.state.clone(),
      stale: self.stale,
      settled_at: self.settled_at,
    }
  }

  /// Whether a query on this slot must start a new loader.
  fn needs_load(&self) -> bool {
    matches!(self.state, EntryState::Idle) || self.stale
  }
}

struct Inner<K, V> {
  slots: Mutex<HashMap<K, Slot<V>>>,
  /// Bumped after every state change so waiters can re-read
  revision: watch::Sender<u64>,
}

impl<K: QueryKey, V: Clone + Send + Sync + 'static> Inner<K, V> {
  fn lock(&self) -> MutexGuard<'_, HashMap<K, Slot<V>>> {
    self.slots.lock().unwrap_or_else(PoisonError::into_inner)
  }

  fn notify(&self) {
    self.revision.send_modify(|r| *r = r.wrapping_add(1));
  }

  /// Write a loader's result, unless a newer generation has superseded it.
  fn settle(&self, key: &K, generation: u64, result: Result<V, QueryError>) {
    {
      let mut slots = self.lock();
      let Some(slot) = slots.get_mut(key) else {
        return;
      };

      if slot.generation != generation {
        debug!(
          query = %key.description(),
          generation,
          current = slot.generation,
          "Discarding superseded result"
        );
        return;
      }

      slot.state = match result {
        Ok(value) => EntryState::Success(value),
        Err(e) => {
          warn!(query = %key.description(), error = %e, "Query failed");
          EntryState::Error(e.message())
        }
      };
      slot.settled_at = Some(Utc::now());
    }

    self.notify();
  }
}

/// In-memory query cache keyed by `K`.
///
/// Constructed once and shared by handle; clones point at the same entries.
/// Entries live for the lifetime of the cache and are never evicted, only
/// invalidated. Loaders run on the Tokio runtime, so `query` must be called
/// from within one.
pub struct QueryCache<K, V> {
  inner: Arc<Inner<K, V>>,
}

impl<K: QueryKey, V: Clone + Send + Sync + 'static> QueryCache<K, V> {
  pub fn new() -> Self {
    let (revision, _) = watch::channel(0);
    Self {
      inner: Arc::new(Inner {
        slots: Mutex::new(HashMap::new()),
        revision,
      }),
    }
  }

  /// Read the entry for `key`, starting `loader` if there is no usable entry.
  ///
  /// - Fresh success or error: returned as-is, the loader is not called
  /// - In flight: the caller attaches to the outstanding load
  /// - Missing or stale: the entry moves to `Loading` and the loader starts
  ///
  /// The state transition happens under one lock acquisition, so two callers
  /// can never both observe an idle entry and both start a loader.
  pub fn query<F, Fut>(&self, key: &K, loader: F) -> CacheEntry<K, V>
  where
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V, QueryError>> + Send + 'static,
  {
    let (entry, generation) = {
      let mut slots = self.inner.lock();
      let slot = slots
        .entry(key.clone())
        .or_insert_with(|| Slot::new(key.tags()));

      if slot.needs_load() {
        slot.generation += 1;
        slot.stale = false;
        slot.state = EntryState::Loading;
        (slot.snapshot(key.clone()), Some(slot.generation))
      } else {
        if slot.state.is_loading() {
          trace!(query = %key.description(), "Attaching to in-flight query");
        } else {
          trace!(query = %key.description(), "Cache hit");
        }
        (slot.snapshot(key.clone()), None)
      }
    };

    if let Some(generation) = generation {
      debug!(query = %key.description(), generation, "Starting loader");
      self.spawn_loader(key.clone(), generation, loader().boxed());
      self.inner.notify();
    }

    entry
  }

  fn spawn_loader(&self, key: K, generation: u64, loader: BoxFuture<'static, Result<V, QueryError>>) {
    let inner = Arc::clone(&self.inner);
    tokio::spawn(async move {
      let result = match tokio::spawn(loader).await {
        Ok(result) => result,
        Err(e) => {
          error!(query = %key.description(), error = %e, "Loader aborted");
          Err(QueryError::Unknown)
        }
      };
      inner.settle(&key, generation, result);
    });
  }

  /// Current entry for `key` without starting anything.
  pub fn peek(&self, key: &K) -> CacheEntry<K, V> {
    let slots = self.inner.lock();
    match slots.get(key) {
      Some(slot) => slot.snapshot(key.clone()),
      None => CacheEntry::idle(key.clone()),
    }
  }

  /// Mark every entry providing a tag matched by `tag` as stale.
  ///
  /// Stale entries keep their state but are no longer cache hits. Returns the
  /// number of entries marked.
  pub fn invalidate(&self, tag: &Tag) -> usize {
    let marked = {
      let mut slots = self.inner.lock();
      let mut marked = 0;
      for slot in slots.values_mut() {
        if slot.tags.iter().any(|provided| tag.matches(provided)) {
          slot.stale = true;
          marked += 1;
        }
      }
      marked
    };

    info!(tag = %tag, entries = marked, "Invalidated tag");
    if marked > 0 {
      self.inner.notify();
    }
    marked
  }

  /// Mark a single key as stale. Returns whether an entry existed.
  #[allow(dead_code)]
  pub fn invalidate_key(&self, key: &K) -> bool {
    let found = match self.inner.lock().get_mut(key) {
      Some(slot) => {
        slot.stale = true;
        true
      }
      None => false,
    };

    if found {
      info!(query = %key.description(), "Invalidated query");
      self.inner.notify();
    }
    found
  }

  /// Wait until the entry for `key` is no longer loading and return it.
  ///
  /// A loader that never resolves keeps this pending forever; callers wanting
  /// a bound should wrap it in `tokio::time::timeout`.
  pub async fn settled(&self, key: &K) -> CacheEntry<K, V> {
    let mut revisions = self.subscribe();
    loop {
      let entry = self.peek(key);
      if !entry.is_loading() || revisions.changed().await.is_err() {
        return entry;
      }
    }
  }

  /// Receiver that changes whenever any entry changes.
  fn subscribe(&self) -> watch::Receiver<u64> {
    self.inner.revision.subscribe()
  }

  pub fn len(&self) -> usize {
    self.inner.lock().len()
  }
}

impl<K: QueryKey, V: Clone + Send + Sync + 'static> Default for QueryCache<K, V> {
  fn default() -> Self {
    Self::new()
  }
}

impl<K, V> Clone for QueryCache<K, V> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}
