//! Core traits and types for the query cache.

use chrono::{DateTime, Utc};
use std::fmt;
use std::hash::Hash;

/// Trait for keys that identify a cached query.
///
/// Implementors decide which invalidation groups an entry belongs to when it
/// is first created.
pub trait QueryKey: Clone + Eq + Hash + fmt::Debug + Send + Sync + 'static {
  /// Tags attached to the entry created for this key
  fn tags(&self) -> Vec<Tag>;

  /// Human-readable description for logging
  fn description(&self) -> String;
}

/// Invalidation-group label.
///
/// A tag without an id addresses every entry of its kind, so invalidating
/// `PokemonList` also hits `PokemonList:LIST` and every per-page tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Tag {
  kind: &'static str,
  id: Option<String>,
}

impl Tag {
  pub fn kind(kind: &'static str) -> Self {
    Self { kind, id: None }
  }

  pub fn with_id(kind: &'static str, id: impl Into<String>) -> Self {
    Self {
      kind,
      id: Some(id.into()),
    }
  }

  /// Whether invalidating `self` should hit an entry that provides `provided`.
  pub fn matches(&self, provided: &Tag) -> bool {
    self.kind == provided.kind && (self.id.is_none() || self.id == provided.id)
  }
}

impl fmt::Display for Tag {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.id {
      Some(id) => write!(f, "{}:{}", self.kind, id),
      None => f.write_str(self.kind),
    }
  }
}

/// The state of a cache entry
#[derive(Debug, Clone, PartialEq)]
pub enum EntryState<V> {
  /// No query has been issued for this key
  Idle,
  /// A loader is in flight
  Loading,
  /// The loader resolved
  Success(V),
  /// The loader failed; holds the normalized message
  Error(String),
}

impl<V> EntryState<V> {
  pub fn is_loading(&self) -> bool {
    matches!(self, EntryState::Loading)
  }

  pub fn data(&self) -> Option<&V> {
    match self {
      EntryState::Success(data) => Some(data),
      _ => None,
    }
  }

  pub fn error(&self) -> Option<&str> {
    match self {
      EntryState::Error(e) => Some(e),
      _ => None,
    }
  }
}

/// Snapshot of one cache entry.
#[derive(Debug, Clone)]
pub struct CacheEntry<K, V> {
  pub key: K,
  pub state: EntryState<V>,
  /// Whether the entry was invalidated and will be refetched on next query
  #[allow(dead_code)]
  pub stale: bool,
  /// When the current state was settled
  pub settled_at: Option<DateTime<Utc>>,
}

impl<K, V> CacheEntry<K, V> {
  pub fn idle(key: K) -> Self {
    Self {
      key,
      state: EntryState::Idle,
      stale: false,
      settled_at: None,
    }
  }

  pub fn is_loading(&self) -> bool {
    self.state.is_loading()
  }

  pub fn data(&self) -> Option<&V> {
    self.state.data()
  }

  pub fn error(&self) -> Option<&str> {
    self.state.error()
  }
}
