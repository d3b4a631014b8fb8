//! Cached PokéAPI client that wraps a gateway with transparent caching.

use std::sync::Arc;

use crate::cache::{CacheEntry, QueryCache, Tag};

use super::cache::{DetailKey, ListKey};
use super::client::PokemonGateway;
use super::types::{PagedResult, PokemonDetails};

pub type ListEntry = CacheEntry<ListKey, PagedResult>;
pub type DetailEntry = CacheEntry<DetailKey, PokemonDetails>;

/// Gateway with transparent query caching.
///
/// Created once per session and handed to every query by clone; clones share
/// the same caches, so a result loaded through one handle is a hit for all.
pub struct CachedPokemonClient<G> {
  inner: Arc<G>,
  lists: QueryCache<ListKey, PagedResult>,
  details: QueryCache<DetailKey, PokemonDetails>,
}

impl<G: PokemonGateway> CachedPokemonClient<G> {
  pub fn new(gateway: G) -> Self {
    Self {
      inner: Arc::new(gateway),
      lists: QueryCache::new(),
      details: QueryCache::new(),
    }
  }

  /// Query one page of list results.
  ///
  /// The loader fetches the whole search window for the term and cuts the
  /// requested page out of it.
  pub fn search(&self, key: &ListKey) -> ListEntry {
    self.lists.query(key, || {
      let inner = Arc::clone(&self.inner);
      let key = key.clone();
      async move {
        let window = inner.search_pokemon(&key.term, key.window()).await?;
        Ok(window.into_page(key.page, key.page_size))
      }
    })
  }

  /// Query one Pokémon's details.
  pub fn details(&self, key: &DetailKey) -> DetailEntry {
    self.details.query(key, || {
      let inner = Arc::clone(&self.inner);
      let name = key.0.clone();
      async move { inner.get_pokemon_details(&name).await }
    })
  }

  pub fn peek_search(&self, key: &ListKey) -> ListEntry {
    self.lists.peek(key)
  }

  pub fn peek_details(&self, key: &DetailKey) -> DetailEntry {
    self.details.peek(key)
  }

  pub async fn settled_search(&self, key: &ListKey) -> ListEntry {
    self.lists.settled(key).await
  }

  pub async fn settled_details(&self, key: &DetailKey) -> DetailEntry {
    self.details.settled(key).await
  }

  pub fn resource_url(&self, id: u32) -> String {
    self.inner.resource_url(id)
  }

  /// Invalidate every list and detail entry matching `tag`.
  pub fn invalidate(&self, tag: &Tag) -> usize {
    self.lists.invalidate(tag) + self.details.invalidate(tag)
  }

  /// Number of cached (list, detail) entries
  pub fn cached_entries(&self) -> (usize, usize) {
    (self.lists.len(), self.details.len())
  }
}

impl<G> Clone for CachedPokemonClient<G> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
      lists: self.lists.clone(),
      details: self.details.clone(),
    }
  }
}
