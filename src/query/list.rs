use chrono::{DateTime, Utc};
use tracing::debug;

use crate::cache::EntryState;
use crate::pokeapi::cache::{list_tag, ListKey};
use crate::pokeapi::cached_client::{CachedPokemonClient, ListEntry};
use crate::pokeapi::client::PokemonGateway;
use crate::pokeapi::types::Pokemon;

/// What a list of search results should render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListView {
  pub pokemon: Vec<Pokemon>,
  pub is_loading: bool,
  pub error: Option<String>,
  pub total_count: usize,
  pub page: u32,
  pub updated_at: Option<DateTime<Utc>>,
  pages: usize,
}

impl ListView {
  fn unselected() -> Self {
    Self {
      page: 1,
      ..Self::default()
    }
  }

  /// Loading, success and error are mutually exclusive; a failed or loading
  /// entry never shows items.
  fn from_entry(entry: &ListEntry) -> Self {
    let page = entry.key.page;
    match &entry.state {
      EntryState::Idle => Self {
        page,
        ..Self::default()
      },
      EntryState::Loading => Self {
        is_loading: true,
        page,
        ..Self::default()
      },
      EntryState::Success(result) => Self {
        pokemon: result.items.clone(),
        total_count: result.total_count,
        pages: result.page_count(entry.key.page_size),
        page,
        updated_at: entry.settled_at,
        ..Self::default()
      },
      EntryState::Error(message) => Self {
        error: Some(message.clone()),
        page,
        updated_at: entry.settled_at,
        ..Self::default()
      },
    }
  }

  pub fn total_pages(&self) -> usize {
    self.pages
  }
}

/// Paginated search results for one tracked (term, page) selection.
pub struct PokemonListQuery<G> {
  client: CachedPokemonClient<G>,
  key: Option<ListKey>,
}

impl<G: PokemonGateway> PokemonListQuery<G> {
  pub fn new(client: CachedPokemonClient<G>) -> Self {
    Self { client, key: None }
  }

  /// The selection currently tracked, if any
  pub fn key(&self) -> Option<&ListKey> {
    self.key.as_ref()
  }

  /// Track `term` at `page` and query it without waiting.
  ///
  /// Without an explicit page a search starts from page 1, so callers
  /// starting a fresh search never inherit the previous page.
  pub fn select(&mut self, term: &str, page: Option<u32>) -> ListView {
    let key = ListKey::new(term, page.unwrap_or(1));
    debug!(query = %key.term, page = key.page, "Selecting list query");

    let entry = self.client.search(&key);
    self.key = Some(key);
    ListView::from_entry(&entry)
  }

  /// Track `term` at `page` and wait for the result.
  pub async fn search(&mut self, term: &str, page: Option<u32>) -> ListView {
    self.select(term, page);
    self.settled().await
  }

  /// Move the tracked selection to another page of the same term.
  /// Returns `None` when nothing has been searched yet.
  pub fn go_to_page(&mut self, page: u32) -> Option<ListView> {
    let term = self.key.as_ref()?.term.clone();
    Some(self.select(&term, Some(page)))
  }

  /// Invalidate every list result and re-query the tracked selection.
  pub fn refetch(&mut self) -> ListView {
    self.client.invalidate(&list_tag());
    match &self.key {
      Some(key) => ListView::from_entry(&self.client.search(key)),
      None => ListView::unselected(),
    }
  }

  /// Current view of the tracked selection.
  ///
  /// Only the tracked key is ever read, so results that land for a
  /// selection the query has since moved away from are never shown.
  pub fn view(&self) -> ListView {
    match &self.key {
      Some(key) => ListView::from_entry(&self.client.peek_search(key)),
      None => ListView::unselected(),
    }
  }

  /// Wait until the tracked selection has settled.
  pub async fn settled(&self) -> ListView {
    match &self.key {
      Some(key) => ListView::from_entry(&self.client.settled_search(key).await),
      None => ListView::unselected(),
    }
  }
}
