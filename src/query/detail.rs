use chrono::{DateTime, Utc};
use tracing::debug;

use crate::pokeapi::cache::{details_tag, DetailKey};
use crate::pokeapi::cached_client::{CachedPokemonClient, DetailEntry};
use crate::pokeapi::client::PokemonGateway;
use crate::pokeapi::types::PokemonDetails;

/// What a detail panel should render.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailView {
  pub details: Option<PokemonDetails>,
  pub is_loading: bool,
  pub error: Option<String>,
  pub updated_at: Option<DateTime<Utc>>,
}

impl DetailView {
  fn from_entry(entry: &DetailEntry) -> Self {
    Self {
      details: entry.data().cloned(),
      is_loading: entry.is_loading(),
      error: entry.error().map(str::to_string),
      updated_at: entry.settled_at.filter(|_| !entry.is_loading()),
    }
  }
}

/// Details for one tracked Pokémon name.
///
/// A missing or blank name tracks nothing: the view stays empty and no
/// query is made.
pub struct PokemonDetailQuery<G> {
  client: CachedPokemonClient<G>,
  key: Option<DetailKey>,
}

impl<G: PokemonGateway> PokemonDetailQuery<G> {
  pub fn new(client: CachedPokemonClient<G>) -> Self {
    Self { client, key: None }
  }

  pub fn name(&self) -> Option<&str> {
    self.key.as_ref().map(|key| key.0.as_str())
  }

  /// Track `name` and query it. A cached result for the name is used as-is.
  pub fn set_name(&mut self, name: Option<&str>) -> DetailView {
    self.key = name
      .filter(|name| !name.trim().is_empty())
      .map(|name| DetailKey(name.to_string()));

    match &self.key {
      Some(key) => {
        debug!(name = %key.0, "Selecting detail query");
        DetailView::from_entry(&self.client.details(key))
      }
      None => DetailView::default(),
    }
  }

  /// Track `name` and wait for its details.
  pub async fn load(&mut self, name: Option<&str>) -> DetailView {
    self.set_name(name);
    self.settled().await
  }

  /// Invalidate the tracked name's details and query them again.
  pub fn refetch(&mut self) -> DetailView {
    match &self.key {
      Some(key) => {
        self.client.invalidate(&details_tag(&key.0));
        DetailView::from_entry(&self.client.details(key))
      }
      None => DetailView::default(),
    }
  }

  pub fn view(&self) -> DetailView {
    match &self.key {
      Some(key) => DetailView::from_entry(&self.client.peek_details(key)),
      None => DetailView::default(),
    }
  }

  pub async fn settled(&self) -> DetailView {
    match &self.key {
      Some(key) => DetailView::from_entry(&self.client.settled_details(key).await),
      None => DetailView::default(),
    }
  }
}
