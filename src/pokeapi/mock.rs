//! In-memory gateway for tests.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;

use crate::error::QueryError;

use super::client::{filter_by_name, PokemonGateway};
use super::types::{PagedResult, Pokemon, PokemonDetails};

#[derive(Default)]
struct Calls {
  search: AtomicUsize,
  details: AtomicUsize,
}

/// Gateway serving a fixed catalog, with call counters and a gate that can
/// hold every response in flight until released.
#[derive(Clone)]
pub struct MockGateway {
  catalog: Arc<Mutex<Vec<Pokemon>>>,
  failure: Arc<Mutex<Option<QueryError>>>,
  last_limit: Arc<Mutex<Option<usize>>>,
  calls: Arc<Calls>,
  gate: Arc<watch::Sender<bool>>,
}

impl MockGateway {
  pub fn new(names: &[&str]) -> Self {
    Self::with_catalog(names.iter().map(|name| pokemon(name)).collect())
  }

  /// Catalog of `pokemon-1` ..= `pokemon-n`
  pub fn numbered(n: usize) -> Self {
    Self::with_catalog((1..=n).map(|i| pokemon(&format!("pokemon-{}", i))).collect())
  }

  fn with_catalog(catalog: Vec<Pokemon>) -> Self {
    let (gate, _) = watch::channel(true);
    Self {
      catalog: Arc::new(Mutex::new(catalog)),
      failure: Arc::new(Mutex::new(None)),
      last_limit: Arc::new(Mutex::new(None)),
      calls: Arc::new(Calls::default()),
      gate: Arc::new(gate),
    }
  }

  /// Make every later call fail with `err`
  pub fn fail_with(&self, err: QueryError) {
    *self.failure.lock().unwrap() = Some(err);
  }

  pub fn recover(&self) {
    *self.failure.lock().unwrap() = None;
  }

  pub fn rename(&self, from: &str, to: &str) {
    for p in self.catalog.lock().unwrap().iter_mut() {
      if p.name == from {
        *p = pokemon(to);
      }
    }
  }

  /// Hold responses of calls made from now on until `release`
  pub fn hold(&self) {
    self.gate.send_replace(false);
  }

  pub fn release(&self) {
    self.gate.send_replace(true);
  }

  pub fn search_calls(&self) -> usize {
    self.calls.search.load(Ordering::SeqCst)
  }

  pub fn details_calls(&self) -> usize {
    self.calls.details.load(Ordering::SeqCst)
  }

  pub fn last_limit(&self) -> Option<usize> {
    *self.last_limit.lock().unwrap()
  }

  fn respond<T: Send + 'static>(
    &self,
    result: Result<T, QueryError>,
  ) -> impl Future<Output = Result<T, QueryError>> + Send + 'static {
    let result = match self.failure.lock().unwrap().clone() {
      Some(err) => Err(err),
      None => result,
    };
    let mut gate = self.gate.subscribe();
    async move {
      let _ = gate.wait_for(|open| *open).await;
      result
    }
  }
}

impl PokemonGateway for MockGateway {
  fn search_pokemon(
    &self,
    term: &str,
    limit: usize,
  ) -> impl Future<Output = Result<PagedResult, QueryError>> + Send {
    self.calls.search.fetch_add(1, Ordering::SeqCst);
    *self.last_limit.lock().unwrap() = Some(limit);

    let catalog = self.catalog.lock().unwrap().clone();
    let term = term.trim();
    let result = if term.is_empty() {
      PagedResult {
        total_count: catalog.len(),
        items: catalog.into_iter().take(limit).collect(),
      }
    } else {
      filter_by_name(catalog, term, limit)
    };

    self.respond(Ok(result))
  }

  fn get_pokemon_details(
    &self,
    name: &str,
  ) -> impl Future<Output = Result<PokemonDetails, QueryError>> + Send {
    self.calls.details.fetch_add(1, Ordering::SeqCst);

    let index = self
      .catalog
      .lock()
      .unwrap()
      .iter()
      .position(|p| p.name == name);
    let result = match index {
      Some(i) => Ok(details(name, i as u32 + 1)),
      None => Err(QueryError::http(404)),
    };

    self.respond(result)
  }

  fn resource_url(&self, id: u32) -> String {
    format!("https://pokeapi.co/api/v2/pokemon/{}/", id)
  }
}

pub fn pokemon(name: &str) -> Pokemon {
  Pokemon {
    name: name.to_string(),
    url: format!("https://pokeapi.co/api/v2/pokemon/{}/", name),
  }
}

pub fn details(name: &str, id: u32) -> PokemonDetails {
  PokemonDetails {
    id,
    name: name.to_string(),
    height_decimeters: 4,
    weight_decigrams: 60,
    sprite_url: Some(format!("https://img.example/{}.png", id)),
    types: vec!["electric".to_string()],
  }
}
