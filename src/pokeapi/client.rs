use crate::config::ApiConfig;
use crate::error::{ErrorBody, QueryError};
use crate::pokeapi::api_types::{ApiListResponse, ApiPokemonDetails};
use crate::pokeapi::types::{PagedResult, Pokemon, PokemonDetails};
use color_eyre::{eyre::eyre, Result};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// Size of the listing fetched as the basis for local name filtering. This is
/// the practical ceiling of the catalog.
pub const SEARCH_CATALOG_LIMIT: usize = 1000;

/// Remote source of Pokémon data.
///
/// Both operations are stateless; every call is one network round trip.
pub trait PokemonGateway: Send + Sync + 'static {
  /// List Pokémon whose name contains `term` (case-insensitive), at most
  /// `limit` of them. A blank term lists the source's natural order.
  fn search_pokemon(
    &self,
    term: &str,
    limit: usize,
  ) -> impl Future<Output = std::result::Result<PagedResult, QueryError>> + Send;

  /// Fetch one Pokémon by exact name or id.
  fn get_pokemon_details(
    &self,
    name: &str,
  ) -> impl Future<Output = std::result::Result<PokemonDetails, QueryError>> + Send;

  /// Resource URL for a Pokémon id, in the form list results carry.
  fn resource_url(&self, id: u32) -> String;
}

/// Keep the Pokémon whose name contains `term`, ignoring case, truncated to
/// `limit`. The total is the number of matches before truncation.
pub fn filter_by_name(pokemon: Vec<Pokemon>, term: &str, limit: usize) -> PagedResult {
  let needle = term.to_lowercase();
  let matches: Vec<Pokemon> = pokemon
    .into_iter()
    .filter(|p| p.name.to_lowercase().contains(&needle))
    .collect();

  let total_count = matches.len();
  PagedResult {
    items: matches.into_iter().take(limit).collect(),
    total_count,
  }
}

/// PokéAPI HTTP client
#[derive(Clone)]
pub struct PokeApiClient {
  http: reqwest::Client,
  base_url: Url,
}

impl PokeApiClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let base_url = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;
    if base_url.cannot_be_a_base() {
      return Err(eyre!("API base URL cannot be a base: {}", base_url));
    }

    let mut builder = reqwest::Client::builder().user_agent(concat!("pokedex/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }
    let http = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base_url })
  }

  /// `<base>/pokemon?limit=<n>`
  fn list_url(&self, limit: usize) -> Url {
    let mut url = self.endpoint(&["pokemon"]);
    url.query_pairs_mut().append_pair("limit", &limit.to_string());
    url
  }

  /// `<base>/pokemon/<nameOrId>`
  fn details_url(&self, name: &str) -> Url {
    self.endpoint(&["pokemon", name])
  }

  fn endpoint(&self, segments: &[&str]) -> Url {
    let mut url = self.base_url.clone();
    if let Ok(mut path) = url.path_segments_mut() {
      path.pop_if_empty().extend(segments);
    }
    url
  }

  async fn get_json<T: DeserializeOwned>(&self, url: Url) -> std::result::Result<T, QueryError> {
    debug!(%url, "GET");

    let response = self.http.get(url).send().await?;
    let status = response.status();
    let body = response.bytes().await?;

    if !status.is_success() {
      let err = QueryError::http(status.as_u16());
      return Err(match ErrorBody::parse(&body) {
        Some(body) => err.with_body(body),
        None => err,
      });
    }

    Ok(serde_json::from_slice(&body)?)
  }
}

impl PokemonGateway for PokeApiClient {
  async fn search_pokemon(
    &self,
    term: &str,
    limit: usize,
  ) -> std::result::Result<PagedResult, QueryError> {
    let term = term.trim();
    let url = if term.is_empty() {
      self.list_url(limit)
    } else {
      self.list_url(SEARCH_CATALOG_LIMIT)
    };

    let response: ApiListResponse = self.get_json(url).await.map_err(|e| {
      error!(term, error = %e, "Error fetching Pokemon");
      e
    })?;

    if term.is_empty() {
      Ok(response.into_paged())
    } else {
      Ok(filter_by_name(response.into_pokemon(), term, limit))
    }
  }

  async fn get_pokemon_details(&self, name: &str) -> std::result::Result<PokemonDetails, QueryError> {
    let details: ApiPokemonDetails = self.get_json(self.details_url(name)).await.map_err(|e| {
      error!(name, error = %e, "Error fetching Pokemon details");
      e
    })?;

    Ok(details.into())
  }

  fn resource_url(&self, id: u32) -> String {
    let mut url = self.details_url(&id.to_string());
    if let Ok(mut path) = url.path_segments_mut() {
      path.push("");
    }
    url.into()
  }
}
