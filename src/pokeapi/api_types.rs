//! Serde-deserializable types matching PokéAPI responses.
//!
//! These types are separate from domain types to allow clean deserialization
//! while keeping domain types focused on application needs.

use serde::Deserialize;

use super::types::{PagedResult, Pokemon, PokemonDetails};

// ============================================================================
// Listing endpoint: GET /pokemon?limit=<n>
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiListResponse {
  pub count: u64,
  #[allow(dead_code)]
  pub next: Option<String>,
  #[allow(dead_code)]
  pub previous: Option<String>,
  #[serde(default)]
  pub results: Vec<ApiNamedResource>,
}

#[derive(Debug, Deserialize)]
pub struct ApiNamedResource {
  pub name: String,
  pub url: String,
}

impl From<ApiNamedResource> for Pokemon {
  fn from(resource: ApiNamedResource) -> Self {
    Pokemon {
      name: resource.name,
      url: resource.url,
    }
  }
}

impl ApiListResponse {
  pub fn into_pokemon(self) -> Vec<Pokemon> {
    self.results.into_iter().map(Pokemon::from).collect()
  }

  /// Unfiltered listing as returned, with the catalog size the source reports
  pub fn into_paged(self) -> PagedResult {
    let total_count = usize::try_from(self.count).unwrap_or(usize::MAX);
    PagedResult {
      items: self.into_pokemon(),
      total_count,
    }
  }
}

// ============================================================================
// Detail endpoint: GET /pokemon/<nameOrId>
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct ApiPokemonDetails {
  pub id: u32,
  pub name: String,
  pub height: u32,
  pub weight: u32,
  #[serde(default)]
  pub sprites: ApiSprites,
  #[serde(default)]
  pub types: Vec<ApiTypeSlot>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ApiSprites {
  pub front_default: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiTypeSlot {
  #[serde(rename = "type")]
  pub type_ref: ApiTypeRef,
}

#[derive(Debug, Deserialize)]
pub struct ApiTypeRef {
  pub name: String,
}

impl From<ApiPokemonDetails> for PokemonDetails {
  fn from(api: ApiPokemonDetails) -> Self {
    PokemonDetails {
      id: api.id,
      name: api.name,
      height_decimeters: api.height,
      weight_decigrams: api.weight,
      sprite_url: api.sprites.front_default,
      types: api.types.into_iter().map(|slot| slot.type_ref.name).collect(),
    }
  }
}
