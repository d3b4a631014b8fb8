//! Query keys and invalidation tags for PokéAPI queries.

use crate::cache::{QueryKey, Tag};

/// Fixed number of Pokémon per page.
pub const PAGE_SIZE: usize = 20;

/// How many pages of results a list query fetches in one round trip.
pub const SEARCH_WINDOW_PAGES: usize = 10;

pub const LIST_TAG: &str = "PokemonList";
pub const DETAILS_TAG: &str = "PokemonDetails";

/// Tag covering every list entry
pub fn list_tag() -> Tag {
  Tag::kind(LIST_TAG)
}

/// Tag for one Pokémon's detail entry
pub fn details_tag(name: &str) -> Tag {
  Tag::with_id(DETAILS_TAG, name)
}

// ============================================================================
// Query key types
// ============================================================================

/// Identity of one page of list results.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ListKey {
  pub term: String,
  pub page: u32,
  pub page_size: usize,
}

impl ListKey {
  /// Key for 1-based `page` of `term`. Surrounding whitespace in the term is
  /// insignificant and page 0 means page 1.
  pub fn new(term: &str, page: u32) -> Self {
    Self {
      term: term.trim().to_string(),
      page: page.max(1),
      page_size: PAGE_SIZE,
    }
  }

  /// Number of Pokémon fetched to serve this key
  pub fn window(&self) -> usize {
    self.page_size * SEARCH_WINDOW_PAGES
  }
}

impl QueryKey for ListKey {
  fn tags(&self) -> Vec<Tag> {
    vec![
      Tag::with_id(LIST_TAG, format!("{}::{}", self.term, self.page)),
      Tag::with_id(LIST_TAG, "LIST"),
    ]
  }

  fn description(&self) -> String {
    if self.term.is_empty() {
      format!("all pokemon, page {}", self.page)
    } else {
      format!("pokemon matching '{}', page {}", self.term, self.page)
    }
  }
}

/// Identity of one Pokémon's details, by exact name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DetailKey(pub String);

impl QueryKey for DetailKey {
  fn tags(&self) -> Vec<Tag> {
    vec![details_tag(&self.0)]
  }

  fn description(&self) -> String {
    format!("pokemon {}", self.0)
  }
}
