/// A Pokémon list item, identified by its case-sensitive name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pokemon {
  pub name: String,
  pub url: String,
}

/// Expanded record for one Pokémon
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PokemonDetails {
  pub id: u32,
  pub name: String,
  pub height_decimeters: u32,
  pub weight_decigrams: u32,
  pub sprite_url: Option<String>,
  pub types: Vec<String>, // In slot order
}

impl PokemonDetails {
  pub fn height_meters(&self) -> f64 {
    f64::from(self.height_decimeters) / 10.0
  }

  pub fn weight_kilograms(&self) -> f64 {
    f64::from(self.weight_decigrams) / 10.0
  }

  /// One-line summary, e.g. `Height: 0.4m, Weight: 6kg, Types: electric`
  pub fn description(&self) -> String {
    format!(
      "Height: {}m, Weight: {}kg, Types: {}",
      self.height_meters(),
      self.weight_kilograms(),
      self.types.join(", ")
    )
  }
}

/// One page of list results.
///
/// `total_count` is the size of the whole match set the page was cut from,
/// not the length of `items`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PagedResult {
  pub items: Vec<Pokemon>,
  pub total_count: usize,
}

impl PagedResult {
  /// Number of pages needed to show `total_count` items.
  pub fn page_count(&self, page_size: usize) -> usize {
    if page_size == 0 {
      return 0;
    }
    self.total_count.div_ceil(page_size)
  }

  /// Cut 1-based `page` out of the fetched items.
  ///
  /// The resulting total is the number of fetched items, since pages beyond
  /// them cannot be served. Page 0 is treated as page 1.
  pub fn into_page(self, page: u32, page_size: usize) -> PagedResult {
    let total_count = self.items.len();
    let start = (page.max(1) as usize - 1).saturating_mul(page_size);
    let items = self
      .items
      .into_iter()
      .skip(start)
      .take(page_size)
      .collect();

    PagedResult { items, total_count }
  }
}
