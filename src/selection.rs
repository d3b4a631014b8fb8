//! Pokémon the user has picked for export.

use chrono::{DateTime, Utc};

use crate::pokeapi::types::{Pokemon, PokemonDetails};

#[derive(Debug, Clone, PartialEq)]
pub struct SelectedItem {
  pub pokemon: Pokemon,
  pub details: Option<PokemonDetails>,
  pub description: Option<String>,
  pub selected_at: DateTime<Utc>,
}

impl SelectedItem {
  pub fn new(pokemon: Pokemon) -> Self {
    Self {
      pokemon,
      details: None,
      description: None,
      selected_at: Utc::now(),
    }
  }
}

/// Selected items in the order they were picked, unique by name.
#[derive(Debug, Default)]
pub struct SelectionStore {
  items: Vec<SelectedItem>,
}

impl SelectionStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Add an item unless one with the same name is already selected.
  /// Returns whether it was added.
  pub fn add(&mut self, item: SelectedItem) -> bool {
    if self.contains(&item.pokemon.name) {
      return false;
    }
    self.items.push(item);
    true
  }

  pub fn remove(&mut self, name: &str) -> bool {
    let before = self.items.len();
    self.items.retain(|item| item.pokemon.name != name);
    self.items.len() != before
  }

  pub fn clear(&mut self) {
    self.items.clear();
  }

  /// Attach fetched details to an already selected item.
  pub fn update_details(&mut self, name: &str, details: PokemonDetails, description: String) -> bool {
    match self.items.iter_mut().find(|item| item.pokemon.name == name) {
      Some(item) => {
        item.details = Some(details);
        item.description = Some(description);
        true
      }
      None => false,
    }
  }

  pub fn contains(&self, name: &str) -> bool {
    self.items.iter().any(|item| item.pokemon.name == name)
  }

  pub fn items(&self) -> &[SelectedItem] {
    &self.items
  }

  pub fn len(&self) -> usize {
    self.items.len()
  }

  pub fn is_empty(&self) -> bool {
    self.items.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(name: &str) -> SelectedItem {
    SelectedItem::new(Pokemon {
      name: name.to_string(),
      url: format!("https://pokeapi.co/api/v2/pokemon/{}/", name),
    })
  }

  fn details(name: &str) -> PokemonDetails {
    PokemonDetails {
      id: 25,
      name: name.to_string(),
      height_decimeters: 4,
      weight_decigrams: 60,
      sprite_url: None,
      types: vec!["electric".into()],
    }
  }

  #[test]
  fn test_add_ignores_duplicates() {
    let mut store = SelectionStore::new();
    assert!(store.add(item("pikachu")));
    assert!(store.add(item("bulbasaur")));
    assert!(!store.add(item("pikachu")));

    let names: Vec<&str> = store.items().iter().map(|i| i.pokemon.name.as_str()).collect();
    assert_eq!(names, ["pikachu", "bulbasaur"]);
  }

  #[test]
  fn test_names_are_case_sensitive() {
    let mut store = SelectionStore::new();
    store.add(item("pikachu"));
    assert!(store.add(item("Pikachu")));
    assert_eq!(store.len(), 2);
  }

  #[test]
  fn test_remove_and_clear() {
    let mut store = SelectionStore::new();
    store.add(item("pikachu"));
    store.add(item("bulbasaur"));

    assert!(store.remove("pikachu"));
    assert!(!store.remove("pikachu"));
    assert_eq!(store.len(), 1);

    store.clear();
    assert!(store.is_empty());
  }

  #[test]
  fn test_update_details() {
    let mut store = SelectionStore::new();
    store.add(item("pikachu"));

    assert!(store.update_details("pikachu", details("pikachu"), "Electric mouse".into()));
    assert!(!store.update_details("raichu", details("raichu"), "n/a".into()));

    let updated = &store.items()[0];
    assert_eq!(updated.details.as_ref().map(|d| d.id), Some(25));
    assert_eq!(updated.description.as_deref(), Some("Electric mouse"));
  }
}
