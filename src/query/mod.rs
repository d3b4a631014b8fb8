//! UI-facing queries derived from the cached client.
//!
//! Inspired by TanStack Query hooks: each query tracks one key, derives a
//! view (`items`/`details`, loading flag, error message) from the cache entry
//! for that key, and exposes actions that move the tracked key or refetch it.
//!
//! # Example
//!
//! ```ignore
//! let client = CachedPokemonClient::new(PokeApiClient::new(&config.api)?);
//! let mut list = PokemonListQuery::new(client.clone());
//!
//! let view = list.search("pika", None).await;
//! for pokemon in &view.pokemon {
//!     println!("{}", pokemon.name);
//! }
//! ```

mod detail;
mod list;

pub use detail::{DetailView, PokemonDetailQuery};
pub use list::{ListView, PokemonListQuery};
