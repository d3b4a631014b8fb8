mod app;
mod cache;
mod commands;
mod config;
mod error;
mod export;
mod history;
mod logging;
mod pokeapi;
mod query;
mod selection;

use clap::{Parser, Subcommand};
use color_eyre::Result;
use std::path::PathBuf;
use tokio::io::BufReader;
use tracing::{info, warn};

use crate::commands::Action;
use crate::pokeapi::cached_client::CachedPokemonClient;
use crate::pokeapi::client::PokeApiClient;

#[derive(Parser, Debug)]
#[command(name = "pokedex")]
#[command(about = "Search PokéAPI from the terminal, with a query cache")]
#[command(version)]
struct Args {
  /// Path to config file (default: $XDG_CONFIG_HOME/pokedex/config.yaml)
  #[arg(short, long)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
  /// Search Pokémon by name and print one page of results
  Search {
    /// Name fragment to match (blank lists all)
    term: Option<String>,

    /// Page to print, starting at 1
    #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    page: u32,
  },
  /// Show details for one Pokémon
  Show { name: String },
  /// Export the named Pokémon as CSV
  Export {
    #[arg(required = true)]
    names: Vec<String>,

    /// Output file (default: <n>_pokemon_items.csv)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },
  /// Interactive session (default)
  Repl,
}

impl Cmd {
  /// One-shot commands as the session actions they run
  fn into_actions(self) -> Vec<Action> {
    match self {
      Cmd::Search { term, page } => {
        let mut actions = vec![Action::Search(term.unwrap_or_default())];
        if page > 1 {
          actions.push(Action::Page(page));
        }
        actions
      }
      Cmd::Show { name } => vec![Action::Show(name)],
      Cmd::Export { names, output } => names
        .into_iter()
        .map(Action::Select)
        .chain(std::iter::once(Action::Export(output)))
        .collect(),
      Cmd::Repl => Vec::new(),
    }
  }
}

#[tokio::main]
async fn main() -> Result<()> {
  color_eyre::install()?;

  let args = Args::parse();

  // Load configuration
  let config = config::Config::load(args.config.as_deref())?;
  let _guard = logging::init(&config.log)?;
  info!(base_url = %config.api.base_url, "Starting pokedex");

  let client = CachedPokemonClient::new(PokeApiClient::new(&config.api)?);
  let mut app = app::App::new(client);
  match history::LastSearch::in_data_dir() {
    Ok(store) => app = app.with_last_search(store),
    Err(e) => warn!(error = %e, "Last search will not be kept"),
  }
  let mut out = std::io::stdout();

  match args.command.unwrap_or(Cmd::Repl) {
    Cmd::Repl => {
      let input = BufReader::new(tokio::io::stdin());
      app.run(input, &mut out).await?;
    }
    command => {
      for action in command.into_actions() {
        app.handle(action, &mut out).await?;
      }
    }
  }

  Ok(())
}
