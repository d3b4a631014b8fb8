use color_eyre::Result;
use std::io::Write;
use std::path::Path;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::debug;

use crate::commands::{self, Action};
use crate::export;
use crate::history::LastSearch;
use crate::pokeapi::cache::PAGE_SIZE;
use crate::pokeapi::cached_client::CachedPokemonClient;
use crate::pokeapi::client::PokemonGateway;
use crate::pokeapi::types::Pokemon;
use crate::query::{DetailView, ListView, PokemonDetailQuery, PokemonListQuery};
use crate::selection::{SelectedItem, SelectionStore};

const PROMPT: &str = "pokedex> ";

/// Interactive session state.
///
/// All queries share one cached client, so a name looked up while selecting
/// is a cache hit when shown later and the other way round.
pub struct App<G> {
  client: CachedPokemonClient<G>,
  list: PokemonListQuery<G>,
  detail: PokemonDetailQuery<G>,
  // Lookups made by `select`, kept apart from what the user is browsing
  lookup: PokemonListQuery<G>,
  enrich: PokemonDetailQuery<G>,
  selection: SelectionStore,
  // Page count of the last list that loaded, kept while a page is failing
  known_pages: Option<u32>,
  last_search: Option<LastSearch>,
  should_quit: bool,
}

impl<G: PokemonGateway> App<G> {
  pub fn new(client: CachedPokemonClient<G>) -> Self {
    Self {
      list: PokemonListQuery::new(client.clone()),
      detail: PokemonDetailQuery::new(client.clone()),
      lookup: PokemonListQuery::new(client.clone()),
      enrich: PokemonDetailQuery::new(client.clone()),
      client,
      selection: SelectionStore::new(),
      known_pages: None,
      last_search: None,
      should_quit: false,
    }
  }

  /// Persist the search term in `store` and restore it when a session starts.
  pub fn with_last_search(mut self, store: LastSearch) -> Self {
    self.last_search = Some(store);
    self
  }

  /// Read commands line by line until `quit` or end of input.
  pub async fn run<R, W>(&mut self, input: R, out: &mut W) -> Result<()>
  where
    R: AsyncBufRead + Unpin,
    W: Write,
  {
    writeln!(out, "Type 'help' for commands.")?;

    if let Some(term) = self.last_search.as_ref().and_then(LastSearch::load) {
      writeln!(out, "Restoring last search: {}", term)?;
      self.handle(Action::Search(term), out).await?;
    }

    let mut lines = input.lines();

    loop {
      write!(out, "{}", PROMPT)?;
      out.flush()?;

      let Some(line) = lines.next_line().await? else {
        break;
      };

      match commands::parse(&line) {
        Ok(Some(action)) => self.handle(action, out).await?,
        Ok(None) => {}
        Err(e) => writeln!(out, "{}", e)?,
      }

      if self.should_quit {
        break;
      }
    }

    writeln!(out)?;
    Ok(())
  }

  /// Execute one action, writing its outcome to `out`.
  pub async fn handle<W: Write>(&mut self, action: Action, out: &mut W) -> Result<()> {
    debug!(?action, "Handling command");

    match action {
      Action::Search(term) => {
        if let Some(store) = &self.last_search {
          store.save(&term);
        }
        self.known_pages = None;
        let view = self.list.search(&term, None).await;
        self.show_list(&view, out)?;
      }
      Action::Page(page) => self.go_to_page(|_| page, out).await?,
      Action::Next => self.go_to_page(|current| current.saturating_add(1), out).await?,
      Action::Prev => self.go_to_page(|current| current.saturating_sub(1), out).await?,
      Action::Show(name) => {
        let view = self.detail.load(Some(&name)).await;
        render_details(&view, out)?;
      }
      Action::Refresh => self.refresh(out).await?,
      Action::Select(name) => self.select(&name, out).await?,
      Action::Unselect(name) => {
        if self.selection.remove(&name) {
          writeln!(out, "Removed {} ({} selected)", name, self.selection.len())?;
        } else {
          writeln!(out, "{} is not selected", name)?;
        }
      }
      Action::Selected => self.render_selection(out)?,
      Action::Clear => {
        self.selection.clear();
        writeln!(out, "Selection cleared")?;
      }
      Action::Export(path) => self.export(path.as_deref(), out)?,
      Action::Help => {
        writeln!(out, "{}", commands::help())?;
        let (lists, details) = self.client.cached_entries();
        writeln!(out, "Cached: {} searches, {} details", lists, details)?;
      }
      Action::Quit => self.should_quit = true,
    }

    Ok(())
  }

  async fn go_to_page<W: Write>(&mut self, target: impl FnOnce(u32) -> u32, out: &mut W) -> Result<()> {
    if self.list.key().is_none() {
      writeln!(out, "Nothing searched yet. Try 'search <term>'.")?;
      return Ok(());
    }

    let current = self.list.view();
    // Without a known page count only the lower bound applies
    let last = self.known_pages.unwrap_or(u32::MAX).max(1);
    let page = target(current.page).clamp(1, last);

    if page == current.page && !current.is_loading && current.error.is_none() {
      writeln!(out, "Already on page {} of {}", page, last)?;
      return Ok(());
    }

    self.list.go_to_page(page);
    let view = self.list.settled().await;
    self.show_list(&view, out)
  }

  /// Render a list view, remembering its page count once it has loaded.
  fn show_list<W: Write>(&mut self, view: &ListView, out: &mut W) -> Result<()> {
    if !view.is_loading && view.error.is_none() {
      self.known_pages = Some(u32::try_from(view.total_pages()).unwrap_or(u32::MAX));
    }
    render_list(view, out)
  }

  async fn refresh<W: Write>(&mut self, out: &mut W) -> Result<()> {
    let tracked_list = self.list.key().is_some();
    let tracked_detail = self.detail.name().is_some();

    if !tracked_list && !tracked_detail {
      writeln!(out, "Nothing to refresh")?;
      return Ok(());
    }

    if tracked_list {
      self.list.refetch();
      let view = self.list.settled().await;
      self.show_list(&view, out)?;
    }
    if tracked_detail {
      self.detail.refetch();
      let view = self.detail.settled().await;
      render_details(&view, out)?;
    }
    Ok(())
  }

  /// Find `name` among the shown results or details, then by searching for
  /// it, and finally by fetching its details directly.
  async fn find(&mut self, name: &str) -> Option<Pokemon> {
    let exact = |view: ListView| view.pokemon.into_iter().find(|p| p.name == name);

    if let Some(pokemon) = exact(self.list.view()) {
      return Some(pokemon);
    }
    if let Some(details) = self.detail.view().details.filter(|d| d.name == name) {
      return Some(self.pokemon_from_details(name, details.id));
    }
    if let Some(pokemon) = exact(self.lookup.search(name, None).await) {
      return Some(pokemon);
    }

    // The search window can miss an exact name, e.g. past the first page
    let details = self.enrich.load(Some(name)).await.details?;
    Some(self.pokemon_from_details(name, details.id))
  }

  fn pokemon_from_details(&self, name: &str, id: u32) -> Pokemon {
    Pokemon {
      name: name.to_string(),
      url: self.client.resource_url(id),
    }
  }

  async fn select<W: Write>(&mut self, name: &str, out: &mut W) -> Result<()> {
    if self.selection.contains(name) {
      writeln!(out, "{} is already selected", name)?;
      return Ok(());
    }

    let Some(pokemon) = self.find(name).await else {
      writeln!(out, "No Pokémon named {}", name)?;
      return Ok(());
    };
    self.selection.add(SelectedItem::new(pokemon));

    let view = self.enrich.load(Some(name)).await;
    match (view.details, view.error) {
      (Some(details), _) => {
        let description = details.description();
        self.selection.update_details(name, details, description);
        writeln!(out, "Selected {} ({} selected)", name, self.selection.len())?;
      }
      (None, error) => {
        writeln!(
          out,
          "Selected {} without details: {}",
          name,
          error.unwrap_or_else(|| "not loaded".to_string())
        )?;
      }
    }
    Ok(())
  }

  fn render_selection<W: Write>(&self, out: &mut W) -> Result<()> {
    if self.selection.is_empty() {
      writeln!(out, "Nothing selected")?;
      return Ok(());
    }

    for (i, item) in self.selection.items().iter().enumerate() {
      writeln!(
        out,
        "{:>3}. {} ({}) selected {}",
        i + 1,
        item.pokemon.name,
        item.description.as_deref().unwrap_or("no details"),
        item.selected_at.format("%Y-%m-%d %H:%M:%S")
      )?;
    }
    Ok(())
  }

  fn export<W: Write>(&self, path: Option<&Path>, out: &mut W) -> Result<()> {
    match export::write_csv(self.selection.items(), path)? {
      Some(path) => writeln!(out, "Exported {} Pokémon to {}", self.selection.len(), path.display())?,
      None => writeln!(out, "Nothing selected to export")?,
    }
    Ok(())
  }
}

fn render_list<W: Write>(view: &ListView, out: &mut W) -> Result<()> {
  if view.is_loading {
    writeln!(out, "Loading...")?;
    return Ok(());
  }
  if let Some(error) = &view.error {
    writeln!(out, "Error: {}", error)?;
    return Ok(());
  }
  if view.pokemon.is_empty() {
    writeln!(out, "No Pokémon found")?;
    return Ok(());
  }

  let offset = (view.page.max(1) as usize - 1) * PAGE_SIZE;
  for (i, pokemon) in view.pokemon.iter().enumerate() {
    writeln!(out, "{:>4}. {}", offset + i + 1, pokemon.name)?;
  }
  write!(
    out,
    "Page {} of {} ({} results)",
    view.page,
    view.total_pages(),
    view.total_count
  )?;
  if let Some(updated_at) = view.updated_at {
    write!(out, " fetched {}", updated_at.format("%H:%M:%S UTC"))?;
  }
  writeln!(out)?;
  Ok(())
}

fn render_details<W: Write>(view: &DetailView, out: &mut W) -> Result<()> {
  if view.is_loading {
    writeln!(out, "Loading...")?;
    return Ok(());
  }
  if let Some(error) = &view.error {
    writeln!(out, "Error: {}", error)?;
    return Ok(());
  }
  let Some(details) = &view.details else {
    return Ok(());
  };

  writeln!(out, "#{} {}", details.id, details.name)?;
  writeln!(out, "  Height: {}m", details.height_meters())?;
  writeln!(out, "  Weight: {}kg", details.weight_kilograms())?;
  writeln!(out, "  Types:  {}", details.types.join(", "))?;
  if let Some(sprite) = &details.sprite_url {
    writeln!(out, "  Sprite: {}", sprite)?;
  }
  if let Some(updated_at) = view.updated_at {
    writeln!(out, "  Fetched {}", updated_at.format("%H:%M:%S UTC"))?;
  }
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::error::QueryError;
  use crate::pokeapi::mock::MockGateway;

  fn app(gateway: &MockGateway) -> App<MockGateway> {
    App::new(CachedPokemonClient::new(gateway.clone()))
  }

  async fn run_script(app: &mut App<MockGateway>, script: &str) -> String {
    let mut out = Vec::new();
    app.run(script.as_bytes(), &mut out).await.unwrap();
    String::from_utf8(out).unwrap()
  }

  #[tokio::test]
  async fn test_search_and_page_through() {
    let gateway = MockGateway::numbered(50);
    let mut app = app(&gateway);

    let out = run_script(&mut app, "search pokemon\nnext\nnext\nnext\nprev\n").await;
    assert!(out.contains("   1. pokemon-1\n"));
    assert!(out.contains("Page 1 of 3 (50 results)"));
    assert!(out.contains("  21. pokemon-21\n"));
    assert!(out.contains("  41. pokemon-41\n"));
    assert!(out.contains("Page 3 of 3 (50 results)"));
    assert!(out.contains("Already on page 3 of 3"));
    assert_eq!(app.list.view().page, 2);
  }

  #[tokio::test]
  async fn test_page_is_clamped() {
    let gateway = MockGateway::numbered(50);
    let mut app = app(&gateway);

    let out = run_script(&mut app, "page 2\nsearch pokemon\npage 99\n").await;
    assert!(out.contains("Nothing searched yet"));
    assert!(out.contains("Page 3 of 3"));
    assert_eq!(app.list.view().page, 3);
  }

  #[tokio::test]
  async fn test_next_after_failed_page_keeps_page_count() {
    let gateway = MockGateway::numbered(50);
    let mut app = app(&gateway);

    run_script(&mut app, "search pokemon\n").await;
    gateway.fail_with(QueryError::http(500));
    let out = run_script(&mut app, "page 2\n").await;
    assert!(out.contains("Error: HTTP error! status: 500"));

    gateway.recover();
    let out = run_script(&mut app, "next\n").await;
    assert_eq!(app.list.view().page, 3);
    assert!(out.contains("  41. pokemon-41\n"));
  }

  #[tokio::test]
  async fn test_failed_search_leaves_pages_unbounded() {
    let gateway = MockGateway::numbered(50);
    gateway.fail_with(QueryError::network("Network error"));
    let mut app = app(&gateway);

    run_script(&mut app, "search pokemon\n").await;
    gateway.recover();
    run_script(&mut app, "page 2\n").await;
    assert_eq!(app.list.view().page, 2);
    assert_eq!(app.list.view().pokemon.len(), 20);
  }

  #[tokio::test]
  async fn test_last_search_is_restored_and_saved() {
    let gateway = MockGateway::new(&["pikachu", "bulbasaur"]);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("last_search");
    LastSearch::new(&path).save("pika");

    let mut app = app(&gateway).with_last_search(LastSearch::new(&path));
    let out = run_script(&mut app, "").await;
    assert!(out.contains("Restoring last search: pika"));
    assert!(out.contains("   1. pikachu\n"));
    assert_eq!(gateway.search_calls(), 1);

    run_script(&mut app, "search bulba\n").await;
    assert_eq!(LastSearch::new(&path).load().as_deref(), Some("bulba"));
  }

  #[tokio::test]
  async fn test_no_saved_search_starts_empty() {
    let gateway = MockGateway::numbered(3);
    let dir = tempfile::tempdir().unwrap();

    let mut app = app(&gateway).with_last_search(LastSearch::new(dir.path().join("last_search")));
    let out = run_script(&mut app, "").await;
    assert!(!out.contains("Restoring"));
    assert_eq!(gateway.search_calls(), 0);
  }

  #[tokio::test]
  async fn test_search_error_is_shown() {
    let gateway = MockGateway::numbered(3);
    gateway.fail_with(QueryError::network("Network error"));
    let mut app = app(&gateway);

    let out = run_script(&mut app, "search pika\n").await;
    assert!(out.contains("Error: Network error"));
  }

  #[tokio::test]
  async fn test_show_details() {
    let gateway = MockGateway::new(&["bulbasaur", "pikachu"]);
    let mut app = app(&gateway);

    let out = run_script(&mut app, "show pikachu\nshow missingno\n").await;
    assert!(out.contains("#2 pikachu"));
    assert!(out.contains("  Height: 0.4m"));
    assert!(out.contains("  Types:  electric"));
    assert!(out.contains("Error: HTTP error! status: 404"));
  }

  #[tokio::test]
  async fn test_refresh_refetches_tracked_queries() {
    let gateway = MockGateway::new(&["pikachu", "raichu"]);
    let mut app = app(&gateway);

    let out = run_script(&mut app, "refresh\n").await;
    assert!(out.contains("Nothing to refresh"));

    run_script(&mut app, "search chu\nshow pikachu\n").await;
    gateway.rename("raichu", "alolan-raichu");
    let out = run_script(&mut app, "refresh\n").await;

    assert!(out.contains("alolan-raichu"));
    assert_eq!(gateway.search_calls(), 2);
    assert_eq!(gateway.details_calls(), 2);
  }

  #[tokio::test]
  async fn test_select_from_results_and_by_lookup() {
    let gateway = MockGateway::new(&["pikachu", "pikachu-belle", "bulbasaur"]);
    let mut app = app(&gateway);

    let out = run_script(
      &mut app,
      "search pika\nselect pikachu\nselect bulbasaur\nselect pikachu\nselect mew\n",
    )
    .await;

    assert!(out.contains("Selected pikachu (1 selected)"));
    assert!(out.contains("Selected bulbasaur (2 selected)"));
    assert!(out.contains("pikachu is already selected"));
    assert!(out.contains("No Pokémon named mew"));

    let items = app.selection.items();
    assert_eq!(items.len(), 2);
    assert_eq!(
      items[0].description.as_deref(),
      Some("Height: 0.4m, Weight: 6kg, Types: electric")
    );
    // pikachu came from the shown page, bulbasaur needed a lookup search
    assert_eq!(gateway.search_calls(), 3);
  }

  #[tokio::test]
  async fn test_select_exact_name_beyond_search_window() {
    let mut names: Vec<String> = (1..=25).map(|i| format!("mewtwo-{}", i)).collect();
    names.push("mew".to_string());
    let names: Vec<&str> = names.iter().map(String::as_str).collect();
    let gateway = MockGateway::new(&names);
    let mut app = app(&gateway);

    let out = run_script(&mut app, "select mew\n").await;
    assert!(out.contains("Selected mew (1 selected)"));

    let item = &app.selection.items()[0];
    assert_eq!(item.pokemon.url, "https://pokeapi.co/api/v2/pokemon/26/");
    assert!(item.details.is_some());
    // The direct lookup is reused when enriching
    assert_eq!(gateway.details_calls(), 1);
  }

  #[tokio::test]
  async fn test_select_shown_details_skips_search() {
    let gateway = MockGateway::new(&["bulbasaur", "pikachu"]);
    let mut app = app(&gateway);

    let out = run_script(&mut app, "show pikachu\nselect pikachu\n").await;
    assert!(out.contains("Selected pikachu (1 selected)"));
    assert_eq!(gateway.search_calls(), 0);
    assert_eq!(gateway.details_calls(), 1);
    assert_eq!(app.selection.items()[0].pokemon.url, "https://pokeapi.co/api/v2/pokemon/2/");
  }

  #[tokio::test]
  async fn test_select_without_details() {
    let gateway = MockGateway::new(&["pikachu"]);
    let mut app = app(&gateway);

    run_script(&mut app, "search pika\n").await;
    gateway.fail_with(QueryError::http(500));
    let out = run_script(&mut app, "select pikachu\nselected\n").await;

    assert!(out.contains("Selected pikachu without details: HTTP error! status: 500"));
    assert!(out.contains("pikachu (no details)"));
  }

  #[tokio::test]
  async fn test_unselect_and_clear() {
    let gateway = MockGateway::new(&["pikachu", "bulbasaur"]);
    let mut app = app(&gateway);

    let out = run_script(
      &mut app,
      "select pikachu\nselect bulbasaur\nunselect pikachu\nunselect pikachu\nclear\nselected\n",
    )
    .await;

    assert!(out.contains("Removed pikachu (1 selected)"));
    assert!(out.contains("pikachu is not selected"));
    assert!(out.contains("Selection cleared"));
    assert!(out.contains("Nothing selected"));
    assert!(app.selection.is_empty());
  }

  #[tokio::test]
  async fn test_export_selection() {
    let gateway = MockGateway::new(&["pikachu"]);
    let mut app = app(&gateway);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("picked.csv");

    let out = run_script(&mut app, "export\n").await;
    assert!(out.contains("Nothing selected to export"));

    let script = format!("select pikachu\nexport {}\n", path.display());
    let out = run_script(&mut app, &script).await;
    assert!(out.contains("Exported 1 Pokémon to"));

    let csv = std::fs::read_to_string(&path).unwrap();
    let mut lines = csv.lines();
    assert!(lines.next().unwrap().starts_with("Name,Description"));
    assert!(lines.next().unwrap().starts_with("pikachu,\"Height: 0.4m, Weight: 6kg, Types: electric\""));
  }

  #[tokio::test]
  async fn test_unknown_command_and_quit() {
    let gateway = MockGateway::numbered(3);
    let mut app = app(&gateway);

    let out = run_script(&mut app, "xyzzy\n\nhelp\nquit\nsearch pokemon\n").await;
    assert!(out.contains("Unknown command: xyzzy"));
    assert!(out.contains("Cached: 0 searches, 0 details"));
    assert!(app.should_quit);
    // Nothing after quit runs
    assert_eq!(gateway.search_calls(), 0);
  }
}
