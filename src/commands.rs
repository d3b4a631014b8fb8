/// Interactive commands, autocomplete and line parsing
use color_eyre::{eyre::eyre, Result};
use std::path::PathBuf;

#[derive(Debug, Clone)]
pub struct Command {
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    name: "search",
    aliases: &["s", "find"],
    usage: "search [term]",
    description: "Search Pokémon by name (blank lists all)",
  },
  Command {
    name: "page",
    aliases: &["p", "goto"],
    usage: "page <n>",
    description: "Jump to a page of the current search",
  },
  Command {
    name: "next",
    aliases: &["n"],
    usage: "next",
    description: "Next page",
  },
  Command {
    name: "prev",
    aliases: &["previous", "back"],
    usage: "prev",
    description: "Previous page",
  },
  Command {
    name: "show",
    aliases: &["d", "details", "info"],
    usage: "show <name>",
    description: "Show details for one Pokémon",
  },
  Command {
    name: "refresh",
    aliases: &["r", "reload"],
    usage: "refresh",
    description: "Refetch the current search and details",
  },
  Command {
    name: "select",
    aliases: &["add"],
    usage: "select <name>",
    description: "Add a Pokémon to the selection",
  },
  Command {
    name: "unselect",
    aliases: &["remove", "rm"],
    usage: "unselect <name>",
    description: "Remove a Pokémon from the selection",
  },
  Command {
    name: "selected",
    aliases: &["list", "ls"],
    usage: "selected",
    description: "List the selection",
  },
  Command {
    name: "clear",
    aliases: &[],
    usage: "clear",
    description: "Empty the selection",
  },
  Command {
    name: "export",
    aliases: &["csv", "save"],
    usage: "export [path]",
    description: "Write the selection as CSV",
  },
  Command {
    name: "help",
    aliases: &["h", "?"],
    usage: "help",
    description: "Show this help",
  },
  Command {
    name: "quit",
    aliases: &["q", "exit"],
    usage: "quit",
    description: "Exit pokedex",
  },
];

/// What a parsed input line asks for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
  Search(String),
  Page(u32),
  Next,
  Prev,
  Show(String),
  Refresh,
  Select(String),
  Unselect(String),
  Selected,
  Clear,
  Export(Option<PathBuf>),
  Help,
  Quit,
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.to_lowercase();

  if input_lower.is_empty() {
    return COMMANDS.iter().collect();
  }

  let mut matches: Vec<(&Command, u32)> = Vec::new();

  for cmd in COMMANDS {
    // Exact match on name
    if cmd.name == input_lower {
      matches.push((cmd, 0)); // Highest priority
      continue;
    }

    // Exact match on alias
    if cmd.aliases.contains(&input_lower.as_str()) {
      matches.push((cmd, 1));
      continue;
    }

    // Prefix match on name
    if cmd.name.starts_with(&input_lower) {
      matches.push((cmd, 2));
      continue;
    }

    // Prefix match on alias
    if cmd.aliases.iter().any(|a| a.starts_with(&input_lower)) {
      matches.push((cmd, 3));
      continue;
    }

    // Fuzzy match (contains)
    if cmd.name.contains(&input_lower) {
      matches.push((cmd, 4));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}

/// Resolve a typed command word. Fuzzy matches only suggest, never run.
fn resolve(word: &str) -> Option<&'static Command> {
  let word = word.to_lowercase();
  get_suggestions(&word)
    .into_iter()
    .find(|cmd| cmd.name.starts_with(&word) || cmd.aliases.iter().any(|a| a.starts_with(&word)))
}

/// Parse one input line. Blank lines parse to `None`.
pub fn parse(line: &str) -> Result<Option<Action>> {
  let line = line.trim();
  if line.is_empty() {
    return Ok(None);
  }

  let (word, rest) = match line.split_once(char::is_whitespace) {
    Some((word, rest)) => (word, rest.trim()),
    None => (line, ""),
  };

  let cmd = resolve(word).ok_or_else(|| {
    let hint = get_suggestions(word)
      .first()
      .map(|cmd| format!(" (did you mean '{}'?)", cmd.name))
      .unwrap_or_default();
    eyre!("Unknown command: {}{}", word, hint)
  })?;

  let required = |what: &str| -> Result<String> {
    if rest.is_empty() {
      Err(eyre!("Missing {}. Usage: {}", what, cmd.usage))
    } else {
      Ok(rest.to_string())
    }
  };

  let action = match cmd.name {
    "search" => Action::Search(rest.to_string()),
    "page" => {
      let page = required("page number")?
        .parse::<u32>()
        .ok()
        .filter(|page| *page >= 1)
        .ok_or_else(|| eyre!("Page must be a positive number. Usage: {}", cmd.usage))?;
      Action::Page(page)
    }
    "next" => Action::Next,
    "prev" => Action::Prev,
    "show" => Action::Show(required("name")?),
    "refresh" => Action::Refresh,
    "select" => Action::Select(required("name")?),
    "unselect" => Action::Unselect(required("name")?),
    "selected" => Action::Selected,
    "clear" => Action::Clear,
    "export" => Action::Export((!rest.is_empty()).then(|| PathBuf::from(rest))),
    "help" => Action::Help,
    _ => Action::Quit,
  };

  Ok(Some(action))
}

/// Help text listing every command
pub fn help() -> String {
  COMMANDS
    .iter()
    .map(|cmd| format!("  {:<18} {}", cmd.usage, cmd.description))
    .collect::<Vec<_>>()
    .join("\n")
}
