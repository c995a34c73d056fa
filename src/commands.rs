/// Shell commands, input classification and autocomplete logic
use crate::jira::types::IssueKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandKind {
  Help,
  Quit,
  View,
  Comments,
  Search,
  Recent,
  Epics,
  Tree,
  Parent,
  Attachments,
  Filter,
  Favourites,
  Comment,
  Rename,
  Describe,
  Status,
  Assign,
  Link,
  New,
  Copy,
  Delete,
  Export,
  Open,
  Refresh,
  Unfocus,
  CacheClear,
}

#[derive(Debug, Clone)]
pub struct Command {
  pub kind: CommandKind,
  pub name: &'static str,
  pub aliases: &'static [&'static str],
  pub usage: &'static str,
  pub description: &'static str,
}

/// All available commands
pub const COMMANDS: &[Command] = &[
  Command {
    kind: CommandKind::Help,
    name: "help",
    aliases: &["h", "?"],
    usage: "",
    description: "Show this help",
  },
  Command {
    kind: CommandKind::Quit,
    name: "quit",
    aliases: &["q", "exit"],
    usage: "",
    description: "Exit jirash",
  },
  Command {
    kind: CommandKind::View,
    name: "view",
    aliases: &["v"],
    usage: "[KEY]",
    description: "Show an issue and focus it",
  },
  Command {
    kind: CommandKind::Comments,
    name: "comments",
    aliases: &["vc"],
    usage: "[KEY]",
    description: "Show all comments",
  },
  Command {
    kind: CommandKind::Search,
    name: "search",
    aliases: &["s", "jql"],
    usage: "JQL",
    description: "Run a JQL search",
  },
  Command {
    kind: CommandKind::Recent,
    name: "recent",
    aliases: &["r"],
    usage: "",
    description: "Recently updated issues reported by you",
  },
  Command {
    kind: CommandKind::Epics,
    name: "epics",
    aliases: &["e"],
    usage: "",
    description: "Epics reported by you",
  },
  Command {
    kind: CommandKind::Tree,
    name: "tree",
    aliases: &["t"],
    usage: "[KEY]",
    description: "Parent, issue and children as a tree",
  },
  Command {
    kind: CommandKind::Parent,
    name: "parent",
    aliases: &["p"],
    usage: "[EPIC]",
    description: "Focus the parent, or move the focused issue under EPIC",
  },
  Command {
    kind: CommandKind::Attachments,
    name: "attachments",
    aliases: &["va"],
    usage: "[KEY]",
    description: "List attached files",
  },
  Command {
    kind: CommandKind::Filter,
    name: "filter",
    aliases: &["f", "filters"],
    usage: "[NAME|save NAME JQL|rm NAME]",
    description: "List, run, save or remove local JQL filters",
  },
  Command {
    kind: CommandKind::Favourites,
    name: "favourites",
    aliases: &["fav", "rfilter"],
    usage: "[NAME|edit NAME|rm NAME]",
    description: "List, run, edit or delete your favourite Jira filters",
  },
  Command {
    kind: CommandKind::Comment,
    name: "comment",
    aliases: &["c"],
    usage: "[TEXT]",
    description: "Add a comment (opens the editor without text)",
  },
  Command {
    kind: CommandKind::Rename,
    name: "rename",
    aliases: &["a"],
    usage: "SUMMARY",
    description: "Change the summary",
  },
  Command {
    kind: CommandKind::Describe,
    name: "describe",
    aliases: &["u"],
    usage: "",
    description: "Edit the description in the editor",
  },
  Command {
    kind: CommandKind::Status,
    name: "status",
    aliases: &["st"],
    usage: "[NAME]",
    description: "List transitions, or move to NAME",
  },
  Command {
    kind: CommandKind::Assign,
    name: "assign",
    aliases: &["as"],
    usage: "[me|none]",
    description: "Assign to yourself or unassign",
  },
  Command {
    kind: CommandKind::Link,
    name: "link",
    aliases: &["l"],
    usage: "KEY",
    description: "Link the focused issue to KEY, or unlink if linked",
  },
  Command {
    kind: CommandKind::New,
    name: "new",
    aliases: &["n"],
    usage: "SUMMARY",
    description: "Create a child, subtask or epic",
  },
  Command {
    kind: CommandKind::Copy,
    name: "copy",
    aliases: &["cp"],
    usage: "[PROJECT]",
    description: "Copy the focused issue and its comments, linked to the original",
  },
  Command {
    kind: CommandKind::Delete,
    name: "delete",
    aliases: &["d"],
    usage: "KEY",
    description: "Delete an issue",
  },
  Command {
    kind: CommandKind::Export,
    name: "export",
    aliases: &["report"],
    usage: "[DIR]",
    description: "Write the focused issue as JSON (default ./reports)",
  },
  Command {
    kind: CommandKind::Open,
    name: "open",
    aliases: &["o"],
    usage: "[KEY]",
    description: "Open in the browser",
  },
  Command {
    kind: CommandKind::Refresh,
    name: "refresh",
    aliases: &["rf"],
    usage: "[KEY]",
    description: "Re-fetch, bypassing the cache",
  },
  Command {
    kind: CommandKind::Unfocus,
    name: "unfocus",
    aliases: &["x"],
    usage: "",
    description: "Clear the focused issue",
  },
  Command {
    kind: CommandKind::CacheClear,
    name: "cache-clear",
    aliases: &["cc"],
    usage: "",
    description: "Drop every cached record",
  },
];

/// What a line typed at the prompt means
#[derive(Debug, PartialEq, Eq)]
pub enum Input<'a> {
  Empty,
  Command {
    command: &'static Command,
    arg: &'a str,
  },
  /// `/name` that matches no command
  Unknown(&'a str),
  IssueKey(IssueKey),
  Jql(&'a str),
  Text(&'a str),
}

impl PartialEq for Command {
  fn eq(&self, other: &Self) -> bool {
    self.kind == other.kind
  }
}

impl Eq for Command {}

pub fn lookup(name: &str) -> Option<&'static Command> {
  let name = name.to_lowercase();
  COMMANDS
    .iter()
    .find(|cmd| cmd.name == name || cmd.aliases.contains(&name.as_str()))
}

pub fn parse_input(line: &str) -> Input<'_> {
  let line = line.trim();
  if line.is_empty() {
    return Input::Empty;
  }

  if let Some(prefix) = line.get(..4) {
    if prefix.eq_ignore_ascii_case("jql:") {
      return Input::Jql(line[4..].trim());
    }
  }

  let (head, arg) = match line.split_once(char::is_whitespace) {
    Some((head, rest)) => (head, rest.trim()),
    None => (line, ""),
  };

  if let Some(name) = head.strip_prefix('/') {
    return match lookup(name) {
      Some(command) => Input::Command { command, arg },
      None => Input::Unknown(name),
    };
  }

  if let Some(command) = lookup(head) {
    return Input::Command { command, arg };
  }

  if arg.is_empty() {
    if let Ok(key) = IssueKey::parse(head) {
      return Input::IssueKey(key);
    }
  }

  Input::Text(line)
}

/// Get autocomplete suggestions for a given input
pub fn get_suggestions(input: &str) -> Vec<&'static Command> {
  let input_lower = input.trim_start_matches('/').to_lowercase();

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
      continue;
    }

    // Fuzzy match on alias
    if cmd.aliases.iter().any(|a| a.contains(&input_lower)) {
      matches.push((cmd, 5));
    }
  }

  // Sort by priority
  matches.sort_by_key(|(_, priority)| *priority);

  matches.into_iter().map(|(cmd, _)| cmd).collect()
}
