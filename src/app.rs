use std::path::{Path, PathBuf};

use color_eyre::{eyre::eyre, Result};
use ratatui::text::Text;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::{debug, error};

use crate::cache::CacheResult;
use crate::commands::{self, CommandKind, Input};
use crate::config::Config;
use crate::editor::Editor;
use crate::filters::{find_by_name, FilterStore, NameMatch};
use crate::jira::cached_client::find_transition;
use crate::jira::types::{
  FavouriteFilter, FieldUpdate, IssueKey, IssueRecord, IssueRef, NewIssue, UserRecord,
};
use crate::jira::CachedJiraClient;
use crate::ui::{self, renderfns, views};

const SEARCH_LIMIT: usize = 50;
const RECENT_LIMIT: usize = 10;
const RECENT_JQL: &str = "reporter = currentUser() ORDER BY updated DESC";
const EPICS_JQL: &str = "reporter = currentUser() AND issuetype = Epic ORDER BY created DESC";
const PROMPT_SUMMARY_WIDTH: usize = 40;
const FILTER_LIMIT: usize = 30;
const EXPORT_DIR: &str = "reports";

/// Main application state
pub struct App {
  config: Config,

  /// Jira client with the local record cache
  jira: CachedJiraClient,

  editor: Editor,

  /// Issue the shell is working on; most commands default to it
  focused: Option<IssueRef>,

  /// Authenticated user, fetched on first use
  me: Option<UserRecord>,

  input: Lines<BufReader<Stdin>>,

  should_quit: bool,
}

impl App {
  pub fn new(config: Config, persist_cache: bool) -> Result<Self> {
    let jira = CachedJiraClient::from_config(&config, persist_cache)?;

    Ok(Self {
      config,
      jira,
      editor: Editor::from_env(),
      focused: None,
      me: None,
      input: BufReader::new(tokio::io::stdin()).lines(),
      should_quit: false,
    })
  }

  pub async fn run(&mut self, initial: Option<String>) -> Result<()> {
    ui::print(&Text::from(renderfns::banner(
      &self.config.jira.url,
      self.config.default_project.as_deref(),
    )))?;

    if let Some(line) = initial {
      self.handle_line(&line).await;
    }

    while !self.should_quit {
      ui::print_inline(&renderfns::prompt(
        self.focused.as_ref(),
        PROMPT_SUMMARY_WIDTH,
      ))?;
      let Some(line) = self.input.next_line().await? else {
        // EOF (Ctrl-D)
        println!();
        break;
      };
      self.handle_line(&line).await;
    }

    Ok(())
  }

  /// Run one line; failures are reported and the shell carries on.
  async fn handle_line(&mut self, line: &str) {
    if let Err(e) = self.dispatch(line).await {
      error!(line, error = %e, "command failed");
      if let Err(print_err) = ui::print(&views::error(e.to_string())) {
        eprintln!("Error: {} (terminal output failed: {})", e, print_err);
      }
    }
  }

  async fn dispatch(&mut self, line: &str) -> Result<()> {
    match commands::parse_input(line) {
      Input::Empty => Ok(()),
      Input::IssueKey(key) => {
        if !self.view(key.as_str()).await? {
          self.search("Search results", &text_search_jql(key.as_str()), SEARCH_LIMIT).await?;
        }
        Ok(())
      }
      Input::Jql(jql) => self.search("Search results", jql, SEARCH_LIMIT).await,
      Input::Text(text) => {
        self
          .search("Search results", &text_search_jql(text), SEARCH_LIMIT)
          .await
      }
      Input::Unknown(name) => {
        let suggestions: Vec<&str> = commands::get_suggestions(name)
          .into_iter()
          .take(3)
          .map(|cmd| cmd.name)
          .collect();
        let message = if suggestions.is_empty() {
          format!("Unknown command '/{}'. Type `help` for the list.", name)
        } else {
          format!(
            "Unknown command '/{}'. Did you mean: {}?",
            name,
            suggestions.join(", ")
          )
        };
        ui::print(&views::notice(message))?;
        Ok(())
      }
      Input::Command { command, arg } => {
        debug!(command = command.name, arg, "dispatch");
        self.run_command(command.kind, arg).await
      }
    }
  }

  async fn run_command(&mut self, kind: CommandKind, arg: &str) -> Result<()> {
    match kind {
      CommandKind::Help => ui::print(&views::help_table())?,
      CommandKind::Quit => self.should_quit = true,
      CommandKind::View => {
        let key = self.target(arg)?;
        if !self.view(&key).await? {
          ui::print(&views::notice(format!("{} not found.", key)))?;
        }
      }
      CommandKind::Comments => {
        let key = self.target(arg)?;
        let issue = self.load(&key).await?;
        let issue = self.with_mentions(issue.data).await;
        ui::print(&views::comment_list(&issue))?;
      }
      CommandKind::Search => {
        if arg.is_empty() {
          return Err(eyre!("Please provide a JQL query (search <JQL>)"));
        }
        self.search("Search results", arg, SEARCH_LIMIT).await?;
      }
      CommandKind::Recent => {
        self
          .search("Recently updated issues", RECENT_JQL, RECENT_LIMIT)
          .await?
      }
      CommandKind::Epics => self.search("Your epics", EPICS_JQL, SEARCH_LIMIT).await?,
      CommandKind::Tree => {
        let key = self.target(arg)?;
        let issue = self.load(&key).await?;
        ui::print(&views::issue_tree(&issue.data))?;
      }
      CommandKind::Parent if !arg.is_empty() => self.set_parent(arg).await?,
      CommandKind::Parent => {
        let key = self.focused_key()?;
        let issue = self.load(&key).await?;
        match issue.data.parent {
          Some(parent) => {
            if !self.view(&parent.key).await? {
              ui::print(&views::notice(format!("Parent {} not found.", parent.key)))?;
            }
          }
          None => ui::print(&views::notice(format!("{} has no parent.", key)))?,
        }
      }
      CommandKind::Attachments => {
        let key = self.target(arg)?;
        let issue = self.load(&key).await?;
        ui::print(&views::attachment_list(&key, &issue.data.attachments))?;
      }
      CommandKind::Filter => self.filter(arg).await?,
      CommandKind::Favourites => self.favourites(arg).await?,
      CommandKind::Comment => self.comment(arg).await?,
      CommandKind::Rename => {
        let key = self.focused_key()?;
        if arg.is_empty() {
          return Err(eyre!("Please provide the new summary (rename <SUMMARY>)"));
        }
        let updated = self
          .jira
          .update_field(&key, &FieldUpdate::Summary(arg.to_string()))
          .await?;
        if let Some(issue) = updated {
          self.focus(&issue);
        }
        ui::print(&views::success(format!("Renamed {}.", key)))?;
      }
      CommandKind::Describe => {
        let key = self.focused_key()?;
        let issue = self.load(&key).await?;
        let current = issue.data.description.unwrap_or_default();
        match self.editor.edit(&current)? {
          Some(description) => {
            self
              .jira
              .update_field(&key, &FieldUpdate::Description(description))
              .await?;
            ui::print(&views::success(format!("Updated description of {}.", key)))?;
          }
          None => ui::print(&views::notice("Description unchanged."))?,
        }
      }
      CommandKind::Status => self.status(arg).await?,
      CommandKind::Assign => self.assign(arg).await?,
      CommandKind::Link => self.link(arg).await?,
      CommandKind::New => self.create(arg).await?,
      CommandKind::Copy => self.copy(arg).await?,
      CommandKind::Delete => self.delete(arg).await?,
      CommandKind::Export => {
        let key = self.focused_key()?;
        let issue = self.load(&key).await?;
        let dir = if arg.is_empty() { EXPORT_DIR } else { arg };
        let path = export_issue(&issue.data, Path::new(dir))?;
        ui::print(&views::success(format!(
          "Exported {} to {}.",
          key,
          path.display()
        )))?;
      }
      CommandKind::Open => {
        let key = self.target(arg)?;
        let url = self.jira.service().browse_url(&key);
        webbrowser::open(&url).map_err(|e| eyre!("Failed to open browser: {}", e))?;
        ui::print(&views::notice(format!("Opened {}", url)))?;
      }
      CommandKind::Refresh => {
        let key = self.target(arg)?;
        match self.jira.refresh(&key).await? {
          Some(issue) => self.show(issue, false).await?,
          None => ui::print(&views::notice(format!("{} not found.", key)))?,
        }
      }
      CommandKind::Unfocus => self.focused = None,
      CommandKind::CacheClear => {
        let removed = self.jira.clear()?;
        ui::print(&views::success(format!("Cleared {} cached entries.", removed)))?;
      }
    }
    Ok(())
  }

  // ==========================================================================
  // Command handlers
  // ==========================================================================

  async fn comment(&mut self, arg: &str) -> Result<()> {
    let key = self.focused_key()?;
    let body = if arg.is_empty() {
      self.editor.edit("")?
    } else {
      Some(arg.to_string())
    };

    let Some(body) = body else {
      ui::print(&views::notice("Comment aborted."))?;
      return Ok(());
    };
    self.jira.add_comment(&key, &body).await?;
    ui::print(&views::success(format!("Comment added to {}.", key)))?;
    Ok(())
  }

  async fn status(&mut self, arg: &str) -> Result<()> {
    let key = self.focused_key()?;
    let transitions = self.jira.transitions(&key).await?;

    if arg.is_empty() {
      let issue = self.load(&key).await?;
      ui::print(&views::transition_list(&key, &issue.data.status, &transitions))?;
      return Ok(());
    }

    let transition = find_transition(&transitions, arg).ok_or_else(|| {
      let names: Vec<&str> = transitions.iter().map(|t| t.name.as_str()).collect();
      eyre!(
        "No transition '{}' for {}. Available: {}",
        arg,
        key,
        names.join(", ")
      )
    })?;
    if let Some(issue) = self.jira.transition(&key, transition).await? {
      self.focus(&issue);
    }
    ui::print(&views::success(format!(
      "{} moved to {}.",
      key, transition.to_status
    )))?;
    Ok(())
  }

  async fn assign(&mut self, arg: &str) -> Result<()> {
    let key = self.focused_key()?;
    match arg.trim().to_lowercase().as_str() {
      "" | "me" => {
        let me = self.me().await?;
        self.jira.assign(&key, Some(&me.account_id)).await?;
        ui::print(&views::success(format!(
          "Assigned {} to {}.",
          key, me.display_name
        )))?;
      }
      "none" | "-" => {
        self.jira.assign(&key, None).await?;
        ui::print(&views::success(format!("Unassigned {}.", key)))?;
      }
      _ => return Err(eyre!("Usage: assign [me|none]")),
    }
    Ok(())
  }

  /// Link the focused issue to `arg`, or remove the link if one exists.
  async fn link(&mut self, arg: &str) -> Result<()> {
    let key = self.focused_key()?;
    if arg.is_empty() {
      return Err(eyre!("Please provide the issue to link (link <KEY>)"));
    }
    let other = IssueKey::parse(arg)?;
    if other.as_str() == key {
      return Err(eyre!("Cannot link {} to itself", key));
    }

    let issue = self.load(&key).await?;
    match issue.data.link_to(other.as_str()) {
      Some(existing) => {
        self.jira.unlink(&key, existing).await?;
        ui::print(&views::success(format!(
          "Removed link {} {} {}.",
          key, existing.relation, other
        )))?;
      }
      None => {
        let types = self.jira.link_types().await?;
        if !types
          .iter()
          .any(|t| t.name.eq_ignore_ascii_case(&self.config.link_type))
        {
          let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
          return Err(eyre!(
            "Link type '{}' does not exist. Available: {}",
            self.config.link_type,
            names.join(", ")
          ));
        }
        self
          .jira
          .link(&key, other.as_str(), &self.config.link_type)
          .await?;
        ui::print(&views::success(format!(
          "Linked {} to {} ({}).",
          key, other, self.config.link_type
        )))?;
      }
    }
    Ok(())
  }

  async fn create(&mut self, summary: &str) -> Result<()> {
    let parent = match self.focused.as_ref().map(|f| f.key.clone()) {
      Some(key) => Some(self.load(&key).await?.data),
      None => None,
    };
    let plan = plan_new_issue(
      parent.as_ref(),
      self.config.default_project.as_deref(),
      summary,
    )?;

    let issue = self.jira.create(&plan).await?;
    ui::print(&views::success(format!(
      "Created {} {}.",
      plan.issue_type, issue.key
    )))?;
    self.show(issue, false).await
  }

  /// Copy the focused issue into `arg` (default: its own project).
  async fn copy(&mut self, arg: &str) -> Result<()> {
    let key = self.focused_key()?;
    let source = self.load(&key).await?.data;
    let project = if arg.is_empty() {
      IssueKey::parse(&key)?.project().to_string()
    } else {
      arg.trim().to_uppercase()
    };

    let copy = self
      .jira
      .copy_issue(&source, &project, &self.config.link_type)
      .await?;
    ui::print(&views::success(format!(
      "Copied {} to {} with {} comments.",
      key,
      copy.key,
      source.comments.len()
    )))?;
    if !source.attachments.is_empty() {
      ui::print(&views::notice(format!(
        "{} attachments were not copied.",
        source.attachments.len()
      )))?;
    }
    self.show(copy, false).await
  }

  /// Attach the focused issue to the epic `arg`.
  async fn set_parent(&mut self, arg: &str) -> Result<()> {
    let key = self.focused_key()?;
    let epic = IssueKey::parse(arg)?;
    if epic.as_str() == key {
      return Err(eyre!("{} cannot be its own parent", key));
    }

    let target = self.load(epic.as_str()).await?;
    if !target.data.is_epic() {
      ui::print(&views::notice(format!(
        "{} is a {}, not an epic.",
        epic, target.data.issue_type
      )))?;
      return Ok(());
    }

    if let Some(issue) = self.jira.set_parent(&key, epic.as_str()).await? {
      self.focus(&issue);
    }
    ui::print(&views::success(format!("{} now belongs to {}.", key, epic)))?;
    Ok(())
  }

  /// Local saved filters: list, run, save or remove.
  async fn filter(&mut self, arg: &str) -> Result<()> {
    let mut store = FilterStore::load(&self.config.filters_file)?;
    let (verb, rest) = split_verb(arg);

    match verb {
      "" => ui::print(&views::filter_table("Saved JQL filters", store.entries()))?,
      "save" => {
        let Some((name, jql)) = rest.split_once(char::is_whitespace) else {
          return Err(eyre!("Usage: filter save NAME JQL"));
        };
        let replaced = store.insert(name, jql.trim());
        store.save()?;
        let verb = if replaced { "Updated" } else { "Saved" };
        ui::print(&views::success(format!("{} filter '{}'.", verb, name)))?;
      }
      "rm" | "del" => {
        if rest.is_empty() {
          return Err(eyre!("Please specify a filter name to remove."));
        }
        if let Some((name, _)) = self.settle(store.find(rest), rest).await? {
          store.remove(&name);
          store.save()?;
          ui::print(&views::success(format!("Filter '{}' has been removed.", name)))?;
        }
      }
      _ => {
        if store.is_empty() {
          ui::print(&views::notice("No saved filters found."))?;
          return Ok(());
        }
        if let Some((name, jql)) = self.settle(store.find(arg), arg).await? {
          self
            .search(&format!("Filter: {}", name), &jql, FILTER_LIMIT)
            .await?;
        }
      }
    }
    Ok(())
  }

  /// Favourite filters stored on the server: list, run, edit or delete.
  async fn favourites(&mut self, arg: &str) -> Result<()> {
    let filters = self.jira.favourite_filters().await?;
    let (verb, rest) = split_verb(arg);

    if verb.is_empty() {
      let rows = filters.iter().map(|f| (f.name.as_str(), f.jql.as_str()));
      ui::print(&views::filter_table("Favourite filters", rows))?;
      return Ok(());
    }

    match verb {
      "edit" | "rm" | "del" if rest.is_empty() => {
        return Err(eyre!("Please specify a filter name ({} NAME)", verb));
      }
      "edit" => {
        let Some(filter) = self.pick_favourite(&filters, rest).await? else {
          return Ok(());
        };
        match self.editor.edit(&filter.jql)? {
          Some(jql) => {
            self.jira.update_filter_jql(&filter, &jql).await?;
            ui::print(&views::success(format!("Updated filter '{}'.", filter.name)))?;
          }
          None => ui::print(&views::notice("Filter unchanged."))?,
        }
      }
      "rm" | "del" => {
        let Some(filter) = self.pick_favourite(&filters, rest).await? else {
          return Ok(());
        };
        let question = format!("Delete filter '{}' on the server? [y/N] ", filter.name);
        if !self.confirm(&question).await? {
          ui::print(&views::notice("Cancelled."))?;
          return Ok(());
        }
        self.jira.delete_filter(&filter).await?;
        ui::print(&views::success(format!("Deleted filter '{}'.", filter.name)))?;
      }
      _ => {
        if let Some(filter) = self.pick_favourite(&filters, arg).await? {
          self
            .search(&format!("Filter: {}", filter.name), &filter.jql, FILTER_LIMIT)
            .await?;
        }
      }
    }
    Ok(())
  }

  async fn pick_favourite(
    &mut self,
    filters: &[FavouriteFilter],
    name: &str,
  ) -> Result<Option<FavouriteFilter>> {
    let found = find_by_name(filters, |f| f.name.as_str(), name).map(Clone::clone);
    self.settle(found, name).await
  }

  async fn delete(&mut self, arg: &str) -> Result<()> {
    if arg.is_empty() {
      return Err(eyre!("Please provide the issue to delete (delete <KEY>)"));
    }
    let key = IssueKey::parse(arg)?;

    if !self.confirm(&format!("Delete {} and its subtasks? [y/N] ", key)).await? {
      ui::print(&views::notice("Cancelled."))?;
      return Ok(());
    }

    self.jira.delete(key.as_str()).await?;
    ui::print(&views::success(format!("Deleted {}.", key)))?;
    if self.focused.as_ref().is_some_and(|f| f.key == key.as_str()) {
      self.focused = None;
      ui::print(&views::notice("Unfocused deleted issue."))?;
    }
    Ok(())
  }

  // ==========================================================================
  // Helpers
  // ==========================================================================

  /// Show and focus `key`. Returns false when it does not exist.
  async fn view(&mut self, key: &str) -> Result<bool> {
    match self.jira.get(key).await? {
      Some(result) => {
        let offline = result.is_offline();
        self.show(result.data, offline).await?;
        Ok(true)
      }
      None => Ok(false),
    }
  }

  async fn show(&mut self, issue: IssueRecord, offline: bool) -> Result<()> {
    let issue = self.with_mentions(issue).await;
    self.focus(&issue);
    ui::print(&views::issue_panel(&issue, offline, self.width()))?;
    Ok(())
  }

  async fn load(&self, key: &str) -> Result<CacheResult<IssueRecord>> {
    self
      .jira
      .get(key)
      .await?
      .ok_or_else(|| eyre!("{} not found", key))
  }

  async fn search(&self, title: &str, jql: &str, limit: usize) -> Result<()> {
    debug!(jql, "search");
    let issues = self.jira.search(jql, limit).await?;
    ui::print(&views::issue_table(title, &issues, self.width()))?;
    Ok(())
  }

  async fn with_mentions(&self, mut issue: IssueRecord) -> IssueRecord {
    if let Some(description) = &issue.description {
      issue.description = Some(self.jira.resolve_mentions(description).await);
    }
    for comment in &mut issue.comments {
      comment.body = self.jira.resolve_mentions(&comment.body).await;
    }
    issue
  }

  async fn me(&mut self) -> Result<UserRecord> {
    if let Some(me) = &self.me {
      return Ok(me.clone());
    }
    let me = self.jira.myself().await?;
    self.me = Some(me.clone());
    Ok(me)
  }

  /// Turn a name lookup into a choice, asking before taking a suggestion.
  async fn settle<T>(&mut self, found: NameMatch<T>, wanted: &str) -> Result<Option<T>>
  where
    T: Named,
  {
    match found {
      NameMatch::Found(item) => Ok(Some(item)),
      NameMatch::Suggestion(item) => {
        let question = format!("Did you mean '{}'? [y/N] ", item.name());
        Ok(self.confirm(&question).await?.then_some(item))
      }
      NameMatch::Ambiguous(names) => {
        ui::print(&views::notice(format!(
          "Multiple filters match '{}': {}",
          wanted,
          names.join(", ")
        )))?;
        Ok(None)
      }
      NameMatch::NoMatch => Err(eyre!("No matching filter found for '{}'.", wanted)),
    }
  }

  async fn confirm(&mut self, question: &str) -> Result<bool> {
    ui::print_inline(&ratatui::text::Line::from(question.to_string()))?;
    let answer = self.input.next_line().await?.unwrap_or_default();
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
  }

  fn focus(&mut self, issue: &IssueRecord) {
    self.focused = Some(issue.to_ref());
  }

  fn focused_key(&self) -> Result<String> {
    self
      .focused
      .as_ref()
      .map(|f| f.key.clone())
      .ok_or_else(|| eyre!("No issue focused. Type an issue key first."))
  }

  /// Explicit key argument, else the focused issue.
  fn target(&self, arg: &str) -> Result<String> {
    if arg.is_empty() {
      self.focused_key()
    } else {
      Ok(IssueKey::parse(arg)?.to_string())
    }
  }

  fn width(&self) -> usize {
    crossterm::terminal::size()
      .map(|(cols, _)| cols as usize)
      .unwrap_or(self.config.max_width)
      .min(self.config.max_width)
  }
}

/// Things that can be picked by name
trait Named {
  fn name(&self) -> &str;
}

impl Named for (String, String) {
  fn name(&self) -> &str {
    &self.0
  }
}

impl Named for FavouriteFilter {
  fn name(&self) -> &str {
    &self.name
  }
}

/// `"rm Old filter"` -> `("rm", "Old filter")`; a lone word is the verb.
fn split_verb(arg: &str) -> (&str, &str) {
  match arg.trim().split_once(char::is_whitespace) {
    Some((verb, rest)) => (verb, rest.trim()),
    None => (arg.trim(), ""),
  }
}

/// Write `issue` as pretty JSON to `dir/KEY.json`.
fn export_issue(issue: &IssueRecord, dir: &Path) -> Result<PathBuf> {
  std::fs::create_dir_all(dir)
    .map_err(|e| eyre!("Failed to create {}: {}", dir.display(), e))?;
  let path = dir.join(format!("{}.json", issue.key));
  let json = serde_json::to_string_pretty(issue)?;
  std::fs::write(&path, json).map_err(|e| eyre!("Failed to write {}: {}", path.display(), e))?;
  Ok(path)
}

/// Full-text search JQL for free-form input
fn text_search_jql(text: &str) -> String {
  let escaped = text.replace('\\', "\\\\").replace('"', "\\\"");
  format!("text ~ \"{}\" ORDER BY updated DESC", escaped)
}

/// What `new` creates: a task under a focused epic, a subtask under any other
/// focused issue, or an epic in the default project.
fn plan_new_issue(
  parent: Option<&IssueRecord>,
  default_project: Option<&str>,
  summary: &str,
) -> Result<NewIssue> {
  let summary = summary.trim();
  if summary.is_empty() {
    return Err(eyre!("Please provide a summary (new <SUMMARY>)"));
  }

  let (project, issue_type, parent_key) = match parent {
    Some(parent) => {
      let project = IssueKey::parse(&parent.key)?.project().to_string();
      let issue_type = if parent.is_epic() { "Task" } else { "Sub-task" };
      (project, issue_type, Some(parent.key.clone()))
    }
    None => {
      let project = default_project.ok_or_else(|| {
        eyre!("No issue focused and no default project. Set JIRA_PROJECT or pass --project.")
      })?;
      (project.to_string(), "Epic", None)
    }
  };

  Ok(NewIssue {
    project,
    summary: summary.to_string(),
    issue_type: issue_type.to_string(),
    parent: parent_key,
    description: None,
    priority: None,
    labels: Vec::new(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;

  fn record(key: &str, issue_type: &str) -> IssueRecord {
    IssueRecord {
      key: key.into(),
      summary: "Parent".into(),
      status: "Open".into(),
      status_id: "1".into(),
      issue_type: issue_type.into(),
      priority: None,
      assignee: None,
      reporter: None,
      created: String::new(),
      updated: String::new(),
      description: None,
      labels: Vec::new(),
      comments: Vec::new(),
      links: Vec::new(),
      attachments: Vec::new(),
      parent: None,
      subtasks: Vec::new(),
      children: Vec::new(),
    }
  }

  #[test]
  fn test_new_under_epic_is_task() {
    let plan = plan_new_issue(Some(&record("SHOP-1", "Epic")), Some("PROJ"), "Cart").unwrap();
    assert_eq!(plan.project, "SHOP");
    assert_eq!(plan.issue_type, "Task");
    assert_eq!(plan.parent.as_deref(), Some("SHOP-1"));
  }

  #[test]
  fn test_new_under_issue_is_subtask() {
    let plan = plan_new_issue(Some(&record("SHOP-2", "Story")), None, "Tests").unwrap();
    assert_eq!(plan.issue_type, "Sub-task");
    assert_eq!(plan.parent.as_deref(), Some("SHOP-2"));
  }

  #[test]
  fn test_new_without_focus_is_epic_in_default_project() {
    let plan = plan_new_issue(None, Some("PROJ"), " Q3 goals ").unwrap();
    assert_eq!(plan.project, "PROJ");
    assert_eq!(plan.issue_type, "Epic");
    assert_eq!(plan.summary, "Q3 goals");
    assert!(plan.parent.is_none());
  }

  #[test]
  fn test_new_requires_summary_and_project() {
    assert!(plan_new_issue(None, Some("PROJ"), "  ").is_err());
    assert!(plan_new_issue(None, None, "Something").is_err());
  }

  #[test]
  fn test_split_verb() {
    assert_eq!(split_verb(""), ("", ""));
    assert_eq!(split_verb(" Releases "), ("Releases", ""));
    assert_eq!(split_verb("rm  Team bugs "), ("rm", "Team bugs"));
  }

  #[test]
  fn test_export_writes_full_record() {
    let dir = tempfile::tempdir().unwrap();
    let mut issue = record("SHOP-3", "Story");
    issue.labels = vec!["checkout".into()];

    let path = export_issue(&issue, &dir.path().join("reports")).unwrap();
    assert_eq!(path, dir.path().join("reports").join("SHOP-3.json"));

    let written: IssueRecord =
      serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(written, issue);
  }

  #[test]
  fn test_text_search_escapes_quotes() {
    assert_eq!(
      text_search_jql(r#"say "hi""#),
      r#"text ~ "say \"hi\"" ORDER BY updated DESC"#
    );
  }
}
