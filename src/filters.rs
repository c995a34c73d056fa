//! Named JQL filters kept in a local JSON file, and the name matching shared
//! with the server-side favourites.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use color_eyre::{eyre::eyre, Result};
use tracing::debug;

/// Similarity a name needs before it is offered as a suggestion
const SUGGEST_THRESHOLD: f64 = 0.8;

/// Result of looking a filter up by (part of) its name
#[derive(Debug, PartialEq, Eq)]
pub enum NameMatch<T> {
  /// Exact name, ignoring case, or the only name containing the query
  Found(T),
  /// Nothing contains the query but this name is close to it
  Suggestion(T),
  /// Several names contain the query
  Ambiguous(Vec<String>),
  NoMatch,
}

impl<T> NameMatch<T> {
  pub fn map<U>(self, f: impl FnOnce(T) -> U) -> NameMatch<U> {
    match self {
      NameMatch::Found(item) => NameMatch::Found(f(item)),
      NameMatch::Suggestion(item) => NameMatch::Suggestion(f(item)),
      NameMatch::Ambiguous(names) => NameMatch::Ambiguous(names),
      NameMatch::NoMatch => NameMatch::NoMatch,
    }
  }
}

/// Exact match first, then a unique substring, then the closest spelling.
pub fn find_by_name<'a, T>(
  items: &'a [T],
  name_of: impl Fn(&T) -> &str,
  wanted: &str,
) -> NameMatch<&'a T> {
  let wanted = wanted.trim().to_lowercase();

  if let Some(item) = items
    .iter()
    .find(|item| name_of(*item).to_lowercase() == wanted)
  {
    return NameMatch::Found(item);
  }

  let partial: Vec<&T> = items
    .iter()
    .filter(|item| name_of(*item).to_lowercase().contains(&wanted))
    .collect();
  match partial.as_slice() {
    [] => {}
    [only] => return NameMatch::Found(*only),
    many => {
      return NameMatch::Ambiguous(many.iter().map(|item| name_of(*item).to_string()).collect())
    }
  }

  items
    .iter()
    .map(|item| {
      let score = strsim::normalized_damerau_levenshtein(&name_of(item).to_lowercase(), &wanted);
      (item, score)
    })
    .filter(|(_, score)| *score >= SUGGEST_THRESHOLD)
    .max_by(|a, b| a.1.total_cmp(&b.1))
    .map_or(NameMatch::NoMatch, |(item, _)| NameMatch::Suggestion(item))
}

/// Local `name -> JQL` filters
#[derive(Debug)]
pub struct FilterStore {
  path: PathBuf,
  filters: BTreeMap<String, String>,
}

impl FilterStore {
  /// Read the store at `path`. A missing file is an empty store.
  pub fn load(path: &Path) -> Result<Self> {
    let filters = match std::fs::read_to_string(path) {
      Ok(contents) => serde_json::from_str(&contents)
        .map_err(|e| eyre!("Failed to parse filters file {}: {}", path.display(), e))?,
      Err(e) if e.kind() == ErrorKind::NotFound => BTreeMap::new(),
      Err(e) => return Err(eyre!("Failed to read filters file {}: {}", path.display(), e)),
    };
    debug!(path = %path.display(), count = filters.len(), "loaded filters");

    Ok(Self {
      path: path.to_path_buf(),
      filters,
    })
  }

  pub fn save(&self) -> Result<()> {
    if let Some(dir) = self.path.parent() {
      std::fs::create_dir_all(dir)
        .map_err(|e| eyre!("Failed to create {}: {}", dir.display(), e))?;
    }
    let json = serde_json::to_string_pretty(&self.filters)?;
    std::fs::write(&self.path, json)
      .map_err(|e| eyre!("Failed to write filters file {}: {}", self.path.display(), e))
  }

  pub fn is_empty(&self) -> bool {
    self.filters.is_empty()
  }

  pub fn entries(&self) -> Vec<(&str, &str)> {
    self
      .filters
      .iter()
      .map(|(name, jql)| (name.as_str(), jql.as_str()))
      .collect()
  }

  /// `(name, jql)` of the filter called (something like) `name`.
  pub fn find(&self, name: &str) -> NameMatch<(String, String)> {
    let entries = self.entries();
    find_by_name(&entries, |entry| entry.0, name)
      .map(|(name, jql)| (name.to_string(), jql.to_string()))
  }

  /// Add or replace. A differently-cased existing name is replaced too.
  /// Returns whether a filter was replaced.
  pub fn insert(&mut self, name: &str, jql: &str) -> bool {
    let existing = self
      .filters
      .keys()
      .find(|existing| existing.eq_ignore_ascii_case(name))
      .cloned();
    if let Some(existing) = &existing {
      self.filters.remove(existing);
    }
    self.filters.insert(name.to_string(), jql.to_string());
    existing.is_some()
  }

  /// Remove by exact name.
  pub fn remove(&mut self, name: &str) -> Option<String> {
    self.filters.remove(name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn store() -> FilterStore {
    let mut store = FilterStore {
      path: PathBuf::from("unused.json"),
      filters: BTreeMap::new(),
    };
    store.insert("My bugs", "type = Bug AND assignee = currentUser()");
    store.insert("Team bugs", "type = Bug AND team = Core");
    store.insert("Releases", "type = Release");
    store
  }

  #[test]
  fn test_exact_match_ignores_case() {
    assert_eq!(
      store().find("my BUGS"),
      NameMatch::Found((
        "My bugs".to_string(),
        "type = Bug AND assignee = currentUser()".to_string()
      ))
    );
  }

  #[test]
  fn test_unique_substring_matches() {
    match store().find("relea") {
      NameMatch::Found((name, _)) => assert_eq!(name, "Releases"),
      other => panic!("unexpected {:?}", other),
    }
  }

  #[test]
  fn test_shared_substring_is_ambiguous() {
    assert_eq!(
      store().find("bugs"),
      NameMatch::Ambiguous(vec!["My bugs".to_string(), "Team bugs".to_string()])
    );
  }

  #[test]
  fn test_misspelling_is_suggested() {
    match store().find("Relaeses") {
      NameMatch::Suggestion((name, _)) => assert_eq!(name, "Releases"),
      other => panic!("unexpected {:?}", other),
    }
    assert_eq!(store().find("sprint board"), NameMatch::NoMatch);
  }

  #[test]
  fn test_insert_replaces_differently_cased_name() {
    let mut store = store();
    assert!(store.insert("RELEASES", "type = Release ORDER BY created"));
    assert!(!store.insert("Ops", "project = OPS"));
    let names: Vec<&str> = store.entries().into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["My bugs", "Ops", "RELEASES", "Team bugs"]);
  }

  #[test]
  fn test_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("filters.json");

    let mut saved = FilterStore::load(&path).unwrap();
    assert!(saved.is_empty());
    saved.insert("Mine", "assignee = currentUser()");
    saved.save().unwrap();

    let mut loaded = FilterStore::load(&path).unwrap();
    assert_eq!(loaded.entries(), vec![("Mine", "assignee = currentUser()")]);
    assert_eq!(
      loaded.remove("Mine").as_deref(),
      Some("assignee = currentUser()")
    );
    assert!(loaded.remove("Mine").is_none());
  }

  #[test]
  fn test_corrupt_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("filters.json");
    std::fs::write(&path, "not json").unwrap();
    let err = FilterStore::load(&path).unwrap_err();
    assert!(err.to_string().contains("Failed to parse filters file"));
  }
}
