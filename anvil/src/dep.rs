use std::collections::HashMap;
use std::path::Path;

use crate::fs;
use crate::store::{Store, TargetNode};
use crate::target::TargetName;

/// Parsed header-dependency lists, keyed by normalized source path. Populated by the post-hooks of dep-scan targets
/// and consumed by the pre-hooks of compile targets within the same run.
pub type DepResults = HashMap<String, Vec<String>>;

/// A dependency as originally supplied to a target: a possibly-nested structure of name strings and registered
/// nodes. Leaf strings may contain multiple whitespace-separated names.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum RawDep {
  Leaf(String),
  Node(TargetNode),
  List(Vec<RawDep>),
}

impl RawDep {
  #[inline]
  pub fn leaf(name: impl Into<String>) -> Self { Self::Leaf(name.into()) }
}

impl From<TargetNode> for RawDep {
  #[inline]
  fn from(node: TargetNode) -> Self { Self::Node(node) }
}

/// Leaf pseudo-target wrapping a plain source file that some consumer target depends on. Has no command; its build
/// is a pure staleness query against the consumer's output file.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FileDep {
  path: String,
  consumer_file: Option<String>,
}

impl FileDep {
  pub fn new(path: impl Into<String>, consumer: &TargetName) -> Self {
    Self {
      path: path.into(),
      consumer_file: consumer.file_path().map(|p| p.to_string_lossy().into_owned()),
    }
  }

  #[inline]
  pub fn path(&self) -> &str { &self.path }

  /// Checks whether this file is newer than its consumer's output. A phony consumer is always stale. A missing file
  /// compares older than any existing consumer, and a missing consumer older than any existing file.
  pub fn is_stale(&self) -> bool {
    match &self.consumer_file {
      None => true,
      Some(consumer) => fs::newer_than(&self.path, Some(Path::new(consumer))),
    }
  }
}

/// A dependency after resolution: either a registered target node (with its output file path, if any), or a
/// [`FileDep`] wrapping an unregistered name.
#[derive(Clone, Debug)]
pub enum ResolvedDep {
  Target { node: TargetNode, file: Option<String> },
  File(FileDep),
}

impl ResolvedDep {
  /// Gets the filesystem path this dependency stands for, or `None` for a phony target.
  pub fn target_name(&self) -> Option<&str> {
    match self {
      ResolvedDep::Target { file, .. } => file.as_deref(),
      ResolvedDep::File(f) => Some(f.path()),
    }
  }
}

/// Flattens `raw` into an ordered dependency sequence and resolves each name against the registry: whitespace-
/// separated leaf strings are split, nested lists are flattened in place, registered names become target nodes, and
/// unregistered names become [`FileDep`]s belonging to `consumer`. Order is preserved.
pub fn resolve(store: &Store, consumer: &TargetName, raw: &[RawDep]) -> Vec<ResolvedDep> {
  let mut resolved = Vec::new();
  resolve_into(store, consumer, raw, &mut resolved);
  resolved
}

fn resolve_into(store: &Store, consumer: &TargetName, raw: &[RawDep], resolved: &mut Vec<ResolvedDep>) {
  for dep in raw {
    match dep {
      RawDep::List(list) => resolve_into(store, consumer, list, resolved),
      RawDep::Node(node) => resolved.push(target_dep(store, *node)),
      RawDep::Leaf(names) => {
        for name in names.split_whitespace() {
          let name = TargetName::new(name);
          match store.lookup(&name) {
            Some(node) => resolved.push(target_dep(store, node)),
            None => resolved.push(ResolvedDep::File(FileDep::new(name.as_str(), consumer))),
          }
        }
      }
    }
  }
}

fn target_dep(store: &Store, node: TargetNode) -> ResolvedDep {
  let file = store.target(node).name.file_path().map(|p| p.to_string_lossy().into_owned());
  ResolvedDep::Target { node, file }
}

/// Parses the contents of a Make-style dependency file: `target: dep1 dep2 \` with backslash-newline continuations.
/// The leading `target:` part is stripped; the remaining names are split on whitespace.
pub fn parse_dep_file(text: &str) -> Vec<String> {
  let deps = match text.find(':') {
    Some(i) => &text[i + 1..],
    None => text,
  };
  deps.split_whitespace()
    .filter(|name| *name != "\\")
    .map(|name| name.to_string())
    .collect()
}
