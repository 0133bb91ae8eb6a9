use std::any::Any;
use std::fmt;
use std::path::Path;

use crate::command::Command;
use crate::dep::{DepResults, RawDep};

/// Name prefix marking a target as phony: an abstract goal with no output file.
pub const PHONY_PREFIX: &str = "#phony";

/// A normalized target name. All backslash separators are folded to forward slashes on construction, making `a\b`
/// and `a/b` indistinguishable. A name starting with [`PHONY_PREFIX`] denotes a phony target.
#[derive(Clone, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub struct TargetName(String);

impl TargetName {
  #[inline]
  pub fn new(name: impl AsRef<str>) -> Self { Self(name.as_ref().replace('\\', "/")) }

  #[inline]
  pub fn as_str(&self) -> &str { &self.0 }

  /// Checks whether this name denotes a phony target.
  #[inline]
  pub fn is_phony(&self) -> bool { self.0.starts_with(PHONY_PREFIX) }

  /// Gets the filesystem path this target produces, or `None` if this target is phony.
  #[inline]
  pub fn file_path(&self) -> Option<&Path> {
    if self.is_phony() { None } else { Some(Path::new(&self.0)) }
  }
}

impl fmt::Display for TargetName {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result { f.write_str(&self.0) }
}

impl<'a> From<&'a str> for TargetName {
  #[inline]
  fn from(name: &'a str) -> Self { Self::new(name) }
}

impl From<String> for TargetName {
  #[inline]
  fn from(name: String) -> Self { Self::new(name) }
}

/// Kind of a target. Only controls the human-readable label under which command execution is reported.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum TargetKind {
  Compile,
  Assemble,
  Depend,
  Link,
  Generic,
  Phony,
}

impl TargetKind {
  pub fn label(self) -> &'static str {
    match self {
      TargetKind::Compile => "compile",
      TargetKind::Assemble => "assemble",
      TargetKind::Depend => "depend",
      TargetKind::Link => "link",
      TargetKind::Generic => "build",
      TargetKind::Phony => "phony",
    }
  }
}

/// Scope passed to pre/post hooks, exposing the parts of the engine a hook may read or mutate: the hooked target's
/// own dependency list and force flag, and the engine-level header-dependency results.
pub struct HookScope<'a> {
  pub name: &'a TargetName,
  pub raw_deps: &'a mut Vec<RawDep>,
  pub force_rebuild: &'a mut bool,
  pub dep_results: &'a mut DepResults,
}

/// A hook invoked around command execution, receiving whether the command will run (pre) or ran (post).
pub type Hook = Box<dyn FnMut(&mut HookScope, bool)>;

/// A node in the build graph: a named goal with an optional command, dependencies, hooks, and display metadata.
///
/// Dependencies are kept in their originally supplied [`RawDep`] form and resolved against the registry just before
/// every build attempt, because hooks may rewrite them and because targets may be registered after this one.
pub struct Target {
  pub name: TargetName,
  pub kind: TargetKind,
  /// The command regenerating this target's output. A target without a command is a pure aggregator. Never replaced
  /// after registration; only flags, dependencies, and hooks are.
  pub command: Option<Command>,
  pub raw_deps: Vec<RawDep>,
  pub pre_hook: Option<Hook>,
  pub post_hook: Option<Hook>,
  /// When `true`, this target rebuilds unconditionally.
  pub force_rebuild: bool,
  /// Opaque value passed through to thunk commands.
  pub extra_args: Option<Box<dyn Any>>,
  /// Help text shown when listing available targets.
  pub help: Option<String>,
}

impl Target {
  pub fn new(name: impl Into<TargetName>, kind: TargetKind) -> Self {
    Self {
      name: name.into(),
      kind,
      command: None,
      raw_deps: Vec::new(),
      pre_hook: None,
      post_hook: None,
      force_rebuild: false,
      extra_args: None,
      help: None,
    }
  }
}
