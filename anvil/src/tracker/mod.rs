use crate::fingerprint::ConfigClass;
use crate::target::TargetKind;

pub mod event;
pub mod writing;

/// How command execution is displayed: the fully-expanded command line, or a kind label plus target name.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum DispMode {
  All,
  Summary,
}

/// Build event tracker. Can be used to implement logging, progress display, or test observation.
///
/// Object-safe trait.
#[allow(unused_variables)]
pub trait Tracker {
  /// Start: a new build towards `root`.
  #[inline]
  fn build_start(&mut self, root: &str) {}
  /// End: completed build towards `root`; `rebuilt` is whether the root was regenerated.
  #[inline]
  fn build_end(&mut self, root: &str, rebuilt: bool) {}
  /// The root target `root` required no work.
  #[inline]
  fn up_to_date(&mut self, root: &str) {}

  /// The persisted configuration of `class` differed from the current one, forcing a rebuild.
  #[inline]
  fn config_changed(&mut self, class: ConfigClass) {}

  /// Start: execute the command of target `name`. `command` is the expanded command line for template commands and
  /// `None` for thunks; `disp` is the engine display mode.
  #[inline]
  fn execute_start(&mut self, kind: TargetKind, name: &str, command: Option<&str>, disp: DispMode) {}
  /// End: executed the command of target `name`, which returned `code`.
  #[inline]
  fn execute_end(&mut self, kind: TargetKind, name: &str, code: i32) {}

  /// Clean mode removed (or failed to remove) the output file of target `name`.
  #[inline]
  fn clean_target(&mut self, name: &str, removed: bool) {}
}

/// Implement [`Tracker`] for `()` that does nothing.
impl Tracker for () {}

/// A [`Tracker`] that forwards events to two [`Tracker`]s.
#[derive(Default, Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct CompositeTracker<A1, A2>(pub A1, pub A2);

impl<A1: Tracker, A2: Tracker> Tracker for CompositeTracker<A1, A2> {
  #[inline]
  fn build_start(&mut self, root: &str) {
    self.0.build_start(root);
    self.1.build_start(root);
  }
  #[inline]
  fn build_end(&mut self, root: &str, rebuilt: bool) {
    self.0.build_end(root, rebuilt);
    self.1.build_end(root, rebuilt);
  }
  #[inline]
  fn up_to_date(&mut self, root: &str) {
    self.0.up_to_date(root);
    self.1.up_to_date(root);
  }
  #[inline]
  fn config_changed(&mut self, class: ConfigClass) {
    self.0.config_changed(class);
    self.1.config_changed(class);
  }
  #[inline]
  fn execute_start(&mut self, kind: TargetKind, name: &str, command: Option<&str>, disp: DispMode) {
    self.0.execute_start(kind, name, command, disp);
    self.1.execute_start(kind, name, command, disp);
  }
  #[inline]
  fn execute_end(&mut self, kind: TargetKind, name: &str, code: i32) {
    self.0.execute_end(kind, name, code);
    self.1.execute_end(kind, name, code);
  }
  #[inline]
  fn clean_target(&mut self, name: &str, removed: bool) {
    self.0.clean_target(name, removed);
    self.1.clean_target(name, removed);
  }
}
