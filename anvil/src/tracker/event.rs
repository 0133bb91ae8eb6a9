use crate::fingerprint::ConfigClass;
use crate::target::TargetKind;
use crate::tracker::{DispMode, Tracker};

/// A [`Tracker`] that stores [`Event`]s in a [`Vec`], useful in testing situations where we check build events after
/// building.
#[derive(Clone, Debug)]
pub struct EventTracker {
  events: Vec<Event>,
  clear_on_build_start: bool,
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub enum Event {
  BuildStart { root: String },
  BuildEnd { root: String, rebuilt: bool },
  UpToDate { root: String },
  ConfigChanged { class: ConfigClass },
  ExecuteStart { kind: TargetKind, name: String, command: Option<String> },
  ExecuteEnd { kind: TargetKind, name: String, code: i32 },
  CleanTarget { name: String, removed: bool },
}

impl Event {
  #[inline]
  pub fn is_execute_start(&self) -> bool {
    matches!(self, Event::ExecuteStart { .. })
  }
  #[inline]
  pub fn is_execute_start_of(&self, target: &str) -> bool {
    matches!(self, Event::ExecuteStart { name, .. } if name == target)
  }
  #[inline]
  pub fn is_execute_end_of(&self, target: &str) -> bool {
    matches!(self, Event::ExecuteEnd { name, .. } if name == target)
  }
  #[inline]
  pub fn is_clean_of(&self, target: &str) -> bool {
    matches!(self, Event::CleanTarget { name, .. } if name == target)
  }
}

impl Default for EventTracker {
  fn default() -> Self {
    Self { events: Vec::new(), clear_on_build_start: true }
  }
}

impl EventTracker {
  #[inline]
  pub fn new(clear_on_build_start: bool) -> Self {
    Self {
      clear_on_build_start,
      ..Self::default()
    }
  }

  /// Returns all stored events.
  #[inline]
  pub fn slice(&self) -> &[Event] { &self.events }
  /// Returns an iterator over all events.
  #[inline]
  pub fn iter(&self) -> impl Iterator<Item=&Event> { self.events.iter() }

  /// Returns `true` if `predicate` returns `true` for any event.
  #[inline]
  pub fn any(&self, predicate: impl FnMut(&Event) -> bool) -> bool { self.iter().any(predicate) }
  /// Returns the number of times `predicate` returns `true` over all events.
  #[inline]
  pub fn count(&self, predicate: impl FnMut(&&Event) -> bool) -> usize { self.iter().filter(predicate).count() }
  /// Returns `true` if `predicate` returns `true` for exactly one event.
  #[inline]
  pub fn one(&self, predicate: impl FnMut(&&Event) -> bool) -> bool { self.count(predicate) == 1 }

  /// Returns `Some(index)` for the first event where `predicate` returns `true`, or `None` otherwise.
  #[inline]
  pub fn index(&self, predicate: impl FnMut(&Event) -> bool) -> Option<usize> {
    self.iter().position(predicate)
  }

  /// Returns the number of executed commands.
  #[inline]
  pub fn executions(&self) -> usize { self.count(|e| e.is_execute_start()) }
  /// Returns `true` if the command of `target` was executed.
  #[inline]
  pub fn executed(&self, target: &str) -> bool { self.any(|e| e.is_execute_start_of(target)) }
  /// Returns `true` if the command of `target` was executed exactly once.
  #[inline]
  pub fn one_execution_of(&self, target: &str) -> bool { self.one(|e| e.is_execute_start_of(target)) }
  /// Returns the index of the execution start of `target`, or `None` if it was not executed.
  #[inline]
  pub fn index_execute_start_of(&self, target: &str) -> Option<usize> {
    self.index(|e| e.is_execute_start_of(target))
  }
}

impl Tracker for EventTracker {
  #[inline]
  fn build_start(&mut self, root: &str) {
    if self.clear_on_build_start {
      self.events.clear();
    }
    self.events.push(Event::BuildStart { root: root.to_string() });
  }
  #[inline]
  fn build_end(&mut self, root: &str, rebuilt: bool) {
    self.events.push(Event::BuildEnd { root: root.to_string(), rebuilt });
  }
  #[inline]
  fn up_to_date(&mut self, root: &str) {
    self.events.push(Event::UpToDate { root: root.to_string() });
  }
  #[inline]
  fn config_changed(&mut self, class: ConfigClass) {
    self.events.push(Event::ConfigChanged { class });
  }
  #[inline]
  fn execute_start(&mut self, kind: TargetKind, name: &str, command: Option<&str>, _disp: DispMode) {
    self.events.push(Event::ExecuteStart {
      kind,
      name: name.to_string(),
      command: command.map(|c| c.to_string()),
    });
  }
  #[inline]
  fn execute_end(&mut self, kind: TargetKind, name: &str, code: i32) {
    self.events.push(Event::ExecuteEnd { kind, name: name.to_string(), code });
  }
  #[inline]
  fn clean_target(&mut self, name: &str, removed: bool) {
    self.events.push(Event::CleanTarget { name: name.to_string(), removed });
  }
}
