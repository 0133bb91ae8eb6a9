use std::cell::Cell;
use std::io::Stdout;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use anvil::{BuildError, Command, Engine, Toolchain};
use anvil::tracker::CompositeTracker;
use anvil::tracker::event::EventTracker;
use anvil::tracker::writing::WritingTracker;

/// Testing tracker composed of an [`EventTracker`] for assertions and a stdout [`WritingTracker`] for debugging.
pub type TestTracker = CompositeTracker<EventTracker, WritingTracker<Stdout>>;

/// Testing [`Engine`] using [`TestTracker`].
pub type TestEngine = Engine<TestTracker>;

/// Renders `path` as a normalized target name string.
pub fn path_str(path: impl AsRef<Path>) -> String {
  path.as_ref().to_string_lossy().into_owned()
}

pub fn create_test_engine(toolchain: Toolchain, build_dir: impl Into<PathBuf>) -> TestEngine {
  let tracker = CompositeTracker(EventTracker::default(), WritingTracker::new_stdout_writer());
  let mut engine = Engine::with_tracker(toolchain, tracker);
  engine.set_build_dir(build_dir).expect("build directory was already initialized");
  engine
}

pub trait TestEngineExt {
  /// Gets the events recorded for the most recent build.
  fn events(&self) -> &EventTracker;

  /// Builds `name`, then runs `assert` on the recorded events.
  fn build_then_assert(
    &mut self,
    name: &str,
    assert: impl FnOnce(&EventTracker),
  ) -> Result<bool, BuildError>;

  /// Builds `name`, asserting that no command was executed.
  fn build_then_assert_no_execution(&mut self, name: &str) -> Result<bool, BuildError> {
    self.build_then_assert(name, |events| {
      assert_eq!(events.executions(), 0, "expected no executed commands, got {:?}", events.slice());
    })
  }
}

impl TestEngineExt for TestEngine {
  fn events(&self) -> &EventTracker {
    &self.tracker().0
  }

  fn build_then_assert(
    &mut self,
    name: &str,
    assert: impl FnOnce(&EventTracker),
  ) -> Result<bool, BuildError> {
    let rebuilt = self.build(name)?;
    assert(self.events());
    Ok(rebuilt)
  }
}

/// A thunk command writing fixed contents to the target's output path.
pub fn write_output_command(contents: &'static str) -> Command {
  Command::thunk(move |name, _deps, _extra| {
    match std::fs::write(name, contents) {
      Ok(()) => 0,
      Err(_) => 2,
    }
  })
}

/// A thunk command concatenating the contents of all named dependencies into the target's output path, in
/// dependency order. Link-shaped.
pub fn concat_deps_command() -> Command {
  Command::thunk(|name, deps, _extra| {
    let mut contents = String::new();
    for dep in deps {
      if let Some(path) = dep.target_name() {
        match std::fs::read_to_string(path) {
          Ok(text) => contents.push_str(&text),
          Err(_) => return 2,
        }
      }
    }
    match std::fs::write(name, contents) {
      Ok(()) => 0,
      Err(_) => 2,
    }
  })
}

/// A thunk command incrementing `counter` and writing the target's output, for counting invocations.
pub fn counting_command(counter: Rc<Cell<usize>>) -> Command {
  Command::thunk(move |name, _deps, _extra| {
    counter.set(counter.get() + 1);
    match std::fs::write(name, "counted") {
      Ok(()) => 0,
      Err(_) => 2,
    }
  })
}
