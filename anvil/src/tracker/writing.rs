use std::io;
use std::io::{Stderr, Stdout};

use crate::fingerprint::ConfigClass;
use crate::target::TargetKind;
use crate::tracker::{DispMode, Tracker};

/// A [`Tracker`] that writes build progress to a [`std::io::Write`] instance, for example [`std::io::Stdout`]. This
/// is the user-facing display: in `all` mode it prints every expanded command line, in `summary` mode a kind label
/// plus target name.
#[derive(Debug, Clone)]
pub struct WritingTracker<W> {
  writer: W,
}

impl Default for WritingTracker<Stdout> {
  #[inline]
  fn default() -> Self { Self::new_stdout_writer() }
}

impl<W: io::Write> WritingTracker<W> {
  #[inline]
  pub fn new(writer: W) -> Self { Self { writer } }
}

impl WritingTracker<Stdout> {
  #[inline]
  pub fn new_stdout_writer() -> Self { Self::new(io::stdout()) }
}

impl WritingTracker<Stderr> {
  #[inline]
  pub fn new_stderr_writer() -> Self { Self::new(io::stderr()) }
}

impl<W: io::Write> WritingTracker<W> {
  #[inline]
  fn writeln(&mut self, args: std::fmt::Arguments) {
    writeln!(&mut self.writer, "{}", args).ok();
  }
}

impl<W: io::Write> Tracker for WritingTracker<W> {
  #[inline]
  fn up_to_date(&mut self, root: &str) {
    self.writeln(format_args!("{}: up to date", root));
  }

  #[inline]
  fn config_changed(&mut self, class: ConfigClass) {
    if class == ConfigClass::Comp {
      self.writeln(format_args!("Forcing rebuild due to configuration change"));
    }
  }

  #[inline]
  fn execute_start(&mut self, kind: TargetKind, name: &str, command: Option<&str>, disp: DispMode) {
    match (disp, command) {
      (DispMode::All, Some(command)) => self.writeln(format_args!("{}", command)),
      _ => self.writeln(format_args!("{:>8}  {}", kind.label(), name)),
    }
  }

  #[inline]
  fn clean_target(&mut self, name: &str, removed: bool) {
    if removed {
      self.writeln(format_args!("{:>8}  {}", "clean", name));
    } else {
      self.writeln(format_args!("{:>8}  {} failed!", "clean", name));
    }
  }
}
