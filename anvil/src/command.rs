use std::any::Any;
use std::io;
use std::process;

use crate::dep::ResolvedDep;

/// A callable command: receives the target name, the resolved dependency list, and the target's opaque extra
/// arguments, and returns an exit code. Code `0` means success; code `1` means the command ran successfully but the
/// target must report itself fresh to its parents; any other code aborts the build.
pub type Thunk = Box<dyn FnMut(&str, &[ResolvedDep], Option<&dyn Any>) -> i32>;

/// The command regenerating a target's output: either a template string expanded and executed through the OS shell,
/// or a thunk invoked in-process.
pub enum Command {
  Template(String),
  Thunk(Thunk),
}

impl Command {
  #[inline]
  pub fn template(template: impl Into<String>) -> Self { Self::Template(template.into()) }

  #[inline]
  pub fn thunk(f: impl FnMut(&str, &[ResolvedDep], Option<&dyn Any>) -> i32 + 'static) -> Self {
    Self::Thunk(Box::new(f))
  }
}

/// Expands the substitution tokens `$(TARGET)`, `$(DEPENDS)`, and `$(FIRST)` in `template`. Substitution is textual,
/// single-pass, and non-recursive: tokens appearing in substituted text are not expanded again.
pub fn expand_template(template: &str, target: &str, depends: &str, first: &str) -> String {
  let mut expanded = String::with_capacity(template.len() + target.len() + depends.len());
  let mut rest = template;
  while let Some(i) = rest.find("$(") {
    expanded.push_str(&rest[..i]);
    let after = &rest[i + 2..];
    if let Some(remainder) = after.strip_prefix("TARGET)") {
      expanded.push_str(target);
      rest = remainder;
    } else if let Some(remainder) = after.strip_prefix("DEPENDS)") {
      expanded.push_str(depends);
      rest = remainder;
    } else if let Some(remainder) = after.strip_prefix("FIRST)") {
      expanded.push_str(first);
      rest = remainder;
    } else {
      expanded.push_str("$(");
      rest = after;
    }
  }
  expanded.push_str(rest);
  expanded
}

/// Executes `command` through the OS shell, returning its exit code. A termination without exit code (e.g. by
/// signal) yields `-1`.
pub fn run_shell(command: &str) -> Result<i32, io::Error> {
  #[cfg(unix)]
  let status = process::Command::new("sh").arg("-c").arg(command).status()?;
  #[cfg(windows)]
  let status = process::Command::new("cmd").arg("/C").arg(command).status()?;
  Ok(status.code().unwrap_or(-1))
}
