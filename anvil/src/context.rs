use std::collections::HashSet;

use crate::command::{self, Command};
use crate::dep::{self, DepResults, ResolvedDep};
use crate::error::BuildError;
use crate::fs;
use crate::store::{Store, TargetNode};
use crate::target::{HookScope, Target, TargetKind, TargetName};
use crate::tracker::{DispMode, Tracker};

/// Per-run build context: borrows the engine internals for one top-down traversal and owns the per-run memoization
/// state.
///
/// This cannot have any generic type parameters: the tracker is taken as a trait object so that the recursion does
/// not propagate the engine's tracker type into every signature.
pub(crate) struct BuildContext<'e> {
  store: &'e mut Store,
  tracker: &'e mut (dyn Tracker + 'e),
  dep_results: &'e mut DepResults,
  clean: bool,
  global_force_rebuild: bool,
  disp_mode: DispMode,
  ran: HashSet<TargetNode>,
}

impl<'e> BuildContext<'e> {
  pub fn new(
    store: &'e mut Store,
    tracker: &'e mut (dyn Tracker + 'e),
    dep_results: &'e mut DepResults,
    clean: bool,
    global_force_rebuild: bool,
    disp_mode: DispMode,
  ) -> Self {
    Self {
      store,
      tracker,
      dep_results,
      clean,
      global_force_rebuild,
      disp_mode,
      ran: HashSet::new(),
    }
  }

  /// Builds `node`, returning whether it was regenerated and its parents must consider themselves stale.
  ///
  /// A target whose command already ran this run is a no-op reporting `false`. Otherwise staleness is accumulated
  /// from: a missing output file, the global force-rebuild flag, stale or newer dependencies, the target's own force
  /// flag, and clean mode. When stale and a command is present, the command runs (or, in clean mode, the output file
  /// is removed instead). Pre/post hooks fire around command execution; a pre-hook that rewrites the dependency list
  /// restarts dependency evaluation from the staleness value at entry, discarding signals from the replaced
  /// dependency set.
  pub fn build(&mut self, node: TargetNode) -> Result<bool, BuildError> {
    if self.ran.contains(&node) {
      return Ok(false);
    }

    let (name, kind, has_command) = {
      let target = self.store.target(node);
      (target.name.clone(), target.kind, target.command.is_some())
    };

    // A non-phony target whose output file does not exist yet must run its command.
    let output_missing = name.file_path().map_or(false, |path| !fs::is_file(path));
    let initial = output_missing || self.global_force_rebuild;
    let mut run_command = initial;

    let (mut resolved, mut depends, stale) = self.evaluate_deps(node, &name)?;
    run_command |= stale;

    if let Some(mut hook) = self.store.target_mut(node).pre_hook.take() {
      let deps_before = self.store.target(node).raw_deps.clone();
      {
        let store = &mut *self.store;
        let dep_results = &mut *self.dep_results;
        let Target { name, raw_deps, force_rebuild, .. } = store.target_mut(node);
        let mut scope = HookScope { name, raw_deps, force_rebuild, dep_results };
        hook(&mut scope, run_command);
      }
      self.store.target_mut(node).pre_hook = Some(hook);
      if self.store.target(node).raw_deps != deps_before {
        // The hook redefined the dependency set: evaluate it afresh from the staleness value at entry.
        run_command = initial;
        let (new_resolved, new_depends, stale) = self.evaluate_deps(node, &name)?;
        resolved = new_resolved;
        depends = new_depends;
        run_command |= stale;
      }
    }

    run_command |= self.store.target(node).force_rebuild || self.clean;

    let mut keep = true;
    if run_command && has_command {
      if self.clean {
        self.clean_target(&name);
      } else {
        keep = self.execute_command(node, &name, kind, &resolved, &depends)?;
      }
    }

    if let Some(mut hook) = self.store.target_mut(node).post_hook.take() {
      {
        let store = &mut *self.store;
        let dep_results = &mut *self.dep_results;
        let Target { name, raw_deps, force_rebuild, .. } = store.target_mut(node);
        let mut scope = HookScope { name, raw_deps, force_rebuild, dep_results };
        hook(&mut scope, run_command);
      }
      self.store.target_mut(node).post_hook = Some(hook);
    }

    self.ran.insert(node);
    Ok(run_command && keep)
  }

  /// Resolves the dependencies of `node` and evaluates them in order, building each in turn. Returns the resolved
  /// list, the space-joined names of all named dependencies, and the accumulated staleness: a stale child, or a
  /// child target whose output file is newer than this target's.
  fn evaluate_deps(
    &mut self,
    node: TargetNode,
    name: &TargetName,
  ) -> Result<(Vec<ResolvedDep>, String, bool), BuildError> {
    let resolved = {
      let target = self.store.target(node);
      dep::resolve(self.store, &target.name, &target.raw_deps)
    };
    let consumer_file = name.file_path().map(|path| path.to_path_buf());

    let mut stale = false;
    let mut depends = String::new();
    for dep in &resolved {
      let child_stale = match dep {
        ResolvedDep::Target { node: child, .. } => self.build(*child)?,
        ResolvedDep::File(file) => file.is_stale(),
      };
      stale |= child_stale;
      if let ResolvedDep::Target { file: Some(file), .. } = dep {
        stale |= fs::newer_than(file, consumer_file.as_deref());
      }
      if let Some(dep_name) = dep.target_name() {
        if !depends.is_empty() {
          depends.push(' ');
        }
        depends.push_str(dep_name);
      }
    }
    Ok((resolved, depends, stale))
  }

  /// Executes the command of `node`. Returns `false` when a thunk signalled "ran, but report fresh" (code 1), `true`
  /// on success, and an error for any other non-zero code.
  fn execute_command(
    &mut self,
    node: TargetNode,
    name: &TargetName,
    kind: TargetKind,
    resolved: &[ResolvedDep],
    depends: &str,
  ) -> Result<bool, BuildError> {
    let mut taken = self.store.target_mut(node).command.take()
      .expect("BUG: execute_command invoked on a target without a command");
    let result = match &mut taken {
      Command::Template(template) => {
        let first = resolved.first().and_then(|dep| dep.target_name()).unwrap_or("");
        let expanded = command::expand_template(template, name.as_str(), depends, first);
        self.tracker.execute_start(kind, name.as_str(), Some(&expanded), self.disp_mode);
        match command::run_shell(&expanded) {
          Err(e) => Err(BuildError::Io(e)),
          Ok(code) => {
            self.tracker.execute_end(kind, name.as_str(), code);
            if code == 0 {
              Ok(true)
            } else {
              Err(BuildError::CommandFailed {
                target: name.as_str().to_string(),
                command: Some(expanded),
                code: Some(code),
              })
            }
          }
        }
      }
      Command::Thunk(thunk) => {
        self.tracker.execute_start(kind, name.as_str(), None, self.disp_mode);
        let code = {
          let extra_args = self.store.target(node).extra_args.as_deref();
          thunk(name.as_str(), resolved, extra_args)
        };
        self.tracker.execute_end(kind, name.as_str(), code);
        match code {
          0 => Ok(true),
          1 => Ok(false),
          code => Err(BuildError::CommandFailed {
            target: name.as_str().to_string(),
            command: None,
            code: Some(code),
          }),
        }
      }
    };
    self.store.target_mut(node).command = Some(taken);
    result
  }

  /// Removes the output file of a non-phony target instead of running its command. Failure to remove is benign and
  /// only reported through the tracker.
  fn clean_target(&mut self, name: &TargetName) {
    if let Some(path) = name.file_path() {
      let removed = std::fs::remove_file(path).is_ok();
      self.tracker.clean_target(name.as_str(), removed);
    }
  }
}
