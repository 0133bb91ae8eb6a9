use std::io;
use std::path::{Path, PathBuf};

use crate::command::Command;
use crate::context::BuildContext;
use crate::dep::{self, DepResults, RawDep};
use crate::error::{BuildError, ConfigError};
use crate::fingerprint::{self, ConfigClass};
use crate::options::{OptionRegistry, OptionValue};
use crate::store::{Store, TargetNode};
use crate::target::{Target, TargetKind, TargetName};
use crate::toolchain::Toolchain;
use crate::tracker::{DispMode, Tracker};

/// Where object files are placed.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum BuildMode {
  /// Next to the source file, with the extension swapped.
  KeepDir,
  /// In the build directory, flattened to the last path segment.
  BuildDir,
  /// In the build directory, with path separators replaced by `__`.
  BuildDirLinearized,
}

/// Top-level build driver: owns the target store, the toolchain configuration, the engine flags, and the per-project
/// header-dependency results, and provides the [`build`](Self::build) entry point.
///
/// All mutable engine state lives on this value; a build borrows it exclusively for one serial traversal.
pub struct Engine<A = ()> {
  store: Store,
  tracker: A,
  toolchain: Toolchain,
  options: OptionRegistry,
  build_dir: PathBuf,
  build_mode: BuildMode,
  disp_mode: DispMode,
  clean: bool,
  /// User-requested unconditional rebuild, set through the `force` option.
  force_rebuild: bool,
  /// Fingerprint-derived rebuild signal, recomputed at the start of every run.
  global_force_rebuild: bool,
  output_dir_created: bool,
  dep_results: DepResults,
}

impl Engine<()> {
  #[inline]
  pub fn new(toolchain: Toolchain) -> Self { Self::with_tracker(toolchain, ()) }
}

impl<A: Tracker> Engine<A> {
  pub fn with_tracker(toolchain: Toolchain, tracker: A) -> Self {
    Self {
      store: Store::default(),
      tracker,
      toolchain,
      options: OptionRegistry::builtin(),
      build_dir: PathBuf::from("build"),
      build_mode: BuildMode::KeepDir,
      disp_mode: DispMode::Summary,
      clean: false,
      force_rebuild: false,
      global_force_rebuild: false,
      output_dir_created: false,
      dep_results: DepResults::default(),
    }
  }

  #[inline]
  pub fn tracker(&self) -> &A { &self.tracker }
  #[inline]
  pub fn tracker_mut(&mut self) -> &mut A { &mut self.tracker }
  #[inline]
  pub fn toolchain(&self) -> &Toolchain { &self.toolchain }
  #[inline]
  pub fn toolchain_mut(&mut self) -> &mut Toolchain { &mut self.toolchain }
  /// Gets the configuration-option registry, for consumption by an external CLI component.
  #[inline]
  pub fn options(&self) -> &OptionRegistry { &self.options }

  /// Validates and applies the option registered under `name`.
  pub fn set_option(&mut self, name: &str, raw: &str) -> Result<(), ConfigError> {
    let value = self.options.parse(name, raw)?;
    match (name, value) {
      ("build_mode", OptionValue::Str(mode)) => {
        self.build_mode = match mode.as_str() {
          "keep_dir" => BuildMode::KeepDir,
          "build_dir" => BuildMode::BuildDir,
          "build_dir_linearized" => BuildMode::BuildDirLinearized,
          mode => panic!("BUG: validated build mode '{}' has no variant", mode),
        };
      }
      ("build_dir", OptionValue::Str(dir)) => return self.set_build_dir(dir),
      ("disp_mode", OptionValue::Str(mode)) => {
        self.disp_mode = if mode == "all" { DispMode::All } else { DispMode::Summary };
      }
      ("clean", OptionValue::Bool(clean)) => self.clean = clean,
      ("force", OptionValue::Bool(force)) => self.force_rebuild = force,
      (name, _) => panic!("BUG: option '{}' has no engine field", name),
    }
    Ok(())
  }

  #[inline]
  pub fn set_build_mode(&mut self, mode: BuildMode) { self.build_mode = mode; }
  #[inline]
  pub fn set_disp_mode(&mut self, mode: DispMode) { self.disp_mode = mode; }
  #[inline]
  pub fn set_clean(&mut self, clean: bool) { self.clean = clean; }
  #[inline]
  pub fn set_force_rebuild(&mut self, force: bool) { self.force_rebuild = force; }

  /// Sets the output directory. Fails once the directory has been initialized on disk.
  pub fn set_build_dir(&mut self, dir: impl Into<PathBuf>) -> Result<(), ConfigError> {
    if self.output_dir_created {
      return Err(ConfigError::BuildDirInitialized);
    }
    self.build_dir = dir.into();
    Ok(())
  }

  /// Registers `target`, returning its node.
  #[inline]
  pub fn register(&mut self, target: Target) -> TargetNode { self.store.register(target) }
  /// Gets the node registered under `name`, or `None` if no target is registered under it.
  #[inline]
  pub fn lookup(&self, name: &str) -> Option<TargetNode> { self.store.lookup(&TargetName::new(name)) }
  /// Gets the target for `node`.
  #[inline]
  pub fn target(&self, node: TargetNode) -> &Target { self.store.target(node) }
  /// Gets the target for `node`, mutably. Targets may be mutated (dependencies, hooks, flags) up until
  /// [`build`](Self::build) is called; commands are never replaced.
  #[inline]
  pub fn target_mut(&mut self, node: TargetNode) -> &mut Target { self.store.target_mut(node) }

  /// Gets the object file path for `source` under the configured build mode.
  pub fn object_path(&self, source: &str) -> String {
    let source = source.replace('\\', "/");
    match self.build_mode {
      BuildMode::KeepDir => swap_extension(&source, &self.toolchain.obj_ext),
      BuildMode::BuildDir => {
        let base = source.rsplit('/').next().unwrap_or(source.as_str());
        let object = swap_extension(base, &self.toolchain.obj_ext);
        join_dir(&self.build_dir, &object)
      }
      BuildMode::BuildDirLinearized => {
        let object = swap_extension(&source.replace('/', "__"), &self.toolchain.obj_ext);
        join_dir(&self.build_dir, &object)
      }
    }
  }

  /// Gets the dependency file path for `source`: the linearized source path with `.d` appended, under the build
  /// directory.
  pub fn dep_file_path(&self, source: &str) -> String {
    let linearized = source.replace('\\', "/").replace('/', "__");
    join_dir(&self.build_dir, &format!("{}.d", linearized))
  }

  /// Wires the full target pipeline for an executable built from `sources`: per source a dep-scan target emitting a
  /// Make-style dependency file and a compile (or assemble) target consuming its parsed results, and a link target
  /// over all object files. Returns the link target's node.
  ///
  /// Dep-scan targets publish their freshly-emitted dependency lists through a post-hook; compile targets pick them
  /// up through a pre-hook that replaces their dependency list before resolution. Because each compile target
  /// depends on its dep-scan target, the publication always precedes the pickup within a run.
  ///
  /// If `name` has no extension, the platform executable extension is appended. A change in the persisted link
  /// configuration forces the link target to rebuild.
  pub fn make_exe_target(&mut self, name: &str, sources: &[&str]) -> Result<TargetNode, BuildError> {
    self.ensure_build_dir()?;

    let mut objects = Vec::with_capacity(sources.len());
    for source in sources {
      let source = TargetName::new(source).as_str().to_string();
      let extension = Path::new(&source).extension().and_then(|e| e.to_str()).unwrap_or("");
      let (compile_template, dep_template, kind) = match extension {
        "s" | "S" | "asm" => (self.toolchain.assemble.clone(), self.toolchain.asm_dep.clone(), TargetKind::Assemble),
        _ => (self.toolchain.compile.clone(), self.toolchain.c_dep.clone(), TargetKind::Compile),
      };

      let object_name = self.object_path(&source);
      let mut object = Target::new(object_name.as_str(), kind);
      object.command = Some(Command::Template(compile_template));

      if !dep_template.is_empty() {
        let dep_name = self.dep_file_path(&source);
        let mut dep_target = Target::new(dep_name.as_str(), TargetKind::Depend);
        dep_target.command = Some(Command::Template(dep_template));
        // Seed the dep-scan target with the dependency list of the previous run, so it reruns when a header
        // changes, not only when the source does.
        let prior = std::fs::read_to_string(&dep_name).ok()
          .map(|text| dep::parse_dep_file(&text))
          .filter(|deps| !deps.is_empty());
        dep_target.raw_deps = match prior {
          Some(deps) => deps.into_iter().map(RawDep::Leaf).collect(),
          None => vec![RawDep::leaf(source.clone())],
        };
        let dep_file = dep_name.clone();
        let source_key = source.clone();
        dep_target.post_hook = Some(Box::new(move |scope, _ran| {
          let mut deps = std::fs::read_to_string(&dep_file)
            .map(|text| dep::parse_dep_file(&text))
            .unwrap_or_default();
          if deps.is_empty() {
            deps.push(source_key.clone());
          }
          scope.dep_results.insert(source_key.clone(), deps);
        }));
        self.register(dep_target);

        object.raw_deps = vec![RawDep::leaf(dep_name)];
        let source_key = source.clone();
        object.pre_hook = Some(Box::new(move |scope, _will_run| {
          if let Some(deps) = scope.dep_results.get(&source_key) {
            *scope.raw_deps = deps.iter().cloned().map(RawDep::Leaf).collect();
          }
        }));
      } else {
        object.raw_deps = vec![RawDep::leaf(source.clone())];
      }

      objects.push(object_name);
      self.register(object);
    }

    let mut out_name = TargetName::new(name).as_str().to_string();
    if Path::new(&out_name).extension().is_none() && !std::env::consts::EXE_EXTENSION.is_empty() {
      out_name.push('.');
      out_name.push_str(std::env::consts::EXE_EXTENSION);
    }
    let mut link_target = Target::new(out_name.as_str(), TargetKind::Link);
    link_target.command = Some(Command::Template(self.toolchain.link.clone()));
    link_target.raw_deps = objects.into_iter().map(RawDep::Leaf).collect();
    let record = fingerprint::serialize_record(&self.toolchain, ConfigClass::Link);
    if fingerprint::compare_and_store(&self.build_dir, ConfigClass::Link, &record, self.clean)? {
      self.tracker.config_changed(ConfigClass::Link);
      link_target.force_rebuild = true;
    }
    Ok(self.register(link_target))
  }

  /// Builds the target registered under `name`, returning whether it was regenerated. `Ok(false)` means the target
  /// was up to date.
  ///
  /// Compares the persisted compile configuration first, forcing a full rebuild on mismatch. In clean mode the
  /// traversal removes output files instead of running commands, and the persisted configuration records are removed
  /// at the end.
  ///
  /// An `Err` maps to process exit code 1 at the CLI boundary; the engine itself never exits.
  pub fn build(&mut self, name: &str) -> Result<bool, BuildError> {
    let root_name = TargetName::new(name);
    let Some(root) = self.store.lookup(&root_name) else {
      return Err(BuildError::TargetNotFound {
        name: root_name.as_str().to_string(),
        available: self.store.listing(),
      });
    };
    self.ensure_build_dir()?;
    self.tracker.build_start(root_name.as_str());

    let record = fingerprint::serialize_record(&self.toolchain, ConfigClass::Comp);
    let config_changed = fingerprint::compare_and_store(&self.build_dir, ConfigClass::Comp, &record, self.clean)?;
    if config_changed {
      self.tracker.config_changed(ConfigClass::Comp);
    }
    self.global_force_rebuild = config_changed;
    let rebuilt = {
      let mut context = BuildContext::new(
        &mut self.store,
        &mut self.tracker,
        &mut self.dep_results,
        self.clean,
        self.force_rebuild || self.global_force_rebuild,
        self.disp_mode,
      );
      context.build(root)?
    };
    if !rebuilt && !self.clean {
      self.tracker.up_to_date(root_name.as_str());
    }
    self.tracker.build_end(root_name.as_str(), rebuilt);

    if self.clean {
      fingerprint::remove(&self.build_dir, ConfigClass::Comp)?;
      fingerprint::remove(&self.build_dir, ConfigClass::Link)?;
    }
    Ok(rebuilt)
  }

  fn ensure_build_dir(&mut self) -> Result<(), io::Error> {
    if !self.output_dir_created {
      std::fs::create_dir_all(&self.build_dir)?;
      self.output_dir_created = true;
    }
    Ok(())
  }
}

fn swap_extension(path: &str, extension: &str) -> String {
  let mut path = PathBuf::from(path);
  path.set_extension(extension);
  path.to_string_lossy().into_owned()
}

fn join_dir(dir: &Path, file: &str) -> String {
  dir.join(file).to_string_lossy().replace('\\', "/")
}
