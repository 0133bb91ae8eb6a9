//! Incremental dependency-driven build engine for embedded firmware projects.
//!
//! The engine maintains a graph of build [`Target`]s, determines which are stale with respect to their inputs,
//! expands and executes toolchain command templates to regenerate them, and persists tool-configuration fingerprints
//! and compiler-emitted header dependencies so that subsequent invocations do the minimum work required.
//!
//! Project wiring registers targets through an [`Engine`] (directly, or through the
//! [`make_exe_target`](Engine::make_exe_target) pipeline) and then calls [`Engine::build`] with the name of a goal.
//! The build is a single serial top-down traversal: each target resolves its dependencies against the registry,
//! builds them, aggregates their staleness signals, and runs its command at most once per run.

pub use command::Command;
pub use dep::{DepResults, FileDep, RawDep, ResolvedDep};
pub use engine::{BuildMode, Engine};
pub use error::{BuildError, ConfigError};
pub use fingerprint::ConfigClass;
pub use options::{OptionDef, OptionKind, OptionRegistry, OptionValue};
pub use store::{Store, TargetNode};
pub use target::{Hook, HookScope, Target, TargetKind, TargetName, PHONY_PREFIX};
pub use toolchain::Toolchain;
pub use tracker::{DispMode, Tracker};

pub mod command;
mod context;
pub mod dep;
pub mod engine;
pub mod error;
pub mod fingerprint;
pub mod fs;
pub mod options;
pub mod store;
pub mod target;
pub mod toolchain;
pub mod tracker;
