#![cfg(unix)]

use std::fs;
use std::path::Path;

use assert_matches::assert_matches;
use rstest::rstest;
use tempfile::TempDir;

use anvil::{BuildError, Target, TargetKind, Toolchain};
use anvil::tracker::event::Event;
use dev_shared::test::temp_dir;
use dev_shared::write_until_newer;

mod util;

use util::*;

/// A stand-in toolchain built from shell utilities. The "compiler" copies its input, the "dependency scanner"
/// copies the source (whose contents are a Make-style dependency line), and the "linker" concatenates its inputs.
fn toolchain() -> Toolchain {
  Toolchain {
    compile: "cp $(FIRST) $(TARGET)".to_string(),
    assemble: "cp $(FIRST) $(TARGET)".to_string(),
    c_dep: "cp $(FIRST) $(TARGET)".to_string(),
    asm_dep: String::new(),
    obj_ext: "o".to_string(),
    link: "cat $(DEPENDS) > $(TARGET)".to_string(),
  }
}

struct Project {
  source: String,
  header: String,
  app: String,
}

/// Lays out a one-source project whose source doubles as its own dependency line, and wires the full pipeline.
fn wire(temp_dir: &TempDir, toolchain: Toolchain) -> Result<(TestEngine, Project), BuildError> {
  let source = path_str(temp_dir.path().join("src").join("a.c"));
  let header = path_str(temp_dir.path().join("src").join("util.h"));
  let app = path_str(temp_dir.path().join("app"));
  fs::create_dir_all(temp_dir.path().join("src"))?;
  if !Path::new(&source).exists() {
    fs::write(&source, format!("a.o: {} {}\n", source, header))?;
    fs::write(&header, "int x;\n")?;
  }

  let mut engine = create_test_engine(toolchain, temp_dir.path().join("build"));
  engine.make_exe_target(&app, &[source.as_str()])?;
  Ok((engine, Project { source, header, app }))
}

#[rstest]
fn test_cold_build(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  let object = engine.object_path(&project.source);
  let dep_file = engine.dep_file_path(&project.source);

  // Cold build: dependency scan, compile, and link run, in that order.
  let rebuilt = engine.build_then_assert(&project.app, |events| {
    assert_eq!(events.executions(), 3);
    let dep_start = events.index_execute_start_of(&dep_file).unwrap();
    let object_start = events.index_execute_start_of(&object).unwrap();
    let app_start = events.index_execute_start_of(&project.app).unwrap();
    assert!(dep_start < object_start);
    assert!(object_start < app_start);
  })?;
  assert!(rebuilt);

  // keep_dir mode: the object file sits next to its source.
  assert_eq!(object, path_str(temp_dir.path().join("src").join("a.o")));
  assert!(Path::new(&object).is_file());
  assert!(Path::new(&dep_file).is_file());
  assert_eq!(fs::read_to_string(&project.app)?, fs::read_to_string(&project.source)?);

  // Both fingerprint classes were persisted under the build directory.
  assert!(temp_dir.path().join("build").join(".builddata.comp").is_file());
  assert!(temp_dir.path().join("build").join(".builddata.link").is_file());
  Ok(())
}

#[rstest]
fn test_warm_rebuild_runs_nothing(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.build(&project.app)?;

  // A subsequent invocation re-wires from persisted state and runs zero commands.
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  let rebuilt = engine.build_then_assert_no_execution(&project.app)?;
  assert!(!rebuilt);
  assert!(engine.events().any(|e| matches!(e, Event::UpToDate { root } if *root == project.app)));
  Ok(())
}

#[rstest]
fn test_touched_source_rebuilds_all_three(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.build(&project.app)?;
  let dep_file = engine.dep_file_path(&project.source);

  let contents = fs::read_to_string(&project.source)?;
  write_until_newer(&project.source, contents, &dep_file)?;

  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.build_then_assert(&project.app, |events| {
    assert_eq!(events.executions(), 3);
  })?;
  Ok(())
}

#[rstest]
fn test_touched_header_rebuilds_through_refined_deps(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.build(&project.app)?;
  let dep_file = engine.dep_file_path(&project.source);

  // The header is only known through the emitted dependency file; touching it must still rebuild everything.
  write_until_newer(&project.header, "int x; int y;\n", &dep_file)?;

  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.build_then_assert(&project.app, |events| {
    assert_eq!(events.executions(), 3);
  })?;
  Ok(())
}

#[rstest]
fn test_compile_flag_change_forces_rebuild(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.build(&project.app)?;

  // Same sources, different compile configuration: everything reruns, announced through the tracker.
  let mut changed = toolchain();
  changed.compile = "cp $(FIRST) $(TARGET) # -O2".to_string();
  let (mut engine, project) = wire(&temp_dir, changed)?;
  engine.build_then_assert(&project.app, |events| {
    assert!(events.any(|e| matches!(e, Event::ConfigChanged { class: anvil::ConfigClass::Comp })));
    assert_eq!(events.executions(), 3);
  })?;
  Ok(())
}

#[rstest]
fn test_config_forced_rebuild_is_transient_on_one_engine(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.build(&project.app)?;

  // Changing the compile configuration on the same engine forces the next run. The first run's dependency
  // refinement rewired the object onto its parsed inputs, so only the object and link are still reachable
  // from the root; dep scans rerun on fresh wiring.
  engine.toolchain_mut().compile = "cp $(FIRST) $(TARGET) # -O2".to_string();
  engine.build_then_assert(&project.app, |events| {
    assert!(events.any(|e| matches!(e, Event::ConfigChanged { class: anvil::ConfigClass::Comp })));
    assert_eq!(events.executions(), 2);
  })?;

  // With nothing further changed, a third run on the same engine is up to date again.
  let rebuilt = engine.build_then_assert_no_execution(&project.app)?;
  assert!(!rebuilt);
  assert!(engine.events().any(|e| matches!(e, Event::UpToDate { root } if *root == project.app)));
  Ok(())
}

#[rstest]
fn test_link_flag_change_forces_relink_only(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.build(&project.app)?;

  let mut changed = toolchain();
  changed.link = "cat $(DEPENDS) > $(TARGET) # v2".to_string();
  let (mut engine, project) = wire(&temp_dir, changed)?;
  engine.build_then_assert(&project.app, |events| {
    assert_eq!(events.executions(), 1);
    assert!(events.executed(&project.app));
  })?;
  Ok(())
}

#[rstest]
fn test_display_mode_all_reports_expanded_commands(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  engine.set_option("disp_mode", "all").map_err(BuildError::Config)?;
  engine.build_then_assert(&project.app, |events| {
    let linked = events.iter().find_map(|e| match e {
      Event::ExecuteStart { name, command, .. } if *name == project.app => command.as_deref(),
      _ => None,
    });
    assert_matches!(linked, Some(command) => {
      assert!(command.starts_with("cat "));
      assert!(command.ends_with(&format!("> {}", project.app)));
    });
  })?;
  Ok(())
}

#[rstest]
fn test_failing_command_aborts_with_last_command(temp_dir: TempDir) -> Result<(), BuildError> {
  let mut failing = toolchain();
  failing.compile = "exit 7".to_string();
  let (mut engine, project) = wire(&temp_dir, failing)?;
  let object = engine.object_path(&project.source);

  assert_matches!(engine.build(&project.app), Err(BuildError::CommandFailed { target, command, code }) => {
    assert_eq!(target, object);
    assert_eq!(command.as_deref(), Some("exit 7"));
    assert_eq!(code, Some(7));
  });
  Ok(())
}

#[rstest]
fn test_two_sources_interleave_scan_and_compile(temp_dir: TempDir) -> Result<(), BuildError> {
  let src_dir = temp_dir.path().join("src");
  fs::create_dir_all(&src_dir)?;
  let source_a = path_str(src_dir.join("a.c"));
  let source_b = path_str(src_dir.join("b.c"));
  let app = path_str(temp_dir.path().join("app"));
  fs::write(&source_a, format!("a.o: {}\n", source_a))?;
  fs::write(&source_b, format!("b.o: {}\n", source_b))?;

  let mut engine = create_test_engine(toolchain(), temp_dir.path().join("build"));
  engine.make_exe_target(&app, &[source_a.as_str(), source_b.as_str()])?;

  engine.build_then_assert(&app, |events| {
    assert_eq!(events.executions(), 5);
    // Each source's scan precedes its compile; the link comes last.
    let kinds: Vec<_> = events.iter().filter_map(|e| match e {
      Event::ExecuteStart { kind, .. } => Some(*kind),
      _ => None,
    }).collect();
    assert_eq!(kinds, vec![
      TargetKind::Depend,
      TargetKind::Compile,
      TargetKind::Depend,
      TargetKind::Compile,
      TargetKind::Link,
    ]);
  })?;
  assert_eq!(
    fs::read_to_string(&app)?,
    format!("{}{}", fs::read_to_string(&source_a)?, fs::read_to_string(&source_b)?)
  );
  Ok(())
}

#[rstest]
fn test_phony_goal_over_pipeline(temp_dir: TempDir) -> Result<(), BuildError> {
  let (mut engine, project) = wire(&temp_dir, toolchain())?;
  let mut all = Target::new("#phony_all", TargetKind::Phony);
  all.raw_deps = vec![anvil::RawDep::leaf(project.app.as_str())];
  engine.register(all);

  engine.build_then_assert("#phony_all", |events| {
    assert_eq!(events.executions(), 3);
  })?;
  assert!(Path::new(&project.app).is_file());
  Ok(())
}
