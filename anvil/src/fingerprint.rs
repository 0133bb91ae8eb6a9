use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::fs;
use crate::toolchain::Toolchain;

/// Component class a configuration fingerprint covers. Each class is persisted to its own file under the build
/// directory and invalidates a different set of targets on mismatch.
#[derive(Clone, Copy, Ord, PartialOrd, Eq, PartialEq, Hash, Debug)]
pub enum ConfigClass {
  Comp,
  Link,
}

impl ConfigClass {
  #[inline]
  pub fn as_str(self) -> &'static str {
    match self {
      ConfigClass::Comp => "comp",
      ConfigClass::Link => "link",
    }
  }

  fn file_path(self, build_dir: &Path) -> PathBuf {
    build_dir.join(format!(".builddata.{}", self.as_str()))
  }
}

#[derive(Serialize)]
struct CompRecord<'a> {
  compile: &'a str,
  assemble: &'a str,
  c_dep: &'a str,
  asm_dep: &'a str,
  obj_ext: &'a str,
}

#[derive(Serialize)]
struct LinkRecord<'a> {
  link: &'a str,
}

/// Serializes the configuration record of `class` as a canonical string: ron text with stable field order.
pub fn serialize_record(toolchain: &Toolchain, class: ConfigClass) -> String {
  let record = match class {
    ConfigClass::Comp => ron::to_string(&CompRecord {
      compile: &toolchain.compile,
      assemble: &toolchain.assemble,
      c_dep: &toolchain.c_dep,
      asm_dep: &toolchain.asm_dep,
      obj_ext: &toolchain.obj_ext,
    }),
    ConfigClass::Link => ron::to_string(&LinkRecord { link: &toolchain.link }),
  };
  record.expect("BUG: serializing configuration record failed")
}

/// Compares `current` against the record persisted from the previous run and writes `current` back to disk (always,
/// even if unchanged). Comparison is case-insensitive and skipped in clean mode. Returns `true` iff a previous
/// record existed and differed.
pub fn compare_and_store(build_dir: &Path, class: ConfigClass, current: &str, clean: bool) -> Result<bool, io::Error> {
  let path = class.file_path(build_dir);
  let mut changed = false;
  if !clean && fs::metadata(&path)?.is_some() {
    let previous = std::fs::read_to_string(&path)?;
    changed = !previous.trim().eq_ignore_ascii_case(current.trim());
  }
  std::fs::write(&path, current)?;
  Ok(changed)
}

/// Removes the persisted record of `class`, returning whether a record existed. Removal of a missing record is not
/// an error.
pub fn remove(build_dir: &Path, class: ConfigClass) -> Result<bool, io::Error> {
  match std::fs::remove_file(class.file_path(build_dir)) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
    Err(e) => Err(e),
    Ok(()) => Ok(true),
  }
}
