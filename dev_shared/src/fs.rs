use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use tempfile::TempDir;

/// Creates a new temporary directory that gets cleaned up when dropped.
pub fn create_temp_dir() -> TempDir {
  TempDir::new().expect("failed to create temporary directory")
}

/// Creates a new temporary file inside a fresh temporary directory, returning its path tied to the directory guard.
/// The file gets cleaned up when the guard is dropped.
pub fn create_temp_file() -> TempFile {
  let dir = create_temp_dir();
  let path = dir.path().join("temp.txt");
  fs::write(&path, "").expect("failed to create temporary file");
  TempFile { path, _dir: dir }
}

/// A temporary file path tied to the lifetime of its temporary directory.
pub struct TempFile {
  path: PathBuf,
  _dir: TempDir,
}

impl TempFile {
  pub fn path(&self) -> &Path { &self.path }
}

impl AsRef<Path> for TempFile {
  fn as_ref(&self) -> &Path { &self.path }
}

fn get_modified(path: impl AsRef<Path>) -> Result<SystemTime, std::io::Error> {
  let modified = match fs::metadata(path) {
    Err(e) if e.kind() == std::io::ErrorKind::NotFound => SystemTime::UNIX_EPOCH,
    Err(e) => Err(e)?,
    Ok(m) => m.modified()?
  };
  Ok(modified)
}

/// Keeps writing `contents` to file at `path` until its last modified time changes, then returns the modified time.
/// Needed because some modified time implementations have low precision and do not change after writing in quick
/// succession.
pub fn write_until_modified(path: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Result<SystemTime, std::io::Error> {
  let path = path.as_ref();
  let contents = contents.as_ref();
  let modified = get_modified(path)?;
  loop {
    fs::write(path, contents)?;
    if modified != get_modified(path)? { break; }
  }
  Ok(modified)
}

/// Keeps writing `contents` to file at `path` until its last modified time is strictly newer than the modified time
/// of the file at `reference`. Useful for tests that compare modification times across files on filesystems with
/// coarse timestamp granularity.
pub fn write_until_newer(
  path: impl AsRef<Path>,
  contents: impl AsRef<[u8]>,
  reference: impl AsRef<Path>,
) -> Result<(), std::io::Error> {
  let path = path.as_ref();
  let contents = contents.as_ref();
  let reference_modified = get_modified(reference)?;
  loop {
    fs::write(path, contents)?;
    if get_modified(path)? > reference_modified { break; }
  }
  Ok(())
}
