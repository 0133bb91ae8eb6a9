use std::{fs, io};
use std::fs::Metadata;
use std::path::Path;
use std::time::SystemTime;

/// Gets the metadata for given `path`, returning:
/// - `Ok(Some(metadata))` if a file or directory exists at given path,
/// - `Ok(None)` if no file or directory exists at given path,
/// - `Err(e)` if there was an error getting the metadata for given path.
pub fn metadata(path: impl AsRef<Path>) -> Result<Option<Metadata>, io::Error> {
  match fs::metadata(path) {
    Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
    Err(e) => Err(e),
    Ok(m) => Ok(Some(m))
  }
}

/// Checks whether a regular file exists at given `path`. A directory or a missing path both yield `false`.
pub fn is_file(path: impl AsRef<Path>) -> bool {
  metadata(path).ok().flatten().map_or(false, |m| m.is_file())
}

/// Gets the last modification time of the file at given `path`, or `None` if no file exists at given path (or its
/// modification time cannot be queried). Because `None` orders before every `Some`, a missing file compares older
/// than any existing file.
pub fn modified_time(path: impl AsRef<Path>) -> Option<SystemTime> {
  metadata(path).ok().flatten().and_then(|m| m.modified().ok())
}

/// Checks whether the file at given `path` was modified more recently than the file at given `other`. `None` for
/// `other` means there is nothing to compare against, so any existing file at `path` is newer.
pub fn newer_than(path: impl AsRef<Path>, other: Option<&Path>) -> bool {
  modified_time(path) > other.and_then(modified_time)
}
