use std::error::Error;
use std::fmt;
use std::io;

/// Error building a target graph. Surfaced up the build traversal; mapping an error to a non-zero process exit is
/// the caller's concern.
#[derive(Debug)]
pub enum BuildError {
  /// The requested top-level target is not registered. Carries the registered targets with their help strings.
  TargetNotFound {
    name: String,
    available: Vec<(String, String)>,
  },
  /// An external command exited non-zero, or a thunk returned an out-of-band code.
  CommandFailed {
    target: String,
    command: Option<String>,
    code: Option<i32>,
  },
  /// Filesystem error, e.g. creating the build directory or persisting a fingerprint.
  Io(io::Error),
  /// Invalid engine configuration.
  Config(ConfigError),
}

impl fmt::Display for BuildError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      BuildError::TargetNotFound { name, available } => {
        writeln!(f, "target '{}' not found; available targets:", name)?;
        for (target, help) in available {
          if help.is_empty() {
            writeln!(f, "  {}", target)?;
          } else {
            writeln!(f, "  {}: {}", target, help)?;
          }
        }
        Ok(())
      }
      BuildError::CommandFailed { target, command, code } => {
        match code {
          Some(code) => write!(f, "building '{}' failed with exit code {}", target, code)?,
          None => write!(f, "building '{}' failed", target)?,
        }
        if let Some(command) = command {
          write!(f, "\nlast command: {}", command)?;
        }
        Ok(())
      }
      BuildError::Io(e) => write!(f, "i/o error: {}", e),
      BuildError::Config(e) => write!(f, "{}", e),
    }
  }
}

impl Error for BuildError {
  fn source(&self) -> Option<&(dyn Error + 'static)> {
    match self {
      BuildError::Io(e) => Some(e),
      BuildError::Config(e) => Some(e),
      _ => None,
    }
  }
}

impl From<io::Error> for BuildError {
  #[inline]
  fn from(e: io::Error) -> Self { Self::Io(e) }
}

impl From<ConfigError> for BuildError {
  #[inline]
  fn from(e: ConfigError) -> Self { Self::Config(e) }
}

/// Error configuring an engine through its option registry.
#[derive(Debug)]
pub enum ConfigError {
  /// No option is registered under this name. Carries the rendered option help.
  UnknownOption { name: String, help: String },
  /// The raw value does not parse for the option's kind.
  InvalidValue {
    option: &'static str,
    value: String,
    allowed: String,
  },
  /// The output directory cannot be changed after it has been initialized.
  BuildDirInitialized,
}

impl fmt::Display for ConfigError {
  fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
    match self {
      ConfigError::UnknownOption { name, help } => {
        write!(f, "unknown option '{}'; recognized options:\n{}", name, help)
      }
      ConfigError::InvalidValue { option, value, allowed } => {
        write!(f, "invalid value '{}' for option '{}' (allowed: {})", value, option, allowed)
      }
      ConfigError::BuildDirInitialized => {
        write!(f, "cannot change the output directory after it has been initialized")
      }
    }
  }
}

impl Error for ConfigError {}
