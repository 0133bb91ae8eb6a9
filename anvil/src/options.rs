use crate::error::ConfigError;

/// Value kind of a configuration option, driving validation and help output.
#[derive(Clone, Copy, Debug)]
pub enum OptionKind {
  /// Boolean flag.
  Bool,
  /// Free-form string.
  Str,
  /// One value out of a fixed list.
  Choice(&'static [&'static str]),
  /// One key out of a fixed list, mapped to a canonical value.
  ChoiceMap(&'static [(&'static str, &'static str)]),
}

/// A typed configuration option: name, help text, default, and value kind. The validator parses a raw string into a
/// typed [`OptionValue`]; the printer renders the allowed values and default for help output.
#[derive(Clone, Copy, Debug)]
pub struct OptionDef {
  pub name: &'static str,
  pub help: &'static str,
  pub default: &'static str,
  pub kind: OptionKind,
}

/// A validated option value.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum OptionValue {
  Bool(bool),
  Str(String),
}

impl OptionDef {
  /// Validates `raw` against this option's kind, returning the typed value. Choice-map options return the mapped
  /// canonical value.
  pub fn parse(&self, raw: &str) -> Result<OptionValue, ConfigError> {
    match self.kind {
      OptionKind::Bool => match raw {
        "1" | "true" | "yes" | "on" => Ok(OptionValue::Bool(true)),
        "0" | "false" | "no" | "off" => Ok(OptionValue::Bool(false)),
        _ => Err(self.invalid(raw)),
      },
      OptionKind::Str => Ok(OptionValue::Str(raw.to_string())),
      OptionKind::Choice(choices) => {
        if choices.iter().any(|choice| *choice == raw) {
          Ok(OptionValue::Str(raw.to_string()))
        } else {
          Err(self.invalid(raw))
        }
      }
      OptionKind::ChoiceMap(choices) => {
        match choices.iter().find(|(key, _)| *key == raw) {
          Some((_, value)) => Ok(OptionValue::Str(value.to_string())),
          None => Err(self.invalid(raw)),
        }
      }
    }
  }

  /// Renders the allowed values of this option.
  pub fn allowed(&self) -> String {
    match self.kind {
      OptionKind::Bool => "true|false".to_string(),
      OptionKind::Str => "<string>".to_string(),
      OptionKind::Choice(choices) => choices.join("|"),
      OptionKind::ChoiceMap(choices) => {
        choices.iter().map(|(key, _)| *key).collect::<Vec<_>>().join("|")
      }
    }
  }

  /// Renders a help line for this option: name, help text, allowed values, and default.
  pub fn help_line(&self) -> String {
    format!("  {}: {} ({}; default: {})", self.name, self.help, self.allowed(), self.default)
  }

  fn invalid(&self, raw: &str) -> ConfigError {
    ConfigError::InvalidValue {
      option: self.name,
      value: raw.to_string(),
      allowed: self.allowed(),
    }
  }
}

/// Registry of the configuration options an engine recognizes. Consumed by the external CLI component to surface
/// flags and render help.
pub struct OptionRegistry {
  defs: Vec<OptionDef>,
}

pub const BUILD_MODE_CHOICES: &[(&str, &str)] = &[
  ("keep_dir", "keep_dir"),
  ("build_dir", "build_dir"),
  ("build_dir_linearized", "build_dir_linearized"),
];

pub const DISP_MODE_CHOICES: &[&str] = &["all", "summary"];

impl OptionRegistry {
  /// Creates the registry of built-in engine options.
  pub fn builtin() -> Self {
    Self {
      defs: vec![
        OptionDef {
          name: "build_mode",
          help: "where object files are placed",
          default: "keep_dir",
          kind: OptionKind::ChoiceMap(BUILD_MODE_CHOICES),
        },
        OptionDef {
          name: "build_dir",
          help: "output directory for build state and object files",
          default: "build",
          kind: OptionKind::Str,
        },
        OptionDef {
          name: "disp_mode",
          help: "print full commands or a summary label per target",
          default: "summary",
          kind: OptionKind::Choice(DISP_MODE_CHOICES),
        },
        OptionDef {
          name: "clean",
          help: "remove target outputs instead of building them",
          default: "false",
          kind: OptionKind::Bool,
        },
        OptionDef {
          name: "force",
          help: "rebuild all targets regardless of staleness",
          default: "false",
          kind: OptionKind::Bool,
        },
      ],
    }
  }

  #[inline]
  pub fn iter(&self) -> impl Iterator<Item=&OptionDef> { self.defs.iter() }

  #[inline]
  pub fn find(&self, name: &str) -> Option<&OptionDef> {
    self.defs.iter().find(|def| def.name == name)
  }

  /// Renders help lines for all options.
  pub fn help(&self) -> String {
    let mut help = String::new();
    for def in &self.defs {
      help.push_str(&def.help_line());
      help.push('\n');
    }
    help
  }

  /// Validates `raw` for the option registered under `name`.
  pub fn parse(&self, name: &str, raw: &str) -> Result<OptionValue, ConfigError> {
    let Some(def) = self.find(name) else {
      return Err(ConfigError::UnknownOption { name: name.to_string(), help: self.help() });
    };
    def.parse(raw)
  }
}
