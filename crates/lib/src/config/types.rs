//! Value types of the configuration model.

use std::fmt;
use std::str::FromStr;

use mlua::prelude::*;
use mlua::{FromLua, IntoLua};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// What a target produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
  None,
  Kernel,
  Service,
  Exe,
  KernMod,
}

impl TargetKind {
  pub const ALL: [TargetKind; 5] = [Self::None, Self::Kernel, Self::Service, Self::Exe, Self::KernMod];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Kernel => "kernel",
      Self::Service => "service",
      Self::Exe => "exe",
      Self::KernMod => "kernmod",
    }
  }
}

impl fmt::Display for TargetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for TargetKind {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|kind| kind.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| ConfigError::InvalidName {
        what: "target kind",
        value: s.to_string(),
      })
  }
}

/// Where a built artifact lands inside the image tree.
///
/// The tag carries no path; use [`Location::path`] for the directory name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
  None,
  Boot,
  Initrd,
  Root,
}

impl Location {
  pub const ALL: [Location; 4] = [Self::None, Self::Boot, Self::Initrd, Self::Root];

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::None => "none",
      Self::Boot => "boot",
      Self::Initrd => "initrd",
      Self::Root => "root",
    }
  }

  /// Directory name inside the image tree, `None` for [`Location::None`].
  pub fn path(&self) -> Option<&'static str> {
    match self {
      Self::None => None,
      Self::Boot => Some("boot"),
      Self::Initrd => Some("initrd"),
      Self::Root => Some("root"),
    }
  }
}

impl fmt::Display for Location {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for Location {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    Self::ALL
      .into_iter()
      .find(|loc| loc.as_str().eq_ignore_ascii_case(s))
      .ok_or_else(|| ConfigError::InvalidName {
        what: "location",
        value: s.to_string(),
      })
  }
}

/// Build flavour selected once per setup pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuildMode {
  Development,
  Release,
}

impl BuildMode {
  /// Value written to the global `MODE` key.
  pub fn config_value(&self) -> &'static str {
    match self {
      Self::Development => "DEVELOPMENT",
      Self::Release => "RELEASE",
    }
  }

  pub fn as_str(&self) -> &'static str {
    match self {
      Self::Development => "development",
      Self::Release => "release",
    }
  }
}

impl fmt::Display for BuildMode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}", self.as_str())
  }
}

impl FromStr for BuildMode {
  type Err = ConfigError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "development" => Ok(Self::Development),
      "release" => Ok(Self::Release),
      other => Err(ConfigError::InvalidBuildMode(other.to_string())),
    }
  }
}

/// A configuration value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConfigValue {
  Bool(bool),
  Integer(i64),
  Number(f64),
  String(String),
  List(Vec<String>),
}

impl ConfigValue {
  pub fn as_str(&self) -> Option<&str> {
    match self {
      Self::String(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_list(&self) -> Option<&[String]> {
    match self {
      Self::List(items) => Some(items),
      _ => None,
    }
  }
}

impl fmt::Display for ConfigValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Self::Bool(b) => write!(f, "{}", b),
      Self::Integer(n) => write!(f, "{}", n),
      Self::Number(n) => write!(f, "{}", n),
      Self::String(s) => write!(f, "{}", s),
      Self::List(items) => write!(f, "[{}]", items.join(", ")),
    }
  }
}

impl From<&str> for ConfigValue {
  fn from(value: &str) -> Self {
    Self::String(value.to_string())
  }
}

impl From<String> for ConfigValue {
  fn from(value: String) -> Self {
    Self::String(value)
  }
}

impl From<bool> for ConfigValue {
  fn from(value: bool) -> Self {
    Self::Bool(value)
  }
}

impl From<i64> for ConfigValue {
  fn from(value: i64) -> Self {
    Self::Integer(value)
  }
}

impl From<Vec<String>> for ConfigValue {
  fn from(value: Vec<String>) -> Self {
    Self::List(value)
  }
}

impl From<&[&str]> for ConfigValue {
  fn from(value: &[&str]) -> Self {
    Self::List(value.iter().map(|s| s.to_string()).collect())
  }
}

impl FromLua for ConfigValue {
  fn from_lua(value: LuaValue, _lua: &Lua) -> LuaResult<Self> {
    match value {
      LuaValue::Boolean(b) => Ok(Self::Bool(b)),
      LuaValue::Integer(n) => Ok(Self::Integer(n)),
      LuaValue::Number(n) => Ok(Self::Number(n)),
      LuaValue::String(s) => Ok(Self::String(s.to_str()?.to_string())),
      LuaValue::Table(t) => {
        let mut items = Vec::new();
        for item in t.sequence_values::<LuaValue>() {
          match item? {
            LuaValue::String(s) => items.push(s.to_str()?.to_string()),
            other => {
              return Err(LuaError::external(format!(
                "config lists may only contain strings, got {}",
                other.type_name()
              )));
            }
          }
        }
        Ok(Self::List(items))
      }
      other => Err(LuaError::external(format!(
        "unsupported config value type: {}",
        other.type_name()
      ))),
    }
  }
}

impl IntoLua for ConfigValue {
  fn into_lua(self, lua: &Lua) -> LuaResult<LuaValue> {
    match self {
      Self::Bool(b) => Ok(LuaValue::Boolean(b)),
      Self::Integer(n) => Ok(LuaValue::Integer(n)),
      Self::Number(n) => Ok(LuaValue::Number(n)),
      Self::String(s) => s.into_lua(lua),
      Self::List(items) => Ok(LuaValue::Table(lua.create_sequence_from(items)?)),
    }
  }
}

impl FromLua for TargetKind {
  fn from_lua(value: LuaValue, lua: &Lua) -> LuaResult<Self> {
    let name = String::from_lua(value, lua)?;
    Ok(name.parse()?)
  }
}

impl FromLua for Location {
  fn from_lua(value: LuaValue, lua: &Lua) -> LuaResult<Self> {
    let name = String::from_lua(value, lua)?;
    Ok(name.parse()?)
  }
}

/// One key's value plus whether it is visible to dependent targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigEntry {
  pub value: ConfigValue,
  #[serde(default)]
  pub export: bool,
}
