//! The configuration registry.
//!
//! A [`ConfigStore`] maps target names to [`Configuration`]s in registration
//! order. Entries are append/overwrite-only: there is no way to remove a key
//! or a target once written.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Serialize, Serializer};
use tracing::debug;

use super::types::{ConfigEntry, ConfigValue, Location, TargetKind};
use crate::consts::GLOBAL_TARGET;
use crate::error::{ConfigError, Result};

/// Opaque reference to a configuration inside a [`ConfigStore`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigHandle(usize);

impl fmt::Display for ConfigHandle {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "#{}", self.0)
  }
}

/// Key/value settings for one target.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Configuration {
  pub name: String,
  pub kind: TargetKind,
  pub location: Location,
  entries: BTreeMap<String, ConfigEntry>,
}

impl Configuration {
  pub fn new(name: impl Into<String>, kind: TargetKind, location: Location) -> Self {
    Self {
      name: name.into(),
      kind,
      location,
      entries: BTreeMap::new(),
    }
  }

  /// Overwrite `key`. Last write wins; values are never merged.
  pub fn set(&mut self, key: impl Into<String>, value: ConfigValue, export: bool) {
    let key = key.into();
    debug!(config = %self.name, key = %key, value = %value, export, "config");
    self.entries.insert(key, ConfigEntry { value, export });
  }

  pub fn get(&self, key: &str) -> Result<&ConfigValue> {
    self
      .entries
      .get(key)
      .map(|entry| &entry.value)
      .ok_or_else(|| ConfigError::UndefinedKey {
        target: self.name.clone(),
        key: key.to_string(),
      })
  }

  /// Like [`Configuration::get`] but requires a string value.
  pub fn get_str(&self, key: &str) -> Result<&str> {
    self.get(key)?.as_str().ok_or_else(|| ConfigError::InvalidValue {
      target: self.name.clone(),
      key: key.to_string(),
      expected: "a string",
    })
  }

  pub fn contains(&self, key: &str) -> bool {
    self.entries.contains_key(key)
  }

  pub fn is_exported(&self, key: &str) -> bool {
    self.entries.get(key).is_some_and(|entry| entry.export)
  }

  pub fn entries(&self) -> impl Iterator<Item = (&str, &ConfigEntry)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v))
  }

  pub fn exported(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
    self
      .entries
      .iter()
      .filter(|(_, entry)| entry.export)
      .map(|(k, entry)| (k.as_str(), &entry.value))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

/// All configurations produced by one setup pass, keyed by target name.
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
  configs: Vec<Configuration>,
  index: HashMap<String, ConfigHandle>,
}

impl ConfigStore {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a new, empty configuration.
  ///
  /// Fails with [`ConfigError::DuplicateTarget`] if `name` is taken,
  /// whatever the kind or location.
  pub fn register_target(&mut self, name: &str, kind: TargetKind, location: Location) -> Result<ConfigHandle> {
    if self.index.contains_key(name) {
      return Err(ConfigError::DuplicateTarget(name.to_string()));
    }

    let handle = ConfigHandle(self.configs.len());
    self.configs.push(Configuration::new(name, kind, location));
    self.index.insert(name.to_string(), handle);
    debug!(name, %kind, %location, %handle, "registered target");
    Ok(handle)
  }

  pub fn set(&mut self, handle: ConfigHandle, key: &str, value: ConfigValue, export: bool) {
    self.config_mut(handle).set(key, value, export);
  }

  /// Read `key` from exactly this configuration. There is no fallback to
  /// the global configuration.
  pub fn get(&self, handle: ConfigHandle, key: &str) -> Result<&ConfigValue> {
    self.config(handle).get(key)
  }

  pub fn is_exported(&self, handle: ConfigHandle, key: &str) -> bool {
    self.config(handle).is_exported(key)
  }

  pub fn exported(&self, handle: ConfigHandle) -> impl Iterator<Item = (&str, &ConfigValue)> {
    self.config(handle).exported()
  }

  /// Handles are only minted by [`ConfigStore::register_target`], so an
  /// out-of-range handle means it came from a different store.
  pub fn config(&self, handle: ConfigHandle) -> &Configuration {
    &self.configs[handle.0]
  }

  fn config_mut(&mut self, handle: ConfigHandle) -> &mut Configuration {
    &mut self.configs[handle.0]
  }

  pub fn handle(&self, name: &str) -> Option<ConfigHandle> {
    self.index.get(name).copied()
  }

  pub fn target(&self, name: &str) -> Option<&Configuration> {
    self.handle(name).map(|h| self.config(h))
  }

  pub fn global_handle(&self) -> Option<ConfigHandle> {
    self.handle(GLOBAL_TARGET)
  }

  /// The global configuration.
  pub fn global(&self) -> Result<&Configuration> {
    self
      .target(GLOBAL_TARGET)
      .ok_or_else(|| ConfigError::UnknownTarget(GLOBAL_TARGET.to_string()))
  }

  /// Configurations in registration order.
  pub fn targets(&self) -> impl Iterator<Item = &Configuration> {
    self.configs.iter()
  }

  pub fn len(&self) -> usize {
    self.configs.len()
  }

  pub fn is_empty(&self) -> bool {
    self.configs.is_empty()
  }
}

impl Serialize for ConfigStore {
  fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(self.configs.iter())
  }
}
