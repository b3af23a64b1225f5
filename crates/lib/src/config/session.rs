//! One configuration pass: the store plus its scope cursor.

use tracing::{debug, info};

use super::scope::{ScopeCursor, ScopeGuard};
use super::store::{ConfigHandle, ConfigStore};
use super::types::{BuildMode, ConfigValue, Location, TargetKind};
use crate::consts::{GLOBAL_TARGET, keys};
use crate::error::{ConfigError, Result};

/// State of a single setup pass.
///
/// Owns the [`ConfigStore`] and the [`ScopeCursor`] that decides which
/// configuration generic writes land in. The DSL functions exposed to target
/// scripts are thin wrappers over the methods here.
#[derive(Debug)]
pub struct ConfigSession {
  store: ConfigStore,
  cursor: ScopeCursor,
  mode: BuildMode,
}

impl ConfigSession {
  /// Create the global configuration and record the build mode in it.
  pub fn new(mode: BuildMode) -> Result<Self> {
    let mut store = ConfigStore::new();
    let global = store.register_target(GLOBAL_TARGET, TargetKind::None, Location::None)?;
    let mut session = Self {
      store,
      cursor: ScopeCursor::new(global),
      mode,
    };
    session.select_mode(mode)?;
    Ok(session)
  }

  pub fn store(&self) -> &ConfigStore {
    &self.store
  }

  pub fn cursor(&self) -> &ScopeCursor {
    &self.cursor
  }

  pub fn mode(&self) -> BuildMode {
    self.mode
  }

  pub fn global(&self) -> ConfigHandle {
    self.cursor.global()
  }

  pub fn active_name(&self) -> &str {
    &self.store.config(self.cursor.active()).name
  }

  pub fn register_target(&mut self, name: &str, kind: TargetKind, location: Location) -> Result<ConfigHandle> {
    self.store.register_target(name, kind, location)
  }

  /// Write directly into `handle`, ignoring the cursor.
  pub fn set(&mut self, handle: ConfigHandle, key: &str, value: ConfigValue, export: bool) {
    self.store.set(handle, key, value, export);
  }

  pub fn get(&self, handle: ConfigHandle, key: &str) -> Result<&ConfigValue> {
    self.store.get(handle, key)
  }

  /// Write into whichever configuration is active.
  pub fn write_active(&mut self, key: &str, value: ConfigValue, export: bool) {
    let active = self.cursor.active();
    self.store.set(active, key, value, export);
  }

  pub fn get_active(&self, key: &str) -> Result<&ConfigValue> {
    self.store.get(self.cursor.active(), key)
  }

  pub fn require_global(&self, operation: &str) -> Result<()> {
    self.cursor.require_global(&self.store, operation)
  }

  /// Enter `handle` until the returned guard is dropped.
  pub fn enter(&mut self, handle: ConfigHandle) -> Result<ScopeGuard<'_>> {
    self.begin_scope(handle)?;
    Ok(ScopeGuard::new(self))
  }

  /// Run `f` with `handle` active, restoring global however `f` exits.
  pub fn with_scope<T>(&mut self, handle: ConfigHandle, f: impl FnOnce(&mut ConfigSession) -> Result<T>) -> Result<T> {
    let mut guard = self.enter(handle)?;
    f(&mut *guard)
  }

  pub(crate) fn begin_scope(&mut self, handle: ConfigHandle) -> Result<()> {
    self.cursor.enter(&self.store, handle)
  }

  pub(crate) fn release_scope(&mut self) {
    self.cursor.release();
  }

  /// Record the build mode. Global scope only.
  pub fn select_mode(&mut self, mode: BuildMode) -> Result<()> {
    self.require_global("build mode selection")?;
    self.mode = mode;
    self.write_active(keys::MODE, mode.config_value().into(), true);
    info!(%mode, "build mode selected");
    Ok(())
  }

  /// `Toolchain(prefix)`: sets `TOOLCHAIN`. Global scope only.
  pub fn toolchain(&mut self, prefix: &str) -> Result<()> {
    self.require_global("Toolchain")?;
    self.write_active(keys::TOOLCHAIN, prefix.into(), false);
    Ok(())
  }

  /// `Architecture(arch, archdir)`: sets `ARCH` (exported) and `ARCHDIR`,
  /// which defaults to `arch`. Global scope only.
  pub fn architecture(&mut self, arch: &str, archdir: Option<&str>) -> Result<()> {
    self.require_global("Architecture")?;
    let archdir = archdir.unwrap_or(arch);
    self.write_active(keys::ARCH, arch.into(), true);
    self.write_active(keys::ARCHDIR, archdir.into(), false);
    Ok(())
  }

  /// `Loader(name, arch)`: sets `LOADER` and `LOADER_ARCH`. The loader
  /// architecture defaults to the global `ARCH`. Global scope only.
  pub fn loader(&mut self, name: &str, arch: Option<&str>) -> Result<()> {
    self.require_global("Loader")?;
    let arch = match arch {
      Some(arch) => arch.to_string(),
      None => self.store.config(self.global()).get_str(keys::ARCH)?.to_string(),
    };
    self.write_active(keys::LOADER, name.into(), false);
    self.write_active(keys::LOADER_ARCH, arch.into(), false);
    Ok(())
  }

  /// Check that the cursor is back on global.
  ///
  /// On failure the cursor is forced back to global before the error is
  /// returned.
  pub fn ensure_released(&mut self) -> Result<()> {
    if self.cursor.is_global() {
      return Ok(());
    }
    let name = self.active_name().to_string();
    self.release_scope();
    Err(ConfigError::ScopeNotReleased(name))
  }

  /// Hand the finished store off. Fails if a scope is still entered.
  pub fn finish(&mut self) -> Result<ConfigStore> {
    self.ensure_released()?;
    let store = std::mem::take(&mut self.store);
    debug!(targets = store.len(), "configuration pass finished");
    Ok(store)
  }
}
