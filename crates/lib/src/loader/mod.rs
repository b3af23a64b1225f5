//! Boot loader resolution.
//!
//! Which loader builds the image is not known until a setup pass has run:
//! the target script names it with `Loader(name [, arch])`. [`resolve_loader`]
//! turns that name into a [`Loader`], either a native implementation from the
//! [`LoaderRegistry`] or a Lua plugin at `<loader_dir>/<name>.lua`.

pub mod grub;
pub mod helper;
pub mod null;
pub mod script;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::ConfigStore;
use crate::consts::{SCRIPT_EXT, keys};
use crate::error::{ConfigError, Result};
use crate::platform::paths;

pub use grub::GrubLoader;
pub use helper::{BuildHelper, BuildPlan, BuildStep, PlanHelper, TargetArtifact};
pub use null::NullLoader;
pub use script::ScriptLoader;

/// A resolved boot loader.
pub trait Loader {
  fn name(&self) -> &str;

  fn arch(&self) -> &str;

  /// Directory, relative to the image root, the kernel is installed into.
  fn kern_path(&self) -> PathBuf;

  /// Describe the boot image through `helper`.
  fn build(&self, helper: &mut dyn BuildHelper) -> Result<()>;
}

/// What a loader is constructed from.
pub struct LoaderInit<'a> {
  pub helper: &'a dyn BuildHelper,
  pub arch: &'a str,
  /// Directory holding loader plugins and support files such as `grub.cfg`.
  pub loader_dir: &'a Path,
}

pub type LoaderFactory = fn(&LoaderInit<'_>) -> Result<Box<dyn Loader>>;

/// Native loaders by name.
#[derive(Clone, Default)]
pub struct LoaderRegistry {
  factories: BTreeMap<String, LoaderFactory>,
}

impl LoaderRegistry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Registry holding `grub` and `null`.
  pub fn with_builtins() -> Self {
    let mut registry = Self::new();
    registry.register(grub::NAME, GrubLoader::create);
    registry.register(null::NAME, NullLoader::create);
    registry
  }

  /// Register `factory` under `name`, replacing any previous entry.
  pub fn register(&mut self, name: impl Into<String>, factory: LoaderFactory) {
    self.factories.insert(name.into(), factory);
  }

  pub fn get(&self, name: &str) -> Option<LoaderFactory> {
    self.factories.get(name).copied()
  }

  pub fn names(&self) -> impl Iterator<Item = &str> {
    self.factories.keys().map(String::as_str)
  }
}

impl std::fmt::Debug for LoaderRegistry {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_list().entries(self.names()).finish()
  }
}

#[derive(Debug, Clone)]
pub struct ResolveOptions {
  pub loader_dir: PathBuf,
  pub registry: LoaderRegistry,
}

impl Default for ResolveOptions {
  fn default() -> Self {
    Self {
      loader_dir: paths::loader_dir(),
      registry: LoaderRegistry::with_builtins(),
    }
  }
}

/// Path of the plugin script for loader `name`.
pub fn plugin_path(name: &str, loader_dir: &Path) -> PathBuf {
  loader_dir.join(format!("{name}.{SCRIPT_EXT}"))
}

/// Resolve the loader named by the global `LOADER` key.
///
/// Native loaders take precedence over plugins of the same name. Nothing is
/// returned unless the loader was fully constructed.
pub fn resolve_loader(
  store: &ConfigStore,
  helper: &dyn BuildHelper,
  options: &ResolveOptions,
) -> Result<Box<dyn Loader>> {
  let global = store.global()?;
  let name = global.get_str(keys::LOADER)?;
  let arch = global.get_str(keys::LOADER_ARCH)?;

  let init = LoaderInit {
    helper,
    arch,
    loader_dir: &options.loader_dir,
  };

  let loader = match options.registry.get(name) {
    Some(factory) => factory(&init)?,
    None => {
      let path = plugin_path(name, &options.loader_dir);
      if !path.is_file() {
        return Err(ConfigError::LoaderNotFound {
          loader: name.to_string(),
          path,
        });
      }
      Box::new(ScriptLoader::load(name, &path, &init)?)
    }
  };

  info!(
    loader = loader.name(),
    arch = loader.arch(),
    kern_path = %loader.kern_path().display(),
    "resolved loader"
  );
  Ok(loader)
}
