//! Error types for configuration passes.
//!
//! Every variant is fatal to the setup pass that produced it. DSL functions
//! raise these through Lua as external errors; [`ConfigError::from_script`]
//! digs them back out so callers see the original kind rather than a Lua
//! callback wrapper.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use mlua::prelude::*;

/// Result alias used throughout the library.
pub type Result<T, E = ConfigError> = std::result::Result<T, E>;

/// Errors raised while building or consuming a configuration registry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
  /// A target with this name is already registered.
  #[error("duplicate target '{0}'")]
  DuplicateTarget(String),

  /// The key was never set on the named configuration.
  #[error("undefined key '{key}' in configuration '{target}'")]
  UndefinedKey { target: String, key: String },

  /// A key holds a value of the wrong shape.
  #[error("key '{key}' in configuration '{target}' must be {expected}")]
  InvalidValue {
    target: String,
    key: String,
    expected: &'static str,
  },

  /// A scope was entered while another non-global scope was active.
  #[error("cannot enter scope '{requested}' while scope '{active}' is active")]
  NestedScope { active: String, requested: String },

  /// A global-only operation ran inside a target scope.
  #[error("{operation} is only valid in the global scope (active scope is '{active}')")]
  ScopeViolation { operation: String, active: String },

  /// A script finished while still inside a target scope.
  #[error("scope '{0}' was still active when the script finished")]
  ScopeNotReleased(String),

  #[error("script not found: {}", .0.display())]
  ScriptNotFound(PathBuf),

  #[error("loader '{loader}' not found (looked for {})", .path.display())]
  LoaderNotFound { loader: String, path: PathBuf },

  /// The loader plugin ran but did not produce a usable `Loader`.
  #[error("loader plugin {} is invalid: {message}", .path.display())]
  PluginContract { path: PathBuf, message: String },

  #[error("invalid build mode '{0}' (expected 'development' or 'release')")]
  InvalidBuildMode(String),

  #[error("unknown target '{0}'")]
  UnknownTarget(String),

  #[error("invalid {what} '{value}'")]
  InvalidName { what: &'static str, value: String },

  /// A Lua error that did not originate from a DSL call.
  #[error("error in {}: {source}", .path.display())]
  Script {
    path: PathBuf,
    #[source]
    source: LuaError,
  },

  #[error("lua error: {0}")]
  Lua(#[from] LuaError),

  #[error("cannot access {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: Arc<std::io::Error>,
  },
}

impl ConfigError {
  pub fn io(path: &Path, source: std::io::Error) -> Self {
    Self::Io {
      path: path.to_path_buf(),
      source: Arc::new(source),
    }
  }

  /// Convert an error that escaped a script back into a `ConfigError`.
  ///
  /// If a DSL call inside the script raised a `ConfigError`, that error is
  /// returned as-is. Anything else is reported against `path`.
  pub fn from_script(path: &Path, err: LuaError) -> Self {
    match find_config_error(&err) {
      Some(inner) => inner.clone(),
      None => Self::Script {
        path: path.to_path_buf(),
        source: err,
      },
    }
  }
}

impl From<ConfigError> for LuaError {
  fn from(err: ConfigError) -> Self {
    LuaError::external(err)
  }
}

fn find_config_error(err: &LuaError) -> Option<&ConfigError> {
  match err {
    LuaError::ExternalError(inner) => inner.downcast_ref::<ConfigError>(),
    LuaError::CallbackError { cause, .. } => find_config_error(cause),
    LuaError::WithContext { cause, .. } => find_config_error(cause),
    _ => None,
  }
}
