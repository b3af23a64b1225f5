//! Setup orchestration.
//!
//! A setup pass selects the build mode, seeds the global configuration, and
//! runs `<target_dir>/<target>.lua` against the DSL. The finished
//! [`ConfigStore`] is returned by value; nothing about the pass survives it.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::info;

use crate::config::{BuildMode, ConfigSession, ConfigStore};
use crate::consts::SCRIPT_EXT;
use crate::error::Result;
use crate::lua::{globals, runtime};
use crate::platform::paths;

/// Options for a setup pass.
#[derive(Debug, Clone)]
pub struct SetupOptions {
  /// Directory holding `<target>.lua` definitions. Also searched by
  /// `require` inside target scripts.
  pub target_dir: PathBuf,
}

impl Default for SetupOptions {
  fn default() -> Self {
    Self {
      target_dir: paths::target_dir(),
    }
  }
}

/// Path of the definition script for `target`.
pub fn target_script(target: &str, options: &SetupOptions) -> PathBuf {
  options.target_dir.join(format!("{target}.{SCRIPT_EXT}"))
}

/// Run the setup pass for `target` in `mode` and hand back its registry.
///
/// `mode` is validated before anything is registered. The active scope is
/// global when the script starts; a script that leaves a target scope open
/// fails with [`ConfigError::ScopeNotReleased`](crate::error::ConfigError::ScopeNotReleased).
pub fn setup(target: &str, mode: &str, options: &SetupOptions) -> Result<ConfigStore> {
  let mode: BuildMode = mode.parse()?;
  let script = target_script(target, options);
  info!(name = %target, %mode, script = %script.display(), "starting setup");

  let session = Rc::new(RefCell::new(ConfigSession::new(mode)?));
  {
    let lua = runtime::create_runtime(&[options.target_dir.as_path()])?;
    globals::register_dsl(&lua, &lua.globals(), Rc::clone(&session))?;
    let namespace = runtime::new_namespace(&lua)?;
    runtime::run_script(&lua, &script, &namespace)?;

    session.borrow_mut().ensure_released()?;
  }

  let store = session.borrow_mut().finish()?;
  info!(name = %target, targets = store.len(), "setup complete");
  Ok(store)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{ConfigValue, Location, TargetKind};
  use crate::consts::keys;
  use crate::error::ConfigError;
  use tempfile::TempDir;

  fn options_with(scripts: &[(&str, &str)]) -> (TempDir, SetupOptions) {
    let temp = TempDir::new().unwrap();
    for (name, content) in scripts {
      std::fs::write(temp.path().join(format!("{name}.lua")), content).unwrap();
    }
    let options = SetupOptions {
      target_dir: temp.path().to_path_buf(),
    };
    (temp, options)
  }

  const DEMO: &str = r#"
    Toolchain("x-tc")
    Architecture("armv7", { archdir = "arm" })
    Loader("null", "armv7")

    local kernel = AddTarget("kernel", { type = ProgType.KERNEL })
    kernel:scope(function()
      Config("INVARIANTS", "CONFIG_YES")
    end)
  "#;

  #[test]
  fn demo_scenario() {
    let (_temp, options) = options_with(&[("demo", DEMO)]);
    let store = setup("demo", "development", &options).unwrap();

    let global = store.global().unwrap();
    for (key, expected) in [
      (keys::TOOLCHAIN, "x-tc"),
      (keys::ARCH, "armv7"),
      (keys::ARCHDIR, "arm"),
      (keys::LOADER, "null"),
      (keys::LOADER_ARCH, "armv7"),
      (keys::MODE, "DEVELOPMENT"),
    ] {
      assert_eq!(global.get_str(key).unwrap(), expected, "{key}");
    }

    let kernel = store.target("kernel").unwrap();
    assert_eq!(kernel.kind, TargetKind::Kernel);
    assert_eq!(kernel.location, Location::Root);
    assert_eq!(kernel.get("INVARIANTS").unwrap(), &ConfigValue::from("CONFIG_YES"));
    assert!(global.get("INVARIANTS").is_err());
  }

  #[test]
  fn invalid_mode_fails_before_reading_script() {
    let (_temp, options) = options_with(&[]);
    let err = setup("x", "staging", &options).unwrap_err();
    assert!(matches!(err, ConfigError::InvalidBuildMode(ref m) if m == "staging"));
  }

  #[test]
  fn missing_target_script() {
    let (_temp, options) = options_with(&[]);
    let err = setup("missing", "release", &options).unwrap_err();
    assert!(matches!(err, ConfigError::ScriptNotFound(ref p) if p.ends_with("missing.lua")));
  }

  #[test]
  fn release_mode_is_exported() {
    let (_temp, options) = options_with(&[("t", "assert(MODE == 'release')")]);
    let store = setup("t", "release", &options).unwrap();
    let handle = store.global_handle().unwrap();
    assert_eq!(store.get(handle, keys::MODE).unwrap().as_str(), Some("RELEASE"));
    assert!(store.is_exported(handle, keys::MODE));
  }

  #[test]
  fn unreleased_scope_fails_the_pass() {
    let script = r#"
      local kernel = AddTarget("kernel", ProgType.KERNEL)
      leaked = kernel:enter()
    "#;
    let (_temp, options) = options_with(&[("leak", script)]);
    let err = setup("leak", "development", &options).unwrap_err();
    assert!(matches!(err, ConfigError::ScopeNotReleased(ref name) if name == "kernel"));
  }

  #[test]
  fn collected_token_still_fails_the_pass() {
    let script = r#"
      local kernel = AddTarget("kernel", ProgType.KERNEL)
      kernel:enter()
      collectgarbage()
      Config("X", "1")
    "#;
    let (_temp, options) = options_with(&[("gc", script)]);
    let err = setup("gc", "development", &options).unwrap_err();
    assert!(matches!(err, ConfigError::ScopeNotReleased(ref name) if name == "kernel"));
  }

  #[test]
  fn dsl_errors_keep_their_kind() {
    let script = r#"
      AddTarget("init", ProgType.EXE)
      AddTarget("init", ProgType.EXE)
    "#;
    let (_temp, options) = options_with(&[("dup", script)]);
    let err = setup("dup", "development", &options).unwrap_err();
    assert!(matches!(err, ConfigError::DuplicateTarget(ref name) if name == "init"));
  }

  #[test]
  fn target_scripts_can_require_siblings() {
    let common = r#"
      return function()
        Toolchain("i686-elf")
        Architecture("i686", "i386")
      end
    "#;
    let script = r#"
      require("common")()
      Loader("grub")
    "#;
    let (_temp, options) = options_with(&[("common", common), ("i686-pc", script)]);
    let store = setup("i686-pc", "development", &options).unwrap();
    let global = store.global().unwrap();
    assert_eq!(global.get_str(keys::ARCHDIR).unwrap(), "i386");
    assert_eq!(global.get_str(keys::LOADER_ARCH).unwrap(), "i686");
  }
}
