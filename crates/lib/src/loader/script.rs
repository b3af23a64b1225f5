//! Loaders implemented as Lua plugins.
//!
//! A plugin is `<loader_dir>/<name>.lua`. It runs in its own Lua state with a
//! `config` table in scope and must leave a `Loader` table behind (as a
//! global or as the chunk's return value):
//!
//! ```lua
//! Loader = {}
//!
//! function Loader.new(arch)
//!   return setmetatable({ arch = arch }, { __index = Loader })
//! end
//!
//! function Loader:kern_path()
//!   return config.Location.path(config.Location.BOOT)
//! end
//!
//! function Loader:build(helper)
//!   local kernel = helper.get_target("kernel")
//!   local boot = helper.image_dir(config.Location.BOOT)
//!   helper.command(helper.image_root_dir() .. "/boot.img", { kernel.install_path }, "mkimg $TARGET " .. boot)
//! end
//! ```
//!
//! `new` is optional; without it the table itself is the instance and gets
//! its `arch` field set.

use std::cell::RefCell;
use std::path::{Path, PathBuf};

use mlua::prelude::*;
use tracing::debug;

use super::{BuildHelper, Loader, LoaderInit};
use crate::config::{ConfigValue, Location};
use crate::error::{ConfigError, Result};
use crate::lua::{globals, runtime};

pub struct ScriptLoader {
  name: String,
  arch: String,
  path: PathBuf,
  kern_path: PathBuf,
  lua: Lua,
  instance: LuaTable,
}

impl ScriptLoader {
  /// Run the plugin at `path` and construct its loader for `init.arch`.
  pub fn load(name: &str, path: &Path, init: &LoaderInit<'_>) -> Result<Self> {
    let lua = runtime::create_runtime(&[init.loader_dir])?;
    let namespace = runtime::new_namespace(&lua)?;
    let facility = globals::create_config_facility(&lua, init.helper.global_conf())?;
    namespace.set("config", facility)?;

    let returned = runtime::run_script(&lua, path, &namespace)?;
    let class = match namespace.raw_get::<LuaValue>("Loader")? {
      LuaValue::Table(table) => table,
      _ => match returned {
        LuaValue::Table(table) => table,
        _ => return Err(contract(path, "plugin does not define a 'Loader' table")),
      },
    };

    require_methods(path, &class, "Loader")?;

    let instance = match class.get::<Option<LuaFunction>>("new")? {
      Some(new) => match new.call::<LuaValue>(init.arch) {
        Ok(LuaValue::Table(instance)) => instance,
        Ok(other) => {
          return Err(contract(
            path,
            format!("Loader.new must return a table, got {}", other.type_name()),
          ));
        }
        Err(e) => return Err(ConfigError::from_script(path, e)),
      },
      None => {
        class.set("arch", init.arch)?;
        class
      }
    };

    require_methods(path, &instance, "loader instance")?;

    let kern_path = instance
      .get::<LuaFunction>("kern_path")
      .and_then(|f| f.call::<LuaValue>(instance.clone()))
      .map_err(|e| ConfigError::from_script(path, e))?;
    let kern_path = match kern_path {
      LuaValue::String(s) => s.to_string_lossy(),
      other => {
        return Err(contract(
          path,
          format!("Loader:kern_path must return a string, got {}", other.type_name()),
        ));
      }
    };

    debug!(loader = name, path = %path.display(), kern_path = %kern_path, "loaded loader plugin");
    Ok(Self {
      name: name.to_string(),
      arch: init.arch.to_string(),
      path: path.to_path_buf(),
      kern_path: PathBuf::from(kern_path),
      lua,
      instance,
    })
  }

  pub fn path(&self) -> &Path {
    &self.path
  }
}

fn contract(path: &Path, message: impl Into<String>) -> ConfigError {
  ConfigError::PluginContract {
    path: path.to_path_buf(),
    message: message.into(),
  }
}

/// `kern_path` and `build` must both be callable on `table`.
fn require_methods(path: &Path, table: &LuaTable, what: &str) -> Result<()> {
  for method in ["kern_path", "build"] {
    if !matches!(table.get::<LuaValue>(method)?, LuaValue::Function(_)) {
      return Err(contract(path, format!("{what} is missing function '{method}'")));
    }
  }
  Ok(())
}

fn path_string(path: &Path) -> String {
  path.to_string_lossy().into_owned()
}

impl Loader for ScriptLoader {
  fn name(&self) -> &str {
    &self.name
  }

  fn arch(&self) -> &str {
    &self.arch
  }

  fn kern_path(&self) -> PathBuf {
    self.kern_path.clone()
  }

  /// Calls `Loader:build(helper)` with a helper table whose functions are
  /// only valid for the duration of the call.
  fn build(&self, helper: &mut dyn BuildHelper) -> Result<()> {
    let helper = RefCell::new(helper);
    let lua = &self.lua;

    lua
      .scope(|scope| {
        let api = lua.create_table()?;

        api.set(
          "global_conf",
          scope.create_function(|lua, ()| {
            let helper = helper.borrow();
            let table = lua.create_table()?;
            for (key, entry) in helper.global_conf().entries() {
              table.set(key, entry.value.clone())?;
            }
            Ok(table)
          })?,
        )?;

        api.set(
          "get_target",
          scope.create_function(|lua, name: String| {
            let Some(artifact) = helper.borrow().get_target(&name) else {
              return Ok(LuaValue::Nil);
            };
            let table = lua.create_table()?;
            table.set("name", artifact.name)?;
            table.set("kind", artifact.kind.as_str())?;
            table.set("location", artifact.location.as_str())?;
            table.set("install_path", path_string(&artifact.install_path))?;
            Ok(LuaValue::Table(table))
          })?,
        )?;

        api.set(
          "image_root_dir",
          scope.create_function(|_, ()| Ok(path_string(&helper.borrow().image_root_dir())))?,
        )?;

        api.set(
          "image_dir",
          scope.create_function(|_, location: Location| Ok(path_string(&helper.borrow().image_dir(location))))?,
        )?;

        api.set(
          "initrd",
          scope.create_function(|_, dir: String| {
            let output = helper.borrow_mut().initrd(Path::new(&dir))?;
            Ok(path_string(&output))
          })?,
        )?;

        api.set(
          "install",
          scope.create_function(|_, (dest_dir, source): (String, String)| {
            let dest = helper.borrow_mut().install(Path::new(&dest_dir), Path::new(&source))?;
            Ok(path_string(&dest))
          })?,
        )?;

        api.set(
          "command",
          scope.create_function(|_, (output, sources, command): (String, ConfigValue, String)| {
            let sources: Vec<PathBuf> = match sources {
              ConfigValue::List(items) => items.into_iter().map(PathBuf::from).collect(),
              ConfigValue::String(item) => vec![PathBuf::from(item)],
              other => {
                return Err(LuaError::external(format!(
                  "command sources must be a string or a list of strings, got {other}"
                )));
              }
            };
            let output = helper.borrow_mut().command(Path::new(&output), &sources, &command)?;
            Ok(path_string(&output))
          })?,
        )?;

        let build: LuaFunction = self.instance.get("build")?;
        build.call::<()>((self.instance.clone(), api))
      })
      .map_err(|e| ConfigError::from_script(&self.path, e))
  }
}
