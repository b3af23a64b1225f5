//! Script execution.
//!
//! Target definitions and loader plugins are Lua files executed against a
//! namespace table that falls back to the Lua globals, where the standard
//! library and the DSL surface live. Globals a script assigns stay in its
//! namespace, which is how the resolver finds the `Loader` a plugin defines.

use std::path::Path;

use mlua::prelude::*;
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

/// Create a Lua state whose `require` also searches `dirs`.
pub fn create_runtime(dirs: &[&Path]) -> LuaResult<Lua> {
  let lua = Lua::new();
  if dirs.is_empty() {
    return Ok(lua);
  }

  let package: LuaTable = lua.globals().get("package")?;
  let current_path: String = package.get("path")?;
  let extra: Vec<String> = dirs
    .iter()
    .map(|dir| {
      let dir = dir.to_string_lossy().replace('\\', "/");
      format!("{dir}/?.lua;{dir}/?/init.lua")
    })
    .collect();
  let new_path = format!("{};{}", extra.join(";"), current_path);
  package.set("path", new_path.as_str())?;

  debug!(package_path = %new_path, "set package.path");
  Ok(lua)
}

/// Create an empty namespace that inherits from `_G`.
///
/// Reads fall through to the globals; writes stay in the namespace.
pub fn new_namespace(lua: &Lua) -> LuaResult<LuaTable> {
  let env = lua.create_table()?;
  let mt = lua.create_table()?;
  mt.set("__index", lua.globals())?;
  env.set_metatable(Some(mt))?;
  Ok(env)
}

/// Execute the script at `path` with `namespace` as its environment.
///
/// Returns whatever the chunk returns. Errors raised by DSL calls inside the
/// script come back as the original [`ConfigError`]; writes made before the
/// failure are not rolled back.
pub fn run_script(lua: &Lua, path: &Path, namespace: &LuaTable) -> Result<LuaValue> {
  if !path.is_file() {
    return Err(ConfigError::ScriptNotFound(path.to_path_buf()));
  }

  let content = std::fs::read_to_string(path).map_err(|e| ConfigError::io(path, e))?;
  let display_path = dunce::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
  info!(path = %display_path.display(), "executing script");

  lua
    .load(&content)
    .set_name(format!("@{}", display_path.display()))
    .set_environment(namespace.clone())
    .eval::<LuaValue>()
    .map_err(|e| ConfigError::from_script(path, e))
}
