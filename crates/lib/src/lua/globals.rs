//! The DSL surface exposed to scripts.
//!
//! Target scripts get:
//! - `Config(key, value [, export])` - write into the active configuration
//! - `GetConfig(key)` - read from the active configuration
//! - `AddTarget(name, { type = ..., location = ... })` - register a target
//! - `Toolchain(prefix)`, `Architecture(arch [, archdir])`, `Loader(name [, arch])`
//! - `ProgType`, `Location`, `CONFIG_YES`, `CONFIG_NO`, `MODE`
//!
//! Loader plugins get a read-only `config` table instead (see
//! [`create_config_facility`]).

use std::cell::RefCell;
use std::rc::Rc;

use mlua::prelude::*;

use super::target::LuaTarget;
use crate::config::{ConfigSession, ConfigValue, Configuration, Location, TargetKind};
use crate::consts::{CONFIG_NO, CONFIG_YES};

/// Register the target-script DSL into `table`.
///
/// Setup registers into the Lua globals so that modules pulled in with
/// `require` see the same surface as the target script itself.
pub fn register_dsl(lua: &Lua, table: &LuaTable, session: Rc<RefCell<ConfigSession>>) -> LuaResult<()> {
  register_constants(lua, table)?;
  table.set("MODE", session.borrow().mode().as_str())?;

  let s = session.clone();
  let config = lua.create_function(move |_, (key, value, export): (String, ConfigValue, Option<bool>)| {
    s.borrow_mut().write_active(&key, value, export.unwrap_or(false));
    Ok(())
  })?;
  table.set("Config", config)?;

  let s = session.clone();
  let get_config = lua.create_function(move |_, key: String| {
    let session = s.borrow();
    Ok(session.get_active(&key)?.clone())
  })?;
  table.set("GetConfig", get_config)?;

  let s = session.clone();
  let add_target = lua.create_function(
    move |_, (name, options, location): (String, LuaValue, Option<Location>)| {
      let (kind, location) = parse_target_options(options, location)?;
      let handle = s.borrow_mut().register_target(&name, kind, location)?;
      Ok(LuaTarget::new(handle, s.clone()))
    },
  )?;
  table.set("AddTarget", add_target)?;

  let s = session.clone();
  let toolchain = lua.create_function(move |_, prefix: String| {
    s.borrow_mut().toolchain(&prefix)?;
    Ok(())
  })?;
  table.set("Toolchain", toolchain)?;

  let s = session.clone();
  let architecture = lua.create_function(move |_, (arch, archdir): (String, Option<LuaValue>)| {
    let archdir = match archdir {
      None | Some(LuaValue::Nil) => None,
      Some(LuaValue::String(dir)) => Some(dir.to_string_lossy()),
      // Architecture("i686", { archdir = "i386" })
      Some(LuaValue::Table(opts)) => opts.get::<Option<String>>("archdir")?,
      Some(other) => {
        return Err(LuaError::external(format!(
          "Architecture: archdir must be a string, got {}",
          other.type_name()
        )));
      }
    };
    s.borrow_mut().architecture(&arch, archdir.as_deref())?;
    Ok(())
  })?;
  table.set("Architecture", architecture)?;

  let s = session;
  let loader = lua.create_function(move |_, (name, arch): (String, Option<String>)| {
    s.borrow_mut().loader(&name, arch.as_deref())?;
    Ok(())
  })?;
  table.set("Loader", loader)?;

  Ok(())
}

/// `AddTarget(name, options [, location])` accepts either an options table or a
/// bare kind. The location defaults to [`Location::Root`].
fn parse_target_options(options: LuaValue, location: Option<Location>) -> LuaResult<(TargetKind, Location)> {
  match options {
    LuaValue::Table(opts) => {
      let kind: Option<TargetKind> = opts.get("type")?;
      let kind = kind.ok_or_else(|| LuaError::external("AddTarget requires a 'type'"))?;
      let location: Option<Location> = opts.get("location")?;
      Ok((kind, location.unwrap_or(Location::Root)))
    }
    LuaValue::String(kind) => {
      let kind: TargetKind = kind.to_string_lossy().parse().map_err(LuaError::from)?;
      Ok((kind, location.unwrap_or(Location::Root)))
    }
    _ => Err(LuaError::external("AddTarget requires a 'type'")),
  }
}

/// Register `ProgType`, `Location` and the `CONFIG_*` strings into `table`.
pub fn register_constants(lua: &Lua, table: &LuaTable) -> LuaResult<()> {
  let prog_type = lua.create_table()?;
  for kind in TargetKind::ALL {
    prog_type.set(kind.as_str().to_uppercase(), kind.as_str())?;
  }
  table.set("ProgType", prog_type)?;

  let location = lua.create_table()?;
  for loc in Location::ALL {
    location.set(loc.as_str().to_uppercase(), loc.as_str())?;
  }
  location.set(
    "path",
    lua.create_function(|_, loc: Location| Ok(loc.path()))?,
  )?;
  table.set("Location", location)?;

  table.set("CONFIG_YES", CONFIG_YES)?;
  table.set("CONFIG_NO", CONFIG_NO)?;
  Ok(())
}

/// Build the `config` table loader plugins see.
///
/// It carries the constants plus `config.get(key)`, a read-only view of the
/// global configuration as it stood when the plugin was loaded.
pub fn create_config_facility(lua: &Lua, global: &Configuration) -> LuaResult<LuaTable> {
  let facility = lua.create_table()?;
  register_constants(lua, &facility)?;

  let snapshot = global.clone();
  let get = lua.create_function(move |_, key: String| Ok(snapshot.get(&key)?.clone()))?;
  facility.set("get", get)?;

  let has = {
    let snapshot = global.clone();
    lua.create_function(move |_, key: String| Ok(snapshot.contains(&key)))?
  };
  facility.set("has", has)?;

  Ok(facility)
}
