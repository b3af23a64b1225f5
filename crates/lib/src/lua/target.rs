//! Lua handles for registered targets.
//!
//! `AddTarget` returns a [`LuaTarget`]. Scripts use it to write into the
//! target, either directly or by entering its scope:
//!
//! ```lua
//! local kernel = AddTarget("kernel", { type = ProgType.KERNEL })
//!
//! kernel:scope(function()
//!   Config("INVARIANTS", CONFIG_YES)
//! end)
//!
//! do
//!   local _ <close> = kernel:enter()
//!   Config("ASAN", CONFIG_YES)
//! end
//! ```

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use mlua::prelude::*;

use crate::config::{ConfigHandle, ConfigSession, ConfigValue, SharedScopeGuard};

#[derive(Clone)]
pub struct LuaTarget {
  handle: ConfigHandle,
  session: Rc<RefCell<ConfigSession>>,
}

impl LuaTarget {
  pub fn new(handle: ConfigHandle, session: Rc<RefCell<ConfigSession>>) -> Self {
    Self { handle, session }
  }

  fn name(&self) -> String {
    self.session.borrow().store().config(self.handle).name.clone()
  }
}

impl LuaUserData for LuaTarget {
  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_method("name", |_, this, ()| Ok(this.name()));

    methods.add_method("kind", |_, this, ()| {
      Ok(this.session.borrow().store().config(this.handle).kind.as_str())
    });

    methods.add_method("location", |_, this, ()| {
      Ok(this.session.borrow().store().config(this.handle).location.as_str())
    });

    methods.add_method(
      "config",
      |_, this, (key, value, export): (String, ConfigValue, Option<bool>)| {
        this
          .session
          .borrow_mut()
          .set(this.handle, &key, value, export.unwrap_or(false));
        Ok(())
      },
    );

    methods.add_method("get", |_, this, key: String| {
      let session = this.session.borrow();
      Ok(session.get(this.handle, &key)?.clone())
    });

    // Run `f` with this target active. The scope is released however `f`
    // exits, and its error (if any) is re-raised unchanged.
    methods.add_method("scope", |_, this, f: LuaFunction| {
      let _guard = SharedScopeGuard::enter(&this.session, this.handle)?;
      f.call::<LuaMultiValue>(())
    });

    methods.add_method("enter", |_, this, ()| {
      this.session.borrow_mut().begin_scope(this.handle)?;
      Ok(ScopeToken {
        session: Rc::clone(&this.session),
        handle: Cell::new(Some(this.handle)),
      })
    });

    methods.add_meta_method(LuaMetaMethod::ToString, |_, this, ()| Ok(format!("target<{}>", this.name())));
  }
}

/// Returned by `target:enter()`. Releases the scope when closed or when
/// `release()` is called.
///
/// Collecting an unreleased token leaves the scope entered, so the pass still
/// fails with `ScopeNotReleased`.
pub struct ScopeToken {
  session: Rc<RefCell<ConfigSession>>,
  handle: Cell<Option<ConfigHandle>>,
}

impl ScopeToken {
  fn release(&self) -> LuaResult<()> {
    let Some(handle) = self.handle.take() else {
      return Ok(());
    };
    let mut session = self.session.try_borrow_mut().map_err(LuaError::external)?;
    if session.cursor().active() == handle {
      session.release_scope();
    }
    Ok(())
  }
}

impl LuaUserData for ScopeToken {
  fn add_methods<M: LuaUserDataMethods<Self>>(methods: &mut M) {
    methods.add_method("release", |_, this, ()| this.release());

    methods.add_meta_method(LuaMetaMethod::Close, |_, this, _: LuaMultiValue| this.release());
  }
}
