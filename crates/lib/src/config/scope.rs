//! The active-scope cursor.
//!
//! Exactly one configuration receives `Config(...)` writes at any time. The
//! cursor starts on the global configuration and can be moved to one target
//! at a time; it always returns to global when the scope is released.
//!
//! Scopes are flat: entering a target while another target is active fails
//! with [`ConfigError::NestedScope`].

use std::cell::RefCell;
use std::ops::{Deref, DerefMut};
use std::rc::Rc;

use tracing::debug;

use super::session::ConfigSession;
use super::store::{ConfigHandle, ConfigStore};
use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Copy)]
pub struct ScopeCursor {
  global: ConfigHandle,
  active: ConfigHandle,
}

impl ScopeCursor {
  pub fn new(global: ConfigHandle) -> Self {
    Self { global, active: global }
  }

  pub fn active(&self) -> ConfigHandle {
    self.active
  }

  pub fn global(&self) -> ConfigHandle {
    self.global
  }

  pub fn is_global(&self) -> bool {
    self.active == self.global
  }

  /// Make `handle` the active configuration.
  pub fn enter(&mut self, store: &ConfigStore, handle: ConfigHandle) -> Result<()> {
    if !self.is_global() {
      return Err(ConfigError::NestedScope {
        active: store.config(self.active).name.clone(),
        requested: store.config(handle).name.clone(),
      });
    }
    self.active = handle;
    debug!(scope = %store.config(handle).name, "entered scope");
    Ok(())
  }

  /// Return to the global configuration. Unconditional.
  pub fn release(&mut self) {
    if !self.is_global() {
      debug!(handle = %self.active, "released scope");
    }
    self.active = self.global;
  }

  /// Fail with [`ConfigError::ScopeViolation`] unless the global
  /// configuration is active.
  pub fn require_global(&self, store: &ConfigStore, operation: &str) -> Result<()> {
    if self.is_global() {
      Ok(())
    } else {
      Err(ConfigError::ScopeViolation {
        operation: operation.to_string(),
        active: store.config(self.active).name.clone(),
      })
    }
  }
}

/// Borrowing guard returned by [`ConfigSession::enter`].
///
/// Derefs to the session so writes go through the guard; dropping it (on
/// return, `?`, or unwinding) puts the cursor back on global.
pub struct ScopeGuard<'a> {
  session: &'a mut ConfigSession,
}

impl<'a> ScopeGuard<'a> {
  pub(crate) fn new(session: &'a mut ConfigSession) -> Self {
    Self { session }
  }
}

impl Deref for ScopeGuard<'_> {
  type Target = ConfigSession;

  fn deref(&self) -> &Self::Target {
    self.session
  }
}

impl DerefMut for ScopeGuard<'_> {
  fn deref_mut(&mut self) -> &mut Self::Target {
    self.session
  }
}

impl Drop for ScopeGuard<'_> {
  fn drop(&mut self) {
    self.session.release_scope();
  }
}

/// Guard over a session shared with Lua callbacks.
///
/// Holds no borrow while alive, so the scoped Lua code can keep calling DSL
/// functions that borrow the session.
pub struct SharedScopeGuard {
  session: Rc<RefCell<ConfigSession>>,
}

impl SharedScopeGuard {
  pub fn enter(session: &Rc<RefCell<ConfigSession>>, handle: ConfigHandle) -> Result<Self> {
    session.borrow_mut().begin_scope(handle)?;
    Ok(Self {
      session: Rc::clone(session),
    })
  }
}

impl Drop for SharedScopeGuard {
  fn drop(&mut self) {
    // DSL callbacks hold their session borrow only for the duration of the
    // call, so no borrow is outstanding once the scoped function returns.
    let released = self.session.try_borrow_mut().map(|mut session| session.release_scope());
    debug_assert!(released.is_ok(), "session borrowed while releasing scope");
  }
}
