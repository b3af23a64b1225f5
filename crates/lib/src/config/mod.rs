//! The scoped configuration model.
//!
//! - [`types`] - target kinds, install locations, values
//! - [`store`] - the name-to-configuration registry
//! - [`scope`] - the active-scope cursor and its guards
//! - [`session`] - one setup pass tying the two together

pub mod scope;
pub mod session;
pub mod store;
pub mod types;

pub use scope::{ScopeCursor, ScopeGuard, SharedScopeGuard};
pub use session::ConfigSession;
pub use store::{ConfigHandle, ConfigStore, Configuration};
pub use types::{BuildMode, ConfigEntry, ConfigValue, Location, TargetKind};
