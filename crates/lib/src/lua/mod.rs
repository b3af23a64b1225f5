//! Lua runtime and the DSL surface.
//!
//! - [`runtime`] - Lua state creation, namespaces, script execution
//! - [`globals`] - the functions and constants target scripts and loader plugins see
//! - [`target`] - userdata handles returned by `AddTarget`

pub mod globals;
pub mod runtime;
pub mod target;
