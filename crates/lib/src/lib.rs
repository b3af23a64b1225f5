//! elcfg-lib: scoped build configuration and boot loader resolution
//!
//! A build is described by Lua scripts:
//! - `setup`: runs a target definition script and returns the `ConfigStore`
//!   it populated, one `Configuration` per target plus `global`
//! - `loader`: turns the `LOADER` chosen by that script into a `Loader`,
//!   native or a Lua plugin, that plans the boot image
//! - `archive`: packs initrd trees into USTAR archives

pub mod archive;
pub mod config;
pub mod consts;
pub mod error;
pub mod loader;
pub mod lua;
pub mod platform;
pub mod setup;

pub use error::{ConfigError, Result};
