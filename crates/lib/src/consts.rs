//! Names shared between the library and the CLI.

pub const APP_NAME: &str = "elcfg";

/// Name of the configuration every pass starts with.
pub const GLOBAL_TARGET: &str = "global";

/// Extension of target definition and loader plugin scripts.
pub const SCRIPT_EXT: &str = "lua";

pub const CONFIG_YES: &str = "CONFIG_YES";
pub const CONFIG_NO: &str = "CONFIG_NO";

/// Well-known keys of the global configuration.
pub mod keys {
  pub const MODE: &str = "MODE";
  pub const TOOLCHAIN: &str = "TOOLCHAIN";
  pub const ARCH: &str = "ARCH";
  pub const ARCHDIR: &str = "ARCHDIR";
  pub const LOADER: &str = "LOADER";
  pub const LOADER_ARCH: &str = "LOADER_ARCH";
}
