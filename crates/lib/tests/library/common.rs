use std::path::PathBuf;

use elcfg_lib::loader::{LoaderRegistry, ResolveOptions};
use elcfg_lib::setup::SetupOptions;

/// The sample project shipped at the workspace root.
pub fn sample_dir() -> PathBuf {
  PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../build")
}

pub fn sample_setup_options() -> SetupOptions {
  SetupOptions {
    target_dir: sample_dir().join("target"),
  }
}

pub fn sample_resolve_options() -> ResolveOptions {
  ResolveOptions {
    loader_dir: sample_dir().join("loader"),
    registry: LoaderRegistry::with_builtins(),
  }
}
