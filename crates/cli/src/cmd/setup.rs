//! `elcfg setup`: run a target definition and show what it configured.

use anyhow::{Context, Result};

use elcfg_lib::config::ConfigStore;
use elcfg_lib::setup::{SetupOptions, setup, target_script};

use super::Dirs;
use crate::output::{print_info, print_json, print_stat, print_success, symbols};

pub fn cmd_setup(target: &str, mode: &str, dirs: &Dirs, json: bool) -> Result<()> {
  let store = run_setup(target, mode, dirs)?;

  if json {
    print_json(&store)?;
  } else {
    print_success(&format!("Configured '{}' ({} configurations)", target, store.len()));
    print_store(&store);
  }
  Ok(())
}

pub(crate) fn run_setup(target: &str, mode: &str, dirs: &Dirs) -> Result<ConfigStore> {
  let options = SetupOptions {
    target_dir: dirs.paths.target_dir.clone(),
  };
  let script = target_script(target, &options);
  setup(target, mode, &options).with_context(|| format!("Setup failed for {}", script.display()))
}

fn print_store(store: &ConfigStore) {
  for config in store.targets() {
    println!();
    print_info(&format!("{} (kind: {}, location: {})", config.name, config.kind, config.location));
    for (key, entry) in config.entries() {
      let value = if entry.export {
        format!("{} {}", entry.value, symbols::EXPORT)
      } else {
        entry.value.to_string()
      };
      print_stat(key, &value);
    }
  }
}
