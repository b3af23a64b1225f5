//! Setup passes over the sample target definitions.

use elcfg_lib::config::{ConfigValue, Location, TargetKind};
use elcfg_lib::consts::{CONFIG_NO, CONFIG_YES, keys};
use elcfg_lib::setup::setup;

use super::common::sample_setup_options;

mod i686_pc {
  use super::*;

  #[test]
  fn global_configuration() {
    let store = setup("i686-pc", "development", &sample_setup_options()).unwrap();
    let global = store.global().unwrap();

    assert_eq!(global.get_str(keys::TOOLCHAIN).unwrap(), "i686-linux-musl");
    assert_eq!(global.get_str(keys::ARCH).unwrap(), "i686");
    assert_eq!(global.get_str(keys::ARCHDIR).unwrap(), "i386");
    assert_eq!(global.get_str(keys::LOADER).unwrap(), "grub");
    assert_eq!(global.get_str(keys::LOADER_ARCH).unwrap(), "i386");
    assert_eq!(global.get(keys::MODE).unwrap(), &ConfigValue::from("DEVELOPMENT"));
    assert_eq!(global.get("NCPU").unwrap(), &ConfigValue::Integer(8));

    let exported: Vec<_> = global.exported().map(|(k, _)| k).collect();
    assert_eq!(exported, vec![keys::ARCH, keys::MODE]);
  }

  #[test]
  fn targets_in_registration_order() {
    let store = setup("i686-pc", "development", &sample_setup_options()).unwrap();
    let names: Vec<_> = store.targets().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["global", "kernel", "init", "shell"]);

    let init = store.target("init").unwrap();
    assert_eq!(init.kind, TargetKind::Exe);
    assert_eq!(init.location, Location::Initrd);
    assert!(init.is_empty());
  }

  #[test]
  fn kernel_configuration_follows_mode() {
    let dev = setup("i686-pc", "development", &sample_setup_options()).unwrap();
    let kernel = dev.target("kernel").unwrap();
    assert_eq!(kernel.get_str("DEVELOPMENT").unwrap(), CONFIG_YES);
    assert_eq!(kernel.get_str("STACKCHK").unwrap(), CONFIG_YES);
    let modules = kernel.get("STATIC_MODULES").unwrap().as_list().unwrap();
    assert_eq!(modules.first().map(String::as_str), Some("elf32"));
    assert_eq!(kernel.get("DYNAMIC_MODULES").unwrap().as_list(), Some(&[][..]));

    let release = setup("i686-pc", "release", &sample_setup_options()).unwrap();
    let kernel = release.target("kernel").unwrap();
    assert_eq!(kernel.get_str("DEVELOPMENT").unwrap(), CONFIG_NO);
    assert_eq!(release.global().unwrap().get_str(keys::MODE).unwrap(), "RELEASE");
  }

  #[test]
  fn passes_are_independent() {
    let first = setup("i686-pc", "development", &sample_setup_options()).unwrap();
    let second = setup("i686-pc", "development", &sample_setup_options()).unwrap();
    assert_eq!(first.len(), second.len());
    assert_eq!(
      first.target("kernel").unwrap(),
      second.target("kernel").unwrap()
    );
  }
}

#[test]
fn close_block_scopes_are_released() {
  let store = setup("virt-riscv", "development", &sample_setup_options()).unwrap();
  let kernel = store.target("kernel").unwrap();
  assert_eq!(kernel.get_str("MODULAR").unwrap(), CONFIG_NO);
  assert!(store.global().unwrap().get("MODULAR").is_err());
  assert_eq!(store.global().unwrap().get_str(keys::LOADER_ARCH).unwrap(), "riscv64");
}
