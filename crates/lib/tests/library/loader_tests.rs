//! Loader resolution and planning over the sample project.

use std::path::PathBuf;

use elcfg_lib::loader::{BuildStep, PlanHelper, resolve_loader};
use elcfg_lib::setup::setup;

use super::common::{sample_dir, sample_resolve_options, sample_setup_options};

#[test]
fn grub_plan_for_i686_pc() {
  let store = setup("i686-pc", "development", &sample_setup_options()).unwrap();
  let mut helper = PlanHelper::new(&store, "image").unwrap();
  let loader = resolve_loader(&store, &helper, &sample_resolve_options()).unwrap();

  assert_eq!(loader.name(), "grub");
  assert_eq!(loader.arch(), "i386");

  helper.set_kernel_dir(loader.kern_path());
  loader.build(&mut helper).unwrap();
  let plan = helper.into_plan();

  assert_eq!(plan.len(), 3);
  assert_eq!(
    plan.steps[0],
    BuildStep::Install {
      source: sample_dir().join("loader").join("grub.cfg"),
      dest: PathBuf::from("image/boot/boot/grub/grub.cfg"),
    }
  );
  match &plan.steps[2] {
    BuildStep::Command { output, sources, command } => {
      assert_eq!(output, &PathBuf::from("image/boot.iso"));
      assert_eq!(sources[1], PathBuf::from("image/boot/kernel"));
      assert_eq!(command, "grub-mkrescue -o image/boot.iso image/boot");
    }
    other => panic!("expected command step, got {other:?}"),
  }
}

#[test]
fn disk_plugin_plan_for_virt_riscv() {
  let store = setup("virt-riscv", "release", &sample_setup_options()).unwrap();
  let mut helper = PlanHelper::new(&store, "image").unwrap();
  let loader = resolve_loader(&store, &helper, &sample_resolve_options()).unwrap();

  assert_eq!(loader.name(), "disk");
  assert_eq!(loader.kern_path(), PathBuf::from("boot"));

  helper.set_kernel_dir(loader.kern_path());
  loader.build(&mut helper).unwrap();
  let plan = helper.into_plan();

  assert_eq!(
    plan.steps,
    vec![
      BuildStep::Initrd {
        root: PathBuf::from("image/initrd"),
        output: PathBuf::from("image/boot/initrd.tar"),
      },
      BuildStep::Command {
        output: PathBuf::from("image/disk.img"),
        sources: vec![PathBuf::from("image/boot/kernel"), PathBuf::from("image/boot/initrd.tar")],
        command: "mkdisk --arch riscv64 -o image/disk.img image/boot/kernel image/boot/initrd.tar".to_string(),
      },
    ]
  );
}
