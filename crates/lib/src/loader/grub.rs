//! GRUB rescue-image loader.
//!
//! Produces `<image root>/boot.iso` with `grub-mkrescue` from the boot image
//! directory, which holds `boot/grub/grub.cfg`, the kernel, and the initrd.

use std::path::PathBuf;

use tracing::info;

use super::{BuildHelper, Loader, LoaderInit};
use crate::config::Location;
use crate::error::{ConfigError, Result};

pub const NAME: &str = "grub";

/// Support file copied from the loader directory.
pub const CONFIG_FILE: &str = "grub.cfg";

pub const IMAGE_NAME: &str = "boot.iso";

/// Target that must exist for the image to boot.
const KERNEL_TARGET: &str = "kernel";

#[derive(Debug, Clone)]
pub struct GrubLoader {
  arch: String,
  loader_dir: PathBuf,
}

impl GrubLoader {
  pub fn new(arch: impl Into<String>, loader_dir: impl Into<PathBuf>) -> Self {
    Self {
      arch: arch.into(),
      loader_dir: loader_dir.into(),
    }
  }

  pub fn create(init: &LoaderInit<'_>) -> Result<Box<dyn Loader>> {
    Ok(Box::new(Self::new(init.arch, init.loader_dir)))
  }
}

impl Loader for GrubLoader {
  fn name(&self) -> &str {
    NAME
  }

  fn arch(&self) -> &str {
    &self.arch
  }

  /// The kernel sits at the top of the boot directory.
  fn kern_path(&self) -> PathBuf {
    Location::Boot.path().map(PathBuf::from).unwrap_or_default()
  }

  fn build(&self, helper: &mut dyn BuildHelper) -> Result<()> {
    let kernel = helper
      .get_target(KERNEL_TARGET)
      .ok_or_else(|| ConfigError::UnknownTarget(KERNEL_TARGET.to_string()))?;
    let image_root = helper.image_root_dir();
    let boot_dir = helper.image_dir(Location::Boot);

    helper.install(&boot_dir.join("boot").join("grub"), &self.loader_dir.join(CONFIG_FILE))?;
    let initrd = helper.initrd(&boot_dir)?;

    let iso = image_root.join(IMAGE_NAME);
    helper.command(
      &iso,
      &[initrd, kernel.install_path],
      &format!("grub-mkrescue -o $TARGET {}", boot_dir.display()),
    )?;

    info!(arch = %self.arch, image = %iso.display(), "grub image planned");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildMode, ConfigSession, TargetKind};
  use crate::loader::{BuildStep, PlanHelper};

  #[test]
  fn build_plans_rescue_image() {
    let mut session = ConfigSession::new(BuildMode::Development).unwrap();
    session
      .register_target("kernel", TargetKind::Kernel, Location::Root)
      .unwrap();
    let store = session.finish().unwrap();

    let loader = GrubLoader::new("i686", "build/loader");
    let mut helper = PlanHelper::new(&store, "image").unwrap();
    helper.set_kernel_dir(loader.kern_path());
    loader.build(&mut helper).unwrap();

    let plan = helper.into_plan();
    assert_eq!(
      plan.steps,
      vec![
        BuildStep::Install {
          source: PathBuf::from("build/loader/grub.cfg"),
          dest: PathBuf::from("image/boot/boot/grub/grub.cfg"),
        },
        BuildStep::Initrd {
          root: PathBuf::from("image/initrd"),
          output: PathBuf::from("image/boot/initrd.tar"),
        },
        BuildStep::Command {
          output: PathBuf::from("image/boot.iso"),
          sources: vec![PathBuf::from("image/boot/initrd.tar"), PathBuf::from("image/boot/kernel")],
          command: "grub-mkrescue -o image/boot.iso image/boot".to_string(),
        },
      ]
    );
  }

  #[test]
  fn build_requires_kernel_target() {
    let store = ConfigSession::new(BuildMode::Development).unwrap().finish().unwrap();
    let mut helper = PlanHelper::new(&store, "image").unwrap();

    let err = GrubLoader::new("i686", "build/loader").build(&mut helper).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownTarget(ref name) if name == "kernel"));
    assert!(helper.plan().is_empty());
  }
}
