//! A loader that builds nothing. Useful for targets booted by external
//! tooling and for exercising a setup pass end to end.

use std::path::PathBuf;

use tracing::info;

use super::{BuildHelper, Loader, LoaderInit};
use crate::config::Location;
use crate::error::Result;

pub const NAME: &str = "null";

#[derive(Debug, Clone)]
pub struct NullLoader {
  arch: String,
}

impl NullLoader {
  pub fn new(arch: impl Into<String>) -> Self {
    Self { arch: arch.into() }
  }

  pub fn create(init: &LoaderInit<'_>) -> Result<Box<dyn Loader>> {
    Ok(Box::new(Self::new(init.arch)))
  }
}

impl Loader for NullLoader {
  fn name(&self) -> &str {
    NAME
  }

  fn arch(&self) -> &str {
    &self.arch
  }

  fn kern_path(&self) -> PathBuf {
    Location::Boot.path().map(PathBuf::from).unwrap_or_default()
  }

  fn build(&self, helper: &mut dyn BuildHelper) -> Result<()> {
    info!(arch = %self.arch, image = %helper.image_root_dir().display(), "null loader: nothing to build");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildMode, ConfigSession};
  use crate::loader::PlanHelper;

  #[test]
  fn build_records_nothing() {
    let store = ConfigSession::new(BuildMode::Development).unwrap().finish().unwrap();
    let mut helper = PlanHelper::new(&store, "image").unwrap();
    let loader = NullLoader::new("armv7");

    loader.build(&mut helper).unwrap();
    assert!(helper.plan().is_empty());
    assert_eq!(loader.kern_path(), PathBuf::from("boot"));
  }
}
