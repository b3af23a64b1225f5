//! Project directory layout.
//!
//! Each directory can be overridden through an environment variable; relative
//! paths resolve against the current working directory.

use std::path::PathBuf;

pub const TARGET_DIR_ENV: &str = "ELCFG_TARGET_DIR";
pub const LOADER_DIR_ENV: &str = "ELCFG_LOADER_DIR";
pub const IMAGE_DIR_ENV: &str = "ELCFG_IMAGE_DIR";

const DEFAULT_TARGET_DIR: &str = "build/target";
const DEFAULT_LOADER_DIR: &str = "build/loader";
const DEFAULT_IMAGE_DIR: &str = "image";

/// Where target scripts, loader plugins, and the image tree live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
  pub target_dir: PathBuf,
  pub loader_dir: PathBuf,
  pub image_dir: PathBuf,
}

impl ProjectPaths {
  pub fn current() -> Self {
    Self {
      target_dir: target_dir(),
      loader_dir: loader_dir(),
      image_dir: image_dir(),
    }
  }
}

/// Directory holding `<target>.lua` definitions.
pub fn target_dir() -> PathBuf {
  env_or(TARGET_DIR_ENV, DEFAULT_TARGET_DIR)
}

/// Directory holding loader plugins and their support files.
pub fn loader_dir() -> PathBuf {
  env_or(LOADER_DIR_ENV, DEFAULT_LOADER_DIR)
}

/// Root of the image tree.
pub fn image_dir() -> PathBuf {
  env_or(IMAGE_DIR_ENV, DEFAULT_IMAGE_DIR)
}

fn env_or(var: &str, default: &str) -> PathBuf {
  match std::env::var(var) {
    Ok(path) if !path.is_empty() => PathBuf::from(path),
    _ => PathBuf::from(default),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serial_test::serial;

  #[test]
  #[serial]
  fn defaults_without_overrides() {
    temp_env::with_vars(
      [
        (TARGET_DIR_ENV, None::<&str>),
        (LOADER_DIR_ENV, None::<&str>),
        (IMAGE_DIR_ENV, None::<&str>),
      ],
      || {
        let paths = ProjectPaths::current();
        assert_eq!(paths.target_dir, PathBuf::from("build/target"));
        assert_eq!(paths.loader_dir, PathBuf::from("build/loader"));
        assert_eq!(paths.image_dir, PathBuf::from("image"));
      },
    );
  }

  #[test]
  #[serial]
  fn env_overrides_take_precedence() {
    temp_env::with_vars(
      [
        (TARGET_DIR_ENV, Some("/work/targets")),
        (LOADER_DIR_ENV, Some("/work/loaders")),
        (IMAGE_DIR_ENV, Some("/work/out")),
      ],
      || {
        assert_eq!(target_dir(), PathBuf::from("/work/targets"));
        assert_eq!(loader_dir(), PathBuf::from("/work/loaders"));
        assert_eq!(image_dir(), PathBuf::from("/work/out"));
      },
    );
  }

  #[test]
  #[serial]
  fn empty_override_falls_back_to_default() {
    temp_env::with_var(LOADER_DIR_ENV, Some(""), || {
      assert_eq!(loader_dir(), PathBuf::from("build/loader"));
    });
  }
}
