mod info;
mod loader;
mod pack;
mod setup;

use std::path::PathBuf;

use elcfg_lib::platform::ProjectPaths;

pub use info::cmd_info;
pub use loader::cmd_loader;
pub use pack::cmd_pack;
pub use setup::cmd_setup;

/// Directories after applying command-line overrides.
pub struct Dirs {
  pub paths: ProjectPaths,
}

impl Dirs {
  pub fn resolve(target_dir: Option<PathBuf>, loader_dir: Option<PathBuf>, image_dir: Option<PathBuf>) -> Self {
    let mut paths = ProjectPaths::current();
    if let Some(dir) = target_dir {
      paths.target_dir = dir;
    }
    if let Some(dir) = loader_dir {
      paths.loader_dir = dir;
    }
    if let Some(dir) = image_dir {
      paths.image_dir = dir;
    }
    Self { paths }
  }
}
