use super::Dirs;
use crate::output::print_stat;

use elcfg_lib::loader::LoaderRegistry;

pub fn cmd_info(dirs: &Dirs) {
  println!("Directories:");
  print_stat("Targets", &dirs.paths.target_dir.display().to_string());
  print_stat("Loaders", &dirs.paths.loader_dir.display().to_string());
  print_stat("Image", &dirs.paths.image_dir.display().to_string());
  println!();
  let builtins: Vec<_> = LoaderRegistry::with_builtins().names().map(str::to_string).collect();
  print_stat("Built-in loaders", &builtins.join(", "));
}
