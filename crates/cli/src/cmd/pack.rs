use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use elcfg_lib::archive::pack_dir;

use crate::output::print_success;

pub fn cmd_pack(dir: &Path, output: &Path) -> Result<()> {
  let count = pack_dir(dir, output).with_context(|| format!("Failed to pack {}", dir.display()))?;
  info!(dir = %dir.display(), output = %output.display(), entries = count, "archive packed");
  print_success(&format!("Wrote {} ({} entries)", output.display(), count));
  Ok(())
}
