mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use elcfg_lib::consts::APP_NAME;

/// elcfg - scoped build configuration and boot loader planning
#[derive(Parser)]
#[command(name = APP_NAME)]
#[command(author, version, about, long_about = None)]
struct Cli {
  /// Enable debug logging (RUST_LOG overrides)
  #[arg(short, long, global = true)]
  verbose: bool,

  /// Directory holding target definition scripts [env: ELCFG_TARGET_DIR]
  #[arg(long, global = true)]
  target_dir: Option<PathBuf>,

  /// Directory holding loader plugins and support files [env: ELCFG_LOADER_DIR]
  #[arg(long, global = true)]
  loader_dir: Option<PathBuf>,

  /// Root of the image tree [env: ELCFG_IMAGE_DIR]
  #[arg(long, global = true)]
  image_dir: Option<PathBuf>,

  #[command(subcommand)]
  command: Commands,
}

#[derive(Subcommand)]
enum Commands {
  /// Run a target definition and print the resulting configurations
  Setup {
    /// Target name, resolved to <target-dir>/<target>.lua
    target: String,

    /// Build mode: development or release
    #[arg(short, long, default_value = "development")]
    mode: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Resolve the target's boot loader and print its build plan
  Loader {
    /// Target name, resolved to <target-dir>/<target>.lua
    target: String,

    /// Build mode: development or release
    #[arg(short, long, default_value = "development")]
    mode: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
  },

  /// Pack a directory into a USTAR archive
  Pack {
    /// Directory to pack
    dir: PathBuf,

    /// Archive to write
    output: PathBuf,
  },

  /// Show the directory layout in effect
  Info,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let default_level = if cli.verbose { "debug" } else { "warn" };
  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
    .with_writer(std::io::stderr)
    .without_time()
    .init();

  let dirs = cmd::Dirs::resolve(cli.target_dir, cli.loader_dir, cli.image_dir);

  let result = match cli.command {
    Commands::Setup { target, mode, json } => cmd::cmd_setup(&target, &mode, &dirs, json),
    Commands::Loader { target, mode, json } => cmd::cmd_loader(&target, &mode, &dirs, json),
    Commands::Pack { dir, output } => cmd::cmd_pack(&dir, &output),
    Commands::Info => {
      cmd::cmd_info(&dirs);
      Ok(())
    }
  };

  if let Err(e) = result {
    output::print_error(&format!("{e:#}"));
    std::process::exit(1);
  }
  Ok(())
}
