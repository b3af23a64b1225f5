//! `elcfg loader`: resolve the target's loader and plan its boot image.

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::info;

use elcfg_lib::loader::{BuildPlan, BuildStep, LoaderRegistry, PlanHelper, ResolveOptions, resolve_loader};

use super::Dirs;
use super::setup::run_setup;
use crate::output::{print_json, print_stat, print_success, symbols};

#[derive(Serialize)]
struct LoaderReport<'a> {
  loader: &'a str,
  arch: &'a str,
  kern_path: String,
  plan: &'a BuildPlan,
}

pub fn cmd_loader(target: &str, mode: &str, dirs: &Dirs, json: bool) -> Result<()> {
  let store = run_setup(target, mode, dirs)?;

  let options = ResolveOptions {
    loader_dir: dirs.paths.loader_dir.clone(),
    registry: LoaderRegistry::with_builtins(),
  };
  let mut helper = PlanHelper::new(&store, &dirs.paths.image_dir).context("Setup produced no global configuration")?;
  let loader = resolve_loader(&store, &helper, &options).context("Failed to resolve loader")?;

  helper.set_kernel_dir(loader.kern_path());
  loader
    .build(&mut helper)
    .with_context(|| format!("Loader '{}' failed to build", loader.name()))?;
  let plan = helper.into_plan();
  info!(loader = loader.name(), steps = plan.len(), "boot image planned");

  if json {
    return print_json(&LoaderReport {
      loader: loader.name(),
      arch: loader.arch(),
      kern_path: loader.kern_path().display().to_string(),
      plan: &plan,
    });
  }

  print_success(&format!("Loader '{}' for {}", loader.name(), loader.arch()));
  print_stat("Kernel path", &loader.kern_path().display().to_string());
  print_stat("Steps", &plan.len().to_string());
  for step in &plan.steps {
    println!("  {} {}", symbols::ARROW, describe(step));
  }
  Ok(())
}

fn describe(step: &BuildStep) -> String {
  match step {
    BuildStep::Install { source, dest } => format!("install {} -> {}", source.display(), dest.display()),
    BuildStep::Initrd { root, output } => format!("initrd {} -> {}", root.display(), output.display()),
    BuildStep::Command { output, command, .. } => format!("{} ({})", command, output.display()),
  }
}
