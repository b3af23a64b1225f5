//! The build collaborator a loader drives.
//!
//! Loaders never touch the filesystem or spawn tools themselves; they describe
//! installs, initrd images, and commands through a [`BuildHelper`]. The
//! [`PlanHelper`] implementation records those requests as a [`BuildPlan`].

use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::config::{ConfigStore, Configuration, Location, TargetKind};
use crate::error::Result;

/// File name of the initrd archive produced by [`BuildHelper::initrd`].
pub const INITRD_NAME: &str = "initrd.tar";

/// Where a registered target ends up in the image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TargetArtifact {
  pub name: String,
  pub kind: TargetKind,
  pub location: Location,
  pub install_path: PathBuf,
}

pub trait BuildHelper {
  /// The global configuration of the finished setup pass.
  fn global_conf(&self) -> &Configuration;

  fn get_target(&self, name: &str) -> Option<TargetArtifact>;

  fn image_root_dir(&self) -> PathBuf;

  /// Image subdirectory for `location`. [`Location::None`] maps to the root.
  fn image_dir(&self, location: Location) -> PathBuf;

  /// Request an initrd archive built from `dir`. Returns the archive path.
  fn initrd(&mut self, dir: &Path) -> Result<PathBuf>;

  /// Install `source` into `dest_dir`. Returns the installed path.
  fn install(&mut self, dest_dir: &Path, source: &Path) -> Result<PathBuf>;

  /// Run `command` to produce `output` from `sources`. `$TARGET` and
  /// `$SOURCES` in the command expand to the output and the source list.
  fn command(&mut self, output: &Path, sources: &[PathBuf], command: &str) -> Result<PathBuf>;
}

/// One recorded build request.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum BuildStep {
  Install { source: PathBuf, dest: PathBuf },
  Initrd { root: PathBuf, output: PathBuf },
  Command { output: PathBuf, sources: Vec<PathBuf>, command: String },
}

/// Ordered build requests made by a loader.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BuildPlan {
  pub steps: Vec<BuildStep>,
}

impl BuildPlan {
  pub fn len(&self) -> usize {
    self.steps.len()
  }

  pub fn is_empty(&self) -> bool {
    self.steps.is_empty()
  }
}

/// A [`BuildHelper`] that records requests instead of executing them.
///
/// Target artifacts land at `<image root>/<location path>/<name>`, except
/// kernel targets, which go under the loader's kernel directory once
/// [`PlanHelper::set_kernel_dir`] has been called.
#[derive(Debug)]
pub struct PlanHelper<'a> {
  store: &'a ConfigStore,
  global: &'a Configuration,
  image_root: PathBuf,
  kernel_dir: Option<PathBuf>,
  plan: BuildPlan,
}

impl<'a> PlanHelper<'a> {
  pub fn new(store: &'a ConfigStore, image_root: impl Into<PathBuf>) -> Result<Self> {
    Ok(Self {
      store,
      global: store.global()?,
      image_root: image_root.into(),
      kernel_dir: None,
      plan: BuildPlan::default(),
    })
  }

  /// Kernel directory relative to the image root, usually the loader's
  /// `kern_path()`.
  pub fn set_kernel_dir(&mut self, dir: impl Into<PathBuf>) {
    self.kernel_dir = Some(dir.into());
  }

  pub fn plan(&self) -> &BuildPlan {
    &self.plan
  }

  pub fn into_plan(self) -> BuildPlan {
    self.plan
  }

  fn record(&mut self, step: BuildStep) {
    debug!(?step, "recorded build step");
    self.plan.steps.push(step);
  }
}

impl BuildHelper for PlanHelper<'_> {
  fn global_conf(&self) -> &Configuration {
    self.global
  }

  fn get_target(&self, name: &str) -> Option<TargetArtifact> {
    let config = self.store.target(name)?;
    let dir = match (&self.kernel_dir, config.kind) {
      (Some(kernel_dir), TargetKind::Kernel) => self.image_root.join(kernel_dir),
      _ => self.image_dir(config.location),
    };
    Some(TargetArtifact {
      name: config.name.clone(),
      kind: config.kind,
      location: config.location,
      install_path: dir.join(&config.name),
    })
  }

  fn image_root_dir(&self) -> PathBuf {
    self.image_root.clone()
  }

  fn image_dir(&self, location: Location) -> PathBuf {
    match location.path() {
      Some(path) => self.image_root.join(path),
      None => self.image_root.clone(),
    }
  }

  fn initrd(&mut self, dir: &Path) -> Result<PathBuf> {
    let output = dir.join(INITRD_NAME);
    let root = self.image_dir(Location::Initrd);
    self.record(BuildStep::Initrd {
      root,
      output: output.clone(),
    });
    Ok(output)
  }

  fn install(&mut self, dest_dir: &Path, source: &Path) -> Result<PathBuf> {
    let dest = match source.file_name() {
      Some(name) => dest_dir.join(name),
      None => dest_dir.to_path_buf(),
    };
    self.record(BuildStep::Install {
      source: source.to_path_buf(),
      dest: dest.clone(),
    });
    Ok(dest)
  }

  fn command(&mut self, output: &Path, sources: &[PathBuf], command: &str) -> Result<PathBuf> {
    let command = expand_command(command, output, sources);
    self.record(BuildStep::Command {
      output: output.to_path_buf(),
      sources: sources.to_vec(),
      command,
    });
    Ok(output.to_path_buf())
  }
}

fn expand_command(command: &str, output: &Path, sources: &[PathBuf]) -> String {
  let sources = sources
    .iter()
    .map(|s| s.display().to_string())
    .collect::<Vec<_>>()
    .join(" ");
  command
    .replace("$TARGET", &output.display().to_string())
    .replace("$SOURCES", &sources)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::config::{BuildMode, ConfigSession};

  fn store() -> ConfigStore {
    let mut session = ConfigSession::new(BuildMode::Development).unwrap();
    session.architecture("i686", None).unwrap();
    session
      .register_target("kernel", TargetKind::Kernel, Location::Root)
      .unwrap();
    session
      .register_target("init", TargetKind::Exe, Location::Initrd)
      .unwrap();
    session.finish().unwrap()
  }

  #[test]
  fn image_dirs_follow_location_paths() {
    let store = store();
    let helper = PlanHelper::new(&store, "image").unwrap();
    assert_eq!(helper.image_dir(Location::Boot), PathBuf::from("image/boot"));
    assert_eq!(helper.image_dir(Location::Initrd), PathBuf::from("image/initrd"));
    assert_eq!(helper.image_dir(Location::None), PathBuf::from("image"));
  }

  #[test]
  fn artifacts_install_by_location() {
    let store = store();
    let mut helper = PlanHelper::new(&store, "image").unwrap();

    let init = helper.get_target("init").unwrap();
    assert_eq!(init.install_path, PathBuf::from("image/initrd/init"));

    assert_eq!(
      helper.get_target("kernel").unwrap().install_path,
      PathBuf::from("image/root/kernel")
    );
    helper.set_kernel_dir("boot");
    assert_eq!(
      helper.get_target("kernel").unwrap().install_path,
      PathBuf::from("image/boot/kernel")
    );

    assert!(helper.get_target("missing").is_none());
  }

  #[test]
  fn global_conf_is_the_global_configuration() {
    let store = store();
    let helper = PlanHelper::new(&store, "image").unwrap();
    assert_eq!(helper.global_conf().name, "global");
    assert_eq!(helper.global_conf().get_str("ARCH").unwrap(), "i686");
  }

  #[test]
  fn steps_are_recorded_in_order() {
    let store = store();
    let mut helper = PlanHelper::new(&store, "image").unwrap();

    let cfg = helper
      .install(Path::new("image/boot/boot/grub"), Path::new("build/loader/grub.cfg"))
      .unwrap();
    assert_eq!(cfg, PathBuf::from("image/boot/boot/grub/grub.cfg"));

    let initrd = helper.initrd(Path::new("image/boot")).unwrap();
    assert_eq!(initrd, PathBuf::from("image/boot/initrd.tar"));

    helper
      .command(
        Path::new("image/boot.iso"),
        &[initrd.clone()],
        "mkiso -o $TARGET $SOURCES",
      )
      .unwrap();

    let plan = helper.into_plan();
    assert_eq!(plan.len(), 3);
    assert!(matches!(plan.steps[0], BuildStep::Install { .. }));
    assert_eq!(
      plan.steps[1],
      BuildStep::Initrd {
        root: PathBuf::from("image/initrd"),
        output: initrd,
      }
    );
    match &plan.steps[2] {
      BuildStep::Command { command, .. } => {
        assert_eq!(command, "mkiso -o image/boot.iso image/boot/initrd.tar")
      }
      other => panic!("unexpected step {other:?}"),
    }
  }

  #[test]
  fn plan_serializes_with_step_tags() {
    let store = store();
    let mut helper = PlanHelper::new(&store, "image").unwrap();
    helper.initrd(Path::new("image/boot")).unwrap();
    let json = serde_json::to_value(helper.plan()).unwrap();
    assert_eq!(json["steps"][0]["step"], "initrd");
    assert_eq!(json["steps"][0]["output"], "image/boot/initrd.tar");
  }
}
