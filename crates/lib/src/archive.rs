//! Initrd archive assembly.
//!
//! [`pack_dir`] writes a USTAR archive of a directory tree with every entry
//! passed through [`tar_filter`]. Entries are emitted in name order with each
//! directory ahead of its contents, since the kernel's initrd reader creates
//! parents as it encounters them. Headers are written in deterministic mode so
//! identical trees produce identical archives.

use std::fs::File;
use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use tar::{EntryType, Header, HeaderMode};
use tracing::{debug, info};
use walkdir::WalkDir;

/// Files with this suffix never make it into an archive.
pub const IGNORED_SUFFIX: &str = ".DS_Store";

#[derive(Debug, thiserror::Error)]
pub enum ArchiveError {
  #[error("cannot archive {}: {source}", .path.display())]
  Io {
    path: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("failed to traverse directory: {0}")]
  Walk(#[from] walkdir::Error),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> ArchiveError + '_ {
  move |source| ArchiveError::Io {
    path: path.to_path_buf(),
    source,
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
  File,
  Dir,
  Symlink,
}

/// A candidate archive member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
  /// Name inside the archive, `/`-separated and relative to the packed root.
  pub name: String,
  /// Where the entry lives on disk.
  pub path: PathBuf,
  pub kind: EntryKind,
}

/// Decide whether `entry` goes into the archive.
///
/// Regular files ending in [`IGNORED_SUFFIX`] are dropped; everything else is
/// kept unchanged and logged.
pub fn tar_filter(entry: ArchiveEntry) -> Option<ArchiveEntry> {
  if entry.kind == EntryKind::File && entry.name.ends_with(IGNORED_SUFFIX) {
    debug!(name = %entry.name, "skipping");
    return None;
  }

  info!(name = %entry.name, "adding");
  Some(entry)
}

/// Pack the contents of `root` into a USTAR archive at `output`.
///
/// The root directory itself is not an entry. Returns the number of entries
/// written.
pub fn pack_dir(root: &Path, output: &Path) -> Result<usize, ArchiveError> {
  let file = File::create(output).map_err(io_err(output))?;
  let mut builder = tar::Builder::new(BufWriter::new(file));
  let mut count = 0;

  for entry in WalkDir::new(root).min_depth(1).sort_by_file_name() {
    let entry = entry?;
    let Ok(relative) = entry.path().strip_prefix(root) else {
      continue;
    };

    let file_type = entry.file_type();
    let kind = if file_type.is_dir() {
      EntryKind::Dir
    } else if file_type.is_symlink() {
      EntryKind::Symlink
    } else {
      EntryKind::File
    };
    let name = relative
      .components()
      .map(|c| c.as_os_str().to_string_lossy())
      .collect::<Vec<_>>()
      .join("/");

    let Some(entry) = tar_filter(ArchiveEntry {
      name,
      path: entry.path().to_path_buf(),
      kind,
    }) else {
      continue;
    };

    append_entry(&mut builder, &entry)?;
    count += 1;
  }

  let writer = builder.into_inner().map_err(io_err(output))?;
  writer
    .into_inner()
    .map_err(|e| io_err(output)(e.into_error()))?
    .sync_all()
    .map_err(io_err(output))?;

  debug!(output = %output.display(), entries = count, "archive written");
  Ok(count)
}

fn append_entry<W: io::Write>(builder: &mut tar::Builder<W>, entry: &ArchiveEntry) -> Result<(), ArchiveError> {
  let path = entry.path.as_path();
  let metadata = std::fs::symlink_metadata(path).map_err(io_err(path))?;

  let mut header = Header::new_ustar();
  header.set_metadata_in_mode(&metadata, HeaderMode::Deterministic);

  match entry.kind {
    EntryKind::File => {
      let file = File::open(path).map_err(io_err(path))?;
      builder
        .append_data(&mut header, &entry.name, file)
        .map_err(io_err(path))?;
    }
    EntryKind::Dir => {
      header.set_entry_type(EntryType::Directory);
      header.set_size(0);
      builder
        .append_data(&mut header, &entry.name, io::empty())
        .map_err(io_err(path))?;
    }
    EntryKind::Symlink => {
      let target = std::fs::read_link(path).map_err(io_err(path))?;
      header.set_entry_type(EntryType::Symlink);
      header.set_size(0);
      builder
        .append_link(&mut header, &entry.name, &target)
        .map_err(io_err(path))?;
    }
  }
  Ok(())
}
