//! Cache archives: gzip-compressed tarballs of a directory's contents

use crate::error::{ActionError, ActionResult};
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File};
use std::path::Path;
use tar::{Archive, Builder};
use tracing::debug;

/// Archive the contents of `src_dir` into `dst_file`.
///
/// Symlinks are stored as links; mise's installs directory relies on them.
pub fn create_archive(src_dir: &Path, dst_file: &Path) -> ActionResult<u64> {
    debug!("Archiving {} to {}", src_dir.display(), dst_file.display());

    let file = File::create(dst_file)
        .map_err(|e| ActionError::io(format!("creating archive {}", dst_file.display()), e))?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);
    builder.follow_symlinks(false);

    builder
        .append_dir_all(".", src_dir)
        .map_err(|e| ActionError::io(format!("archiving {}", src_dir.display()), e))?;

    let encoder = builder
        .into_inner()
        .map_err(|e| ActionError::io("finalizing tar archive", e))?;
    encoder
        .finish()
        .map_err(|e| ActionError::io("finishing gzip stream", e))?;

    let size = fs::metadata(dst_file)
        .map_err(|e| ActionError::io(format!("reading {}", dst_file.display()), e))?
        .len();
    debug!("Archive size: {} bytes", size);
    Ok(size)
}

/// Unpack `archive` over `dest_dir`, creating it if needed
pub fn extract_archive(archive: &Path, dest_dir: &Path) -> ActionResult<()> {
    debug!("Extracting {} to {}", archive.display(), dest_dir.display());

    fs::create_dir_all(dest_dir)
        .map_err(|e| ActionError::io(format!("creating {}", dest_dir.display()), e))?;

    let file = File::open(archive)
        .map_err(|e| ActionError::io(format!("opening archive {}", archive.display()), e))?;
    let mut archive = Archive::new(GzDecoder::new(file));
    archive.set_preserve_permissions(true);
    archive.set_overwrite(true);
    archive
        .unpack(dest_dir)
        .map_err(|e| ActionError::io(format!("extracting into {}", dest_dir.display()), e))
}
