//! Hugo page bundle reader and writer.
//!
//! A bundle is a directory holding `index.md` plus the images it references:
//!
//! ```text
//! content/posts/
//! └── 20240501_12/
//!     ├── index.md
//!     └── image-1-3f2a9c01.png
//! ```
//!
//! The reader only lists file names and reads `index.md`; image bytes on disk
//! are never compared.

use std::fs;
use std::io;
use std::path::Path;

use walkdir::WalkDir;

use super::model::{ExistingBundle, OutputBundle, INDEX_FILE};
use crate::error::Issue2HugoError;

/// Files touched by a bundle write.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PersistStats {
    pub images_written: usize,
    pub images_removed: usize,
}

/// Reads the current state of a bundle directory.
///
/// Returns `Ok(None)` when the directory does not exist.
pub fn read_existing(dir: &Path) -> Result<Option<ExistingBundle>, Issue2HugoError> {
    if !dir.is_dir() {
        return Ok(None);
    }

    let mut existing = ExistingBundle::default();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|err| Issue2HugoError::Io(io::Error::other(err.to_string())))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        if name == INDEX_FILE {
            existing.document = Some(fs::read(entry.path())?);
        } else {
            existing.files.insert(name);
        }
    }

    Ok(Some(existing))
}

/// Persists a bundle, reusing whatever already exists on disk.
///
/// New images are written first and `index.md` after them, so a partial
/// failure never leaves a document pointing at missing files. Stale resolver
/// images are pruned only once the new document is in place. Images already
/// present by name are left alone.
///
/// # Errors
/// Any filesystem failure aborts the write and is reported as
/// [`Issue2HugoError::Persist`].
pub fn write_bundle(
    bundle: &OutputBundle,
    existing: Option<&ExistingBundle>,
) -> Result<PersistStats, Issue2HugoError> {
    let persist_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source| Issue2HugoError::Persist { path, source }
    };

    fs::create_dir_all(&bundle.dir).map_err(persist_err(&bundle.dir))?;

    let mut stats = PersistStats::default();

    for (name, bytes) in &bundle.images {
        if existing.is_some_and(|e| e.files.contains(name)) {
            continue;
        }
        let path = bundle.dir.join(name);
        fs::write(&path, bytes).map_err(persist_err(&path))?;
        stats.images_written += 1;
    }

    let index = bundle.index_path();
    fs::write(&index, &bundle.document).map_err(persist_err(&index))?;

    if let Some(existing) = existing {
        for stale in existing
            .image_files()
            .filter(|name| !bundle.images.contains_key(*name))
        {
            let path = bundle.dir.join(stale);
            fs::remove_file(&path).map_err(persist_err(&path))?;
            stats.images_removed += 1;
        }
    }

    Ok(stats)
}
