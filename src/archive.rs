use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use walkdir::WalkDir;
use zip::{ZipArchive, ZipWriter};
use crate::dirhash::ArchiveHasher;
use crate::error::ArchiveError;

/// Returns the checksum sidecar for an archive: `v1.0.0.zip` -> `v1.0.0.ziphash`.
pub fn hash_sidecar(archive: &Path) -> PathBuf {
    let mut name = OsString::from(archive.as_os_str());
    name.push("hash");
    PathBuf::from(name)
}

/// Writes a copy of the module archive `src` to `dst` with its entries renamed
/// from `canonical` to `private`.
///
/// The first occurrence of `canonical` in every entry name is replaced; entry
/// data is copied raw, so contents stay byte-identical. The renamed archive is
/// staged next to `dst` and hashed there. The `.ziphash` sidecar is published
/// first, then the archive is renamed into place, so `dst` only ever holds a
/// complete, renamed archive. `src` and `dst` may be the same file.
///
/// # Errors
///
/// Returns an [`ArchiveError`] if the archive can't be read, written or hashed.
/// `dst` is left untouched unless the final rename succeeded.
pub fn rewrite_zip(
    src: &Path,
    dst: &Path,
    canonical: &str,
    private: &str,
    hasher: &dyn ArchiveHasher,
) -> Result<(), ArchiveError> {
    let dir = dst.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| ArchiveError::io(dir, e))?;
    let tmp_path = tmp.path().to_path_buf();
    {
        let file = File::open(src).map_err(|e| ArchiveError::io(src, e))?;
        let mut reader = ZipArchive::new(file).map_err(|e| ArchiveError::zip(src, e))?;
        let mut writer = ZipWriter::new(tmp.as_file_mut());
        for i in 0..reader.len() {
            let entry = reader.by_index_raw(i).map_err(|e| ArchiveError::zip(src, e))?;
            let name = entry.name().replacen(canonical, private, 1);
            writer
                .raw_copy_file_rename(entry, name)
                .map_err(|e| ArchiveError::zip(&tmp_path, e))?;
        }
        writer.finish().map_err(|e| ArchiveError::zip(&tmp_path, e))?;
    }

    let hash = hasher.hash_zip(&tmp_path)?;
    let sidecar = hash_sidecar(dst);
    let mut sidecar_tmp = NamedTempFile::new_in(dir).map_err(|e| ArchiveError::io(dir, e))?;
    sidecar_tmp
        .write_all(hash.as_bytes())
        .map_err(|e| ArchiveError::io(&sidecar, e))?;
    sidecar_tmp.persist(&sidecar).map_err(|e| ArchiveError::io(&sidecar, e.error))?;
    tmp.persist(dst).map_err(|e| ArchiveError::io(dst, e.error))?;
    debug!(archive = %dst.display(), canonical, private, "archive rewritten");
    Ok(())
}

/// Copies the cached tree of `canonical` into the tree of `private`,
/// renaming the entries of module archives on the way.
///
/// Files are copied like `cp -u`: only when missing or older at the
/// destination. Archives under `@v` are never copied verbatim: each one is
/// rewritten from the canonical archive straight into place, together with a
/// fresh `.ziphash`, so the canonical sidecars are not copied either. Returns
/// the archives written in this pass.
///
/// A failure aborts the mirror. Everything published before it is complete,
/// and a later pass picks up whatever is still missing or stale. Concurrent
/// passes over the same tree produce the same files.
pub fn mirror_module(
    src_dir: &Path,
    dst_dir: &Path,
    canonical: &str,
    private: &str,
    hasher: &dyn ArchiveHasher,
) -> Result<Vec<PathBuf>, ArchiveError> {
    if !dst_dir.exists() {
        fs::create_dir_all(dst_dir).map_err(|e| ArchiveError::io(dst_dir, e))?;
    }
    let version_dir = dst_dir.join("@v");
    let mut archives = Vec::new();

    // dst may live below src when the private path extends the canonical one
    let dst_inside_src = dst_dir != src_dir && dst_dir.starts_with(src_dir);
    let walker = WalkDir::new(src_dir)
        .into_iter()
        .filter_entry(|e| !(dst_inside_src && e.path().starts_with(dst_dir)));
    for entry in walker {
        let entry = entry.map_err(|source| ArchiveError::Walk {
            path: src_dir.to_path_buf(),
            source,
        })?;
        let Ok(rel) = entry.path().strip_prefix(src_dir) else {
            continue;
        };
        let target = dst_dir.join(rel);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(|e| ArchiveError::io(&target, e))?;
            continue;
        }
        if !entry.file_type().is_file() {
            continue;
        }
        let in_version_dir = target.parent() == Some(version_dir.as_path());
        match target.extension().and_then(|ext| ext.to_str()) {
            // written alongside its archive
            Some("ziphash") if in_version_dir => continue,
            Some("zip") if in_version_dir => {
                if is_stale(entry.path(), &target)? {
                    rewrite_zip(entry.path(), &target, canonical, private, hasher)?;
                    archives.push(target);
                }
            }
            _ => {
                if is_stale(entry.path(), &target)? {
                    copy_file(entry.path(), &target)?;
                }
            }
        }
    }

    info!(canonical, private, archives = archives.len(), "module mirrored");
    Ok(archives)
}

fn is_stale(src: &Path, dst: &Path) -> Result<bool, ArchiveError> {
    let dst_meta = match fs::metadata(dst) {
        Ok(meta) => meta,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(true),
        Err(e) => return Err(ArchiveError::io(dst, e)),
    };
    let src_meta = fs::metadata(src).map_err(|e| ArchiveError::io(src, e))?;
    match (src_meta.modified(), dst_meta.modified()) {
        (Ok(src_time), Ok(dst_time)) => Ok(src_time > dst_time),
        _ => Ok(true),
    }
}

fn copy_file(src: &Path, dst: &Path) -> Result<(), ArchiveError> {
    let dir = dst.parent().unwrap_or_else(|| Path::new("."));
    let tmp = NamedTempFile::new_in(dir).map_err(|e| ArchiveError::io(dir, e))?;
    fs::copy(src, tmp.path()).map_err(|e| ArchiveError::io(src, e))?;
    tmp.persist(dst).map_err(|e| ArchiveError::io(dst, e.error))?;
    Ok(())
}
