use std::fs::File;
use std::io;
use std::path::Path;
use base64::Engine;
use sha2::{Digest, Sha256};
use zip::ZipArchive;
use crate::error::ArchiveError;

/// Computes a checksum over the entries of a zip archive.
pub trait ArchiveHasher: Send + Sync {
    fn hash_zip(&self, archive: &Path) -> Result<String, ArchiveError>;
}

/// The `h1:` hash: SHA-256 over a sorted summary of per-entry SHA-256 sums.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hash1;

impl ArchiveHasher for Hash1 {
    fn hash_zip(&self, archive: &Path) -> Result<String, ArchiveError> {
        let file = File::open(archive).map_err(|e| ArchiveError::io(archive, e))?;
        let mut zip = ZipArchive::new(file).map_err(|e| ArchiveError::zip(archive, e))?;

        let mut names: Vec<String> = zip.file_names().map(str::to_string).collect();
        names.sort();

        let mut summary = Sha256::new();
        for name in &names {
            if name.contains('\n') {
                return Err(ArchiveError::NewlineInName { name: name.clone() });
            }
            let mut entry = zip.by_name(name).map_err(|e| ArchiveError::zip(archive, e))?;
            let mut hasher = Sha256::new();
            io::copy(&mut entry, &mut hasher).map_err(|e| ArchiveError::io(archive, e))?;
            let line = format!("{}  {}\n", hex::encode(hasher.finalize()), name);
            summary.update(line.as_bytes());
        }
        let digest = summary.finalize();
        Ok(format!("h1:{}", base64::engine::general_purpose::STANDARD.encode(digest)))
    }
}

/// Hash over already-known `(name, contents)` pairs, without an archive on disk.
pub fn hash1_entries<'a, I>(entries: I) -> Result<String, ArchiveError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut entries: Vec<(&str, &[u8])> = entries.into_iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    let mut summary = Sha256::new();
    for (name, contents) in entries {
        if name.contains('\n') {
            return Err(ArchiveError::NewlineInName { name: name.to_string() });
        }
        let line = format!("{}  {}\n", hex::encode(Sha256::digest(contents)), name);
        summary.update(line.as_bytes());
    }
    Ok(format!(
        "h1:{}",
        base64::engine::general_purpose::STANDARD.encode(summary.finalize())
    ))
}
