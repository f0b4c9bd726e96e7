//! Input archive indexing.
//!
//! The uploaded zip is indexed once per batch. Only files with an image
//! extension are kept, and they are keyed by their lowercased *base* filename,
//! so `shoots/2024/Photo1.JPG` is found by a sheet row reading `photo1.jpg`.
//!
//! Entry data is not read during indexing. [`ArchiveIndex::read`] opens the
//! entry on demand, and [`EntryHandle::size`] reports the uncompressed size
//! from the central directory, which lets the per-image size limit run before
//! any decompression. That size is only what the archive claims, so `read`
//! also stops decompressing once the limit is passed.
//!
//! Two entries with the same lowercased base name (or, for the brand lookup,
//! the same stem) collide; the later one in archive order wins and the
//! collision is logged.

use crate::spec_sheet::{ResizeMode, has_image_extension};
use log::{debug, warn};
use std::collections::HashMap;
use std::io::{Cursor, Read};
use std::sync::Arc;
use thiserror::Error;
use zip::ZipArchive;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to read archive: {0}")]
    Zip(#[from] zip::result::ZipError),
    #[error("Failed to read archive entry {name}: {source}")]
    Entry {
        name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Archive entry {name} inflates past {limit} bytes")]
    OverLimit { name: String, limit: u64, read: u64 },
}

/// Opaque reference to one image entry inside the indexed archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryHandle {
    index: usize,
    name: String,
    size: u64,
}

impl EntryHandle {
    /// Full path of the entry inside the archive.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncompressed size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Immutable lookup table from base filename to archive entry.
#[derive(Debug)]
pub struct ArchiveIndex {
    data: Arc<[u8]>,
    by_name: HashMap<String, EntryHandle>,
    by_stem: HashMap<String, EntryHandle>,
}

/// Final path segment of an entry name.
fn base_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Base name without its extension.
fn stem(base: &str) -> &str {
    base.rsplit_once('.').map(|(s, _)| s).unwrap_or(base)
}

impl ArchiveIndex {
    /// Enumerate the archive and index every image entry.
    pub fn build(data: impl Into<Arc<[u8]>>) -> Result<Self, ArchiveError> {
        let data = data.into();
        let mut archive = ZipArchive::new(Cursor::new(Arc::clone(&data)))?;

        let mut by_name = HashMap::new();
        let mut by_stem = HashMap::new();

        for i in 0..archive.len() {
            let entry = archive.by_index_raw(i)?;
            if entry.is_dir() {
                continue;
            }
            let name = entry.name().to_string();
            let base = base_name(&name);
            if base.is_empty() || !has_image_extension(base) {
                continue;
            }

            let key = base.to_lowercase();
            let handle = EntryHandle {
                index: i,
                name: name.clone(),
                size: entry.size(),
            };
            if let Some(previous) = by_name.insert(key.clone(), handle.clone()) {
                warn!(
                    "Archive entries {} and {} share the name {key}; using {}",
                    previous.name, name, name
                );
            }
            let entry_stem = stem(&key).to_string();
            if let Some(previous) = by_stem.insert(entry_stem.clone(), handle) {
                // Same-name collisions were already reported above
                if base_name(&previous.name).to_lowercase() != key {
                    warn!(
                        "Archive entries {} and {} share the stem {entry_stem}; using {}",
                        previous.name, name, name
                    );
                }
            }
        }

        debug!("Indexed {} image entries", by_name.len());
        Ok(Self {
            data,
            by_name,
            by_stem,
        })
    }

    /// Number of distinct indexed images.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Find the entry for a sheet key.
    ///
    /// Matches the lowercased key against base filenames. Brand keys are
    /// variant tags without an extension, so brand mode also tries the
    /// filename stem (`Full Black` → `full black.png`).
    pub fn lookup(&self, key: &str, mode: ResizeMode) -> Option<&EntryHandle> {
        let key = key.to_lowercase();
        self.by_name.get(&key).or_else(|| match mode {
            ResizeMode::Brand => self.by_stem.get(&key),
            ResizeMode::Constrained | ResizeMode::File => None,
        })
    }

    /// Read and decompress one entry, inflating at most `max_bytes`.
    ///
    /// Returns [`ArchiveError::OverLimit`] when the entry holds more than
    /// `max_bytes`, whatever size its header declares.
    pub fn read(&self, handle: &EntryHandle, max_bytes: u64) -> Result<Vec<u8>, ArchiveError> {
        let mut archive = ZipArchive::new(Cursor::new(Arc::clone(&self.data)))?;
        let entry = archive.by_index(handle.index)?;
        let capacity = handle.size.min(max_bytes).min(64 * 1024 * 1024);
        let mut bytes = Vec::with_capacity(capacity as usize);
        entry
            .take(max_bytes.saturating_add(1))
            .read_to_end(&mut bytes)
            .map_err(|source| ArchiveError::Entry {
                name: handle.name.clone(),
                source,
            })?;

        let read = bytes.len() as u64;
        if read > max_bytes {
            return Err(ArchiveError::OverLimit {
                name: handle.name.clone(),
                limit: max_bytes,
                read,
            });
        }
        Ok(bytes)
    }
}
