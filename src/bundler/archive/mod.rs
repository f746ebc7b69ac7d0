//! Bundle archive assembly.
//!
//! A bundle is one zip file holding two kinds of entries:
//!
//! - raw theme files selected by the fixed [`RAW_PATTERNS`] allowlist
//! - JSON documents generated from producer results ([`GeneratedEntries`])
//!
//! Entries are written by a single blocking task, one after another. The
//! archive is closed and flushed before its size is measured for the
//! [`SizePolicy`].

mod generated;
mod patterns;
mod size;

pub use generated::{
    GeneratedEntries, MANIFEST, PARSED_LANG, PARSED_SCSS_DIR, PARSED_TEMPLATES_DIR, SCHEMA,
    SCHEMA_TRANSLATIONS, template_sizes,
};
pub use patterns::{RAW_PATTERNS, RawPattern, collect_raw_entries};
pub use size::{MAX_BUNDLE_BYTES, MAX_TEMPLATE_BYTES, SizePolicy, SizeReport};

use crate::bundler::{Error, Result, collaborators::ParsedTemplate, error::ErrorExt};
use std::{
    collections::HashMap,
    fs::File,
    io::Write,
    path::{Path, PathBuf},
};
use zip::{CompressionMethod, DateTime, ZipWriter, write::SimpleFileOptions};

/// Content of an archive entry.
#[derive(Debug, Clone)]
pub enum EntrySource {
    /// Copied from a file on disk.
    File(PathBuf),
    /// Generated in memory.
    Bytes(Vec<u8>),
    /// Parsed template, serialized as JSON while it is written.
    Template(ParsedTemplate),
}

/// One file in the archive.
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Archive-relative path with unix separators.
    pub name: String,
    /// Entry content.
    pub source: EntrySource,
}

/// Entry options shared by every file.
///
/// The timestamp is pinned so identical inputs produce identical archives.
fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(DateTime::default())
}

/// A finished archive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WrittenArchive {
    /// Size of the closed archive file.
    pub total_bytes: u64,
    /// Uncompressed size of every entry, by entry name.
    pub entry_sizes: HashMap<String, u64>,
}

fn write_entries(path: &Path, entries: &[ArchiveEntry]) -> Result<WrittenArchive> {
    let file = File::create(path).fs_context("creating bundle archive", path)?;
    let mut zip = ZipWriter::new(file);
    let options = entry_options();
    let mut entry_sizes = HashMap::with_capacity(entries.len());
    let mut buffer = Vec::new();

    for entry in entries {
        zip.start_file(entry.name.as_str(), options)?;
        let len = match &entry.source {
            EntrySource::File(source) => {
                let mut input = File::open(source).fs_context("opening theme file", source)?;
                std::io::copy(&mut input, &mut zip).fs_context("copying theme file", source)?
            }
            EntrySource::Bytes(bytes) => {
                zip.write_all(bytes)
                    .fs_context("writing generated entry", path)?;
                bytes.len() as u64
            }
            EntrySource::Template(template) => {
                buffer.clear();
                template.write_json(&mut buffer)?;
                zip.write_all(&buffer)
                    .fs_context("writing parsed template", path)?;
                buffer.len() as u64
            }
        };
        entry_sizes.insert(entry.name.clone(), len);
    }

    let file = zip.finish()?;
    file.sync_all().fs_context("flushing bundle archive", path)?;
    drop(file);

    let total_bytes = std::fs::metadata(path)
        .fs_context("reading bundle metadata", path)?
        .len();
    Ok(WrittenArchive {
        total_bytes,
        entry_sizes,
    })
}

/// Writes `entries` to a new archive at `path`.
///
/// The archive size is measured only after the archive has been finished and
/// the file closed. An existing file at `path` is replaced.
pub async fn write_archive(path: &Path, entries: Vec<ArchiveEntry>) -> Result<WrittenArchive> {
    let path = path.to_path_buf();
    log::info!("Writing {} entries to {}", entries.len(), path.display());

    // Offload blocking zip writing to dedicated thread pool
    tokio::task::spawn_blocking(move || write_entries(&path, &entries))
        .await
        .map_err(|e| Error::GenericError(format!("Archive writer task panicked: {}", e)))?
}
