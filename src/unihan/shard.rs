//! Serialization of paginated gloss fields into independently fetchable
//! JSON shards, with optional precompressed sidecars.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use flate2::Compression;
use flate2::write::GzEncoder;
use rayon::prelude::*;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::{Error, Result};

use super::field::UnihanField;
use super::lookup::CodepointValues;
use super::paginate::FieldPages;

/// File naming for shards: `{prefix}_{field}_{page:04}.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardNaming {
    pub prefix: String,
}

impl Default for ShardNaming {
    fn default() -> Self {
        Self {
            prefix: "unihan".to_string(),
        }
    }
}

impl ShardNaming {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn file_name(&self, field: &UnihanField, page: u32) -> String {
        format!(
            "{}_{}_{page:04}.json",
            sanitize(&self.prefix),
            sanitize(field.name())
        )
    }
}

/// Field names come from the data file, so keep them to a safe alphabet.
/// Any other byte becomes `~XX` (uppercase hex), which keeps distinct names
/// distinct.
fn sanitize(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for &b in name.as_bytes() {
        if b.is_ascii_alphanumeric() || b == b'-' || b == b'_' {
            out.push(b as char);
        } else {
            out.push_str(&format!("~{b:02X}"));
        }
    }
    out
}

/// A serialized page ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShardFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

/// JSON object of decimal codepoint → values, in ascending numeric order.
struct PageJson<'a>(&'a CodepointValues);

impl Serialize for PageJson<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (codepoint, values) in self.0 {
            map.serialize_entry(&codepoint.value().to_string(), values)?;
        }
        map.end()
    }
}

/// Serialize a page to its canonical JSON bytes.
pub fn page_json(page: &CodepointValues) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(&PageJson(page))?)
}

/// One [`ShardFile`] per (field, page) pair, in field then page order.
pub fn serialize_pages(pages: &FieldPages, naming: &ShardNaming) -> Result<Vec<ShardFile>> {
    let mut files = Vec::with_capacity(pages.page_count());
    for (field, dict) in pages.iter() {
        for (index, page) in dict.pages() {
            files.push(ShardFile {
                name: naming.file_name(field, index),
                bytes: page_json(page)?,
            });
        }
    }
    Ok(files)
}

/// Output options for [`write_shards`].
#[derive(Debug, Clone)]
pub struct ShardConfig {
    pub naming: ShardNaming,
    /// Write a `.gz` sidecar next to each shard.
    pub gzip: bool,
    /// Write a `.br` sidecar next to each shard.
    pub brotli: bool,
    /// Brotli quality, 0-11.
    pub brotli_quality: u32,
    /// Worker count; `None` uses all cores, larger values are clamped.
    pub threads: Option<usize>,
}

impl Default for ShardConfig {
    fn default() -> Self {
        Self {
            naming: ShardNaming::default(),
            gzip: false,
            brotli: false,
            brotli_quality: 9,
            threads: None,
        }
    }
}

impl ShardConfig {
    pub fn with_naming(mut self, naming: ShardNaming) -> Self {
        self.naming = naming;
        self
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn with_brotli(mut self, brotli: bool) -> Self {
        self.brotli = brotli;
        self
    }

    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// Resolve the worker count against the available cores.
    pub fn effective_threads(&self) -> usize {
        let cores = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.threads.map(|n| n.clamp(1, cores)).unwrap_or(cores)
    }
}

/// Shared flag that stops outstanding shard jobs.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// What [`write_shards`] produced.
#[derive(Debug, Clone, Default)]
pub struct ShardReport {
    /// Canonical JSON files written, in shard order.
    pub files: Vec<PathBuf>,
    /// Sidecar files written.
    pub sidecars: usize,
    /// Shards not written because the job was cancelled.
    pub skipped: usize,
    pub cancelled: bool,
}

/// Write every page of `pages` to `dir` on a bounded worker pool.
///
/// Each shard is written to a temporary name and renamed into place, then its
/// sidecars are compressed from the same bytes. Cancelling leaves the shards
/// already written in place; each is complete on its own.
pub fn write_shards(
    pages: &FieldPages,
    dir: &Path,
    config: &ShardConfig,
    cancel: &CancelToken,
) -> Result<ShardReport> {
    write_shards_with(pages, dir, config, cancel, |_| {})
}

/// [`write_shards`] with a hook called after each shard and its sidecars
/// are in place.
fn write_shards_with<F>(
    pages: &FieldPages,
    dir: &Path,
    config: &ShardConfig,
    cancel: &CancelToken,
    on_shard: F,
) -> Result<ShardReport>
where
    F: Fn(&Path) + Sync,
{
    fs::create_dir_all(dir)?;
    let files = serialize_pages(pages, &config.naming)?;
    let threads = config.effective_threads();

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build()
        .map_err(io::Error::other)?;

    let sidecars = AtomicUsize::new(0);
    let written: Vec<Option<PathBuf>> = pool.install(|| {
        files
            .par_iter()
            .map(|file| {
                if cancel.is_cancelled() {
                    return Ok(None);
                }
                let path = dir.join(&file.name);
                write_atomic(&path, &file.bytes)?;
                if config.gzip {
                    write_atomic(&sidecar_path(&path, "gz"), &gzip(&file.bytes)?)?;
                    sidecars.fetch_add(1, Ordering::Relaxed);
                }
                if config.brotli {
                    let compressed = brotli_compress(&file.bytes, config.brotli_quality)?;
                    write_atomic(&sidecar_path(&path, "br"), &compressed)?;
                    sidecars.fetch_add(1, Ordering::Relaxed);
                }
                on_shard(&path);
                Ok(Some(path))
            })
            .collect::<Result<Vec<_>>>()
    })?;

    let total = written.len();
    let files: Vec<PathBuf> = written.into_iter().flatten().collect();
    let report = ShardReport {
        skipped: total - files.len(),
        cancelled: cancel.is_cancelled(),
        sidecars: sidecars.into_inner(),
        files,
    };

    tracing::info!(
        shards = report.files.len(),
        sidecars = report.sidecars,
        skipped = report.skipped,
        threads,
        dir = %dir.display(),
        "wrote gloss shards"
    );
    Ok(report)
}

/// Write through a sibling temp file so readers never see a partial shard.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let file_name = path
        .file_name()
        .ok_or_else(|| Error::InvalidArgument(format!("not a file path: {}", path.display())))?;
    let mut tmp_name = std::ffi::OsString::from(".");
    tmp_name.push(file_name);
    tmp_name.push(".tmp");
    let tmp = path.with_file_name(tmp_name);

    let result = fs::write(&tmp, bytes).and_then(|()| fs::rename(&tmp, path));
    if result.is_err() {
        let _ = fs::remove_file(&tmp);
    }
    Ok(result?)
}

fn sidecar_path(path: &Path, extension: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(".");
    name.push(extension);
    PathBuf::from(name)
}

fn gzip(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::best());
    encoder.write_all(bytes)?;
    Ok(encoder.finish()?)
}

fn brotli_compress(bytes: &[u8], quality: u32) -> Result<Vec<u8>> {
    let mut writer = brotli::CompressorWriter::new(Vec::new(), 4096, quality.min(11), 22);
    writer.write_all(bytes)?;
    Ok(writer.into_inner())
}
