//! Where a download lands on disk.
//!
//! A request names either an exact file or a directory; for a directory the
//! file name is derived from Content-Disposition or the URL path. Bytes go to
//! `<name>.part` first and are renamed into place only on success.

mod content_disposition;
mod part_file;
mod sanitize;

use std::path::{Path, PathBuf};

pub use content_disposition::filename_from_content_disposition;
pub use part_file::PartFile;
pub use sanitize::sanitize_filename;

/// Fallback when neither the header nor the URL yields a usable name.
pub const DEFAULT_FILENAME: &str = "download.bin";

/// Suffix of the in-progress file.
pub const TEMP_SUFFIX: &str = ".part";

/// Target of a download.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// Write to exactly this path.
    File(PathBuf),
    /// Write into this directory under a derived file name.
    Directory(PathBuf),
}

impl Destination {
    /// Final path for `url`, using `content_disposition` when the name must be derived.
    pub fn resolve(&self, url: &str, content_disposition: Option<&str>) -> PathBuf {
        match self {
            Destination::File(p) => p.clone(),
            Destination::Directory(dir) => dir.join(derive_filename(url, content_disposition)),
        }
    }
}

/// Path of the in-progress file: `file.iso` -> `file.iso.part`.
pub fn temp_path(final_path: &Path) -> PathBuf {
    let mut o = final_path.as_os_str().to_owned();
    o.push(TEMP_SUFFIX);
    PathBuf::from(o)
}

/// Last non-empty path segment of `url`, without query or fragment.
pub fn filename_from_url(url: &str) -> Option<String> {
    let parsed = url::Url::parse(url).ok()?;
    let segment = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;
    Some(segment.to_string())
}

/// Safe file name for `url`: Content-Disposition first, then the URL path,
/// then `download.bin`.
pub fn derive_filename(url: &str, content_disposition: Option<&str>) -> String {
    let candidate = content_disposition
        .and_then(filename_from_content_disposition)
        .or_else(|| filename_from_url(url));

    candidate
        .map(|c| sanitize_filename(&c))
        .filter(|s| !s.is_empty() && s != "." && s != "..")
        .unwrap_or_else(|| DEFAULT_FILENAME.to_string())
}
