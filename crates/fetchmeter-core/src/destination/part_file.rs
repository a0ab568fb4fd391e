//! Sequential writer for the in-progress `.part` file.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use super::temp_path;

/// The `.part` file of one download. Created (truncated) on open; either
/// `finalize`d into the final path or `discard`ed.
pub struct PartFile {
    writer: BufWriter<File>,
    temp_path: PathBuf,
    final_path: PathBuf,
    written: u64,
}

impl PartFile {
    /// Create `<final_path>.part`, overwriting a leftover from an earlier run.
    pub fn create(final_path: &Path) -> io::Result<Self> {
        let temp_path = temp_path(final_path);
        let file = File::options()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)?;
        Ok(Self {
            writer: BufWriter::new(file),
            temp_path,
            final_path: final_path.to_path_buf(),
            written: 0,
        })
    }

    /// Append `data`; returns the total number of bytes written so far.
    pub fn append(&mut self, data: &[u8]) -> io::Result<u64> {
        self.writer.write_all(data)?;
        self.written += data.len() as u64;
        Ok(self.written)
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn temp_path(&self) -> &Path {
        &self.temp_path
    }

    pub fn final_path(&self) -> &Path {
        &self.final_path
    }

    /// Rename to `final_path` instead of the path given at creation.
    pub fn set_final_path(&mut self, final_path: PathBuf) {
        self.final_path = final_path;
    }

    /// Flush, fsync and rename to the final path. On failure the `.part`
    /// file is removed before the error is returned.
    pub fn finalize(self) -> io::Result<PathBuf> {
        let Self {
            writer,
            temp_path,
            final_path,
            ..
        } = self;
        let result = writer
            .into_inner()
            .map_err(|e| e.into_error())
            .and_then(|file| {
                file.sync_all()?;
                drop(file);
                std::fs::rename(&temp_path, &final_path)
            });
        match result {
            Ok(()) => Ok(final_path),
            Err(e) => {
                remove_temp(&temp_path);
                Err(e)
            }
        }
    }

    /// Close and remove the `.part` file.
    pub fn discard(self) {
        let temp_path = self.temp_path.clone();
        drop(self.writer);
        remove_temp(&temp_path);
    }
}

fn remove_temp(temp_path: &Path) {
    if let Err(e) = std::fs::remove_file(temp_path) {
        tracing::warn!(path = %temp_path.display(), "failed to remove partial file: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn append_then_finalize_renames() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("output.bin");

        let mut part = PartFile::create(&final_path).unwrap();
        assert!(part.temp_path().exists());
        assert_eq!(part.append(b"hello ").unwrap(), 6);
        assert_eq!(part.append(b"world").unwrap(), 11);
        assert_eq!(part.written(), 11);

        let tp = part.temp_path().to_path_buf();
        let done = part.finalize().unwrap();
        assert_eq!(done, final_path);
        assert!(!tp.exists());
        assert_eq!(std::fs::read(&final_path).unwrap(), b"hello world");
    }

    #[test]
    fn discard_removes_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("gone.bin");
        let mut part = PartFile::create(&final_path).unwrap();
        part.append(b"partial").unwrap();
        let tp = part.temp_path().to_path_buf();
        part.discard();
        assert!(!tp.exists());
        assert!(!final_path.exists());
    }

    #[test]
    fn create_truncates_leftover() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("again.bin");
        std::fs::write(temp_path(&final_path), b"stale data from before").unwrap();

        let mut part = PartFile::create(&final_path).unwrap();
        part.append(b"new").unwrap();
        part.finalize().unwrap();
        assert_eq!(std::fs::read(&final_path).unwrap(), b"new");
    }

    #[test]
    fn failed_rename_removes_part_file() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("taken");
        std::fs::create_dir(&final_path).unwrap();
        std::fs::write(final_path.join("inside"), b"x").unwrap();

        let mut part = PartFile::create(&final_path).unwrap();
        part.append(b"payload").unwrap();
        let tp = part.temp_path().to_path_buf();
        assert!(part.finalize().is_err());
        assert!(!tp.exists());
        assert!(final_path.join("inside").exists());
    }

    #[test]
    fn finalize_to_new_final_path() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("first.bin");
        let second = dir.path().join("second.bin");

        let mut part = PartFile::create(&first).unwrap();
        part.append(b"abc").unwrap();
        part.set_final_path(second.clone());
        assert_eq!(part.final_path(), second.as_path());
        assert_eq!(part.finalize().unwrap(), second);
        assert!(!first.exists());
        assert!(!temp_path(&first).exists());
        assert_eq!(std::fs::read(&second).unwrap(), b"abc");
    }

    #[test]
    fn create_fails_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let final_path = dir.path().join("no/such/dir/file.bin");
        assert!(PartFile::create(&final_path).is_err());
    }
}
