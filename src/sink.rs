//! Destinations for finished reports.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use log::info;

/// Takes ownership of a finished document.
pub trait ReportSink {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<()>;
}

impl<K: ReportSink + ?Sized> ReportSink for &K {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<()> {
        (**self).save(filename, bytes)
    }
}

/// Writes reports into a directory, creating it when needed.
#[derive(Clone, Debug)]
pub struct DirectorySink {
    directory: PathBuf,
}

impl DirectorySink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Where `filename` would be written.
    pub fn path_for(&self, filename: &str) -> PathBuf {
        self.directory.join(filename)
    }
}

impl ReportSink for DirectorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<()> {
        std::fs::create_dir_all(&self.directory)?;
        let path = self.path_for(filename);
        std::fs::write(&path, bytes)?;
        info!("Wrote {} ({} bytes)", path.display(), bytes.len());
        Ok(())
    }
}

/// Keeps saved reports in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Saved files in save order.
    pub fn files(&self) -> Vec<(String, Vec<u8>)> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn is_empty(&self) -> bool {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_empty()
    }
}

impl ReportSink for MemorySink {
    fn save(&self, filename: &str, bytes: &[u8]) -> io::Result<()> {
        self.files
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((filename.to_owned(), bytes.to_vec()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directory_sink_creates_directory() {
        let root = std::env::temp_dir().join(format!("solar-report-sink-{}", std::process::id()));
        let sink = DirectorySink::new(root.join("nested"));
        sink.save("rapport.pdf", b"%PDF-1.3").expect("saved");

        let written = std::fs::read(sink.path_for("rapport.pdf")).expect("written file");
        assert_eq!(written, b"%PDF-1.3");
        std::fs::remove_dir_all(&root).ok();
    }

    #[test]
    fn memory_sink_keeps_order() {
        let sink = MemorySink::new();
        assert!(sink.is_empty());
        sink.save("a.pdf", b"1").expect("saved");
        (&sink).save("b.pdf", b"2").expect("saved");
        let names: Vec<String> = sink.files().into_iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["a.pdf", "b.pdf"]);
    }
}
