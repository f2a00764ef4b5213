use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Abstract interface for file system operations.
pub trait FileSystem: Send + Sync {
    /// Read the entire contents of a file into a string.
    fn read_to_string(&self, path: &Path) -> std::io::Result<String>;

    /// Read the entire contents of a file as bytes.
    fn read_all(&self, path: &Path) -> std::io::Result<Vec<u8>>;

    /// Replace the contents of a file, creating parent directories as needed.
    /// Readers never observe a partially written file.
    fn write_all(&self, path: &Path, contents: &[u8]) -> std::io::Result<()>;

    fn exists(&self, path: &Path) -> bool;

    /// List all files with the given extension under the root directory.
    /// This should be a recursive search. Directories named in `ignore_dirs`
    /// are not descended into.
    fn list_files(&self, root: &Path, extension: &str, ignore_dirs: &[String]) -> Vec<PathBuf>;
}

/// Standard implementation of FileSystem using std::fs and walkdir.
pub struct PhysicalFileSystem;

impl FileSystem for PhysicalFileSystem {
    fn read_to_string(&self, path: &Path) -> std::io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn read_all(&self, path: &Path) -> std::io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn write_all(&self, path: &Path, contents: &[u8]) -> std::io::Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        // Write next to the target, then rename over it
        let mut staging = path.as_os_str().to_owned();
        staging.push(".tmp");
        let staging = PathBuf::from(staging);
        std::fs::write(&staging, contents)?;
        std::fs::rename(&staging, path)
    }

    fn exists(&self, path: &Path) -> bool {
        path.exists()
    }

    fn list_files(&self, root: &Path, extension: &str, ignore_dirs: &[String]) -> Vec<PathBuf> {
        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .follow_links(true)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                e.depth() == 0
                    || !e.file_type().is_dir()
                    || !ignore_dirs
                        .iter()
                        .any(|ignored| e.file_name().to_string_lossy() == ignored.as_str())
            })
            .filter_map(|e| e.ok())
        {
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext == extension {
                        files.push(path.to_path_buf());
                    }
                }
            }
        }

        files
    }
}
