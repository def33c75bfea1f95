use ignore::WalkBuilder;
use recall_code_chunker::ParserRegistry;
use std::path::{Path, PathBuf};

/// Files larger than this are never indexed
pub const MAX_FILE_SIZE_BYTES: u64 = 1024 * 1024;

/// Outcome of a directory scan
#[derive(Debug, Default)]
pub struct ScanResult {
    pub files: Vec<PathBuf>,
    /// Files with a registered language that were too large to index
    pub skipped: usize,
}

/// Finds files of registered languages under a root (.gitignore aware)
pub struct FileScanner<'a> {
    root: PathBuf,
    registry: &'a ParserRegistry,
}

impl<'a> FileScanner<'a> {
    pub fn new(root: impl AsRef<Path>, registry: &'a ParserRegistry) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            registry,
        }
    }

    pub fn scan(&self) -> ScanResult {
        let mut result = ScanResult::default();

        let mut builder = WalkBuilder::new(&self.root);
        builder
            .hidden(true) // do not index hidden files by default
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .require_git(false);

        for entry in builder.build() {
            match entry {
                Ok(entry) => {
                    if !entry.file_type().is_some_and(|t| t.is_file()) {
                        continue;
                    }

                    let path = entry.path();
                    if self.registry.language_for_path(path).is_none() {
                        continue;
                    }

                    if let Ok(meta) = entry.metadata() {
                        if meta.len() > MAX_FILE_SIZE_BYTES {
                            log::debug!(
                                "Skipping large file {} ({} bytes > {})",
                                path.display(),
                                meta.len(),
                                MAX_FILE_SIZE_BYTES
                            );
                            result.skipped += 1;
                            continue;
                        }
                    }

                    result.files.push(path.to_path_buf());
                }
                Err(e) => log::warn!("Failed to read entry: {e}"),
            }
        }

        result.files.sort();
        log::info!("Found {} source files", result.files.len());
        result
    }
}
