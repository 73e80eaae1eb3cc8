use std::path::{Path, PathBuf};

/// Delete every artifact matching `patterns` (relative to `dir`, glob allowed).
///
/// Missing files are not an error, so calling this repeatedly is harmless.
/// Other failures are logged, never returned. Returns the number of removed files.
pub fn cleanup_artifacts(dir: impl AsRef<Path>, patterns: &[String]) -> usize {
    let dir = dir.as_ref();
    let mut removed = 0;
    for pattern in patterns {
        let paths = match fsutil::glob_in_dir(dir, pattern) {
            Ok(paths) => paths,
            Err(e) => {
                log::warn!("Skip cleaning '{}': {}", pattern, e);
                continue;
            }
        };
        for path in paths {
            match fsutil::remove_file_if_exists(&path) {
                Ok(true) => {
                    log::debug!("Removed {}", path.to_string_lossy());
                    removed += 1;
                }
                Ok(false) => (),
                Err(e) => log::warn!("{}", e),
            }
        }
    }
    removed
}

/// Scoped owner of a language's build artifacts: they are deleted when the
/// guard goes out of scope, whichever way the benchmark of the pair ended.
#[derive(Debug)]
pub struct ArtifactGuard {
    dir: PathBuf,
    patterns: Vec<String>,
}

impl ArtifactGuard {
    pub fn new(dir: impl Into<PathBuf>, patterns: &[String]) -> Self {
        Self {
            dir: dir.into(),
            patterns: patterns.to_vec(),
        }
    }
}

impl Drop for ArtifactGuard {
    fn drop(&mut self) {
        if !self.patterns.is_empty() {
            self::cleanup_artifacts(&self.dir, &self.patterns);
        }
    }
}
