use std::path::{Path, PathBuf};

/// Naming convention for per-chunk intermediate files.
///
/// Artifacts live next to the final output as `<output>.<index>.part`; each
/// is owned exclusively by the worker that writes it until the merge engine
/// consumes it.
pub struct ArtifactSet {
    stem: PathBuf,
}

impl ArtifactSet {
    #[inline]
    pub fn new(output: &Path) -> Self {
        Self { stem: output.to_path_buf() }
    }

    #[must_use]
    pub fn path(&self, index: u64) -> PathBuf {
        let mut name = self.stem.as_os_str().to_os_string();
        name.push(format!(".{index}.part"));
        PathBuf::from(name)
    }

    /// Best-effort removal of every artifact below `count`. Artifacts already
    /// consumed by the merge engine are simply gone.
    pub fn remove_all(&self, count: u64) {
        for index in 0..count {
            let _ = std::fs::remove_file(self.path(index));
        }
    }
}
