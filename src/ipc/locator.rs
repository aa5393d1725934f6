use std::ffi::OsString;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_DIR: &str = "/tmp";
pub const DEFAULT_PREFIX: &str = "discord";

/// Discord allocates its socket in one of `<prefix>-ipc-0` .. `<prefix>-ipc-9`.
pub const ENDPOINT_SLOTS: usize = 10;

/// Finds the Discord IPC socket among the fixed set of candidate paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locator {
    base_dir: PathBuf,
    prefix: String,
}

impl Locator {
    pub fn new(base_dir: impl AsRef<Path>, prefix: impl Into<String>) -> Self {
        Self {
            base_dir: base_dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
        }
    }

    /// Locator rooted at `$TMPDIR`, or `/tmp` when unset or empty.
    pub fn from_env(prefix: impl Into<String>) -> Self {
        Self::new(resolve_base_dir(std::env::var_os("TMPDIR")), prefix)
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn candidates(&self) -> impl Iterator<Item = PathBuf> + '_ {
        (0..ENDPOINT_SLOTS).map(move |i| self.slot(i))
    }

    fn slot(&self, index: usize) -> PathBuf {
        self.base_dir.join(format!("{}-ipc-{index}", self.prefix))
    }

    pub fn locate(&self) -> Option<PathBuf> {
        self.candidates().find(|path| path.exists())
    }
}

pub fn resolve_base_dir(value: Option<OsString>) -> PathBuf {
    match value {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => PathBuf::from(DEFAULT_BASE_DIR),
    }
}
