/// Model download with redirect handling
pub mod download;
/// Download progress tracking
pub mod progress;

use std::path::{Path, PathBuf};

pub use download::{DownloadError, ModelProvisioner, Provisioned, ProvisionError};
pub use progress::DownloadSession;

/// Model file fetched when no `--model` is given
pub const DEFAULT_MODEL_NAME: &str = "ggml-medium.bin";

/// Model artifact that must exist before the engine runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDescriptor {
    /// Where the engine will read the model from
    pub local_path: PathBuf,
    /// File name on the model host
    pub remote_name: String,
}

impl ModelDescriptor {
    /// Derive the descriptor from a model path; the remote name is its file name
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        let local_path = path.as_ref().to_path_buf();
        let remote_name = local_path
            .file_name()
            .map_or_else(|| DEFAULT_MODEL_NAME.to_owned(), |name| name.to_string_lossy().into_owned());
        Self { local_path, remote_name }
    }
}
