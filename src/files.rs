use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Extensions treated as audio, matched case-sensitively
pub const AUDIO_EXTENSIONS: &[&str] = &["mp3", "ogg", "wav", "flac"];

/// What the path argument expanded to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedTarget {
    /// A single file, dispatched even when its extension is unsupported
    File {
        /// The file
        path: PathBuf,
        /// Whether the extension is in [`AUDIO_EXTENSIONS`]
        supported: bool,
    },
    /// Audio files found under a directory, sorted; may be empty
    Directory(Vec<PathBuf>),
}

impl ResolvedTarget {
    /// Files to hand to the engine, in dispatch order
    pub fn files(&self) -> &[PathBuf] {
        match self {
            Self::File { path, .. } => std::slice::from_ref(path),
            Self::Directory(files) => files,
        }
    }
}

/// Whether `path` has one of the supported audio extensions
pub fn is_audio_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| AUDIO_EXTENSIONS.contains(&ext))
}

/// Expand the target path into the files to transcribe
///
/// Directories are searched recursively and the matches sorted by path bytes.
/// A single file with an unsupported extension is logged and still returned.
///
/// # Errors
/// Returns error if the target or a directory below it cannot be read
pub fn resolve(target: &Path) -> Result<ResolvedTarget> {
    let metadata = fs::metadata(target)
        .with_context(|| format!("failed to read {}", target.display()))?;

    if metadata.is_dir() {
        let mut files = Vec::new();
        collect_audio_files(target, &mut files)?;
        files.sort_by(|a, b| a.as_os_str().cmp(b.as_os_str()));

        tracing::debug!(
            dir = %target.display(),
            count = files.len(),
            "resolved audio files"
        );
        return Ok(ResolvedTarget::Directory(files));
    }

    let supported = is_audio_file(target);
    if !supported {
        tracing::warn!(path = %target.display(), "unsupported filetype");
    }

    Ok(ResolvedTarget::File {
        path: target.to_path_buf(),
        supported,
    })
}

fn collect_audio_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<()> {
    let entries = fs::read_dir(dir)
        .with_context(|| format!("failed to read directory {}", dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", dir.display()))?;
        let path = entry.path();
        let file_type = match entry.file_type() {
            Ok(file_type) => file_type,
            Err(e) => {
                tracing::warn!("skipping {}: {}", path.display(), e);
                continue;
            }
        };

        if file_type.is_dir() {
            // An unreadable subdirectory only loses its own files
            if let Err(e) = collect_audio_files(&path, files) {
                tracing::warn!("skipping {}: {:#}", path.display(), e);
            }
        } else if is_audio_file(&path) && (file_type.is_file() || path.is_file()) {
            // Symlinked files count, symlinked directories are not descended
            files.push(path);
        }
    }

    Ok(())
}
