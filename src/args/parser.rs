use std::path::{Component, Path, PathBuf};

use thiserror::Error;

use super::registry::REGISTRY;
use crate::model::ModelDescriptor;

/// Canonical name of the flag that selects the model file
pub const MODEL_FLAG: &str = "--model";

/// Errors in the user's invocation
#[derive(Debug, Error)]
pub enum UsageError {
    /// No tokens at all, so no path argument
    #[error("you must provide a path as the final argument")]
    MissingPath,

    /// The path argument could not be made absolute
    #[error("invalid path {path}: {source}")]
    InvalidPath {
        /// Path as typed
        path: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The path argument does not exist on disk
    #[error("the file at {} does not exist", .path.display())]
    PathNotFound {
        /// Absolute path that was checked
        path: PathBuf,
    },

    /// A value flag was the last token before the path
    #[error("you must provide a value for argument {flag}")]
    MissingValue {
        /// Canonical flag name
        flag: &'static str,
    },

    /// A value flag was followed by something that looks like another flag
    #[error("a value was expected for argument {flag}, received {value}")]
    ValueLooksLikeFlag {
        /// Canonical flag name
        flag: &'static str,
        /// The offending token
        value: String,
    },
}

/// Value held for a canonical flag
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlagValue {
    /// Boolean toggle switched on
    Enabled,
    /// Flag with an argument
    Value(String),
}

/// Flags keyed by canonical name, kept in first-insertion order
///
/// Overwriting an existing flag keeps its original position, so defaults are
/// emitted before flags that only appear on the command line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlagSet {
    entries: Vec<(String, FlagValue)>,
}

impl FlagSet {
    /// Empty set
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Set `name`, replacing any previous value in place
    pub fn set(&mut self, name: impl Into<String>, value: FlagValue) {
        let name = name.into();
        if let Some(entry) = self.entries.iter_mut().find(|(key, _)| *key == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Builder-style [`FlagSet::set`]
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: FlagValue) -> Self {
        self.set(name, value);
        self
    }

    /// Current value of `name`
    pub fn get(&self, name: &str) -> Option<&FlagValue> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value)
    }

    /// Iterate in emission order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &FlagValue)> {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Number of flags
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no flag is set
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Flatten into engine arguments: toggles emit their name, value flags
    /// emit name then value
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::with_capacity(self.entries.len() * 2);
        for (name, value) in &self.entries {
            args.push(name.clone());
            if let FlagValue::Value(value) = value {
                args.push(value.clone());
            }
        }
        args
    }
}

/// Flags applied unless the invocation overrides them
pub fn default_flags(model_path: &Path) -> FlagSet {
    let value = |v: &str| FlagValue::Value(v.to_owned());
    FlagSet::new()
        .with(MODEL_FLAG, FlagValue::Value(model_path.display().to_string()))
        .with("--language", value("en"))
        .with("--temperature", value("0.1"))
        .with("--best-of", value("2"))
        .with("--beam-size", value("2"))
        .with("--word-thold", value("0.01"))
        .with("--entropy-thold", value("2.4"))
        .with("--logprob-thold", value("-1.0"))
        .with("--no-fallback", FlagValue::Enabled)
        .with("--output-txt", FlagValue::Enabled)
        .with("--output-srt", FlagValue::Enabled)
}

/// A validated invocation, ready for provisioning and dispatch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedInvocation {
    /// Absolute path of the existing file or directory to transcribe
    pub target: PathBuf,
    /// Merged flags, before flattening
    pub flags: FlagSet,
    /// Model named by `--model`, if any
    pub model: Option<ModelDescriptor>,
    /// Tokens that matched no registry flag, in input order
    pub ignored: Vec<String>,
}

impl ParsedInvocation {
    /// Canonical argument sequence handed to the engine
    pub fn engine_args(&self) -> Vec<String> {
        self.flags.to_args()
    }
}

/// Parse raw arguments (program name already stripped) against the registry
///
/// The last token is the path. Each registry flag is looked up once, by long
/// form or alias; explicit values override `defaults`. Tokens that match no
/// flag are dropped.
///
/// # Errors
/// Returns [`UsageError`] when the path is missing or absent on disk, or when a
/// value flag has no usable value.
///
/// Nothing is logged or written here; leftover tokens are returned in
/// [`ParsedInvocation::ignored`].
pub fn parse<I, S>(raw: I, defaults: &FlagSet) -> Result<ParsedInvocation, UsageError>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let mut tokens: Vec<String> = raw.into_iter().map(Into::into).collect();

    let path_arg = match tokens.pop() {
        Some(path) if !path.is_empty() => path,
        _ => return Err(UsageError::MissingPath),
    };

    let target = std::path::absolute(&path_arg)
        .map(|path| normalize(&path))
        .map_err(|source| UsageError::InvalidPath {
            path: path_arg.clone(),
            source,
        })?;
    if !target.exists() {
        return Err(UsageError::PathNotFound { path: target });
    }

    let mut flags = defaults.clone();

    for spec in REGISTRY {
        let Some(index) = tokens.iter().position(|token| spec.matches(token)) else {
            continue;
        };

        if !spec.kind.takes_value() {
            tokens.remove(index);
            flags.set(spec.name, FlagValue::Enabled);
            continue;
        }

        let value = match tokens.get(index + 1) {
            None => return Err(UsageError::MissingValue { flag: spec.name }),
            Some(value) if value.starts_with('-') => {
                return Err(UsageError::ValueLooksLikeFlag {
                    flag: spec.name,
                    value: value.clone(),
                })
            }
            Some(value) => value.clone(),
        };

        tokens.drain(index..=index + 1);
        flags.set(spec.name, FlagValue::Value(value));
    }

    let model = match flags.get(MODEL_FLAG) {
        Some(FlagValue::Value(path)) => Some(ModelDescriptor::from_path(path)),
        _ => None,
    };

    Ok(ParsedInvocation {
        target,
        flags,
        model,
        ignored: tokens,
    })
}

/// Resolve `.` and `..` without touching the filesystem
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                // `..` at the root stays at the root
                if !matches!(
                    out.components().next_back(),
                    None | Some(Component::RootDir | Component::Prefix(_))
                ) {
                    out.pop();
                }
            }
            other => out.push(other),
        }
    }
    out
}
