use std::fmt;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use thiserror::Error;

/// Engine binary invoked when none is configured
pub const DEFAULT_ENGINE_PROGRAM: &str = "whisper-cli";

/// Errors from running the transcription engine on one file
#[derive(Debug, Error)]
pub enum DispatchError {
    /// The engine process could not be started
    #[error("failed to start {program}")]
    Spawn {
        /// Engine program
        program: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// The engine ran but reported failure
    #[error("{program} failed on {}: {status}", .file.display())]
    EngineFailed {
        /// Engine program
        program: String,
        /// File being transcribed
        file: PathBuf,
        /// How the engine exited
        status: EngineStatus,
    },
}

/// Exit status of one engine run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineStatus {
    /// Exit code, `None` if killed by a signal
    pub code: Option<i32>,
}

impl EngineStatus {
    /// Status of a run that exited with `code`
    pub const fn exited(code: i32) -> Self {
        Self { code: Some(code) }
    }

    /// Whether the engine exited with code 0
    pub const fn success(self) -> bool {
        matches!(self.code, Some(0))
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}"),
            None => f.write_str("terminated by signal"),
        }
    }
}

impl From<ExitStatus> for EngineStatus {
    fn from(status: ExitStatus) -> Self {
        Self {
            code: status.code(),
        }
    }
}

/// Something that can transcribe one file given the engine flags
///
/// Production code uses [`WhisperCli`]; tests substitute `MockEngine`.
#[cfg_attr(test, mockall::automock)]
pub trait Engine {
    /// Program name for messages
    fn program(&self) -> String;

    /// Run the engine on `file`, blocking until it exits
    ///
    /// # Errors
    /// Returns [`DispatchError::Spawn`] if the engine cannot be started
    fn run(&self, file: &Path, args: &[String]) -> Result<EngineStatus, DispatchError>;
}

/// The whisper.cpp command-line binary, run as a child process sharing our
/// stdin, stdout and stderr
#[derive(Debug, Clone)]
pub struct WhisperCli {
    program: PathBuf,
}

impl WhisperCli {
    /// Engine at `program`, resolved through `PATH` if not a path
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }

    /// `program -f <file> <args...>`
    pub fn command(&self, file: &Path, args: &[String]) -> Command {
        let mut command = Command::new(&self.program);
        command.arg("-f").arg(file).args(args);
        command
    }
}

impl Default for WhisperCli {
    fn default() -> Self {
        Self::new(DEFAULT_ENGINE_PROGRAM)
    }
}

impl Engine for WhisperCli {
    fn program(&self) -> String {
        self.program.display().to_string()
    }

    fn run(&self, file: &Path, args: &[String]) -> Result<EngineStatus, DispatchError> {
        tracing::debug!(
            program = %self.program.display(),
            file = %file.display(),
            args = ?args,
            "spawning engine"
        );

        let status = self
            .command(file, args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(|source| DispatchError::Spawn {
                program: self.program(),
                source,
            })?;

        Ok(status.into())
    }
}

/// Result for one dispatched file
#[derive(Debug)]
pub struct FileOutcome {
    /// File handed to the engine
    pub path: PathBuf,
    /// `Ok` if the engine exited successfully
    pub result: Result<(), DispatchError>,
}

/// Per-file results of a run, in dispatch order
#[derive(Debug, Default)]
pub struct RunSummary {
    /// One entry per dispatched file
    pub outcomes: Vec<FileOutcome>,
}

impl RunSummary {
    /// Number of files transcribed successfully
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    /// Files whose engine run failed
    pub fn failures(&self) -> impl Iterator<Item = &FileOutcome> {
        self.outcomes.iter().filter(|o| o.result.is_err())
    }

    /// Whether every file succeeded (vacuously true for zero files)
    pub fn is_success(&self) -> bool {
        self.outcomes.iter().all(|o| o.result.is_ok())
    }
}

/// Runs the engine over files one at a time with a fixed flag sequence
pub struct Dispatcher<E> {
    engine: E,
    args: Vec<String>,
}

impl<E: Engine> Dispatcher<E> {
    /// Dispatcher passing `args` to `engine` for every file
    pub const fn new(engine: E, args: Vec<String>) -> Self {
        Self { engine, args }
    }

    /// Transcribe one file
    ///
    /// # Errors
    /// Returns error if the engine cannot be started or exits unsuccessfully
    pub fn dispatch(&self, file: &Path) -> Result<(), DispatchError> {
        println!("Transcribing {}", file.display());

        let status = self.engine.run(file, &self.args)?;
        if status.success() {
            tracing::info!(file = %file.display(), "transcription finished");
            Ok(())
        } else {
            Err(DispatchError::EngineFailed {
                program: self.engine.program(),
                file: file.to_path_buf(),
                status,
            })
        }
    }

    /// Transcribe files in order; a failure is recorded and the next file still runs
    pub fn dispatch_all(&self, files: &[PathBuf]) -> RunSummary {
        let outcomes = files
            .iter()
            .map(|file| {
                let result = self.dispatch(file);
                if let Err(e) = &result {
                    tracing::warn!(file = %file.display(), error = %e, "transcription failed");
                }
                FileOutcome {
                    path: file.clone(),
                    result,
                }
            })
            .collect();

        RunSummary { outcomes }
    }
}
