use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::args::{self, UsageError};
use crate::config::Config;
use crate::dispatch::{Dispatcher, RunSummary, WhisperCli};
use crate::files::{self, ResolvedTarget};
use crate::model::{ModelDescriptor, ModelProvisioner, ProvisionError};
use crate::{telemetry, PROGRAM};

/// Exit code for a successful run
pub const SUCCESS_EXIT: u8 = 0;
/// Exit code for config, provisioning or engine failures
pub const FAILURE_EXIT: u8 = 1;
/// Exit code for invocation errors
pub const USAGE_EXIT: u8 = 2;

/// How a run ended when nothing fatal happened
#[derive(Debug)]
pub enum RunOutcome {
    /// Usage text was printed
    Help,
    /// Files were dispatched
    Completed(RunSummary),
}

impl RunOutcome {
    /// Process exit code: failure if any engine run failed
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Help => SUCCESS_EXIT,
            Self::Completed(summary) if summary.is_success() => SUCCESS_EXIT,
            Self::Completed(_) => FAILURE_EXIT,
        }
    }
}

/// The whole pipeline: parse, provision, resolve, dispatch
pub struct App {
    config: Config,
    config_file: Option<PathBuf>,
}

impl App {
    /// App running with `config`
    pub const fn new(config: Config) -> Self {
        Self {
            config,
            config_file: None,
        }
    }

    /// Write the default config to `path` on the first valid invocation
    #[must_use]
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Run one invocation (program name already stripped)
    ///
    /// Nothing touches the disk or network until the invocation parses.
    ///
    /// # Errors
    /// Returns [`UsageError`] or [`ProvisionError`] inside the `anyhow::Error`
    /// for invalid invocations and failed model downloads; see [`describe_error`]
    pub async fn run(&self, raw: Vec<String>) -> Result<RunOutcome> {
        let default_model = self.config.model.default_model_path()?;
        let defaults = args::default_flags(&default_model);

        if args::wants_help(&raw) {
            print!("{}", args::usage(PROGRAM, &defaults));
            return Ok(RunOutcome::Help);
        }

        let invocation = args::parse(raw, &defaults)?;

        if let Some(path) = &self.config_file {
            if Config::write_default_if_missing(path)? {
                println!("Default config written to {}", path.display());
            }
        }
        let telemetry_config = &self.config.telemetry;
        telemetry::init(telemetry_config.enabled, &telemetry_config.log_path)?;
        tracing::info!("whisper-batch starting");

        if !invocation.ignored.is_empty() {
            tracing::debug!(ignored = ?invocation.ignored, "ignoring unrecognized arguments");
        }
        tracing::info!(
            target = %invocation.target.display(),
            flags = ?invocation.engine_args(),
            "invocation parsed"
        );

        let model = invocation
            .model
            .clone()
            .unwrap_or_else(|| ModelDescriptor::from_path(&default_model));
        ModelProvisioner::from_config(&self.config.model)?
            .ensure(&model)
            .await?;

        let target = files::resolve(&invocation.target)?;
        match &target {
            ResolvedTarget::File {
                supported: false, ..
            } => {
                eprintln!("Unsupported filetype.");
                eprintln!("\n{}", args::usage(PROGRAM, &defaults));
            }
            ResolvedTarget::Directory(found) => println!("Transcribing {} files.", found.len()),
            ResolvedTarget::File { .. } => {}
        }

        let dispatcher = Dispatcher::new(
            WhisperCli::new(&self.config.engine.program),
            invocation.engine_args(),
        );
        let targets = target.files().to_vec();
        let summary = tokio::task::spawn_blocking(move || dispatcher.dispatch_all(&targets))
            .await
            .context("dispatch task failed")?;

        report_summary(&summary);
        Ok(RunOutcome::Completed(summary))
    }
}

fn report_summary(summary: &RunSummary) {
    let total = summary.outcomes.len();
    let succeeded = summary.succeeded();

    for failure in summary.failures() {
        if let Err(e) = &failure.result {
            eprintln!("Failed to transcribe {}: {e:#}", failure.path.display());
        }
    }

    if total > 1 || succeeded < total {
        println!("Transcribed {succeeded} of {total} files.");
    }
    tracing::info!(total, succeeded, "run complete");
}

/// Exit code and user-facing message for a fatal error
pub fn describe_error(error: &anyhow::Error) -> (u8, String) {
    // The console subscriber shows warnings, so this stays below that level
    tracing::debug!("{error:#}");

    if let Some(usage) = error.downcast_ref::<UsageError>() {
        return (
            USAGE_EXIT,
            format!("{usage}\nRun `{PROGRAM} --help` for the list of supported flags."),
        );
    }

    if let Some(ProvisionError::Download { url, path, .. }) = error.downcast_ref::<ProvisionError>() {
        return (
            FAILURE_EXIT,
            format!(
                "\nFailed to download model: {error:#}\n\n\
                 Please download the model manually from:\n{url}\nand save it to: {}",
                path.display()
            ),
        );
    }

    (FAILURE_EXIT, format!("error: {error:#}"))
}
