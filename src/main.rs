use std::process::ExitCode;

use anyhow::Result;
use whisper_batch::app::{self, App, RunOutcome};
use whisper_batch::config::Config;

#[tokio::main]
async fn main() -> ExitCode {
    let raw: Vec<String> = std::env::args().skip(1).collect();

    match run(raw).await {
        Ok(outcome) => ExitCode::from(outcome.exit_code()),
        Err(e) => {
            let (code, message) = app::describe_error(&e);
            eprintln!("{message}");
            ExitCode::from(code)
        }
    }
}

async fn run(raw: Vec<String>) -> Result<RunOutcome> {
    let config_path = Config::config_path()?;
    let config = Config::load_or_default(&config_path)?;

    App::new(config).with_config_file(config_path).run(raw).await
}
