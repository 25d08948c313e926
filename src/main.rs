//! configure-and-send - fixture for error-reporting client configuration
//!
//! Reads its inputs from `--case`, `--send` and the environment, then reports
//! to the endpoints named by `NOTIFY_ENDPOINT` and `SESSIONS_ENDPOINT`.

use std::path::PathBuf;

use clap::Parser;
use fixture::common::{config::HarnessSettings, env::Environment, logging};
use fixture::{cli, Case, SendMode};

#[derive(Parser)]
#[command(name = "configure-and-send", about = "Exercise error-reporting client configuration")]
#[command(version, long_about = None)]
struct Cli {
    /// Configuration case to run
    #[arg(long = "case", value_enum)]
    case: Case,

    /// What to send after the case has run
    #[arg(long = "send", value_enum)]
    send: SendMode,

    /// Optional TOML file with harness settings
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    logging::init();

    let cli = Cli::parse();

    let result = async {
        let settings = HarnessSettings::load(cli.config.as_deref())?;
        let env = Environment::from_process();
        cli::run(cli.case, cli.send, &env, &settings).await
    }
    .await;

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
