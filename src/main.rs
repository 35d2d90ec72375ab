//! feeder-gym entry point: parse arguments, train, report, export.

use std::process::ExitCode;

use clap::Parser;
use tracing::info;

use feeder_gym::cli::Cli;
use feeder_gym::io::export::{export_progress_csv, export_telemetry_csv};
use feeder_gym::{logging, runner};

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_level);

    let scenario = match cli.scenario() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };
    let errors = scenario.validate();
    if !errors.is_empty() {
        for e in &errors {
            eprintln!("{e}");
        }
        return ExitCode::FAILURE;
    }

    match run(&cli, &scenario) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli, scenario: &feeder_gym::config::ScenarioConfig) -> feeder_gym::Result<()> {
    let output = runner::run(scenario)?;
    println!("{}", output.report);

    if let Some(path) = &cli.telemetry_out {
        export_telemetry_csv(&output.evaluation.telemetry, path)?;
        info!(path = %path.display(), "telemetry written");
    }
    if let Some(path) = &cli.progress_out {
        export_progress_csv(&output.episodes, path)?;
        info!(path = %path.display(), "training progress written");
    }

    #[cfg(feature = "api")]
    if cli.serve {
        use std::net::SocketAddr;
        use std::sync::Arc;

        let state = Arc::new(feeder_gym::api::AppState::from(output));
        let addr = SocketAddr::from(([0, 0, 0, 0], cli.port));
        let rt = tokio::runtime::Runtime::new()?;
        rt.block_on(feeder_gym::api::serve(state, addr))?;
    }
    Ok(())
}
