use std::process::ExitCode;

use kvprobe::config::Config;
use kvprobe::error::ProbeError;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = match Config::from_args(&args) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            eprintln!("usage: kvprobe [host] [port] [db] [password] [--out-dir DIR] [--timeout SECS] [--coverage declared|heuristic] [--no-flush]");
            return ExitCode::from(2);
        }
    };

    match kvprobe::run(config).await {
        Ok(outcome) if outcome.all_passed() => ExitCode::SUCCESS,
        Ok(_) => ExitCode::from(1),
        Err(e @ ProbeError::Connect { .. }) => {
            error!("{e}");
            println!("❌ Could not connect to the server, no checks were run.");
            ExitCode::from(2)
        }
        Err(e) => {
            error!("{e}");
            ExitCode::from(2)
        }
    }
}
