use std::process::ExitCode;

use tracing_subscriber::EnvFilter;

fn main() -> ExitCode {
    // Logs go to stderr; stdout only carries the confirmation line.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("transcript_fetcher=warn")),
        )
        .init();

    ExitCode::from(transcript_fetcher::cli::run(std::env::args_os()))
}
