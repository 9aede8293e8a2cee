use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_env("SURVEY_LOG")
                .unwrap_or_else(|_| EnvFilter::new("survey=info,warn")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    if let Err(err) = survey_cli::cli::main() {
        eprintln!("error: {err:?}");
        std::process::exit(1);
    }
}
