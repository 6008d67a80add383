//! g2c-harness entry point

fn main() {
    // Structured logging to stderr with env-based filter; stdout carries subprocess output
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .try_init();

    g2c_harness::cli::run();
}
