//! Entry point for the command-line interface.
#![forbid(unsafe_code)]

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    init_logging();
    if let Err(err) = carpool_cli::run() {
        eprintln!("carpool: {err}");
        std::process::exit(1);
    }
}

// Library crates log through `log`; the subscriber bridges those records and
// writes them to stderr so stdout carries only command output.
fn init_logging() {
    let filter = EnvFilter::try_from_env("CARPOOL_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false);
    if let Err(err) = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init()
    {
        eprintln!("carpool: logging disabled: {err}");
    }
}
