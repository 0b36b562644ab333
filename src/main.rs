use std::io;

use tracing_subscriber::EnvFilter;

use coda_chess::uci::uci_top::run_stdio_loop;

fn main() -> io::Result<()> {
    // stdout carries the UCI protocol, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    run_stdio_loop()
}
