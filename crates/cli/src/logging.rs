//! Diagnostic logging to stderr.
//!
//! Stdout belongs to notices, so every tracing line goes to stderr. `RUST_LOG`
//! overrides the level picked from `-v`.

use std::io::IsTerminal;

use tracing_subscriber::EnvFilter;

fn default_directive(verbose: u8) -> &'static str {
	match verbose {
		0 => "warn",
		1 => "info",
		2 => "debug",
		_ => "trace",
	}
}

pub fn init_logging(verbose: u8) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive(verbose)));
	let _ = tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_ansi(std::io::stderr().is_terminal())
		.with_target(true)
		.try_init();
}
