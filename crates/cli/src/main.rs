use clap::Parser;
use dsc_cli::{app, cli::Cli, logging};
use tracing::error;

#[tokio::main]
async fn main() {
	let cli = Cli::parse();
	logging::init_logging(cli.verbose);

	if let Err(err) = app::run(cli).await {
		error!(target: "dsc", error = %err, "session setup failed");
		eprintln!("Error: {err:#}");
		std::process::exit(1);
	}
}
