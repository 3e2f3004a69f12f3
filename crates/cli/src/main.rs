mod app;
mod cli;
mod config;
mod logging;
mod screen;

use app::App;
use clap::Parser;
use cli::Cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let cli = Cli::parse();
	logging::setup_tracing(cli.verbose);

	let app = App::new(&cli)?;
	app.run(cli.command).await
}
