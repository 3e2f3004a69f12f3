use std::fs::OpenOptions;
use std::path::PathBuf;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const LOG_ENV: &str = "PODIUM_LOG";
const LOG_DIR_ENV: &str = "PODIUM_LOG_DIR";

fn filter(verbose: bool) -> EnvFilter {
	EnvFilter::try_from_env(LOG_ENV)
		.or_else(|_| EnvFilter::try_from_default_env())
		.unwrap_or_else(|_| EnvFilter::new(if verbose { "podium=debug,warn" } else { "podium=info,warn" }))
}

/// Installs the global subscriber.
///
/// Logs go to `$PODIUM_LOG_DIR/podium.<pid>.log` when that directory is
/// usable, otherwise to stderr.
pub fn setup_tracing(verbose: bool) {
	if let Some(log_dir) = std::env::var(LOG_DIR_ENV).ok().map(PathBuf::from)
		&& std::fs::create_dir_all(&log_dir).is_ok()
	{
		let log_path = log_dir.join(format!("podium.{}.log", std::process::id()));
		if let Ok(file) = OpenOptions::new().create(true).append(true).open(&log_path) {
			let file_layer = tracing_subscriber::fmt::layer().with_writer(file).with_ansi(false).with_target(true);
			tracing_subscriber::registry().with(filter(verbose)).with(file_layer).init();
			tracing::info!(path = %log_path.display(), "cli.tracing.file");
			return;
		}
	}

	tracing_subscriber::fmt()
		.with_env_filter(filter(verbose))
		.with_writer(std::io::stderr)
		.init();
}
