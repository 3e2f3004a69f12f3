use std::path::PathBuf;

use clap::{Parser, Subcommand};
use podium_api::ContestId;

#[derive(Parser, Debug)]
#[command(name = "podium")]
#[command(about = "Live contest standings in the terminal")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Config file (defaults to $PODIUM_CONFIG, then <config dir>/podium/config.toml)
	#[arg(long, global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// API base URL, overriding config and PODIUM_BASE_URL
	#[arg(long, global = true, value_name = "URL")]
	pub base_url: Option<String>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
	/// Log in and store the session token
	Login {
		#[arg(long)]
		email: String,
		#[arg(long)]
		password: String,
	},
	/// Log out and delete the stored token
	Logout,
	/// Show the logged-in user
	Whoami,
	/// List contests
	Contests {
		/// Only contests that have not started yet
		#[arg(long)]
		upcoming: bool,
	},
	/// Follow a contest's standings
	Standings {
		contest: ContestId,
		/// Print the current table once and exit
		#[arg(long)]
		once: bool,
	},
	/// Follow a contest's submissions
	Submissions {
		contest: ContestId,
		/// Only your own submissions
		#[arg(long)]
		mine: bool,
		/// Print the current list once and exit
		#[arg(long)]
		once: bool,
	},
	/// Count down to the start or end of a contest
	Countdown { contest: ContestId },
}
