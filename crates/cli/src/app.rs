use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, bail};
use podium_api::{ApiClient, ContestId, ContestMeta, Snapshot, StandingsSnapshot, SubmissionList, TokenStore};
use podium_render::{Align, ContestPhase, StandingsTable, TextTable, render_submissions, run_countdown};
use podium_sync::{Feed, HttpTransport, LiveSync, PushTransport, SnapshotFetcher, StandingsFetcher, SubmissionsFetcher, SyncOptions};
use podium_worker::{IntervalTicker, SystemClock};

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::screen;

const START_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Resolved configuration plus the session token store.
pub struct App {
	config: Config,
	api: ApiClient,
	store: TokenStore,
}

impl App {
	pub fn new(cli: &Cli) -> anyhow::Result<Self> {
		let mut config = Config::load(cli.config.as_deref(), |key| std::env::var(key).ok())?;
		if let Some(url) = &cli.base_url {
			config.base_url = url.clone();
		}
		let store = TokenStore::in_data_dir(&config.auth.key).context("locating token store")?;
		let api = ApiClient::new(config.base_url()?, Arc::new(store.clone()), config.request_timeout()).context("building HTTP client")?;
		tracing::debug!(base_url = %api.base(), token = %store.path().display(), "cli.ready");
		Ok(Self { config, api, store })
	}

	pub async fn run(self, command: Command) -> anyhow::Result<()> {
		match command {
			Command::Login { email, password } => self.login(&email, &password).await,
			Command::Logout => self.logout().await,
			Command::Whoami => self.whoami().await,
			Command::Contests { upcoming } => self.contests(upcoming).await,
			Command::Standings { contest, once } => {
				let fetcher = StandingsFetcher::new(self.api.clone());
				let body = |table: &StandingsSnapshot| StandingsTable::project(table).to_text();
				if once {
					return self.print_once::<StandingsSnapshot>(&fetcher, contest, body).await;
				}
				let transport = HttpTransport::new(self.api.clone(), Feed::Standings);
				self.follow::<StandingsSnapshot>(Arc::new(fetcher), Arc::new(transport), contest, body).await
			}
			Command::Submissions { contest, mine, once } => {
				let fetcher = SubmissionsFetcher::new(self.api.clone(), mine);
				if once {
					return self.print_once::<SubmissionList>(&fetcher, contest, render_submissions).await;
				}
				let feed = if mine { Feed::MyContestSubmissions } else { Feed::ContestSubmissions };
				let transport = HttpTransport::new(self.api.clone(), feed);
				self.follow::<SubmissionList>(Arc::new(fetcher), Arc::new(transport), contest, render_submissions).await
			}
			Command::Countdown { contest } => self.countdown(contest).await,
		}
	}

	async fn login(&self, email: &str, password: &str) -> anyhow::Result<()> {
		let session = self.api.login(email, password).await?;
		self.store.save(&session.token)?;
		tracing::info!(user = session.user.id, "cli.login");
		println!("Logged in as {} <{}>", session.user.name, session.user.email);
		Ok(())
	}

	async fn logout(&self) -> anyhow::Result<()> {
		if let Err(err) = self.api.logout().await {
			tracing::warn!(error = %err, "cli.logout.request_failed");
		}
		self.store.clear()?;
		println!("Logged out");
		Ok(())
	}

	async fn whoami(&self) -> anyhow::Result<()> {
		if self.store.load()?.is_none() {
			bail!("not logged in; run `podium login`");
		}
		let user = self.api.me().await.context("fetching current user")?;
		println!("{} <{}> ({:?})", user.name, user.email, user.role);
		Ok(())
	}

	async fn contests(&self, upcoming: bool) -> anyhow::Result<()> {
		let contests = if upcoming {
			self.api.upcoming_contests().await?
		} else {
			self.api.contests().await?
		};
		print!("{}", contest_table(&contests));
		Ok(())
	}

	async fn print_once<S: Snapshot>(&self, fetcher: &dyn SnapshotFetcher<S>, contest: ContestId, body: impl Fn(&S) -> String) -> anyhow::Result<()> {
		let baseline = fetcher.fetch(contest).await.with_context(|| format!("loading contest {contest}"))?;
		if let Some(meta) = &baseline.meta {
			println!("{}\n", meta.display_name());
		}
		print!("{}", body(&baseline.snapshot));
		Ok(())
	}

	/// Redraws on every view change until interrupted.
	async fn follow<S: Snapshot>(
		&self,
		fetcher: Arc<dyn SnapshotFetcher<S>>,
		transport: Arc<dyn PushTransport>,
		contest: ContestId,
		body: impl Fn(&S) -> String,
	) -> anyhow::Result<()> {
		let options = SyncOptions {
			backoff: self.config.reconnect.backoff(),
			..SyncOptions::default()
		};
		let sync = LiveSync::spawn(fetcher, transport, options);
		let mut views = sync.subscribe();
		sync.activate(contest).await?;

		let frames = screen::redraw_until(&mut views, tokio::signal::ctrl_c(), |view| screen::redraw(&screen::frame(contest, view, &body))).await?;
		tracing::debug!(contest = %contest, frames, "cli.follow.stop");

		sync.deactivate().await?;
		sync.shutdown().await;
		Ok(())
	}

	async fn countdown(&self, contest: ContestId) -> anyhow::Result<()> {
		let meta = self.api.contest(contest).await?;
		let Some(start) = meta.start_time.as_ref().map(|at| at.0) else {
			bail!("contest {contest} has no start time");
		};
		if meta.duration == 0 {
			bail!("contest {contest} has no duration");
		}
		println!("{}", meta.display_name());

		let mut ticker = IntervalTicker::new(Duration::from_secs(1), Arc::new(SystemClock));
		let render = |phase: ContestPhase| {
			if let Err(err) = screen::overwrite_line(&phase.to_string()) {
				tracing::warn!(error = %err, "cli.countdown.write_failed");
			}
		};
		tokio::select! {
			_ = run_countdown(&mut ticker, start, meta.duration, render) => println!(),
			_ = tokio::signal::ctrl_c() => println!(),
		}
		Ok(())
	}
}

fn contest_table(contests: &[ContestMeta]) -> String {
	if contests.is_empty() {
		return "No contests found.\n".to_string();
	}
	let mut table = TextTable::new()
		.column("ID", Align::Right)
		.column("Title", Align::Left)
		.column("Start", Align::Left)
		.column("Duration", Align::Right);
	for contest in contests {
		table.push_row(vec![
			contest.id.to_string(),
			contest.display_name(),
			contest.start_time.as_ref().map(|at| at.0.format(START_FORMAT).to_string()).unwrap_or_default(),
			format!("{} min", contest.duration),
		]);
	}
	table.render()
}
