use std::fmt;

use podium_api::{ParticipantRow, ProblemResult, StandingsSnapshot, Verdict};

use crate::{Align, TextTable};

/// One problem cell as shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
	/// `+`, or `+k` after `k > 1` attempts.
	Accepted { attempts: u32 },
	/// `-`, or `-k` after `k > 1` attempts.
	Rejected { attempts: u32 },
	Blank,
}

impl Cell {
	pub fn of(result: Option<&ProblemResult>) -> Self {
		match result {
			Some(result) if result.verdict == Verdict::Accepted => Self::Accepted { attempts: result.attempts },
			Some(result) if result.attempts > 0 => Self::Rejected { attempts: result.attempts },
			_ => Self::Blank,
		}
	}
}

impl fmt::Display for Cell {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match *self {
			Self::Accepted { attempts } if attempts > 1 => write!(f, "+{attempts}"),
			Self::Accepted { .. } => f.write_str("+"),
			Self::Rejected { attempts } if attempts > 1 => write!(f, "-{attempts}"),
			Self::Rejected { .. } => f.write_str("-"),
			Self::Blank => Ok(()),
		}
	}
}

/// Display model of one participant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsLine {
	pub rank: u32,
	pub user: String,
	pub solved: u32,
	pub penalty: u64,
	/// One cell per problem column, by index.
	pub cells: Vec<Cell>,
}

impl StandingsLine {
	fn project(row: &ParticipantRow, columns: u32) -> Self {
		Self {
			rank: row.rank,
			user: row.label().to_string(),
			solved: row.solved,
			penalty: row.penalty,
			cells: (0..columns).map(|index| Cell::of(row.problem(index))).collect(),
		}
	}
}

/// Standings projected for display.
///
/// Problem columns are numbered `1..=N` with `N` taken from the highest
/// problem index in the snapshot. Rows without any attempted problem are
/// left out; ranks are shown as the server sent them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StandingsTable {
	pub columns: u32,
	pub lines: Vec<StandingsLine>,
}

impl StandingsTable {
	pub fn project(snapshot: &StandingsSnapshot) -> Self {
		let columns = snapshot.column_count();
		let lines = snapshot
			.rows
			.iter()
			.filter(|row| row.problems.iter().any(ProblemResult::is_attempted))
			.map(|row| StandingsLine::project(row, columns))
			.collect();
		Self { columns, lines }
	}

	/// Problem column headers.
	pub fn headers(&self) -> impl Iterator<Item = String> + '_ {
		(1..=self.columns).map(|n| n.to_string())
	}

	pub fn to_text(&self) -> String {
		let mut table = TextTable::new()
			.column("Rank", Align::Right)
			.column("User", Align::Left)
			.column("Solved", Align::Right)
			.column("Penalty", Align::Right);
		for header in self.headers() {
			table = table.column(header, Align::Center);
		}
		for line in &self.lines {
			let mut cells = vec![line.rank.to_string(), line.user.clone(), line.solved.to_string(), line.penalty.to_string()];
			cells.extend(line.cells.iter().map(Cell::to_string));
			table.push_row(cells);
		}
		table.render()
	}
}

#[cfg(test)]
mod tests;
