use podium_api::Snapshot;
use pretty_assertions::assert_eq;

use super::*;

fn sample() -> StandingsSnapshot {
	StandingsSnapshot::decode(
		r#"[
			{"user_id":1,"user_name":"alice","rank":1,"solved":2,"penalty":30,"problems":[
				{"problem_number":0,"status":"+","count":1},
				{"problem_number":2,"status":"+","count":3}]},
			{"user_id":2,"user_name":"bob","rank":2,"solved":0,"penalty":0,"problems":[
				{"problem_number":1,"status":"-","count":2}]},
			{"user_id":3,"user_name":"carol","rank":3,"solved":0,"penalty":0,"problems":null},
			{"user_id":4,"user_name":"dave","rank":3,"solved":0,"penalty":0,"problems":[
				{"problem_number":0,"status":"","count":0}]}
		]"#,
	)
	.unwrap()
}

fn result(verdict: Verdict, attempts: u32) -> ProblemResult {
	ProblemResult { index: 0, verdict, attempts }
}

#[test]
fn cell_markers() {
	let cases = [
		(Some(result(Verdict::Accepted, 1)), "+"),
		(Some(result(Verdict::Accepted, 0)), "+"),
		(Some(result(Verdict::Accepted, 4)), "+4"),
		(Some(result(Verdict::Rejected, 1)), "-"),
		(Some(result(Verdict::Rejected, 3)), "-3"),
		(Some(result(Verdict::Rejected, 0)), ""),
		(Some(result(Verdict::Unattempted, 0)), ""),
		(None, ""),
	];
	for (input, expected) in cases {
		assert_eq!(Cell::of(input.as_ref()).to_string(), expected, "{input:?}");
	}
}

#[test]
fn projection_hides_rows_without_attempts() {
	let table = StandingsTable::project(&sample());
	assert_eq!(table.columns, 3);
	assert_eq!(table.headers().collect::<Vec<_>>(), vec!["1", "2", "3"]);
	assert_eq!(
		table.lines,
		vec![
			StandingsLine {
				rank: 1,
				user: "alice".into(),
				solved: 2,
				penalty: 30,
				cells: vec![Cell::Accepted { attempts: 1 }, Cell::Blank, Cell::Accepted { attempts: 3 }],
			},
			StandingsLine {
				rank: 2,
				user: "bob".into(),
				solved: 0,
				penalty: 0,
				cells: vec![Cell::Blank, Cell::Rejected { attempts: 2 }, Cell::Blank],
			},
		]
	);
}

#[test]
fn ranks_are_kept_as_sent() {
	let snapshot = StandingsSnapshot::decode(
		r#"[
			{"user_id":"x","rank":2,"solved":1,"penalty":5,"problems":[{"problem_number":0,"status":"+","count":1}]},
			{"user_id":"y","rank":2,"solved":1,"penalty":5,"problems":[{"problem_number":0,"status":"+","count":1}]}
		]"#,
	)
	.unwrap();
	let table = StandingsTable::project(&snapshot);
	let ranks: Vec<_> = table.lines.iter().map(|line| (line.rank, line.user.as_str())).collect();
	assert_eq!(ranks, vec![(2, "x"), (2, "y")]);
}

#[test]
fn empty_snapshot_has_no_problem_columns() {
	let table = StandingsTable::project(&StandingsSnapshot::default());
	assert_eq!(table.columns, 0);
	assert_eq!(table.to_text(), "Rank  User  Solved  Penalty\n----  ----  ------  -------\n");
}

#[test]
fn renders_text_table() {
	let text = StandingsTable::project(&sample()).to_text();
	let expected = [
		"Rank  User   Solved  Penalty  1  2   3",
		"----  -----  ------  -------  -  --  --",
		"   1  alice       2       30  +      +3",
		"   2  bob         0        0     -2",
	];
	assert_eq!(text.lines().collect::<Vec<_>>(), expected);
}
