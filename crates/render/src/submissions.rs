use podium_api::{Submission, SubmissionList};

use crate::{Align, TextTable};

/// Shown in place of an empty list.
pub const NO_SUBMISSIONS: &str = "No submissions found.";

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Display model of one submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionLine {
	pub id: String,
	pub problem: String,
	pub user: String,
	pub submitted: String,
	pub status: String,
	pub accepted: bool,
}

impl SubmissionLine {
	pub fn project(submission: &Submission) -> Self {
		Self {
			id: format!("#{}", submission.id),
			problem: submission.problem_title.clone(),
			user: submission.user_name.clone(),
			submitted: submission
				.created_at
				.as_ref()
				.map(|at| at.0.format(TIME_FORMAT).to_string())
				.unwrap_or_default(),
			status: submission.status.clone(),
			accepted: submission.is_accepted(),
		}
	}
}

/// Submission list in server order, or [`NO_SUBMISSIONS`].
pub fn render_submissions(list: &SubmissionList) -> String {
	if list.items.is_empty() {
		return format!("{NO_SUBMISSIONS}\n");
	}
	let mut table = TextTable::new()
		.column("ID", Align::Right)
		.column("Problem", Align::Left)
		.column("User", Align::Left)
		.column("Submitted", Align::Left)
		.column("Status", Align::Left);
	for line in list.items.iter().map(SubmissionLine::project) {
		table.push_row(vec![line.id, line.problem, line.user, line.submitted, line.status]);
	}
	table.render()
}
