use unicode_width::UnicodeWidthStr;

const GAP: &str = "  ";

/// Horizontal placement of a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
	Left,
	Right,
	Center,
}

/// Fixed-column text table sized to its widest cell per column.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextTable {
	headers: Vec<String>,
	aligns: Vec<Align>,
	rows: Vec<Vec<String>>,
}

impl TextTable {
	pub fn new() -> Self {
		Self::default()
	}

	/// Appends a column.
	pub fn column(mut self, header: impl Into<String>, align: Align) -> Self {
		self.headers.push(header.into());
		self.aligns.push(align);
		self
	}

	/// Appends a row. Missing trailing cells render blank; extra cells are dropped.
	pub fn push_row(&mut self, mut cells: Vec<String>) {
		cells.resize(self.headers.len(), String::new());
		self.rows.push(cells);
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Renders header, a dashed rule, then rows, each line without trailing
	/// whitespace.
	pub fn render(&self) -> String {
		let widths: Vec<usize> = (0..self.headers.len())
			.map(|col| {
				self.rows
					.iter()
					.map(|row| row[col].width())
					.chain(std::iter::once(self.headers[col].width()))
					.max()
					.unwrap_or(0)
			})
			.collect();

		let mut out = String::new();
		self.render_line(&mut out, &widths, self.headers.iter().map(String::as_str));
		let rules: Vec<String> = widths.iter().map(|width| "-".repeat(*width)).collect();
		self.render_line(&mut out, &widths, rules.iter().map(String::as_str));
		for row in &self.rows {
			self.render_line(&mut out, &widths, row.iter().map(String::as_str));
		}
		out
	}

	fn render_line<'a>(&self, out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
		let mut line = String::new();
		for (col, cell) in cells.enumerate() {
			if col > 0 {
				line.push_str(GAP);
			}
			pad(&mut line, cell, widths[col], self.aligns[col]);
		}
		out.push_str(line.trim_end());
		out.push('\n');
	}
}

fn pad(line: &mut String, cell: &str, width: usize, align: Align) {
	let slack = width.saturating_sub(cell.width());
	let (left, right) = match align {
		Align::Left => (0, slack),
		Align::Right => (slack, 0),
		Align::Center => (slack / 2, slack - slack / 2),
	};
	line.extend(std::iter::repeat_n(' ', left));
	line.push_str(cell);
	line.extend(std::iter::repeat_n(' ', right));
}
