//! Local edits of G-code programs before upload.

use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

/// Parses comma separated 1-based line ranges (`n`, `n-m`, `n-`) against a
/// program of `total` lines.
pub fn parse_ranges(ranges: &str, total: usize) -> anyhow::Result<Vec<RangeInclusive<usize>>> {
	let mut parsed = Vec::new();
	for section in ranges.split(',') {
		let section = section.trim();
		let mut bounds = section.split('-');
		let (first, last) = (bounds.next().unwrap_or_default(), bounds.next());
		if bounds.next().is_some() {
			bail!("range {section:?} is not <n>, <n>-<m> or <n>-");
		}

		let from: usize = first
			.parse()
			.with_context(|| format!("range {section:?} does not start with a line number"))?;
		if from == 0 {
			bail!("range {section:?}: lines are numbered from 1");
		}
		if from > total {
			bail!("range {section:?} is beyond the end of the program ({total} lines)");
		}

		let to = match last {
			None => from,
			Some("") => total,
			Some(last) => last
				.parse()
				.with_context(|| format!("range {section:?} does not end with a line number"))?,
		};
		if to < from {
			bail!("range {section:?} runs backwards");
		}
		if to > total {
			bail!("range {section:?} is beyond the end of the program ({total} lines)");
		}
		parsed.push(from..=to);
	}
	Ok(parsed)
}

/// Comments out every line in `ranges` with a leading `;`. Blank lines and
/// lines that are already comments stay as they are.
pub fn comment_out(program: &str, ranges: &str) -> anyhow::Result<String> {
	let mut lines: Vec<String> = program.split('\n').map(str::to_string).collect();
	for range in parse_ranges(ranges, lines.len())? {
		for line in &mut lines[*range.start() - 1..*range.end()] {
			if line.is_empty() || line.starts_with(';') {
				continue;
			}
			line.insert(0, ';');
		}
	}
	Ok(lines.join("\n"))
}

/// `edited-<file name>`, written to the working directory.
pub fn edited_name(path: &Path) -> PathBuf {
	let base = path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default();
	PathBuf::from(format!("edited-{base}"))
}

#[cfg(test)]
mod tests {
	use super::*;

	const PROGRAM: &str = ";header\nG0 X0\nG1 X5\n\nG1 Y5\nM5\n";

	#[test]
	fn single_lines_and_spans() {
		let ranges = parse_ranges("2,4-6", 7).unwrap();
		assert_eq!(ranges, vec![2..=2, 4..=6]);
	}

	#[test]
	fn open_range_runs_to_the_end() {
		assert_eq!(parse_ranges("3-", 7).unwrap(), vec![3..=7]);
	}

	#[test]
	fn rejects_bad_ranges() {
		for bad in ["0", "8", "5-3", "2-9", "1-2-3", "x", "2-y", ""] {
			assert!(parse_ranges(bad, 7).is_err(), "{bad:?} should be rejected");
		}
	}

	#[test]
	fn comments_out_code_only() {
		let edited = comment_out(PROGRAM, "1-5").unwrap();
		assert_eq!(edited, ";header\n;G0 X0\n;G1 X5\n\n;G1 Y5\nM5\n");
	}

	#[test]
	fn overlapping_ranges_comment_once() {
		let edited = comment_out(PROGRAM, "2-3,3").unwrap();
		assert_eq!(edited, ";header\n;G0 X0\n;G1 X5\n\nG1 Y5\nM5\n");
	}

	#[test]
	fn edited_file_lands_in_working_directory() {
		assert_eq!(edited_name(Path::new("jobs/plate.nc")), PathBuf::from("edited-plate.nc"));
	}
}
