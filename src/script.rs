//! Replay scripts: one command per line, fed to the session as defaults.
//!
//! Blank lines and `#` comments are skipped. `#include "other.txt"` splices
//! another script in place, resolved relative to the including file.

use std::{
	collections::HashSet,
	fs,
	path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};

pub fn load(path: &Path) -> Result<Vec<String>> {
	let src = fs::read_to_string(path).with_context(|| format!("Failed to read script: {}", path.display()))?;
	let mut visited = HashSet::new();
	parse_file(path, &src, &mut visited)
}

/// Commands from an in-memory script. Includes resolve against the working
/// directory.
pub fn parse(src: &str) -> Result<Vec<String>> {
	let mut visited = HashSet::new();
	parse_file(Path::new("."), src, &mut visited)
}

fn parse_file(path: &Path, src: &str, visited: &mut HashSet<PathBuf>) -> Result<Vec<String>> {
	if !visited.insert(path.to_path_buf()) {
		// Cyclic include.
		return Ok(Vec::new());
	}

	let base = path.parent().unwrap_or(Path::new("."));
	let mut out = Vec::new();
	for (lineno, line) in src.lines().enumerate() {
		let line = line.trim();
		if let Some(rest) = line.strip_prefix("#include") {
			let name = quoted(rest.trim()).ok_or_else(|| malformed(lineno, line))?;
			let include = base.join(name);
			let src = fs::read_to_string(&include).with_context(|| format!("Failed to read included script: {}", include.display()))?;
			let lines = parse_file(&include, &src, visited).with_context(|| format!("Error processing include: {}", include.display()))?;
			out.extend(lines);
		} else if !line.is_empty() && !line.starts_with('#') {
			out.push(line.to_owned());
		}
	}

	Ok(out)
}

fn quoted(text: &str) -> Option<&str> {
	let after = &text[text.find('"')? + 1..];
	Some(&after[..after.find('"')?])
}

fn malformed(lineno: usize, line: &str) -> anyhow::Error {
	anyhow!("Malformed #include on line {}: {}", lineno + 1, line)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn skips_blanks_and_comments() {
		let lines = parse("# walkthrough\n\ngo north\n  take key  \n#  done\nwait boil\n").unwrap();
		assert_eq!(lines, vec!["go north", "take key", "wait boil"]);
	}

	#[test]
	fn malformed_include_is_an_error() {
		let err = parse("#include missing-quotes.txt").unwrap_err();
		assert!(err.to_string().contains("line 1"));
	}

	#[test]
	fn includes_are_spliced_once() {
		let dir = std::env::temp_dir().join(format!("passage-script-{}", std::process::id()));
		fs::create_dir_all(&dir).unwrap();
		fs::write(dir.join("main.txt"), "look\n#include \"part.txt\"\nquit\n").unwrap();
		fs::write(dir.join("part.txt"), "take key # not a comment\n#include \"main.txt\"\n").unwrap();

		let lines = load(&dir.join("main.txt")).unwrap();

		assert_eq!(lines, vec!["look", "take key # not a comment", "quit"]);
		fs::remove_dir_all(&dir).unwrap();
	}
}
