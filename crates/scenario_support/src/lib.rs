//! Scenario manifests for integration tests.
//!
//! A scenario is a starting page, a list of actions (renders, accepts,
//! dismisses) and the state expected afterwards. Loading panics with the
//! offending path, so a broken manifest fails the test that uses it.

pub mod manifest;

pub use manifest::{Action, CloseSpec, Expectation, RenderSpec, SCENARIO_FORMAT_V1, Scenario};

use std::fs;
use std::path::{Path, PathBuf};

/// Load and validate one manifest.
pub fn load(path: &Path) -> Scenario {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read scenario {path:?}: {err}"));
    let scenario: Scenario = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse scenario {path:?}: {err}"));
    assert_eq!(
        scenario.format, SCENARIO_FORMAT_V1,
        "unsupported format in {path:?}"
    );
    assert!(
        !scenario.actions.is_empty(),
        "scenario {path:?} has no actions"
    );
    scenario
}

/// Every `*.toml` manifest in `dir`, sorted by file name.
pub fn load_dir(dir: &Path) -> Vec<(PathBuf, Scenario)> {
    let entries = fs::read_dir(dir)
        .unwrap_or_else(|err| panic!("failed to list scenarios in {dir:?}: {err}"));
    let mut paths: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    assert!(!paths.is_empty(), "no scenarios found in {dir:?}");
    paths
        .into_iter()
        .map(|path| {
            let scenario = load(&path);
            (path, scenario)
        })
        .collect()
}

/// Drop whitespace between tags and at both ends so expectations can be
/// written across lines.
pub fn normalize_html(html: &str) -> String {
    let mut out = String::with_capacity(html.len());
    let mut pending_space = false;
    for ch in html.trim().chars() {
        if ch.is_whitespace() {
            pending_space = true;
            continue;
        }
        if pending_space {
            let after_tag = out.ends_with('>');
            if !after_tag && ch != '<' {
                out.push(' ');
            }
            pending_space = false;
        }
        out.push(ch);
    }
    out
}

/// One line per tag, for readable diffs.
pub fn html_lines(html: &str) -> Vec<String> {
    normalize_html(html)
        .replace("><", ">\n<")
        .lines()
        .map(str::to_string)
        .collect()
}

pub fn diff_lines(expected: &[String], actual: &[String]) -> String {
    let max = expected.len().max(actual.len());
    let mut out = String::new();
    use std::fmt::Write;
    let missing = "<missing>";
    let mismatch = (0..max).find(|&i| expected.get(i) != actual.get(i));
    if let Some(i) = mismatch {
        let start = i.saturating_sub(2);
        let end = (i + 3).min(max);
        let _ = writeln!(
            &mut out,
            "first mismatch at line {} (showing {}..={}):",
            i + 1,
            start + 1,
            end
        );
        for line_idx in start..end {
            let left = expected
                .get(line_idx)
                .map(String::as_str)
                .unwrap_or(missing);
            let right = actual.get(line_idx).map(String::as_str).unwrap_or(missing);
            let marker = if line_idx == i { ">" } else { " " };
            let _ = writeln!(&mut out, "{marker} {:>4}  expected: {left}", line_idx + 1);
            let _ = writeln!(&mut out, "{marker} {:>4}    actual: {right}", line_idx + 1);
        }
    }
    let _ = writeln!(
        &mut out,
        "expected {} lines, actual {} lines",
        expected.len(),
        actual.len()
    );
    out
}
