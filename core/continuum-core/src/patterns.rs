//! Compiled regex patterns for recognizing test files.
//!
//! Compiled once on first use. Update these when adding a test convention
//! for another ecosystem.

use once_cell::sync::Lazy;
use regex::Regex;

// ═══════════════════════════════════════════════════════════════════════════════
// Test Markers
// ═══════════════════════════════════════════════════════════════════════════════

/// A directory segment that holds tests: `test/`, `tests/`, `__tests__/`, `spec/`, `specs/`.
pub static RE_TEST_DIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)(^|/)(tests?|__tests__|specs?)/").unwrap());

/// A file name with a test marker: `test_x.py`, `x_test.go`, `x.test.js`,
/// `x.spec.ts`, `test.js`, `tests.py`, `conftest.py`.
pub static RE_TEST_FILE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(^tests?([_.-]|$)|^conftest$|[_.-]tests?([_.-]|$)|[_.-]spec([_.-]|$))")
        .unwrap()
});

/// JVM-style suffix: `TokenTest.java`, `ParserTests.kt`.
pub static RE_TEST_CLASS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[a-z0-9]Tests?$").unwrap());

/// Whether a project-relative path looks like a test file.
pub fn is_test_path(path: &str) -> bool {
    if RE_TEST_DIR.is_match(path) {
        return true;
    }
    let file_name = path.rsplit('/').next().unwrap_or(path);
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    RE_TEST_FILE.is_match(stem) || RE_TEST_CLASS.is_match(stem)
}
