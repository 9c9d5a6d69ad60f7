//! Activity classifier: turns a changed-file set into at most one
//! human-readable activity.
//!
//! Changed paths are first partitioned into (overlapping) buckets, then an
//! ordered rule table is evaluated top to bottom. The first rule whose
//! predicate holds produces the description; later rules are not consulted.
//! Classification is pure: same set of paths, same answer, regardless of the
//! order they were discovered in.

use crate::memory::ActivityKind;
use crate::patterns::is_test_path;
use std::collections::{BTreeMap, BTreeSet};

const CONTRACT_EXTENSIONS: &[&str] = &["sol"];
const FRONTEND_EXTENSIONS: &[&str] = &["tsx", "jsx", "ts", "js"];
const BACKEND_EXTENSIONS: &[&str] = &["py", "go", "rs", "java", "cpp"];
const CONFIG_FILES: &[&str] = &["package.json", "requirements.txt", "Cargo.toml", "go.mod"];

/// Minimum frontend files for "component development".
pub const FRONTEND_COMPONENT_MIN: usize = 3;
/// Minimum total files for a "major development session".
pub const MAJOR_SESSION_MIN: usize = 5;
/// Minimum total files for a language-based description.
pub const LANGUAGE_MIN: usize = 2;

/// Languages that win on presence alone, checked in this order.
const PRIORITY_LANGUAGES: &[(&[&str], &str)] = &[
    (&["sol"], "Smart contract modifications"),
    (&["py"], "Python development"),
];

/// Remaining languages: the group with the most changed files wins, earlier
/// rows win ties.
const COUNTED_LANGUAGES: &[(&[&str], &str)] = &[
    (&["js", "ts", "tsx", "jsx"], "JavaScript/TypeScript development"),
    (&["go"], "Go development"),
    (&["rs"], "Rust development"),
    (&["java"], "Java development"),
    (&["cpp"], "C++ development"),
];

/// Changed paths partitioned by category. A path may land in several buckets.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChangeBuckets {
    pub contracts: Vec<String>,
    pub tests: Vec<String>,
    pub frontend: Vec<String>,
    pub backend: Vec<String>,
    pub config: Vec<String>,
    pub total: usize,
    /// Changed-file count per lowercase extension
    pub extensions: BTreeMap<String, usize>,
}

impl ChangeBuckets {
    pub fn partition<'a>(paths: impl IntoIterator<Item = &'a str>) -> Self {
        let unique: BTreeSet<&str> = paths.into_iter().collect();
        let mut buckets = ChangeBuckets {
            total: unique.len(),
            ..Default::default()
        };

        for path in unique {
            let file_name = path.rsplit('/').next().unwrap_or(path);
            let extension = extension_of(file_name);

            if let Some(ext) = extension.as_deref() {
                *buckets.extensions.entry(ext.to_string()).or_default() += 1;
                if CONTRACT_EXTENSIONS.contains(&ext) {
                    buckets.contracts.push(path.to_string());
                }
                if FRONTEND_EXTENSIONS.contains(&ext) {
                    buckets.frontend.push(path.to_string());
                }
                if BACKEND_EXTENSIONS.contains(&ext) {
                    buckets.backend.push(path.to_string());
                }
            }
            if is_test_path(path) {
                buckets.tests.push(path.to_string());
            }
            if CONFIG_FILES.contains(&file_name) {
                buckets.config.push(path.to_string());
            }
        }

        buckets
    }

    /// Description for the dominant language among the changed files.
    pub fn language_description(&self) -> Option<&'static str> {
        if let Some((_, description)) = PRIORITY_LANGUAGES
            .iter()
            .find(|(exts, _)| self.count_of(exts) > 0)
        {
            return Some(*description);
        }

        let mut best: Option<(usize, &'static str)> = None;
        for (exts, description) in COUNTED_LANGUAGES {
            let count = self.count_of(exts);
            if count > 0 && best.map_or(true, |(most, _)| count > most) {
                best = Some((count, *description));
            }
        }
        best.map(|(_, description)| description)
    }

    fn count_of(&self, exts: &[&str]) -> usize {
        exts.iter()
            .filter_map(|ext| self.extensions.get(*ext))
            .sum()
    }
}

fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// One classified activity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Activity {
    pub description: String,
    pub kind: ActivityKind,
    /// Name of the rule that produced it
    pub rule: &'static str,
}

/// A row of the classification table.
pub struct Rule {
    pub name: &'static str,
    pub kind: ActivityKind,
    pub matches: fn(&ChangeBuckets) -> bool,
    pub describe: fn(&ChangeBuckets) -> String,
}

impl Rule {
    pub fn apply(&self, buckets: &ChangeBuckets) -> Option<Activity> {
        if !(self.matches)(buckets) {
            return None;
        }
        Some(Activity {
            description: (self.describe)(buckets),
            kind: self.kind.clone(),
            rule: self.name,
        })
    }
}

/// Classification rules in priority order.
pub static RULES: [Rule; 8] = [
    Rule {
        name: "contracts_with_tests",
        kind: ActivityKind::Development,
        matches: |b| !b.contracts.is_empty() && !b.tests.is_empty(),
        describe: |_| "Smart contract development with testing".to_string(),
    },
    Rule {
        name: "contracts",
        kind: ActivityKind::Development,
        matches: |b| !b.contracts.is_empty(),
        describe: |b| format!("Modified {} smart contracts", b.contracts.len()),
    },
    Rule {
        name: "frontend_with_tests",
        kind: ActivityKind::Development,
        matches: |b| !b.frontend.is_empty() && !b.tests.is_empty(),
        describe: |_| "Frontend feature development with tests".to_string(),
    },
    Rule {
        name: "frontend_components",
        kind: ActivityKind::Development,
        matches: |b| b.frontend.len() >= FRONTEND_COMPONENT_MIN,
        describe: |_| "Frontend component development".to_string(),
    },
    Rule {
        name: "config",
        kind: ActivityKind::Config,
        matches: |b| !b.config.is_empty(),
        describe: |_| "Project configuration updates".to_string(),
    },
    Rule {
        name: "tests",
        kind: ActivityKind::Testing,
        matches: |b| !b.tests.is_empty(),
        describe: |_| "Test implementation/updates".to_string(),
    },
    Rule {
        name: "major_session",
        kind: ActivityKind::Development,
        matches: |b| b.total >= MAJOR_SESSION_MIN,
        describe: |b| format!("Major development session - {} files modified", b.total),
    },
    Rule {
        name: "language",
        kind: ActivityKind::Development,
        matches: |b| b.total >= LANGUAGE_MIN && b.language_description().is_some(),
        describe: |b| b.language_description().unwrap_or_default().to_string(),
    },
];

/// Classifies a set of changed paths. `None` means nothing worth recording.
pub fn classify<'a>(paths: impl IntoIterator<Item = &'a str>) -> Option<Activity> {
    let buckets = ChangeBuckets::partition(paths);
    if buckets.total == 0 {
        return None;
    }
    RULES.iter().find_map(|rule| rule.apply(&buckets))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify_paths(paths: &[&str]) -> Option<Activity> {
        classify(paths.iter().copied())
    }

    fn description(paths: &[&str]) -> Option<String> {
        classify_paths(paths).map(|a| a.description)
    }

    // ========================================
    // Rule priority
    // ========================================

    #[test]
    fn contracts_with_tests_wins_over_contracts_and_tests() {
        let activity = classify_paths(&["Token.sol", "test/Token.test.js"]).expect("activity");
        assert_eq!(activity.description, "Smart contract development with testing");
        assert_eq!(activity.rule, "contracts_with_tests");
        assert_eq!(activity.kind, ActivityKind::Development);
    }

    #[test]
    fn contracts_with_tests_wins_over_config() {
        let activity =
            classify_paths(&["Token.sol", "test/Token.test.js", "package.json"]).expect("activity");
        assert_eq!(activity.rule, "contracts_with_tests");
    }

    #[test]
    fn contracts_only_counts_contracts() {
        assert_eq!(
            description(&["contracts/A.sol", "contracts/B.sol", "scripts/deploy.py"]),
            Some("Modified 2 smart contracts".to_string())
        );
    }

    #[test]
    fn frontend_with_tests() {
        assert_eq!(
            description(&["web/Button.tsx", "web/Button.test.tsx"]),
            Some("Frontend feature development with tests".to_string())
        );
    }

    #[test]
    fn three_frontend_files_are_component_development() {
        assert_eq!(
            description(&["a.tsx", "b.jsx", "c.ts"]),
            Some("Frontend component development".to_string())
        );
    }

    #[test]
    fn two_frontend_files_fall_through_to_language() {
        assert_eq!(
            description(&["a.ts", "b.js"]),
            Some("JavaScript/TypeScript development".to_string())
        );
    }

    #[test]
    fn config_before_tests() {
        let activity = classify_paths(&["requirements.txt", "tests/test_api.py"]).expect("activity");
        assert_eq!(activity.description, "Project configuration updates");
        assert_eq!(activity.kind, ActivityKind::Config);
    }

    #[test]
    fn nested_manifest_is_config() {
        assert_eq!(
            description(&["crates/core/Cargo.toml"]),
            Some("Project configuration updates".to_string())
        );
    }

    #[test]
    fn tests_only() {
        let activity = classify_paths(&["tests/test_api.py"]).expect("activity");
        assert_eq!(activity.description, "Test implementation/updates");
        assert_eq!(activity.kind, ActivityKind::Testing);
    }

    #[test]
    fn five_uncategorized_files_are_a_major_session() {
        assert_eq!(
            description(&["a.py", "b.py", "c.go", "d.rs", "e.java"]),
            Some("Major development session - 5 files modified".to_string())
        );
    }

    #[test]
    fn language_priority_prefers_python_over_go() {
        assert_eq!(
            description(&["svc/main.go", "svc/util.py"]),
            Some("Python development".to_string())
        );
        assert_eq!(
            description(&["svc/main.go", "svc/util.go"]),
            Some("Go development".to_string())
        );
        assert_eq!(
            description(&["src/lib.rs", "src/main.rs"]),
            Some("Rust development".to_string())
        );
    }

    #[test]
    fn dominant_language_wins_among_counted_languages() {
        assert_eq!(
            description(&["svc/main.go", "web/a.ts", "web/b.js"]),
            Some("JavaScript/TypeScript development".to_string())
        );
        assert_eq!(
            description(&["lib.rs", "a.ts", "b.tsx"]),
            Some("JavaScript/TypeScript development".to_string())
        );
        assert_eq!(
            description(&["svc/a.go", "svc/b.go", "web/c.ts"]),
            Some("Go development".to_string())
        );
        assert_eq!(
            description(&["src/lib.rs", "src/main.rs", "cmd/main.go"]),
            Some("Rust development".to_string())
        );
    }

    #[test]
    fn ties_follow_table_order() {
        assert_eq!(
            description(&["main.go", "web.ts"]),
            Some("JavaScript/TypeScript development".to_string())
        );
        assert_eq!(
            description(&["main.go", "lib.rs"]),
            Some("Go development".to_string())
        );
    }

    #[test]
    fn python_wins_on_presence() {
        assert_eq!(
            description(&["a.ts", "b.js", "tool.py"]),
            Some("Python development".to_string())
        );
    }

    #[test]
    fn python_test_modules_are_tests() {
        let activity = classify_paths(&["app/tests.py", "app/models.py"]).expect("activity");
        assert_eq!(activity.description, "Test implementation/updates");
        assert_eq!(
            description(&["conftest.py", "app/models.py"]),
            Some("Test implementation/updates".to_string())
        );
    }

    // ========================================
    // Silence
    // ========================================

    #[test]
    fn single_uncategorized_file_is_silent() {
        assert_eq!(classify_paths(&["src/app.py"]), None);
    }

    #[test]
    fn empty_set_is_silent() {
        assert_eq!(classify_paths(&[]), None);
    }

    #[test]
    fn unknown_extensions_are_silent() {
        assert_eq!(classify_paths(&["a.cfg", "b.cfg"]), None);
    }

    // ========================================
    // Determinism
    // ========================================

    #[test]
    fn order_of_paths_does_not_matter() {
        let forward = ["a.py", "b.ts", "c.ts", "d.go"];
        let mut backward = forward;
        backward.reverse();
        assert_eq!(classify_paths(&forward), classify_paths(&backward));
    }

    #[test]
    fn duplicate_paths_count_once() {
        assert_eq!(
            description(&["a.py", "a.py", "a.py", "a.py", "b.py"]),
            Some("Python development".to_string())
        );
    }

    #[test]
    fn buckets_overlap() {
        let buckets = ChangeBuckets::partition(["web/App.test.tsx", "api/server.py"]);
        assert_eq!(buckets.frontend, vec!["web/App.test.tsx".to_string()]);
        assert_eq!(buckets.tests, vec!["web/App.test.tsx".to_string()]);
        assert_eq!(buckets.backend, vec!["api/server.py".to_string()]);
        assert_eq!(buckets.total, 2);
    }

    #[test]
    fn every_rule_is_reachable_in_isolation() {
        let cases: &[(&[&str], &str)] = &[
            (&["T.sol", "test/T.js"], "contracts_with_tests"),
            (&["T.sol"], "contracts"),
            (&["a.tsx", "a.test.tsx"], "frontend_with_tests"),
            (&["a.tsx", "b.tsx", "c.tsx"], "frontend_components"),
            (&["go.mod"], "config"),
            (&["x_test.go"], "tests"),
            (&["a.py", "b.py", "c.py", "d.py", "e.py"], "major_session"),
            (&["a.py", "b.py"], "language"),
        ];
        for (paths, rule) in cases {
            let activity = classify_paths(paths).unwrap_or_else(|| panic!("{:?} silent", paths));
            assert_eq!(activity.rule, *rule, "paths {:?}", paths);
        }
    }
}
