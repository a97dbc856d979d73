use crate::error::Result;
use regex::{Regex, RegexBuilder};

/// Folder names skipped by default when building a tree.
pub const DEFAULT_IGNORED_FOLDERS: &[&str] = &[
    // .NET / Visual Studio
    "bin",
    "obj",
    "Properties",
    ".vs",
    ".vscode",
    "packages",
    "TestResults",
    "Debug",
    "Release",
    "x64",
    "x86",
    "AnyCPU",
    ".nuget",
    // Node.js / npm
    "node_modules",
    "npm-debug.log",
    "yarn-error.log",
    ".npm",
    ".yarn",
    // Build outputs
    "dist",
    "build",
    "out",
    "target",
    "coverage",
    ".next",
    ".nuxt",
    // Version control
    ".git",
    ".svn",
    ".hg",
    ".bzr",
    "CVS",
    // IDEs and editors
    ".idea",
    ".eclipse",
    ".vscode",
    ".settings",
    "*.swp",
    "*.swo",
    ".DS_Store",
    "Thumbs.db",
    "desktop.ini",
    // Logs and temp files
    "logs",
    "*.log",
    "tmp",
    "temp",
    ".tmp",
    ".temp",
    "cache",
    ".cache",
    // Env-file folders and other tool caches
    ".sass-cache",
    ".env.local",
    ".env.development.local",
    ".env.test.local",
    ".env.production.local",
];

pub fn default_ignored_folders() -> Vec<String> {
    DEFAULT_IGNORED_FOLDERS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

#[derive(Debug, Clone)]
struct ExclusionRule {
    lowered: String,
    wildcard: Option<Regex>,
    dot_prefix: bool,
}

impl ExclusionRule {
    fn compile(pattern: &str) -> Result<Self> {
        let wildcard = if pattern.contains('*') {
            // Only '*' is special; everything else matches literally.
            let body = pattern
                .split('*')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(".*");
            let regex = RegexBuilder::new(&format!("^{}$", body))
                .case_insensitive(true)
                .build()?;
            Some(regex)
        } else {
            None
        };
        Ok(Self {
            lowered: pattern.to_lowercase(),
            wildcard,
            dot_prefix: pattern.starts_with('.'),
        })
    }

    fn matches(&self, name: &str, lowered_name: &str) -> bool {
        if lowered_name == self.lowered {
            return true;
        }
        if let Some(regex) = &self.wildcard {
            if regex.is_match(name) {
                return true;
            }
        }
        self.dot_prefix && lowered_name.starts_with(&self.lowered)
    }
}

/// Decides whether a single directory name is ignored.
///
/// Patterns are one of:
/// - an exact folder name, compared case-insensitively;
/// - a wildcard pattern where `*` matches any run of characters, anchored at both ends;
/// - a dot-prefixed name, which also matches any folder starting with it (`.env` hides `.environment`).
#[derive(Debug, Clone)]
pub struct ExclusionMatcher {
    patterns: Vec<String>,
    rules: Vec<ExclusionRule>,
}

impl ExclusionMatcher {
    pub fn new<I, S>(patterns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut matcher = Self {
            patterns: Vec::new(),
            rules: Vec::new(),
        };
        matcher.set_ignored_folders(patterns)?;
        Ok(matcher)
    }

    pub fn with_defaults() -> Result<Self> {
        Self::new(DEFAULT_IGNORED_FOLDERS.iter().copied())
    }

    /// Replaces the pattern list. On error the previous list stays in effect.
    pub fn set_ignored_folders<I, S>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let patterns: Vec<String> = patterns.into_iter().map(Into::into).collect();
        let rules = patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| ExclusionRule::compile(p))
            .collect::<Result<Vec<_>>>()?;
        log::debug!(
            "Exclusion list set: {} patterns ({} active)",
            patterns.len(),
            rules.len()
        );
        self.patterns = patterns;
        self.rules = rules;
        Ok(())
    }

    pub fn ignored_folders(&self) -> Vec<String> {
        self.patterns.clone()
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn is_excluded(&self, name: &str) -> bool {
        if name.trim().is_empty() {
            return false;
        }
        let lowered = name.to_lowercase();
        let excluded = self.rules.iter().any(|rule| rule.matches(name, &lowered));
        if excluded {
            log::trace!("Folder name '{}' matched exclusion list", name);
        }
        excluded
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn defaults() -> ExclusionMatcher {
        ExclusionMatcher::with_defaults().expect("default patterns compile")
    }

    #[test]
    fn every_default_name_is_excluded_in_any_case() {
        let matcher = defaults();
        for name in DEFAULT_IGNORED_FOLDERS.iter().filter(|n| !n.contains('*')) {
            assert!(matcher.is_excluded(name), "{name}");
            assert!(matcher.is_excluded(&name.to_uppercase()), "{name} upper");
            assert!(matcher.is_excluded(&name.to_lowercase()), "{name} lower");
        }
    }

    #[rstest]
    #[case("app.log", true)]
    #[case(".log", true)]
    #[case("APP.LOG", true)]
    #[case("applog", false)]
    #[case("app.log.old", false)]
    #[case("notes.swp", true)]
    fn wildcard_patterns_are_anchored(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(defaults().is_excluded(name), expected, "{name}");
    }

    #[rstest]
    #[case(".git", true)]
    #[case(".github", true)]
    #[case(".tmpfiles", true)]
    #[case(".Cache-old", true)]
    #[case("src", false)]
    #[case("binaries", false)]
    #[case("my.git", false)]
    fn dot_patterns_match_as_prefix(#[case] name: &str, #[case] expected: bool) {
        assert_eq!(defaults().is_excluded(name), expected, "{name}");
    }

    #[rstest]
    #[case("")]
    #[case("   ")]
    fn blank_names_are_never_excluded(#[case] name: &str) {
        assert!(!defaults().is_excluded(name));
    }

    #[test]
    fn wildcard_metacharacters_match_literally() {
        let matcher = ExclusionMatcher::new(["lib+(old)*"]).unwrap();
        assert!(matcher.is_excluded("lib+(old)-2019"));
        assert!(!matcher.is_excluded("libbb(old)"));
        assert!(!matcher.is_excluded("libold"));
    }

    #[test]
    fn setter_and_getter_round_the_list() {
        let mut matcher = defaults();
        matcher
            .set_ignored_folders(vec!["vendor".to_string(), "".to_string()])
            .unwrap();
        assert_eq!(matcher.ignored_folders(), vec!["vendor", ""]);
        assert!(matcher.is_excluded("Vendor"));
        assert!(!matcher.is_excluded("node_modules"));
    }

    #[test]
    fn empty_list_excludes_nothing() {
        let matcher = ExclusionMatcher::new(Vec::<String>::new()).unwrap();
        assert!(matcher.is_empty());
        assert!(!matcher.is_excluded("node_modules"));
    }
}
