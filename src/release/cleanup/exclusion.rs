//! Exclusion rules deciding which staged paths are dropped from the release.
//!
//! Rules are evaluated against the path relative to the staging root, with
//! `/` separators: exact file names first (files only), exact folder names
//! next (directories only), then regex patterns in declaration order. The
//! first hit wins.

use crate::release::{Error, Result, settings::ExtraExclusions};
use regex::Regex;
use std::path::Path;

/// Files removed from every release, relative to the staging root.
pub const DEFAULT_FILES: &[&str] = &[
    ".php-cs-fixer.dist.php",
    ".DS_Store",
    ".gitignore",
    ".gitmodules",
    ".travis.yml",
    "package-lock.json",
    ".babelrc",
    "postcss.config.js",
];

/// Patterns removed from every release.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "tools/contrib$",
    "travis-scripts$",
    r"CONTRIBUTING\.md$",
    r"composer\.json$",
    r"diff-hooks\.php",
    r"(.*)?\.composer$",
    r".*\.map$",
    r".*\.psd$",
    r".*\.md$",
    r".*\.rst$",
    ".*phpunit(.*)?",
    r"(.*)?\.travis\.",
    r".*\.DS_Store$",
    r".*\.eslintrc$",
    r".*\.editorconfig$",
    "web/.*$",
    r"app/config/parameters\.yml$",
    r"app/config/parameters\.php$",
    r"config/settings\.inc\.php$",
    "app/cache/..*$",
    r"\.t9n\.yml$",
    r"\.scrutinizer\.yml$",
    r"admin/(.*/)?webpack\.config\.js$",
    r"admin/(.*/)?package\.json$",
    r"admin/(.*/)?bower\.json$",
    r"admin/(.*/)?config\.rb$",
    "admin/themes/default/sass$",
    "admin/themes/new-theme/scss$",
    "themes/_core$",
    "themes/classic/_dev",
    r"themes/webpack\.config\.js$",
    r"themes/package\.json$",
    "vendor/[a-zA-Z0-9_-]+/[a-zA-Z0-9_-]+/[Tt]ests?$",
    "vendor/tecnickcom/tcpdf/examples$",
    r"\.idea",
    "tools/build$",
    "tools/foreignkeyGenerator$",
    ".*node_modules.*",
    r"\.eslintignore$",
    r"\.eslintrc\.js$",
    r"\.php_cs\.dist$",
    "tools/assets$",
    r"\.webpack$",
];

/// Patterns only applied when tests are not kept.
pub const TEST_PATTERNS: &[&str] = &[
    "tests(-legacy)?$",
    r"(.*)?\.git(.*)?$",
    r"\.docker",
    r"docker-compose\.yml$",
];

/// Regex pattern with an optional exception.
///
/// The rule matches when `pattern` matches and `except` does not.
#[derive(Debug, Clone)]
pub struct PatternRule {
    pattern: Regex,
    except: Option<Regex>,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|error| Error::Pattern {
        pattern: pattern.to_string(),
        error,
    })
}

impl PatternRule {
    /// Compiles an unanchored pattern.
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            pattern: compile(pattern)?,
            except: None,
        })
    }

    /// Paths matching `pattern` are spared.
    pub fn except(mut self, pattern: &str) -> Result<Self> {
        self.except = Some(compile(pattern)?);
        Ok(self)
    }

    /// Source of the main pattern.
    pub fn as_str(&self) -> &str {
        self.pattern.as_str()
    }

    /// Whether `relative_path` is hit by this rule.
    pub fn is_match(&self, relative_path: &str) -> bool {
        self.pattern.is_match(relative_path)
            && !self
                .except
                .as_ref()
                .is_some_and(|e| e.is_match(relative_path))
    }
}

/// Which rule excluded a path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExclusionMatch<'a> {
    /// Exact file entry.
    File(&'a str),
    /// Exact folder entry.
    Folder(&'a str),
    /// Regex pattern.
    Pattern(&'a str),
}

/// Ordered exclusion lists.
#[derive(Debug, Clone, Default)]
pub struct ExclusionRules {
    files: Vec<String>,
    folders: Vec<String>,
    patterns: Vec<PatternRule>,
}

impl ExclusionRules {
    /// Empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped rule set.
    ///
    /// With `keep_tests` false, test, VCS and docker patterns are appended,
    /// along with `package.json` files that are not under a `_dev` folder.
    pub fn defaults(keep_tests: bool) -> Result<Self> {
        let mut rules = Self::new();
        for file in DEFAULT_FILES {
            rules = rules.with_file(*file);
        }
        for pattern in DEFAULT_PATTERNS {
            rules = rules.with_pattern(pattern)?;
        }
        if !keep_tests {
            for pattern in TEST_PATTERNS {
                rules = rules.with_pattern(pattern)?;
            }
            rules = rules.with_rule(PatternRule::new(r"package\.json$")?.except(r"_dev/package\.json$")?);
        }
        Ok(rules)
    }

    /// Appends configured entries after the ones already present.
    pub fn with_extra(mut self, extra: &ExtraExclusions) -> Result<Self> {
        for file in &extra.files {
            self = self.with_file(file.clone());
        }
        for folder in &extra.folders {
            self = self.with_folder(folder.clone());
        }
        for pattern in &extra.patterns {
            self = self.with_pattern(pattern)?;
        }
        Ok(self)
    }

    /// Adds an exact file entry.
    pub fn with_file(mut self, relative_path: impl Into<String>) -> Self {
        self.files.push(relative_path.into());
        self
    }

    /// Adds an exact folder entry.
    pub fn with_folder(mut self, relative_path: impl Into<String>) -> Self {
        self.folders.push(relative_path.into());
        self
    }

    /// Adds a regex pattern at the end of the list.
    pub fn with_pattern(self, pattern: &str) -> Result<Self> {
        Ok(self.with_rule(PatternRule::new(pattern)?))
    }

    /// Adds a prepared pattern rule at the end of the list.
    pub fn with_rule(mut self, rule: PatternRule) -> Self {
        self.patterns.push(rule);
        self
    }

    /// Pattern rules in evaluation order.
    pub fn patterns(&self) -> &[PatternRule] {
        &self.patterns
    }

    /// First rule matching `relative_path`, if any.
    pub fn matching_rule(&self, relative_path: &str, is_directory: bool) -> Option<ExclusionMatch<'_>> {
        if !is_directory {
            if let Some(f) = self.files.iter().find(|f| *f == relative_path) {
                return Some(ExclusionMatch::File(f));
            }
        } else if let Some(f) = self.folders.iter().find(|f| *f == relative_path) {
            return Some(ExclusionMatch::Folder(f));
        }

        self.patterns
            .iter()
            .find(|p| p.is_match(relative_path))
            .map(|p| ExclusionMatch::Pattern(p.as_str()))
    }
}

/// Path relative to the staging root, `/`-separated.
pub fn relative_key(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// Whether `relative_path` is dropped from the release.
pub fn should_exclude(relative_path: &Path, is_directory: bool, rules: &ExclusionRules) -> bool {
    rules
        .matching_rule(&relative_key(relative_path), is_directory)
        .is_some()
}
