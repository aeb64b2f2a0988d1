//! File discovery and exclusion rules.
//!
//! Two independent rule sources decide whether a path is out of scope:
//! - Run-wide exclude patterns (CLI and `metalint.toml`). Any match excludes.
//! - An optional ignore file (`.metalint-ignore`) with git-ignore semantics:
//!   `!` negates and the last matching rule wins.
//!
//! A path excluded by either source stays excluded; a negation in the ignore
//! file cannot re-include a path the exclude patterns reject.
//!
//! All matching happens on absolute, forward-slash paths so single-file
//! inputs and walked files are judged the same way.

use crate::error::{Error, Result};
use glob::{MatchOptions, Pattern};
use rayon::prelude::*;
use std::fs;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Dependency and virtual-environment directories pruned during walks.
pub const DEPENDENCY_DIRS: &[&str] = &[
    ".venv",
    "venv",
    "env",
    "ENV",
    "site-packages",
    "node_modules",
    "__pycache__",
    ".tox",
    ".pytest_cache",
    ".mypy_cache",
    ".git",
    "target",
    "dist",
    "build",
];

/// Default ignore-file name looked up from the repository root upward.
pub const IGNORE_FILE_NAME: &str = ".metalint-ignore";

/// Absolute form of `path` with `.`/`..` folded lexically (no symlink resolution).
pub fn absolute(path: &Path) -> PathBuf {
    let base = if path.is_absolute() {
        PathBuf::new()
    } else {
        std::env::current_dir().unwrap_or_default()
    };
    let mut out = PathBuf::new();
    for comp in base.join(path).components() {
        match comp {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Absolute, forward-slash string form used for all pattern matching.
pub fn normalize_path(path: &Path) -> String {
    absolute(path).to_string_lossy().replace('\\', "/")
}

fn has_glob_chars(s: &str) -> bool {
    s.contains(['*', '?', '['])
}

#[derive(Debug, Clone)]
enum ExcludeKind {
    /// `build`: any path with that segment.
    DirName(String),
    /// `build/*`: everything under that directory.
    DirTree { dir: String, segment: Option<Pattern> },
    Glob,
}

#[derive(Debug, Clone)]
/// One compiled run-wide exclude pattern.
pub struct ExcludePattern {
    raw: String,
    kind: ExcludeKind,
    glob: Option<Pattern>,
}

impl ExcludePattern {
    pub fn parse(raw: &str) -> Result<Self> {
        let pat = raw.trim();
        let invalid = |source| Error::InvalidPattern {
            pattern: pat.to_string(),
            source,
        };
        let kind = if let Some(dir) = pat.strip_suffix("/*") {
            let dir = dir.trim_start_matches("./").trim_end_matches('/').to_string();
            let segment = if has_glob_chars(&dir) && !dir.contains('/') {
                Some(Pattern::new(&dir).map_err(invalid)?)
            } else {
                None
            };
            ExcludeKind::DirTree { dir, segment }
        } else if !pat.contains('/') && !has_glob_chars(pat) {
            ExcludeKind::DirName(pat.to_string())
        } else {
            ExcludeKind::Glob
        };
        let glob = if pat.is_empty() {
            None
        } else {
            Some(Pattern::new(pat).map_err(invalid)?)
        };
        Ok(Self {
            raw: pat.to_string(),
            kind,
            glob,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Match against a path already passed through [`normalize_path`].
    pub fn matches(&self, normalized: &str) -> bool {
        if self.raw.is_empty() {
            return false;
        }
        let segments: Vec<&str> = normalized.split('/').filter(|s| !s.is_empty()).collect();
        match &self.kind {
            ExcludeKind::DirTree { dir, segment } => {
                if normalized.contains(&format!("/{dir}/")) || normalized.starts_with(&format!("{dir}/"))
                {
                    return true;
                }
                let parents = &segments[..segments.len().saturating_sub(1)];
                if let Some(seg) = segment {
                    if parents.iter().any(|s| seg.matches(s)) {
                        return true;
                    }
                }
            }
            ExcludeKind::DirName(name) => {
                if segments.iter().any(|s| s == name) {
                    return true;
                }
            }
            ExcludeKind::Glob => {}
        }
        match &self.glob {
            Some(glob) => glob.matches(normalized) || segments.iter().any(|s| glob.matches(s)),
            None => false,
        }
    }
}

/// True when any pattern excludes `path`. Invalid patterns never match.
pub fn is_excluded(path: &Path, patterns: &[String]) -> bool {
    if patterns.is_empty() {
        return false;
    }
    let normalized = normalize_path(path);
    patterns
        .iter()
        .filter_map(|p| ExcludePattern::parse(p).ok())
        .any(|p| p.matches(&normalized))
}

#[derive(Debug, Clone)]
struct IgnoreRule {
    glob: Pattern,
    negated: bool,
    dir_only: bool,
    /// Contains a slash, so it matches the whole relative path only.
    anchored: bool,
}

const IGNORE_MATCH: MatchOptions = MatchOptions {
    case_sensitive: true,
    require_literal_separator: true,
    require_literal_leading_dot: false,
};

impl IgnoreRule {
    fn parse(line: &str) -> Option<std::result::Result<Self, glob::PatternError>> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return None;
        }
        let (negated, body) = match line.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, line),
        };
        let dir_only = body.ends_with('/');
        let body = body.trim_end_matches('/');
        let anchored = body.contains('/');
        let body = body.trim_start_matches('/');
        if body.is_empty() {
            return None;
        }
        Some(Pattern::new(body).map(|glob| Self {
            glob,
            negated,
            dir_only,
            anchored,
        }))
    }

    fn matches(&self, rel: &str, is_dir: bool) -> bool {
        if self.dir_only && !is_dir {
            return false;
        }
        if self.glob.matches_with(rel, IGNORE_MATCH) {
            return true;
        }
        if self.anchored {
            return false;
        }
        let name = rel.rsplit('/').next().unwrap_or(rel);
        self.glob.matches_with(name, IGNORE_MATCH)
    }
}

#[derive(Debug, Clone)]
/// Parsed ignore file, matched relative to the directory that holds it.
pub struct IgnoreFile {
    root: String,
    rules: Vec<IgnoreRule>,
}

impl IgnoreFile {
    /// Parse ignore-file text. Lines with broken globs are dropped with a warning.
    pub fn parse(root: &Path, contents: &str) -> Self {
        let rules = contents
            .lines()
            .filter_map(|line| match IgnoreRule::parse(line)? {
                Ok(rule) => Some(rule),
                Err(e) => {
                    warn!(line = line.trim(), error = %e, "ignoring invalid ignore-file pattern");
                    None
                }
            })
            .collect();
        Self {
            root: normalize_path(root).trim_end_matches('/').to_string(),
            rules,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let root = path.parent().unwrap_or_else(|| Path::new("."));
        debug!(file = %path.display(), "loaded ignore file");
        Ok(Self::parse(root, &contents))
    }

    /// Find `name` in `start` or the closest ancestor.
    pub fn find(start: &Path, name: &str) -> Option<PathBuf> {
        let start = absolute(start);
        start
            .ancestors()
            .map(|dir| dir.join(name))
            .find(|candidate| candidate.is_file())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn relative(&self, path: &Path) -> Option<String> {
        let normalized = normalize_path(path);
        let rel = normalized.strip_prefix(&self.root)?;
        let rel = rel.strip_prefix('/')?;
        (!rel.is_empty()).then(|| rel.to_string())
    }

    fn last_match(&self, rel: &str, is_dir: bool) -> bool {
        let mut ignored = false;
        for rule in &self.rules {
            if rule.matches(rel, is_dir) {
                ignored = !rule.negated;
            }
        }
        ignored
    }

    /// Git-ignore evaluation: the last matching rule wins, and nothing below
    /// an ignored directory can be re-included. Paths outside the ignore
    /// file's directory are never ignored.
    pub fn is_ignored(&self, path: &Path, is_dir: bool) -> bool {
        let Some(rel) = self.relative(path) else {
            return false;
        };
        let segments: Vec<&str> = rel.split('/').collect();
        for depth in 1..segments.len() {
            if self.last_match(&segments[..depth].join("/"), true) {
                return true;
            }
        }
        self.last_match(&rel, is_dir)
    }
}

#[derive(Debug, Clone, Default)]
/// Every rule that can take a path out of scope for a run.
pub struct ExclusionRuleSet {
    patterns: Vec<ExcludePattern>,
    ignore_file: Option<IgnoreFile>,
    include_dependency_dirs: bool,
}

impl ExclusionRuleSet {
    pub fn new(patterns: &[String]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .filter(|p| !p.trim().is_empty())
            .map(|p| ExcludePattern::parse(p))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            patterns,
            ..Default::default()
        })
    }

    pub fn with_ignore_file(mut self, ignore_file: Option<IgnoreFile>) -> Self {
        self.ignore_file = ignore_file;
        self
    }

    pub fn include_dependency_dirs(mut self, include: bool) -> Self {
        self.include_dependency_dirs = include;
        self
    }

    pub fn patterns(&self) -> impl Iterator<Item = &str> {
        self.patterns.iter().map(ExcludePattern::as_str)
    }

    /// True if either rule source excludes `path`.
    pub fn excludes(&self, path: &Path, is_dir: bool) -> bool {
        let normalized = normalize_path(path);
        if self.patterns.iter().any(|p| p.matches(&normalized)) {
            return true;
        }
        self.ignore_file
            .as_ref()
            .is_some_and(|f| f.is_ignored(path, is_dir))
    }

    fn prunes_dir(&self, dir: &Path) -> bool {
        let name = dir.file_name().and_then(|n| n.to_str()).unwrap_or("");
        if !self.include_dependency_dirs && DEPENDENCY_DIRS.contains(&name) {
            return true;
        }
        self.excludes(dir, true)
    }
}

struct IncludeSet(Vec<Pattern>);

impl IncludeSet {
    fn compile(patterns: &[String]) -> Result<Self> {
        patterns
            .iter()
            .map(|p| {
                Pattern::new(p).map_err(|source| Error::InvalidPattern {
                    pattern: p.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>>>()
            .map(Self)
    }

    fn matches(&self, path: &Path) -> bool {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let full = normalize_path(path);
        self.0.iter().any(|p| {
            if p.as_str().contains('/') {
                p.matches(&full)
            } else {
                p.matches(name)
            }
        })
    }
}

/// Collect the files under `paths` that match `includes` and survive `rules`.
///
/// Files are checked directly; directories are walked with dependency
/// directories and excluded directories pruned before descent. Missing
/// inputs are skipped. The result is absolute, de-duplicated and sorted.
pub fn discover(paths: &[PathBuf], includes: &[String], rules: &ExclusionRuleSet) -> Result<Vec<PathBuf>> {
    let includes = IncludeSet::compile(includes)?;
    let mut candidates: Vec<PathBuf> = Vec::new();
    for input in paths {
        if input.is_file() {
            candidates.push(absolute(input));
        } else if input.is_dir() {
            let walker = WalkDir::new(absolute(input))
                .into_iter()
                .filter_entry(|e| e.depth() == 0 || !e.file_type().is_dir() || !rules.prunes_dir(e.path()));
            for entry in walker {
                match entry {
                    Ok(e) if e.file_type().is_file() || (e.path_is_symlink() && e.path().is_file()) => {
                        candidates.push(e.into_path())
                    }
                    Ok(_) => {}
                    Err(err) => warn!(error = %err, "skipping unreadable entry"),
                }
            }
        } else {
            warn!(path = %input.display(), "input path does not exist; skipping");
        }
    }
    let mut files: Vec<PathBuf> = candidates
        .into_par_iter()
        .filter(|p| includes.matches(p) && !rules.excludes(p, false))
        .collect();
    files.sort();
    files.dedup();
    debug!(count = files.len(), "discovered files");
    Ok(files)
}
