//! Parsers for line-oriented text output.

use super::ParseError;
use crate::models::{Issue, Severity};
use regex::Regex;
use std::sync::OnceLock;

macro_rules! static_regex {
    ($name:ident, $pat:expr) => {
        fn $name() -> &'static Regex {
            static RE: OnceLock<Regex> = OnceLock::new();
            RE.get_or_init(|| Regex::new($pat).expect("static regex is valid"))
        }
    };
}

static_regex!(
    generic_re,
    r"^(?P<file>[^:\s][^:]*):(?P<line>\d+)(?::(?P<col>\d+))?:\s*(?:(?P<sev>error|warning|warn|note|info)\s*:\s*)?(?P<msg>.*?)(?:\s+\[(?P<code>[\w./-]+)\])?\s*$"
);
static_regex!(
    darglint_re,
    r"^(?P<file>[^:]+?):(?:(?P<obj>[^:]*?):)?(?P<line>\d+): (?P<code>D[A-Z]*\d+):? (?P<msg>.*)$"
);
static_regex!(
    pydoclint_re,
    r"^\s+(?P<line>\d+): (?P<code>DOC\d+): (?P<msg>.*)$"
);
static_regex!(
    yamllint_re,
    r"^(?P<file>.+?):(?P<line>\d+):(?P<col>\d+): \[(?P<level>\w+)\] (?P<msg>.*?)(?: \((?P<rule>[\w-]+)\))?$"
);
static_regex!(black_re, r"^(?i)(?P<verb>would reformat|reformatted)\s+(?P<file>.+)$");
static_regex!(prettier_re, r"^\[warn\]\s+(?P<file>.*?)(?:\s+\d+ms)?$");
static_regex!(
    rustfmt_re,
    r"^Diff in (?P<file>.+?)(?: at line |:)(?P<line>\d+):?\s*$"
);
static_regex!(ansi_re, r"\x1b\[[0-9;]*m");

fn num(caps: &regex::Captures<'_>, name: &str) -> Option<usize> {
    caps.name(name).and_then(|m| m.as_str().parse().ok())
}

/// `path:line[:col]: [severity:] message [code]`, as printed by mypy, flake8
/// and many compiler-style tools. Lines that do not look like findings
/// (summaries, banners) are ignored.
pub fn parse_generic(output: &str) -> Result<Vec<Issue>, ParseError> {
    let mut issues = Vec::new();
    for line in output.lines() {
        let Some(caps) = generic_re().captures(line.trim_end()) else {
            continue;
        };
        let severity = caps
            .name("sev")
            .map(|m| Severity::from_label(m.as_str()))
            .unwrap_or(Severity::Error);
        let mut issue = Issue::new(caps["file"].trim(), caps["msg"].trim())
            .at(num(&caps, "line"), num(&caps, "col"))
            .with_severity(severity);
        if let Some(code) = caps.name("code") {
            issue = issue.with_code(code.as_str());
        }
        issues.push(issue);
    }
    Ok(issues)
}

/// darglint's `file:function:line: CODE message`, with continuation lines
/// (indented or starting with `:`) folded into the message.
pub fn parse_darglint(output: &str) -> Result<Vec<Issue>, ParseError> {
    let lines: Vec<&str> = output.lines().collect();
    let mut issues = Vec::new();
    let mut i = 0;
    while i < lines.len() {
        let Some(caps) = darglint_re().captures(lines[i]) else {
            i += 1;
            continue;
        };
        let mut message = caps["msg"].to_string();
        let mut j = i + 1;
        while j < lines.len() && (lines[j].trim_start().starts_with(':') || lines[j].starts_with("    ")) {
            message.push(' ');
            message.push_str(lines[j].trim().trim_start_matches(':').trim());
            j += 1;
        }
        issues.push(
            Issue::new(&caps["file"], message)
                .at(num(&caps, "line"), None)
                .with_code(&caps["code"])
                .with_severity(Severity::Warning),
        );
        i = j;
    }
    Ok(issues)
}

/// pydoclint groups findings under a file header line:
///
/// ```text
/// pkg/mod.py
///     12: DOC101: Function `f`: Docstring contains fewer arguments ...
/// ```
pub fn parse_pydoclint(output: &str) -> Result<Vec<Issue>, ParseError> {
    let mut issues = Vec::new();
    let mut current: Option<&str> = None;
    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Some(caps) = pydoclint_re().captures(line) {
            let file = current.unwrap_or("");
            issues.push(
                Issue::new(file, caps["msg"].trim())
                    .at(num(&caps, "line"), None)
                    .with_code(&caps["code"])
                    .with_severity(Severity::Warning),
            );
        } else if !line.starts_with(char::is_whitespace) {
            current = Some(line.trim());
        }
    }
    Ok(issues)
}

/// `yamllint --format parsable`.
pub fn parse_yamllint(output: &str) -> Result<Vec<Issue>, ParseError> {
    let mut issues = Vec::new();
    for line in output.lines() {
        let Some(caps) = yamllint_re().captures(line.trim_end()) else {
            continue;
        };
        let mut issue = Issue::new(&caps["file"], &caps["msg"])
            .at(num(&caps, "line"), num(&caps, "col"))
            .with_severity(Severity::from_label(&caps["level"]));
        if let Some(rule) = caps.name("rule") {
            issue = issue.with_code(rule.as_str());
        }
        issues.push(issue);
    }
    Ok(issues)
}

/// black's `would reformat <file>` / `reformatted <file>` listing.
pub fn parse_black(output: &str) -> Result<Vec<Issue>, ParseError> {
    let mut issues = Vec::new();
    for line in output.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let Some(caps) = black_re().captures(line) else {
            continue;
        };
        let message = if caps["verb"].eq_ignore_ascii_case("reformatted") {
            "Reformatted file"
        } else {
            "Would reformat file"
        };
        issues.push(
            Issue::new(caps["file"].trim(), message)
                .with_code("FORMAT")
                .with_severity(Severity::Warning)
                .fixable(true),
        );
    }
    Ok(issues)
}

/// `prettier --check` prints one `[warn] <file>` line per unformatted file.
pub fn parse_prettier(output: &str) -> Result<Vec<Issue>, ParseError> {
    let clean = ansi_re().replace_all(output, "");
    let mut issues = Vec::new();
    for line in clean.lines() {
        let Some(caps) = prettier_re().captures(line.trim()) else {
            continue;
        };
        let file = caps["file"].trim();
        if file.is_empty() || file.starts_with("Code style issues") {
            continue;
        }
        issues.push(
            Issue::new(file, "File needs formatting")
                .with_code("FORMAT")
                .with_severity(Severity::Warning)
                .fixable(true),
        );
    }
    Ok(issues)
}

/// `cargo fmt -- --check` prints a `Diff in <file> at line N:` header per hunk.
pub fn parse_rustfmt(output: &str) -> Result<Vec<Issue>, ParseError> {
    let mut issues = Vec::new();
    for line in output.lines() {
        let Some(caps) = rustfmt_re().captures(line.trim_end()) else {
            continue;
        };
        issues.push(
            Issue::new(caps["file"].trim(), "Formatting differs from rustfmt")
                .at(num(&caps, "line"), None)
                .with_code("FORMAT")
                .with_severity(Severity::Warning)
                .fixable(true),
        );
    }
    Ok(issues)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_parses_mypy_lines() {
        let out = "pkg/a.py:3: error: Incompatible types in assignment  [assignment]\n\
                   pkg/a.py:7:5: note: See docs\n\
                   Found 1 error in 1 file (checked 2 source files)\n";
        let issues = parse_generic(out).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].file, "pkg/a.py");
        assert_eq!(issues[0].line, Some(3));
        assert_eq!(issues[0].code, "assignment");
        assert_eq!(issues[0].severity, Severity::Error);
        assert_eq!(issues[1].column, Some(5));
        assert_eq!(issues[1].severity, Severity::Info);
    }

    #[test]
    fn darglint_folds_continuations() {
        let out = "a.py:fn:10: DAR101 Missing parameter(s) in Docstring:\n    : - x\nb.py:3: DAR003 Incorrect indentation";
        let issues = parse_darglint(out).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, "DAR101");
        assert!(issues[0].message.ends_with("- x"));
        assert_eq!(issues[1].file, "b.py");
        assert_eq!(issues[1].line, Some(3));
    }

    #[test]
    fn pydoclint_groups_by_file() {
        let out = "src/m.py\n    12: DOC101: Function `f`: fewer arguments\n    20: DOC201: no return\n";
        let issues = parse_pydoclint(out).unwrap();
        assert_eq!(issues.len(), 2);
        assert!(issues.iter().all(|i| i.file == "src/m.py"));
        assert_eq!(issues[1].code, "DOC201");
    }

    #[test]
    fn yamllint_parsable() {
        let out = "c.yml:1:1: [warning] missing document start \"---\" (document-start)\nc.yml:4:81: [error] line too long (90 > 80 characters) (line-length)";
        let issues = parse_yamllint(out).unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].code, "document-start");
        assert_eq!(issues[1].severity, Severity::Error);
        assert_eq!(issues[1].column, Some(81));
    }

    #[test]
    fn formatter_listings() {
        let black = parse_black("would reformat /x/a.py\nOh no! 1 file would be reformatted.").unwrap();
        assert_eq!(black.len(), 1);
        assert!(black[0].fixable);

        let prettier = parse_prettier("Checking formatting...\n\x1b[33m[warn]\x1b[39m src/a.ts\n[warn] Code style issues found in the above file.").unwrap();
        assert_eq!(prettier.len(), 1);
        assert_eq!(prettier[0].file, "src/a.ts");

        let rust = parse_rustfmt("Diff in /p/src/main.rs at line 3:\n-fn main(){}\nDiff in /p/src/lib.rs:10:\n").unwrap();
        assert_eq!(rust.len(), 2);
        assert_eq!(rust[1].line, Some(10));
    }
}
