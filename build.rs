use grep::regex::RegexMatcher;
use grep::searcher::{Searcher, Sink, SinkMatch};
use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

// Source trees owned by this crate. Anything else under the package root
// (vendored reference material, target/) is never scanned.
const SOURCE_ROOTS: [&str; 5] = ["score", "report", "cli", "tests", "benches"];

// Which rule a collector enforces. Each rule has its own policy text.
#[derive(Clone, Copy)]
enum Rule {
    UnderscoreBinding,
    ForbiddenComment,
    UppercaseComment,
    AllowDeadCode,
}

impl Rule {
    fn headline(self) -> &'static str {
        match self {
            Rule::UnderscoreBinding => "underscore-prefixed variables",
            Rule::ForbiddenComment => "forbidden comment patterns",
            Rule::UppercaseComment => "comments with all uppercase alphabetic characters",
            Rule::AllowDeadCode => "#[allow(dead_code)] attributes",
        }
    }

    fn policy(self) -> &'static str {
        match self {
            Rule::UnderscoreBinding => {
                "Underscore-prefixed variable names are not allowed in this project.\n   \
                 Either use the variable (removing the underscore) or remove it completely."
            }
            Rule::ForbiddenComment => {
                "Comments containing 'FIXED', 'CORRECTED', 'FIX', 'NEW', 'CHANGED', 'MODIFIED' or 'UPDATED' \
                 (and their other forms) are not allowed.\n   \
                 The '**' pattern is not allowed in regular comments (but is allowed in doc comments)."
            }
            Rule::UppercaseComment => {
                "Comments where all alphabetic characters are uppercase are not allowed.\n   \
                 Strongly consider deleting the comment completely."
            }
            Rule::AllowDeadCode => {
                "#[allow(dead_code)] attributes are not allowed in this project.\n   \
                 Either use the code (removing the attribute) or remove it completely."
            }
        }
    }
}

// Collects matching lines from a single file, filtered according to its rule.
struct ViolationCollector {
    rule: Rule,
    violations: Vec<String>,
    file_path: PathBuf,
}

impl ViolationCollector {
    fn new(rule: Rule, file_path: &Path) -> Self {
        Self {
            rule,
            violations: Vec::new(),
            file_path: file_path.to_path_buf(),
        }
    }

    // Formats a detailed error message when anything was collected.
    fn check_and_get_error_message(&self) -> Option<String> {
        if self.violations.is_empty() {
            return None;
        }

        let file_name = self.file_path.to_str().unwrap_or("?");
        let mut error_msg = format!(
            "\n❌ ERROR: Found {} {} in {}:\n",
            self.violations.len(),
            self.rule.headline(),
            file_name
        );
        for violation in &self.violations {
            error_msg.push_str(&format!("   {violation}\n"));
        }
        error_msg.push_str(&format!("\n⚠️ {}\n", self.rule.policy()));
        Some(error_msg)
    }

    fn accepts(&self, line_text: &str) -> bool {
        match self.rule {
            Rule::UnderscoreBinding => !is_pure_comment(line_text) && !underscore_in_string(line_text),
            Rule::ForbiddenComment => {
                // A '**' inside a doc comment is markdown emphasis.
                !(is_doc_comment(line_text)
                    && line_text.contains("**")
                    && !FORBIDDEN_WORDS.iter().any(|word| line_text.contains(word)))
            }
            Rule::UppercaseComment => comment_is_all_uppercase(line_text),
            Rule::AllowDeadCode => true,
        }
    }
}

impl Sink for ViolationCollector {
    type Error = std::io::Error;

    fn matched(&mut self, _: &Searcher, mat: &SinkMatch) -> Result<bool, Self::Error> {
        let line_number = mat.line_number().unwrap_or(0);
        let line_text = std::str::from_utf8(mat.bytes()).unwrap_or("").trim_end();
        if self.accepts(line_text) {
            self.violations.push(format!("{line_number}:{line_text}"));
        }
        Ok(true)
    }
}

const FORBIDDEN_WORDS: [&str; 14] = [
    "FIXED", "CORRECTED", "FIX", "FIXES", "NEW", "CHANGED", "CHANGES", "CHANGE", "MODIFIED",
    "MODIFIES", "MODIFY", "UPDATED", "UPDATES", "UPDATE",
];

fn is_doc_comment(line: &str) -> bool {
    line.trim_start().starts_with("///")
}

fn is_pure_comment(line: &str) -> bool {
    line.trim_start().starts_with("//") || line.contains("/*")
}

// An underscore between quotes belongs to a string literal, not a binding.
fn underscore_in_string(line: &str) -> bool {
    line.contains('"')
        && line
            .split('"')
            .enumerate()
            .any(|(i, part)| i % 2 == 1 && part.contains('_'))
}

fn comment_is_all_uppercase(line_text: &str) -> bool {
    let trimmed = line_text.trim_start();
    let comment_text = if let Some(rest) = trimmed.strip_prefix("///") {
        rest.trim()
    } else if let Some(rest) = trimmed.strip_prefix("//") {
        rest.trim()
    } else if let Some(idx) = line_text.find("/*") {
        let rest = &line_text[idx + 2..];
        match rest.find("*/") {
            Some(end) => rest[..end].trim(),
            None => rest.trim(),
        }
    } else {
        return false;
    };

    let mut alphabetic = comment_text.chars().filter(|c| c.is_alphabetic()).peekable();
    alphabetic.peek().is_some() && alphabetic.all(|c| c.is_uppercase())
}

fn crate_sources() -> Vec<PathBuf> {
    let mut files = vec![PathBuf::from("build.rs")];
    for root in SOURCE_ROOTS {
        files.extend(
            WalkDir::new(root)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().extension().is_some_and(|ext| ext == "rs"))
                .map(|e| e.into_path()),
        );
    }
    files
}

fn scan(rule: Rule, pattern: &str, include_build_script: bool) -> Result<(), Box<dyn Error>> {
    let matcher = RegexMatcher::new_line_matcher(pattern)?;
    let mut searcher = Searcher::new();

    for path in crate_sources() {
        if !include_build_script && path.file_name().is_some_and(|name| name == "build.rs") {
            continue;
        }
        if std::fs::read_to_string(&path).is_err() {
            continue;
        }

        let mut collector = ViolationCollector::new(rule, &path);
        searcher.search_path(&matcher, &path, &mut collector)?;
        if let Some(error_message) = collector.check_and_get_error_message() {
            return Err(error_message.into());
        }
    }
    Ok(())
}

fn run_checks() -> Result<(), Box<dyn Error>> {
    scan(Rule::UnderscoreBinding, r"\b(_[a-zA-Z0-9_]+)\b", true)?;
    scan(
        Rule::ForbiddenComment,
        r"(//|/\*|///).*(?:FIXED|CORRECTED|FIX|FIXES|NEW|CHANGED|CHANGES|CHANGE|MODIFIED|MODIFIES|MODIFY|UPDATED|UPDATES|UPDATE)",
        false,
    )?;
    scan(Rule::ForbiddenComment, r"(//|/\*).*\*\*", false)?;
    scan(Rule::UppercaseComment, r"(//|/\*|///).*", false)?;
    scan(Rule::AllowDeadCode, r"#\s*\[\s*allow\s*\(\s*dead_code\s*\)\s*\]", false)?;
    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    for root in SOURCE_ROOTS {
        println!("cargo:rerun-if-changed={root}");
    }

    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    println!("cargo:rustc-env=DIALYSIS_HAZARD_BUILD_TIMESTAMP={timestamp}");

    if let Err(e) = run_checks() {
        // Printed to stderr so cargo shows it with the failed build.
        eprintln!("{e}");
        std::process::exit(1);
    }
}
